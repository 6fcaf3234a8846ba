use crate::domain::ports::{KeyId, KeyManagement};
use crate::error::{Result, VaultError};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

pub const MASTER_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// In-process envelope encryption with a single AES-256-GCM master key.
///
/// Ciphertext layout is `nonce || ciphertext || tag`. The key id is bound
/// as associated data, so a blob only decrypts under the id it was
/// written with.
pub struct LocalKms {
    key_id: KeyId,
    master_key: Zeroizing<[u8; MASTER_KEY_LEN]>,
}

impl LocalKms {
    pub fn new(key_id: KeyId, master_key: [u8; MASTER_KEY_LEN]) -> Self {
        Self {
            key_id,
            master_key: Zeroizing::new(master_key),
        }
    }

    /// Builds the KMS from a base64-encoded 32-byte key.
    pub fn from_base64(key_id: KeyId, encoded: &str) -> Result<Self> {
        let raw = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| VaultError::Crypto(format!("master key is not base64: {}", e)))?,
        );
        let key: [u8; MASTER_KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
            VaultError::Crypto(format!(
                "master key must be {} bytes, got {}",
                MASTER_KEY_LEN,
                raw.len()
            ))
        })?;
        Ok(Self::new(key_id, key))
    }

    /// Generates a random master key, base64-encoded.
    pub fn generate_key() -> String {
        let mut key = Zeroizing::new([0u8; MASTER_KEY_LEN]);
        OsRng.fill_bytes(&mut key[..]);
        BASE64.encode(&key[..])
    }

    fn cipher(&self, key_id: &KeyId) -> Result<Aes256Gcm> {
        if key_id != &self.key_id {
            return Err(VaultError::Crypto(format!("unknown key id {}", key_id)));
        }
        Aes256Gcm::new_from_slice(&self.master_key[..])
            .map_err(|_| VaultError::Crypto("invalid master key length".to_string()))
    }
}

impl fmt::Debug for LocalKms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKms")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyManagement for LocalKms {
    async fn encrypt(&self, key_id: &KeyId, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher(key_id)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: key_id.as_str().as_bytes(),
                },
            )
            .map_err(|_| VaultError::Crypto("encryption failed".to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    async fn decrypt(&self, key_id: &KeyId, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher(key_id)?;
        if ciphertext.len() <= NONCE_LEN {
            return Err(VaultError::Crypto("ciphertext too short".to_string()));
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: key_id.as_str().as_bytes(),
                },
            )
            .map_err(|_| VaultError::Crypto("decryption failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kms() -> LocalKms {
        LocalKms::new(KeyId::new("alias/cards"), [7u8; MASTER_KEY_LEN])
    }

    #[tokio::test]
    async fn test_encrypt_decrypt() {
        let kms = kms();
        let key_id = KeyId::new("alias/cards");

        let blob = kms.encrypt(&key_id, b"4111111111111111").await.unwrap();
        assert!(!blob.windows(16).any(|w| w == b"4111111111111111"));

        let plain = kms.decrypt(&key_id, &blob).await.unwrap();
        assert_eq!(plain, b"4111111111111111");
    }

    #[tokio::test]
    async fn test_nonce_is_fresh_per_call() {
        let kms = kms();
        let key_id = KeyId::new("alias/cards");
        let a = kms.encrypt(&key_id, b"same").await.unwrap();
        let b = kms.encrypt(&key_id, b"same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_tampered_or_foreign_ciphertext_fails() {
        let kms = kms();
        let key_id = KeyId::new("alias/cards");
        let mut blob = kms.encrypt(&key_id, b"5500000000000004").await.unwrap();

        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(
            kms.decrypt(&key_id, &blob).await,
            Err(VaultError::Crypto(_))
        ));
        assert!(matches!(
            kms.decrypt(&key_id, &[0u8; 4]).await,
            Err(VaultError::Crypto(_))
        ));
        assert!(matches!(
            kms.encrypt(&KeyId::new("alias/other"), b"x").await,
            Err(VaultError::Crypto(_))
        ));
    }

    #[test]
    fn test_key_from_base64() {
        let encoded = LocalKms::generate_key();
        assert!(LocalKms::from_base64(KeyId::new("k"), &encoded).is_ok());
        assert!(LocalKms::from_base64(KeyId::new("k"), "c2hvcnQ=").is_err());
        assert!(LocalKms::from_base64(KeyId::new("k"), "not base64!").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", kms());
        assert!(debug.contains("alias/cards"));
        assert!(!debug.contains("master_key"));
    }
}
