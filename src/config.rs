use crate::domain::auth::{AccessPolicy, DEFAULT_PAYMENTS_SCOPE};
use crate::domain::fraud::{HIGH_AMOUNT_THRESHOLD, RuleSet};
use crate::domain::ports::KeyId;
use crate::infrastructure::local_kms::LocalKms;
use clap::Args;
use miette::{Result, miette};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Process-wide settings. Every option can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct VaultConfig {
    /// Base64-encoded 256-bit master key for envelope encryption
    #[arg(long, env = "VAULT_MASTER_KEY", hide_env_values = true, global = true)]
    pub master_key: Option<String>,

    /// Identifier of the master key, bound into every ciphertext
    #[arg(long, env = "VAULT_KEY_ID", default_value = "alias/cardvault", global = true)]
    pub key_id: String,

    /// The only client allowed to call the payments endpoint
    #[arg(long, env = "TPP_CLIENT_ID", global = true)]
    pub tpp_client_id: Option<String>,

    /// Scope required on the payments endpoint
    #[arg(long, env = "TPP_REQUIRED_SCOPE", default_value = DEFAULT_PAYMENTS_SCOPE, global = true)]
    pub required_scope: String,

    /// Amounts strictly above this raise HIGH_AMOUNT
    #[arg(long, env = "FRAUD_HIGH_AMOUNT_THRESHOLD", default_value_t = HIGH_AMOUNT_THRESHOLD, global = true)]
    pub high_amount_threshold: Decimal,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "VAULT_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Append payment events to this JSON-lines file instead of the in-process bus
    #[arg(long, env = "VAULT_EVENTS_OUT", global = true)]
    pub events_out: Option<PathBuf>,

    /// Append fraud alerts to this CSV file
    #[arg(long, env = "VAULT_ALERTS_OUT", global = true)]
    pub alerts_out: Option<PathBuf>,
}

impl VaultConfig {
    pub fn key_id(&self) -> KeyId {
        KeyId::new(self.key_id.clone())
    }

    pub fn kms(&self) -> Result<LocalKms> {
        let encoded = self
            .master_key
            .as_deref()
            .ok_or_else(|| miette!("a master key is required (--master-key or VAULT_MASTER_KEY)"))?;
        LocalKms::from_base64(self.key_id(), encoded).map_err(|e| {
            miette!(
                "invalid master key: {}",
                e.detail().unwrap_or("unreadable key")
            )
        })
    }

    pub fn access_policy(&self) -> Result<AccessPolicy> {
        match self.tpp_client_id.as_deref() {
            Some(client_id) if !client_id.is_empty() => {
                Ok(AccessPolicy::new(client_id, self.required_scope.clone()))
            }
            _ => Err(miette!(
                "the payments endpoint needs a client id (--tpp-client-id or TPP_CLIENT_ID)"
            )),
        }
    }

    pub fn rules(&self) -> RuleSet {
        RuleSet::with_high_amount_threshold(self.high_amount_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rust_decimal_macros::dec;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: VaultConfig,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["cardvault"]).unwrap();
        assert_eq!(cli.config.key_id, "alias/cardvault");
        assert_eq!(cli.config.required_scope, DEFAULT_PAYMENTS_SCOPE);
        assert_eq!(cli.config.high_amount_threshold, dec!(5000));
    }

    #[test]
    fn test_kms_requires_valid_key() {
        let cli = TestCli::try_parse_from(["cardvault", "--master-key", "c2hvcnQ="]).unwrap();
        assert!(cli.config.kms().is_err());

        let key = LocalKms::generate_key();
        let cli = TestCli::try_parse_from(["cardvault", "--master-key", key.as_str()]).unwrap();
        assert!(cli.config.kms().is_ok());
    }

    #[test]
    fn test_access_policy_requires_client_id() {
        let cli = TestCli::try_parse_from(["cardvault", "--tpp-client-id", ""]).unwrap();
        assert!(cli.config.access_policy().is_err());

        let cli = TestCli::try_parse_from(["cardvault", "--tpp-client-id", "tpp-1"]).unwrap();
        let policy = cli.config.access_policy().unwrap();
        assert_eq!(policy.client_id, "tpp-1");
    }
}
