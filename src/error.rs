use thiserror::Error;

/// Caller-facing classification of a [`VaultError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }
}

/// Errors produced by the vault.
///
/// The `Display` output of every variant is safe to hand back to a caller.
/// Collaborator faults (`Crypto`, `Store`, `Emission`) keep their diagnostic
/// detail in the variant; it is only ever written to the logs.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("{0}")]
    Validation(String),
    #[error("Forbidden: TPP-only payments endpoint.")]
    Unauthorized,
    #[error("Invalid token")]
    NotFound,
    #[error("internal error")]
    Crypto(String),
    #[error("internal error")]
    Store(String),
    #[error("event emission failed")]
    Emission(String),
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Validation(_) => ErrorKind::BadRequest,
            VaultError::Unauthorized => ErrorKind::Forbidden,
            VaultError::NotFound => ErrorKind::NotFound,
            VaultError::Crypto(_) | VaultError::Store(_) | VaultError::Emission(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Internal detail for observability. Never include this in a response.
    pub fn detail(&self) -> Option<&str> {
        match self {
            VaultError::Crypto(detail) | VaultError::Store(detail) | VaultError::Emission(detail) => {
                Some(detail)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Store(format!("Serialization error: {}", e))
    }
}

impl From<csv::Error> for VaultError {
    fn from(e: csv::Error) -> Self {
        VaultError::Validation(format!("CSV error: {}", e))
    }
}

impl From<std::io::Error> for VaultError {
    fn from(e: std::io::Error) -> Self {
        VaultError::Store(format!("IO error: {}", e))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for VaultError {
    fn from(e: rocksdb::Error) -> Self {
        VaultError::Store(format!("RocksDB error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_faults_hide_detail() {
        let err = VaultError::Crypto("tag mismatch for key alias/cards".to_string());
        assert_eq!(err.to_string(), "internal error");
        assert_eq!(err.detail(), Some("tag mismatch for key alias/cards"));
        assert_eq!(err.status_code(), 500);

        let err = VaultError::Store("column family missing".to_string());
        assert_eq!(err.to_string(), "internal error");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(
            VaultError::Validation("x".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(VaultError::Unauthorized.status_code(), 403);
        assert_eq!(VaultError::NotFound.status_code(), 404);
        assert_eq!(VaultError::NotFound.detail(), None);
    }
}
