use thiserror::Error;

pub type Result<T> = std::result::Result<T, CryptError>;

/// Every way an encrypt or decrypt call can fail.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptError {
    #[error("Key cannot be empty.")]
    EmptyKey,

    #[error("Salt must be exactly 12 characters long.")]
    InvalidSaltLength,

    #[error("Invalid number of iterations.")]
    InvalidIterations,

    #[error("Input text cannot be empty.")]
    EmptyText,

    #[error("Invalid input data format.")]
    InvalidEncoding,

    #[error("Invalid input data length.")]
    TooShort,

    #[error("Invalid decryption key or tampered data.")]
    AuthenticationFailure,

    #[error("Unsupported output format '{0}' (expected 'hex' or 'base64').")]
    UnsupportedFormat(String),

    #[error("Encryption failed.")]
    EncryptionFailure,

    #[error("Internal error: background task did not complete.")]
    Internal,
}

impl CryptError {
    /// Stable name of the error kind, for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyKey => "EmptyKey",
            Self::InvalidSaltLength => "InvalidSaltLength",
            Self::InvalidIterations => "InvalidIterations",
            Self::EmptyText => "EmptyText",
            Self::InvalidEncoding => "InvalidEncoding",
            Self::TooShort => "TooShort",
            Self::AuthenticationFailure => "AuthenticationFailure",
            Self::UnsupportedFormat(_) => "UnsupportedFormat",
            Self::EncryptionFailure => "EncryptionFailure",
            Self::Internal => "Internal",
        }
    }

    /// Returns `true` for errors caught by input validation, before any
    /// cryptographic work.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyKey
                | Self::InvalidSaltLength
                | Self::InvalidIterations
                | Self::EmptyText
                | Self::InvalidEncoding
                | Self::TooShort
                | Self::UnsupportedFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_line() {
        let all = [
            CryptError::EmptyKey,
            CryptError::InvalidSaltLength,
            CryptError::InvalidIterations,
            CryptError::EmptyText,
            CryptError::InvalidEncoding,
            CryptError::TooShort,
            CryptError::AuthenticationFailure,
            CryptError::UnsupportedFormat("rot13".into()),
            CryptError::EncryptionFailure,
            CryptError::Internal,
        ];
        for err in all {
            let msg = err.to_string();
            assert!(!msg.is_empty());
            assert!(!msg.contains('\n'), "{} has a multi-line message", err.kind());
        }
    }

    #[test]
    fn authentication_failure_is_not_a_validation_error() {
        assert!(!CryptError::AuthenticationFailure.is_validation());
        assert!(CryptError::TooShort.is_validation());
    }
}
