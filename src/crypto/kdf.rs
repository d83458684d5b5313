use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

use super::{DEFAULT_ITERATIONS, KEY_LEN, MIN_ITERATIONS};
use crate::error::{CryptError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(CryptError::InvalidIterations);
        }
        Ok(())
    }
}

/// A 256-bit AES key derived from a passphrase.
///
/// The bytes are wiped on drop and never leave the crate.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive an AES-256 key with PBKDF2-HMAC-SHA256.
///
/// The salt is used as its raw UTF-8 bytes. Every call re-derives; there is
/// no cache.
pub fn derive_key(passphrase: &str, salt: &str, kdf: KdfParams) -> Result<DerivedKey> {
    kdf.validate()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        salt.as_bytes(),
        kdf.iterations,
        &mut key[..],
    );

    Ok(DerivedKey(key))
}
