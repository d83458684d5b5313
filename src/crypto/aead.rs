use super::{DerivedKey, NONCE_LEN, SALT_CHARS};
use crate::error::{CryptError, Result};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroizing;

const SALT_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|e| {
        tracing::error!(error = %e, "OS random generator unavailable");
        CryptError::EncryptionFailure
    })
}

/// Generate a fresh nonce
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;
    Ok(nonce)
}

/// Generate a random alphanumeric salt of the required length
pub fn generate_salt() -> Result<String> {
    let mut salt = String::with_capacity(SALT_CHARS);
    let mut buf = [0u8; 32];

    while salt.len() < SALT_CHARS {
        secure_random(&mut buf)?;
        // 248 = 4 * 62, rejecting the rest keeps the pick unbiased
        for b in buf.iter().filter(|b| **b < 248) {
            if salt.len() == SALT_CHARS {
                break;
            }
            salt.push(SALT_ALPHABET[(*b as usize) % SALT_ALPHABET.len()] as char);
        }
    }

    Ok(salt)
}

/// Encrypt plaintext, returning ciphertext with the 16-byte tag appended
pub fn encrypt(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptError::EncryptionFailure)
}

/// Decrypt and authenticate ciphertext
///
/// Any failure is reported as [`CryptError::AuthenticationFailure`].
pub fn decrypt(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptError::AuthenticationFailure)?;
    Ok(Zeroizing::new(plaintext))
}
