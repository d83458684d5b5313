//! Cryptographic primitives.
//!
//! Provides PBKDF2 key derivation and AES-256-GCM encryption.

pub mod aead;
pub mod kdf;

pub use aead::{decrypt, encrypt, generate_nonce, generate_salt};
pub use kdf::{DerivedKey, KdfParams, derive_key};

/// Required salt length, counted in characters.
pub const SALT_CHARS: usize = 12;
/// Length of the AES-GCM nonce (12 bytes).
pub const NONCE_LEN: usize = 12;
/// Length of the authentication tag appended by AES-GCM (16 bytes / 128 bits).
pub const TAG_LEN: usize = 16;
/// Length of the derived key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Smallest blob accepted for decryption: nonce plus tag.
pub const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;
/// Lowest accepted PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 1000;
/// Iteration count used when the caller does not pick one.
pub const DEFAULT_ITERATIONS: u32 = 100_000;
