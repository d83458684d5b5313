//! Password-based text encryption.
//!
//! A passphrase, a 12-character salt and an iteration count are stretched
//! with PBKDF2-HMAC-SHA256 into an AES-256-GCM key. Encryption output is
//! `nonce || ciphertext || tag`, rendered as hex or base64.
//!
//! [`encrypt`] and [`decrypt`] keep the bare layout, so the caller must
//! resupply the same salt and iteration count to decrypt.
//! [`encrypt_envelope`] and [`decrypt_envelope`] store both alongside the
//! ciphertext instead.

mod crypto;
mod error;
pub mod format;
pub mod validate;

pub use crate::crypto::{
    DEFAULT_ITERATIONS, KdfParams, MIN_BLOB_LEN, MIN_ITERATIONS, NONCE_LEN, SALT_CHARS, TAG_LEN,
    generate_salt,
};
pub use crate::error::{CryptError, Result};
pub use crate::format::Encoding;

use crate::format::Envelope;
use tracing::{Span, debug, field, instrument, warn};
use zeroize::Zeroizing;

/// Encrypt `text` under a key derived from `key`, `salt` and `iterations`.
///
/// Inputs are checked in the order key, salt, iterations, text. Key
/// derivation and encryption run on the blocking thread pool.
///
/// # Panics
///
/// Panics if polled outside a Tokio runtime, because the work is handed to
/// [`tokio::task::spawn_blocking`]. Callers on other executors should use
/// [`encrypt_blocking`] or [`decrypt_blocking`].
#[instrument(name = "encrypt", skip_all, fields(format = %format, iterations = field::Empty))]
pub async fn encrypt(
    key: &str,
    text: &str,
    salt: &str,
    iterations: &str,
    format: Encoding,
) -> Result<String> {
    let kdf = validated(validate::check_inputs(key, salt, iterations, text))?;
    Span::current().record("iterations", kdf.iterations());

    let blob = seal_offloaded(key, text, salt, kdf).await?;
    Ok(format::encode(&blob, format))
}

/// Like [`encrypt`], with an already-parsed iteration count.
///
/// # Panics
///
/// Same as [`encrypt`].
#[instrument(name = "encrypt", skip_all, fields(format = %format, iterations = kdf.iterations()))]
pub async fn encrypt_with_params(
    key: &str,
    text: &str,
    salt: &str,
    kdf: KdfParams,
    format: Encoding,
) -> Result<String> {
    validated(check_typed_inputs(key, salt, kdf, text))?;

    let blob = seal_offloaded(key, text, salt, kdf).await?;
    Ok(format::encode(&blob, format))
}

/// Recover the plaintext produced by [`encrypt`].
///
/// Every cryptographic failure, whether a wrong passphrase, salt, iteration
/// count or altered data, is reported as [`CryptError::AuthenticationFailure`].
///
/// # Panics
///
/// Same as [`encrypt`].
#[instrument(name = "decrypt", skip_all, fields(format = %format, iterations = field::Empty))]
pub async fn decrypt(
    key: &str,
    input: &str,
    salt: &str,
    iterations: &str,
    format: Encoding,
) -> Result<String> {
    let kdf = validated(validate::check_inputs(key, salt, iterations, input))?;
    Span::current().record("iterations", kdf.iterations());

    let blob = validated(decode_blob(input, format))?;
    open_offloaded(key, blob, salt, kdf).await
}

/// Like [`decrypt`], with an already-parsed iteration count.
///
/// # Panics
///
/// Same as [`encrypt`].
#[instrument(name = "decrypt", skip_all, fields(format = %format, iterations = kdf.iterations()))]
pub async fn decrypt_with_params(
    key: &str,
    input: &str,
    salt: &str,
    kdf: KdfParams,
    format: Encoding,
) -> Result<String> {
    validated(check_typed_inputs(key, salt, kdf, input))?;

    let blob = validated(decode_blob(input, format))?;
    open_offloaded(key, blob, salt, kdf).await
}

/// Encrypt and embed the salt and iteration count in the output.
///
/// # Panics
///
/// Same as [`encrypt`].
#[instrument(name = "encrypt_envelope", skip_all, fields(format = %format, iterations = field::Empty))]
pub async fn encrypt_envelope(
    key: &str,
    text: &str,
    salt: &str,
    iterations: &str,
    format: Encoding,
) -> Result<String> {
    let kdf = validated(validate::check_inputs(key, salt, iterations, text))?;
    Span::current().record("iterations", kdf.iterations());

    let blob = seal_offloaded(key, text, salt, kdf).await?;
    let envelope = Envelope::new(kdf.iterations(), salt.to_string(), blob);
    let bytes = format::serialize_envelope(&envelope)?;
    Ok(format::encode(&bytes, format))
}

/// Decrypt output of [`encrypt_envelope`]; salt and iterations come from the input.
///
/// # Panics
///
/// Same as [`encrypt`].
#[instrument(name = "decrypt_envelope", skip_all, fields(format = %format, iterations = field::Empty))]
pub async fn decrypt_envelope(key: &str, input: &str, format: Encoding) -> Result<String> {
    let envelope = validated(open_envelope(key, input, format))?;
    let kdf = validated(envelope_params(&envelope))?;
    Span::current().record("iterations", kdf.iterations());

    let salt = envelope.salt().to_string();
    open_offloaded(key, envelope.blob().to_vec(), &salt, kdf).await
}

/// Blocking form of [`encrypt`] for callers without an async runtime.
pub fn encrypt_blocking(
    key: &str,
    text: &str,
    salt: &str,
    iterations: &str,
    format: Encoding,
) -> Result<String> {
    let kdf = validated(validate::check_inputs(key, salt, iterations, text))?;
    let blob = seal(key, text, salt, kdf)?;
    Ok(format::encode(&blob, format))
}

/// Blocking form of [`decrypt`] for callers without an async runtime.
pub fn decrypt_blocking(
    key: &str,
    input: &str,
    salt: &str,
    iterations: &str,
    format: Encoding,
) -> Result<String> {
    let kdf = validated(validate::check_inputs(key, salt, iterations, input))?;
    let blob = validated(decode_blob(input, format))?;
    open(key, &blob, salt, kdf)
}

fn validated<T>(result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        debug!(kind = err.kind(), "input rejected");
    }
    result
}

fn check_typed_inputs(key: &str, salt: &str, kdf: KdfParams, text: &str) -> Result<()> {
    validate::check_key(key)?;
    validate::check_salt(salt)?;
    kdf.validate()?;
    validate::check_text(text)
}

fn decode_blob(input: &str, format: Encoding) -> Result<Vec<u8>> {
    let blob = validate::check_encoding(input, format)?;
    validate::check_blob_len(&blob)?;
    Ok(blob)
}

fn open_envelope(key: &str, input: &str, format: Encoding) -> Result<Envelope> {
    validate::check_key(key)?;
    validate::check_text(input)?;
    let bytes = validate::check_encoding(input, format)?;
    format::parse_envelope(&bytes)
}

fn envelope_params(envelope: &Envelope) -> Result<KdfParams> {
    validate::check_salt(envelope.salt())?;
    KdfParams::new(envelope.iterations())
}

fn seal(key: &str, text: &str, salt: &str, kdf: KdfParams) -> Result<Vec<u8>> {
    debug!("deriving key");
    let derived = crypto::derive_key(key, salt, kdf)?;
    let nonce = crypto::generate_nonce()?;

    debug!(len = text.len(), "encrypting");
    let ciphertext = crypto::encrypt(&derived, &nonce, text.as_bytes())?;
    Ok(format::pack(&nonce, &ciphertext))
}

fn open(key: &str, blob: &[u8], salt: &str, kdf: KdfParams) -> Result<String> {
    let (nonce, ciphertext) = format::unpack(blob)?;

    debug!("deriving key");
    let derived = crypto::derive_key(key, salt, kdf)?;

    debug!(len = ciphertext.len(), "decrypting");
    let plaintext = crypto::decrypt(&derived, &nonce, ciphertext).inspect_err(|_| {
        warn!("authentication failed");
    })?;

    Ok(String::from_utf8_lossy(&plaintext).into_owned())
}

async fn seal_offloaded(key: &str, text: &str, salt: &str, kdf: KdfParams) -> Result<Vec<u8>> {
    let key = Zeroizing::new(key.to_owned());
    let text = Zeroizing::new(text.to_owned());
    let salt = salt.to_owned();
    offload(move || seal(&key, &text, &salt, kdf)).await
}

async fn open_offloaded(key: &str, blob: Vec<u8>, salt: &str, kdf: KdfParams) -> Result<String> {
    let key = Zeroizing::new(key.to_owned());
    let salt = salt.to_owned();
    offload(move || open(&key, &blob, &salt, kdf)).await
}

async fn offload<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let span = Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(work))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "crypto task failed");
            CryptError::Internal
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "correct-horse";
    const TEXT: &str = "attack at dawn";
    const SALT: &str = "abcdefghijkl";
    const ITER: &str = "1000";

    #[tokio::test]
    async fn hex_scenario_roundtrip() {
        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();

        assert!(out.len() >= 56);
        assert_eq!(out.len(), 2 * (NONCE_LEN + TEXT.len() + TAG_LEN));
        assert!(out.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));

        let back = decrypt(KEY, &out, SALT, ITER, Encoding::Hex).await.unwrap();
        assert_eq!(back, TEXT);
    }

    #[tokio::test]
    async fn base64_scenario_roundtrip() {
        use base64::{Engine, engine::general_purpose::STANDARD};

        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Base64).await.unwrap();
        assert!(STANDARD.decode(&out).is_ok());

        let back = decrypt(KEY, &out, SALT, ITER, Encoding::Base64).await.unwrap();
        assert_eq!(back, TEXT);
    }

    #[tokio::test]
    async fn decrypts_known_ciphertext() {
        let input = "000102030405060708090a0b\
                     c95b7883fe00ec8620b77ac4a0097bc188beb3447be358d2a470735c9c5b";

        assert_eq!(decrypt(KEY, input, SALT, ITER, Encoding::Hex).await.unwrap(), TEXT);
        assert_eq!(
            decrypt(KEY, &input.to_uppercase(), SALT, ITER, Encoding::Hex)
                .await
                .unwrap(),
            TEXT
        );
    }

    #[test]
    fn blocking_api_needs_no_runtime() {
        assert!(tokio::runtime::Handle::try_current().is_err());

        let out = encrypt_blocking(KEY, TEXT, SALT, ITER, Encoding::Base64).unwrap();
        assert_eq!(decrypt_blocking(KEY, &out, SALT, ITER, Encoding::Base64).unwrap(), TEXT);
    }

    #[tokio::test]
    async fn text_is_preserved_exactly() {
        for text in [" padded ", "multi\nline\n", "ünïcødé ✓", "x"] {
            let out = encrypt(KEY, text, SALT, ITER, Encoding::Base64).await.unwrap();
            let back = decrypt(KEY, &out, SALT, ITER, Encoding::Base64).await.unwrap();
            assert_eq!(back, text);
        }
    }

    #[tokio::test]
    async fn every_flipped_byte_is_detected() {
        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        let blob = format::decode(&out, Encoding::Hex).unwrap();

        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x80;
            let input = format::encode(&tampered, Encoding::Hex);
            assert_eq!(
                decrypt(KEY, &input, SALT, ITER, Encoding::Hex).await,
                Err(CryptError::AuthenticationFailure),
                "byte {i}"
            );
        }
    }

    #[tokio::test]
    async fn wrong_key_salt_or_iterations_fail_the_same_way() {
        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();

        let attempts = [
            ("battery-staple", SALT, ITER),
            (KEY, "abcdefghijkm", ITER),
            (KEY, SALT, "1001"),
        ];
        for (key, salt, iterations) in attempts {
            assert_eq!(
                decrypt(key, &out, salt, iterations, Encoding::Hex).await,
                Err(CryptError::AuthenticationFailure)
            );
        }
    }

    #[tokio::test]
    async fn repeated_encryption_uses_fresh_nonces() {
        let a = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        let b = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();

        assert_ne!(a, b);
        assert_ne!(a[..2 * NONCE_LEN], b[..2 * NONCE_LEN]);
        assert_eq!(decrypt(KEY, &a, SALT, ITER, Encoding::Hex).await.unwrap(), TEXT);
        assert_eq!(decrypt(KEY, &b, SALT, ITER, Encoding::Hex).await.unwrap(), TEXT);
    }

    #[tokio::test]
    async fn salt_and_iteration_boundaries() {
        assert_eq!(
            encrypt(KEY, TEXT, "abcdefghijk", ITER, Encoding::Hex).await,
            Err(CryptError::InvalidSaltLength)
        );
        assert_eq!(
            encrypt(KEY, TEXT, "abcdefghijklm", ITER, Encoding::Hex).await,
            Err(CryptError::InvalidSaltLength)
        );
        assert_eq!(
            encrypt(KEY, TEXT, SALT, "999", Encoding::Hex).await,
            Err(CryptError::InvalidIterations)
        );
        assert!(encrypt(KEY, TEXT, SALT, "1000", Encoding::Hex).await.is_ok());
    }

    #[tokio::test]
    async fn validation_order_is_key_salt_iterations_text() {
        assert_eq!(
            encrypt("", "", "", "", Encoding::Hex).await,
            Err(CryptError::EmptyKey)
        );
        assert_eq!(
            decrypt(KEY, "", "", "", Encoding::Hex).await,
            Err(CryptError::InvalidSaltLength)
        );
        assert_eq!(
            decrypt(KEY, "", SALT, "", Encoding::Hex).await,
            Err(CryptError::InvalidIterations)
        );
        assert_eq!(
            decrypt(KEY, " ", SALT, ITER, Encoding::Hex).await,
            Err(CryptError::EmptyText)
        );
    }

    #[tokio::test]
    async fn short_input_fails_before_key_derivation() {
        // With this many iterations a derivation would not finish in test time.
        let input = "00".repeat(20);
        assert_eq!(
            decrypt(KEY, &input, SALT, "4000000000", Encoding::Hex).await,
            Err(CryptError::TooShort)
        );
    }

    #[tokio::test]
    async fn malformed_input_is_invalid_encoding() {
        for (input, format) in [
            ("not hex!", Encoding::Hex),
            ("abc", Encoding::Hex),
            ("@@@@", Encoding::Base64),
        ] {
            assert_eq!(
                decrypt(KEY, input, SALT, ITER, format).await,
                Err(CryptError::InvalidEncoding)
            );
        }
    }

    #[tokio::test]
    async fn format_flag_must_match() {
        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        // hex digits are valid base64 characters, so this decodes to other bytes
        let result = decrypt(KEY, &out, SALT, ITER, Encoding::Base64).await;
        assert!(result.is_err());
        assert_ne!(result, Ok(TEXT.to_string()));
    }

    #[tokio::test]
    async fn typed_params_match_text_params() {
        let kdf = KdfParams::new(1000).unwrap();
        let out = encrypt_with_params(KEY, TEXT, SALT, kdf, Encoding::Base64)
            .await
            .unwrap();

        assert_eq!(
            decrypt(KEY, &out, SALT, ITER, Encoding::Base64).await.unwrap(),
            TEXT
        );
        assert_eq!(
            decrypt_with_params(KEY, &out, SALT, kdf, Encoding::Base64)
                .await
                .unwrap(),
            TEXT
        );
    }

    #[tokio::test]
    async fn blocking_and_async_interoperate() {
        let out = encrypt_blocking(KEY, TEXT, SALT, ITER, Encoding::Hex).unwrap();
        assert_eq!(decrypt(KEY, &out, SALT, ITER, Encoding::Hex).await.unwrap(), TEXT);

        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        assert_eq!(decrypt_blocking(KEY, &out, SALT, ITER, Encoding::Hex).unwrap(), TEXT);
    }

    #[tokio::test]
    async fn envelope_roundtrip_without_salt() {
        for format in [Encoding::Hex, Encoding::Base64] {
            let out = encrypt_envelope(KEY, TEXT, SALT, "1500", format).await.unwrap();
            assert_eq!(decrypt_envelope(KEY, &out, format).await.unwrap(), TEXT);
        }
    }

    #[tokio::test]
    async fn envelope_wrong_key_fails() {
        let out = encrypt_envelope(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        assert_eq!(
            decrypt_envelope("nope", &out, Encoding::Hex).await,
            Err(CryptError::AuthenticationFailure)
        );
    }

    #[tokio::test]
    async fn envelope_rejects_weak_embedded_iterations() {
        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        let blob = format::decode(&out, Encoding::Hex).unwrap();
        let forged = Envelope::new(10, SALT.to_string(), blob);
        let input = format::encode(
            &format::serialize_envelope(&forged).unwrap(),
            Encoding::Hex,
        );

        assert_eq!(
            decrypt_envelope(KEY, &input, Encoding::Hex).await,
            Err(CryptError::InvalidIterations)
        );
    }

    #[tokio::test]
    async fn bare_blob_is_not_an_envelope() {
        let out = encrypt(KEY, TEXT, SALT, ITER, Encoding::Hex).await.unwrap();
        assert_eq!(
            decrypt_envelope(KEY, &out, Encoding::Hex).await,
            Err(CryptError::InvalidEncoding)
        );
    }
}
