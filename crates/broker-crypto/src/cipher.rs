//! The `xor-sha256` sealing cipher.
//!
//! A deliberately simple keyed stream cipher used only within the
//! session-key envelope. Ciphertext is integrity-covered by the HMAC-bound
//! capability token, not by this cipher — do not swap it for an AEAD
//! without redesigning the token structure, and keep the `"xor-sha256"`
//! algorithm tag in sealed records as a version marker.

use sha2::{Digest, Sha256};

use crate::error::{CryptoError, CryptoResult};

/// Algorithm tag stored alongside sealed records.
pub const ALGORITHM: &str = "xor-sha256";

const BLOCK_LEN: usize = 32;

/// XOR `data` against a SHA-256 keystream seeded from `session_key_hex`,
/// re-hashing the keystream block every 32 bytes. Symmetric: calling this
/// twice with the same key returns the original input.
///
/// # Errors
///
/// Returns an error if `session_key_hex` is not valid hex or decodes to an
/// empty byte string.
pub fn xor_stream(session_key_hex: &str, data: &[u8]) -> CryptoResult<Vec<u8>> {
    let key_bytes =
        hex::decode(session_key_hex).map_err(|e| CryptoError::InvalidHexEncoding(e.to_string()))?;
    if key_bytes.is_empty() {
        return Err(CryptoError::EmptyKey);
    }

    let mut block: [u8; BLOCK_LEN] = Sha256::digest(&key_bytes).into();
    let mut idx = 0usize;
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        out.push(byte ^ block[idx]);
        idx += 1;
        if idx == BLOCK_LEN {
            block = Sha256::digest(block).into();
            idx = 0;
        }
    }
    Ok(out)
}

/// Seal a UTF-8 plaintext secret with the session key, returning
/// base64-encoded ciphertext ready for a sealed record.
///
/// # Errors
///
/// Returns an error if `session_key_hex` is invalid.
pub fn seal(session_key_hex: &str, plaintext: &str) -> CryptoResult<String> {
    use base64::Engine;
    let ciphertext = xor_stream(session_key_hex, plaintext.as_bytes())?;
    Ok(base64::engine::general_purpose::STANDARD.encode(ciphertext))
}

/// Unseal a base64-encoded ciphertext produced by [`seal`], returning the
/// original UTF-8 plaintext.
///
/// # Errors
///
/// Returns an error if the ciphertext is not valid base64, the key is
/// invalid, or the decrypted bytes are not valid UTF-8.
pub fn unseal(session_key_hex: &str, ciphertext_b64: &str) -> CryptoResult<String> {
    use base64::Engine;
    let ciphertext = base64::engine::general_purpose::STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::InvalidBase64Encoding(e.to_string()))?;
    let plaintext = xor_stream(session_key_hex, &ciphertext)?;
    String::from_utf8(plaintext).map_err(|e| CryptoError::InvalidUtf8(e.to_string()))
}
