use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub const CODE_VERIFIER_LENGTH: usize = 128;
pub const STATE_LENGTH: usize = 16;

/// Random string of exactly `length` characters from `[A-Za-z0-9]`.
///
/// Uses the thread-local CSPRNG, so the output is suitable for PKCE
/// verifiers and anti-CSRF state values.
pub fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_code_verifier() -> String {
    generate_random_string(CODE_VERIFIER_LENGTH)
}

pub fn generate_state() -> String {
    generate_random_string(STATE_LENGTH)
}

/// S256 code challenge: unpadded base64url of the SHA-256 digest of the verifier.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Formats seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
