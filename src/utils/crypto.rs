use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha256};

/// MD5 digest of an upload, used for per-user duplicate detection.
pub fn calculate_md5(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// 32 random bytes, hex encoded. Handed to the user; only its SHA-256 is stored.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn hash_reset_token(token: &str) -> String {
    calculate_sha256(token.as_bytes())
}
