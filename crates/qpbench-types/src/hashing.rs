use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest
pub type Fingerprint = String;

/// Compute SHA-256 of raw bytes
pub fn compute_hash(data: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA-256 of the JSON encoding of a value.
///
/// Struct fields serialize in declaration order, so the digest is stable for
/// a given type definition.
pub fn compute_json_hash<T: serde::Serialize>(data: &T) -> Result<Fingerprint, serde_json::Error> {
    let json = serde_json::to_vec(data)?;
    Ok(compute_hash(&json))
}
