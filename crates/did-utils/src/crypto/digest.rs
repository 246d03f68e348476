use sha2::{Digest, Sha256};

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Lowercase hex form, used for blank node hashes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha256(bytes))
}

/// Signing input of the LD and JCS suites: the hash of the canonical proof
/// options followed by the hash of the canonical document.
pub fn options_then_document(canon_options: &str, canon_document: &str) -> Vec<u8> {
    [sha256(canon_options.as_bytes()), sha256(canon_document.as_bytes())].concat()
}
