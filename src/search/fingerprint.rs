//! Content fingerprint used as the dedup key / 内容指纹（去重键）

use sha2::{Digest, Sha256};

/// SHA256 of the UTF-8 bytes, lowercase hex (64 chars) / 计算SHA256哈希
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
