use sha2::{Digest, Sha256};

/**
 * \brief 计算 SHA-256 摘要并输出小写十六进制（64 个字符，无前缀）。
 */
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
