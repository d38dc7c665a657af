use crate::digest::sha256_hex;
use crate::error::Result;
use crate::models::WorkerEnvelope;

/**
 * \brief 已签名的请求：`body` 是信封唯一的一次序列化结果，发送时必须原样使用。
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub body: String,
    pub signature: String,
}

/**
 * \brief 序列化信封并计算 `sha256(body ++ secret)`。
 */
pub fn sign(envelope: &WorkerEnvelope, secret_key: &str) -> Result<SignedRequest> {
    let body = serde_json::to_string(envelope)?;
    let signature = signature_for(&body, secret_key);
    Ok(SignedRequest { body, signature })
}

pub fn signature_for(body: &str, secret_key: &str) -> String {
    let mut bytes = Vec::with_capacity(body.len() + secret_key.len());
    bytes.extend_from_slice(body.as_bytes());
    bytes.extend_from_slice(secret_key.as_bytes());
    sha256_hex(&bytes)
}
