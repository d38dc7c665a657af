use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Url;

use crate::error::{BridgeError, Result};
use crate::signer::SignedRequest;

pub const SIGNATURE_HEADER: &str = "X-Signature";

/**
 * \brief 代理返回的原始响应（已确认为 2xx）。
 */
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/**
 * \brief 面向固定代理地址的 HTTP 客户端，单次调用只发送一次请求，不重试。
 */
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ProxyClient {
    pub fn new(endpoint: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BridgeError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /**
     * \brief 发送已签名的请求体。
     * \return 非 2xx 返回 Http 错误；网络层失败返回 Transport 错误
     */
    pub async fn send(&self, signed: &SignedRequest) -> Result<RawResponse> {
        let signature =
            HeaderValue::from_str(&signed.signature).map_err(|e| BridgeError::Transport {
                message: e.to_string(),
            })?;

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(signed.body.clone())
            .send()
            .await
            .map_err(transport_err)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BridgeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await.map_err(transport_err)?;
        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport_err(e: reqwest::Error) -> BridgeError {
    BridgeError::Transport {
        message: e.to_string(),
    }
}
