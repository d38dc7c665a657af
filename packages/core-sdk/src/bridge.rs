use crate::config::BridgeConfig;
use crate::error::Result;
use crate::input::{final_prompt, normalize, Defaults};
use crate::models::{NormalizedInput, RawInputs};
use crate::payload::build_payload;
use crate::response::normalize_response;
use crate::signer::{sign, SignedRequest};
use crate::telemetry;
use crate::transport::ProxyClient;

/**
 * \brief 单次调用适配器：归一化 → 构建信封 → 签名 → 发送 → 归一化响应。
 *
 * 实例本身不可变，可在多个任务间共享；每次调用互不影响。
 */
#[derive(Debug, Clone)]
pub struct Bridge {
    client: ProxyClient,
    defaults: Defaults,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        Ok(Self {
            client: ProxyClient::new(config.endpoint)?,
            defaults: config.defaults,
        })
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /**
     * \brief 宿主入口：成功时返回文本或图片地址，失败时返回 `Error: ...`。
     */
    pub async fn invoke(&self, raw: &RawInputs) -> String {
        match self.try_invoke(raw).await {
            Ok(out) => out,
            Err(err) => err.to_result_string(),
        }
    }

    /**
     * \brief 与 invoke 相同，但保留结构化错误。
     */
    pub async fn try_invoke(&self, raw: &RawInputs) -> Result<String> {
        let (input, signed) = match self.prepare(raw) {
            Ok(prepared) => prepared,
            Err(err) => {
                telemetry::log_error("bridge.invoke", &telemetry::fields(&[("rejected", &err.kind())]));
                return Err(err);
            }
        };

        telemetry::log_event(
            "bridge.invoke",
            &telemetry::fields(&[
                ("provider", &input.provider),
                ("model", &input.model),
                ("prompt_len", &final_prompt(&input).len()),
                ("body_len", &signed.body.len()),
            ]),
        );

        let result = match self.client.send(&signed).await {
            Ok(resp) => {
                telemetry::log_event(
                    "bridge.invoke",
                    &telemetry::fields(&[
                        ("status", &resp.status),
                        ("response_len", &resp.body.len()),
                    ]),
                );
                normalize_response(&resp.body, input.provider)
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            telemetry::log_error(
                "bridge.invoke",
                &telemetry::fields(&[("provider", &input.provider), ("failed", &err.kind())]),
            );
        }
        result
    }

    /**
     * \brief 只做归一化与签名，不发送；用于排查代理端签名不匹配。
     */
    pub fn prepare(&self, raw: &RawInputs) -> Result<(NormalizedInput, SignedRequest)> {
        let input = normalize(raw, &self.defaults)?;
        let envelope = build_payload(&input);
        let signed = sign(&envelope, &input.secret_key)?;
        Ok((input, signed))
    }
}

/**
 * \brief 便捷函数：按配置构建一次性 Bridge 并调用，所有失败都返回文本。
 */
pub async fn invoke(config: BridgeConfig, raw: &RawInputs) -> String {
    match Bridge::new(config) {
        Ok(bridge) => bridge.invoke(raw).await,
        Err(err) => err.to_result_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputField, Provider};

    fn bridge() -> Bridge {
        Bridge::new(BridgeConfig::new("http://127.0.0.1:1").expect("config")).expect("bridge")
    }

    #[test]
    fn test_prepare_builds_signed_openai_envelope() {
        let raw = RawInputs {
            prompt: Some(InputField::text("Summarize")),
            secret_key: Some(InputField::text("k")),
            ..Default::default()
        };
        let (input, signed) = bridge().prepare(&raw).expect("prepare");
        assert_eq!(input.provider, Provider::OpenAI);
        assert_eq!(
            signed.body,
            r#"{"provider":"openai","payload":{"model":"gpt-4o-mini","messages":[{"role":"user","content":"Summarize"}],"temperature":0.6,"max_tokens":200}}"#
        );
        assert_eq!(signed.signature.len(), 64);
    }

    #[tokio::test]
    async fn test_validation_errors_flatten_without_network() {
        let out = bridge().invoke(&RawInputs::default()).await;
        assert_eq!(out, "Error: Secret Key is required");

        let raw = RawInputs {
            secret_key: Some(InputField::text("k")),
            ..Default::default()
        };
        assert_eq!(
            bridge().invoke(&raw).await,
            "Error: Prompt or Column data is required"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_flattens_to_error_string() {
        let raw = RawInputs {
            prompt: Some(InputField::text("hi")),
            secret_key: Some(InputField::text("k")),
            ..Default::default()
        };
        let out = bridge().invoke(&raw).await;
        assert!(out.starts_with("Error: request failed"), "got {out}");
    }
}
