use reqwest::Url;
use thiserror::Error;

use crate::input::{parse_max_tokens, parse_temperature, Defaults};
use crate::models::Provider;

pub const ENV_ENDPOINT: &str = "PROXYBRIDGE_ENDPOINT";
pub const ENV_TELEMETRY: &str = "PROXYBRIDGE_TELEMETRY";

/**
 * \brief 桥接配置：代理地址、默认值与遥测开关。
 */
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub endpoint: Url,
    pub defaults: Defaults,
    pub telemetry: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PROXYBRIDGE_ENDPOINT is required")]
    MissingEndpoint,
    #[error("invalid endpoint {0}: {1}")]
    InvalidEndpoint(String, String),
}

impl BridgeConfig {
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            defaults: Defaults::default(),
            telemetry: false,
        })
    }

    /**
     * \brief 从环境变量读取配置。
     *
     * - `PROXYBRIDGE_ENDPOINT`（必填）
     * - `PROXYBRIDGE_DEFAULT_MODEL` / `_TEMPERATURE` / `_MAX_TOKENS` / `_ASPECT_RATIO` / `_PROVIDER`
     * - `PROXYBRIDGE_TELEMETRY`（`1` 或 `true` 开启文件日志）
     */
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(None)
    }

    /**
     * \brief 同 from_env，但允许调用方（如命令行参数）覆盖代理地址。
     */
    pub fn from_env_with(endpoint: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(with_endpoint(endpoint, |key| std::env::var(key).ok()))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;
        let mut config = Self::new(&endpoint)?;

        let base = Defaults::default();
        config.defaults = Defaults {
            model: lookup("PROXYBRIDGE_DEFAULT_MODEL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(base.model),
            temperature: parse_temperature(lookup("PROXYBRIDGE_DEFAULT_TEMPERATURE").as_deref())
                .unwrap_or(base.temperature),
            max_tokens: parse_max_tokens(lookup("PROXYBRIDGE_DEFAULT_MAX_TOKENS").as_deref())
                .unwrap_or(base.max_tokens),
            aspect_ratio: lookup("PROXYBRIDGE_DEFAULT_ASPECT_RATIO")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(base.aspect_ratio),
            provider: lookup("PROXYBRIDGE_DEFAULT_PROVIDER")
                .and_then(|s| s.trim().parse::<Provider>().ok())
                .unwrap_or(base.provider),
        };
        config.telemetry = lookup(ENV_TELEMETRY)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(config)
    }
}

fn with_endpoint<'a, F>(endpoint: Option<&'a str>, lookup: F) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key| match (key, endpoint) {
        (ENV_ENDPOINT, Some(e)) => Some(e.to_string()),
        _ => lookup(key),
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEndpoint(raw.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint(
            raw.to_string(),
            format!("unsupported scheme {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_endpoint_required() {
        let err = BridgeConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndpoint));
    }

    #[test]
    fn test_endpoint_must_be_http() {
        assert!(parse_endpoint("ftp://proxy.example").is_err());
        assert!(parse_endpoint("not a url").is_err());
        let url = parse_endpoint("https://proxy.example.workers.dev").expect("valid url");
        assert_eq!(url.as_str(), "https://proxy.example.workers.dev/");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "https://proxy.example"),
            ("PROXYBRIDGE_DEFAULT_TEMPERATURE", "0.7"),
            ("PROXYBRIDGE_DEFAULT_MAX_TOKENS", "500"),
            ("PROXYBRIDGE_DEFAULT_PROVIDER", "anthropic"),
            (ENV_TELEMETRY, "true"),
        ]))
        .expect("config");
        assert_eq!(config.defaults.temperature, 0.7);
        assert_eq!(config.defaults.max_tokens, 500);
        assert_eq!(config.defaults.provider, Provider::Anthropic);
        assert_eq!(config.defaults.model, "gpt-4o-mini");
        assert!(config.telemetry);
    }

    #[test]
    fn test_endpoint_override_keeps_other_env_values() {
        let env = lookup(&[
            (ENV_ENDPOINT, "https://env.example"),
            ("PROXYBRIDGE_DEFAULT_MODEL", "gpt-4o"),
        ]);
        let config = BridgeConfig::from_lookup(with_endpoint(Some("http://127.0.0.1:8787"), env))
            .expect("config");
        assert_eq!(config.endpoint.as_str(), "http://127.0.0.1:8787/");
        assert_eq!(config.defaults.model, "gpt-4o");

        let config = BridgeConfig::from_lookup(with_endpoint(Some("https://flag.example"), lookup(&[])))
            .expect("config without env endpoint");
        assert_eq!(config.endpoint.as_str(), "https://flag.example/");

        let config = BridgeConfig::from_lookup(with_endpoint(
            None,
            lookup(&[(ENV_ENDPOINT, "https://env.example")]),
        ))
        .expect("config");
        assert_eq!(config.endpoint.as_str(), "https://env.example/");

        let err = BridgeConfig::from_lookup(with_endpoint(Some("ftp://x"), lookup(&[]))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint(..)));
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "https://proxy.example"),
            ("PROXYBRIDGE_DEFAULT_TEMPERATURE", "hot"),
            ("PROXYBRIDGE_DEFAULT_MAX_TOKENS", "lots"),
        ]))
        .expect("config");
        assert_eq!(config.defaults, Defaults::default());
        assert!(!config.telemetry);
    }
}
