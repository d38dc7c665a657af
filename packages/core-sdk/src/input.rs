use crate::error::{BridgeError, Result};
use crate::models::{InputField, NormalizedInput, Provider, RawInputs};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/**
 * \brief 可配置的默认值集合，字段缺失时使用。
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub aspect_ratio: String,
    pub provider: Provider,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            provider: Provider::OpenAI,
        }
    }
}

/**
 * \brief 读取并校验原始参数。
 * \param raw      宿主传入的原始字段
 * \param defaults 缺省值
 * \return 校验失败时返回 MissingCredential / MissingContent / UnknownProvider
 */
pub fn normalize(raw: &RawInputs, defaults: &Defaults) -> Result<NormalizedInput> {
    let secret_key = text_or(&raw.secret_key, "");
    if secret_key.is_empty() {
        return Err(BridgeError::MissingCredential);
    }

    let prompt = text_or(&raw.prompt, "");
    let column_data = text_or(&raw.column_data, "");
    if prompt.is_empty() && column_data.is_empty() {
        return Err(BridgeError::MissingContent);
    }

    let provider = match present_text(&raw.provider) {
        Some(name) => name.trim().parse::<Provider>()?,
        None => defaults.provider,
    };

    Ok(NormalizedInput {
        column_data,
        prompt,
        secret_key,
        provider,
        model: present_text(&raw.model).unwrap_or_else(|| defaults.model.clone()),
        temperature: parse_temperature(present_text(&raw.temperature).as_deref())
            .or(Some(defaults.temperature).filter(|t| t.is_finite()))
            .unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: parse_max_tokens(present_text(&raw.max_tokens).as_deref())
            .unwrap_or(defaults.max_tokens),
        aspect_ratio: present_text(&raw.aspect_ratio)
            .unwrap_or_else(|| defaults.aspect_ratio.clone()),
    })
}

/**
 * \brief 组合最终提示词：仅 prompt、仅数据，或两者以 "\n\nData: " 拼接。
 */
pub fn final_prompt(input: &NormalizedInput) -> String {
    match (input.prompt.is_empty(), input.column_data.is_empty()) {
        (false, false) => format!("{}\n\nData: {}", input.prompt, input.column_data),
        (true, _) => input.column_data.clone(),
        (false, true) => input.prompt.clone(),
    }
}

fn text_or(field: &Option<InputField>, fallback: &str) -> String {
    field
        .as_ref()
        .and_then(InputField::as_text)
        .unwrap_or_else(|| fallback.to_string())
}

// Blank counts as absent for fields that carry a default.
fn present_text(field: &Option<InputField>) -> Option<String> {
    field
        .as_ref()
        .and_then(InputField::as_text)
        .filter(|s| !s.trim().is_empty())
}

pub fn parse_temperature(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|t| t.is_finite())
}

pub fn parse_max_tokens(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    // "256.0" style values coming from spreadsheet-like hosts
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}
