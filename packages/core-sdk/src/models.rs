use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/**
 * \brief 代理支持的上游 Provider。
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "google-image")]
    GoogleImage,
}

impl Provider {
    /** \brief 线路上使用的标识字符串。 */
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Google => "google",
            Provider::Anthropic => "anthropic",
            Provider::GoogleImage => "google-image",
        }
    }

    /** \brief 是否走图片生成的请求形状。 */
    pub fn is_image(&self) -> bool {
        matches!(self, Provider::GoogleImage)
    }
}

impl FromStr for Provider {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAI),
            "google" => Ok(Provider::Google),
            "anthropic" => Ok(Provider::Anthropic),
            "google-image" => Ok(Provider::GoogleImage),
            other => Err(BridgeError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
 * \brief 宿主传入的单个字段容器，真实值位于 `value` 中。
 *
 * 反序列化是宽松的：只有 `{"value": ...}` 形式才携带值，裸值、`null`
 * 以及缺少 `value` 的对象都视为缺失，由归一化阶段补默认值。
 */
#[derive(Debug, Clone, Default, Serialize)]
pub struct InputField {
    pub value: Option<Value>,
}

impl<'de> Deserialize<'de> for InputField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = match Value::deserialize(deserializer)? {
            Value::Object(mut map) => map.remove("value").filter(|v| !v.is_null()),
            _ => None,
        };
        Ok(Self { value })
    }
}

impl InputField {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(Value::String(value.into())),
        }
    }

    /**
     * \brief 以文本形式读取值；数字与布尔按其字面量转为字符串，其余类型视为缺失。
     */
    pub fn as_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/**
 * \brief 原始调用参数，每个字段都可能缺失。
 */
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInputs {
    #[serde(default)]
    pub column_data: Option<InputField>,
    #[serde(default)]
    pub prompt: Option<InputField>,
    #[serde(default)]
    pub secret_key: Option<InputField>,
    #[serde(default)]
    pub provider: Option<InputField>,
    #[serde(default)]
    pub model: Option<InputField>,
    #[serde(default)]
    pub temperature: Option<InputField>,
    #[serde(default)]
    pub max_tokens: Option<InputField>,
    #[serde(default)]
    pub aspect_ratio: Option<InputField>,
}

/**
 * \brief 归一化后的输入，字段均已填充默认值并通过校验。
 */
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub column_data: String,
    pub prompt: String,
    pub secret_key: String,
    pub provider: Provider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub aspect_ratio: String,
}

/**
 * \brief 消息结构，与 OpenAI Chat 消息格式对齐。
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /** \brief 角色：system/user/assistant */
    pub role: String,
    /** \brief 内容 */
    pub content: String,
}

/**
 * \brief 对话类 Provider 的请求体。字段顺序即序列化顺序，签名依赖于此。
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/**
 * \brief 图片生成请求体。
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderPayload {
    Chat(ChatPayload),
    Image(ImagePayload),
}

/**
 * \brief 发往代理的外层信封 `{provider, payload}`。
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerEnvelope {
    pub provider: Provider,
    pub payload: ProviderPayload,
}
