use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::models::Provider;

const DUMP_LIMIT: usize = 200;

#[derive(Deserialize)]
struct UpstreamFailure {
    error: Value,
}

#[derive(Deserialize)]
struct ImageReply {
    image_url: String,
}

// Only choices[0] matters; siblings stay untyped so they cannot break the decode.
#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Value>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Deserialize)]
struct ContentReply {
    content: ContentField,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentField {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiReply {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentBlock>,
}

/**
 * \brief 代理响应的归类结果。
 */
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    Upstream(String),
    Image(String),
    Text(String),
    Unrecognized(Value),
}

/**
 * \brief 将代理响应体归一化为单个字符串。
 * \param body     响应体原文
 * \param provider 本次请求的 Provider，决定是否接受 image_url
 */
pub fn normalize_response(body: &str, provider: Provider) -> Result<String> {
    let value = parse_body(body)?;
    match classify(&value, provider) {
        ResponseShape::Image(url) | ResponseShape::Text(url) => Ok(url),
        ResponseShape::Upstream(message) => Err(BridgeError::Upstream { message }),
        ResponseShape::Unrecognized(raw) => Err(BridgeError::UnrecognizedShape {
            dump: truncate(&raw.to_string(), DUMP_LIMIT),
        }),
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(BridgeError::EmptyOrMalformedResponse);
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => Err(BridgeError::EmptyOrMalformedResponse),
        Ok(v) => Ok(v),
    }
}

/**
 * \brief 依次尝试已知的响应形状，先匹配者胜出。
 */
pub fn classify(value: &Value, provider: Provider) -> ResponseShape {
    if let Some(failure) = decode::<UpstreamFailure>(value) {
        if !failure.error.is_null() {
            return ResponseShape::Upstream(error_message(&failure.error));
        }
    }

    if provider.is_image() {
        if let Some(reply) = decode::<ImageReply>(value) {
            if !reply.image_url.is_empty() {
                return ResponseShape::Image(reply.image_url);
            }
        }
    }

    let extractors: [fn(&Value) -> Option<String>; 4] = [
        choice_message_content,
        choice_text,
        top_level_content,
        gemini_parts,
    ];
    extractors
        .iter()
        .find_map(|extract| extract(value).filter(|s| !s.is_empty()))
        .map(ResponseShape::Text)
        .unwrap_or_else(|| ResponseShape::Unrecognized(value.clone()))
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(m)) => m.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}

fn first_choice(value: &Value) -> Option<Choice> {
    let first = decode::<ChatCompletion>(value)?.choices.into_iter().next()?;
    decode::<Choice>(&first)
}

fn choice_message_content(value: &Value) -> Option<String> {
    let message = first_choice(value)?.message?;
    string_leaf(decode::<ChoiceMessage>(&message)?.content?)
}

fn choice_text(value: &Value) -> Option<String> {
    string_leaf(first_choice(value)?.text?)
}

fn string_leaf(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn top_level_content(value: &Value) -> Option<String> {
    match decode::<ContentReply>(value)?.content {
        ContentField::Text(s) => Some(s),
        ContentField::Blocks(blocks) => Some(join_text(blocks)),
    }
}

fn gemini_parts(value: &Value) -> Option<String> {
    let candidate = decode::<GeminiReply>(value)?.candidates.into_iter().next()?;
    Some(join_text(candidate.content.parts))
}

fn join_text(blocks: Vec<ContentBlock>) -> String {
    blocks
        .into_iter()
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("")
}

fn truncate(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
