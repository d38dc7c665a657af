use thiserror::Error;

/**
 * \brief 一次调用中可能出现的全部失败类型，最终都会被拍平成 `Error: ...` 文本。
 */
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Secret Key is required")]
    MissingCredential,

    #[error("Prompt or Column data is required")]
    MissingContent,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("proxy returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("empty or malformed response from proxy")]
    EmptyOrMalformedResponse,

    #[error("unrecognized response shape: {dump}")]
    UnrecognizedShape { dump: String },

    #[error("{message}")]
    Upstream { message: String },

    #[error("serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BridgeError {
    /** \brief 日志中使用的简短类别名。 */
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::MissingCredential => "missing_credential",
            BridgeError::MissingContent => "missing_content",
            BridgeError::UnknownProvider(_) => "unknown_provider",
            BridgeError::Transport { .. } => "transport",
            BridgeError::Http { .. } => "http",
            BridgeError::EmptyOrMalformedResponse => "empty_or_malformed",
            BridgeError::UnrecognizedShape { .. } => "unrecognized_shape",
            BridgeError::Upstream { .. } => "upstream",
            BridgeError::Serialize(_) => "serialize",
        }
    }

    /** \brief 宿主看到的最终文本。 */
    pub fn to_result_string(&self) -> String {
        format!("Error: {}", self)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
