pub mod bridge;
pub mod config;
pub mod digest;
pub mod error;
pub mod input;
pub mod models;
pub mod payload;
pub mod response;
pub mod server;
pub mod signer;
pub mod telemetry;
pub mod transport;

pub use bridge::{invoke, Bridge};
pub use config::BridgeConfig;
pub use error::BridgeError;
