//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api base url {0:?}: must start with http:// or https://")]
    BaseUrl(String),

    #[error("invalid duration {0:?}")]
    Duration(String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("unknown poll step {0:?} (expected market, armour-shops or armour-inventory)")]
    UnknownStep(String),

    #[error("nothing to do: no poll steps configured and the shop collector is disabled")]
    NoWork,

    #[error("metrics listener {0} collides with the main listener")]
    ListenerCollision(std::net::SocketAddr),
}
