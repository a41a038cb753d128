use std::time::Duration;
use thiserror::Error;

/// Failures raised while talking to the payment gateway.
///
/// These never reach the UI directly: the tip flow folds them into a step and
/// a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Could not reach the payment gateway: {0}")]
    Transport(String),
    #[error("Gateway request failed. Error {status}. {message}")]
    Http { status: u16, message: String },
    #[error("Could not decode gateway response: {0}")]
    Decode(String),
    #[error("Gateway did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum TipError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Cannot {action} while the tip flow is at step {step}")]
    InvalidTransition { step: String, action: &'static str },
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TipError>;
