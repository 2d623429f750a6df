//! Error types shared by the rendering pipeline

use thiserror::Error;

/// A payoff function could not produce a usable value
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EvalError {
    #[error("payoff is not finite ({0})")]
    NonFinite(f64),
}

/// Rendering and configuration errors
#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("payoff evaluation failed at ({x}, {y}): {source}")]
    Evaluation {
        x: f64,
        y: f64,
        #[source]
        source: EvalError,
    },

    #[error("invalid domain bounds: {0}")]
    InvalidBounds(String),

    #[error("unknown gradient scheme '{0}'")]
    UnknownScheme(String),

    #[error("invalid gradient scheme: {0}")]
    InvalidScheme(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HeatmapError>;
