//! Error types for rigid.

use thiserror::Error;

/// Boundary-validation failures raised by constructors and operators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RigidError {
    #[error("unrecognized argument: {0}")]
    UnrecognizedArgument(String),

    #[error("length mismatch: cannot broadcast {left} elements against {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("invalid operand for {op}: {operand}")]
    InvalidOperandType {
        op: &'static str,
        operand: &'static str,
    },

    #[error("exponent must be an integer, got {0}")]
    NonIntegerExponent(f64),

    #[error("malformed quaternion component: {0}")]
    MalformedComponent(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for RigidError {
    fn from(e: std::io::Error) -> Self {
        RigidError::Config(e.to_string())
    }
}

impl From<ron::error::SpannedError> for RigidError {
    fn from(e: ron::error::SpannedError) -> Self {
        RigidError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RigidError>;
