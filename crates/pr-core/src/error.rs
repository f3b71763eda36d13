use thiserror::Error;

pub type PrResult<T> = Result<T, PrError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
