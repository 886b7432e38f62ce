use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("duplicate check name: {0}")]
    DuplicateCheck(String),
    #[error("unknown check: {0}")]
    UnknownCheck(String),
    #[error("check {check}: {field} column is empty")]
    EmptyColumn { check: String, field: &'static str },
    #[error("check {check}: precision {precision} outside -10..=10")]
    PrecisionOutOfRange { check: String, precision: i32 },
    #[error("check {0}: updatable checks need a staging type")]
    MissingStagingType(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
