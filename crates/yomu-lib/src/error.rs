use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("input {name} expects {expected}")]
    InvalidInputState { name: String, expected: &'static str },
}
