use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] yomu_util::http::Error),
    #[error("bad payload: {0}")]
    BadPayload(String),
    #[error("{message}")]
    Api { code: i64, message: String },
    #[error("access restricted, try changing the user agent in the source preferences")]
    AccessRestricted,
    #[error("username or password is empty")]
    MissingCredentials,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid preference {name}: {reason}")]
    InvalidPreference { name: String, reason: String },
    #[error("preferences error: {0}")]
    Preferences(#[from] yomu_util::prefs::Error),
    #[error(transparent)]
    Input(#[from] yomu_lib::error::Error),
    #[error("failed to start background worker: {0}")]
    Worker(#[from] std::io::Error),
}
