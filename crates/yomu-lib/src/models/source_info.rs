use serde::{Deserialize, Serialize};

/// A type represent source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceInfo {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub version: String,
    pub icon: String,
    /// Language code of the content, e.g. `zh`.
    pub language: String,
    pub nsfw: bool,
}
