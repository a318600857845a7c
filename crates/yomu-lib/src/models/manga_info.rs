use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Unknown,
}

impl Default for MangaStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// A named, independently paginated chapter listing of one manga, usually one
/// scanlation team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChapterGroup {
    pub key: String,
    pub name: String,
    pub count: i64,
}

/// A type represent manga details, normalized across source
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MangaInfo {
    pub source_id: i64,
    pub title: String,
    pub author: Vec<String>,
    pub genre: Vec<String>,
    pub status: MangaStatus,
    pub description: Option<String>,
    pub path: String,
    pub cover_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_groups: Option<Vec<ChapterGroup>>,
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MangaPage {
    pub manga: Vec<MangaInfo>,
    pub has_next_page: bool,
}
