use std::fmt;

use chrono::NaiveDate;
use serde::{
    Deserialize, Deserializer,
    de::{self, MapAccess, Visitor},
};
use yomu_lib::models::{ChapterGroup, ChapterInfo, MangaInfo, MangaStatus};

use crate::{ID, MANGA_PREFIX, localize::Localizer, localize::to_simplified};

const THUMBNAIL_SUFFIX: &str = ".328x422.jpg";

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub results: T,
}

#[derive(Debug, Deserialize)]
pub struct ResultMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListPage<T> {
    pub total: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

impl<T> ListPage<T> {
    pub fn has_next_page(&self) -> bool {
        self.offset + self.limit < self.total
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub path_word: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValueDisplay {
    pub value: i64,
    pub display: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comic {
    pub name: String,
    pub path_word: String,
    #[serde(default)]
    pub author: Vec<Keyword>,
    #[serde(default)]
    pub cover: String,
    pub region: Option<ValueDisplay>,
    pub status: Option<ValueDisplay>,
    pub theme: Option<Vec<Keyword>>,
    pub brief: Option<String>,
}

impl Comic {
    /// Listing entry: identity, title, authors and cover only.
    pub fn to_manga(&self, localizer: &Localizer) -> MangaInfo {
        MangaInfo {
            source_id: ID,
            title: localizer.localize(&self.name),
            author: self.author.iter().map(|a| a.name.clone()).collect(),
            path: format!("{MANGA_PREFIX}{}", self.path_word),
            cover_url: self
                .cover
                .strip_suffix(THUMBNAIL_SUFFIX)
                .unwrap_or(&self.cover)
                .to_string(),
            ..Default::default()
        }
    }

    fn manga_status(&self) -> MangaStatus {
        match self.status.as_ref().map(|s| s.value) {
            Some(0) => MangaStatus::Ongoing,
            Some(1) | Some(2) => MangaStatus::Completed,
            _ => MangaStatus::Unknown,
        }
    }

    /// Region display name first, then the theme names, always simplified.
    fn genres(&self) -> Vec<String> {
        self.region
            .iter()
            .map(|region| region.display.as_str())
            .chain(self.theme.iter().flatten().map(|theme| theme.name.as_str()))
            .map(to_simplified)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupDto {
    pub path_word: String,
    pub name: String,
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComicDetail {
    pub comic: Comic,
    #[serde(default, deserialize_with = "ordered_groups")]
    pub groups: Vec<GroupDto>,
}

impl ComicDetail {
    pub fn into_manga_info(self, localizer: &Localizer) -> MangaInfo {
        let mut manga = self.comic.to_manga(localizer);
        manga.description = self.comic.brief.as_deref().map(|b| localizer.localize(b));
        manga.genre = self.comic.genres();
        manga.status = self.comic.manga_status();
        manga.chapter_groups = Some(
            self.groups
                .into_iter()
                .map(|g| ChapterGroup {
                    key: g.path_word,
                    name: g.name,
                    count: g.count,
                })
                .collect(),
        );
        manga
    }
}

// The detail response keys groups by slug in display order, so the values are
// collected in the order they appear rather than through a HashMap.
fn ordered_groups<'de, D>(deserializer: D) -> Result<Vec<GroupDto>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedGroups;

    impl<'de> Visitor<'de> for OrderedGroups {
        type Value = Vec<GroupDto>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of chapter groups or null")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![])
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![])
        }

        fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(1));
            while let Some((_, group)) = map.next_entry::<String, GroupDto>()? {
                groups.push(group);
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_any(OrderedGroups)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterDto {
    pub uuid: String,
    pub name: String,
    pub comic_path_word: String,
    #[serde(default)]
    pub datetime_created: String,
}

impl ChapterDto {
    pub fn path(&self) -> String {
        format!("{MANGA_PREFIX}{}/chapter2/{}", self.comic_path_word, self.uuid)
    }

    /// `group` is the display name to prefix, `None` for the default group.
    pub fn into_chapter_info(self, group: Option<&str>, number: f64) -> ChapterInfo {
        let title = match group {
            Some(group) => format!("{group}：{}", self.name),
            None => self.name.clone(),
        };
        ChapterInfo {
            source_id: ID,
            manga_path: format!("{MANGA_PREFIX}{}", self.comic_path_word),
            path: self.path(),
            uploaded: parse_date(&self.datetime_created),
            id: self.uuid,
            title,
            number,
            scanlator: group.map(str::to_string),
        }
    }
}

/// Unix seconds of a `YYYY-MM-DD...` date, 0 when unparsable.
pub fn parse_date(date: &str) -> i64 {
    date.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterContents {
    #[serde(default)]
    pub contents: Vec<ImageUrl>,
    #[serde(default)]
    pub words: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterPageList {
    pub chapter: ChapterContents,
    #[serde(default)]
    pub show_app: bool,
}

#[derive(Debug, Deserialize)]
pub struct TokenDto {
    pub token: String,
}
