use std::sync::Arc;

use fancy_regex::Regex;
use once_cell::sync::Lazy;
use yomu_lib::models::PageInfo;

use crate::{
    chapter_manga_slug,
    config::Quality,
    dto::ChapterPageList,
    error::Error,
    transport::{Auth, Transport},
};

static QUALITY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(c|h)(800|1200|1500)x\.").expect("valid regex"));

pub fn pages_path(chapter_path: &str) -> String {
    format!("/api/v3/{}?platform=3", chapter_path.trim_start_matches('/'))
}

/// Points an image URL at the `quality` rendition.
pub fn rewrite_quality(url: &str, quality: Quality) -> String {
    let replacement = format!("c{}x.", quality.as_str());
    QUALITY_TOKEN
        .replace_all(url, replacement.as_str())
        .into_owned()
}

/// Orders the images of a chapter belonging to manga `slug`.
///
/// Entries from other manga are dropped first; the rest are sorted by the `words`
/// value at their original position, entries without one going last.
pub fn resolve_pages(
    list: ChapterPageList,
    slug: &str,
    quality: Quality,
) -> Result<Vec<PageInfo>, Error> {
    if list.show_app {
        return Err(Error::AccessRestricted);
    }

    let needle = format!("/{slug}/");
    let words = list.chapter.words;
    let mut contents: Vec<(usize, String)> = list
        .chapter
        .contents
        .into_iter()
        .enumerate()
        .filter(|(_, content)| content.url.contains(&needle))
        .map(|(position, content)| (position, content.url))
        .collect();
    contents.sort_by_key(|(position, _)| words.get(*position).copied().unwrap_or(i64::MAX));

    Ok(contents
        .into_iter()
        .enumerate()
        .map(|(index, (_, url))| PageInfo {
            index,
            url: rewrite_quality(&url, quality),
        })
        .collect())
}

pub struct PageResolver {
    transport: Arc<Transport>,
}

impl PageResolver {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn pages(&self, chapter_path: &str) -> Result<Vec<PageInfo>, Error> {
        let slug = chapter_manga_slug(chapter_path)?;
        let list: ChapterPageList = self
            .transport
            .get_json(&pages_path(chapter_path), Auth::Default)?;
        resolve_pages(list, slug, self.transport.settings().quality)
    }
}
