use std::collections::HashMap;

use crate::models::{ChapterInfo, Input, MangaInfo, MangaPage, PageInfo, SourceInfo};
use anyhow::Result;

/// Contract between a host and a manga source.
///
/// Every call is synchronous. Implementations must tolerate concurrent calls from
/// different host threads.
pub trait Extension: Send + Sync {
    fn get_source_info(&self) -> SourceInfo;

    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn filter_list(&self) -> Vec<Input> {
        vec![]
    }

    fn get_preferences(&self) -> Result<Vec<Input>> {
        Ok(vec![])
    }

    fn set_preferences(&self, _preferences: Vec<Input>) -> Result<()> {
        Ok(())
    }

    fn get_popular_manga(&self, page: i64) -> Result<MangaPage>;

    fn get_latest_manga(&self, page: i64) -> Result<MangaPage>;

    fn search_manga(
        &self,
        page: i64,
        query: Option<String>,
        filters: Option<Vec<Input>>,
    ) -> Result<MangaPage>;

    fn get_manga_detail(&self, path: String) -> Result<MangaInfo>;

    fn get_chapters(&self, path: String) -> Result<Vec<ChapterInfo>>;

    /// Same as [`Extension::get_chapters`], but lets a source reuse whatever the
    /// detail call already embedded in `manga`.
    fn get_chapters_for(&self, manga: &MangaInfo) -> Result<Vec<ChapterInfo>> {
        self.get_chapters(manga.path.clone())
    }

    fn get_pages(&self, path: String) -> Result<Vec<PageInfo>>;
}
