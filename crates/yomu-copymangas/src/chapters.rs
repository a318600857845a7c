use std::sync::Arc;

use yomu_lib::models::{ChapterGroup, ChapterInfo};

use crate::{
    config::{CHAPTER_PAGE_SIZE, GroupOrder},
    dto::{ChapterDto, ListPage},
    error::Error,
    localize::Localizer,
    manga_slug,
    transport::{Auth, Transport},
};

pub const DEFAULT_GROUP: &str = "default";

pub fn group_path(slug: &str, key: &str, offset: i64) -> String {
    format!(
        "/api/v3/comic/{slug}/group/{key}/chapters?limit={CHAPTER_PAGE_SIZE}&offset={offset}&platform=3"
    )
}

/// Order in which groups are listed in the merged chapter list.
pub fn merge_order(groups: &[ChapterGroup], order: GroupOrder) -> Vec<&ChapterGroup> {
    match order {
        GroupOrder::AsListed => groups.iter().collect(),
        GroupOrder::SupplementaryFirst => groups
            .iter()
            .filter(|g| g.key != DEFAULT_GROUP)
            .chain(groups.iter().filter(|g| g.key == DEFAULT_GROUP))
            .collect(),
    }
}

pub struct ChapterAggregator {
    transport: Arc<Transport>,
}

impl ChapterAggregator {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Every chapter of `group`, oldest first. The server lists newest first.
    pub fn fetch_group(
        &self,
        slug: &str,
        group: &ChapterGroup,
        localizer: &Localizer,
    ) -> Result<Vec<ChapterInfo>, Error> {
        let mut chapters: Vec<ChapterDto> = Vec::new();
        let mut offset = 0;
        loop {
            let page: ListPage<ChapterDto> = self
                .transport
                .get_json(&group_path(slug, &group.key, offset), Auth::Default)?;
            chapters.reserve(page.list.len());
            chapters.extend(page.list);

            offset += if page.limit > 0 {
                page.limit
            } else {
                CHAPTER_PAGE_SIZE
            };
            if offset >= page.total {
                break;
            }
        }
        debug!("{} chapters in group {} of {}", chapters.len(), group.key, slug);

        let prefix = (group.key != DEFAULT_GROUP).then(|| localizer.localize(&group.name));
        Ok(chapters
            .into_iter()
            .rev()
            .enumerate()
            .map(|(i, chapter)| chapter.into_chapter_info(prefix.as_deref(), (i + 1) as f64))
            .collect())
    }

    /// Chapters of every group of the manga at `path`, merged per the configured
    /// [`GroupOrder`]. Any failed page fails the whole list.
    pub fn chapters(&self, path: &str, groups: &[ChapterGroup]) -> Result<Vec<ChapterInfo>, Error> {
        let settings = self.transport.settings();
        let localizer = Localizer::new(settings.localize);
        let slug = manga_slug(path);

        let mut result = Vec::new();
        for group in merge_order(groups, settings.group_order) {
            result.extend(self.fetch_group(slug, group, &localizer)?);
        }
        Ok(result)
    }
}
