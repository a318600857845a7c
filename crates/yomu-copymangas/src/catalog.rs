use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};

use url::form_urlencoded::Serializer;
use yomu_lib::models::{Input, MangaInfo, MangaPage};

use crate::{
    config::PAGE_SIZE,
    dto::{Comic, ComicDetail, Keyword, ListPage},
    error::Error,
    filters::{CatalogQuery, Param, search_scope},
    localize::{Localizer, to_simplified},
    manga_slug,
    transport::{Auth, Transport},
};

const COMICS: &str = "/api/v3/comics";
const SEARCH: &str = "/api/v3/search/comic";
const GENRES: &str = "/api/v3/theme/comic/count?limit=500&offset=0&free_type=1&platform=3";

pub const POPULAR: &str = "-popular";
pub const LATEST: &str = "-datetime_updated";

/// Offset of a 1-based page; pages below 1 count as the first.
pub fn offset(page: i64) -> i64 {
    (page.max(1) - 1) * PAGE_SIZE
}

fn paged(page: i64) -> Serializer<'static, String> {
    let mut query = Serializer::new(String::new());
    query
        .append_pair("limit", &PAGE_SIZE.to_string())
        .append_pair("offset", &offset(page).to_string());
    query
}

/// `/api/v3/comics` sorted by `ordering`.
pub fn listing_path(ordering: &str, page: i64) -> String {
    let query = CatalogQuery {
        ordering: Some(ordering.to_string()),
        ..Default::default()
    };
    browse_path(&query, page)
}

/// `/api/v3/comics` narrowed by the catalog filters that are set.
pub fn browse_path(filter: &CatalogQuery, page: i64) -> String {
    let mut query = paged(page);
    query.append_pair("free_type", "1");
    for (key, value) in [
        ("theme", &filter.theme),
        ("top", &filter.top),
        ("ordering", &filter.ordering),
    ] {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    query.append_pair("platform", "3");
    format!("{COMICS}?{}", query.finish())
}

pub fn search_path(keyword: &str, scope: Option<&str>, page: i64) -> String {
    let mut query = paged(page);
    query.append_pair("q", keyword);
    if let Some(scope) = scope {
        query.append_pair("q_type", scope);
    }
    query.append_pair("platform", "3");
    format!("{SEARCH}?{}", query.finish())
}

pub fn detail_path(path: &str) -> String {
    format!("/api/v3/comic2/{}?platform=3", manga_slug(path))
}

pub struct Catalog {
    transport: Arc<Transport>,
    genres: RwLock<Vec<Param>>,
    fetching_genres: AtomicBool,
}

impl Catalog {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            genres: RwLock::new(vec![]),
            fetching_genres: AtomicBool::new(false),
        }
    }

    fn localizer(&self) -> Localizer {
        Localizer::new(self.transport.settings().localize)
    }

    fn list(&self, path: &str, auth: Auth) -> Result<MangaPage, Error> {
        let page: ListPage<Comic> = self.transport.get_json(path, auth)?;
        let localizer = self.localizer();
        Ok(MangaPage {
            has_next_page: page.has_next_page(),
            manga: page.list.iter().map(|c| c.to_manga(&localizer)).collect(),
        })
    }

    pub fn popular(&self, page: i64) -> Result<MangaPage, Error> {
        self.list(&listing_path(POPULAR, page), Auth::Default)
    }

    pub fn latest(&self, page: i64) -> Result<MangaPage, Error> {
        self.list(&listing_path(LATEST, page), Auth::Default)
    }

    /// A non-blank query searches by text and only honours the search scope;
    /// otherwise the catalog filters apply.
    pub fn search(
        &self,
        page: i64,
        query: Option<&str>,
        filters: &[Input],
    ) -> Result<MangaPage, Error> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(keyword) => {
                let scope = search_scope(filters)?;
                self.list(&search_path(keyword, scope.as_deref(), page), Auth::Search)
            }
            None => {
                let filter = CatalogQuery::from_filters(filters, &self.genres())?;
                self.list(&browse_path(&filter, page), Auth::Default)
            }
        }
    }

    pub fn detail(&self, path: &str) -> Result<MangaInfo, Error> {
        let detail: ComicDetail = self.transport.get_json(&detail_path(path), Auth::Default)?;
        Ok(detail.into_manga_info(&self.localizer()))
    }

    /// Cached genres, empty until a prefetch succeeded.
    pub fn genres(&self) -> Vec<Param> {
        self.genres
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Claims the prefetch slot. `false` when genres are cached or a fetch is running.
    pub fn begin_genre_fetch(&self) -> bool {
        if !self.genres().is_empty() {
            return false;
        }
        self.fetching_genres
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn cancel_genre_fetch(&self) {
        self.fetching_genres.store(false, Ordering::SeqCst);
    }

    pub fn run_genre_fetch(&self) {
        match self.fetch_genres() {
            Ok(genres) => {
                info!("fetched {} genres", genres.len() - 1);
                *self.genres.write().unwrap_or_else(PoisonError::into_inner) = genres;
            }
            Err(e) => error!("failed to fetch genres: {}", e),
        }
        self.fetching_genres.store(false, Ordering::SeqCst);
    }

    fn fetch_genres(&self) -> Result<Vec<Param>, Error> {
        let mut page: ListPage<Keyword> = self.transport.get_json(GENRES, Auth::Default)?;
        page.list.sort_by(|a, b| a.name.cmp(&b.name));

        let mut genres = Vec::with_capacity(page.list.len() + 1);
        genres.push(Param::new("全部", ""));
        genres.extend(page.list.into_iter().map(|k| Param {
            name: to_simplified(&k.name),
            value: k.path_word,
        }));
        Ok(genres)
    }
}
