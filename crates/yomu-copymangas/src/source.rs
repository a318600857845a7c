use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use yomu_lib::prelude::*;
use yomu_util::{
    http::{HttpClient, UreqClient},
    prefs::PreferenceStore,
};

use crate::{
    ID, NAME,
    auth::{AuthManager, RefreshRequest, TokenState},
    catalog::Catalog,
    chapters::ChapterAggregator,
    config::{DEFAULT_IMAGE_USER_AGENT, Settings, SettingsHandle, SettingsUpdate},
    error::Error,
    filters::filter_list,
    pages::PageResolver,
    preferences,
    transport::Transport,
    worker::{Task, Worker},
};

pub struct CopyMangas {
    settings: Arc<SettingsHandle>,
    auth: Arc<AuthManager>,
    catalog: Arc<Catalog>,
    chapters: ChapterAggregator,
    pages: PageResolver,
    worker: Worker,
}

impl CopyMangas {
    /// Builds the source on top of a `ureq` client configured from `store`.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Result<Self, Error> {
        let settings = Settings::load(store.as_ref());
        let client = UreqClient::new(&settings.browser_user_agent, settings.insecure_tls);
        Self::with_client(store, Arc::new(client))
    }

    /// Builds the source around a host supplied client. Logs in first when the
    /// stored token is rejected and credentials are stored.
    pub fn with_client(
        store: Arc<dyn PreferenceStore>,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, Error> {
        let settings = Arc::new(SettingsHandle::load(store));
        let transport = Arc::new(Transport::new(client, settings.clone()));
        let auth = Arc::new(AuthManager::new(transport.clone()));
        let catalog = Arc::new(Catalog::new(transport.clone()));

        auth.bootstrap();
        let worker = Worker::spawn(auth.clone(), catalog.clone())?;

        Ok(Self {
            settings,
            chapters: ChapterAggregator::new(transport.clone()),
            pages: PageResolver::new(transport),
            auth,
            catalog,
            worker,
        })
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.snapshot()
    }

    pub fn update_settings(&self, update: SettingsUpdate) -> Result<(), Error> {
        self.update_all_settings(vec![update])
    }

    /// Stores `updates` together, or none of them if any is invalid.
    pub fn update_all_settings(&self, updates: Vec<SettingsUpdate>) -> Result<(), Error> {
        let changed = self.settings.update_all(updates)?;
        if changed.iter().any(SettingsUpdate::touches_credentials) {
            self.auth.reset();
        }
        Ok(())
    }

    pub fn token_state(&self) -> TokenState {
        self.auth.state()
    }

    /// Starts a background token refresh unless one is running or pointless.
    pub fn request_token_refresh(&self) -> RefreshRequest {
        let request = self.auth.begin_refresh();
        if request == RefreshRequest::Started && !self.worker.submit(Task::RefreshToken) {
            self.auth.run_refresh();
        }
        request
    }

    /// Logs in with the stored credentials right away and stores the token.
    pub fn login(&self) -> Result<(), Error> {
        let settings = self.settings();
        let token = self.auth.login(&settings.username, &settings.password)?;
        self.update_settings(SettingsUpdate::Token(token))
    }

    fn prefetch_genres(&self) {
        if self.catalog.begin_genre_fetch() && !self.worker.submit(Task::FetchGenres) {
            self.catalog.cancel_genre_fetch();
        }
    }

    /// Browser headers for opening web pages of the site.
    pub fn web_headers(&self) -> HashMap<String, String> {
        let settings = self.settings();
        HashMap::from([
            (
                "User-Agent".to_string(),
                settings.browser_user_agent.clone(),
            ),
            ("Referer".to_string(), settings.web_url()),
        ])
    }

    pub fn manga_url(&self, path: &str) -> String {
        format!("{}{}", self.settings().web_url(), path)
    }

    pub fn chapter_url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.settings().web_url(),
            path.replace("/chapter2/", "/chapter/")
        )
    }
}

impl Extension for CopyMangas {
    fn get_source_info(&self) -> SourceInfo {
        let web_url = self.settings().web_url();
        SourceInfo {
            id: ID,
            name: NAME.to_string(),
            icon: format!("{web_url}/favicon.ico"),
            url: web_url,
            version: env!("CARGO_PKG_VERSION").to_string(),
            language: "zh".to_string(),
            nsfw: false,
        }
    }

    /// Headers for image requests.
    fn headers(&self) -> HashMap<String, String> {
        HashMap::from([(
            "User-Agent".to_string(),
            DEFAULT_IMAGE_USER_AGENT.to_string(),
        )])
    }

    fn filter_list(&self) -> Vec<Input> {
        let genres = self.catalog.genres();
        if genres.is_empty() {
            self.prefetch_genres();
            filter_list(None)
        } else {
            filter_list(Some(&genres))
        }
    }

    fn get_preferences(&self) -> Result<Vec<Input>> {
        Ok(preferences::descriptors(&self.settings()))
    }

    fn set_preferences(&self, inputs: Vec<Input>) -> Result<()> {
        let changes = preferences::parse(&inputs)?;
        self.update_all_settings(changes.updates)?;
        if changes.refresh_token {
            info!("token refresh: {:?}", self.request_token_refresh());
        }
        Ok(())
    }

    fn get_popular_manga(&self, page: i64) -> Result<MangaPage> {
        Ok(self.catalog.popular(page)?)
    }

    fn get_latest_manga(&self, page: i64) -> Result<MangaPage> {
        Ok(self.catalog.latest(page)?)
    }

    fn search_manga(
        &self,
        page: i64,
        query: Option<String>,
        filters: Option<Vec<Input>>,
    ) -> Result<MangaPage> {
        Ok(self.catalog.search(
            page,
            query.as_deref(),
            filters.as_deref().unwrap_or_default(),
        )?)
    }

    fn get_manga_detail(&self, path: String) -> Result<MangaInfo> {
        Ok(self.catalog.detail(&path)?)
    }

    fn get_chapters(&self, path: String) -> Result<Vec<ChapterInfo>> {
        let manga = self.catalog.detail(&path)?;
        let groups = manga.chapter_groups.unwrap_or_default();
        Ok(self.chapters.chapters(&path, &groups)?)
    }

    fn get_chapters_for(&self, manga: &MangaInfo) -> Result<Vec<ChapterInfo>> {
        match &manga.chapter_groups {
            Some(groups) => Ok(self.chapters.chapters(&manga.path, groups)?),
            None => self.get_chapters(manga.path.clone()),
        }
    }

    fn get_pages(&self, path: String) -> Result<Vec<PageInfo>> {
        Ok(self.pages.pages(&path)?)
    }
}
