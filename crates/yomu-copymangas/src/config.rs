use std::{
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use yomu_util::prefs::PreferenceStore;

use crate::error::Error;

pub const DOMAINS: [&str; 3] = ["mangacopy.com", "copymanga.tv", "copymanga.site"];
const API_PREFIX: &str = "https://api.";
const WWW_PREFIX: &str = "https://www.";

pub const DEFAULT_VERSION: &str = "2.1.2";
pub const DEFAULT_IMAGE_USER_AGENT: &str = "Dart/2.16(dart:io)";
pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; ) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/103.0.5060.53 Mobile Safari/537.36";

pub const DEFAULT_RATE: u32 = 20;
pub const RATE_WINDOW: Duration = Duration::from_secs(61);

pub const PAGE_SIZE: i64 = 20;
pub const CHAPTER_PAGE_SIZE: i64 = 500;

/// Allowed per-window permit counts: 5, 10, ..., 60.
pub fn rate_values() -> Vec<u32> {
    (5..=60).step_by(5).collect()
}

pub mod keys {
    pub const DOMAIN: &str = "domainZ";
    pub const WEB_DOMAIN: &str = "webDomainZ";
    pub const OVERSEAS_CDN: &str = "changeCDNZ";
    pub const QUALITY: &str = "imageQualityZ";
    pub const LOCALIZE: &str = "showSCTitleZ";
    pub const WEBP: &str = "useWebpZ";
    pub const GROUP_RATE: &str = "groupApiRateZ";
    pub const CHAPTER_RATE: &str = "chapterApiRateZ";
    pub const ALWAYS_USE_TOKEN: &str = "alwaysUseTokenZ";
    pub const USERNAME: &str = "usernameZ";
    pub const PASSWORD: &str = "passwordZ";
    pub const TOKEN: &str = "tokenZ";
    pub const VERSION: &str = "versionZ";
    pub const BROWSER_USER_AGENT: &str = "browserUserAgent";
    pub const GROUP_ORDER: &str = "groupOrderZ";
    pub const INSECURE_TLS: &str = "insecureTlsZ";
}

/// Target resolution rewritten into page image URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    P800,
    P1200,
    P1500,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::P800, Quality::P1200, Quality::P1500];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P800 => "800",
            Quality::P1200 => "1200",
            Quality::P1500 => "1500",
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| Error::InvalidPreference {
                name: keys::QUALITY.to_string(),
                reason: format!("{s} is not one of 800, 1200, 1500"),
            })
    }
}

/// How chapter groups are laid out in a merged chapter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Every non-default group first, then the default group. Supplementary
    /// scanlations update less often, so they surface first in a newest-first view.
    #[default]
    SupplementaryFirst,
    /// Groups in the order the detail response lists them.
    AsListed,
}

impl GroupOrder {
    pub const ALL: [GroupOrder; 2] = [GroupOrder::SupplementaryFirst, GroupOrder::AsListed];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupOrder::SupplementaryFirst => "supplementary_first",
            GroupOrder::AsListed => "as_listed",
        }
    }
}

impl FromStr for GroupOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| Error::InvalidPreference {
                name: keys::GROUP_ORDER.to_string(),
                reason: format!("unknown group order {s}"),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub domain: usize,
    pub web_domain: usize,
    pub overseas_cdn: bool,
    pub quality: Quality,
    pub webp: bool,
    pub group_rate: u32,
    pub chapter_rate: u32,
    pub localize: bool,
    pub always_use_token: bool,
    pub username: String,
    pub password: String,
    pub token: String,
    pub version: String,
    pub browser_user_agent: String,
    pub group_order: GroupOrder,
    pub insecure_tls: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            domain: 0,
            web_domain: 0,
            overseas_cdn: false,
            quality: Quality::default(),
            webp: true,
            group_rate: DEFAULT_RATE,
            chapter_rate: DEFAULT_RATE,
            localize: false,
            always_use_token: false,
            username: String::new(),
            password: String::new(),
            token: String::new(),
            version: DEFAULT_VERSION.to_string(),
            browser_user_agent: DEFAULT_BROWSER_USER_AGENT.to_string(),
            group_order: GroupOrder::default(),
            insecure_tls: false,
        }
    }
}

fn domain_index(value: Option<String>) -> usize {
    value
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(DOMAINS.len() - 1)
}

/// Stored rates off the 5..=60 grid fall back to the default.
fn rate(value: Option<String>) -> u32 {
    value
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|r| rate_values().contains(r))
        .unwrap_or(DEFAULT_RATE)
}

impl Settings {
    /// Reads every setting from `store`, falling back to defaults for missing or
    /// malformed values.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let default = Settings::default();
        Self {
            domain: domain_index(store.get_string(keys::DOMAIN)),
            web_domain: domain_index(store.get_string(keys::WEB_DOMAIN)),
            overseas_cdn: store.bool_or(keys::OVERSEAS_CDN, default.overseas_cdn),
            quality: store
                .get_string(keys::QUALITY)
                .and_then(|q| q.parse().ok())
                .unwrap_or(default.quality),
            webp: store.bool_or(keys::WEBP, default.webp),
            group_rate: rate(store.get_string(keys::GROUP_RATE)),
            chapter_rate: rate(store.get_string(keys::CHAPTER_RATE)),
            localize: store.bool_or(keys::LOCALIZE, default.localize),
            always_use_token: store.bool_or(keys::ALWAYS_USE_TOKEN, default.always_use_token),
            username: store.string_or(keys::USERNAME, ""),
            password: store.string_or(keys::PASSWORD, ""),
            token: store.string_or(keys::TOKEN, ""),
            version: store.string_or(keys::VERSION, DEFAULT_VERSION),
            browser_user_agent: store.string_or(keys::BROWSER_USER_AGENT, DEFAULT_BROWSER_USER_AGENT),
            group_order: store
                .get_string(keys::GROUP_ORDER)
                .and_then(|o| o.parse().ok())
                .unwrap_or(default.group_order),
            insecure_tls: store.bool_or(keys::INSECURE_TLS, default.insecure_tls),
        }
    }

    pub fn api_url(&self) -> String {
        format!("{API_PREFIX}{}", DOMAINS[self.domain.min(DOMAINS.len() - 1)])
    }

    pub fn web_url(&self) -> String {
        format!("{WWW_PREFIX}{}", DOMAINS[self.web_domain.min(DOMAINS.len() - 1)])
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

/// One typed change to [`Settings`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    Domain(usize),
    WebDomain(usize),
    OverseasCdn(bool),
    Quality(Quality),
    Webp(bool),
    GroupRate(u32),
    ChapterRate(u32),
    Localize(bool),
    AlwaysUseToken(bool),
    Username(String),
    Password(String),
    Token(String),
    Version(String),
    BrowserUserAgent(String),
    GroupOrder(GroupOrder),
    InsecureTls(bool),
}

impl SettingsUpdate {
    /// Preference key the update is stored under.
    pub fn key(&self) -> &'static str {
        match self {
            SettingsUpdate::Domain(_) => keys::DOMAIN,
            SettingsUpdate::WebDomain(_) => keys::WEB_DOMAIN,
            SettingsUpdate::OverseasCdn(_) => keys::OVERSEAS_CDN,
            SettingsUpdate::Quality(_) => keys::QUALITY,
            SettingsUpdate::Webp(_) => keys::WEBP,
            SettingsUpdate::GroupRate(_) => keys::GROUP_RATE,
            SettingsUpdate::ChapterRate(_) => keys::CHAPTER_RATE,
            SettingsUpdate::Localize(_) => keys::LOCALIZE,
            SettingsUpdate::AlwaysUseToken(_) => keys::ALWAYS_USE_TOKEN,
            SettingsUpdate::Username(_) => keys::USERNAME,
            SettingsUpdate::Password(_) => keys::PASSWORD,
            SettingsUpdate::Token(_) => keys::TOKEN,
            SettingsUpdate::Version(_) => keys::VERSION,
            SettingsUpdate::BrowserUserAgent(_) => keys::BROWSER_USER_AGENT,
            SettingsUpdate::GroupOrder(_) => keys::GROUP_ORDER,
            SettingsUpdate::InsecureTls(_) => keys::INSECURE_TLS,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: String| Error::InvalidPreference {
            name: self.key().to_string(),
            reason,
        };
        match self {
            SettingsUpdate::Domain(i) | SettingsUpdate::WebDomain(i) if *i >= DOMAINS.len() => {
                Err(invalid(format!("domain index {i} out of range")))
            }
            SettingsUpdate::GroupRate(r) | SettingsUpdate::ChapterRate(r)
                if !rate_values().contains(r) =>
            {
                Err(invalid(format!("{r} requests per window is not allowed")))
            }
            SettingsUpdate::Version(v) if v.trim().is_empty() => {
                Err(invalid("version is empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn apply(&self, settings: &mut Settings) {
        match self.clone() {
            SettingsUpdate::Domain(v) => settings.domain = v,
            SettingsUpdate::WebDomain(v) => settings.web_domain = v,
            SettingsUpdate::OverseasCdn(v) => settings.overseas_cdn = v,
            SettingsUpdate::Quality(v) => settings.quality = v,
            SettingsUpdate::Webp(v) => settings.webp = v,
            SettingsUpdate::GroupRate(v) => settings.group_rate = v,
            SettingsUpdate::ChapterRate(v) => settings.chapter_rate = v,
            SettingsUpdate::Localize(v) => settings.localize = v,
            SettingsUpdate::AlwaysUseToken(v) => settings.always_use_token = v,
            SettingsUpdate::Username(v) => settings.username = v,
            SettingsUpdate::Password(v) => settings.password = v,
            SettingsUpdate::Token(v) => settings.token = v,
            SettingsUpdate::Version(v) => settings.version = v,
            SettingsUpdate::BrowserUserAgent(v) => settings.browser_user_agent = v,
            SettingsUpdate::GroupOrder(v) => settings.group_order = v,
            SettingsUpdate::InsecureTls(v) => settings.insecure_tls = v,
        }
    }

    fn persist(&self, store: &dyn PreferenceStore) -> Result<(), yomu_util::prefs::Error> {
        match self {
            SettingsUpdate::Domain(v) => store.set_string(keys::DOMAIN, &v.to_string()),
            SettingsUpdate::WebDomain(v) => store.set_string(keys::WEB_DOMAIN, &v.to_string()),
            SettingsUpdate::OverseasCdn(v) => store.set_bool(keys::OVERSEAS_CDN, *v),
            SettingsUpdate::Quality(v) => store.set_string(keys::QUALITY, v.as_str()),
            SettingsUpdate::Webp(v) => store.set_bool(keys::WEBP, *v),
            SettingsUpdate::GroupRate(v) => store.set_string(keys::GROUP_RATE, &v.to_string()),
            SettingsUpdate::ChapterRate(v) => {
                store.set_string(keys::CHAPTER_RATE, &v.to_string())
            }
            SettingsUpdate::Localize(v) => store.set_bool(keys::LOCALIZE, *v),
            SettingsUpdate::AlwaysUseToken(v) => store.set_bool(keys::ALWAYS_USE_TOKEN, *v),
            SettingsUpdate::Username(v) => store.set_string(keys::USERNAME, v),
            SettingsUpdate::Password(v) => store.set_string(keys::PASSWORD, v),
            SettingsUpdate::Token(v) => store.set_string(keys::TOKEN, v),
            SettingsUpdate::Version(v) => store.set_string(keys::VERSION, v),
            SettingsUpdate::BrowserUserAgent(v) => {
                store.set_string(keys::BROWSER_USER_AGENT, v)
            }
            SettingsUpdate::GroupOrder(v) => store.set_string(keys::GROUP_ORDER, v.as_str()),
            SettingsUpdate::InsecureTls(v) => store.set_bool(keys::INSECURE_TLS, *v),
        }
    }

    /// Credential changes make a previous refresh outcome meaningless.
    pub fn touches_credentials(&self) -> bool {
        matches!(
            self,
            SettingsUpdate::Username(_) | SettingsUpdate::Password(_) | SettingsUpdate::Token(_)
        )
    }

    /// Settings the transport only reads when it is built.
    pub fn needs_restart(&self) -> bool {
        matches!(
            self,
            SettingsUpdate::GroupRate(_)
                | SettingsUpdate::ChapterRate(_)
                | SettingsUpdate::InsecureTls(_)
                | SettingsUpdate::BrowserUserAgent(_)
        )
    }
}

/// Shared, thread-safe view of the current [`Settings`].
///
/// Readers take an `Arc` snapshot and keep using it for the whole request; updates
/// build a new snapshot and swap it in, so no reader sees a half-applied change.
pub struct SettingsHandle {
    current: RwLock<Arc<Settings>>,
    store: Arc<dyn PreferenceStore>,
}

impl SettingsHandle {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let settings = Settings::load(store.as_ref());
        Self {
            current: RwLock::new(Arc::new(settings)),
            store,
        }
    }

    pub fn snapshot(&self) -> Arc<Settings> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates, persists, then publishes `update`. Last write wins.
    ///
    /// Returns whether the settings changed; a no-op update is not persisted.
    pub fn update(&self, update: SettingsUpdate) -> Result<bool, Error> {
        Ok(!self.update_all(vec![update])?.is_empty())
    }

    /// Applies `updates` as one change: nothing is stored unless every update is
    /// valid, and readers see either none or all of them.
    ///
    /// Returns the updates that changed a value.
    pub fn update_all(&self, updates: Vec<SettingsUpdate>) -> Result<Vec<SettingsUpdate>, Error> {
        for update in &updates {
            update.validate()?;
        }

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = Settings::clone(&current);
        let mut changed = Vec::new();
        for update in updates {
            let before = next.clone();
            update.apply(&mut next);
            if next != before {
                changed.push(update);
            }
        }
        if changed.is_empty() {
            return Ok(changed);
        }

        for update in &changed {
            update.persist(self.store.as_ref())?;
        }
        *current = Arc::new(next);

        for update in changed.iter().filter(|u| u.needs_restart()) {
            info!("{:?} takes effect after the source is rebuilt", update);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use yomu_util::prefs::MemoryStore;

    #[test]
    fn test_load_defaults() {
        let settings = Settings::load(&MemoryStore::new());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_url(), "https://api.mangacopy.com");
        assert_eq!(settings.web_url(), "https://www.mangacopy.com");
    }

    #[test]
    fn test_load_coerces_out_of_range_values() {
        let store = MemoryStore::with_values([
            (keys::DOMAIN, json!("7")),
            (keys::WEB_DOMAIN, json!("1")),
            (keys::QUALITY, json!("9000")),
            (keys::GROUP_RATE, json!("nope")),
            (keys::CHAPTER_RATE, json!("35")),
            (keys::GROUP_ORDER, json!("as_listed")),
        ]);
        let settings = Settings::load(&store);

        assert_eq!(settings.domain, 2);
        assert_eq!(settings.api_url(), "https://api.copymanga.site");
        assert_eq!(settings.web_url(), "https://www.copymanga.tv");
        assert_eq!(settings.quality, Quality::P800);
        assert_eq!(settings.group_rate, DEFAULT_RATE);
        assert_eq!(settings.chapter_rate, 35);
        assert_eq!(settings.group_order, GroupOrder::AsListed);
    }

    #[test]
    fn test_update_publishes_new_snapshot_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let handle = SettingsHandle::load(store.clone());

        let before = handle.snapshot();
        assert!(
            handle
                .update(SettingsUpdate::Quality(Quality::P1500))
                .unwrap()
        );
        assert!(handle.update(SettingsUpdate::Token("abc".to_string())).unwrap());
        assert!(!handle.update(SettingsUpdate::Token("abc".to_string())).unwrap());

        assert_eq!(before.quality, Quality::P800);
        assert_eq!(handle.snapshot().quality, Quality::P1500);
        assert_eq!(handle.snapshot().token, "abc");
        assert_eq!(store.get_string(keys::QUALITY), Some("1500".to_string()));
        assert_eq!(store.get_string(keys::TOKEN), Some("abc".to_string()));
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let handle = SettingsHandle::load(Arc::new(MemoryStore::new()));

        assert!(handle.update(SettingsUpdate::Domain(3)).is_err());
        assert!(handle.update(SettingsUpdate::GroupRate(7)).is_err());
        assert!(handle.update(SettingsUpdate::GroupRate(45)).is_ok());
        assert_eq!(handle.snapshot().domain, 0);
        assert_eq!(handle.snapshot().group_rate, 45);
    }

    #[test]
    fn test_rate_values() {
        let values = rate_values();
        assert_eq!(values.first(), Some(&5));
        assert_eq!(values.last(), Some(&60));
        assert_eq!(values.len(), 12);
    }

    #[test]
    fn test_update_all_is_all_or_nothing() {
        let store = Arc::new(MemoryStore::new());
        let handle = SettingsHandle::load(store.clone());

        let result = handle.update_all(vec![
            SettingsUpdate::Username("bob".to_string()),
            SettingsUpdate::Version(String::new()),
            SettingsUpdate::GroupOrder(GroupOrder::AsListed),
        ]);
        assert!(matches!(
            result,
            Err(Error::InvalidPreference { ref name, .. }) if name == keys::VERSION
        ));
        assert_eq!(handle.snapshot().username, "");
        assert_eq!(handle.snapshot().group_order, GroupOrder::SupplementaryFirst);
        assert_eq!(store.get_string(keys::USERNAME), None);

        let changed = handle
            .update_all(vec![
                SettingsUpdate::Username("bob".to_string()),
                SettingsUpdate::Version(DEFAULT_VERSION.to_string()),
                SettingsUpdate::GroupOrder(GroupOrder::AsListed),
            ])
            .unwrap();
        assert_eq!(
            changed,
            vec![
                SettingsUpdate::Username("bob".to_string()),
                SettingsUpdate::GroupOrder(GroupOrder::AsListed),
            ]
        );
        assert_eq!(handle.snapshot().username, "bob");
        assert_eq!(store.get_string(keys::GROUP_ORDER), Some("as_listed".to_string()));
        assert_eq!(store.get_string(keys::VERSION), None);
    }

    #[test]
    fn test_invalid_update_names_its_own_key() {
        let handle = SettingsHandle::load(Arc::new(MemoryStore::new()));

        let name_of = |update| match handle.update(update) {
            Err(Error::InvalidPreference { name, .. }) => name,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(name_of(SettingsUpdate::WebDomain(9)), keys::WEB_DOMAIN);
        assert_eq!(name_of(SettingsUpdate::Domain(9)), keys::DOMAIN);
        assert_eq!(name_of(SettingsUpdate::ChapterRate(3)), keys::CHAPTER_RATE);
        assert_eq!(name_of(SettingsUpdate::GroupRate(3)), keys::GROUP_RATE);
    }

    #[test]
    fn test_load_snaps_rates_to_allowed_values() {
        let store = MemoryStore::with_values([
            (keys::GROUP_RATE, json!("7")),
            (keys::CHAPTER_RATE, json!("0")),
        ]);
        let settings = Settings::load(&store);
        assert_eq!(settings.group_rate, DEFAULT_RATE);
        assert_eq!(settings.chapter_rate, DEFAULT_RATE);
    }
}
