#[macro_use]
extern crate log;

pub mod auth;
pub mod catalog;
pub mod chapters;
pub mod config;
mod dto;
pub mod error;
pub mod filters;
pub mod localize;
pub mod pages;
mod preferences;
pub mod ratelimit;
mod source;
pub mod transport;
mod worker;

#[cfg(test)]
mod testing;

pub use auth::{RefreshRequest, TokenState};
pub use config::{GroupOrder, Quality, Settings, SettingsUpdate};
pub use error::Error;
pub use source::CopyMangas;

pub const ID: i64 = 6;
pub const NAME: &str = "拷贝漫画";

/// Chapter and manga paths start with this prefix.
pub const MANGA_PREFIX: &str = "/comic/";

/// Manga slug (`path_word`) from a manga path, also accepting a bare slug.
pub fn manga_slug(path: &str) -> &str {
    path.strip_prefix(MANGA_PREFIX)
        .unwrap_or(path)
        .trim_matches('/')
}

/// Manga slug embedded in a chapter path `/comic/{slug}/chapter2/{uuid}`.
pub fn chapter_manga_slug(path: &str) -> Result<&str, Error> {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some("comic"), Some(slug), Some("chapter2")) if !slug.is_empty() => Ok(slug),
        _ => Err(Error::InvalidPath(path.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_manga_slug() {
        assert_eq!(manga_slug("/comic/yaoshenji"), "yaoshenji");
        assert_eq!(manga_slug("yaoshenji"), "yaoshenji");
    }

    #[test]
    fn test_chapter_manga_slug() {
        assert_eq!(
            chapter_manga_slug("/comic/yaoshenji/chapter2/5f1a-uuid").unwrap(),
            "yaoshenji"
        );
        assert!(matches!(
            chapter_manga_slug("/comic/yaoshenji"),
            Err(Error::InvalidPath(_))
        ));
    }
}
