use zhconv::{Variant, zhconv};

/// Traditional to simplified Chinese.
pub fn to_simplified(text: &str) -> String {
    zhconv(text, Variant::ZhHans)
}

/// Applies [`to_simplified`] only when the user asked for simplified titles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Localizer {
    enabled: bool,
}

impl Localizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn localize(&self, text: &str) -> String {
        if self.enabled {
            to_simplified(text)
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_localize_converts_traditional() {
        let localizer = Localizer::new(true);
        assert_eq!(localizer.localize("進擊的巨人"), "进击的巨人");
    }

    #[test]
    fn test_localize_is_idempotent() {
        let localizer = Localizer::new(true);
        for text in ["鬼滅之刃", "漢化組", "ワンピース", "One Piece"] {
            let once = localizer.localize(text);
            assert_eq!(localizer.localize(&once), once);
        }
    }

    #[test]
    fn test_localize_disabled_is_identity() {
        let localizer = Localizer::new(false);
        assert_eq!(localizer.localize("進擊的巨人"), "進擊的巨人");
    }
}
