use yomu_lib::models::Input;

use crate::{
    config::{DOMAINS, GroupOrder, Quality, Settings, SettingsUpdate, keys, rate_values},
    error::Error,
};

/// Checkbox that asks for a background token refresh instead of storing a value.
pub const REFRESH_TOKEN: &str = "refreshToken";

/// `state` is `None` when the current value is not one of `values`; such a
/// select is left untouched when it comes back.
fn select<T: ToString>(
    name: &str,
    values: impl IntoIterator<Item = T>,
    state: Option<usize>,
) -> Input {
    Input::Select {
        name: name.to_string(),
        values: values
            .into_iter()
            .map(|v| v.to_string())
            .collect(),
        state: state.map(|i| i as i64),
    }
}

fn checkbox(name: &str, state: bool) -> Input {
    Input::Checkbox {
        name: name.to_string(),
        state: Some(state),
    }
}

fn text(name: &str, state: Option<&str>) -> Input {
    Input::Text {
        name: name.to_string(),
        state: state.map(str::to_string),
    }
}

fn position<T: PartialEq>(values: &[T], value: &T) -> Option<usize> {
    values.iter().position(|v| v == value)
}

pub fn descriptors(settings: &Settings) -> Vec<Input> {
    let rates = rate_values();
    vec![
        select(keys::DOMAIN, DOMAINS, Some(settings.domain)),
        select(keys::WEB_DOMAIN, DOMAINS, Some(settings.web_domain)),
        checkbox(keys::OVERSEAS_CDN, settings.overseas_cdn),
        select(
            keys::QUALITY,
            Quality::ALL.iter().map(Quality::as_str),
            position(&Quality::ALL, &settings.quality),
        ),
        checkbox(keys::WEBP, settings.webp),
        select(keys::GROUP_RATE, &rates, position(&rates, &settings.group_rate)),
        select(keys::CHAPTER_RATE, &rates, position(&rates, &settings.chapter_rate)),
        checkbox(keys::LOCALIZE, settings.localize),
        checkbox(keys::ALWAYS_USE_TOKEN, settings.always_use_token),
        text(keys::USERNAME, Some(&settings.username)),
        // never echo the password back
        text(keys::PASSWORD, None),
        text(keys::TOKEN, Some(&settings.token)),
        text(keys::VERSION, Some(&settings.version)),
        text(keys::BROWSER_USER_AGENT, Some(&settings.browser_user_agent)),
        select(
            keys::GROUP_ORDER,
            GroupOrder::ALL.iter().map(GroupOrder::as_str),
            position(&GroupOrder::ALL, &settings.group_order),
        ),
        checkbox(keys::INSECURE_TLS, settings.insecure_tls),
        checkbox(REFRESH_TOKEN, false),
    ]
}

/// Changes requested by a filled-in preference list.
#[derive(Debug, Default, PartialEq)]
pub struct PreferenceChanges {
    pub updates: Vec<SettingsUpdate>,
    pub refresh_token: bool,
}

fn pick<T: Copy>(input: &Input, values: &[T]) -> Result<Option<T>, Error> {
    Ok(input.selected_index()?.and_then(|i| values.get(i).copied()))
}

/// Inputs without a state are left untouched; unknown names are skipped.
pub fn parse(inputs: &[Input]) -> Result<PreferenceChanges, Error> {
    let rates = rate_values();
    let mut changes = PreferenceChanges::default();

    for input in inputs {
        let update = match input.name() {
            keys::DOMAIN => input.selected_index()?.map(SettingsUpdate::Domain),
            keys::WEB_DOMAIN => input.selected_index()?.map(SettingsUpdate::WebDomain),
            keys::OVERSEAS_CDN => input.checked()?.map(SettingsUpdate::OverseasCdn),
            keys::QUALITY => pick(input, &Quality::ALL)?.map(SettingsUpdate::Quality),
            keys::WEBP => input.checked()?.map(SettingsUpdate::Webp),
            keys::GROUP_RATE => pick(input, &rates)?.map(SettingsUpdate::GroupRate),
            keys::CHAPTER_RATE => pick(input, &rates)?.map(SettingsUpdate::ChapterRate),
            keys::LOCALIZE => input.checked()?.map(SettingsUpdate::Localize),
            keys::ALWAYS_USE_TOKEN => input.checked()?.map(SettingsUpdate::AlwaysUseToken),
            keys::USERNAME => input.text()?.map(|v| SettingsUpdate::Username(v.trim().to_string())),
            keys::PASSWORD => input.text()?.map(|v| SettingsUpdate::Password(v.to_string())),
            keys::TOKEN => input.text()?.map(|v| SettingsUpdate::Token(v.trim().to_string())),
            keys::VERSION => input.text()?.map(|v| SettingsUpdate::Version(v.trim().to_string())),
            keys::BROWSER_USER_AGENT => input
                .text()?
                .map(|v| SettingsUpdate::BrowserUserAgent(v.trim().to_string())),
            keys::GROUP_ORDER => pick(input, &GroupOrder::ALL)?.map(SettingsUpdate::GroupOrder),
            keys::INSECURE_TLS => input.checked()?.map(SettingsUpdate::InsecureTls),
            REFRESH_TOKEN => {
                changes.refresh_token |= input.checked()?.unwrap_or(false);
                None
            }
            name => {
                warn!("ignoring unknown preference {}", name);
                None
            }
        };
        changes.updates.extend(update);
    }

    Ok(changes)
}
