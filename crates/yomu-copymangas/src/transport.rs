use std::sync::Arc;

use serde::de::DeserializeOwned;
use yomu_util::http::{HttpClient, Request, Response};

use crate::{
    config::{RATE_WINDOW, Settings, SettingsHandle},
    dto::{Envelope, ResultMessage},
    error::Error,
    ratelimit::Throttle,
};

const STRIPPED_HEADERS: [&str; 3] = ["cache-control", "if-modified-since", "cookie"];
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Which `authorization` value a request carries.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// The stored token only when the user asked to always send it.
    Default,
    /// The stored token whenever one is present.
    Search,
    /// An explicit token, e.g. one being verified.
    Token(&'a str),
    /// The bare `Token` value.
    Anonymous,
}

impl Auth<'_> {
    fn header(&self, settings: &Settings) -> String {
        let token = match self {
            Auth::Default if settings.always_use_token => settings.token.as_str(),
            Auth::Search => settings.token.as_str(),
            Auth::Token(token) => *token,
            Auth::Default | Auth::Anonymous => "",
        };
        if token.trim().is_empty() {
            "Token".to_string()
        } else {
            format!("Token {}", token.trim())
        }
    }
}

/// Headers identifying the client as the official app.
pub fn api_headers(settings: &Settings, auth: Auth) -> Vec<(&'static str, String)> {
    let version = settings.version.as_str();
    vec![
        ("source", "copyApp".to_string()),
        ("webp", if settings.webp { "1" } else { "0" }.to_string()),
        ("version", version.to_string()),
        ("Referer", format!("com.copymanga.app-{version}")),
        ("User-Agent", format!("COPY/{version}")),
        (
            "region",
            if settings.overseas_cdn { "0" } else { "1" }.to_string(),
        ),
        ("authorization", auth.header(settings)),
        ("platform", "3".to_string()),
    ]
}

/// Throttled access to the API host.
pub struct Transport {
    client: Arc<dyn HttpClient>,
    settings: Arc<SettingsHandle>,
    throttle: Throttle,
}

impl Transport {
    /// Rate limits are read once here and stay fixed for the transport's lifetime.
    pub fn new(client: Arc<dyn HttpClient>, settings: Arc<SettingsHandle>) -> Self {
        let current = settings.snapshot();
        Self {
            client,
            throttle: Throttle::new(current.group_rate, current.chapter_rate, RATE_WINDOW),
            settings,
        }
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.snapshot()
    }

    pub fn settings_handle(&self) -> &Arc<SettingsHandle> {
        &self.settings
    }

    /// Strips caching and cookie headers, waits for the endpoint's bucket, then sends.
    pub fn execute(&self, mut req: Request) -> Result<Response, Error> {
        for name in STRIPPED_HEADERS {
            req.remove_header(name);
        }
        self.throttle.wait(&req.url);

        debug!("{} {}", req.method, req.url);
        Ok(self.client.execute(req)?)
    }

    fn api_request(&self, method: &str, path: &str, auth: Auth) -> Request {
        let settings = self.settings();
        let url = format!("{}{}", settings.api_url(), path);
        let headers = api_headers(&settings, auth);
        Request::new(method, &url).headers(headers.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// `GET {api}{path}` with the app headers; the raw response is returned.
    pub fn get(&self, path: &str, auth: Auth) -> Result<Response, Error> {
        self.execute(self.api_request("GET", path, auth))
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<T, Error> {
        decode(&self.get(path, auth)?)
    }

    /// Posts an already encoded form body.
    pub fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: String,
        auth: Auth,
    ) -> Result<T, Error> {
        let req = self
            .api_request("POST", path, auth)
            .header("content-type", FORM)
            .body(form);
        decode(&self.execute(req)?)
    }
}

/// Unwraps the `{results}` envelope of a JSON response.
pub fn decode<T: DeserializeOwned>(res: &Response) -> Result<T, Error> {
    match res.content_type() {
        Some(JSON) => {}
        other => {
            return Err(Error::BadPayload(format!(
                "expected {JSON}, got {}",
                other.unwrap_or("no content type")
            )));
        }
    }

    if res.status != 200 {
        let message: ResultMessage = serde_json::from_slice(&res.body).map_err(|e| {
            Error::BadPayload(format!("status {} with unreadable body: {e}", res.status))
        })?;
        return Err(Error::Api {
            code: message.code,
            message: message.message,
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_slice(&res.body).map_err(|e| Error::BadPayload(e.to_string()))?;
    Ok(envelope.results)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::keys,
        testing::{FakeClient, error_json, ok_json, response, store},
    };
    use serde_json::json;

    fn transport(client: Arc<FakeClient>, always_use_token: bool) -> Transport {
        let store = store(vec![
            (keys::TOKEN, json!("secret")),
            (keys::ALWAYS_USE_TOKEN, json!(always_use_token)),
        ]);
        Transport::new(client, Arc::new(SettingsHandle::load(store)))
    }

    #[test]
    fn test_api_headers() {
        let settings = Settings {
            overseas_cdn: true,
            webp: false,
            ..Default::default()
        };
        let headers = api_headers(&settings, Auth::Anonymous);
        let get = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("source"), Some("copyApp"));
        assert_eq!(get("webp"), Some("0"));
        assert_eq!(get("version"), Some("2.1.2"));
        assert_eq!(get("Referer"), Some("com.copymanga.app-2.1.2"));
        assert_eq!(get("User-Agent"), Some("COPY/2.1.2"));
        assert_eq!(get("region"), Some("0"));
        assert_eq!(get("authorization"), Some("Token"));
        assert_eq!(get("platform"), Some("3"));
    }

    #[test]
    fn test_token_attachment_policy() {
        let mut settings = Settings {
            token: "secret".to_string(),
            ..Default::default()
        };
        assert_eq!(Auth::Default.header(&settings), "Token");
        assert_eq!(Auth::Search.header(&settings), "Token secret");
        assert_eq!(Auth::Token("other").header(&settings), "Token other");
        assert_eq!(Auth::Anonymous.header(&settings), "Token");

        settings.always_use_token = true;
        assert_eq!(Auth::Default.header(&settings), "Token secret");

        settings.token = " ".to_string();
        assert_eq!(Auth::Search.header(&settings), "Token");
    }

    #[test]
    fn test_strips_caching_headers() {
        let client = Arc::new(FakeClient::new().route("/ping", |_| ok_json(json!(null))));
        let transport = transport(client.clone(), false);

        let req = Request::get("https://api.mangacopy.com/ping")
            .header("Cache-Control", "no-cache")
            .header("If-Modified-Since", "yesterday")
            .header("Cookie", "a=b")
            .header("webp", "1");
        transport.execute(req).unwrap();

        let sent = &client.requests()[0];
        assert_eq!(sent.header_value("cache-control"), None);
        assert_eq!(sent.header_value("if-modified-since"), None);
        assert_eq!(sent.header_value("cookie"), None);
        assert_eq!(sent.header_value("webp"), Some("1"));
    }

    #[test]
    fn test_get_uses_active_domain_and_token() {
        let client = Arc::new(
            FakeClient::new().route("/api/v3/comics", |_| ok_json(json!({"ok": true}))),
        );
        let transport = transport(client.clone(), true);

        let value: serde_json::Value = transport
            .get_json("/api/v3/comics?platform=3", Auth::Default)
            .unwrap();
        assert_eq!(value, json!({"ok": true}));

        let sent = &client.requests()[0];
        assert_eq!(sent.url, "https://api.mangacopy.com/api/v3/comics?platform=3");
        assert_eq!(sent.header_value("authorization"), Some("Token secret"));
    }

    #[test]
    fn test_decode_errors() {
        let html = response(200, "text/html", b"<html></html>".to_vec());
        assert!(matches!(
            decode::<serde_json::Value>(&html),
            Err(Error::BadPayload(_))
        ));

        let rejected = error_json(401, 401, "请登录");
        match decode::<serde_json::Value>(&rejected) {
            Err(Error::Api { code, message }) => {
                assert_eq!(code, 401);
                assert_eq!(message, "请登录");
            }
            other => panic!("unexpected {:?}", other),
        }

        let garbled = response(500, "application/json", b"oops".to_vec());
        assert!(matches!(
            decode::<serde_json::Value>(&garbled),
            Err(Error::BadPayload(_))
        ));

        let shape = ok_json(json!({"unexpected": 1}));
        assert!(matches!(
            decode::<crate::dto::TokenDto>(&shape),
            Err(Error::BadPayload(_))
        ));
    }

    #[test]
    fn test_decode_accepts_charset_parameter() {
        let res = response(
            200,
            "application/json; charset=utf-8",
            br#"{"results": {"token": "abc"}}"#.to_vec(),
        );
        let token: crate::dto::TokenDto = decode(&res).unwrap();
        assert_eq!(token.token, "abc");
    }
}
