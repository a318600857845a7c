use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Header names are kept lowercase.
pub type Headers = HashMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[cfg(feature = "host")]
    #[error("transport error: {0}")]
    Ureq(#[from] ureq::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: &str, url: &str) -> Request {
        Request {
            method: method.to_string(),
            url: url.to_string(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Request {
        Self::new("GET", url)
    }

    pub fn body(self, body: impl Into<Vec<u8>>) -> Request {
        Request {
            body: Some(body.into()),
            ..self
        }
    }

    /// Replaces every value of `name` with `value`.
    pub fn header(mut self, name: &str, value: &str) -> Request {
        self.headers
            .insert(name.to_ascii_lowercase(), vec![value.to_string()]);
        self
    }

    pub fn headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Request {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    pub fn remove_header(&mut self, name: &str) -> Option<Vec<String>> {
        self.headers.remove(&name.to_ascii_lowercase())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        first_value(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub headers: Headers,
    pub body: Vec<u8>,
    pub status: u16,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        first_value(&self.headers, name)
    }

    /// Media type without parameters, e.g. `application/json`.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|value| value.split(';').next().unwrap_or_default().trim())
    }
}

fn first_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .get(&name.to_ascii_lowercase())
        .and_then(|values| values.first())
        .map(String::as_str)
}

/// The request execution primitive supplied by the host.
pub trait HttpClient: Send + Sync {
    fn execute(&self, req: Request) -> Result<Response, Error>;
}

#[cfg(feature = "host")]
pub use host::UreqClient;

#[cfg(feature = "host")]
mod host {
    use super::{Error, Headers, HttpClient, Request, Response};

    /// Blocking client backed by `ureq`. Non-2xx statuses are returned as responses.
    pub struct UreqClient {
        agent: ureq::Agent,
    }

    impl UreqClient {
        pub fn new(user_agent: &str, insecure_tls: bool) -> Self {
            if insecure_tls {
                warn!("certificate verification is disabled");
            }

            let tls = ureq::tls::TlsConfig::builder()
                .disable_verification(insecure_tls)
                .build();
            let config = ureq::Agent::config_builder()
                .user_agent(user_agent)
                .http_status_as_error(false)
                .tls_config(tls)
                .build();

            Self {
                agent: config.into(),
            }
        }
    }

    impl HttpClient for UreqClient {
        fn execute(&self, req: Request) -> Result<Response, Error> {
            let mut builder = ureq::http::Request::builder()
                .method(req.method.as_str())
                .uri(req.url.as_str());
            for (name, values) in &req.headers {
                for value in values {
                    builder = builder.header(name.as_str(), value.as_str());
                }
            }

            debug!("request => {} {}", req.method, req.url);
            let res = match req.body {
                Some(body) => self.agent.run(
                    builder
                        .body(body)
                        .map_err(|e| Error::InvalidRequest(e.to_string()))?,
                ),
                None => self.agent.run(
                    builder
                        .body(())
                        .map_err(|e| Error::InvalidRequest(e.to_string()))?,
                ),
            };

            let mut response = match res {
                Ok(response) => response,
                Err(err) => {
                    debug!("response error => {:?}", err);
                    return Err(err.into());
                }
            };

            let status = response.status().as_u16();
            let mut headers = Headers::new();
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    headers
                        .entry(name.as_str().to_ascii_lowercase())
                        .or_default()
                        .push(value.to_string());
                }
            }
            let body = response.body_mut().read_to_vec()?;
            debug!("response => {} ({} bytes)", status, body.len());

            Ok(Response {
                headers,
                body,
                status,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_header_names_are_case_insensitive() {
        let mut req = Request::get("https://example.com")
            .header("Cache-Control", "no-cache")
            .header("cache-control", "max-age=0");

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_value("CACHE-CONTROL"), Some("max-age=0"));
        assert!(req.remove_header("Cache-Control").is_some());
        assert_eq!(req.header_value("cache-control"), None);
    }

    #[test]
    fn test_content_type_without_parameters() {
        let mut headers = Headers::new();
        headers.insert(
            "content-type".to_string(),
            vec!["application/json; charset=utf-8".to_string()],
        );
        let res = Response {
            headers,
            body: vec![],
            status: 200,
        };

        assert_eq!(res.content_type(), Some("application/json"));
    }
}
