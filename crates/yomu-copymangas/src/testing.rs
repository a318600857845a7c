use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde_json::{Value, json};
use url::Url;
use yomu_util::{
    http::{Error, Headers, HttpClient, Request, Response},
    prefs::MemoryStore,
};

type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

/// Scripted `HttpClient`: routes by URL path and records every request it sees.
#[derive(Default)]
pub struct FakeClient {
    routes: HashMap<String, Handler>,
    requests: Mutex<Vec<Request>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes.insert(path.to_string(), Box::new(handler));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|req| Url::parse(&req.url).unwrap().path() == path)
            .collect()
    }
}

impl HttpClient for FakeClient {
    fn execute(&self, req: Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(req.clone());
        let url = Url::parse(&req.url).map_err(|e| Error::InvalidRequest(e.to_string()))?;
        match self.routes.get(url.path()) {
            Some(handler) => Ok(handler(&req)),
            None => Err(Error::Transport(format!("no route for {}", url.path()))),
        }
    }
}

pub fn response(status: u16, content_type: &str, body: Vec<u8>) -> Response {
    let mut headers = Headers::new();
    headers.insert("content-type".to_string(), vec![content_type.to_string()]);
    Response {
        headers,
        body,
        status,
    }
}

pub fn ok_json(results: Value) -> Response {
    response(
        200,
        "application/json",
        json!({ "code": 200, "message": "请求成功", "results": results })
            .to_string()
            .into_bytes(),
    )
}

pub fn error_json(status: u16, code: i64, message: &str) -> Response {
    response(
        status,
        "application/json",
        json!({ "code": code, "message": message })
            .to_string()
            .into_bytes(),
    )
}

pub fn query(req: &Request, name: &str) -> Option<String> {
    Url::parse(&req.url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub fn store(values: Vec<(&str, Value)>) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_values(values))
}

pub fn comic(slug: &str) -> Value {
    json!({
        "name": slug,
        "path_word": slug,
        "author": [{"name": "author", "path_word": "author"}],
        "cover": format!("https://cover.example/{slug}.jpg.328x422.jpg"),
    })
}

pub fn chapters(slug: &str, prefix: &str, range: std::ops::Range<usize>) -> Vec<Value> {
    range
        .map(|i| {
            json!({
                "uuid": format!("{prefix}-{i}"),
                "name": format!("{prefix} {i}"),
                "comic_path_word": slug,
                "datetime_created": "2022-01-01",
            })
        })
        .collect()
}
