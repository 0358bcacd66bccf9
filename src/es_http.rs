use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

const ERROR_BODY_SNIPPET_CHARS: usize = 500;

/// Shared handle to the Elasticsearch endpoint. Cheap to clone; carries
/// basic-auth credentials and the per-request timeout.
#[derive(Clone)]
pub struct EsHttp {
    client: Client,
    base_url: Arc<str>,
    user: Arc<str>,
    pass: Arc<str>,
}

impl EsHttp {
    pub fn new(
        base_url: impl Into<Arc<str>>,
        user: impl Into<Arc<str>>,
        pass: impl Into<Arc<str>>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url.into()),
            user: user.into(),
            pass: pass.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .basic_auth(&*self.user, Some(&*self.pass))
    }

    async fn send_ok(
        &self,
        req: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<Response> {
        let resp = req.send().await.context(context)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!(
            "{} status={} body_sample={}",
            context,
            status,
            body_snippet(&text, ERROR_BODY_SNIPPET_CHARS)
        );
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        context: &'static str,
    ) -> Result<T> {
        let resp = self
            .send_ok(self.request(Method::POST, path).json(body), context)
            .await?;
        resp.json().await.context(context)
    }
}

fn normalize_base_url(base_url: Arc<str>) -> Arc<str> {
    if base_url.ends_with('/') {
        Arc::from(base_url.trim_end_matches('/'))
    } else {
        base_url
    }
}

fn body_snippet(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}…")
}
