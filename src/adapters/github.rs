use crate::config::KitConfig;
use crate::domain::ports::GitHubApi;
use crate::utils::error::{KitError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| KitError::config("GitHub token contains invalid header characters"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("repokit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &KitConfig) -> Result<Self> {
        let token = config.github_token();
        if token.is_none() {
            tracing::debug!("No GitHub token configured; unauthenticated rate limit applies");
        }
        Self::new(
            &config.github.api_base,
            token.as_deref(),
            Duration::from_secs(config.github.timeout_seconds),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<(StatusCode, String)> {
        let url = self.url(path);
        tracing::debug!("GitHub API {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    fn check_status(&self, status: StatusCode, path: &str) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(KitError::RateLimited);
        }
        Err(KitError::GitHubApiError {
            status: status.as_u16(),
            url: self.url(path),
        })
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_json(&self, path: &str) -> Result<Option<Value>> {
        let (status, text) = self.send(Method::GET, path, None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check_status(status, path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let (status, text) = self.send(Method::POST, path, Some(body)).await?;
        self.check_status(status, path)?;
        parse_body(&text)
    }

    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value> {
        let (status, text) = self.send(Method::PATCH, path, Some(body)).await?;
        self.check_status(status, path)?;
        parse_body(&text)
    }
}

fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client =
            GitHubClient::new("https://api.github.com/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.url("/repos/actions/checkout/tags"),
            "https://api.github.com/repos/actions/checkout/tags"
        );
    }

    #[test]
    fn test_parse_empty_body_is_null() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body("{\"a\":1}").unwrap()["a"], 1);
    }

    #[test]
    fn test_invalid_token_is_config_error() {
        let err = GitHubClient::new("https://api.github.com", Some("bad\ntoken"), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, KitError::ConfigError { .. }));
    }
}
