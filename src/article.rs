//! Article resolution and retrieval.
//!
//! Turns user input (a plain title or a Wikipedia link) into an article title
//! and fetches its plain-text extract from the MediaWiki query API via reqwest.

use crate::config::ApiConfig;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// User-Agent string identifying this client to the Wikimedia API
const USER_AGENT: &str = concat!(
    "wikiquiz/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/wikiquiz)"
);

/// Hosts containing this domain are treated as encyclopedia links
const WIKI_DOMAIN: &str = "wikipedia.org";

/// Base delay between retries, multiplied by the attempt number
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Characters escaped when building `/wiki/<Title>` links
const TITLE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Error, Debug)]
pub enum ArticleError {
    #[error("article not found: {0}")]
    NotFound(String),
    #[error("failed to fetch article: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("invalid API endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("unexpected API response: {0}")]
    MalformedResponse(String),
}

/// Canonical article title resolved from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef(String);

impl ArticleRef {
    pub fn title(&self) -> &str {
        &self.0
    }

    pub fn into_title(self) -> String {
        self.0
    }
}

impl fmt::Display for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plain-text article as returned by the encyclopedia
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    /// Title as canonicalised by the API
    pub title: String,
    /// Plain text, paragraphs separated by `\n`
    pub extract: String,
    /// Canonical link to the article
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    pageid: Option<i64>,
    #[serde(default)]
    title: String,
    extract: Option<String>,
    missing: Option<serde_json::Value>,
}

/// Parse a Wikipedia link into an article reference.
///
/// Returns `None` for anything that is not a URL on a Wikipedia host, so the
/// caller can fall back to using the input as a literal title.
pub fn parse_reference(input: &str) -> Option<ArticleRef> {
    let url = wiki_url(input)?;

    let segments: Vec<&str> = url.path().split('/').collect();
    if let Some(pos) = segments.iter().position(|segment| *segment == "wiki") {
        if let Some(segment) = segments.get(pos + 1).filter(|s| !s.is_empty()) {
            let title = percent_decode_str(segment).decode_utf8_lossy().into_owned();
            return Some(ArticleRef(title));
        }
    }

    url.query_pairs()
        .find(|(key, _)| key == "title")
        .map(|(_, value)| ArticleRef(value.into_owned()))
}

/// API endpoint of the Wikipedia edition a link points at, if any
pub fn edition_endpoint(input: &str) -> Option<Url> {
    let url = wiki_url(input)?;
    let host = url.host_str()?;
    Url::parse(&format!("{}://{}/w/api.php", url.scheme(), host)).ok()
}

fn wiki_url(input: &str) -> Option<Url> {
    let url = Url::parse(input.trim()).ok()?;
    url.host_str()
        .is_some_and(|host| host.contains(WIKI_DOMAIN))
        .then_some(url)
}

/// Build the `/wiki/<Title>` link for a title on the endpoint's host
pub fn canonical_url(endpoint: &Url, title: &str) -> String {
    let slug = title.replace(' ', "_");
    let host = endpoint.host_str().unwrap_or("en.wikipedia.org");
    format!(
        "{}://{}/wiki/{}",
        endpoint.scheme(),
        host,
        utf8_percent_encode(&slug, TITLE_ENCODE_SET)
    )
}

/// Fetches article extracts from a MediaWiki query API
pub struct ArticleResolver {
    client: Client,
    endpoint: Url,
    retries: u32,
}

impl ArticleResolver {
    /// Create a resolver with a configured HTTP client
    pub fn new(config: &ApiConfig) -> Result<Self, ArticleError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            retries: config.retries,
        })
    }

    /// Resolve `title_or_url` and fetch the article's plain-text extract
    pub async fn fetch_article(&self, title_or_url: &str) -> Result<ArticleContent, ArticleError> {
        let title = parse_reference(title_or_url)
            .map(ArticleRef::into_title)
            .unwrap_or_else(|| title_or_url.trim().to_string());
        let endpoint = edition_endpoint(title_or_url).unwrap_or_else(|| self.endpoint.clone());

        let request_url = Url::parse_with_params(
            endpoint.as_str(),
            &[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("explaintext", "true"),
                ("redirects", "1"),
                ("titles", title.as_str()),
            ],
        )?;

        let mut attempt = 0;
        let body = loop {
            match self.request(request_url.clone()).await {
                Ok(body) => break body,
                Err(e) if should_retry(e.status(), attempt, self.retries) => {
                    attempt += 1;
                    log::warn!("request for '{}' failed (attempt {}): {}", title, attempt, e);
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        parse_query_response(&body, &title, &endpoint)
    }

    async fn request(&self, url: Url) -> Result<String, reqwest::Error> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

/// Retry transport failures (no status) and server errors while attempts remain
fn should_retry(status: Option<StatusCode>, attempt: u32, retries: u32) -> bool {
    attempt < retries && status.map_or(true, |status| status.is_server_error())
}

/// Interpret a query API response holding a single page
fn parse_query_response(
    body: &str,
    requested: &str,
    endpoint: &Url,
) -> Result<ArticleContent, ArticleError> {
    let response: QueryResponse = serde_json::from_str(body)
        .map_err(|e| ArticleError::MalformedResponse(e.to_string()))?;

    let (page_key, page) = response
        .query
        .and_then(|query| query.pages.into_iter().next())
        .ok_or_else(|| ArticleError::MalformedResponse("no pages in response".to_string()))?;

    if page.missing.is_some() || page_key == "-1" || page.pageid == Some(-1) {
        return Err(ArticleError::NotFound(requested.to_string()));
    }

    let title = if page.title.is_empty() {
        requested.to_string()
    } else {
        page.title
    };

    Ok(ArticleContent {
        url: canonical_url(endpoint, &title),
        extract: page.extract.unwrap_or_default(),
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_endpoint() -> Url {
        Url::parse("https://en.wikipedia.org/w/api.php").unwrap()
    }

    #[test]
    fn wiki_path_is_percent_decoded() {
        let reference = parse_reference("https://en.wikipedia.org/wiki/Eiffel_Tower").unwrap();
        assert_eq!(reference.title(), "Eiffel_Tower");

        let reference =
            parse_reference("https://fr.wikipedia.org/wiki/Ch%C3%A2teau_de_Versailles").unwrap();
        assert_eq!(reference.title(), "Château_de_Versailles");
    }

    #[test]
    fn title_query_parameter_is_used() {
        let reference =
            parse_reference("https://en.wikipedia.org/w/index.php?title=Rust_(programming_language)&action=history")
                .unwrap();
        assert_eq!(reference.title(), "Rust_(programming_language)");
    }

    #[test]
    fn mobile_hosts_are_recognised() {
        let reference = parse_reference("https://en.m.wikipedia.org/wiki/Paris").unwrap();
        assert_eq!(reference.to_string(), "Paris");
    }

    #[test]
    fn non_urls_and_foreign_hosts_are_rejected() {
        assert_eq!(parse_reference("Eiffel Tower"), None);
        assert_eq!(parse_reference(""), None);
        assert_eq!(parse_reference("https://example.com/wiki/Paris"), None);
        assert_eq!(parse_reference("https://en.wikipedia.org/"), None);
        assert_eq!(parse_reference("https://en.wikipedia.org/wiki/"), None);
    }

    #[test]
    fn edition_endpoint_follows_link_host() {
        let endpoint = edition_endpoint("https://de.wikipedia.org/wiki/Berlin").unwrap();
        assert_eq!(endpoint.as_str(), "https://de.wikipedia.org/w/api.php");
        assert!(edition_endpoint("Berlin").is_none());
    }

    #[test]
    fn canonical_url_uses_underscores_and_escapes() {
        assert_eq!(
            canonical_url(&en_endpoint(), "Eiffel Tower"),
            "https://en.wikipedia.org/wiki/Eiffel_Tower"
        );
        assert_eq!(
            canonical_url(&en_endpoint(), "Château de Versailles"),
            "https://en.wikipedia.org/wiki/Ch%C3%A2teau_de_Versailles"
        );
    }

    #[test]
    fn server_errors_and_transport_failures_are_retried() {
        assert!(should_retry(Some(StatusCode::SERVICE_UNAVAILABLE), 0, 2));
        assert!(should_retry(Some(StatusCode::INTERNAL_SERVER_ERROR), 1, 2));
        assert!(should_retry(None, 0, 2));
    }

    #[test]
    fn client_errors_are_not_retried() {
        assert!(!should_retry(Some(StatusCode::NOT_FOUND), 0, 2));
        assert!(!should_retry(Some(StatusCode::TOO_MANY_REQUESTS), 0, 2));
    }

    #[test]
    fn retries_stop_when_attempts_run_out() {
        assert!(!should_retry(None, 2, 2));
        assert!(!should_retry(Some(StatusCode::BAD_GATEWAY), 2, 2));
        assert!(!should_retry(None, 0, 0));
    }

    #[test]
    fn existing_page_is_parsed() {
        let body = r#"{
            "batchcomplete": "",
            "query": {
                "pages": {
                    "9232": {
                        "pageid": 9232,
                        "ns": 0,
                        "title": "Eiffel Tower",
                        "extract": "The Eiffel Tower is a wrought-iron lattice tower.\nSecond paragraph."
                    }
                }
            }
        }"#;
        let article = parse_query_response(body, "eiffel tower", &en_endpoint()).unwrap();
        assert_eq!(article.title, "Eiffel Tower");
        assert!(article.extract.contains('\n'));
        assert_eq!(article.url, "https://en.wikipedia.org/wiki/Eiffel_Tower");
    }

    #[test]
    fn missing_page_is_not_found() {
        let body = r#"{"query":{"pages":{"-1":{"ns":0,"title":"Qwzx","missing":""}}}}"#;
        let err = parse_query_response(body, "Qwzx", &en_endpoint()).unwrap_err();
        assert!(matches!(err, ArticleError::NotFound(title) if title == "Qwzx"));
    }

    #[test]
    fn empty_or_invalid_body_is_malformed() {
        let err = parse_query_response(r#"{"batchcomplete":""}"#, "X", &en_endpoint()).unwrap_err();
        assert!(matches!(err, ArticleError::MalformedResponse(_)));

        let err = parse_query_response("<html>", "X", &en_endpoint()).unwrap_err();
        assert!(matches!(err, ArticleError::MalformedResponse(_)));
    }

    #[test]
    fn page_without_extract_has_empty_text() {
        let body = r#"{"query":{"pages":{"42":{"pageid":42,"title":"Stub"}}}}"#;
        let article = parse_query_response(body, "Stub", &en_endpoint()).unwrap();
        assert!(article.extract.is_empty());
    }
}
