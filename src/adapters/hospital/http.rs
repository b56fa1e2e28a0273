//! Shared HTTP transport for hospital sites
//!
//! One client per adapter instance, reused across every call, with browser
//! headers and the retry policy applied to each request.

use crate::adapters::retry::retry_with_backoff;
use crate::config::{RetryConfig, ScraperConfig};
use crate::domain::{QueueWatchError, Result, ScrapeError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::time::Duration;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_ZH_TW: &str = "zh-TW,zh;q=0.9,en;q=0.8";

/// Charset assumed when a page does not declare one
pub const UTF_8: &str = "utf-8";
/// Legacy charset used by older CGI endpoints
pub const BIG5: &str = "big5";

/// HTTP client with site headers and retry
#[derive(Debug, Clone)]
pub struct ScraperHttp {
    client: Client,
    retry: RetryConfig,
}

impl ScraperHttp {
    /// Build a client presenting `referer` on every request
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the referer is not a valid header
    /// value or the TLS backend cannot be initialised.
    pub fn new(config: &ScraperConfig, referer: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_ZH_TW),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer).map_err(|e| {
                QueueWatchError::Configuration(format!("Invalid referer {referer}: {e}"))
            })?,
        );

        let client = ClientBuilder::new()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.request_timeout_seconds.min(15)))
            .build()
            .map_err(|e| {
                QueueWatchError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// GET a page, decoding as UTF-8 unless the server declares a charset
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with_charset(url, UTF_8).await
    }

    /// GET a page, decoding with `default_charset` unless the server declares one
    pub async fn get_text_with_charset(&self, url: &str, default_charset: &str) -> Result<String> {
        tracing::debug!(url = %url, "GET");
        self.send_text(|| self.client.get(url), url, default_charset)
            .await
    }

    /// POST a urlencoded form
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String> {
        tracing::debug!(url = %url, "POST");
        self.send_text(|| self.client.post(url).form(form), url, UTF_8)
            .await
    }

    async fn send_text<B>(&self, build: B, url: &str, default_charset: &str) -> Result<String>
    where
        B: Fn() -> RequestBuilder,
    {
        retry_with_backoff(&self.retry, || {
            let request = build();
            async move {
                let response = request.send().await.map_err(ScrapeError::from)?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ScrapeError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    }
                    .into());
                }

                response
                    .text_with_charset(default_charset)
                    .await
                    .map_err(|e| ScrapeError::Encoding(format!("{url}: {e}")).into())
            }
        })
        .await
    }
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Append query parameters to a URL, percent-encoding values
///
/// # Errors
///
/// Returns a scrape parse error if `base` is not an absolute URL.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    url::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| ScrapeError::Parse(format!("Invalid URL {base}: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.request_timeout_seconds = 5;
        config.retry = RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        };
        config
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://h.example/", "/find_division.php"),
            "https://h.example/find_division.php"
        );
    }

    #[test]
    fn test_with_query_encodes() {
        let url = with_query("https://h.example/reg52.cgi", &[("Docname", "王 小明")]).unwrap();
        assert!(url.starts_with("https://h.example/reg52.cgi?Docname="));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn test_sends_site_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("accept-language", ACCEPT_LANGUAGE_ZH_TW)
            .match_header("referer", "https://www.hc.mmh.org.tw/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<p>門診</p>")
            .create_async()
            .await;

        let http = ScraperHttp::new(&fast_config(), "https://www.hc.mmh.org.tw/").unwrap();
        let body = http.get_text(&join_url(&server.url(), "page")).await.unwrap();

        assert_eq!(body, "<p>門診</p>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_is_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/down")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let http = ScraperHttp::new(&fast_config(), "https://www.cmuh.cmu.edu.tw/").unwrap();
        let err = http
            .get_text(&join_url(&server.url(), "down"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            QueueWatchError::Scrape(ScrapeError::HttpStatus { status: 503, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ClinicQuery")
            .match_body(mockito::Matcher::UrlEncoded(
                "ClinicRoom".into(),
                "230".into(),
            ))
            .with_status(200)
            .with_body("目前看診號：12")
            .create_async()
            .await;

        let http = ScraperHttp::new(&fast_config(), "https://www.cmuh.cmu.edu.tw/").unwrap();
        let body = http
            .post_form(
                &join_url(&server.url(), "ClinicQuery"),
                &[("ClinicRoom", "230"), ("TimePeriod", "1")],
            )
            .await
            .unwrap();

        assert!(body.contains("12"));
        mock.assert_async().await;
    }
}
