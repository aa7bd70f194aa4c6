// WordPress.com HTTP client
//
// Wraps `reqwest::Client` with bearer-token auth, API-root URL construction,
// and error mapping. Endpoint groups (sites, transfer) are implemented as
// inherent methods in separate files to keep this module focused on
// transport mechanics.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Default API root for WordPress.com.
pub const DEFAULT_API_BASE: &str = "https://public-api.wordpress.com";

/// Authenticated HTTP client for the WordPress.com REST API.
///
/// All methods return deserialized payloads; HTTP status mapping happens in
/// one place ([`Self::check_status`]) so endpoint code never inspects status
/// codes itself.
pub struct WpcomClient {
    http: reqwest::Client,
    base_url: Url,
}

impl WpcomClient {
    /// Create a client for the given API root with a bearer token.
    ///
    /// The token is attached as a default `Authorization` header so it is
    /// sent on every request and never handled per-call.
    pub fn new(base_url: Url, token: &SecretString) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| Error::Authentication {
                message: "token contains characters invalid in an HTTP header".into(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Create a client against the production API root.
    pub fn with_default_base(token: &SecretString) -> Result<Self, Error> {
        let base = Url::parse(DEFAULT_API_BASE)?;
        Self::new(base, token)
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path (e.g. `rest/v1.2/me/sites`).
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request with query parameters and deserialize the body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).query(query).send().await?;
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Send a POST request with an empty body, discarding the response body.
    pub(crate) async fn post_empty(&self, url: Url) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// Send a GET request and return the raw response for streaming reads.
    pub(crate) async fn get_raw(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {} (raw)", url);
        let resp = self.http.get(url).send().await?;
        Self::check_status(resp).await
    }

    /// Send a POST request with a raw byte body, discarding the response.
    pub(crate) async fn post_bytes(&self, url: Url, body: Vec<u8>) -> Result<(), Error> {
        debug!("POST {} ({} bytes)", url, body.len());
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(body)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// Map non-success statuses into [`Error`] variants.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("HTTP {status}"),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(Error::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body[..body.len().min(200)].to_owned(),
            });
        }

        Ok(resp)
    }
}
