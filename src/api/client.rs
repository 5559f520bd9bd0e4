//! REST client for the donation-management backend.
//!
//! Resource paths follow the backend's convention:
//! `<resource>/gets` (paginated list), `<resource>/<resource>/:id` (single),
//! `<resource>/add` (POST), `<resource>/update/:id` (PUT) and
//! `<resource>/delete/:id` (DELETE).

use crate::api::error::{ApiError, ErrorBody};
use crate::api::types::{Page, PageParams};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use url::Url;

/// HTTP client bound to one backend base URL.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = normalize_base(&config.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", config.api.base_url, e))?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token: Config::api_token(),
    })
  }

  /// Host portion of the backend URL, for the header line.
  pub fn host(&self) -> String {
    self.base.host_str().unwrap_or("localhost").to_string()
  }

  /// List one server-side page of a resource.
  pub async fn list<T: DeserializeOwned>(
    &self,
    resource: &str,
    params: &PageParams,
  ) -> Result<Page<T>, ApiError> {
    let url = self.endpoint(&format!("{}/gets", resource))?;
    tracing::debug!(%url, page = params.page, page_size = params.page_size, "list");
    let req = self.http.get(url).query(&params.to_query());
    self.fetch_json(req).await
  }

  /// Fetch a single record by its identifier.
  pub async fn get_one<T: DeserializeOwned>(
    &self,
    resource: &str,
    id: &str,
  ) -> Result<T, ApiError> {
    let url = self.endpoint(&format!("{}/{}/{}", resource, resource, id))?;
    tracing::debug!(%url, "get_one");
    self.fetch_json(self.http.get(url)).await
  }

  /// Create a new record. The server assigns the identifier.
  pub async fn create(&self, resource: &str, body: &serde_json::Value) -> Result<(), ApiError> {
    let url = self.endpoint(&format!("{}/add", resource))?;
    tracing::debug!(%url, "create");
    self.send(self.http.post(url).json(body)).await
  }

  /// Update an existing record, keyed by its identifier.
  pub async fn update(
    &self,
    resource: &str,
    id: &str,
    body: &serde_json::Value,
  ) -> Result<(), ApiError> {
    let url = self.endpoint(&format!("{}/update/{}", resource, id))?;
    tracing::debug!(%url, "update");
    self.send(self.http.put(url).json(body)).await
  }

  /// Delete a record by its identifier.
  pub async fn delete(&self, resource: &str, id: &str) -> Result<(), ApiError> {
    let url = self.endpoint(&format!("{}/delete/{}", resource, id))?;
    tracing::debug!(%url, "delete");
    self.send(self.http.delete(url)).await
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base
      .join(path)
      .map_err(|e| ApiError::Transport(format!("bad endpoint path '{}': {}", path, e)))
  }

  fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Issue a request and decode a JSON body on success.
  async fn fetch_json<T: DeserializeOwned>(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<T, ApiError> {
    let resp = self.authorize(req).send().await.map_err(ApiError::from)?;
    let resp = error_for_status(resp).await?;
    resp
      .json::<T>()
      .await
      .map_err(|e| ApiError::Decode(e.to_string()))
  }

  /// Issue a write request, discarding any success body.
  async fn send(&self, req: reqwest::RequestBuilder) -> Result<(), ApiError> {
    let resp = self.authorize(req).send().await.map_err(ApiError::from)?;
    error_for_status(resp).await?;
    Ok(())
  }
}

/// Convert an error response into `ApiError::Status`, preferring the
/// server's `{"error": ...}` message over the bare status text.
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  let fallback = status
    .canonical_reason()
    .unwrap_or("request failed")
    .to_string();
  let message = match resp.text().await {
    Ok(body) => serde_json::from_str::<ErrorBody>(&body)
      .map(|b| b.error)
      .unwrap_or(fallback),
    Err(_) => fallback,
  };

  Err(ApiError::Status {
    status: status.as_u16(),
    message,
  })
}

/// Base URLs must end in '/' or `Url::join` drops the last path segment.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
  if raw.ends_with('/') {
    Url::parse(raw)
  } else {
    Url::parse(&format!("{}/", raw))
  }
}
