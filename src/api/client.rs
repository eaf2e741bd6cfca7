//! JSON-over-HTTP transport with bearer-token auth.

use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;

#[derive(Error, Debug)]
pub enum BackendError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("server returned {status}: {body}")]
  Server { status: u16, body: String },
  #[error("JSON parse error: {0}")]
  Json(#[from] serde_json::Error),
  #[error("invalid backend URL: {0}")]
  Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
  Get,
  Post,
  Put,
}

impl HttpMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
    }
  }
}

/// A backend that answers JSON requests.
///
/// `path` is relative to the API root and may carry a query string.
/// `token` is attached as a bearer credential when present.
pub trait Backend: Send + Sync + 'static {
  fn request(
    &self,
    method: HttpMethod,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> impl Future<Output = Result<Value, BackendError>> + Send;
}

/// reqwest-backed client for the real backend.
#[derive(Clone)]
pub struct BackendClient {
  client: reqwest::Client,
  base_url: Url,
}

impl BackendClient {
  pub fn new(config: &Config) -> Result<Self, BackendError> {
    Self::with_base_url(&config.backend.url)
  }

  /// `base_url` is the API root, e.g. `http://localhost:1234/api`.
  pub fn with_base_url(base_url: &str) -> Result<Self, BackendError> {
    let mut base_url = Url::parse(base_url)?;
    // Url::join drops the last segment unless the root ends with a slash
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    Ok(Self {
      client: reqwest::Client::new(),
      base_url,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
    Ok(self.base_url.join(path.trim_start_matches('/'))?)
  }
}

impl Backend for BackendClient {
  fn request(
    &self,
    method: HttpMethod,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> impl Future<Output = Result<Value, BackendError>> + Send {
    let url = self.endpoint(path);
    let client = self.client.clone();
    let token = token.map(String::from);

    async move {
      let url = url?;
      info!(method = method.as_str(), url = %url, "backend request");

      let mut request = match method {
        HttpMethod::Get => client.get(url),
        HttpMethod::Post => client.post(url),
        HttpMethod::Put => client.put(url),
      };
      if let Some(token) = token {
        request = request.bearer_auth(token);
      }
      if let Some(body) = body {
        request = request.json(&body);
      }

      let resp = request.send().await?;
      let status = resp.status();
      if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let body = if body.trim().is_empty() {
          status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
        } else {
          body
        };
        return Err(BackendError::Server {
          status: status.as_u16(),
          body,
        });
      }

      let text = resp.text().await?;
      debug!(bytes = text.len(), "backend response");
      if text.trim().is_empty() {
        return Ok(Value::Null);
      }
      Ok(serde_json::from_str(&text)?)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_bearer_token_and_json_body() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/api/leaves/apply")
      .match_header("authorization", "Bearer t0k3n")
      .match_body(mockito::Matcher::Json(
        serde_json::json!({"leaveDate": "2025-04-01"}),
      ))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"id": 9}"#)
      .expect(1)
      .create_async()
      .await;

    let client = BackendClient::with_base_url(&format!("{}/api", server.url())).unwrap();
    let value = client
      .request(
        HttpMethod::Post,
        "/leaves/apply",
        Some("t0k3n"),
        Some(serde_json::json!({"leaveDate": "2025-04-01"})),
      )
      .await
      .unwrap();

    assert_eq!(value["id"], 9);
  }

  #[tokio::test]
  async fn test_no_auth_header_without_token() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("GET", "/api/announcements")
      .match_header("authorization", mockito::Matcher::Missing)
      .with_status(200)
      .with_body("[]")
      .create_async()
      .await;

    let client = BackendClient::with_base_url(&format!("{}/api/", server.url())).unwrap();
    let value = client
      .request(HttpMethod::Get, "announcements", None, None)
      .await
      .unwrap();
    assert_eq!(value, serde_json::json!([]));
  }

  #[tokio::test]
  async fn test_non_success_carries_body() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("GET", "/api/leaves/my")
      .with_status(403)
      .with_body("token expired")
      .create_async()
      .await;

    let client = BackendClient::with_base_url(&format!("{}/api", server.url())).unwrap();
    let err = client
      .request(HttpMethod::Get, "/leaves/my", Some("old"), None)
      .await
      .unwrap_err();

    match err {
      BackendError::Server { status, body } => {
        assert_eq!(status, 403);
        assert_eq!(body, "token expired");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn test_empty_error_body_uses_status_text() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("PUT", "/api/leaves/3/reject")
      .with_status(404)
      .create_async()
      .await;

    let client = BackendClient::with_base_url(&format!("{}/api", server.url())).unwrap();
    let err = client
      .request(HttpMethod::Put, "/leaves/3/reject", Some("t"), None)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      BackendError::Server { status: 404, ref body } if body == "Not Found"
    ));
  }

  #[tokio::test]
  async fn test_empty_success_body_is_null() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("PUT", "/api/leaves/3/approve")
      .match_query(mockito::Matcher::UrlEncoded(
        "approvedBy".into(),
        "HR Manager".into(),
      ))
      .with_status(204)
      .create_async()
      .await;

    let client = BackendClient::with_base_url(&format!("{}/api", server.url())).unwrap();
    let value = client
      .request(
        HttpMethod::Put,
        "/leaves/3/approve?approvedBy=HR%20Manager",
        Some("t"),
        None,
      )
      .await
      .unwrap();
    assert_eq!(value, Value::Null);
  }

  #[test]
  fn test_rejects_bad_base_url() {
    assert!(matches!(
      BackendClient::with_base_url("not a url"),
      Err(BackendError::Url(_))
    ));
  }
}
