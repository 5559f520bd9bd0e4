//! Typed failures for the REST layer.
//!
//! Requests fail in one of three ways: the transport never produced a
//! response, the server answered with an error status and a message body,
//! or the body could not be decoded. Views match on these instead of
//! formatting strings, so conflict errors can be told apart from dead
//! networks.

use serde::Deserialize;

/// Error returned by every `ApiClient` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
  /// Network-level failure; no HTTP status was received
  Transport(String),
  /// Server replied with a non-success status and (usually) an error body
  Status { status: u16, message: String },
  /// Response arrived but the body could not be decoded
  Decode(String),
}

/// Error body shape used by the backend: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}

impl ApiError {
  /// HTTP status code, if the server got far enough to send one.
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Human-readable message for status lines and alerts.
  pub fn message(&self) -> &str {
    match self {
      ApiError::Transport(m) | ApiError::Decode(m) => m,
      ApiError::Status { message, .. } => message,
    }
  }

  /// Duplicate-key conflict: the backend answers create/update collisions
  /// with 400 and "<Resource> ID already exists". These are user errors,
  /// surfaced as an alert with the form kept open for correction.
  pub fn is_duplicate_id(&self) -> bool {
    matches!(
      self,
      ApiError::Status { status: 400, message } if message.ends_with("ID already exists")
    )
  }

  pub fn is_not_found(&self) -> bool {
    self.status() == Some(404)
  }
}

impl std::fmt::Display for ApiError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ApiError::Transport(m) => write!(f, "network error: {}", m),
      ApiError::Status { status, message } => write!(f, "{} ({})", message, status),
      ApiError::Decode(m) => write!(f, "bad response: {}", m),
    }
  }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ApiError::Decode(e.to_string())
    } else {
      ApiError::Transport(e.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_duplicate_id_detection() {
    let err = ApiError::Status {
      status: 400,
      message: "Donor ID already exists".to_string(),
    };
    assert!(err.is_duplicate_id());

    let err = ApiError::Status {
      status: 400,
      message: "Event ID already exists".to_string(),
    };
    assert!(err.is_duplicate_id());
  }

  #[test]
  fn test_duplicate_id_requires_status_400() {
    let err = ApiError::Status {
      status: 500,
      message: "Donor ID already exists".to_string(),
    };
    assert!(!err.is_duplicate_id());

    let err = ApiError::Transport("Donor ID already exists".to_string());
    assert!(!err.is_duplicate_id());
  }

  #[test]
  fn test_not_found() {
    let err = ApiError::Status {
      status: 404,
      message: "not found".to_string(),
    };
    assert!(err.is_not_found());
    assert!(!err.is_duplicate_id());
  }

  #[test]
  fn test_error_body_parses() {
    let body: ErrorBody = serde_json::from_str(r#"{"error":"Item ID already exists"}"#)
      .expect("error body should parse");
    assert_eq!(body.error, "Item ID already exists");
  }
}
