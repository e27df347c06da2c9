//! Site-level error taxonomy and its wire envelope.
//!
//! Every failure that reaches a route boundary is a [`SiteError`]. The
//! boundary turns it into an [`ErrorEnvelope`] through one function,
//! [`SiteError::to_envelope`], and answers with either the JSON envelope
//! (API routes) or an error page rendered from it (HTML routes).

use crate::config::Mode;
use crate::content::ContentError;
use crate::logging::source_chain;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiteError {
    /// Absent item, or a draft the visitor may not see.
    #[error("not found")]
    NotFound,
    #[error("{message}")]
    InvalidInput {
        status: u16,
        code: &'static str,
        message: String,
    },
    /// Body failed to compile. Visitors see a 404.
    #[error("compiling {slug}: {message}")]
    CompilationFailure { slug: String, message: String },
    #[error("{message}")]
    Unexpected { message: String, chain: Vec<String> },
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl SiteError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        SiteError::InvalidInput {
            status: 401,
            code: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        SiteError::InvalidInput {
            status: 400,
            code,
            message: message.into(),
        }
    }

    pub fn unexpected(err: &dyn std::error::Error) -> Self {
        SiteError::Unexpected {
            message: err.to_string(),
            chain: source_chain(err),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            SiteError::NotFound | SiteError::CompilationFailure { .. } => 404,
            SiteError::InvalidInput { status, .. } => *status,
            SiteError::Unexpected { .. } => 500,
            SiteError::MethodNotAllowed => 405,
        }
    }

    /// Machine-readable name placed in the envelope's `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            SiteError::NotFound | SiteError::CompilationFailure { .. } => "NOT_FOUND",
            SiteError::InvalidInput { code, .. } => code,
            SiteError::Unexpected { .. } => "INTERNAL_ERROR",
            SiteError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }

    /// Text safe to show a visitor. Compilation details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            SiteError::NotFound | SiteError::CompilationFailure { .. } => {
                "The requested page could not be found".to_string()
            }
            SiteError::InvalidInput { message, .. } => message.clone(),
            SiteError::Unexpected { .. } => "An unexpected error occurred".to_string(),
            SiteError::MethodNotAllowed => "Method not allowed".to_string(),
        }
    }

    fn stack(&self) -> Vec<String> {
        match self {
            SiteError::Unexpected { chain, .. } => chain.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn to_envelope(&self, path: &str, mode: Mode) -> ErrorEnvelope {
        self.to_envelope_at(path, mode, Utc::now())
    }

    pub fn to_envelope_at(&self, path: &str, mode: Mode, now: DateTime<Utc>) -> ErrorEnvelope {
        let message = if mode.is_development() {
            self.to_string()
        } else {
            self.public_message()
        };
        ErrorEnvelope {
            error: self.code().to_string(),
            message,
            status: self.status(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            path: path.to_string(),
            stack: mode.is_development().then(|| self.stack()),
        }
    }
}

impl From<ContentError> for SiteError {
    fn from(err: ContentError) -> Self {
        match &err {
            ContentError::Io { .. } => SiteError::unexpected(&err),
            ContentError::FrontMatter { path, source } => SiteError::CompilationFailure {
                slug: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                message: source.to_string(),
            },
            ContentError::Compile { slug, source } => SiteError::CompilationFailure {
                slug: slug.clone(),
                message: source.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub timestamp: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

impl ErrorEnvelope {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"error":"{}","status":{}}}"#, self.error, self.status)
        })
    }
}

/// Value for the `X-Error-ID` header: epoch millis plus a random suffix.
pub fn error_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompileError;
    use chrono::TimeZone;
    use std::io;
    use std::path::PathBuf;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn statuses() {
        assert_eq!(SiteError::NotFound.status(), 404);
        assert_eq!(SiteError::unauthorized("no").status(), 401);
        assert_eq!(SiteError::bad_request("INVALID_EMAIL", "bad").status(), 400);
        assert_eq!(SiteError::MethodNotAllowed.status(), 405);
        let failure = SiteError::CompilationFailure {
            slug: "x".into(),
            message: "m".into(),
        };
        assert_eq!(failure.status(), 404);
    }

    #[test]
    fn production_envelope_has_no_stack() {
        let env = SiteError::bad_request("INVALID_EMAIL", "Invalid email address")
            .to_envelope_at("/api/newsletter", Mode::Production, at());
        assert_eq!(env.error, "INVALID_EMAIL");
        assert_eq!(env.message, "Invalid email address");
        assert_eq!(env.status, 400);
        assert_eq!(env.timestamp, "2024-06-01T12:00:00.000Z");
        assert_eq!(env.path, "/api/newsletter");
        assert_eq!(env.stack, None);
        let json: serde_json::Value = serde_json::from_str(&env.to_json()).unwrap();
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn development_envelope_carries_source_chain() {
        let content = ContentError::Io {
            path: PathBuf::from("/content/blog"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let err = SiteError::from(content);
        assert_eq!(err.status(), 500);
        let env = err.to_envelope_at("/blog", Mode::Development, at());
        let stack = env.stack.unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[1], "denied");
    }

    #[test]
    fn compile_errors_map_to_not_found_publicly() {
        let err = SiteError::from(ContentError::Compile {
            slug: "broken".into(),
            source: CompileError::UnterminatedTag { line: 3 },
        });
        let env = err.to_envelope_at("/blog/broken", Mode::Production, at());
        assert_eq!(env.status, 404);
        assert_eq!(env.error, "NOT_FOUND");
        assert!(!env.message.contains("broken"));
    }

    #[test]
    fn error_ids_are_distinct() {
        let a = error_id();
        let b = error_id();
        assert_ne!(a, b);
        let (millis, suffix) = a.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
    }
}
