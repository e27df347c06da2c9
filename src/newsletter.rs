//! Newsletter signup endpoint.
//!
//! Validates the submitted address and logs it. There is no list provider
//! behind it; a subscription is a log line.

use crate::error::SiteError;
use crate::logging::Logger;
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Successfully subscribed to newsletter!";

#[derive(Debug, Deserialize)]
struct SignupRequest {
    #[serde(default)]
    email: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscribed {
    pub message: &'static str,
    pub email: String,
}

/// Handle `POST /api/newsletter` with a JSON body `{ "email": ... }`.
pub fn subscribe(body: &[u8], logger: &Logger) -> Result<Subscribed, SiteError> {
    let request: SignupRequest = serde_json::from_slice(body).map_err(|e| {
        logger.debug(&format!("newsletter body rejected: {e}"));
        SiteError::bad_request("INVALID_JSON", "Request body must be a JSON object")
    })?;

    let email = match request.email {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(_) => {
            return Err(SiteError::bad_request(
                "INVALID_EMAIL",
                "Valid email address is required",
            ));
        }
    };
    if email.is_empty() {
        return Err(SiteError::bad_request(
            "EMAIL_REQUIRED",
            "Email address is required",
        ));
    }
    if !email.contains('@') {
        return Err(SiteError::bad_request(
            "INVALID_EMAIL",
            "Valid email address is required",
        ));
    }

    logger.info(&format!("Newsletter subscription: {email}"));
    Ok(Subscribed {
        message: SUCCESS_MESSAGE,
        email,
    })
}
