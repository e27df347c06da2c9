//! Draft/preview gate.
//!
//! Each visitor is either `Disabled` (the default) or `Enabled`. Enabled
//! visitors see drafts. The state lives entirely in a signed cookie:
//!
//! ```text
//! __atelier_preview=<issued unix secs>.<hex HMAC-SHA256(secret, "preview:<issued>")>
//! ```
//!
//! The cookie is only honoured while it is younger than `max_age_secs` and
//! its signature verifies against the configured secret. No secret
//! configured means no visitor can ever be Enabled.

use crate::config::PreviewConfig;
use crate::error::SiteError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fixed key used only to compare secrets without early exit.
const COMPARE_KEY: &[u8] = b"atelier secret comparison";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Disabled,
    Enabled,
}

impl PreviewState {
    pub fn is_enabled(self) -> bool {
        self == PreviewState::Enabled
    }
}

/// Which repository a preview request points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKindParam {
    #[default]
    Blog,
    Portfolio,
}

impl ContentKindParam {
    pub fn parse(value: Option<&str>) -> Result<Self, SiteError> {
        match value.map(str::trim) {
            None | Some("") | Some("blog") => Ok(ContentKindParam::Blog),
            Some("portfolio") => Ok(ContentKindParam::Portfolio),
            Some(other) => Err(SiteError::bad_request(
                "INVALID_KIND",
                format!("Unknown content kind `{other}`"),
            )),
        }
    }

    pub fn listing_path(self) -> &'static str {
        match self {
            ContentKindParam::Blog => "/blog",
            ContentKindParam::Portfolio => "/portfolio",
        }
    }

    pub fn detail_path(self, slug: &str) -> String {
        format!("{}/{}", self.listing_path(), urlencoding::encode(slug))
    }
}

/// Query parameters of an activation request.
#[derive(Debug, Clone, Default)]
pub struct ActivationParams {
    pub secret: Option<String>,
    pub slug: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// Draft found: visitor enabled and sent to its detail view.
    Enabled { location: String, cookie: String },
    /// Published item: no transition, sent to the public view.
    Published { location: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deactivation {
    pub location: String,
    pub cookie: String,
}

#[derive(Clone)]
pub struct PreviewGate {
    secret: Option<String>,
    signer: Option<HmacSha256>,
    cookie_name: String,
    max_age_secs: u64,
}

impl std::fmt::Debug for PreviewGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewGate")
            .field("configured", &self.secret.is_some())
            .field("cookie_name", &self.cookie_name)
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}

impl PreviewGate {
    pub fn new(config: &PreviewConfig) -> Self {
        let secret = config.secret.clone().filter(|s| !s.is_empty());
        let signer = secret
            .as_deref()
            .and_then(|s| HmacSha256::new_from_slice(s.as_bytes()).ok());
        Self {
            secret,
            signer,
            cookie_name: config.cookie_name.clone(),
            max_age_secs: config.max_age_secs,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.signer.is_some()
    }

    /// Handle `GET /api/preview`.
    ///
    /// `lookup(kind, slug)` answers `Some(is_draft)` for an existing item,
    /// drafts included, and `None` for an unknown one.
    pub fn activate<F>(
        &self,
        params: &ActivationParams,
        now_secs: u64,
        lookup: F,
    ) -> Result<Activation, SiteError>
    where
        F: FnOnce(ContentKindParam, &str) -> Result<Option<bool>, SiteError>,
    {
        let Some(expected) = self.secret.as_deref() else {
            return Err(SiteError::unauthorized("Preview mode is not configured"));
        };
        let provided = params.secret.as_deref().unwrap_or_default();
        if provided.is_empty() || !secrets_match(expected, provided) {
            return Err(SiteError::unauthorized("Invalid token"));
        }
        let Some(slug) = params.slug.as_deref().filter(|s| !s.is_empty()) else {
            return Err(SiteError::unauthorized("Missing slug"));
        };
        let kind = ContentKindParam::parse(params.kind.as_deref())?;

        match lookup(kind, slug)? {
            None => Err(SiteError::NotFound),
            Some(true) => Ok(Activation::Enabled {
                location: kind.detail_path(slug),
                cookie: self.enable_cookie(now_secs),
            }),
            Some(false) => Ok(Activation::Published {
                location: kind.detail_path(slug),
            }),
        }
    }

    /// Handle `DELETE /api/preview`. Always succeeds.
    pub fn deactivate(&self, kind: ContentKindParam) -> Deactivation {
        Deactivation {
            location: kind.listing_path().to_string(),
            cookie: format!(
                "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
                self.cookie_name
            ),
        }
    }

    /// Preview state carried by a request's `Cookie` header.
    pub fn state(&self, cookie_header: Option<&str>, now_secs: u64) -> PreviewState {
        let Some(value) = cookie_header.and_then(|h| cookie_value(h, &self.cookie_name)) else {
            return PreviewState::Disabled;
        };
        if self.verify(value, now_secs) {
            PreviewState::Enabled
        } else {
            PreviewState::Disabled
        }
    }

    fn enable_cookie(&self, now_secs: u64) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            self.token(now_secs).unwrap_or_default(),
            self.max_age_secs
        )
    }

    fn token(&self, issued: u64) -> Option<String> {
        let mut mac = self.signer.clone()?;
        mac.update(format!("preview:{issued}").as_bytes());
        Some(format!("{issued}.{}", hex::encode(mac.finalize().into_bytes())))
    }

    fn verify(&self, value: &str, now_secs: u64) -> bool {
        let Some(mut mac) = self.signer.clone() else {
            return false;
        };
        let Some((issued, signature)) = value.split_once('.') else {
            return false;
        };
        let Ok(issued_secs) = issued.parse::<u64>() else {
            return false;
        };
        if issued_secs > now_secs || now_secs - issued_secs >= self.max_age_secs {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        mac.update(format!("preview:{issued_secs}").as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

/// Equality of two secrets in time independent of where they differ.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let Ok(mut expected_mac) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let tag = expected_mac.finalize().into_bytes();

    let Ok(mut provided_mac) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    provided_mac.update(provided.as_bytes());
    provided_mac.verify_slice(&tag).is_ok()
}

/// Value of cookie `name` in a `Cookie` request header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_717_243_200;

    fn gate(secret: Option<&str>) -> PreviewGate {
        PreviewGate::new(&PreviewConfig {
            secret: secret.map(String::from),
            ..PreviewConfig::default()
        })
    }

    fn params(secret: Option<&str>, slug: Option<&str>) -> ActivationParams {
        ActivationParams {
            secret: secret.map(String::from),
            slug: slug.map(String::from),
            kind: None,
        }
    }

    fn draft_lookup(_: ContentKindParam, slug: &str) -> Result<Option<bool>, SiteError> {
        Ok(match slug {
            "draft" => Some(true),
            "live" => Some(false),
            _ => None,
        })
    }

    /// `name=value` part of a `Set-Cookie` header.
    fn cookie_pair(set_cookie: &str) -> &str {
        set_cookie.split(';').next().unwrap()
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let err = gate(Some("s3cret"))
            .activate(&params(Some("nope"), Some("draft")), NOW, draft_lookup)
            .unwrap_err();
        assert_eq!(err.status(), 401);
    }

    #[test]
    fn missing_secret_or_slug_is_unauthorized() {
        let g = gate(Some("s3cret"));
        assert_eq!(g.activate(&params(None, Some("draft")), NOW, draft_lookup).unwrap_err().status(), 401);
        assert_eq!(g.activate(&params(Some("s3cret"), None), NOW, draft_lookup).unwrap_err().status(), 401);
    }

    #[test]
    fn unconfigured_gate_rejects_everything() {
        let g = gate(None);
        assert!(!g.is_configured());
        let err = g.activate(&params(Some(""), Some("draft")), NOW, draft_lookup).unwrap_err();
        assert_eq!(err.status(), 401);
        assert_eq!(g.state(Some("__atelier_preview=1.abcd"), NOW), PreviewState::Disabled);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let err = gate(Some("s3cret"))
            .activate(&params(Some("s3cret"), Some("ghost")), NOW, draft_lookup)
            .unwrap_err();
        assert_eq!(err, SiteError::NotFound);
    }

    #[test]
    fn draft_enables_and_cookie_verifies() {
        let g = gate(Some("s3cret"));
        let Activation::Enabled { location, cookie } = g
            .activate(&params(Some("s3cret"), Some("draft")), NOW, draft_lookup)
            .unwrap()
        else {
            panic!("expected Enabled");
        };
        assert_eq!(location, "/blog/draft");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert_eq!(g.state(Some(cookie_pair(&cookie)), NOW + 10), PreviewState::Enabled);
    }

    #[test]
    fn published_item_redirects_without_cookie() {
        let activation = gate(Some("s3cret"))
            .activate(&params(Some("s3cret"), Some("live")), NOW, draft_lookup)
            .unwrap();
        assert_eq!(
            activation,
            Activation::Published {
                location: "/blog/live".into()
            }
        );
    }

    #[test]
    fn portfolio_kind_redirects_to_portfolio() {
        let mut p = params(Some("s3cret"), Some("live"));
        p.kind = Some("portfolio".into());
        let activation = gate(Some("s3cret")).activate(&p, NOW, draft_lookup).unwrap();
        assert_eq!(
            activation,
            Activation::Published {
                location: "/portfolio/live".into()
            }
        );
    }

    #[test]
    fn unknown_kind_is_bad_request() {
        let mut p = params(Some("s3cret"), Some("live"));
        p.kind = Some("shop".into());
        let err = gate(Some("s3cret")).activate(&p, NOW, draft_lookup).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn cookie_expires_after_max_age() {
        let g = gate(Some("s3cret"));
        let cookie = g.enable_cookie(NOW);
        let pair = cookie_pair(&cookie);
        assert_eq!(g.state(Some(pair), NOW + 3599), PreviewState::Enabled);
        assert_eq!(g.state(Some(pair), NOW + 3600), PreviewState::Disabled);
    }

    #[test]
    fn tampered_or_foreign_cookie_rejected() {
        let g = gate(Some("s3cret"));
        let token = g.token(NOW).unwrap();
        let (issued, sig) = token.split_once('.').unwrap();
        let forged = format!("__atelier_preview={}.{sig}", issued.parse::<u64>().unwrap() + 1);
        assert_eq!(g.state(Some(&forged), NOW + 5), PreviewState::Disabled);

        let other = gate(Some("different"));
        let foreign = format!("__atelier_preview={}", other.token(NOW).unwrap());
        assert_eq!(g.state(Some(&foreign), NOW), PreviewState::Disabled);

        assert_eq!(g.state(Some("__atelier_preview=garbage"), NOW), PreviewState::Disabled);
        assert_eq!(g.state(None, NOW), PreviewState::Disabled);
    }

    #[test]
    fn deactivate_clears_cookie() {
        let g = gate(Some("s3cret"));
        let out = g.deactivate(ContentKindParam::Blog);
        assert_eq!(out.location, "/blog");
        assert!(out.cookie.starts_with("__atelier_preview=;"));
        assert!(out.cookie.contains("Max-Age=0"));
        assert_eq!(g.deactivate(ContentKindParam::Portfolio).location, "/portfolio");
    }

    #[test]
    fn cookie_value_finds_named_pair() {
        let header = "theme=dark; __atelier_preview=123.abc ; other=x";
        assert_eq!(cookie_value(header, "__atelier_preview"), Some("123.abc"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
    }
}
