//! # Atelier
//!
//! Content pipeline and server for an artist's portfolio and blog. Posts and
//! artworks are plain files; the site reads them fresh on every request,
//! hides drafts from the public, and lets the author preview drafts behind
//! a secret.
//!
//! # Request Flow
//!
//! ```text
//! HTTP request ─▶ server::handle ─▶ Site page method ─▶ Repository::get / list
//!                      │                                      │
//!                      │                          frontmatter::parse + MdxCompiler
//!                      ▼                                      ▼
//!               PreviewGate::state                    render (maud) ─▶ response
//! ```
//!
//! Every failure on the way becomes a [`error::SiteError`], converted once
//! at the route boundary into a JSON envelope or an error page.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`content`] | Generic repository over a content directory; blog and portfolio schemas |
//! | [`frontmatter`] | Splits a file into YAML metadata and body text |
//! | [`compile`] | Markdown with components to HTML behind the [`compile::Compiler`] trait |
//! | [`naming`] | Slug ↔ file name mapping and slug validation |
//! | [`preview`] | Draft/preview gate with signed cookies |
//! | [`newsletter`] | Newsletter signup validation |
//! | [`error`] | Error taxonomy and the wire envelope |
//! | [`site`] | Wires config, repositories, gate and logger; page methods |
//! | [`render`] | Page templates using Maud |
//! | [`server`] | `tiny_http` accept loop and the pure request handler |
//! | [`generate`] | Static export of published pages |
//! | [`check`] | Compile every item and collect failures |
//! | [`config`] | `atelier.toml` loading, merging, env overrides and validation |
//! | [`logging`] | `tracing` setup and the injected [`logging::Logger`] |
//! | [`output`] | CLI output formatting for `check` and `build` |
//!
//! # Design Decisions
//!
//! ## No Cache
//!
//! Repositories read the directory on every call. An edit to a content file
//! shows up on the next request without a restart or a rebuild step, and
//! there is no invalidation to get wrong.
//!
//! ## Hidden Drafts Look Missing
//!
//! A draft requested without preview answers exactly like a slug that was
//! never written. Visitors cannot probe for unpublished work.
//!
//! ## Preview State in the Cookie
//!
//! The server holds no session table. Preview is a signed, expiring cookie,
//! so restarting the server or running several of them changes nothing.

pub mod check;
pub mod compile;
pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;
pub mod generate;
pub mod logging;
pub mod naming;
pub mod newsletter;
pub mod output;
pub mod preview;
pub mod render;
pub mod server;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
