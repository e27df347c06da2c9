//! HTML page templates.
//!
//! Pure functions from loaded content to [`Markup`]; the server and the
//! static exporter both call them. Templates are
//! [maud](https://maud.lambda.xyz/) so every interpolated value is escaped.
//! Only compiled content bodies are inserted raw.
//!
//! ## Pages
//!
//! | Route                  | Renderer                  |
//! |------------------------|---------------------------|
//! | `/`                    | [`render_home`]           |
//! | `/blog`                | [`render_blog_index`]     |
//! | `/blog/<slug>`         | [`render_blog_post`]      |
//! | `/portfolio`           | [`render_portfolio_index`]|
//! | `/portfolio/<slug>`    | [`render_artwork`]        |
//! | any failure            | [`render_error_page`]     |

use crate::content::{ArtworkPiece, BlogPost, Entry};
use crate::error::ErrorEnvelope;
use crate::preview::PreviewState;
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/site.js");

/// Site-wide values every page needs.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub site_title: &'a str,
    pub preview: PreviewState,
}

/// Extra `<head>` tags for a page.
#[derive(Debug, Default)]
struct HeadMeta<'a> {
    description: Option<&'a str>,
    og_title: Option<&'a str>,
    og_image: Option<&'a str>,
    og_type: Option<&'a str>,
    author: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Home,
    Blog,
    Portfolio,
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(
    ctx: &PageContext,
    title: &str,
    meta: &HeadMeta,
    section: Section,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if let Some(description) = meta.description {
                    meta name="description" content=(description);
                }
                @if let Some(author) = meta.author {
                    meta name="author" content=(author);
                }
                @if let Some(og_title) = meta.og_title {
                    meta property="og:title" content=(og_title);
                    @if let Some(description) = meta.description {
                        meta property="og:description" content=(description);
                    }
                    meta property="og:type" content=(meta.og_type.unwrap_or("website"));
                    @if let Some(image) = meta.og_image {
                        meta property="og:image" content=(image);
                    }
                }
                style { (PreEscaped(CSS)) }
            }
            body class=[ctx.preview.is_enabled().then_some("previewing")] {
                @if ctx.preview.is_enabled() {
                    (preview_banner())
                }
                (site_header(ctx.site_title, section))
                (content)
                footer.site-footer {
                    p { (ctx.site_title) }
                }
                script { (PreEscaped(JS)) }
            }
        }
    }
}

fn site_header(site_title: &str, current: Section) -> Markup {
    let link = |section: Section, href: &str, label: &str| {
        html! {
            li class=[(section == current).then_some("current")] {
                a href=(href) { (label) }
            }
        }
    };
    html! {
        header.site-header {
            a.site-title href="/" { (site_title) }
            nav.site-nav {
                ul {
                    (link(Section::Blog, "/blog", "Blog"))
                    (link(Section::Portfolio, "/portfolio", "Portfolio"))
                }
            }
        }
    }
}

/// Shown on every page while preview is enabled.
fn preview_banner() -> Markup {
    html! {
        div.preview-banner role="status" {
            span { strong { "Preview Mode Active" } " - You are viewing draft content" }
            button.preview-exit type="button" data-exit-preview { "Exit Preview" }
        }
    }
}

/// Shown on a detail page whose item is a draft.
fn draft_banner(noun: &str) -> Markup {
    html! {
        div.draft-banner {
            "This " (noun) " is a draft and is not visible to the public."
        }
    }
}

fn newsletter_form() -> Markup {
    html! {
        section.newsletter {
            h2 { "Newsletter" }
            p { "New work and studio notes, a few times a year." }
            form.newsletter-form data-newsletter {
                input type="email" name="email" placeholder="you@example.com" required;
                button type="submit" { "Subscribe" }
                p.newsletter-status aria-live="polite" {}
            }
        }
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn post_card(post: &BlogPost) -> Markup {
    html! {
        article.post-card {
            @if let Some(cover) = &post.cover_image {
                img.post-cover src=(cover) alt=(post.title) loading="lazy";
            }
            h3 {
                a href={ "/blog/" (post.slug) } { (post.title) }
                @if post.is_draft {
                    span.badge.draft { "Draft" }
                }
            }
            time datetime=(post.published_at.to_rfc3339()) { (format_date(&post.published_at)) }
            @if !post.excerpt.is_empty() {
                p.excerpt { (post.excerpt) }
            }
            @if !post.tags.is_empty() {
                ul.tags {
                    @for tag in &post.tags {
                        li { (tag) }
                    }
                }
            }
        }
    }
}

fn artwork_card(art: &ArtworkPiece) -> Markup {
    html! {
        a.artwork-card href={ "/portfolio/" (art.slug) } {
            img src=(art.images.thumbnail) alt=(art.title) loading="lazy";
            span.artwork-title { (art.title) }
            span.artwork-meta { (art.medium) ", " (art.year) }
            @if art.featured {
                span.badge.featured { "Featured" }
            }
            @if art.is_draft {
                span.badge.draft { "Draft" }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

pub fn render_home(ctx: &PageContext, recent: &[BlogPost], featured: &[ArtworkPiece]) -> Markup {
    let content = html! {
        main.home-page {
            section.intro {
                h1 { (ctx.site_title) }
            }
            section.featured-work {
                h2 { "Featured Work" }
                @if featured.is_empty() {
                    p.empty { "No featured work yet." }
                } @else {
                    div.artwork-grid {
                        @for art in featured {
                            (artwork_card(art))
                        }
                    }
                }
                a.more href="/portfolio" { "View all work" }
            }
            section.recent-posts {
                h2 { "Recent Posts" }
                @if recent.is_empty() {
                    p.empty { "No posts yet." }
                } @else {
                    @for post in recent {
                        (post_card(post))
                    }
                }
                a.more href="/blog" { "Read the blog" }
            }
            (newsletter_form())
        }
    };
    base_document(ctx, ctx.site_title, &HeadMeta::default(), Section::Home, content)
}

pub fn render_blog_index(ctx: &PageContext, posts: &[BlogPost]) -> Markup {
    let content = html! {
        main.blog-index {
            h1 { "Blog" }
            @if posts.is_empty() {
                p.empty { "No posts yet." }
            }
            @for post in posts {
                (post_card(post))
            }
        }
    };
    let title = format!("Blog | {}", ctx.site_title);
    base_document(ctx, &title, &HeadMeta::default(), Section::Blog, content)
}

pub fn render_blog_post(ctx: &PageContext, entry: &Entry<BlogPost>) -> Markup {
    let post = &entry.meta;
    let title = format!("{} | Blog", post.title);
    let meta = HeadMeta {
        description: Some(post.excerpt.as_str()).filter(|s| !s.is_empty()),
        og_title: Some(&post.title),
        og_image: post.cover_image.as_deref(),
        og_type: Some("article"),
        author: Some(&post.author),
    };

    let content = html! {
        main.post-page {
            @if post.is_draft {
                (draft_banner("post"))
            }
            article {
                header.post-header {
                    h1 { (post.title) }
                    p.byline {
                        "By " (post.author) " · "
                        time datetime=(post.published_at.to_rfc3339()) { (format_date(&post.published_at)) }
                    }
                    @if let Some(cover) = &post.cover_image {
                        img.post-cover src=(cover) alt=(post.title);
                    }
                }
                div.prose {
                    (PreEscaped(&entry.html))
                }
                @if !post.tags.is_empty() {
                    ul.tags {
                        @for tag in &post.tags {
                            li { (tag) }
                        }
                    }
                }
            }
            a.back href="/blog" { "← All posts" }
        }
    };
    base_document(ctx, &title, &meta, Section::Blog, content)
}

/// Portfolio listing. `selected` is the active category filter, if any.
pub fn render_portfolio_index(
    ctx: &PageContext,
    artworks: &[ArtworkPiece],
    categories: &[String],
    selected: Option<&str>,
) -> Markup {
    let is_selected = |c: &str| selected.is_some_and(|s| s.eq_ignore_ascii_case(c));
    let content = html! {
        main.portfolio-index {
            h1 { "Portfolio" }
            @if !categories.is_empty() {
                nav.categories {
                    ul {
                        li class=[selected.is_none().then_some("current")] {
                            a href="/portfolio" { "All" }
                        }
                        @for category in categories {
                            li class=[is_selected(category).then_some("current")] {
                                a href={ "/portfolio?category=" (urlencoding::encode(category)) } { (category) }
                            }
                        }
                    }
                }
            }
            @if artworks.is_empty() {
                p.empty { "No work to show." }
            } @else {
                div.artwork-grid {
                    @for art in artworks {
                        (artwork_card(art))
                    }
                }
            }
        }
    };
    let title = format!("Portfolio | {}", ctx.site_title);
    base_document(ctx, &title, &HeadMeta::default(), Section::Portfolio, content)
}

pub fn render_artwork(ctx: &PageContext, entry: &Entry<ArtworkPiece>) -> Markup {
    let art = &entry.meta;
    let title = format!("{} | Portfolio", art.title);
    let meta = HeadMeta {
        description: Some(art.description.as_str()).filter(|s| !s.is_empty()),
        og_title: Some(&art.title),
        og_image: Some(&art.images.main),
        og_type: None,
        author: None,
    };

    let content = html! {
        main.artwork-page {
            @if art.is_draft {
                (draft_banner("artwork"))
            }
            figure.artwork-main {
                img src=(art.images.main) alt=(art.title);
            }
            div.artwork-details {
                h1 { (art.title) }
                dl {
                    dt { "Medium" } dd { (art.medium) }
                    @if !art.dimensions.is_empty() {
                        dt { "Dimensions" } dd { (art.dimensions) }
                    }
                    dt { "Year" } dd { (art.year) }
                    dt { "Category" } dd { (art.category.join(", ")) }
                }
                @if art.available {
                    p.availability.available {
                        "Available"
                        @if let Some(price) = art.display_price() {
                            " · " (price)
                        }
                    }
                } @else {
                    p.availability.sold { "Sold" }
                }
                @if !art.description.is_empty() {
                    p.description { (art.description) }
                }
                div.prose {
                    (PreEscaped(&entry.html))
                }
            }
            @if !art.images.gallery.is_empty() {
                div.gallery {
                    @for src in &art.images.gallery {
                        img src=(src) alt=(art.title) loading="lazy";
                    }
                }
            }
            a.back href="/portfolio" { "← All work" }
        }
    };
    base_document(ctx, &title, &meta, Section::Portfolio, content)
}

/// Error page built from the same envelope the API routes return.
pub fn render_error_page(ctx: &PageContext, envelope: &ErrorEnvelope) -> Markup {
    let heading = match envelope.status {
        404 => "Page not found",
        405 => "Method not allowed",
        s if s < 500 => "Request rejected",
        _ => "Something went wrong",
    };
    let content = html! {
        main.error-page {
            h1 { (envelope.status) " · " (heading) }
            p { (envelope.message) }
            @if let Some(stack) = &envelope.stack {
                pre.stack {
                    @for line in stack {
                        (line) "\n"
                    }
                }
                p.error-meta { (envelope.error) " at " (envelope.path) " (" (envelope.timestamp) ")" }
            }
            a href="/" { "Back home" }
        }
    };
    let title = format!("{heading} | {}", ctx.site_title);
    base_document(ctx, &title, &HeadMeta::default(), Section::Home, content)
}
