//! Markup parsing and denoising.
//!
//! Raw markup goes through a streaming `lol_html` rewrite that drops
//! non-content elements and strips styling/instrumentation attributes, then
//! is parsed into a `scraper` document for title lookup and extraction.

use crate::error::SieveError;
use crate::types::UNTITLED;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Elements removed together with their whole subtree.
pub const DENYLIST_TAGS: [&str; 12] = [
    "script", "style", "noscript", "iframe", "frame", "meta", "link", "object", "embed", "canvas",
    "ins", "svg",
];

/// Denylisted elements with a closing tag, removed during the streaming
/// rewrite. The void ones (`frame` among them) are left to the tree pass,
/// since the rewriter would otherwise take everything up to the parent's
/// close tag with them.
const STREAM_REMOVED_TAGS: [&str; 8] = [
    "script", "style", "noscript", "iframe", "object", "canvas", "ins", "svg",
];

/// Content-bearing elements that are kept but lose [`STRIPPED_ATTRIBUTES`].
pub const ATTRIBUTE_DENOISE_TAGS: [&str; 38] = [
    "header", "footer", "nav", "aside", "div", "h1", "h2", "h3", "h4", "h5", "h6", "p", "span",
    "section", "article", "main", "figure", "a", "button", "input", "textarea", "select", "label",
    "img", "video", "audio", "form", "table", "tr", "td", "th", "ul", "ol", "li", "pre", "code",
    "blockquote", "figcaption",
];

/// Presentation attributes plus the JS-framework hook attributes used for
/// client-side wiring.
pub const STRIPPED_ATTRIBUTES: [&str; 6] = [
    "class",
    "style",
    "jsname",
    "jsaction",
    "jscontroller",
    "jsmodel",
];

static DENYLIST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(&DENYLIST_TAGS.join(", ")).expect("static denylist selector"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static title selector"));

/// A parsed, denoised document and its resolved title.
pub struct SanitizedPage {
    pub title: String,
    pub document: Html,
}

/// Parse `markup` fetched from `source` into a denoised document.
///
/// Fails with [`SieveError::Parse`] when the payload is empty, binary, or
/// cannot be rewritten.
pub fn sanitize(markup: &str, source: &Url) -> Result<SanitizedPage, SieveError> {
    let parse_error = |reason: String| SieveError::Parse {
        url: source.to_string(),
        reason,
    };

    if markup.trim().is_empty() {
        return Err(parse_error("empty document".to_string()));
    }
    if markup.contains('\0') {
        return Err(parse_error("payload is not text markup".to_string()));
    }

    let t0 = Instant::now();
    let cleaned = denoise(markup).map_err(|e| parse_error(e.to_string()))?;
    let t1 = Instant::now();

    let mut document = Html::parse_document(&cleaned);
    drop_denylisted(&mut document);
    let title = document_title(&document);
    let t2 = Instant::now();

    debug!(
        target: "sieve.sanitize",
        url = %source,
        rewrite_ms = %((t1 - t0).as_millis()),
        parse_ms = %((t2 - t1).as_millis()),
        input_bytes = markup.len(),
        output_bytes = cleaned.len(),
        "sanitized document"
    );

    Ok(SanitizedPage { title, document })
}

/// Streaming rewrite of `markup` with denylisted elements removed and
/// noisy attributes stripped.
pub fn denoise(markup: &str) -> Result<String, lol_html::errors::RewritingError> {
    let mut element_content_handlers =
        Vec::with_capacity(STREAM_REMOVED_TAGS.len() + ATTRIBUTE_DENOISE_TAGS.len());
    for tag in STREAM_REMOVED_TAGS {
        element_content_handlers.push(element!(tag, |el| {
            el.remove();
            Ok(())
        }));
    }
    for tag in ATTRIBUTE_DENOISE_TAGS {
        element_content_handlers.push(element!(tag, |el| {
            for attr in STRIPPED_ATTRIBUTES {
                el.remove_attribute(attr);
            }
            Ok(())
        }));
    }

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers,
            strict: false,
            ..RewriteStrSettings::default()
        },
    )
}

/// Detach any denylisted element the tree builder produced on its own.
fn drop_denylisted(document: &mut Html) {
    let leftovers: Vec<_> = document
        .select(&DENYLIST_SELECTOR)
        .map(|el| el.id())
        .collect();
    for id in leftovers {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// The document's declared title, or [`UNTITLED`] when absent or blank.
pub fn document_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
