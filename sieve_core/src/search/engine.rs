use crate::error::SieveError;
use crate::sanitize::collapse_whitespace;
use crate::types::WebPage;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A supported search provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum WebSearchEngine {
    #[default]
    Google,
    Baidu,
    Bing,
    DuckDuckGo,
}

impl WebSearchEngine {
    pub const ALL: [WebSearchEngine; 4] = [
        WebSearchEngine::Google,
        WebSearchEngine::Baidu,
        WebSearchEngine::Bing,
        WebSearchEngine::DuckDuckGo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebSearchEngine::Google => "google",
            WebSearchEngine::Baidu => "baidu",
            WebSearchEngine::Bing => "bing",
            WebSearchEngine::DuckDuckGo => "duckduckgo",
        }
    }

    /// The results page for `query`. The query is percent-encoded, so any
    /// text (including an empty string) yields a well-formed URL.
    pub fn query_url(&self, query: &str) -> Result<Url, SieveError> {
        let encoded = urlencoding::encode(query);
        let raw = match self {
            WebSearchEngine::Google => {
                format!("https://www.google.com/search?q={}&hl=en", encoded)
            }
            WebSearchEngine::Baidu => format!("https://www.baidu.com/s?wd={}", encoded),
            WebSearchEngine::Bing => format!("https://www.bing.com/search?q={}", encoded),
            WebSearchEngine::DuckDuckGo => {
                format!("https://html.duckduckgo.com/html/?q={}", encoded)
            }
        };
        Url::parse(&raw).map_err(|e| SieveError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    pub(crate) fn layout(&self) -> &'static ResultLayout {
        match self {
            WebSearchEngine::Google => &GOOGLE,
            WebSearchEngine::Baidu => &BAIDU,
            WebSearchEngine::Bing => &BING,
            WebSearchEngine::DuckDuckGo => &DUCKDUCKGO,
        }
    }
}

impl fmt::Display for WebSearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebSearchEngine {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WebSearchEngine::ALL
            .into_iter()
            .find(|engine| engine.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                SieveError::InvalidInput(format!(
                    "unknown search engine '{}'; expected one of google, baidu, bing, duckduckgo",
                    wanted
                ))
            })
    }
}

impl TryFrom<String> for WebSearchEngine {
    type Error = SieveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How a provider wraps outbound links on its results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redirect {
    None,
    /// `https://www.google.com/url?q=<target>`
    GoogleUrl,
    /// `//duckduckgo.com/l/?uddg=<target>`
    DuckDuckGo,
}

/// Selectors locating result entries on a sanitized results page.
///
/// Class attributes are gone by the time these run, so every rule leans on
/// ids, element structure and data attributes.
pub(crate) struct ResultLayout {
    item: Selector,
    title: Selector,
    link: Selector,
    snippet: Selector,
    /// Attribute on the item carrying the real target URL.
    url_attr: Option<&'static str>,
    redirect: Redirect,
}

impl ResultLayout {
    fn compile(
        item: &str,
        title: &str,
        link: &str,
        snippet: &str,
        url_attr: Option<&'static str>,
        redirect: Redirect,
    ) -> Self {
        let parse = |s: &str| Selector::parse(s).expect("static result selector");
        Self {
            item: parse(item),
            title: parse(title),
            link: parse(link),
            snippet: parse(snippet),
            url_attr,
            redirect,
        }
    }

    /// Result entries in page order. Entries lacking a title or a usable
    /// http(s) link are skipped; nothing is deduplicated.
    pub(crate) fn parse_results(&self, document: &Html, page_url: &Url) -> Vec<WebPage> {
        document
            .select(&self.item)
            .filter_map(|item| self.parse_item(item, page_url))
            .collect()
    }

    fn parse_item(&self, item: ElementRef<'_>, page_url: &Url) -> Option<WebPage> {
        let title = item.select(&self.title).next().map(element_text)?;
        if title.is_empty() {
            return None;
        }

        let href = self
            .url_attr
            .and_then(|attr| item.value().attr(attr))
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                item.select(&self.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
            })?;
        let url_string = resolve_link(href, page_url, self.redirect)?;

        let snippet = item
            .select(&self.snippet)
            .next()
            .map(element_text)
            .unwrap_or_default();

        Some(WebPage {
            url_string,
            title,
            snippet,
        })
    }
}

static GOOGLE: Lazy<ResultLayout> = Lazy::new(|| {
    ResultLayout::compile(
        "#rso > div",
        "h3",
        "a[href]",
        "div[data-sncf], div[data-content-feature]",
        None,
        Redirect::GoogleUrl,
    )
});

static BAIDU: Lazy<ResultLayout> = Lazy::new(|| {
    ResultLayout::compile(
        "#content_left > div[tpl]",
        "h3",
        "h3 a[href]",
        "[data-module=abstract], span[data-module], p",
        Some("mu"),
        Redirect::None,
    )
});

static BING: Lazy<ResultLayout> = Lazy::new(|| {
    ResultLayout::compile(
        "#b_results > li",
        "h2",
        "h2 a[href]",
        "p",
        None,
        Redirect::None,
    )
});

static DUCKDUCKGO: Lazy<ResultLayout> = Lazy::new(|| {
    ResultLayout::compile(
        "#links > div",
        "h2",
        "h2 a[href]",
        "h2 ~ a",
        None,
        Redirect::DuckDuckGo,
    )
});

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Absolute http(s) target of a result link, with provider redirect
/// wrappers removed.
fn resolve_link(href: &str, page_url: &Url, redirect: Redirect) -> Option<String> {
    let absolute = page_url.join(href.trim()).ok()?;
    let target = unwrap_redirect(&absolute, redirect).unwrap_or(absolute);
    match target.scheme() {
        "http" | "https" => Some(target.to_string()),
        _ => None,
    }
}

fn unwrap_redirect(link: &Url, redirect: Redirect) -> Option<Url> {
    let host = link.host_str()?;
    let param = match redirect {
        Redirect::None => return None,
        Redirect::GoogleUrl if on_domain(host, "google.com") && link.path() == "/url" => "q",
        Redirect::DuckDuckGo if on_domain(host, "duckduckgo.com") && link.path() == "/l/" => {
            "uddg"
        }
        _ => return None,
    };
    link.query_pairs()
        .find(|(key, _)| key == param)
        .and_then(|(_, value)| Url::parse(&value).ok())
}

/// `host` is `domain` itself or one of its subdomains.
fn on_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_names() {
        assert_eq!("GOOGLE".parse::<WebSearchEngine>().unwrap(), WebSearchEngine::Google);
        assert_eq!(
            " DuckDuckGo ".parse::<WebSearchEngine>().unwrap(),
            WebSearchEngine::DuckDuckGo
        );
        assert!("yahoo".parse::<WebSearchEngine>().is_err());
        assert_eq!(WebSearchEngine::default(), WebSearchEngine::Google);
        assert_eq!(
            serde_json::to_string(&WebSearchEngine::DuckDuckGo).unwrap(),
            "\"duckduckgo\""
        );
        assert_eq!(
            serde_json::from_str::<WebSearchEngine>("\"Bing\"").unwrap(),
            WebSearchEngine::Bing
        );
    }

    #[test]
    fn test_query_urls_are_encoded() {
        let url = WebSearchEngine::Google.query_url("rust & wasm").unwrap();
        assert_eq!(url.as_str(), "https://www.google.com/search?q=rust%20%26%20wasm&hl=en");

        let url = WebSearchEngine::Baidu.query_url("").unwrap();
        assert_eq!(url.as_str(), "https://www.baidu.com/s?wd=");

        let url = WebSearchEngine::DuckDuckGo.query_url("a/b?c").unwrap();
        let q: Vec<_> = url.query_pairs().collect();
        assert_eq!(q[0].1, "a/b?c");
    }

    #[test]
    fn test_redirect_unwrapping() {
        let page = Url::parse("https://html.duckduckgo.com/html/?q=x").unwrap();
        let out = resolve_link(
            "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2Flearn&rut=abc",
            &page,
            Redirect::DuckDuckGo,
        );
        assert_eq!(out.as_deref(), Some("https://www.rust-lang.org/learn"));

        let page = Url::parse("https://www.google.com/search?q=x").unwrap();
        let out = resolve_link("/url?q=https://docs.rs/&sa=U", &page, Redirect::GoogleUrl);
        assert_eq!(out.as_deref(), Some("https://docs.rs/"));

        let out = resolve_link("/search?q=more", &page, Redirect::GoogleUrl);
        assert_eq!(out.as_deref(), Some("https://www.google.com/search?q=more"));

        assert_eq!(resolve_link("javascript:void(0)", &page, Redirect::None), None);
    }

    #[test]
    fn test_lookalike_hosts_are_not_unwrapped() {
        let page = Url::parse("https://www.google.com/search?q=x").unwrap();
        let out = resolve_link(
            "https://notgoogle.com/url?q=https://docs.rs/",
            &page,
            Redirect::GoogleUrl,
        );
        assert_eq!(
            out.as_deref(),
            Some("https://notgoogle.com/url?q=https://docs.rs/")
        );

        let out = resolve_link(
            "https://google.com/url?q=https://docs.rs/",
            &page,
            Redirect::GoogleUrl,
        );
        assert_eq!(out.as_deref(), Some("https://docs.rs/"));

        let page = Url::parse("https://html.duckduckgo.com/html/?q=x").unwrap();
        let out = resolve_link(
            "https://fakeduckduckgo.com/l/?uddg=https%3A%2F%2Fexample.org%2F",
            &page,
            Redirect::DuckDuckGo,
        );
        assert_eq!(
            out.as_deref(),
            Some("https://fakeduckduckgo.com/l/?uddg=https%3A%2F%2Fexample.org%2F")
        );

        assert!(on_domain("www.google.com", "google.com"));
        assert!(!on_domain("notgoogle.com", "google.com"));
    }
}
