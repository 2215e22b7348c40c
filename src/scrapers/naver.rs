//! Naver News section-page headline parser.
//!
//! Section pages (`https://news.naver.com/section/{id}`) list headlines as
//! `li.sa_item` cards whose title link is `a.sa_text_title` wrapping a
//! `strong.sa_text_strong`. Older layouts used `hdline_article`/`cluster`
//! markup, so those selectors are kept as fallbacks and tried in order until
//! enough candidates are found.

use crate::category::{Category, NAVER_NEWS_BASE_URL};
use crate::error::{NewsError, Result};
use crate::models::Article;
use chrono::{DateTime, Local};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// Candidate selectors, current layout first.
const HEADLINE_SELECTORS: [&str; 9] = [
    "a.sa_text_title",
    "li.sa_item",
    ".sa_text_title",
    ".sa_thumb_link",
    ".hdline_article_tit",
    ".cluster_text_headline a",
    ".list_body .item",
    ".hdline_article",
    ".news_area .news_tit a",
];

/// Titles shorter than this are navigation crumbs, not headlines.
const MIN_TITLE_CHARS: usize = 5;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

static CANDIDATES: Lazy<Vec<(&'static str, Selector)>> =
    Lazy::new(|| HEADLINE_SELECTORS.iter().map(|css| (*css, selector(css))).collect());
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector("a.sa_text_title"));
static TITLE_STRONG: Lazy<Selector> = Lazy::new(|| selector("strong.sa_text_strong"));
static ANY_LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static LEDE: Lazy<Selector> = Lazy::new(|| selector(".sa_text_lede"));
static LEGACY_LEDE: Lazy<Selector> = Lazy::new(|| selector(".summary, .lead, .desc"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse(NAVER_NEWS_BASE_URL).expect("static url"));

/// Collapse runs of whitespace and trim.
pub fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined = parts.collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(joined.trim(), " ").into_owned()
}

/// Resolve an href against the portal base URL.
///
/// Returns `None` unless the result is an absolute URL on `news.naver.com`.
pub fn normalize_url(href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let url = BASE_URL.join(href).ok()?;
    let host = url.host_str()?;
    if host == "news.naver.com" || host.ends_with(".news.naver.com") {
        Some(url)
    } else {
        None
    }
}

/// Parse a section page into at most `max_articles` headline articles.
///
/// Articles are deduplicated by URL and keep document order. A page with no
/// matching entries yields an empty list; a body with no markup at all is a
/// [`NewsError::Parse`].
#[instrument(level = "debug", skip(html, collected_at), fields(bytes = html.len()))]
pub fn parse_headlines(
    html: &str,
    category: Category,
    max_articles: usize,
    collected_at: DateTime<Local>,
) -> Result<Vec<Article>> {
    if html.trim().is_empty() || !html.contains('<') {
        return Err(NewsError::Parse(format!(
            "response for {} is not an HTML document",
            category
        )));
    }

    let document = Html::parse_document(html);
    let mut found: Vec<ElementRef> = Vec::new();
    for (css, sel) in CANDIDATES.iter() {
        let before = found.len();
        found.extend(document.select(sel));
        let matched = found.len() - before;
        if matched > 0 {
            debug!(%category, selector = css, matched, "Selector matched");
        }
        if found.len() >= max_articles.saturating_mul(2) {
            break;
        }
    }

    let articles: Vec<Article> = found
        .into_iter()
        .filter_map(|element| parse_element(element, category, collected_at))
        .unique_by(|article| article.url.clone())
        .take(max_articles)
        .collect();

    info!(%category, count = articles.len(), "Parsed headlines");
    Ok(articles)
}

fn parse_element(
    element: ElementRef,
    category: Category,
    collected_at: DateTime<Local>,
) -> Option<Article> {
    let anchor = if element.value().name() == "a" {
        element
    } else {
        element
            .select(&TITLE_LINK)
            .next()
            .or_else(|| element.select(&ANY_LINK).next())?
    };

    let title = match anchor.select(&TITLE_STRONG).next() {
        Some(strong) => clean_text(strong.text()),
        None => clean_text(anchor.text()),
    };
    if title.chars().count() < MIN_TITLE_CHARS {
        debug!(%title, "Skipping short title");
        return None;
    }

    let url = normalize_url(anchor.value().attr("href")?)?;

    let summary = card_scopes(element)
        .into_iter()
        .find_map(|scope| {
            scope
                .select(&LEDE)
                .next()
                .or_else(|| scope.select(&LEGACY_LEDE).next())
        })
        .map(|lede| clean_text(lede.text()))
        .filter(|text| !text.is_empty());

    Some(Article {
        title,
        url: url.to_string(),
        category,
        summary,
        collected_at,
    })
}

/// The element plus the ancestors that still belong to the same headline card.
fn card_scopes(element: ElementRef) -> Vec<ElementRef> {
    let mut scopes = vec![element];
    if element.value().name() != "li" {
        for ancestor in element.ancestors().filter_map(ElementRef::wrap).take(2) {
            scopes.push(ancestor);
            if ancestor.value().name() == "li" {
                break;
            }
        }
    }
    scopes
}
