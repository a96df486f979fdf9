use chrono::{DateTime, Local};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const PROFILE_MARKER: &str = "/in/";
const COMPANY_MARKER: &str = "/company/";
const SEARCH_MARKER: &str = "/search/";
const SITE_SUFFIXES: [&str; 2] = [" | LinkedIn", " - LinkedIn"];
const FALLBACK_PREFIX: &str = "linkedin_data";
const MAX_SLUG_LEN: usize = 100;

static ILLEGAL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

#[derive(Debug, Error)]
enum SlugError {
    #[error("could not parse url: {0}")]
    Url(#[from] url::ParseError),
    #[error("nothing left after sanitizing")]
    Empty,
}

pub fn derive_slug(url: &str, title: &str) -> String {
    derive_slug_at(url, title, Local::now())
}

pub fn derive_slug_at(url: &str, title: &str, now: DateTime<Local>) -> String {
    match try_derive_slug(url, title) {
        Ok(slug) => slug,
        Err(e) => {
            log::warn!("Falling back to timestamped name for {}: {}", url, e);
            format!("{}_{}", FALLBACK_PREFIX, now.format(FILE_STAMP_FORMAT))
        }
    }
}

fn try_derive_slug(url: &str, title: &str) -> Result<String, SlugError> {
    // Only the first marker found picks a rule; a miss there falls to the title.
    let from_url = if url.contains(PROFILE_MARKER) {
        slug_from_profile_url(url)
    } else if url.contains(COMPANY_MARKER) {
        slug_from_company_url(url)
    } else if url.contains(SEARCH_MARKER) {
        slug_from_search_url(url, title)?
    } else {
        None
    };

    let raw = from_url.unwrap_or_else(|| strip_site_suffix(title).to_string());
    log::debug!("Slug source for {}: {}", url, raw);

    let slug = sanitize_filename(&raw);
    match slug.is_empty() {
        true => Err(SlugError::Empty),
        false => Ok(slug),
    }
}

fn slug_from_profile_url(url: &str) -> Option<String> {
    let profile_part = url.rsplit(PROFILE_MARKER).next()?;
    let profile_part = profile_part.split(['?', '/']).next()?;

    let parts: Vec<&str> = profile_part.split('-').collect();
    match parts.as_slice() {
        [first, second, rest @ ..] if rest.is_empty() => Some(format!("{}-{}", first, second)),
        [first, second, rest @ ..] => Some(format!("{}-{}-{}", first, second, rest.join("-"))),
        _ => None,
    }
}

fn slug_from_company_url(url: &str) -> Option<String> {
    let after = url.rsplit(COMPANY_MARKER).next()?;
    let path = after.split(['?', '#']).next()?;
    let mut segments = path.split('/');

    let company = segments.next().filter(|c| !c.is_empty())?;
    match segments.next() {
        Some("people") => Some(format!("{}-employees", company)),
        _ => Some(company.to_string()),
    }
}

fn slug_from_search_url(url: &str, title: &str) -> Result<Option<String>, SlugError> {
    let parsed = Url::parse(url)?;

    let keywords = parsed
        .query_pairs()
        .find(|(key, _)| key == "keywords")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty());

    if let Some(keywords) = keywords {
        return Ok(Some(format!(
            "search-{}",
            keywords.split_whitespace().join("-")
        )));
    }

    if !title.to_lowercase().contains("employees") {
        return Ok(None);
    }

    let company = strip_site_suffix(title)
        .to_lowercase()
        .replace("employees", "")
        .trim()
        .replace(" people", "")
        .trim()
        .to_string();

    Ok(Some(format!("{}-employees", company)))
}

fn strip_site_suffix(title: &str) -> &str {
    SITE_SUFFIXES
        .iter()
        .fold(title.trim_end(), |t, suffix| {
            t.strip_suffix(suffix).unwrap_or(t)
        })
}

pub fn sanitize_filename(raw: &str) -> String {
    let replaced = ILLEGAL_CHARS.replace_all(raw, "_");
    let lowered = replaced.trim().to_lowercase();
    let dashed = WHITESPACE.replace_all(&lowered, "-");
    let collapsed = DASHES.replace_all(&dashed, "-");

    collapsed.chars().take(MAX_SLUG_LEN).collect()
}
