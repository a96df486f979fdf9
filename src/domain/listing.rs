use once_cell::sync::Lazy;
use regex::Regex;

static EMPLOYEES_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(.+?)\s+employees").unwrap());

const LISTING_KEYWORDS: [&str; 3] = ["company", "people", "employees"];

pub fn is_listing_page(url: &str, site_host: &str) -> bool {
    if url.contains("/company/") && url.contains("/people/") {
        return true;
    }
    if url.contains("/search/results/people/") {
        return true;
    }

    let lowered = url.to_lowercase();
    lowered.contains(&site_host.to_lowercase())
        && LISTING_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Company name read from a title like "Acme employees | LinkedIn".
///
/// This is a page-wide guess tied to title phrasing, not to the record
/// element. Localized or reworded titles yield `None`.
pub fn company_from_title(title: &str) -> Option<String> {
    EMPLOYEES_TITLE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|company| !company.is_empty())
}
