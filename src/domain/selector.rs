#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Css(&'static str),
    /// Script returning an element, an array of elements or null.
    /// The scoped element (if any) is passed as `arguments[0]`.
    Script(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorCandidate {
    pub scope: Scope,
    pub query: Query,
}

impl SelectorCandidate {
    pub const fn document(css: &'static str) -> Self {
        SelectorCandidate {
            scope: Scope::Document,
            query: Query::Css(css),
        }
    }

    pub const fn element(css: &'static str) -> Self {
        SelectorCandidate {
            scope: Scope::Element,
            query: Query::Css(css),
        }
    }

    pub const fn document_script(script: &'static str) -> Self {
        SelectorCandidate {
            scope: Scope::Document,
            query: Query::Script(script),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self.query {
            Query::Css(css) => css,
            Query::Script(_) => "<script>",
        }
    }
}

pub const RECORD_CONTAINERS: &[SelectorCandidate] = &[
    // Company people page
    SelectorCandidate::document(".org-people-profile-card"),
    SelectorCandidate::document(".org-people-profile-card__profile-info"),
    // Search results
    SelectorCandidate::document(".entity-result"),
    SelectorCandidate::document(".entity-result__item"),
    SelectorCandidate::document(".search-result__result-link"),
    SelectorCandidate::document(".app-aware-link"),
    SelectorCandidate::document(".profile-card"),
    // List view
    SelectorCandidate::document(".reusable-search__result-container"),
    SelectorCandidate::document(".search-results-container .entity-result"),
];

pub const PROFILE_URL_FIELD: &[SelectorCandidate] = &[
    SelectorCandidate::element(r#"a[href*="/in/"]"#),
    SelectorCandidate::element("a"),
    SelectorCandidate::element(r#"[href*="/in/"]"#),
];

pub const NAME_FIELD: &[SelectorCandidate] = &[
    SelectorCandidate::element("div.lt-line-clamp.lt-line-clamp--single-line"),
    SelectorCandidate::element(".org-people-profile-card__profile-title"),
    SelectorCandidate::element(r#".entity-result__title-text a span[aria-hidden="true"]"#),
    SelectorCandidate::element(".entity-result__title-text"),
    SelectorCandidate::element(r#"h3 a span[aria-hidden="true"]"#),
    SelectorCandidate::element(r#"h3 span[aria-hidden="true"]"#),
    SelectorCandidate::element(".profile-card__title"),
    SelectorCandidate::element(".name"),
    SelectorCandidate::element("h3"),
    SelectorCandidate::element(".t-16.t-black.t-bold"),
    SelectorCandidate::element(r#".search-result__result-link span[aria-hidden="true"]"#),
    SelectorCandidate::element(r#"span[aria-hidden="true"]"#),
];

pub const TITLE_FIELD: &[SelectorCandidate] = &[
    SelectorCandidate::element(".org-people-profile-card__profile-subtitle"),
    SelectorCandidate::element(".entity-result__primary-subtitle"),
    SelectorCandidate::element(".entity-result__subtitle"),
    SelectorCandidate::element(".profile-card__subtitle"),
    SelectorCandidate::element(".title"),
    SelectorCandidate::element(".t-14.t-black--light.t-normal"),
    SelectorCandidate::element(".entity-result__summary"),
];

pub const LOCATION_FIELD: &[SelectorCandidate] = &[
    SelectorCandidate::element(".entity-result__secondary-subtitle"),
    SelectorCandidate::element(".org-people-profile-card__meta"),
    SelectorCandidate::element(".profile-card__meta"),
    SelectorCandidate::element(".location"),
    SelectorCandidate::element(".t-12.t-black--light.t-normal"),
];

const NEXT_BUTTON_SCRIPT: &str = r#"
    var buttons = document.querySelectorAll('button');
    for (var i = 0; i < buttons.length; i++) {
        var btn = buttons[i];
        if (btn.textContent.includes('Next') || btn.getAttribute('aria-label') === 'Next') {
            if (!btn.disabled) {
                return btn;
            }
        }
    }
    return null;
"#;

pub const NEXT_BUTTON: &[SelectorCandidate] = &[
    SelectorCandidate::document(r#"button[aria-label="Next"]"#),
    SelectorCandidate::document(r#"button[aria-label="View next profiles"]"#),
    SelectorCandidate::document(".artdeco-pagination__button--next:not([disabled])"),
    SelectorCandidate::document(
        ".org-people-employees-search-results__pagination button:last-child:not([disabled])",
    ),
    SelectorCandidate::document(r#"[data-test-pagination-page-btn="next"]"#),
    SelectorCandidate::document_script(NEXT_BUTTON_SCRIPT),
];

#[cfg(test)]
mod tests {
    use crate::domain::selector::{
        Query, Scope, LOCATION_FIELD, NAME_FIELD, NEXT_BUTTON, PROFILE_URL_FIELD,
        RECORD_CONTAINERS, TITLE_FIELD,
    };

    #[test]
    fn field_tables_are_element_scoped() {
        for table in [PROFILE_URL_FIELD, NAME_FIELD, TITLE_FIELD, LOCATION_FIELD] {
            assert!(table.iter().all(|c| c.scope == Scope::Element));
        }
        assert!(RECORD_CONTAINERS.iter().all(|c| c.scope == Scope::Document));
    }

    #[test]
    fn next_button_script_is_the_last_resort() {
        let (last, rest) = NEXT_BUTTON.split_last().unwrap();

        assert!(matches!(last.query, Query::Script(_)));
        assert!(rest.iter().all(|c| matches!(c.query, Query::Css(_))));
    }
}
