use crate::domain::selector::{Query, Scope, SelectorCandidate};

use super::{Dom, DomError};

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub index: usize,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Text,
    Attribute(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Text,
    Name,
    Contains(&'static str),
}

impl Quality {
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Quality::Text => value.chars().count() > 1,
            Quality::Name => {
                value.chars().count() > 1 && !value.chars().all(|c| c.is_ascii_digit())
            }
            Quality::Contains(fragment) => value.contains(fragment),
        }
    }
}

async fn run_candidate<D: Dom>(
    dom: &D,
    candidate: &SelectorCandidate,
    scope: Option<&D::Element>,
) -> Result<Vec<D::Element>, DomError> {
    let scope = match candidate.scope {
        Scope::Document => None,
        Scope::Element => scope,
    };

    match candidate.query {
        Query::Css(css) => dom.query(css, scope).await,
        Query::Script(script) => dom.query_script(script, scope).await,
    }
}

fn tolerate(candidate: &SelectorCandidate, error: DomError) -> Result<(), DomError> {
    match error.is_fatal() {
        true => Err(error),
        false => {
            log::debug!("Candidate {} failed: {}", candidate.describe(), error);
            Ok(())
        }
    }
}

pub async fn resolve_elements<D: Dom>(
    dom: &D,
    candidates: &[SelectorCandidate],
    scope: Option<&D::Element>,
) -> Result<Option<Resolved<Vec<D::Element>>>, DomError> {
    for (index, candidate) in candidates.iter().enumerate() {
        match run_candidate(dom, candidate, scope).await {
            Ok(elements) if !elements.is_empty() => {
                log::debug!(
                    "Found {} elements using selector: {}",
                    elements.len(),
                    candidate.describe()
                );
                return Ok(Some(Resolved {
                    index,
                    value: elements,
                }));
            }
            Ok(_) => {}
            Err(e) => tolerate(candidate, e)?,
        }
    }

    Ok(None)
}

pub async fn resolve_value<D: Dom>(
    dom: &D,
    candidates: &[SelectorCandidate],
    scope: Option<&D::Element>,
    source: ValueSource,
    quality: Quality,
) -> Result<Option<Resolved<String>>, DomError> {
    for (index, candidate) in candidates.iter().enumerate() {
        let first = match run_candidate(dom, candidate, scope).await {
            Ok(elements) => elements.into_iter().next(),
            Err(e) => {
                tolerate(candidate, e)?;
                continue;
            }
        };
        let Some(element) = first else {
            continue;
        };

        let value = match source {
            ValueSource::Text => dom.text(&element).await.map(Some),
            ValueSource::Attribute(name) => dom.attribute(&element, name).await,
        };

        match value {
            Ok(Some(value)) if quality.accepts(&value) => {
                return Ok(Some(Resolved {
                    index,
                    value: value.trim().to_string(),
                }));
            }
            Ok(_) => {}
            Err(e) => tolerate(candidate, e)?,
        }
    }

    Ok(None)
}
