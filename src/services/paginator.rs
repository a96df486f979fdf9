use std::time::Duration;

use crate::domain::selector::{Query, SelectorCandidate, NEXT_BUTTON};

use super::{Dom, DomError};

pub struct Paginator {
    candidates: &'static [SelectorCandidate],
    wait: Duration,
}

impl Paginator {
    pub fn new(wait: Duration) -> Self {
        Paginator {
            candidates: NEXT_BUTTON,
            wait,
        }
    }

    pub async fn find_next<D: Dom>(&self, dom: &D) -> Result<Option<D::Element>, DomError> {
        for candidate in self.candidates {
            let found = match candidate.query {
                Query::Css(css) => dom.wait_until_clickable(css, self.wait).await.map(Vec::from_iter),
                Query::Script(script) => dom.query_script(script, None).await,
            };

            let elements = match found {
                Ok(elements) => elements,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::debug!("Next button candidate {} failed: {}", candidate.describe(), e);
                    continue;
                }
            };

            for element in elements {
                match dom.is_disabled(&element).await {
                    Ok(false) => {
                        log::debug!("Next button found using: {}", candidate.describe());
                        return Ok(Some(element));
                    }
                    Ok(true) => log::debug!("Next button {} is disabled", candidate.describe()),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => log::debug!("Could not read next button state: {}", e),
                }
            }
        }

        Ok(None)
    }

    pub async fn advance<D: Dom>(&self, dom: &D, next: &D::Element) -> Result<(), DomError> {
        dom.click(next).await
    }
}
