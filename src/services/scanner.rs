use crate::domain::selector::{SelectorCandidate, RECORD_CONTAINERS};

use super::{resolve_elements, Dom, DomError};

const PROFILE_MARKER: &str = "/in/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    Container(usize),
    ProfileLinks,
    Nothing,
}

pub struct PageScan<E> {
    pub elements: Vec<E>,
    pub source: ScanSource,
}

pub struct PageScanner {
    containers: &'static [SelectorCandidate],
    site_host: String,
}

impl PageScanner {
    pub fn new(site_host: &str) -> Self {
        PageScanner {
            containers: RECORD_CONTAINERS,
            site_host: site_host.to_string(),
        }
    }

    pub fn with_containers(mut self, containers: &'static [SelectorCandidate]) -> Self {
        self.containers = containers;
        self
    }

    pub async fn scan<D: Dom>(&self, dom: &D) -> Result<PageScan<D::Element>, DomError> {
        if let Some(resolved) = resolve_elements(dom, self.containers, None).await? {
            log::info!(
                "Found {} records using selector: {}",
                resolved.value.len(),
                self.containers[resolved.index].describe()
            );
            return Ok(PageScan {
                elements: resolved.value,
                source: ScanSource::Container(resolved.index),
            });
        }

        log::warn!("No records found with container selectors, trying profile links");
        let links = self.profile_links(dom).await?;
        log::info!("Found {} profile links via fallback", links.len());

        let source = match links.is_empty() {
            true => ScanSource::Nothing,
            false => ScanSource::ProfileLinks,
        };

        Ok(PageScan {
            elements: links,
            source,
        })
    }

    async fn profile_links<D: Dom>(&self, dom: &D) -> Result<Vec<D::Element>, DomError> {
        let anchors = match dom.query("a", None).await {
            Ok(anchors) => anchors,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Could not list anchors: {}", e);
                return Ok(vec![]);
            }
        };

        let mut links = vec![];
        for anchor in anchors {
            match dom.attribute(&anchor, "href").await {
                Ok(Some(href)) if self.is_profile_link(&href) => links.push(anchor),
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::debug!("Skipping anchor: {}", e),
            }
        }

        Ok(links)
    }

    pub fn is_profile_link(&self, href: &str) -> bool {
        href.contains(PROFILE_MARKER) && href.contains(&self.site_host)
    }
}
