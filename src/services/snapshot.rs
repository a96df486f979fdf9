use std::{cell::Cell, fs, path::Path, time::Duration};

use async_trait::async_trait;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{Dom, DomError};

struct SnapshotPage {
    url: String,
    html: Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotElement {
    page: usize,
    position: usize,
}

pub struct HtmlSnapshot {
    pages: Vec<SnapshotPage>,
    current: Cell<usize>,
}

impl HtmlSnapshot {
    pub fn new(pages: Vec<(String, String)>) -> Self {
        let pages = pages
            .into_iter()
            .map(|(url, source)| SnapshotPage {
                url,
                html: Html::parse_document(&source),
            })
            .collect();

        HtmlSnapshot {
            pages,
            current: Cell::new(0),
        }
    }

    pub fn from_files<P: AsRef<Path>>(source_url: &str, files: &[P]) -> std::io::Result<Self> {
        let mut pages = vec![];
        for file in files {
            pages.push((source_url.to_string(), fs::read_to_string(file)?));
        }

        Ok(HtmlSnapshot::new(pages))
    }

    pub fn current_page(&self) -> usize {
        self.current.get()
    }

    fn page(&self) -> Result<&SnapshotPage, DomError> {
        self.pages
            .get(self.current.get())
            .ok_or_else(|| DomError::SessionLost("no saved page loaded".to_string()))
    }

    fn elements(html: &Html) -> impl Iterator<Item = ElementRef<'_>> {
        html.root_element().descendants().filter_map(ElementRef::wrap)
    }

    fn resolve<'a>(
        &'a self,
        handle: &SnapshotElement,
    ) -> Result<(&'a SnapshotPage, ElementRef<'a>), DomError> {
        if handle.page != self.current.get() {
            return Err(DomError::Query("stale element from another page".to_string()));
        }

        let page = self.page()?;
        let element = Self::elements(&page.html)
            .nth(handle.position)
            .ok_or_else(|| DomError::Query("element no longer exists".to_string()))?;

        Ok((page, element))
    }

    fn parse_selector(selector: &str) -> Result<Selector, DomError> {
        Selector::parse(selector)
            .map_err(|e| DomError::Query(format!("invalid selector {}: {:?}", selector, e)))
    }

    // One pass in document order. A scope's descendants are the elements
    // right after it, up to its descendant count.
    fn select(
        &self,
        selector: &str,
        scope: Option<&SnapshotElement>,
    ) -> Result<Vec<SnapshotElement>, DomError> {
        let selector = Self::parse_selector(selector)?;
        let page_index = self.current.get();
        let page = self.page()?;

        let (root, range) = match scope {
            Some(handle) => {
                let (_, root) = self.resolve(handle)?;
                let descendants = Self::elements_below(root);
                (Some(root), handle.position + 1..handle.position + 1 + descendants)
            }
            None => (None, 0..usize::MAX),
        };

        Ok(Self::elements(&page.html)
            .enumerate()
            .skip(range.start)
            .take_while(|(position, _)| range.contains(position))
            .filter(|(_, element)| selector.matches_with_scope(element, root))
            .map(|(position, _)| SnapshotElement {
                page: page_index,
                position,
            })
            .collect())
    }

    fn elements_below(root: ElementRef<'_>) -> usize {
        root.descendants().filter_map(ElementRef::wrap).count() - 1
    }
}

#[async_trait(?Send)]
impl Dom for HtmlSnapshot {
    type Element = SnapshotElement;

    async fn query(
        &self,
        selector: &str,
        scope: Option<&SnapshotElement>,
    ) -> Result<Vec<SnapshotElement>, DomError> {
        self.select(selector, scope)
    }

    async fn query_script(
        &self,
        _script: &str,
        _scope: Option<&SnapshotElement>,
    ) -> Result<Vec<SnapshotElement>, DomError> {
        Err(DomError::ScriptUnsupported)
    }

    async fn attribute(
        &self,
        element: &SnapshotElement,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        let (page, element) = self.resolve(element)?;
        let Some(value) = element.value().attr(name) else {
            return Ok(None);
        };

        match name {
            "href" => Ok(Some(
                Url::parse(&page.url)
                    .and_then(|base| base.join(value))
                    .map(|url| url.to_string())
                    .unwrap_or_else(|_| value.to_string()),
            )),
            _ => Ok(Some(value.to_string())),
        }
    }

    async fn text(&self, element: &SnapshotElement) -> Result<String, DomError> {
        let (_, element) = self.resolve(element)?;

        Ok(element.text().flat_map(str::split_whitespace).join(" "))
    }

    async fn is_disabled(&self, element: &SnapshotElement) -> Result<bool, DomError> {
        let (_, element) = self.resolve(element)?;
        let value = element.value();

        Ok(value.attr("disabled").is_some() || value.attr("aria-disabled") == Some("true"))
    }

    async fn wait_until_clickable(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<SnapshotElement>, DomError> {
        for element in self.select(selector, None)? {
            if !self.is_disabled(&element).await? {
                return Ok(Some(element));
            }
        }

        Ok(None)
    }

    async fn wait_until_present(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, DomError> {
        Ok(!self.select(selector, None)?.is_empty())
    }

    async fn click(&self, element: &SnapshotElement) -> Result<(), DomError> {
        self.resolve(element)?;

        let next = self.current.get() + 1;
        match next < self.pages.len() {
            true => {
                self.current.set(next);
                Ok(())
            }
            false => Err(DomError::Interaction(
                "no saved page after the current one".to_string(),
            )),
        }
    }

    async fn goto(&self, url: &str) -> Result<(), DomError> {
        match self.pages.iter().position(|p| p.url == url) {
            Some(index) => {
                self.current.set(index);
                Ok(())
            }
            None => Err(DomError::Query(format!("no saved page for {}", url))),
        }
    }

    async fn current_url(&self) -> Result<String, DomError> {
        Ok(self.page()?.url.clone())
    }

    async fn page_title(&self) -> Result<String, DomError> {
        let page = self.page()?;
        let selector = Self::parse_selector("title")?;

        Ok(page
            .html
            .select(&selector)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
            .unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String, DomError> {
        Ok(self.page()?.html.html())
    }
}
