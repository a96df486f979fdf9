use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("query failed: {0}")]
    Query(String),
    #[error("element interaction failed: {0}")]
    Interaction(String),
    #[error("scripts are not supported by this page backend")]
    ScriptUnsupported,
    #[error("page context lost: {0}")]
    SessionLost(String),
}

impl DomError {
    /// Only a lost page context ends a run. Everything else is a miss for
    /// the candidate that hit it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomError::SessionLost(_))
    }
}

#[async_trait(?Send)]
pub trait Dom {
    type Element: Clone;

    async fn query(
        &self,
        selector: &str,
        scope: Option<&Self::Element>,
    ) -> Result<Vec<Self::Element>, DomError>;

    /// Runs `script` with the scoped element as `arguments[0]` and collects
    /// the element(s) it returns. `null` yields an empty list.
    async fn query_script(
        &self,
        script: &str,
        scope: Option<&Self::Element>,
    ) -> Result<Vec<Self::Element>, DomError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, DomError>;

    async fn text(&self, element: &Self::Element) -> Result<String, DomError>;

    async fn is_disabled(&self, element: &Self::Element) -> Result<bool, DomError>;

    async fn wait_until_clickable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Self::Element>, DomError>;

    async fn wait_until_present(&self, selector: &str, timeout: Duration)
        -> Result<bool, DomError>;

    /// Synthetic activation; works even when the element is covered.
    async fn click(&self, element: &Self::Element) -> Result<(), DomError>;

    async fn goto(&self, url: &str) -> Result<(), DomError>;

    async fn current_url(&self) -> Result<String, DomError>;

    async fn page_title(&self) -> Result<String, DomError>;

    async fn page_source(&self) -> Result<String, DomError>;
}
