use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet, VecDeque},
    time::Duration,
};

use async_trait::async_trait;

use super::{Dom, DomError};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub selector: String,
    pub text: String,
}

/// Selectors ending in `[` are treated as malformed.
pub struct CountingDom {
    matches: HashMap<String, Vec<FakeElement>>,
    disabled: HashSet<String>,
    script_result: Option<Vec<FakeElement>>,
    lose_session: bool,
    visits: Option<RefCell<VecDeque<String>>>,
    queried: RefCell<Vec<String>>,
    clicks: Cell<usize>,
}

impl CountingDom {
    pub fn new(matches: &[(&str, &[&str])]) -> Self {
        let matches = matches
            .iter()
            .map(|(selector, texts)| {
                let elements = texts
                    .iter()
                    .map(|text| FakeElement {
                        selector: selector.to_string(),
                        text: text.to_string(),
                    })
                    .collect();
                (selector.to_string(), elements)
            })
            .collect();

        CountingDom {
            matches,
            disabled: HashSet::new(),
            script_result: None,
            lose_session: false,
            visits: None,
            queried: RefCell::new(vec![]),
            clicks: Cell::new(0),
        }
    }

    pub fn disabled(mut self, selector: &str) -> Self {
        self.disabled.insert(selector.to_string());
        self
    }

    pub fn script_returns(mut self, texts: &[&str]) -> Self {
        self.script_result = Some(
            texts
                .iter()
                .map(|text| FakeElement {
                    selector: "<script>".to_string(),
                    text: text.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn losing_session(mut self) -> Self {
        self.lose_session = true;
        self
    }

    /// Each `current_url` call answers the next URL; afterwards the
    /// browser counts as closed.
    pub fn visiting(mut self, urls: &[&str]) -> Self {
        self.visits = Some(RefCell::new(urls.iter().map(|u| u.to_string()).collect()));
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }

    pub fn clicks(&self) -> usize {
        self.clicks.get()
    }

    fn lookup(&self, selector: &str) -> Result<Vec<FakeElement>, DomError> {
        self.queried.borrow_mut().push(selector.to_string());

        if self.lose_session {
            return Err(DomError::SessionLost("browser closed".to_string()));
        }
        if selector.ends_with('[') {
            return Err(DomError::Query(format!("invalid selector {}", selector)));
        }

        Ok(self.matches.get(selector).cloned().unwrap_or_default())
    }
}

#[async_trait(?Send)]
impl Dom for CountingDom {
    type Element = FakeElement;

    async fn query(
        &self,
        selector: &str,
        _scope: Option<&FakeElement>,
    ) -> Result<Vec<FakeElement>, DomError> {
        self.lookup(selector)
    }

    async fn query_script(
        &self,
        _script: &str,
        _scope: Option<&FakeElement>,
    ) -> Result<Vec<FakeElement>, DomError> {
        self.queried.borrow_mut().push("<script>".to_string());
        self.script_result
            .clone()
            .ok_or(DomError::ScriptUnsupported)
    }

    async fn attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        match name {
            "href" => Ok(Some(element.text.clone())),
            _ => Ok(None),
        }
    }

    async fn text(&self, element: &FakeElement) -> Result<String, DomError> {
        Ok(element.text.clone())
    }

    async fn is_disabled(&self, element: &FakeElement) -> Result<bool, DomError> {
        Ok(self.disabled.contains(&element.selector))
    }

    async fn wait_until_clickable(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<FakeElement>, DomError> {
        Ok(self.lookup(selector)?.into_iter().next())
    }

    async fn wait_until_present(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, DomError> {
        Ok(!self.lookup(selector)?.is_empty())
    }

    async fn click(&self, _element: &FakeElement) -> Result<(), DomError> {
        self.clicks.set(self.clicks.get() + 1);
        Ok(())
    }

    async fn goto(&self, _url: &str) -> Result<(), DomError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DomError> {
        match &self.visits {
            Some(visits) => visits
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| DomError::SessionLost("browser closed".to_string())),
            None => Ok("https://www.linkedin.com/company/acme/people/".to_string()),
        }
    }

    async fn page_title(&self) -> Result<String, DomError> {
        Ok("Acme employees | LinkedIn".to_string())
    }

    async fn page_source(&self) -> Result<String, DomError> {
        Ok(String::new())
    }
}
