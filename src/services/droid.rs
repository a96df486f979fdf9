use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::{error::WebDriverError, prelude::*, ChromiumLikeCapabilities};

use crate::configuration::WebDriverSettings;

use super::{Dom, DomError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct Droid {
    pub driver: WebDriver,
}

// W3C error codes and transport failures meaning the window or the whole
// session is gone. Matched on both the variant name and the message.
const SESSION_GONE: [&str; 10] = [
    "no such window",
    "nosuchwindow",
    "web view not found",
    "invalid session id",
    "invalidsessionid",
    "session not created",
    "sessionnotcreated",
    "connection refused",
    "error sending request",
    "disconnected",
];

fn is_session_gone(description: &str) -> bool {
    let description = description.to_lowercase();
    SESSION_GONE.iter().any(|marker| description.contains(marker))
}

impl From<WebDriverError> for DomError {
    fn from(e: WebDriverError) -> Self {
        match is_session_gone(&format!("{:?} {}", e, e)) {
            true => DomError::SessionLost(e.to_string()),
            false => DomError::Query(e.to_string()),
        }
    }
}

fn interaction_error(e: WebDriverError) -> DomError {
    match DomError::from(e) {
        DomError::Query(message) => DomError::Interaction(message),
        other => other,
    }
}

impl Droid {
    pub async fn new(settings: &WebDriverSettings) -> Result<Self, WebDriverError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in settings.chrome_args.iter() {
            caps.add_arg(arg)?;
        }

        let driver = WebDriver::new(settings.server_url.as_str(), caps).await?;
        if settings.maximize_window {
            driver.maximize_window().await?;
        }

        Ok(Droid { driver })
    }

    pub async fn quit(self) -> Result<(), WebDriverError> {
        self.driver.quit().await
    }
}

#[async_trait(?Send)]
impl Dom for Droid {
    type Element = WebElement;

    async fn query(
        &self,
        selector: &str,
        scope: Option<&WebElement>,
    ) -> Result<Vec<WebElement>, DomError> {
        let elements = match scope {
            Some(element) => element.find_all(By::Css(selector)).await?,
            None => self.driver.find_all(By::Css(selector)).await?,
        };

        Ok(elements)
    }

    async fn query_script(
        &self,
        script: &str,
        scope: Option<&WebElement>,
    ) -> Result<Vec<WebElement>, DomError> {
        let args = match scope {
            Some(element) => vec![element.to_json()?],
            None => vec![],
        };

        let ret = self.driver.execute(script, args).await?;
        let (is_null, is_array) = (ret.json().is_null(), ret.json().is_array());

        match (is_null, is_array) {
            (true, _) => Ok(vec![]),
            (false, true) => Ok(ret.elements()?),
            (false, false) => Ok(vec![ret.element()?]),
        }
    }

    async fn attribute(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        // Property first so links come back absolute.
        match element.prop(name).await? {
            Some(value) => Ok(Some(value)),
            None => Ok(element.attr(name).await?),
        }
    }

    async fn text(&self, element: &WebElement) -> Result<String, DomError> {
        Ok(element.text().await?)
    }

    async fn is_disabled(&self, element: &WebElement) -> Result<bool, DomError> {
        Ok(!element.is_enabled().await?)
    }

    async fn wait_until_clickable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<WebElement>, DomError> {
        match self
            .driver
            .query(By::Css(selector))
            .wait(timeout, POLL_INTERVAL)
            .and_clickable()
            .first()
            .await
        {
            Ok(element) => Ok(Some(element)),
            Err(e) => match DomError::from(e) {
                e if e.is_fatal() => Err(e),
                e => {
                    log::debug!("Nothing clickable for {}: {}", selector, e);
                    Ok(None)
                }
            },
        }
    }

    async fn wait_until_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, DomError> {
        match self
            .driver
            .query(By::Css(selector))
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match DomError::from(e) {
                e if e.is_fatal() => Err(e),
                _ => Ok(false),
            },
        }
    }

    async fn click(&self, element: &WebElement) -> Result<(), DomError> {
        let args = vec![element.to_json()?];

        self.driver
            .execute("arguments[0].click();", args)
            .await
            .map_err(interaction_error)?;

        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DomError> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| DomError::SessionLost(e.to_string()))
    }

    async fn current_url(&self) -> Result<String, DomError> {
        self.driver
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| DomError::SessionLost(e.to_string()))
    }

    async fn page_title(&self) -> Result<String, DomError> {
        self.driver
            .title()
            .await
            .map_err(|e| DomError::SessionLost(e.to_string()))
    }

    async fn page_source(&self) -> Result<String, DomError> {
        Ok(self.driver.source().await?)
    }
}
