use std::collections::HashSet;

use chrono::Local;

use crate::{
    configuration::ApplicationSettings,
    dal::extraction_store::ExtractionStore,
    domain::listing::is_listing_page,
};

use super::{
    ApprovalOracle, Dom, DomError, EndReason, ExtractionSession, StartDecision, Traversal,
    TraversalOutcome,
};

pub struct Monitor {
    settings: ApplicationSettings,
    traversal: Traversal,
    store: ExtractionStore,
}

impl Monitor {
    pub fn new(settings: ApplicationSettings, traversal: Traversal, store: ExtractionStore) -> Self {
        Monitor {
            settings,
            traversal,
            store,
        }
    }

    pub async fn run<D: Dom, O: ApprovalOracle>(
        &self,
        dom: &D,
        oracle: &mut O,
    ) -> Result<usize, DomError> {
        log::info!("Opening {}", self.settings.start_url);
        dom.goto(&self.settings.start_url).await?;

        log::info!("Please log in manually in the browser...");
        if !dom
            .wait_until_present(&self.settings.login_marker, self.settings.login_timeout())
            .await?
        {
            log::error!(
                "Login not detected within {}s",
                self.settings.login_timeout_secs
            );
            return Ok(0);
        }
        log::info!("Login detected. Navigate to a company's people page or a people search.");

        let mut last_url = String::new();
        let mut completed = HashSet::new();

        loop {
            let current_url = match dom.current_url().await {
                Ok(url) => url,
                Err(e) => {
                    log::info!("Browser closed, stopping monitor: {}", e);
                    break;
                }
            };

            if current_url != last_url
                && !completed.contains(&current_url)
                && is_listing_page(&current_url, &self.settings.site_host)
            {
                let title = match dom.page_title().await {
                    Ok(title) if !title.trim().is_empty() => title,
                    Ok(_) => "linkedin_data".to_string(),
                    Err(e) => {
                        log::info!("Browser closed, stopping monitor: {}", e);
                        break;
                    }
                };

                let session = ExtractionSession::new(&current_url, &title, completed);
                match oracle.ask_start(&title, &session.slug).await {
                    StartDecision::No => {
                        log::info!("Extraction skipped for {}", current_url);
                        completed = session.completed_urls;
                    }
                    StartDecision::Yes => {
                        let outcome = self.extract(dom, oracle, session).await;
                        completed = outcome.session.completed_urls;

                        if let EndReason::SessionLost(e) = outcome.end {
                            log::error!("Page context lost during extraction: {}", e);
                            break;
                        }
                    }
                }
            }

            last_url = current_url;
            tokio::time::sleep(self.settings.poll_interval()).await;
        }

        Ok(completed.len())
    }

    pub async fn extract<D: Dom, O: ApprovalOracle>(
        &self,
        dom: &D,
        oracle: &mut O,
        session: ExtractionSession,
    ) -> TraversalOutcome {
        let mut outcome = self.traversal.run(dom, oracle, session).await;
        let session = &mut outcome.session;

        match self.store.save(
            &session.records,
            &session.source_url,
            &session.page_title,
            &session.slug,
            &session.page_sources,
            Local::now(),
        ) {
            Ok(Some(saved)) => {
                log::info!(
                    "{} records extracted and saved to {:?}",
                    session.records.len(),
                    saved.csv
                );
                session.mark_completed();
            }
            Ok(None) => log::warn!("No data extracted from {}", session.source_url),
            Err(e) => log::error!("Failed to save extraction: {:?}", e),
        }

        outcome
    }
}
