use std::{collections::HashSet, time::Duration};

use chrono::Local;
use rand::Rng;

use crate::{
    configuration::{ApplicationSettings, ExtractionSettings},
    domain::{listing::company_from_title, record::Record, slug::derive_slug},
};

use super::{
    ApprovalOracle, Decision, Dom, DomError, PageContext, PageScanner, PageStats, Paginator,
    RecordExtractor,
};

pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub struct ExtractionSession {
    pub source_url: String,
    pub page_title: String,
    pub slug: String,
    pub extracted_at: String,
    pub records: Vec<Record>,
    pub page_count: usize,
    pub page_sources: Vec<String>,
    pub completed_urls: HashSet<String>,
    seen: HashSet<Record>,
}

impl ExtractionSession {
    pub fn new(source_url: &str, page_title: &str, completed_urls: HashSet<String>) -> Self {
        ExtractionSession {
            source_url: source_url.to_string(),
            page_title: page_title.to_string(),
            slug: derive_slug(source_url, page_title),
            extracted_at: Local::now().format(RECORD_TIME_FORMAT).to_string(),
            records: vec![],
            page_count: 0,
            page_sources: vec![],
            completed_urls,
            seen: HashSet::new(),
        }
    }

    pub fn captured_at(mut self, extracted_at: &str) -> Self {
        self.extracted_at = extracted_at.to_string();
        self
    }

    pub fn absorb(&mut self, records: Vec<Record>) -> (usize, usize) {
        let mut added = 0;
        let mut skipped = 0;

        for record in records {
            match self.seen.insert(record.clone()) {
                true => {
                    self.records.push(record);
                    added += 1;
                }
                false => skipped += 1,
            }
        }

        (added, skipped)
    }

    pub fn is_completed(&self, url: &str) -> bool {
        self.completed_urls.contains(url)
    }

    pub fn mark_completed(&mut self) {
        self.completed_urls.insert(self.source_url.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    NoNextPage,
    Stopped,
    NavigationFailed(String),
    SessionLost(String),
}

pub struct TraversalOutcome {
    pub session: ExtractionSession,
    pub end: EndReason,
}

#[derive(Debug, Clone, Copy)]
pub struct SettleDelay {
    pub min: Duration,
    pub max: Duration,
}

impl SettleDelay {
    pub const NONE: SettleDelay = SettleDelay {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn from_millis(min: u64, max: u64) -> Self {
        SettleDelay {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub async fn wait(&self) {
        let delay = match self.max > self.min {
            true => rand::thread_rng().gen_range(self.min..=self.max),
            false => self.min,
        };

        if !delay.is_zero() {
            log::debug!("Waiting {:.1}s for the page to settle", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}

enum State<E> {
    Idle,
    Scanning,
    CheckingNext { records_this_page: usize },
    AwaitingApproval { next: E, records_this_page: usize },
    Done(EndReason),
}

pub struct Traversal {
    scanner: PageScanner,
    extractor: RecordExtractor,
    paginator: Paginator,
    scan_settle: SettleDelay,
    advance_settle: SettleDelay,
    keep_page_sources: bool,
}

impl Traversal {
    pub fn new(scanner: PageScanner, paginator: Paginator) -> Self {
        Traversal {
            scanner,
            extractor: RecordExtractor,
            paginator,
            scan_settle: SettleDelay::NONE,
            advance_settle: SettleDelay::NONE,
            keep_page_sources: false,
        }
    }

    pub fn from_settings(application: &ApplicationSettings, extraction: &ExtractionSettings) -> Self {
        Traversal {
            scanner: PageScanner::new(&application.site_host),
            extractor: RecordExtractor,
            paginator: Paginator::new(extraction.next_button_wait()),
            scan_settle: SettleDelay::from_millis(
                extraction.scan_settle_min_ms,
                extraction.scan_settle_max_ms,
            ),
            advance_settle: SettleDelay::from_millis(
                extraction.advance_settle_min_ms,
                extraction.advance_settle_max_ms,
            ),
            keep_page_sources: extraction.keep_page_sources,
        }
    }

    pub fn keep_page_sources(mut self, keep: bool) -> Self {
        self.keep_page_sources = keep;
        self
    }

    pub async fn run<D: Dom, O: ApprovalOracle>(
        &self,
        dom: &D,
        oracle: &mut O,
        mut session: ExtractionSession,
    ) -> TraversalOutcome {
        let mut state = State::Idle;

        loop {
            state = match state {
                State::Idle => {
                    log::info!("Starting extraction of {}", session.page_title);
                    session.page_count = 1;
                    State::Scanning
                }
                State::Scanning => match self.scan_page(dom, &mut session).await {
                    Ok(records_this_page) => State::CheckingNext { records_this_page },
                    Err(e) => State::Done(EndReason::SessionLost(e.to_string())),
                },
                State::CheckingNext { records_this_page } => {
                    match self.paginator.find_next(dom).await {
                        Ok(Some(next)) => State::AwaitingApproval {
                            next,
                            records_this_page,
                        },
                        Ok(None) => State::Done(EndReason::NoNextPage),
                        Err(e) => State::Done(EndReason::SessionLost(e.to_string())),
                    }
                }
                State::AwaitingApproval {
                    next,
                    records_this_page,
                } => {
                    let stats = PageStats {
                        page_number: session.page_count,
                        records_this_page,
                        total_records: session.records.len(),
                    };

                    match oracle.ask_continue(&stats).await {
                        Decision::Stop => State::Done(EndReason::Stopped),
                        Decision::Continue => self.advance(dom, &next, &mut session).await,
                    }
                }
                State::Done(end) => {
                    log::info!(
                        "Extraction finished ({:?}): {} pages, {} records",
                        end,
                        session.page_count,
                        session.records.len()
                    );
                    return TraversalOutcome { session, end };
                }
            };
        }
    }

    async fn advance<D: Dom>(
        &self,
        dom: &D,
        next: &D::Element,
        session: &mut ExtractionSession,
    ) -> State<D::Element> {
        log::info!("Moving to page {}", session.page_count + 1);

        // Page state after a failed click is unknown, so no retry.
        match self.paginator.advance(dom, next).await {
            Ok(()) => {
                self.advance_settle.wait().await;
                session.page_count += 1;
                State::Scanning
            }
            Err(e) if e.is_fatal() => State::Done(EndReason::SessionLost(e.to_string())),
            Err(e) => {
                log::error!("Error navigating to next page: {}", e);
                State::Done(EndReason::NavigationFailed(e.to_string()))
            }
        }
    }

    async fn scan_page<D: Dom>(
        &self,
        dom: &D,
        session: &mut ExtractionSession,
    ) -> Result<usize, DomError> {
        log::info!("Processing page {}", session.page_count);
        self.scan_settle.wait().await;

        let title = dom.page_title().await?;
        let company = company_from_title(&title);
        if company.is_none() {
            log::warn!("Company unknown, title does not name it: {}", title);
        }

        let scan = self.scanner.scan(dom).await?;
        let context = PageContext {
            company: company.as_deref(),
            extracted_at: &session.extracted_at,
        };
        let page = self
            .extractor
            .extract_page(dom, &scan.elements, &context)
            .await?;

        if self.keep_page_sources {
            match dom.page_source().await {
                Ok(source) => session.page_sources.push(source),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("Could not capture page source: {}", e),
            }
        }

        let records_this_page = page.records.len();
        let (added, skipped) = session.absorb(page.records);

        match records_this_page {
            0 => log::warn!("No records found on page {}", session.page_count),
            _ => log::info!(
                "Page {}: {} records, {} new, {} already seen, {} total",
                session.page_count,
                records_this_page,
                added,
                skipped,
                session.records.len()
            ),
        }

        Ok(records_this_page)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration};

    use async_trait::async_trait;

    use crate::{
        domain::record::Record,
        services::{
            testing::CountingDom, ApprovalOracle, Decision, EndReason, ExtractionSession,
            HtmlSnapshot, PageScanner, PageStats, Paginator, StartDecision, Traversal,
        },
    };

    struct ScriptedOracle {
        replies: Vec<Decision>,
        asked: Vec<PageStats>,
    }

    impl ScriptedOracle {
        fn new(replies: &[Decision]) -> Self {
            ScriptedOracle {
                replies: replies.iter().rev().copied().collect(),
                asked: vec![],
            }
        }
    }

    #[async_trait(?Send)]
    impl ApprovalOracle for ScriptedOracle {
        async fn ask_start(&mut self, _page_title: &str, _preview_slug: &str) -> StartDecision {
            StartDecision::Yes
        }

        async fn ask_continue(&mut self, stats: &PageStats) -> Decision {
            self.asked.push(*stats);
            self.replies.pop().unwrap_or(Decision::Continue)
        }
    }

    fn listing_page(first_id: usize, count: usize, has_next: bool) -> String {
        let cards: String = (first_id..first_id + count)
            .map(|id| {
                format!(
                    r#"<li class="org-people-profile-card">
                        <a href="/in/person-{id}-x{id}">
                          <div class="org-people-profile-card__profile-title">Person {id}</div>
                        </a>
                        <div class="org-people-profile-card__profile-subtitle">Engineer {id}</div>
                        <div class="org-people-profile-card__meta">City {id}</div>
                    </li>"#
                )
            })
            .collect();
        let next = match has_next {
            true => r#"<button aria-label="Next">Next</button>"#,
            false => r#"<button aria-label="Next" disabled>Next</button>"#,
        };

        format!(
            "<html><head><title>Acme employees | LinkedIn</title></head><body><ul>{}</ul>{}</body></html>",
            cards, next
        )
    }

    fn three_pages() -> HtmlSnapshot {
        let url = "https://www.linkedin.com/company/acme/people/".to_string();
        HtmlSnapshot::new(vec![
            (url.clone(), listing_page(0, 5, true)),
            (url.clone(), listing_page(5, 5, true)),
            (url, listing_page(10, 2, false)),
        ])
    }

    fn traversal() -> Traversal {
        Traversal::new(
            PageScanner::new("linkedin.com"),
            Paginator::new(Duration::ZERO),
        )
    }

    fn session() -> ExtractionSession {
        ExtractionSession::new(
            "https://www.linkedin.com/company/acme/people/",
            "Acme employees | LinkedIn",
            HashSet::new(),
        )
        .captured_at("2026-10-16 12:00:00")
    }

    #[tokio::test]
    async fn walks_every_page_when_always_approved() {
        let dom = three_pages();
        let mut oracle = ScriptedOracle::new(&[]);

        let outcome = traversal().run(&dom, &mut oracle, session()).await;

        assert_eq!(outcome.end, EndReason::NoNextPage);
        assert_eq!(outcome.session.records.len(), 12);
        assert_eq!(outcome.session.page_count, 3);
        assert_eq!(outcome.session.records[0].name, "Person 0");
        assert_eq!(outcome.session.records[11].company, "Acme");
        assert_eq!(
            oracle.asked,
            vec![
                PageStats {
                    page_number: 1,
                    records_this_page: 5,
                    total_records: 5
                },
                PageStats {
                    page_number: 2,
                    records_this_page: 5,
                    total_records: 10
                },
            ]
        );
    }

    #[tokio::test]
    async fn stop_after_first_page_keeps_its_records() {
        let dom = three_pages();
        let mut oracle = ScriptedOracle::new(&[Decision::Stop]);

        let outcome = traversal().run(&dom, &mut oracle, session()).await;

        assert_eq!(outcome.end, EndReason::Stopped);
        assert_eq!(outcome.session.records.len(), 5);
        assert_eq!(outcome.session.page_count, 1);
        assert_eq!(dom.current_page(), 0);
    }

    #[tokio::test]
    async fn repeated_page_adds_nothing_new() {
        let url = "https://www.linkedin.com/company/acme/people/".to_string();
        let dom = HtmlSnapshot::new(vec![
            (url.clone(), listing_page(0, 3, true)),
            (url, listing_page(0, 3, false)),
        ]);
        let mut oracle = ScriptedOracle::new(&[]);

        let outcome = traversal().run(&dom, &mut oracle, session()).await;

        assert_eq!(outcome.session.page_count, 2);
        assert_eq!(outcome.session.records.len(), 3);
    }

    #[tokio::test]
    async fn failed_click_ends_traversal_early() {
        // The last saved page still shows an enabled next button.
        let url = "https://www.linkedin.com/company/acme/people/".to_string();
        let dom = HtmlSnapshot::new(vec![(url, listing_page(0, 2, true))]);
        let mut oracle = ScriptedOracle::new(&[]);

        let outcome = traversal().run(&dom, &mut oracle, session()).await;

        assert!(matches!(outcome.end, EndReason::NavigationFailed(_)));
        assert_eq!(outcome.session.records.len(), 2);
        assert_eq!(outcome.session.page_count, 1);
    }

    #[tokio::test]
    async fn disabled_next_ends_without_asking_or_clicking() {
        let dom = CountingDom::new(&[(r#"button[aria-label="Next"]"#, &["Next"])])
            .disabled(r#"button[aria-label="Next"]"#);
        let mut oracle = ScriptedOracle::new(&[]);

        let outcome = traversal().run(&dom, &mut oracle, session()).await;

        assert_eq!(outcome.end, EndReason::NoNextPage);
        assert!(oracle.asked.is_empty());
        assert_eq!(dom.clicks(), 0);
    }

    #[tokio::test]
    async fn lost_session_returns_what_was_gathered() {
        let dom = CountingDom::new(&[]).losing_session();
        let mut oracle = ScriptedOracle::new(&[]);
        let mut session = session();
        session.absorb(vec![Record::new("earlier")]);

        let outcome = traversal().run(&dom, &mut oracle, session).await;

        assert!(matches!(outcome.end, EndReason::SessionLost(_)));
        assert_eq!(outcome.session.records.len(), 1);
    }

    #[tokio::test]
    async fn page_sources_are_kept_on_request() {
        let dom = three_pages();
        let mut oracle = ScriptedOracle::new(&[Decision::Continue, Decision::Stop]);

        let outcome = traversal()
            .keep_page_sources(true)
            .run(&dom, &mut oracle, session())
            .await;

        assert_eq!(outcome.session.page_sources.len(), 2);
        assert!(outcome.session.page_sources[1].contains("Person 5"));
    }

    #[test]
    fn absorb_skips_records_already_aggregated() {
        let mut session = session();
        let record = Record::new("t");

        assert_eq!(session.absorb(vec![record.clone()]), (1, 0));
        assert_eq!(session.absorb(vec![record.clone(), record]), (0, 2));
        assert_eq!(session.records.len(), 1);
    }
}
