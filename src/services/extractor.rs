use std::collections::HashSet;

use crate::domain::{
    record::Record,
    selector::{LOCATION_FIELD, NAME_FIELD, PROFILE_URL_FIELD, TITLE_FIELD},
};

use super::{resolve_value, Dom, DomError, Quality, ValueSource};

const PROFILE_MARKER: &str = "/in/";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldMisses {
    pub profile_url: usize,
    pub name: usize,
    pub title: usize,
    pub location: usize,
}

impl FieldMisses {
    fn count(&mut self, record: &Record) {
        self.profile_url += usize::from(!record.has_profile_url());
        self.name += usize::from(!record.has_name());
        self.title += usize::from(!record.has_title());
        self.location += usize::from(!record.has_location());
    }
}

#[derive(Debug, Default)]
pub struct PageExtraction {
    pub records: Vec<Record>,
    pub duplicates: usize,
    pub misses: FieldMisses,
}

pub struct PageContext<'a> {
    pub company: Option<&'a str>,
    pub extracted_at: &'a str,
}

pub struct RecordExtractor;

impl RecordExtractor {
    pub async fn extract_one<D: Dom>(
        &self,
        dom: &D,
        element: &D::Element,
        context: &PageContext<'_>,
    ) -> Result<Record, DomError> {
        let mut record = Record::new(context.extracted_at);

        if let Some(url) = resolve_value(
            dom,
            PROFILE_URL_FIELD,
            Some(element),
            ValueSource::Attribute("href"),
            Quality::Contains(PROFILE_MARKER),
        )
        .await?
        {
            record.profile_url = url.value;
        } else if let Some(own) = self.own_profile_link(dom, element).await? {
            record.profile_url = own;
        }

        if let Some(name) =
            resolve_value(dom, NAME_FIELD, Some(element), ValueSource::Text, Quality::Name).await?
        {
            record.name = name.value;
        }

        if let Some(title) =
            resolve_value(dom, TITLE_FIELD, Some(element), ValueSource::Text, Quality::Text)
                .await?
        {
            record.title = title.value;
        }

        if let Some(location) = resolve_value(
            dom,
            LOCATION_FIELD,
            Some(element),
            ValueSource::Text,
            Quality::Text,
        )
        .await?
        {
            record.location = location.value;
        }

        if let Some(company) = context.company {
            record.company = company.to_string();
        }

        Ok(record)
    }

    async fn own_profile_link<D: Dom>(
        &self,
        dom: &D,
        element: &D::Element,
    ) -> Result<Option<String>, DomError> {
        match dom.attribute(element, "href").await {
            Ok(href) => Ok(href
                .map(|h| h.trim().to_string())
                .filter(|h| h.contains(PROFILE_MARKER))),
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => Ok(None),
        }
    }

    pub async fn extract_page<D: Dom>(
        &self,
        dom: &D,
        elements: &[D::Element],
        context: &PageContext<'_>,
    ) -> Result<PageExtraction, DomError> {
        let mut page = PageExtraction::default();
        let mut seen = HashSet::new();

        for (i, element) in elements.iter().enumerate() {
            let record = self.extract_one(dom, element, context).await?;

            if !seen.insert(record.clone()) {
                page.duplicates += 1;
                log::debug!("Skipping duplicate record {}: {}", i + 1, record.name);
                continue;
            }

            log::info!("  {}. {} - {}", i + 1, record.name, record.title);
            page.misses.count(&record);
            page.records.push(record);
        }

        log::info!(
            "Extracted {} records ({} duplicates skipped, missing: {} urls, {} names, {} titles, {} locations)",
            page.records.len(),
            page.duplicates,
            page.misses.profile_url,
            page.misses.name,
            page.misses.title,
            page.misses.location,
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::record::NOT_FOUND,
        services::{
            extractor::{PageContext, RecordExtractor},
            Dom, HtmlSnapshot,
        },
    };

    const AT: &str = "2026-10-16 12:00:00";

    fn snapshot(body: &str) -> HtmlSnapshot {
        HtmlSnapshot::new(vec![(
            "https://www.linkedin.com/company/acme/people/".to_string(),
            format!("<html><body>{}</body></html>", body),
        )])
    }

    const CARD: &str = r#"
        <li class="org-people-profile-card">
            <a href="/in/ada-lovelace-1815"><span class="badge">3</span></a>
            <div class="org-people-profile-card__profile-title"> Ada Lovelace </div>
            <div class="org-people-profile-card__profile-subtitle">Analyst</div>
            <div class="org-people-profile-card__meta">London</div>
        </li>"#;

    #[tokio::test]
    async fn extracts_every_field() {
        let dom = snapshot(CARD);
        let card = dom.query(".org-people-profile-card", None).await.unwrap();
        let context = PageContext {
            company: Some("Acme"),
            extracted_at: AT,
        };

        let record = RecordExtractor
            .extract_one(&dom, &card[0], &context)
            .await
            .unwrap();

        assert_eq!(record.profile_url, "https://www.linkedin.com/in/ada-lovelace-1815");
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.title, "Analyst");
        assert_eq!(record.location, "London");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.extracted_at, AT);
    }

    #[tokio::test]
    async fn unresolved_fields_keep_the_sentinel() {
        let dom = snapshot(r#"<div class="profile-card"><h3>7</h3></div>"#);
        let card = dom.query(".profile-card", None).await.unwrap();
        let context = PageContext {
            company: None,
            extracted_at: AT,
        };

        let record = RecordExtractor
            .extract_one(&dom, &card[0], &context)
            .await
            .unwrap();

        assert_eq!(record.name, NOT_FOUND);
        assert_eq!(record.title, NOT_FOUND);
        assert_eq!(record.location, NOT_FOUND);
        assert_eq!(record.profile_url, NOT_FOUND);
        assert_eq!(record.company, NOT_FOUND);
    }

    #[tokio::test]
    async fn anchor_element_uses_its_own_link() {
        let dom = snapshot(r#"<a href="/in/grace-hopper-1906"><span aria-hidden="true">Grace Hopper</span></a>"#);
        let anchor = dom.query("a", None).await.unwrap();
        let context = PageContext {
            company: None,
            extracted_at: AT,
        };

        let record = RecordExtractor
            .extract_one(&dom, &anchor[0], &context)
            .await
            .unwrap();

        assert_eq!(record.profile_url, "https://www.linkedin.com/in/grace-hopper-1906");
        assert_eq!(record.name, "Grace Hopper");
    }

    #[tokio::test]
    async fn same_element_twice_is_kept_once() {
        let dom = snapshot(CARD);
        let card = dom.query(".org-people-profile-card", None).await.unwrap();
        let context = PageContext {
            company: Some("Acme"),
            extracted_at: AT,
        };

        let first = RecordExtractor
            .extract_one(&dom, &card[0], &context)
            .await
            .unwrap();
        let second = RecordExtractor
            .extract_one(&dom, &card[0], &context)
            .await
            .unwrap();
        assert_eq!(first, second);

        let twice = vec![card[0], card[0]];
        let page = RecordExtractor
            .extract_page(&dom, &twice, &context)
            .await
            .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.duplicates, 1);
    }
}
