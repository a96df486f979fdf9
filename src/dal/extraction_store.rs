use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{
    domain::{record::Record, slug::FILE_STAMP_FORMAT},
    services::RECORD_TIME_FORMAT,
};

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub extraction_date: String,
    pub source_url: String,
    pub page_title: String,
    pub slug_used: String,
    pub total_records: usize,
    pub with_name: usize,
    pub with_title: usize,
    pub with_location: usize,
}

impl ExtractionMetadata {
    pub fn summarize(
        records: &[Record],
        source_url: &str,
        page_title: &str,
        slug: &str,
        now: DateTime<Local>,
    ) -> Self {
        ExtractionMetadata {
            extraction_date: now.format(RECORD_TIME_FORMAT).to_string(),
            source_url: source_url.to_string(),
            page_title: page_title.to_string(),
            slug_used: slug.to_string(),
            total_records: records.len(),
            with_name: records.iter().filter(|r| r.has_name()).count(),
            with_title: records.iter().filter(|r| r.has_title()).count(),
            with_location: records.iter().filter(|r| r.has_location()).count(),
        }
    }
}

#[derive(Debug)]
pub struct SavedFiles {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub metadata: PathBuf,
    pub page_sources: Vec<PathBuf>,
}

pub struct ExtractionStore {
    output_dir: PathBuf,
}

impl ExtractionStore {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        ExtractionStore {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn save(
        &self,
        records: &[Record],
        source_url: &str,
        page_title: &str,
        slug: &str,
        page_sources: &[String],
        now: DateTime<Local>,
    ) -> Result<Option<SavedFiles>> {
        if records.is_empty() {
            log::warn!("No data to save for {}", source_url);
            return Ok(None);
        }

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {:?}", self.output_dir)
        })?;

        let base = format!("{}_{}", slug, now.format(FILE_STAMP_FORMAT));
        let csv = self.output_dir.join(format!("{}.csv", base));
        let json = self.output_dir.join(format!("{}.json", base));
        let metadata = self.output_dir.join(format!("{}_metadata.json", base));

        write_csv(&csv, records)?;
        write_json(&json, records)?;

        let summary = ExtractionMetadata::summarize(records, source_url, page_title, slug, now);
        write_json(&metadata, &summary)?;

        let mut sources = vec![];
        for (i, source) in page_sources.iter().enumerate() {
            let path = self.output_dir.join(format!("{}_page{}.html", base, i + 1));
            fs::write(&path, source).with_context(|| format!("Failed to write {:?}", path))?;
            sources.push(path);
        }

        log::info!(
            "Saved {} records to {:?} (names: {}, titles: {}, locations: {})",
            summary.total_records,
            self.output_dir,
            summary.with_name,
            summary.with_title,
            summary.with_location
        );

        Ok(Some(SavedFiles {
            csv,
            json,
            metadata,
            page_sources: sources,
        }))
    }
}

fn write_csv(path: &Path, records: &[Record]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {:?}", path))?;

    Ok(())
}
