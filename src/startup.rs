use std::collections::HashSet;

use anyhow::Context;

use crate::{
    configuration::{ReplaySettings, Settings, WebDriverSettings},
    dal::extraction_store::ExtractionStore,
    services::{
        ApprovalOracle, Dom, Droid, ExtractionSession, HtmlSnapshot, Monitor, StartDecision,
        TerminalOracle, Traversal,
    },
};

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let traversal = Traversal::from_settings(&settings.application, &settings.extraction);
    let store = ExtractionStore::new(&settings.extraction.output_dir);
    let monitor = Monitor::new(settings.application.clone(), traversal, store);
    let mut oracle = TerminalOracle::default();

    match settings.replay {
        Some(replay) => replay_saved_pages(&monitor, &replay, &mut oracle).await,
        None => watch_browser(&monitor, &settings.webdriver, &mut oracle).await,
    }
}

async fn watch_browser<O: ApprovalOracle>(
    monitor: &Monitor,
    webdriver: &WebDriverSettings,
    oracle: &mut O,
) -> anyhow::Result<()> {
    let droid = Droid::new(webdriver)
        .await
        .with_context(|| format!("Failed to open a browser via {}", webdriver.server_url))?;

    tokio::select! {
        result = monitor.run(&droid, oracle) => match result {
            Ok(extracted) => log::info!("Monitor finished, {} listings extracted", extracted),
            Err(e) => log::error!("Monitor stopped: {}", e),
        },
        _ = tokio::signal::ctrl_c() => log::info!("Interrupted, closing the browser"),
    }

    if let Err(e) = droid.quit().await {
        log::error!("Failed to close the browser: {:?}", e);
    }

    Ok(())
}

async fn replay_saved_pages<O: ApprovalOracle>(
    monitor: &Monitor,
    replay: &ReplaySettings,
    oracle: &mut O,
) -> anyhow::Result<()> {
    let dom = HtmlSnapshot::from_files(&replay.source_url, &replay.pages)
        .context("Failed to read saved pages")?;
    log::info!("Replaying {} saved pages of {}", replay.pages.len(), replay.source_url);

    let title = dom.page_title().await?;
    let session = ExtractionSession::new(&replay.source_url, &title, HashSet::new());
    if oracle.ask_start(&title, &session.slug).await == StartDecision::No {
        log::info!("Extraction skipped");
        return Ok(());
    }

    let outcome = monitor.extract(&dom, oracle, session).await;
    log::info!(
        "Replay ended ({:?}) with {} records",
        outcome.end,
        outcome.session.records.len()
    );

    Ok(())
}
