use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStats {
    pub page_number: usize,
    pub records_this_page: usize,
    pub total_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    Yes,
    No,
}

#[async_trait(?Send)]
pub trait ApprovalOracle {
    async fn ask_start(&mut self, page_title: &str, preview_slug: &str) -> StartDecision;

    async fn ask_continue(&mut self, stats: &PageStats) -> Decision;
}

/// Asks on the terminal. End of input or a broken terminal counts as
/// "no" / "stop".
#[derive(Default)]
pub struct TerminalOracle;

// Prompts block on stdin, so they run on a detached thread the runtime never
// waits for.
async fn on_prompt_thread<T, F>(prompt: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    std::thread::spawn(move || {
        _ = sender.send(prompt());
    });

    match receiver.await {
        Ok(Ok(reply)) => Some(reply),
        Ok(Err(e)) => {
            log::error!("Could not read from the terminal: {:?}", e);
            None
        }
        Err(_) => None,
    }
}

pub fn start_decision(reply: Option<bool>) -> StartDecision {
    match reply {
        Some(true) => StartDecision::Yes,
        _ => StartDecision::No,
    }
}

pub fn continue_decision(reply: Option<&str>) -> Decision {
    match reply.map(|r| r.trim().to_lowercase()).as_deref() {
        Some("q") | Some("quit") | None => Decision::Stop,
        Some(_) => Decision::Continue,
    }
}

#[async_trait(?Send)]
impl ApprovalOracle for TerminalOracle {
    async fn ask_start(&mut self, page_title: &str, preview_slug: &str) -> StartDecision {
        println!();
        println!("Listing page detected: {}", page_title);
        println!("Data will be saved as: {}_[timestamp]", preview_slug);
        println!("Every page progression needs your approval.");

        let reply = on_prompt_thread(|| {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Start extraction?")
                .default(false)
                .interact_opt()
        })
        .await
        .flatten();

        start_decision(reply)
    }

    async fn ask_continue(&mut self, stats: &PageStats) -> Decision {
        println!();
        println!("Next page available.");
        println!("  Current page: {}", stats.page_number);
        println!("  Records on this page: {}", stats.records_this_page);
        println!("  Total records: {}", stats.total_records);

        let message = format!(
            "Press ENTER to continue to page {}, or type 'q' to quit",
            stats.page_number + 1
        );
        let reply = on_prompt_thread(move || {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .allow_empty(true)
                .interact_text()
        })
        .await;

        continue_decision(reply.as_deref())
    }
}
