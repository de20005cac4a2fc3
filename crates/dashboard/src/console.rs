//! Terminal front end: table rendering, the stdin confirmation prompt and
//! the command parser.

use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use shelfwatch_client::presenter::{Announcement, ConfirmPrompt, Notification, NotificationLevel, Presenter};
use shelfwatch_core::event::Feedback;
use shelfwatch_core::gate::{Decision, GateState, GatedAction};
use shelfwatch_core::types::EventId;
use shelfwatch_core::view::{DashboardSnapshot, EventDetailView, TableView};
use shelfwatch_core::wire::{DetectionResult, ProductCount};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

pub const HELP: &str = "\
Commands:
  next | prev                       move between pages
  refresh                           reload summary and events
  upload <path>                     run detection on an image file
  feedback approved|needs-improvement
                                    review the latest detection
  view <id>                         show one event's details
  products                          list every counted product
  help                              show this message
  quit                              leave the dashboard";

/* --------------------------------------------------------------------------
Commands
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Refresh,
    Upload(String),
    Feedback(Feedback),
    View(EventId),
    Products,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "refresh" | "r" => Ok(Command::Refresh),
            "products" => Ok(Command::Products),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "logout" => Ok(Command::Quit),
            "upload" if !rest.is_empty() => Ok(Command::Upload(rest.to_string())),
            "upload" => Err(CommandError::Usage("upload <path>")),
            "feedback" => match rest.to_ascii_lowercase().as_str() {
                "approved" | "approve" | "ok" => Ok(Command::Feedback(Feedback::Approved)),
                "needs-improvement" | "needs improvement" | "improve" => {
                    Ok(Command::Feedback(Feedback::NeedsImprovement))
                }
                _ => Err(CommandError::Usage("feedback approved|needs-improvement")),
            },
            "view" => rest
                .parse()
                .map(Command::View)
                .map_err(|_| CommandError::Usage("view <id>")),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/* --------------------------------------------------------------------------
Rendering
-------------------------------------------------------------------------- */

/// Text rendering of the summary, events table and caption.
pub fn format_snapshot(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if let Some(daily) = snapshot.summary.as_ref().and_then(|s| s.daily_data.as_ref()) {
        let (nestle, competitor) = daily.market_share_percent();
        let _ = writeln!(
            out,
            "Market share: Nestle {nestle}% / Competitor {competitor}%{}",
            daily
                .date_range()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default()
        );
    }

    match &snapshot.table {
        TableView::Rows(rows) => {
            let _ = writeln!(
                out,
                "{:>6}  {:<19}  {:<12}  {:>12}  {:>12}  {:>5}  {}",
                "ID", "Timestamp", "Device", "Nestle", "Competitor", "IQI", "Feedback"
            );
            for row in rows {
                let _ = writeln!(
                    out,
                    "{:>6}  {:<19}  {:<12}  {:>6} ({:>3}%)  {:>6} ({:>3}%)  {:>5.1}  {}",
                    row.id,
                    row.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    row.device_id,
                    row.nestle_count,
                    row.nestle_percent,
                    row.competitor_count,
                    row.competitor_percent,
                    row.iqi_score,
                    row.feedback.map_or("-", |f| f.as_wire()),
                );
            }
        }
        TableView::Empty(message) => {
            let _ = writeln!(out, "{message}");
        }
        TableView::Error(message) => {
            let _ = writeln!(out, "{message}");
        }
    }

    let _ = write!(out, "{}  [page {}]", snapshot.caption, snapshot.current_page);
    if snapshot.gate == GateState::PendingReview {
        let _ = write!(out, "  (feedback pending for latest upload)");
    }
    out
}

fn format_detail(detail: &EventDetailView) -> String {
    let mut out = format!(
        "Event {}: Nestle {} ({}%), Competitor {} ({}%), IQI {:.1} {}",
        detail.id,
        detail.nestle_count,
        detail.nestle_percent,
        detail.competitor_count,
        detail.competitor_percent,
        detail.iqi_score,
        detail.iqi_band.label(),
    );
    for (name, count) in detail.nestle_products.iter().chain(&detail.competitor_products) {
        let _ = write!(out, "\n  {name}: {count}");
    }
    out
}

/// Presenter printing the table to stdout and everything else through
/// `tracing`.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn render(&self, snapshot: &DashboardSnapshot) {
        println!("{}", format_snapshot(snapshot));
    }

    fn announce(&self, announcement: &Announcement) {
        tracing::info!(
            device_id = %announcement.device_id,
            nestle_count = announcement.nestle_count,
            competitor_count = announcement.competitor_count,
            image_url = %announcement.image_url,
            "New detection",
        );
    }

    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::error!("{}", notification.message),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!("{}", notification.message)
            }
        }
    }

    fn show_detection(&self, result: &DetectionResult) {
        println!(
            "Detection {}: Nestle {}, Competitor {}",
            result.id,
            result.nestle_sum(),
            result.competitor_sum()
        );
    }

    fn show_event_detail(&self, detail: &EventDetailView) {
        println!("{}", format_detail(detail));
    }

    fn show_products(&self, products: &[ProductCount]) {
        for product in products {
            println!("{:<30} {:>6}", product.name, product.count);
        }
    }
}

/* --------------------------------------------------------------------------
Input
-------------------------------------------------------------------------- */

/// Line reader over stdin, shared by the command loop and the prompt.
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl ConsoleInput {
    pub fn stdin() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Next line, or `None` at end of input.
    pub async fn next_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                None
            }
        }
    }
}

/// Interpret a prompt answer. Anything but yes cancels.
pub fn parse_decision(answer: &str) -> Decision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Decision::Proceed,
        _ => Decision::Cancel,
    }
}

/// Confirmation prompt on the terminal.
pub struct StdinPrompt {
    input: ConsoleInput,
}

impl StdinPrompt {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl ConfirmPrompt for StdinPrompt {
    async fn confirm(&self, action: GatedAction, message: &str) -> Decision {
        println!("{message}");
        println!("Discard the pending review and {} anyway? [y/N]", action.describe());
        match self.input.next_line().await {
            Some(answer) => parse_decision(&answer),
            None => Decision::Cancel,
        }
    }
}
