//! Plain-text rendering of service results.
//!
//! Everything here returns a `String` so the command layer decides where it
//! goes; only [`ProgressDisplay`] writes on its own (to stderr).

use std::fmt::Write as _;
use std::io::IsTerminal;

use easier_client::session::Session;
use easier_core::aggregate::SortState;
use easier_core::dashboard::UsageReport;
use easier_core::models::document::RetrievedPassage;
use easier_core::models::image::ImageDescription;
use easier_core::models::synthetic_user::SyntheticUserRow;
use easier_core::models::token_count::TokenTotals;
use easier_core::models::topic::TopicSummary;
use easier_core::models::usage::AggregateRow;
use easier_core::progress::{ProgressStage, ProgressTracker, StageLabels};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::EasierConfig;

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    if rows.is_empty() {
        out.push_str("(none)\n");
    }
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn tokens_line(tokens: &TokenTotals) -> String {
    format!(
        "input {}, output {}, total {}",
        tokens.input_tokens, tokens.output_tokens, tokens.total_tokens
    )
}

// ── Usage ───────────────────────────────────────────────────────────────────

/// Sort states shown next to each usage table heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageSorts {
    pub detailed: SortState,
    pub by_feature: SortState,
    pub by_user: SortState,
}

pub fn usage_report(report: &UsageReport, sorts: UsageSorts) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Token usage ({})", sorts.detailed);
    let detailed: Vec<Vec<String>> = report
        .detailed
        .iter()
        .map(|r| {
            vec![
                r.username.clone(),
                r.feature.clone(),
                r.input_tokens.to_string(),
                r.output_tokens.to_string(),
                r.total_tokens.to_string(),
                r.timestamp.clone(),
            ]
        })
        .collect();
    out.push_str(&table(
        &["username", "feature", "input", "output", "total", "timestamp"],
        &detailed,
    ));

    let _ = writeln!(out, "\nTotal: {}", tokens_line(&report.total));

    let _ = writeln!(out, "\nBy feature ({})", sorts.by_feature);
    out.push_str(&aggregate_table("feature", &report.by_feature));

    let _ = writeln!(out, "\nBy user ({})", sorts.by_user);
    out.push_str(&aggregate_table("username", &report.by_user));

    out
}

fn aggregate_table(key_header: &str, rows: &[AggregateRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.key.clone(),
                row.tokens.input_tokens.to_string(),
                row.tokens.output_tokens.to_string(),
                row.tokens.total_tokens.to_string(),
            ]
        })
        .collect();
    table(&[key_header, "input", "output", "total"], &rows)
}

// ── Features ────────────────────────────────────────────────────────────────

pub fn passages(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return "No passages matched.\n".to_string();
    }

    let mut out = String::new();
    for (i, passage) in passages.iter().enumerate() {
        let score = passage
            .similarity
            .map(|s| format!(" [{s:.3}]"))
            .unwrap_or_default();
        let text = passage.text().unwrap_or("(empty passage)");
        let _ = writeln!(out, "{}.{score} {text}", i + 1);
    }
    out
}

pub fn image_description(description: &ImageDescription) -> String {
    let mut out = String::new();

    if let Some(text) = &description.description {
        let _ = writeln!(out, "{text}");
    }

    if description.is_structured() {
        let fields = [
            ("Hero text", &description.hero_text),
            ("Website description", &description.website_description),
            ("Call to action", &description.call_to_action),
            ("Website content", &description.website_content),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                let _ = writeln!(out, "{label}: {value}");
            }
        }
        if let Some(colors) = &description.color_palette {
            let _ = writeln!(out, "Color palette: {}", colors.join(", "));
        }
        if let Some(fonts) = &description.font_palette {
            let _ = writeln!(out, "Font palette: {}", fonts.join(", "));
        }
    }

    if out.is_empty() {
        out.push_str("The service returned no description.\n");
    }
    if let Some(tokens) = description.tokens() {
        let _ = writeln!(out, "\nTokens: {}", tokens_line(&tokens));
    }
    out
}

pub fn topic_summary(summary: &TopicSummary) -> String {
    if summary.articles.is_empty() {
        return "No articles found.\n".to_string();
    }

    let mut out = String::new();
    for (i, article) in summary.articles.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}. {}", i + 1, article.title);
        let _ = writeln!(out, "{}", article.summary);
        if !article.reference_link.is_empty() {
            let _ = writeln!(out, "Source: {}", article.reference_link);
        }
    }
    if let Some(tokens) = summary.tokens {
        let _ = writeln!(out, "\nTokens: {}", tokens_line(&tokens.into()));
    }
    out
}

pub fn synthetic_users(rows: &[SyntheticUserRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|u| {
            vec![
                u.firstname.clone(),
                u.lastname.clone(),
                u.email.clone(),
                u.date_of_birth.clone(),
                u.salary.clone(),
            ]
        })
        .collect();
    table(
        &["first name", "last name", "email", "date of birth", "salary"],
        &rows,
    )
}

pub fn users_failure(error: &str, raw_response: Option<&str>) -> String {
    let mut out = format!("The service could not generate users: {error}\n");
    if let Some(raw) = raw_response {
        let _ = writeln!(out, "\nRaw response:\n{raw}");
    }
    out
}

// ── Session and config ──────────────────────────────────────────────────────

pub fn whoami(session: &Session, now: jiff::Timestamp) -> String {
    let Some(username) = session.username() else {
        return "Not signed in.\n".to_string();
    };

    let role = session.role().map(|r| r.as_str()).unwrap_or("user");
    let mut out = format!("{username} ({role})\n");

    let expiry = session.claims().and_then(|claims| claims.exp);
    if let Some(exp) = expiry.and_then(|exp| jiff::Timestamp::from_second(exp).ok()) {
        if session.is_expired(now) {
            let _ = writeln!(out, "Session expired at {exp}; run `easier login` again.");
        } else {
            let _ = writeln!(out, "Session valid until {exp}.");
        }
    }
    out
}

pub fn config(config: &EasierConfig, effective_api_url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "api_url              {effective_api_url}");
    if effective_api_url != config.api_url {
        let _ = writeln!(out, "  (config file has {})", config.api_url);
    }
    let _ = writeln!(out, "top_k                {}", config.top_k);
    let _ = writeln!(out, "similarity_threshold {}", config.similarity_threshold);
    let timeout = config
        .timeout_secs
        .map(|secs| format!("{secs}s"))
        .unwrap_or_else(|| "none".to_string());
    let _ = writeln!(out, "timeout_secs         {timeout}");
    out
}

// ── Progress ────────────────────────────────────────────────────────────────

/// Prints the stage labels of one request to stderr while it runs.
///
/// Silent when stderr is not a terminal.
pub struct ProgressDisplay {
    tracker: ProgressTracker,
    watcher: Option<JoinHandle<()>>,
}

impl ProgressDisplay {
    pub fn start(labels: StageLabels) -> Self {
        let tracker = ProgressTracker::new();
        let watcher = std::io::stderr()
            .is_terminal()
            .then(|| tokio::spawn(print_stages(tracker.subscribe(), labels)));
        Self { tracker, watcher }
    }

    pub fn tracker(&self) -> Option<&ProgressTracker> {
        Some(&self.tracker)
    }

    /// Wait for the last label to be printed.
    pub async fn finish(self) {
        let Self { tracker, watcher } = self;
        // Dropping the sender ends the watcher even if the request never
        // got past validation.
        drop(tracker);
        if let Some(watcher) = watcher {
            let _ = watcher.await;
        }
    }
}

async fn print_stages(mut rx: watch::Receiver<ProgressStage>, labels: StageLabels) {
    while rx.changed().await.is_ok() {
        let stage = *rx.borrow_and_update();
        if let Some(label) = labels.label(stage) {
            eprintln!("{label}");
        }
        if stage.is_terminal() {
            break;
        }
    }
}
