//! Terminal display for domain-sweep.
//!
//! Progress lines and the final summary go to stdout, styled with `console`.
//! Sweep events arrive over a channel and are rendered by a separate task, so
//! a slow terminal never holds up the checks.

use console::{pad_str, style, Alignment, StyledObject};
use domain_sweep_lib::utils::format_duration;
use domain_sweep_lib::{OutputWriter, ProgressEvent, Status, SweepConfig, SweepEvent, SweepReport};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const DOMAIN_WIDTH: usize = 24;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a sweep.
pub fn print_header(domain_count: usize, suffixes: &[String], config: &SweepConfig) {
    println!(
        "{} {} {}",
        style("domain-sweep").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- sweeping {} domain{} under {}",
            domain_count,
            if domain_count == 1 { "" } else { "s" },
            suffixes.join(", ")
        ))
        .dim(),
    );

    let fallback = config
        .fallback
        .as_ref()
        .map(|f| f.kind.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!(
        "{}",
        style(format!(
            "Primary: {} | Fallback: {} | Concurrency: {} | Retries: {} | Timeout: {}",
            config.primary.kind,
            fallback,
            config.concurrency,
            config.retry_budget,
            format_duration(config.timeout),
        ))
        .dim()
    );
    println!();
}

// ── Progress ─────────────────────────────────────────────────────────────────

fn status_label(status: Status) -> StyledObject<&'static str> {
    match status {
        Status::Unregistered => style("AVAILABLE").green().bold(),
        Status::Registered => style("TAKEN").red().bold(),
        Status::Failed => style("FAILED").yellow(),
    }
}

/// Format one progress line: `domain  STATUS  (code) detail  [i/n, p%]`.
pub fn format_progress(event: &ProgressEvent) -> String {
    let prefix = if event.pass > 0 {
        format!("{} ", style(format!("retry {}", event.pass)).cyan())
    } else {
        String::new()
    };
    let percent = if event.total == 0 {
        100.0
    } else {
        event.completed as f64 * 100.0 / event.total as f64
    };

    format!(
        "  {}{}  {}  {}  {}",
        prefix,
        pad_str(&event.domain, DOMAIN_WIDTH, Alignment::Left, Some("..")),
        status_label(event.status),
        style(&event.detail).dim(),
        style(format!("[{}/{}, {:.1}%]", event.completed, event.total, percent)).dim(),
    )
}

/// Render sweep events until the sender side closes.
///
/// `error.txt` is rewritten after every pass, so an interrupted run still
/// leaves the latest failed set behind. With `quiet` only the file is kept
/// current and nothing is printed.
pub async fn consume_events(
    mut events: UnboundedReceiver<SweepEvent>,
    writer: OutputWriter,
    quiet: bool,
) {
    while let Some(event) = events.recv().await {
        match event {
            SweepEvent::PassStarted { pass, total } => {
                if pass > 0 && !quiet {
                    println!();
                    println!(
                        "{}",
                        style(format!(
                            "Retry pass {}: {} failed domain{}",
                            pass,
                            total,
                            if total == 1 { "" } else { "s" }
                        ))
                        .cyan()
                        .bold()
                    );
                }
            }
            SweepEvent::Checked(progress) => {
                if !quiet {
                    println!("{}", format_progress(&progress));
                }
            }
            SweepEvent::PassFinished { pass, failed } => {
                if let Err(e) = writer.write_failed(&failed) {
                    tracing::warn!(pass, error = %e, "could not update failed list");
                }
            }
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(report: &SweepReport, duration: Duration, output_dir: &Path) {
    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {}  {}  {}  {}  {}  {}  {}",
        style(report.total()).bold(),
        if report.total() == 1 { "" } else { "s" },
        format_duration(duration),
        style("|").dim(),
        style(format!("{} available", report.unregistered.len())).green(),
        style("|").dim(),
        style(format!("{} taken", report.registered.len())).red(),
        style("|").dim(),
        style(format!("{} failed", report.failed.len())).yellow(),
    );

    if report.exhausted {
        println!(
            "  {}",
            style(format!(
                "{} domain{} still failing after {} pass{}",
                report.failed.len(),
                if report.failed.len() == 1 { "" } else { "s" },
                report.passes,
                if report.passes == 1 { "" } else { "es" },
            ))
            .yellow()
        );
    }

    println!(
        "  {}",
        style(format!("Results written to {}", output_dir.display())).dim()
    );
}
