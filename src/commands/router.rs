//! Command routing over a capability bundle.
//!
//! The router is a plain function: it takes a parsed command, the request's
//! identity and a bundle of capabilities, and maps each command onto one
//! engine or store operation. It is independent of any event-loop framework;
//! platform glue parses the message, builds the context and delivers the
//! reply text.

use std::sync::Arc;
use std::time::Duration;

use crate::commands::parser::{Command, COMMAND_PREFIX};
use crate::download::{DownloadOrchestrator, DownloadSelection};
use crate::error::{Error, Result};
use crate::media::MediaCategory;
use crate::output::report::{history_report, interrupted_report, scan_report};
use crate::platform::{ChoicePrompt, ReportSink};
use crate::scan::{ScanEngine, ScanOutcome, ScanParams, ScanReport};

/// How long the download selection prompt stays open.
pub const SELECTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Identity of the request being handled; supplied by the platform glue.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub channel_id: u64,
    pub server_name: String,
    pub channel_name: String,
    pub user: String,
    pub is_admin: bool,
}

/// Capabilities the router dispatches onto.
pub struct Capabilities {
    pub engine: Arc<ScanEngine>,
    pub downloader: Arc<DownloadOrchestrator>,
    pub sink: Arc<dyn ReportSink>,
    pub prompt: Arc<dyn ChoicePrompt>,
}

/// Execute one parsed command and return the reply text for the requester.
///
/// An empty reply means the command's output went through the report sink.
pub async fn dispatch(
    command: Command,
    ctx: &RequestContext,
    caps: &Capabilities,
) -> Result<String> {
    if !ctx.is_admin && !matches!(command, Command::Ping | Command::Help) {
        return Ok("This command requires administrator permissions.".to_string());
    }

    match command {
        Command::Ping => Ok("Pong!".to_string()),
        Command::Help => Ok(help_text()),
        Command::Scan {
            limit,
            include_seen,
            from_last,
        } => {
            let params = if from_last {
                ScanParams::time_based(limit, include_seen)
            } else {
                ScanParams::count_based(limit, include_seen)
            };
            let outcome = caps.engine.start_scan(ctx.channel_id, params).await?;
            finish_scan(outcome, ctx, caps).await
        }
        Command::ResumeScan => {
            let outcome = caps.engine.resume_scan(ctx.channel_id).await?;
            finish_scan(outcome, ctx, caps).await
        }
        Command::CheckRecovery => match caps.engine.interrupted(ctx.channel_id).await {
            Some(checkpoint) => {
                caps.sink.post_report(&interrupted_report(&checkpoint)).await?;
                Ok(format!("Use `{}resume_scan` to continue.", COMMAND_PREFIX))
            }
            None => Ok("No interrupted scan in this channel.".to_string()),
        },
        Command::ClearRecovery => {
            caps.engine.clear_recovery(ctx.channel_id).await;
            Ok("Recovery data for this channel cleared.".to_string())
        }
        Command::History => {
            let stats = caps.engine.history_stats(ctx.channel_id).await;
            caps.sink
                .post_report(&history_report(&stats, &ctx.channel_name))
                .await?;
            Ok(String::new())
        }
        Command::ClearHistory => {
            caps.engine.clear_history(ctx.channel_id).await;
            Ok("Scan history for this channel cleared.".to_string())
        }
    }
}

/// Post the scan report and walk the user through the download selection.
async fn finish_scan(
    outcome: ScanOutcome,
    ctx: &RequestContext,
    caps: &Capabilities,
) -> Result<String> {
    let report = match outcome {
        ScanOutcome::NothingToScan => return Ok("No messages to scan.".to_string()),
        ScanOutcome::Completed(report) => report,
    };

    caps.sink.post_report(&scan_report(&report, &ctx.user)).await?;

    if report.media.is_empty() {
        return Ok(if report.include_seen {
            "No media found in the scanned messages.".to_string()
        } else {
            "No new media found.".to_string()
        });
    }

    offer_downloads(&report, ctx, caps).await
}

async fn offer_downloads(
    report: &ScanReport,
    ctx: &RequestContext,
    caps: &Capabilities,
) -> Result<String> {
    let mut selections = Vec::new();
    for (selection, category) in [
        (DownloadSelection::Images, MediaCategory::Image),
        (DownloadSelection::Videos, MediaCategory::Video),
        (DownloadSelection::Other, MediaCategory::Other),
    ] {
        if report.media.count(category) > 0 {
            selections.push(selection);
        }
    }
    if selections.len() > 1 {
        selections.push(DownloadSelection::All);
    }

    let options: Vec<String> = selections.iter().map(|s| s.label().to_string()).collect();
    let choice = caps
        .prompt
        .ask_choice(&ctx.user, &options, SELECTION_TIMEOUT)
        .await?;

    let selection = match choice {
        Some(index) => selections.get(index).copied().ok_or_else(|| {
            Error::Prompt(format!("selection index {} out of range", index))
        })?,
        None => return Ok("Download request timed out.".to_string()),
    };

    let summary = caps
        .downloader
        .download(report, selection, &ctx.server_name, &ctx.channel_name)
        .await?;

    Ok(if summary.all_succeeded() {
        format!(
            "Download complete: {}/{} files saved to `{}`.",
            summary.succeeded,
            summary.total,
            summary.destination.display()
        )
    } else {
        format!(
            "Download partially complete: {}/{} files saved to `{}`.",
            summary.succeeded,
            summary.total,
            summary.destination.display()
        )
    })
}

fn help_text() -> String {
    format!(
        "Media scanner commands:\n\
         `{p}scan [N]` - scan the N most recent messages (new media only)\n\
         `{p}scan [N] --all` - scan including previously seen media\n\
         `{p}scan --new` - scan from the last completed scan to now\n\
         `{p}scan --new [N]` - same, capped at N messages\n\
         `{p}check_recovery` - show an interrupted scan, if any\n\
         `{p}resume_scan` - continue an interrupted scan\n\
         `{p}clear_recovery` - discard the interrupted scan checkpoint\n\
         `{p}history` - show this channel's scan history\n\
         `{p}clear_history` - delete this channel's scan history\n\
         `{p}ping` - check the scanner is alive\n\
         `{p}help` - show this message",
        p = COMMAND_PREFIX
    )
}
