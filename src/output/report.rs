//! Structured report construction.

use crate::fs::naming::format_display_timestamp;
use crate::media::MediaCategory;
use crate::platform::Report;
use crate::scan::ScanReport;
use crate::store::{ChannelStats, RecoveryCheckpoint};

/// Render a byte count as megabytes with up to three decimals.
pub fn format_size_mb(bytes: u64) -> String {
    let mb = bytes as f64 / 1024.0 / 1024.0;
    let rounded = (mb * 1000.0).round() / 1000.0;
    let mut text = format!("{:.3}", rounded);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.push('0');
    }
    text
}

/// Build the report for a completed scan pass.
pub fn scan_report(report: &ScanReport, requested_by: &str) -> Report {
    let title = if report.resumed {
        "Scan report (resumed)".to_string()
    } else if let Some(since) = report.since {
        format!("Scan report (since {})", format_display_timestamp(since))
    } else if report.include_seen {
        "Scan report (all media)".to_string()
    } else {
        "Scan report (new media)".to_string()
    };

    let mut out = Report::new(title);
    out.add_field(
        "Messages scanned",
        format!("{} messages", report.messages_scanned),
    );

    if report.resumed {
        out.add_field(
            "Total messages processed",
            format!("{} messages", report.processed_total),
        );
    }

    if !report.resumed
        && !report.include_seen
        && report.since.is_none()
        && report.previously_seen > 0
    {
        out.add_field(
            "Previously seen",
            format!("{} files", report.previously_seen),
        );
    }

    for category in [
        MediaCategory::Image,
        MediaCategory::Video,
        MediaCategory::Other,
    ] {
        let count = report.media.count(category);
        if count > 0 {
            out.add_field(
                category.label(),
                format!(
                    "{} files ({} MB)",
                    count,
                    format_size_mb(report.media.total_bytes(category))
                ),
            );
        }
    }

    let total = report.media.total_bytes_all();
    if total > 0 {
        out.add_field("Total size", format!("{} MB", format_size_mb(total)));
    }

    out.footer = format!("Requested by {}", requested_by);
    out
}

/// Build the report describing an interrupted scan checkpoint.
pub fn interrupted_report(checkpoint: &RecoveryCheckpoint) -> Report {
    let mut out = Report::new("Interrupted scan detected");
    out.add_field(
        "Started at",
        format_display_timestamp(checkpoint.start_time),
    );
    out.add_field("Scan type", checkpoint.scan_type.to_string());
    out.add_field(
        "Messages processed",
        format!("{} messages", checkpoint.processed_count),
    );
    out.add_field(
        "Media found",
        format!("{} files", checkpoint.found_media),
    );
    out
}

/// Build the report for a channel's scan history.
pub fn history_report(stats: &ChannelStats, channel_name: &str) -> Report {
    let mut out = Report::new("Channel scan history");
    out.add_field("Media scanned", format!("{} files", stats.total_scanned));
    out.add_field("Scans run", format!("{}", stats.total_scans));
    match stats.last_scan {
        Some(at) => out.add_field("Last scan", format_display_timestamp(at)),
        None => out.add_field("Last scan", "never"),
    }
    out.footer = format!("Channel: {}", channel_name);
    out
}
