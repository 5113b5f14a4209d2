//! Data types exchanged with the chat platform.

use chrono::{DateTime, Utc};

/// A file attached to a single message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub url: String,
    pub size_bytes: u64,
}

/// One message from a channel's history.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: u64,
    pub author: String,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

/// A structured report handed to the report sink for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub fields: Vec<ReportField>,
    pub footer: String,
}

/// One labeled value in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportField {
    pub label: String,
    pub value: String,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            footer: String::new(),
        }
    }

    pub fn add_field(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.fields.push(ReportField {
            label: label.into(),
            value: value.into(),
        });
    }
}
