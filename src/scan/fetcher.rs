//! Paged retrieval from the message source.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::platform::{ChannelMessage, MessageSource};
use crate::scan::params::MAX_MESSAGE_LIMIT;

/// Adapter producing ordered (newest-first) message sequences from the
/// external source, optionally skipping forward to a resume anchor.
///
/// The source cannot resume a page natively, so anchored fetches request
/// twice the wanted count to leave room for the skipped prefix. An anchor
/// lying beyond that window silently yields a shorter sequence.
pub struct PageFetcher {
    source: Arc<dyn MessageSource>,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn MessageSource>) -> Self {
        Self { source }
    }

    /// Collect up to `limit` messages, starting after the optional anchor.
    pub async fn count_anchored(
        &self,
        channel_id: u64,
        after: Option<u64>,
        limit: u32,
    ) -> Result<Vec<ChannelMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let raw_limit = if after.is_some() {
            limit.saturating_mul(2)
        } else {
            limit
        };
        let raw = self.source.fetch_history(channel_id, raw_limit).await?;

        let mut collected = Vec::new();
        let mut anchor_found = after.is_none();
        for message in raw {
            if !anchor_found {
                if Some(message.id) == after {
                    anchor_found = true;
                }
                continue;
            }

            collected.push(message);
            if collected.len() as u32 >= limit {
                break;
            }
        }

        Ok(collected)
    }

    /// Collect messages strictly newer than `since`.
    ///
    /// The source is newest-first, so collection stops at the first message
    /// at or before the cutoff, or at `limit`, whichever comes first. The
    /// cutoff comparison is zone-stripped to match the persisted value.
    pub async fn time_anchored(
        &self,
        channel_id: u64,
        since: NaiveDateTime,
        limit: Option<u32>,
        after: Option<u64>,
    ) -> Result<Vec<ChannelMessage>> {
        let max_messages = limit.unwrap_or(MAX_MESSAGE_LIMIT);
        let raw = self
            .source
            .fetch_history(channel_id, max_messages.saturating_mul(2))
            .await?;

        let mut collected = Vec::new();
        let mut anchor_found = after.is_none();
        for message in raw {
            if !anchor_found {
                if Some(message.id) == after {
                    anchor_found = true;
                }
                continue;
            }

            if message.created_at.naive_utc() <= since {
                break;
            }

            collected.push(message);
            if collected.len() as u32 >= max_messages {
                break;
            }
        }

        tracing::debug!(
            "Collected {} messages for channel {}",
            collected.len(),
            channel_id
        );
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    /// Source yielding a fixed newest-first sequence, recording the
    /// requested limit.
    struct FixedSource {
        messages: Vec<ChannelMessage>,
        requested: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl MessageSource for FixedSource {
        async fn fetch_history(
            &self,
            _channel_id: u64,
            limit: u32,
        ) -> Result<Vec<ChannelMessage>> {
            self.requested.lock().unwrap().push(limit);
            Ok(self
                .messages
                .iter()
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    fn messages(count: u64) -> Vec<ChannelMessage> {
        // Ids count..1, newest first.
        let base = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();
        (0..count)
            .map(|n| ChannelMessage {
                id: count - n,
                author: "user".to_string(),
                is_bot: false,
                created_at: base - Duration::minutes(n as i64),
                attachments: Vec::new(),
            })
            .collect()
    }

    fn fetcher(messages: Vec<ChannelMessage>) -> (Arc<FixedSource>, PageFetcher) {
        let source = Arc::new(FixedSource {
            messages,
            requested: Mutex::new(Vec::new()),
        });
        let fetcher = PageFetcher::new(Arc::clone(&source) as Arc<dyn MessageSource>);
        (source, fetcher)
    }

    #[test]
    fn test_count_without_anchor_takes_from_start() {
        tokio_test::block_on(async {
            let (source, fetcher) = fetcher(messages(20));
            let collected = fetcher.count_anchored(1, None, 5).await.unwrap();

            let ids: Vec<u64> = collected.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![20, 19, 18, 17, 16]);
            assert_eq!(*source.requested.lock().unwrap(), vec![5]);
        });
    }

    #[test]
    fn test_count_with_anchor_skips_through_it_and_doubles_request() {
        tokio_test::block_on(async {
            let (source, fetcher) = fetcher(messages(20));
            let collected = fetcher.count_anchored(1, Some(18), 4).await.unwrap();

            let ids: Vec<u64> = collected.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![17, 16, 15, 14]);
            assert_eq!(*source.requested.lock().unwrap(), vec![8]);
        });
    }

    #[test]
    fn test_count_anchor_beyond_window_yields_empty() {
        tokio_test::block_on(async {
            let (_source, fetcher) = fetcher(messages(20));
            // Anchor id 999 never appears; everything is skipped.
            let collected = fetcher.count_anchored(1, Some(999), 5).await.unwrap();
            assert!(collected.is_empty());
        });
    }

    #[test]
    fn test_time_anchored_stops_at_cutoff() {
        tokio_test::block_on(async {
            let all = messages(10);
            // Cutoff right at message id 7's timestamp: ids 10, 9, 8 are newer.
            let cutoff = all[3].created_at.naive_utc();
            let (_source, fetcher) = fetcher(all);

            let collected = fetcher.time_anchored(1, cutoff, None, None).await.unwrap();
            let ids: Vec<u64> = collected.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![10, 9, 8]);
        });
    }

    #[test]
    fn test_time_anchored_respects_limit_and_anchor() {
        tokio_test::block_on(async {
            let all = messages(10);
            let cutoff = (all[9].created_at - Duration::minutes(1)).naive_utc();
            let (source, fetcher) = fetcher(all);

            let collected = fetcher
                .time_anchored(1, cutoff, Some(3), Some(9))
                .await
                .unwrap();
            let ids: Vec<u64> = collected.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![8, 7, 6]);
            assert_eq!(*source.requested.lock().unwrap(), vec![6]);
        });
    }

    #[test]
    fn test_empty_source_is_not_an_error() {
        tokio_test::block_on(async {
            let (_source, fetcher) = fetcher(Vec::new());
            assert!(fetcher.count_anchored(1, None, 5).await.unwrap().is_empty());
        });
    }
}
