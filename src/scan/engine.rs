//! The resumable scan state machine.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{Error, Result};
use crate::media::MediaItem;
use crate::platform::MessageSource;
use crate::scan::fetcher::PageFetcher;
use crate::scan::params::{ScanMode, ScanParams};
use crate::scan::result::{MediaSet, ScanOutcome, ScanReport};
use crate::store::{ChannelStats, HistoryStore, RecoveryCheckpoint, RecoveryStore};

/// Progress is checkpointed every this many processed messages.
const PROGRESS_INTERVAL: u32 = 10;

/// Orchestrates resumable scan passes, one active per channel at a time.
///
/// Holds the dedup history, the recovery checkpoints and the page fetcher.
/// Constructed once at process start and shared by reference with request
/// handlers; exclusion is enforced through an in-process lock set released
/// by an RAII guard, so an aborted pass cannot leave a channel locked.
pub struct ScanEngine {
    fetcher: PageFetcher,
    history: AsyncMutex<HistoryStore>,
    recovery: AsyncMutex<RecoveryStore>,
    active: Mutex<HashSet<u64>>,
}

impl ScanEngine {
    pub fn new(
        source: Arc<dyn MessageSource>,
        history: HistoryStore,
        recovery: RecoveryStore,
    ) -> Self {
        Self {
            fetcher: PageFetcher::new(source),
            history: AsyncMutex::new(history),
            recovery: AsyncMutex::new(recovery),
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Start a fresh scan on a channel.
    ///
    /// Fails with [`Error::ScanAlreadyActive`] while another pass holds the
    /// channel, and with [`Error::UnresolvedRecovery`] while an interrupted
    /// checkpoint is waiting to be resumed or cleared.
    pub async fn start_scan(&self, channel_id: u64, params: ScanParams) -> Result<ScanOutcome> {
        let _guard = self.acquire_lock(channel_id)?;

        if self.recovery.lock().await.interrupted(channel_id).is_some() {
            return Err(Error::UnresolvedRecovery(channel_id));
        }

        // A time-based scan anchors on the previous completed scan; resolved
        // before any checkpoint exists so a rejection leaves no trace.
        let params = match params.mode {
            ScanMode::TimeBased if params.since.is_none() => {
                let since = self
                    .history
                    .lock()
                    .await
                    .last_scan_time(channel_id)
                    .ok_or(Error::NoHistoryAvailable(channel_id))?;
                ScanParams {
                    since: Some(since),
                    ..params
                }
            }
            _ => params,
        };

        let started_at = Utc::now();
        self.recovery
            .lock()
            .await
            .start_session(channel_id, params.clone(), started_at);

        tracing::info!(
            "Scanning channel {}: mode={}, limit={:?}, include_seen={}",
            channel_id,
            params.mode,
            params.message_limit,
            params.include_seen
        );

        self.run_pass(channel_id, params, started_at, None).await
    }

    /// Resume an interrupted scan from its checkpoint.
    ///
    /// Re-enters the machine with the persisted parameters; ordinals and
    /// counters continue where the interrupted pass stopped.
    pub async fn resume_scan(&self, channel_id: u64) -> Result<ScanOutcome> {
        let checkpoint = self
            .recovery
            .lock()
            .await
            .interrupted(channel_id)
            .cloned()
            .ok_or(Error::NothingToResume(channel_id))?;

        let _guard = self.acquire_lock(channel_id)?;

        let params = checkpoint.scan_params.clone();

        if params.mode == ScanMode::CountBased {
            let remaining = params
                .effective_limit()
                .saturating_sub(checkpoint.processed_count);
            if remaining == 0 {
                self.recovery.lock().await.complete(channel_id);
                return Ok(ScanOutcome::NothingToScan);
            }
        }

        tracing::info!(
            "Resuming scan in channel {} from message {:?} ({} processed)",
            channel_id,
            checkpoint.last_processed_message,
            checkpoint.processed_count
        );

        self.run_pass(channel_id, params, checkpoint.start_time, Some(checkpoint))
            .await
    }

    /// The channel's interrupted checkpoint, if any.
    pub async fn interrupted(&self, channel_id: u64) -> Option<RecoveryCheckpoint> {
        self.recovery.lock().await.interrupted(channel_id).cloned()
    }

    /// Hard-delete the channel's checkpoint (operator action).
    pub async fn clear_recovery(&self, channel_id: u64) {
        self.recovery.lock().await.clear(channel_id);
    }

    /// Channel history statistics.
    pub async fn history_stats(&self, channel_id: u64) -> ChannelStats {
        self.history.lock().await.stats(channel_id)
    }

    /// Remove the channel's history record (operator action).
    pub async fn clear_history(&self, channel_id: u64) {
        self.history.lock().await.clear(channel_id);
    }

    /// One fetch-and-analyze pass; shared by fresh scans and resumes.
    async fn run_pass(
        &self,
        channel_id: u64,
        params: ScanParams,
        started_at: DateTime<Utc>,
        resume_from: Option<RecoveryCheckpoint>,
    ) -> Result<ScanOutcome> {
        let (after, start_count, start_found) = match &resume_from {
            Some(checkpoint) => (
                checkpoint.last_processed_message,
                checkpoint.processed_count,
                checkpoint.found_media,
            ),
            None => (None, 0, 0),
        };

        let messages = match params.mode {
            ScanMode::CountBased => {
                let limit = params.effective_limit().saturating_sub(start_count);
                self.fetcher.count_anchored(channel_id, after, limit).await?
            }
            ScanMode::TimeBased => {
                let since = params
                    .since
                    .ok_or_else(|| Error::Config("time-based scan without a cutoff".into()))?;
                self.fetcher
                    .time_anchored(channel_id, since.naive_utc(), params.message_limit, after)
                    .await?
            }
        };

        if messages.is_empty() {
            self.recovery.lock().await.complete(channel_id);
            return Ok(ScanOutcome::NothingToScan);
        }

        let seen = if params.include_seen {
            HashSet::new()
        } else {
            self.history.lock().await.seen_urls(channel_id)
        };
        let previously_seen = seen.len();

        let mut found_urls: HashSet<String> = HashSet::new();
        let mut media = MediaSet::default();
        let mut processed = start_count;
        let mut found = start_found;
        let mut ordinal = start_count + 1;
        let mut last_id = None;

        {
            let mut recovery = self.recovery.lock().await;
            for message in &messages {
                processed += 1;
                last_id = Some(message.id);

                if !message.is_bot {
                    for attachment in &message.attachments {
                        if !params.include_seen
                            && (seen.contains(&attachment.url)
                                || found_urls.contains(&attachment.url))
                        {
                            tracing::debug!("Skipping already scanned: {}", attachment.url);
                            continue;
                        }

                        let item = MediaItem::from_attachment(attachment, message, ordinal);
                        tracing::debug!("{:?} detected: {}", item.category, item.url);
                        found_urls.insert(attachment.url.clone());
                        media.push(item);
                        found += 1;
                        ordinal += 1;
                    }
                }

                if processed % PROGRESS_INTERVAL == 0 {
                    recovery.update_progress(channel_id, Some(message.id), processed, found);
                }
            }

            // Unconditional final write so a later resume has an accurate
            // cutoff even when the count is not a multiple of the interval.
            recovery.update_progress(channel_id, last_id, processed, found);
        }

        if !found_urls.is_empty() {
            self.history
                .lock()
                .await
                .record_new_urls(channel_id, &found_urls);
            tracing::info!("Added {} new URLs to history", found_urls.len());
        }

        self.recovery.lock().await.complete(channel_id);

        tracing::info!(
            "Scan pass complete for channel {}: {} messages, {} media items",
            channel_id,
            messages.len(),
            media.len()
        );

        Ok(ScanOutcome::Completed(ScanReport {
            channel_id,
            started_at,
            resumed: resume_from.is_some(),
            include_seen: params.include_seen,
            since: params.since,
            messages_scanned: messages.len() as u32,
            processed_total: processed,
            previously_seen,
            media,
        }))
    }

    fn acquire_lock(&self, channel_id: u64) -> Result<ChannelGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(channel_id) {
            return Err(Error::ScanAlreadyActive(channel_id));
        }
        Ok(ChannelGuard {
            active: &self.active,
            channel_id,
        })
    }
}

/// RAII token for the per-channel scan lock.
struct ChannelGuard<'a> {
    active: &'a Mutex<HashSet<u64>>,
    channel_id: u64,
}

impl Drop for ChannelGuard<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.channel_id);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::Notify;

    use super::*;
    use crate::media::MediaCategory;
    use crate::platform::{Attachment, ChannelMessage};
    use crate::store::CheckpointStatus;

    /// Source replaying a scripted queue of responses; an empty queue yields
    /// empty pages.
    struct QueueSource {
        responses: StdMutex<VecDeque<Result<Vec<ChannelMessage>>>>,
    }

    impl QueueSource {
        fn new(responses: Vec<Result<Vec<ChannelMessage>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl MessageSource for QueueSource {
        async fn fetch_history(&self, _channel_id: u64, limit: u32) -> Result<Vec<ChannelMessage>> {
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(messages)) => Ok(messages.into_iter().take(limit as usize).collect()),
                Some(Err(e)) => Err(e),
                None => Ok(Vec::new()),
            }
        }
    }

    /// Source blocking channel 1 until released; other channels are empty.
    struct BlockingSource {
        release: Notify,
    }

    #[async_trait]
    impl MessageSource for BlockingSource {
        async fn fetch_history(&self, channel_id: u64, _limit: u32) -> Result<Vec<ChannelMessage>> {
            if channel_id == 1 {
                self.release.notified().await;
            }
            Ok(Vec::new())
        }
    }

    fn msg(id: u64, attachments: Vec<(&str, u64)>) -> ChannelMessage {
        let base = Utc::now();
        ChannelMessage {
            id,
            author: "alice".to_string(),
            is_bot: false,
            // Higher ids are newer, matching a newest-first source.
            created_at: base - Duration::minutes(1000 - id as i64),
            attachments: attachments
                .into_iter()
                .map(|(url, size_bytes)| Attachment {
                    url: url.to_string(),
                    size_bytes,
                })
                .collect(),
        }
    }

    fn engine_with(source: Arc<dyn MessageSource>, dir: &Path) -> ScanEngine {
        ScanEngine::new(
            source,
            HistoryStore::open(dir.join("history.json")),
            RecoveryStore::open(dir.join("recovery.json")),
        )
    }

    fn five_messages() -> Vec<ChannelMessage> {
        vec![
            msg(5, vec![("https://host/a/b/photo.jpg", 1_048_576)]),
            msg(4, vec![]),
            msg(3, vec![("https://host/a/b/clip.mp4", 5_242_880)]),
            msg(2, vec![]),
            msg(1, vec![]),
        ]
    }

    #[tokio::test]
    async fn test_count_scan_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![Ok(five_messages())]);
        let engine = engine_with(source, tmp.path());

        let outcome = engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await
            .unwrap();

        let report = match outcome {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };

        assert_eq!(report.messages_scanned, 5);
        assert_eq!(report.processed_total, 5);
        assert_eq!(report.media.count(MediaCategory::Image), 1);
        assert_eq!(report.media.count(MediaCategory::Video), 1);
        assert_eq!(report.media.total_bytes(MediaCategory::Image), 1_048_576);
        assert_eq!(report.media.total_bytes(MediaCategory::Video), 5_242_880);
        assert_eq!(report.media.total_bytes_all(), 6_291_456);

        // History grew by exactly the two URLs.
        assert_eq!(engine.history_stats(7).await.total_scanned, 2);

        // Checkpoint retired, final progress write recorded the full pass.
        assert!(engine.interrupted(7).await.is_none());
        let document: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join("recovery.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(document["7"]["status"], "completed");
        assert_eq!(document["7"]["processed_count"], 5);
        assert_eq!(document["7"]["last_processed_message"], 1);
        assert_eq!(document["7"]["found_media"], 2);
        assert_eq!(document["7"]["scan_type"], "count_based");
    }

    #[tokio::test]
    async fn test_second_scan_finds_nothing_new() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![Ok(five_messages()), Ok(five_messages())]);
        let engine = engine_with(source, tmp.path());

        let params = ScanParams::count_based(Some(5), false);
        engine.start_scan(7, params.clone()).await.unwrap();
        let size_after_first = engine.history_stats(7).await.total_scanned;

        let second = engine.start_scan(7, params).await.unwrap();
        let report = match second {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };

        assert!(report.media.is_empty());
        assert_eq!(report.previously_seen, 2);
        assert_eq!(engine.history_stats(7).await.total_scanned, size_after_first);
    }

    #[tokio::test]
    async fn test_include_seen_rescans_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![Ok(five_messages()), Ok(five_messages())]);
        let engine = engine_with(source, tmp.path());

        engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await
            .unwrap();

        let second = engine
            .start_scan(7, ScanParams::count_based(Some(5), true))
            .await
            .unwrap();
        let report = match second {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(report.media.len(), 2);
    }

    #[tokio::test]
    async fn test_bot_messages_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut messages = five_messages();
        messages[0].is_bot = true;
        let source = QueueSource::new(vec![Ok(messages)]);
        let engine = engine_with(source, tmp.path());

        let outcome = engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await
            .unwrap();
        let report = match outcome {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(report.media.count(MediaCategory::Image), 0);
        assert_eq!(report.media.count(MediaCategory::Video), 1);
    }

    #[tokio::test]
    async fn test_empty_fetch_completes_with_nothing_to_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![Ok(Vec::new())]);
        let engine = engine_with(source, tmp.path());

        let outcome = engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::NothingToScan));
        assert!(engine.interrupted(7).await.is_none());
    }

    #[tokio::test]
    async fn test_time_scan_without_history_is_rejected_without_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![Ok(five_messages())]);
        let engine = engine_with(source, tmp.path());

        let result = engine
            .start_scan(7, ScanParams::time_based(None, false))
            .await;
        assert!(matches!(result, Err(Error::NoHistoryAvailable(7))));

        // Rejected before start_session: no document was ever written.
        assert!(!tmp.path().join("recovery.json").exists());
    }

    #[tokio::test]
    async fn test_time_scan_collects_only_newer_messages() {
        let tmp = tempfile::tempdir().unwrap();

        let mut history = HistoryStore::open(tmp.path().join("history.json"));
        let seeded: HashSet<String> = ["https://host/old/earlier.png".to_string()].into();
        history.record_new_urls(7, &seeded);

        // Two messages newer than the recorded last_scan, three older.
        let now = Utc::now();
        let mut messages = Vec::new();
        for (i, offset) in [1i64, 2].iter().enumerate() {
            let mut message = msg(10 - i as u64, vec![("https://host/a/new.png", 10)]);
            message.created_at = now + Duration::minutes(*offset + 1);
            message.attachments[0].url = format!("https://host/a/new_{}.png", i);
            messages.push(message);
        }
        for (i, offset) in [1i64, 2, 3].iter().enumerate() {
            let mut message = msg(5 - i as u64, vec![]);
            message.created_at = now - Duration::hours(*offset);
            messages.push(message);
        }
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let source = QueueSource::new(vec![Ok(messages)]);
        let engine = ScanEngine::new(
            source,
            history,
            RecoveryStore::open(tmp.path().join("recovery.json")),
        );

        let outcome = engine
            .start_scan(7, ScanParams::time_based(None, false))
            .await
            .unwrap();
        let report = match outcome {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };

        assert_eq!(report.messages_scanned, 2);
        assert_eq!(report.media.len(), 2);
        assert!(report.since.is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_checkpoint_in_progress() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![
            Err(Error::Fetch("connection reset".to_string())),
            Ok(Vec::new()),
        ]);
        let engine = engine_with(source, tmp.path());

        let result = engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await;
        assert!(matches!(result, Err(Error::Fetch(_))));

        // The abort left the checkpoint discoverable for a resume.
        let checkpoint = engine.interrupted(7).await.unwrap();
        assert_eq!(checkpoint.status, CheckpointStatus::InProgress);

        // A new scan is rejected until the recovery is dealt with.
        let result = engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await;
        assert!(matches!(result, Err(Error::UnresolvedRecovery(7))));

        // The lock itself was released: clearing recovery unblocks scans.
        engine.clear_recovery(7).await;
        let outcome = engine
            .start_scan(7, ScanParams::count_based(Some(5), false))
            .await
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::NothingToScan));
    }

    #[tokio::test]
    async fn test_resume_continues_ordinals_and_merges_history() {
        let tmp = tempfile::tempdir().unwrap();

        // 100 messages, ids 100..1, each with one unique attachment.
        let all: Vec<ChannelMessage> = (0..100u64)
            .map(|n| {
                let id = 100 - n;
                msg(id, vec![])
            })
            .map(|mut m| {
                m.attachments.push(Attachment {
                    url: format!("https://host/a/file_{}.png", m.id),
                    size_bytes: 10,
                });
                m
            })
            .collect();

        // Simulate an interruption after 40 processed messages (last id 61),
        // with those 40 URLs already merged into history.
        let mut recovery = RecoveryStore::open(tmp.path().join("recovery.json"));
        recovery.start_session(7, ScanParams::count_based(Some(100), false), Utc::now());
        recovery.update_progress(7, Some(61), 40, 40);

        let mut history = HistoryStore::open(tmp.path().join("history.json"));
        let first_batch: HashSet<String> = (61..=100)
            .map(|id| format!("https://host/a/file_{}.png", id))
            .collect();
        history.record_new_urls(7, &first_batch);

        let source = QueueSource::new(vec![Ok(all)]);
        let engine = ScanEngine::new(source, history, recovery);

        let outcome = engine.resume_scan(7).await.unwrap();
        let report = match outcome {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };

        assert!(report.resumed);
        assert_eq!(report.messages_scanned, 60);
        assert_eq!(report.processed_total, 100);
        assert_eq!(report.media.len(), 60);

        // Ordinals continue from the interrupted prefix; no overlap.
        let names: Vec<&str> = report
            .media
            .items()
            .iter()
            .map(|i| i.file_name.as_str())
            .collect();
        assert!(names[0].starts_with("0041_"));
        assert!(names[59].starts_with("0100_"));

        // 40 pre-interruption URLs + 60 post-resume finds.
        assert_eq!(engine.history_stats(7).await.total_scanned, 100);
        assert!(engine.interrupted(7).await.is_none());
    }

    #[tokio::test]
    async fn test_resume_with_nothing_left_completes_immediately() {
        let tmp = tempfile::tempdir().unwrap();
        let mut recovery = RecoveryStore::open(tmp.path().join("recovery.json"));
        recovery.start_session(7, ScanParams::count_based(Some(40), false), Utc::now());
        recovery.update_progress(7, Some(1), 40, 12);

        let source = QueueSource::new(vec![]);
        let engine = ScanEngine::new(
            source,
            HistoryStore::open(tmp.path().join("history.json")),
            recovery,
        );

        let outcome = engine.resume_scan(7).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::NothingToScan));
        assert!(engine.interrupted(7).await.is_none());
    }

    #[tokio::test]
    async fn test_resume_without_checkpoint_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let source = QueueSource::new(vec![]);
        let engine = engine_with(source, tmp.path());

        let result = engine.resume_scan(7).await;
        assert!(matches!(result, Err(Error::NothingToResume(7))));
    }

    #[tokio::test]
    async fn test_lock_excludes_same_channel_only() {
        let source = Arc::new(BlockingSource {
            release: Notify::new(),
        });
        let tmp = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine_with(
            Arc::clone(&source) as Arc<dyn MessageSource>,
            tmp.path(),
        ));

        let first = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move {
                engine
                    .start_scan(1, ScanParams::count_based(Some(5), false))
                    .await
            }
        });

        // Let the first scan take the lock and block on the source.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let second = engine
            .start_scan(1, ScanParams::count_based(Some(5), false))
            .await;
        assert!(matches!(second, Err(Error::ScanAlreadyActive(1))));

        // A different channel is unaffected.
        let other = engine
            .start_scan(2, ScanParams::count_based(Some(5), false))
            .await
            .unwrap();
        assert!(matches!(other, ScanOutcome::NothingToScan));

        source.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, ScanOutcome::NothingToScan));

        // Lock released after completion: the channel accepts scans again.
        // (Pre-arm the notify so the blocking source lets this pass through.)
        source.release.notify_one();
        let again = engine
            .start_scan(1, ScanParams::count_based(Some(5), false))
            .await;
        assert!(again.is_ok());
    }
}
