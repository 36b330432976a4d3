//! Day-flip broadcasts
//!
//! Once per day, right after the flip, the cron surface asks the notifier
//! to look at yesterday and post whatever it finds noteworthy: who held the
//! billboard, a record incentive pool, an unusually busy day. Posting is
//! best effort; a failed broadcast is logged and dropped, never retried,
//! because the next flip brings fresher news anyway.

use async_trait::async_trait;
use sigil_core::constants::{HIGH_CHECKIN_THRESHOLD, RECORD_INCENTIVE_FLOOR};
use sigil_core::{format_sol, EpochDay, Result};
use sigil_ledger::LedgerStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Outbound channel for broadcast text
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
}

/// Broadcaster that writes posts to the log
///
/// The default wiring. A real social channel implements [`Broadcaster`]
/// and slots in at node construction.
pub struct LogBroadcaster;

#[async_trait]
impl Broadcaster for LogBroadcaster {
    async fn send_text(&self, text: &str) -> Result<()> {
        info!(post = %text, "broadcast");
        Ok(())
    }
}

/// What a notify run posted
#[derive(Clone, Debug)]
pub struct NotifySummary {
    /// Names of the events that went out, in posting order
    pub posted: Vec<String>,
    pub today: EpochDay,
    pub yesterday: EpochDay,
}

/// Builds and posts the day-flip announcements
pub struct DayNotifier {
    store: Arc<dyn LedgerStore>,
    broadcaster: Arc<dyn Broadcaster>,
    domain: String,
}

impl DayNotifier {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        broadcaster: Arc<dyn Broadcaster>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            domain: domain.into(),
        }
    }

    /// Post announcements about yesterday.
    ///
    /// Three candidate events, checked in a fixed order: the billboard
    /// handoff, a record incentive pool, a high check-in count. Each posts
    /// independently; one failure never blocks the others.
    pub async fn notify_day_flip(&self) -> Result<NotifySummary> {
        let today = EpochDay::today();
        let yesterday = today.prev();
        let mut posted = Vec::new();

        if let Some(claim) = self.store.get_day_claim(yesterday).await? {
            let text = format!(
                "Day {yesterday} billboard by {who}... ({sol} SOL incentive).\n\nToday's billboard is open — claim it at {domain}",
                who = claim.claimer.short(),
                sol = format_sol(claim.incentive_lamports),
                domain = self.domain,
            );
            self.post(&text, "day_flip", &mut posted).await;
        }

        if let Some(top) = self.store.top_incentive_claim().await? {
            if top.day == yesterday && top.incentive_lamports >= RECORD_INCENTIVE_FLOOR {
                let text = format!(
                    "New record! Day {yesterday} set the highest incentive ever on Sigil: {sol} SOL.\n\n{domain}",
                    sol = format_sol(top.incentive_lamports),
                    domain = self.domain,
                );
                self.post(&text, "record_incentive", &mut posted).await;
            }
        }

        let count = self.store.count_check_ins(yesterday).await?;
        if count >= HIGH_CHECKIN_THRESHOLD {
            let text = format!(
                "{count} holders checked in on Day {yesterday}. The Sigil community is active.\n\n{domain}",
                domain = self.domain,
            );
            self.post(&text, "high_checkins", &mut posted).await;
        }

        info!(day = %yesterday, posted = posted.len(), "day-flip notify run complete");

        Ok(NotifySummary {
            posted,
            today,
            yesterday,
        })
    }

    async fn post(&self, text: &str, event: &str, posted: &mut Vec<String>) {
        match self.broadcaster.send_text(text).await {
            Ok(()) => posted.push(event.to_string()),
            Err(err) => warn!(event, %err, "broadcast failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::{SigilError, WalletId};
    use sigil_ledger::{MemoryLedger, NewCheckIn, NewDayClaim};
    use std::sync::Mutex;

    struct RecordingBoard {
        posts: Mutex<Vec<String>>,
    }

    impl RecordingBoard {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                posts: Mutex::new(Vec::new()),
            })
        }

        fn posts(&self) -> Vec<String> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Broadcaster for RecordingBoard {
        async fn send_text(&self, text: &str) -> Result<()> {
            self.posts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct DeadBoard;

    #[async_trait]
    impl Broadcaster for DeadBoard {
        async fn send_text(&self, _text: &str) -> Result<()> {
            Err(SigilError::Chain("socket closed".into()))
        }
    }

    fn notifier(
        store: Arc<MemoryLedger>,
        board: Arc<dyn Broadcaster>,
    ) -> DayNotifier {
        DayNotifier::new(store, board, "sigil.bond")
    }

    async fn seed_claim(store: &MemoryLedger, day: EpochDay, lamports: u64) {
        store
            .upsert_day_claim(NewDayClaim {
                day,
                claimer: WalletId::new("4Nd1mYbcFQTUVhCkGGTnkSqvg2Bp8PGoLCoM1yTDsHFu"),
                incentive_lamports: lamports,
            })
            .await
            .unwrap();
    }

    async fn seed_check_ins(store: &MemoryLedger, day: EpochDay, count: u64) {
        for i in 0..count {
            store
                .insert_check_in(NewCheckIn {
                    day,
                    wallet: WalletId::new(format!("holder-{i}")),
                    weight: 1,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_day_flip_posts_billboard_handoff() {
        let store = Arc::new(MemoryLedger::new());
        let yesterday = EpochDay::today().prev();
        seed_claim(&store, yesterday, 150_000_000).await;

        let board = RecordingBoard::new();
        let summary = notifier(Arc::clone(&store), board.clone())
            .notify_day_flip()
            .await
            .unwrap();

        assert_eq!(summary.posted, vec!["day_flip"]);
        assert_eq!(summary.yesterday, yesterday);

        let posts = board.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("4Nd1mYbc..."));
        assert!(posts[0].contains("0.15 SOL"));
        assert!(posts[0].contains("sigil.bond"));
    }

    #[tokio::test]
    async fn test_record_incentive_fires_only_for_yesterday() {
        let store = Arc::new(MemoryLedger::new());
        let yesterday = EpochDay::today().prev();
        seed_claim(&store, yesterday, 500_000_000).await;

        let board = RecordingBoard::new();
        let summary = notifier(Arc::clone(&store), board.clone())
            .notify_day_flip()
            .await
            .unwrap();
        assert_eq!(summary.posted, vec!["day_flip", "record_incentive"]);
        assert!(board.posts()[1].contains("New record!"));
        assert!(board.posts()[1].contains("0.50 SOL"));

        // A bigger pool on an older day owns the record; yesterday stays quiet.
        let store = Arc::new(MemoryLedger::new());
        seed_claim(&store, yesterday, 500_000_000).await;
        store
            .upsert_day_claim(NewDayClaim {
                day: EpochDay::new(yesterday.index() - 10),
                claimer: WalletId::new("earlier-whale"),
                incentive_lamports: 9_000_000_000,
            })
            .await
            .unwrap();

        let board = RecordingBoard::new();
        let summary = notifier(store, board.clone()).notify_day_flip().await.unwrap();
        assert_eq!(summary.posted, vec!["day_flip"]);
    }

    #[tokio::test]
    async fn test_record_needs_the_floor() {
        let store = Arc::new(MemoryLedger::new());
        let yesterday = EpochDay::today().prev();
        // Highest ever, but under 0.5 SOL
        seed_claim(&store, yesterday, 499_999_999).await;

        let board = RecordingBoard::new();
        let summary = notifier(store, board).notify_day_flip().await.unwrap();
        assert_eq!(summary.posted, vec!["day_flip"]);
    }

    #[tokio::test]
    async fn test_high_checkins_threshold() {
        let store = Arc::new(MemoryLedger::new());
        let yesterday = EpochDay::today().prev();
        seed_check_ins(&store, yesterday, 50).await;

        let board = RecordingBoard::new();
        let summary = notifier(Arc::clone(&store), board.clone())
            .notify_day_flip()
            .await
            .unwrap();
        assert_eq!(summary.posted, vec!["high_checkins"]);
        assert!(board.posts()[0].starts_with("50 holders checked in on Day"));

        let store = Arc::new(MemoryLedger::new());
        seed_check_ins(&store, yesterday, 49).await;
        let board = RecordingBoard::new();
        let summary = notifier(store, board).notify_day_flip().await.unwrap();
        assert!(summary.posted.is_empty());
    }

    #[tokio::test]
    async fn test_quiet_day_posts_nothing() {
        let store = Arc::new(MemoryLedger::new());
        let board = RecordingBoard::new();
        let summary = notifier(store, board.clone()).notify_day_flip().await.unwrap();

        assert!(summary.posted.is_empty());
        assert!(board.posts().is_empty());
        assert_eq!(summary.today, summary.yesterday.next());
    }

    #[tokio::test]
    async fn test_failed_broadcast_is_not_counted() {
        let store = Arc::new(MemoryLedger::new());
        let yesterday = EpochDay::today().prev();
        seed_claim(&store, yesterday, 1_000_000_000).await;
        seed_check_ins(&store, yesterday, 60).await;

        let summary = notifier(store, Arc::new(DeadBoard))
            .notify_day_flip()
            .await
            .unwrap();
        assert!(summary.posted.is_empty());
    }
}
