//! Spam tracker: per-user map of channels posted in during the current epoch.
//!
//! Every state change runs under one lock acquisition, so the threshold check
//! and the eviction it causes can never be split by a concurrent observation
//! or a sweep.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use sidebot_core::{ChannelId, MessageId, UserId};

/// One observed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageRef {
    pub message_id: MessageId,
}

/// Messages one user sent in one channel, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelActivity {
    pub channel_id: ChannelId,
    pub messages: Vec<MessageRef>,
}

impl ChannelActivity {
    fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            messages: vec![MessageRef { message_id }],
        }
    }

    pub fn message_ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.message_id).collect()
    }
}

/// Everything tracked for one user in the current epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub user_id: UserId,
    channels: HashMap<ChannelId, ChannelActivity>,
}

impl UserActivity {
    fn new(user_id: UserId, channel_id: ChannelId, message_id: MessageId) -> Self {
        let mut channels = HashMap::new();
        channels.insert(channel_id, ChannelActivity::new(channel_id, message_id));
        Self { user_id, channels }
    }

    /// Append to an existing channel or start tracking a new one.
    fn record(&mut self, channel_id: ChannelId, message_id: MessageId) {
        match self.channels.entry(channel_id) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().messages.push(MessageRef { message_id });
            }
            Entry::Vacant(slot) => {
                slot.insert(ChannelActivity::new(channel_id, message_id));
            }
        }
    }

    /// Distinct channels (the fan-out).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn message_count(&self) -> usize {
        self.channels.values().map(|c| c.messages.len()).sum()
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&ChannelActivity> {
        self.channels.get(&channel_id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelActivity> {
        self.channels.values()
    }
}

/// Outcome of observing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    NoAction,
    /// The user crossed the threshold and was evicted; this is their record
    /// as of eviction.
    Triggered(UserActivity),
}

/// In-memory tracker of per-user channel fan-out.
pub struct SpamTracker {
    channels_max: usize,
    users: Mutex<HashMap<UserId, UserActivity>>,
}

impl SpamTracker {
    pub fn new(channels_max: usize) -> Self {
        Self {
            channels_max,
            users: Mutex::new(HashMap::new()),
        }
    }

    pub fn channels_max(&self) -> usize {
        self.channels_max
    }

    /// Record one message and evict the user if their fan-out reached the
    /// threshold.
    ///
    /// A user seen for the first time is never triggered on that message.
    pub async fn observe(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> TriggerDecision {
        let mut users = self.users.lock().await;

        let activity = match users.entry(user_id) {
            Entry::Vacant(slot) => {
                slot.insert(UserActivity::new(user_id, channel_id, message_id));
                debug!(user_id = %user_id, channel_id = %channel_id, "Tracking new user");
                return TriggerDecision::NoAction;
            }
            Entry::Occupied(mut existing) => {
                existing.get_mut().record(channel_id, message_id);
                let fan_out = existing.get().channel_count();
                if fan_out < self.channels_max {
                    debug!(
                        user_id = %user_id,
                        channel_id = %channel_id,
                        fan_out,
                        "Recorded message"
                    );
                    return TriggerDecision::NoAction;
                }
                existing.remove()
            }
        };

        info!(
            user_id = %user_id,
            channels = activity.channel_count(),
            messages = activity.message_count(),
            "Channel fan-out threshold reached, user evicted"
        );
        TriggerDecision::Triggered(activity)
    }

    /// Drop every user record. Returns how many users were cleared.
    pub async fn reset_all(&self) -> usize {
        let mut users = self.users.lock().await;
        let cleared = users.len();
        users.clear();
        debug!(cleared, "Spam tracker reset");
        cleared
    }

    pub async fn get_user(&self, user_id: UserId) -> Option<UserActivity> {
        self.users.lock().await.get(&user_id).cloned()
    }

    pub async fn get_channel(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Option<ChannelActivity> {
        self.users
            .lock()
            .await
            .get(&user_id)
            .and_then(|user| user.channel(channel_id))
            .cloned()
    }

    /// Number of users currently tracked.
    pub async fn tracked_users(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const U1: UserId = UserId::new(1001);
    const U2: UserId = UserId::new(1002);

    fn ch(id: u64) -> ChannelId {
        ChannelId::new(id)
    }

    fn msg(id: u64) -> MessageId {
        MessageId::new(id)
    }

    #[tokio::test]
    async fn triggers_once_at_threshold_then_starts_fresh() {
        let tracker = SpamTracker::new(4);

        for (i, channel) in [1, 2, 3].into_iter().enumerate() {
            let decision = tracker.observe(U1, ch(channel), msg(i as u64 + 1)).await;
            assert_eq!(decision, TriggerDecision::NoAction);
        }

        let TriggerDecision::Triggered(snapshot) = tracker.observe(U1, ch(4), msg(4)).await else {
            panic!("fourth distinct channel must trigger");
        };
        assert_eq!(snapshot.user_id, U1);
        assert_eq!(snapshot.channel_count(), 4);
        for (channel, message) in [(1, 1), (2, 2), (3, 3), (4, 4)] {
            let activity = snapshot.channel(ch(channel)).unwrap();
            assert_eq!(activity.message_ids(), vec![msg(message)]);
        }
        assert!(tracker.get_user(U1).await.is_none());

        // Next message is a brand-new first observation.
        assert_eq!(
            tracker.observe(U1, ch(1), msg(5)).await,
            TriggerDecision::NoAction
        );
        let user = tracker.get_user(U1).await.unwrap();
        assert_eq!(user.channel_count(), 1);
        assert_eq!(user.channel(ch(1)).unwrap().message_ids(), vec![msg(5)]);
    }

    #[tokio::test]
    async fn repeated_channel_only_grows_message_list() {
        let tracker = SpamTracker::new(2);

        for id in 1..=10 {
            assert_eq!(
                tracker.observe(U1, ch(7), msg(id)).await,
                TriggerDecision::NoAction
            );
        }

        let user = tracker.get_user(U1).await.unwrap();
        assert_eq!(user.channel_count(), 1);
        let channel = tracker.get_channel(U1, ch(7)).await.unwrap();
        assert_eq!(channel.message_ids(), (1..=10).map(msg).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn snapshot_keeps_every_accumulated_message() {
        let tracker = SpamTracker::new(3);
        tracker.observe(U1, ch(1), msg(1)).await;
        tracker.observe(U1, ch(1), msg(2)).await;
        tracker.observe(U1, ch(2), msg(3)).await;

        let TriggerDecision::Triggered(snapshot) = tracker.observe(U1, ch(3), msg(4)).await else {
            panic!("third distinct channel must trigger");
        };
        assert_eq!(snapshot.message_count(), 4);
        assert_eq!(snapshot.channel(ch(1)).unwrap().message_ids(), vec![msg(1), msg(2)]);
    }

    #[tokio::test]
    async fn users_do_not_affect_each_other() {
        let tracker = SpamTracker::new(3);

        tracker.observe(U1, ch(1), msg(1)).await;
        tracker.observe(U2, ch(2), msg(2)).await;
        tracker.observe(U1, ch(2), msg(3)).await;
        tracker.observe(U2, ch(3), msg(4)).await;

        let TriggerDecision::Triggered(snapshot) = tracker.observe(U1, ch(3), msg(5)).await else {
            panic!("U1 reached three channels");
        };
        assert_eq!(snapshot.user_id, U1);

        let u2 = tracker.get_user(U2).await.unwrap();
        assert_eq!(u2.channel_count(), 2);
        assert_eq!(tracker.tracked_users().await, 1);
    }

    #[tokio::test]
    async fn reset_all_behaves_like_fresh_tracker() {
        let tracker = SpamTracker::new(3);
        tracker.observe(U1, ch(1), msg(1)).await;
        tracker.observe(U1, ch(2), msg(2)).await;
        tracker.observe(U2, ch(1), msg(3)).await;

        assert_eq!(tracker.reset_all().await, 2);

        assert!(tracker.get_user(U1).await.is_none());
        assert!(tracker.get_user(U2).await.is_none());
        assert_eq!(tracker.tracked_users().await, 0);

        // A third channel would have triggered before the reset.
        assert_eq!(tracker.observe(U1, ch(3), msg(4)).await, TriggerDecision::NoAction);
        assert_eq!(tracker.observe(U1, ch(4), msg(5)).await, TriggerDecision::NoAction);
        assert_eq!(tracker.get_user(U1).await.unwrap().channel_count(), 2);
    }

    #[tokio::test]
    async fn get_channel_reports_missing_entries() {
        let tracker = SpamTracker::new(4);
        assert!(tracker.get_channel(U1, ch(1)).await.is_none());

        tracker.observe(U1, ch(1), msg(1)).await;
        assert!(tracker.get_channel(U1, ch(2)).await.is_none());
        assert!(tracker.get_channel(U2, ch(1)).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_observations_trigger_exactly_once() {
        let tracker = Arc::new(SpamTracker::new(4));
        tracker.observe(U1, ch(1), msg(1)).await;

        let mut tasks = tokio::task::JoinSet::new();
        for channel in 2..=9u64 {
            let tracker = Arc::clone(&tracker);
            tasks.spawn(async move { tracker.observe(U1, ch(channel), msg(channel)).await });
        }

        let mut triggered = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let TriggerDecision::Triggered(snapshot) = joined.unwrap() {
                triggered.push(snapshot);
            }
        }

        // Nine distinct channels in any order: two crossings of four, one left over.
        assert_eq!(triggered.len(), 2);
        for snapshot in &triggered {
            assert_eq!(snapshot.channel_count(), 4);
        }
        let tracked = tracker.get_user(U1).await.unwrap();
        assert_eq!(tracked.channel_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn resets_racing_observations_never_leave_user_over_threshold() {
        for round in 0..50u64 {
            let tracker = Arc::new(SpamTracker::new(4));
            tracker.observe(U1, ch(1), msg(1)).await;

            let mut observers = tokio::task::JoinSet::new();
            for channel in 2..=4u64 {
                let tracker = Arc::clone(&tracker);
                observers.spawn(async move {
                    tracker.observe(U1, ch(channel), msg(round * 10 + channel)).await
                });
            }
            let mut sweeps = tokio::task::JoinSet::new();
            for _ in 0..3 {
                let tracker = Arc::clone(&tracker);
                sweeps.spawn(async move { tracker.reset_all().await });
            }

            let mut triggered = Vec::new();
            while let Some(joined) = observers.join_next().await {
                if let TriggerDecision::Triggered(snapshot) = joined.unwrap() {
                    triggered.push(snapshot);
                }
            }
            while let Some(joined) = sweeps.join_next().await {
                joined.unwrap();
            }

            // Four channels in total: at most one crossing, and never a partial one.
            assert!(triggered.len() <= 1, "round {round}: triggered {}", triggered.len());
            for snapshot in &triggered {
                assert_eq!(snapshot.channel_count(), 4);
            }
            if let Some(user) = tracker.get_user(U1).await {
                assert!(user.channel_count() < tracker.channels_max());
            }
        }
    }
}
