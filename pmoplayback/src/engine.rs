//! The tokio driver around [`PlayerState`].
//!
//! One spawned task owns the state. Commands arrive on an mpsc channel,
//! status snapshots leave on a watch channel, and the display timer is a
//! single `sleep_until` deadline local to the driver loop. The deadline is
//! recomputed from scratch on every iteration, so there is never more than
//! one armed timer and a command arriving mid-wait implicitly cancels it —
//! no explicit timer bookkeeping, no stale advance can fire.

use chrono::{DateTime, Utc};
use pmocontent::ContentItem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{PlaybackError, Result};
use crate::state::{PlaybackState, PlayerState};

const COMMAND_BUFFER: usize = 32;

/// One observable snapshot of the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current_index: usize,
    pub sequence_len: usize,
    pub current: Option<ContentItem>,
    /// When the current item went on air.
    pub entered_at: DateTime<Utc>,
    /// Full display time of the current item, not the remaining time.
    pub item_duration_secs: Option<u32>,
}

impl PlaybackStatus {
    fn idle() -> Self {
        Self {
            state: PlaybackState::Idle,
            current_index: 0,
            sequence_len: 0,
            current: None,
            entered_at: Utc::now(),
            item_duration_secs: None,
        }
    }
}

#[derive(Debug)]
enum Command {
    Load(Vec<ContentItem>),
    Toggle,
    Next,
    Previous,
    JumpTo(usize, oneshot::Sender<Result<()>>),
    Shutdown,
}

/// Handle to a running playback engine.
///
/// Clones share the same engine. The driver task stops when `shutdown` is
/// called or when the last handle is dropped; either way the armed timer
/// dies with it.
#[derive(Clone, Debug)]
pub struct PlaybackEngine {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<PlaybackStatus>,
    _guard: Arc<DropGuard>,
}

impl PlaybackEngine {
    /// Spawns the driver task and returns its handle.
    pub fn start() -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(PlaybackStatus::idle());
        let cancel = CancellationToken::new();

        tokio::spawn(run(command_rx, status_tx, cancel.clone()));

        Self {
            commands: command_tx,
            status: status_rx,
            _guard: Arc::new(cancel.drop_guard()),
        }
    }

    /// Replaces the playing sequence; playback restarts at the first item.
    pub async fn load(&self, items: Vec<ContentItem>) -> Result<()> {
        self.send(Command::Load(items)).await
    }

    /// Flips playing/paused. Resuming restarts the current item's full
    /// display time.
    pub async fn toggle_playback(&self) -> Result<()> {
        self.send(Command::Toggle).await
    }

    /// Manual step forward, wrapping at the end.
    pub async fn next(&self) -> Result<()> {
        self.send(Command::Next).await
    }

    /// Manual step backward, wrapping at the start.
    pub async fn previous(&self) -> Result<()> {
        self.send(Command::Previous).await
    }

    /// Moves to `index`, or reports `IndexOutOfRange` without moving.
    pub async fn jump_to(&self, index: usize) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::JumpTo(index, reply_tx)).await?;
        reply_rx.await.map_err(|_| PlaybackError::EngineClosed)?
    }

    /// A live view of the engine's status.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }

    /// The most recently published status.
    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    /// Stops the driver task after the commands already queued.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::EngineClosed)
    }
}

async fn run(
    mut commands: mpsc::Receiver<Command>,
    status: watch::Sender<PlaybackStatus>,
    cancel: CancellationToken,
) {
    let mut state = PlayerState::new();
    // Wall-clock twin of `entered_instant`, only for reporting.
    let mut entered_at = Utc::now();
    let mut entered_instant = Instant::now();

    loop {
        // A deadline exists iff playing a multi-item sequence: a single
        // item cannot change the picture by advancing, so no timer is
        // armed for it.
        let deadline = match (state.state(), state.current()) {
            (PlaybackState::Playing, Some(item)) if state.len() > 1 => {
                Some(entered_instant + Duration::from_secs(u64::from(item.duration_secs)))
            }
            _ => None,
        };

        tokio::select! {
            _ = cancel.cancelled() => break,

            command = commands.recv() => {
                let entered_new_item = match command {
                    None | Some(Command::Shutdown) => break,
                    Some(Command::Load(items)) => {
                        tracing::info!(items = items.len(), "loading sequence");
                        state.load(items);
                        true
                    }
                    Some(Command::Toggle) => {
                        let flipped = state.toggle();
                        // Resuming restarts the full display time.
                        flipped && state.state() == PlaybackState::Playing
                    }
                    Some(Command::Next) => state.next(),
                    Some(Command::Previous) => state.previous(),
                    Some(Command::JumpTo(index, reply)) => {
                        let result = state.jump_to(index);
                        let moved = result.is_ok();
                        let _ = reply.send(result);
                        moved
                    }
                };
                if entered_new_item {
                    entered_at = Utc::now();
                    entered_instant = Instant::now();
                }
                publish(&status, &state, entered_at);
            }

            _ = sleep_or_pend(deadline) => {
                state.advance();
                entered_at = Utc::now();
                entered_instant = Instant::now();
                tracing::debug!(index = state.current_index(), "display time elapsed, advancing");
                publish(&status, &state, entered_at);
            }
        }
    }

    tracing::debug!("playback engine stopped");
}

async fn sleep_or_pend(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn publish(status: &watch::Sender<PlaybackStatus>, state: &PlayerState, entered_at: DateTime<Utc>) {
    let _ = status.send(PlaybackStatus {
        state: state.state(),
        current_index: state.current_index(),
        sequence_len: state.len(),
        current: state.current().cloned(),
        entered_at,
        item_duration_secs: state.current().map(|item| item.duration_secs),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmocontent::{ContentId, ContentPayload, TextSlide};
    use tokio::time::advance;

    fn timed(id: &str, secs: u32) -> ContentItem {
        ContentItem {
            id: ContentId::from(id),
            title: id.to_string(),
            payload: ContentPayload::Text(TextSlide::new(id)),
            duration_secs: secs,
            is_active: true,
            created_at: DateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_walks_each_duration_exactly() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine
            .load(vec![timed("a", 5), timed("b", 3), timed("c", 7)])
            .await
            .unwrap();
        rx.wait_for(|s| s.sequence_len == 3).await.unwrap();
        assert_eq!(engine.status().current_index, 0);

        advance(Duration::from_secs(4)).await;
        assert_eq!(engine.status().current_index, 0, "a stays up its full 5 s");

        advance(Duration::from_secs(1)).await;
        rx.wait_for(|s| s.current_index == 1).await.unwrap();

        advance(Duration::from_secs(3)).await;
        rx.wait_for(|s| s.current_index == 2).await.unwrap();

        advance(Duration::from_secs(7)).await;
        let wrapped = rx.wait_for(|s| s.current_index == 0).await.unwrap().clone();
        assert_eq!(wrapped.state, PlaybackState::Playing);
        assert_eq!(wrapped.current.unwrap().id.as_str(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_and_resume_restarts_the_full_duration() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine.load(vec![timed("a", 5), timed("b", 3)]).await.unwrap();
        rx.wait_for(|s| s.sequence_len == 2).await.unwrap();

        engine.toggle_playback().await.unwrap();
        rx.wait_for(|s| s.state == PlaybackState::Paused).await.unwrap();

        advance(Duration::from_secs(300)).await;
        assert_eq!(engine.status().current_index, 0, "paused screens hold their item");

        engine.toggle_playback().await.unwrap();
        rx.wait_for(|s| s.state == PlaybackState::Playing).await.unwrap();

        advance(Duration::from_secs(4)).await;
        assert_eq!(
            engine.status().current_index,
            0,
            "resume grants the item its full 5 s again"
        );
        advance(Duration::from_secs(1)).await;
        rx.wait_for(|s| s.current_index == 1).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn navigating_while_paused_keeps_the_pause() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine
            .load(vec![timed("a", 5), timed("b", 3), timed("c", 7)])
            .await
            .unwrap();
        rx.wait_for(|s| s.sequence_len == 3).await.unwrap();

        engine.toggle_playback().await.unwrap();
        engine.next().await.unwrap();
        let status = rx.wait_for(|s| s.current_index == 1).await.unwrap().clone();
        assert_eq!(status.state, PlaybackState::Paused);

        advance(Duration::from_secs(300)).await;
        assert_eq!(engine.status().current_index, 1, "no timer runs while paused");

        engine.previous().await.unwrap();
        let status = rx.wait_for(|s| s.current_index == 0).await.unwrap().clone();
        assert_eq!(status.state, PlaybackState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn single_item_sequences_never_rearm_the_timer() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine.load(vec![timed("only", 1)]).await.unwrap();
        rx.wait_for(|s| s.sequence_len == 1).await.unwrap();

        advance(Duration::from_secs(600)).await;
        let status = engine.status();
        assert_eq!(status.current_index, 0);
        assert_eq!(status.state, PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn jump_resets_the_timer_and_rejects_bad_indices() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine
            .load(vec![timed("a", 5), timed("b", 3), timed("c", 7)])
            .await
            .unwrap();
        rx.wait_for(|s| s.sequence_len == 3).await.unwrap();

        let err = engine.jump_to(5).await.unwrap_err();
        assert_eq!(err, PlaybackError::IndexOutOfRange { index: 5, len: 3 });
        assert_eq!(engine.status().current_index, 0);

        engine.jump_to(2).await.unwrap();
        rx.wait_for(|s| s.current_index == 2).await.unwrap();

        advance(Duration::from_secs(6)).await;
        assert_eq!(engine.status().current_index, 2, "c runs its full 7 s");
        advance(Duration::from_secs(1)).await;
        rx.wait_for(|s| s.current_index == 0).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_load_goes_idle_and_stays_responsive() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine.load(vec![timed("a", 5), timed("b", 3)]).await.unwrap();
        rx.wait_for(|s| s.sequence_len == 2).await.unwrap();

        engine.load(Vec::new()).await.unwrap();
        let status = rx.wait_for(|s| s.sequence_len == 0).await.unwrap().clone();
        assert_eq!(status.state, PlaybackState::Idle);
        assert!(status.current.is_none());
        assert!(status.item_duration_secs.is_none());

        advance(Duration::from_secs(60)).await;

        engine.load(vec![timed("fresh", 2)]).await.unwrap();
        let status = rx.wait_for(|s| s.sequence_len == 1).await.unwrap().clone();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.current.unwrap().id.as_str(), "fresh");
    }

    #[tokio::test]
    async fn shutdown_closes_the_engine() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        engine.shutdown().await;

        // The status sender drops when the task ends.
        while rx.changed().await.is_ok() {}

        let err = engine.load(Vec::new()).await.unwrap_err();
        assert_eq!(err, PlaybackError::EngineClosed);
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_task() {
        let engine = PlaybackEngine::start();
        let mut rx = engine.subscribe();
        drop(engine);

        tokio::time::timeout(Duration::from_secs(5), async {
            while rx.changed().await.is_ok() {}
        })
        .await
        .expect("driver task should stop once the last handle is gone");
    }
}
