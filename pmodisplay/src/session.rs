//! One display session: the ephemeral state behind one rendering surface.
//!
//! A [`DisplaySession`] wires the three engine crates together for a single
//! display view: it resolves a sequence ([`pmoschedule`]), feeds it to a
//! playback engine ([`pmoplayback`]), starts media binding ([`pmomedia`])
//! and composes their watch channels into a stream of [`DisplayFrame`]s.
//! Nothing in here is authoritative: closing the session throws all of it
//! away, and a new session rebuilds itself from the repositories.

use chrono::Local;
use pmobackend::{DEFAULT_SIGNED_URL_EXPIRY_SECS, SignageBackend};
use pmocontent::{ContentId, ContentItem};
use pmomedia::{BinderOptions, MediaBinder, MediaMap};
use pmoplayback::{PlaybackEngine, PlaybackStatus};
use pmoschedule::{ResolveRequest, ScheduleResolver, SequenceSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use utoipa::ToSchema;

use crate::frame::DisplayFrame;

/// Opaque session identity, minted when the session opens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Per-session tuning, wired from configuration by the binary.
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    /// Period of background re-resolution. `None` disables it; manual
    /// refresh stays available either way.
    pub refresh_interval: Option<Duration>,
    /// Validity window requested for signed media URLs.
    pub signed_url_expiry_secs: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            refresh_interval: None,
            signed_url_expiry_secs: DEFAULT_SIGNED_URL_EXPIRY_SECS,
        }
    }
}

/// The playing sequence and where it came from, shared between the session
/// handle and its frame composer.
#[derive(Clone, Debug)]
struct SequenceInfo {
    source: SequenceSource,
    items: Vec<ContentItem>,
}

impl SequenceInfo {
    fn ids(&self) -> Vec<&ContentId> {
        self.items.iter().map(|item| &item.id).collect()
    }
}

/// A live display session.
///
/// Owned by the [`SessionRegistry`](crate::SessionRegistry) and handed to
/// HTTP handlers as an `Arc`. Dropping the last handle cancels the frame
/// composer, the playback timer and any in-flight media resolution — an
/// unmounted display leaves nothing running.
#[derive(Debug)]
pub struct DisplaySession {
    id: SessionId,
    request: ResolveRequest,
    resolver: ScheduleResolver<dyn SignageBackend>,
    engine: PlaybackEngine,
    binder: MediaBinder<dyn SignageBackend>,
    sequence: Arc<watch::Sender<SequenceInfo>>,
    frames: watch::Receiver<DisplayFrame>,
    last_seen: Mutex<Instant>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl DisplaySession {
    /// Resolves, loads and binds, then starts the frame composer. The
    /// returned session already carries a valid first frame.
    pub async fn open(
        backend: Arc<dyn SignageBackend>,
        request: ResolveRequest,
        options: SessionOptions,
    ) -> Arc<Self> {
        let id = SessionId::generate();
        let resolver = ScheduleResolver::new(backend.clone());
        let engine = PlaybackEngine::start();
        let binder = MediaBinder::new(
            backend,
            BinderOptions {
                signed_url_expiry_secs: options.signed_url_expiry_secs,
            },
        );

        let resolved = resolver.resolve(&request, Local::now()).await;
        tracing::info!(
            session = %id,
            screen = %request.screen,
            items = resolved.len(),
            source = ?resolved.source,
            "display session opened"
        );

        let info = SequenceInfo {
            source: resolved.source,
            items: resolved.items,
        };
        binder.bind_sequence(&info.items);

        let expected_len = info.items.len();
        let _ = engine.load(info.items.clone()).await;
        let mut status_rx = engine.subscribe();
        // The load travels over a channel; wait for the engine to pick it
        // up so the first frame shows the sequence, not the idle state.
        let _ = status_rx
            .wait_for(|status| status.sequence_len == expected_len)
            .await;

        let (sequence_tx, sequence_rx) = watch::channel(info);
        let sequence_tx = Arc::new(sequence_tx);
        let media_rx = binder.subscribe();

        let first = {
            let sequence = sequence_rx.borrow();
            DisplayFrame::compose(
                &id,
                &status_rx.borrow(),
                &media_rx.borrow(),
                &sequence.source,
                &sequence.items,
            )
        };
        let (frames_tx, frames_rx) = watch::channel(first);

        let cancel = CancellationToken::new();
        let refresh = options.refresh_interval.map(|every| RefreshTask {
            every,
            resolver: resolver.clone(),
            engine: engine.clone(),
            binder: binder.clone(),
            sequence: sequence_tx.clone(),
            request: request.clone(),
        });
        tokio::spawn(compose_frames(
            id.clone(),
            status_rx,
            media_rx,
            sequence_rx,
            frames_tx,
            refresh,
            cancel.clone(),
        ));

        Arc::new(Self {
            id,
            request,
            resolver,
            engine,
            binder,
            sequence: sequence_tx,
            frames: frames_rx,
            last_seen: Mutex::new(Instant::now()),
            _guard: cancel.clone().drop_guard(),
            cancel,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn request(&self) -> &ResolveRequest {
        &self.request
    }

    /// The most recently composed frame.
    pub fn frame(&self) -> DisplayFrame {
        self.frames.borrow().clone()
    }

    /// A live view of the frame stream.
    pub fn subscribe(&self) -> watch::Receiver<DisplayFrame> {
        self.frames.clone()
    }

    pub async fn toggle_playback(&self) -> pmoplayback::Result<()> {
        self.engine.toggle_playback().await
    }

    pub async fn next(&self) -> pmoplayback::Result<()> {
        self.engine.next().await
    }

    pub async fn previous(&self) -> pmoplayback::Result<()> {
        self.engine.previous().await
    }

    pub async fn jump_to(&self, index: usize) -> pmoplayback::Result<()> {
        self.engine.jump_to(index).await
    }

    /// Records a media element the surface could not load; the item renders
    /// as "unavailable" from the next frame on, with no retry.
    pub fn report_media_error(&self, content_id: ContentId) {
        self.binder.mark_failed(content_id);
    }

    /// Re-runs resolution. The sequence is only swapped (and playback
    /// reset) when the resolved item ids differ from the playing ones, so
    /// a quiet refresh never disturbs the current slide.
    pub async fn refresh(&self) -> bool {
        refresh_sequence(
            &self.resolver,
            &self.engine,
            &self.binder,
            &self.sequence,
            &self.request,
        )
        .await
    }

    /// Marks the session as recently used, deferring idle eviction.
    pub fn touch(&self) {
        *self.last_seen.lock().unwrap() = Instant::now();
    }

    /// Time since the session was last opened, polled or streamed.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().unwrap().elapsed()
    }

    /// Stops the composer and the playback engine. Idempotent; also
    /// implied by dropping the last handle.
    pub async fn close(&self) {
        self.cancel.cancel();
        self.engine.shutdown().await;
        tracing::info!(session = %self.id, "display session closed");
    }
}

struct RefreshTask {
    every: Duration,
    resolver: ScheduleResolver<dyn SignageBackend>,
    engine: PlaybackEngine,
    binder: MediaBinder<dyn SignageBackend>,
    sequence: Arc<watch::Sender<SequenceInfo>>,
    request: ResolveRequest,
}

/// Shared by manual refresh and the background interval.
async fn refresh_sequence(
    resolver: &ScheduleResolver<dyn SignageBackend>,
    engine: &PlaybackEngine,
    binder: &MediaBinder<dyn SignageBackend>,
    sequence: &watch::Sender<SequenceInfo>,
    request: &ResolveRequest,
) -> bool {
    let resolved = resolver.resolve(request, Local::now()).await;
    let unchanged = sequence.borrow().ids() == resolved.ids();

    // Bind either way: ids may be unchanged while an earlier bind predates
    // a media item turning resolvable. Settled ids are skipped inside.
    binder.bind_sequence(&resolved.items);

    if unchanged {
        tracing::debug!(items = resolved.len(), "refresh kept the playing sequence");
        return false;
    }

    tracing::info!(
        items = resolved.len(),
        source = ?resolved.source,
        "refresh swapped the playing sequence"
    );
    let _ = engine.load(resolved.items.clone()).await;
    let _ = sequence.send(SequenceInfo {
        source: resolved.source,
        items: resolved.items,
    });
    true
}

/// The composer task: recombines playback status, media outcomes and the
/// sequence into a frame whenever any of them changes, and runs the
/// optional periodic refresh.
async fn compose_frames(
    id: SessionId,
    mut status_rx: watch::Receiver<PlaybackStatus>,
    mut media_rx: watch::Receiver<MediaMap>,
    mut sequence_rx: watch::Receiver<SequenceInfo>,
    frames: watch::Sender<DisplayFrame>,
    refresh: Option<RefreshTask>,
    cancel: CancellationToken,
) {
    let mut interval = refresh.as_ref().map(|task| {
        let mut interval = tokio::time::interval_at(Instant::now() + task.every, task.every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval
    });

    loop {
        let publish = tokio::select! {
            _ = cancel.cancelled() => break,
            changed = status_rx.changed() => changed.is_ok().then_some(true),
            changed = media_rx.changed() => changed.is_ok().then_some(true),
            changed = sequence_rx.changed() => changed.is_ok().then_some(true),
            _ = tick(&mut interval) => {
                if let Some(task) = &refresh {
                    // A swap shows up as a sequence_rx change on the next
                    // iteration; nothing to publish here.
                    refresh_sequence(
                        &task.resolver,
                        &task.engine,
                        &task.binder,
                        &task.sequence,
                        &task.request,
                    )
                    .await;
                }
                Some(false)
            }
        };

        let publish = match publish {
            // A source channel closed: the engine or binder is gone, the
            // session is being torn down.
            None => break,
            Some(publish) => publish,
        };
        if !publish {
            continue;
        }

        let frame = {
            let sequence = sequence_rx.borrow_and_update();
            DisplayFrame::compose(
                &id,
                &status_rx.borrow_and_update(),
                &media_rx.borrow_and_update(),
                &sequence.source,
                &sequence.items,
            )
        };
        if frames.send(frame).is_err() {
            break;
        }
    }

    tracing::debug!(session = %id, "frame composer stopped");
}

async fn tick(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
