//! The concurrent resolution driver.

use pmobackend::{DEFAULT_SIGNED_URL_EXPIRY_SECS, SignedUrlProvider};
use pmocontent::{ContentId, ContentItem};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::map::MediaMap;

/// Tuning knobs for a [`MediaBinder`].
#[derive(Clone, Copy, Debug)]
pub struct BinderOptions {
    /// Validity window requested for signed URLs, in seconds.
    pub signed_url_expiry_secs: u32,
}

impl Default for BinderOptions {
    fn default() -> Self {
        Self {
            signed_url_expiry_secs: DEFAULT_SIGNED_URL_EXPIRY_SECS,
        }
    }
}

/// Resolves fetchable URLs for the media items of a sequence.
///
/// Per item: `storage_path` goes through the provider's signing endpoint;
/// on refusal the payload's literal URL is used instead; an item with
/// neither is flagged failed. Each item resolves in its own spawned task,
/// merging into the shared [`MediaMap`] as it lands, so a slow or broken
/// item never holds up its siblings.
///
/// Clones share one map and one set of in-flight tasks. Dropping the last
/// handle cancels whatever is still running.
#[derive(Debug)]
pub struct MediaBinder<P: ?Sized> {
    provider: Arc<P>,
    options: BinderOptions,
    map: Arc<watch::Sender<MediaMap>>,
    in_flight: Arc<Mutex<HashSet<ContentId>>>,
    cancel: CancellationToken,
    _guard: Arc<DropGuard>,
}

impl<P: ?Sized> Clone for MediaBinder<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            options: self.options,
            map: self.map.clone(),
            in_flight: self.in_flight.clone(),
            cancel: self.cancel.clone(),
            _guard: self._guard.clone(),
        }
    }
}

impl<P: SignedUrlProvider + ?Sized + 'static> MediaBinder<P> {
    pub fn new(provider: Arc<P>, options: BinderOptions) -> Self {
        let (map_tx, _) = watch::channel(MediaMap::default());
        let cancel = CancellationToken::new();
        Self {
            provider,
            options,
            map: Arc::new(map_tx),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            _guard: Arc::new(cancel.clone().drop_guard()),
            cancel,
        }
    }

    /// Starts resolution for every media item of `items` without an outcome
    /// yet.
    ///
    /// Safe to call again with an overlapping sequence: settled and
    /// in-flight ids are skipped, so rebinding never re-requests anything.
    /// Text and markup items are ignored.
    pub fn bind_sequence(&self, items: &[ContentItem]) {
        for item in items {
            if !item.is_media() || self.map.borrow().settled(&item.id) {
                continue;
            }

            let storage_path = item.storage_path().map(str::to_owned);
            let literal_url = item.literal_url().map(str::to_owned);
            if storage_path.is_none() && literal_url.is_none() {
                tracing::warn!(id = %item.id, title = %item.title, "media item has no source");
                self.map.send_modify(|current| {
                    current.failed.insert(item.id.clone());
                });
                continue;
            }

            if !self.in_flight.lock().unwrap().insert(item.id.clone()) {
                continue;
            }

            let provider = self.provider.clone();
            let id = item.id.clone();
            let expiry_secs = self.options.signed_url_expiry_secs;
            let map = self.map.clone();
            let in_flight = self.in_flight.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => None,
                    url = resolve_source(provider.as_ref(), &id, storage_path, literal_url, expiry_secs) => {
                        Some(url)
                    }
                };
                if let Some(url) = outcome {
                    map.send_modify(|current| match url {
                        Some(url) => {
                            current.resolved.insert(id.clone(), url);
                        }
                        None => {
                            current.failed.insert(id.clone());
                        }
                    });
                }
                in_flight.lock().unwrap().remove(&id);
            });
        }
    }

    /// Records a media element the display surface could not load.
    ///
    /// The id moves to the failed set and stays there for the binder's
    /// lifetime, so the surface shows a stable "unavailable" instead of a
    /// retry loop.
    pub fn mark_failed(&self, id: ContentId) {
        tracing::warn!(%id, "media element reported unloadable by the display surface");
        self.map.send_modify(|current| {
            current.resolved.remove(&id);
            current.failed.insert(id);
        });
    }

    /// The outcomes accumulated so far.
    pub fn snapshot(&self) -> MediaMap {
        self.map.borrow().clone()
    }

    /// A live view of the map; cheap to hand to every consumer.
    pub fn subscribe(&self) -> watch::Receiver<MediaMap> {
        self.map.subscribe()
    }
}

async fn resolve_source<P: SignedUrlProvider + ?Sized>(
    provider: &P,
    id: &ContentId,
    storage_path: Option<String>,
    literal_url: Option<String>,
    expiry_secs: u32,
) -> Option<String> {
    if let Some(path) = storage_path {
        match provider.signed_url(&path, expiry_secs).await {
            Ok(url) => {
                tracing::debug!(%id, "media bound through a signed URL");
                return Some(url);
            }
            Err(error) => {
                tracing::warn!(%id, %error, "signing failed, falling back to the raw URL");
            }
        }
    }
    literal_url
}
