//! Asynchronous tile image loading
//!
//! Requests are queued FIFO and started on the host's [`AsyncSpawner`] while
//! fewer than `max_parallel_downloads` are in flight. Completions come back
//! over a channel and are picked up with [`TileImageLoader::drain_completed`]
//! on the thread that owns the layer, so nothing ever blocks on a fetch.
//!
//! Requests are keyed by [`TileKey::canonical`]: date-line equivalent tiles
//! share one fetch, and the layer hands the result to each of them.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::image::{ImageHandle, ImageRequest};
use super::source::TileSource;
use super::types::{Tile, TileKey};
use crate::runtime::{spawn, MapServices};
use crate::Result;
use fxhash::FxHashSet as HashSet;
use std::collections::VecDeque;

/// Result of a tile loading operation
#[derive(Debug)]
pub struct LoadedImage {
    /// Canonical key of the loaded tile.
    pub key: TileKey,
    pub result: Result<ImageHandle>,
}

#[derive(Debug)]
struct QueuedRequest {
    key: TileKey,
    request: ImageRequest,
}

pub struct TileImageLoader {
    services: MapServices,
    max_parallel_downloads: usize,
    queue: VecDeque<QueuedRequest>,
    queued: HashSet<TileKey>,
    in_flight: HashSet<TileKey>,
    result_sender: Sender<LoadedImage>,
    result_receiver: Receiver<LoadedImage>,
}

impl TileImageLoader {
    pub fn new(services: MapServices, max_parallel_downloads: usize) -> Self {
        let (result_sender, result_receiver) = unbounded();
        Self {
            services,
            max_parallel_downloads: max_parallel_downloads.max(1),
            queue: VecDeque::new(),
            queued: HashSet::default(),
            in_flight: HashSet::default(),
            result_sender,
            result_receiver,
        }
    }

    /// Queues a request for every tile that still needs an image and starts
    /// as many as the parallelism limit allows.
    ///
    /// A tile whose canonical key is already queued or in flight is marked
    /// requested without issuing a second request; the pending completion
    /// will fill it.
    pub fn begin_get_tiles(&mut self, source: &dyn TileSource, tiles: &mut [Tile], max_retries: u32) {
        let mut issued = 0usize;

        for tile in tiles.iter_mut().filter(|tile| tile.needs_image(max_retries)) {
            let key = tile.key().canonical();
            if self.in_flight.contains(&key) || self.queued.contains(&key) {
                tile.mark_requested();
                continue;
            }

            match source.image_request(tile.x_index(), tile.y(), tile.zoom_level()) {
                Some(request) => {
                    tile.mark_requested();
                    self.queued.insert(key);
                    self.queue.push_back(QueuedRequest { key, request });
                    issued += 1;
                }
                None => {
                    log::trace!("no image request for tile {key:?}");
                    tile.set_failed();
                }
            }
        }

        if issued > 0 {
            log::debug!(
                "queued {issued} tile requests ({} waiting, {} in flight)",
                self.queue.len(),
                self.in_flight.len()
            );
        }

        self.pump();
    }

    /// Drops queued requests whose canonical key fails `keep` and returns
    /// those keys. Loads already in flight are left alone.
    pub fn retain_queued(&mut self, mut keep: impl FnMut(&TileKey) -> bool) -> Vec<TileKey> {
        let mut dropped = Vec::new();
        self.queue.retain(|queued| {
            let retained = keep(&queued.key);
            if !retained {
                dropped.push(queued.key);
            }
            retained
        });
        for key in &dropped {
            self.queued.remove(key);
        }

        if !dropped.is_empty() {
            log::debug!(
                "dropped {} stale tile requests ({} still waiting)",
                dropped.len(),
                self.queue.len()
            );
        }
        dropped
    }

    /// Drops every request that has not started yet and returns their keys.
    /// Loads already in flight run to completion.
    pub fn cancel_get_tiles(&mut self) -> Vec<TileKey> {
        self.queued.clear();
        let cancelled: Vec<TileKey> = self.queue.drain(..).map(|queued| queued.key).collect();
        if !cancelled.is_empty() {
            log::debug!("cancelled {} queued tile requests", cancelled.len());
        }
        cancelled
    }

    /// Completed loads since the last call. Frees their parallelism slots and
    /// starts queued requests in their place.
    pub fn drain_completed(&mut self) -> Vec<LoadedImage> {
        let completed: Vec<LoadedImage> = self.result_receiver.try_iter().collect();
        for loaded in &completed {
            self.in_flight.remove(&loaded.key);
        }
        if !completed.is_empty() {
            self.pump();
        }
        completed
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub fn set_max_parallel_downloads(&mut self, max_parallel_downloads: usize) {
        self.max_parallel_downloads = max_parallel_downloads.max(1);
        self.pump();
    }

    fn pump(&mut self) {
        while self.in_flight.len() < self.max_parallel_downloads {
            let Some(QueuedRequest { key, request }) = self.queue.pop_front() else {
                break;
            };
            self.queued.remove(&key);
            self.in_flight.insert(key);

            let decoder = self.services.decoder.clone();
            let sender = self.result_sender.clone();
            spawn(self.services.spawner.as_ref(), async move {
                let result = decoder.decode(request).await;
                // The receiver only disappears together with the layer.
                let _ = sender.send(LoadedImage { key, result });
            });
        }
    }
}

impl std::fmt::Debug for TileImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileImageLoader")
            .field("max_parallel_downloads", &self.max_parallel_downloads)
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
