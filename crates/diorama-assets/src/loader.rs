//! Background model loading.
//!
//! Requests go to worker threads over a bounded channel; finished templates
//! come back on a second channel that the main thread drains once per frame.
//! A frame may therefore render before a requested model has arrived.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use diorama_scene::ModelTemplate;

use crate::error::AssetError;
use crate::gltf_loader::load_model;

/// A model to load, tagged with a caller-chosen key.
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub key: String,
    pub path: PathBuf,
}

/// Outcome of one request.
#[derive(Debug)]
pub struct LoadedModel {
    pub key: String,
    pub path: PathBuf,
    pub result: Result<Arc<ModelTemplate>, AssetError>,
    /// Wall time spent loading, in milliseconds.
    pub load_time_ms: u64,
}

/// Loads glTF models on background threads.
pub struct AsyncModelLoader {
    request_sender: Sender<ModelRequest>,
    result_receiver: Receiver<LoadedModel>,
    in_flight: Arc<AtomicU64>,
}

impl AsyncModelLoader {
    /// Spawn `worker_count` loader threads with room for `queue_capacity`
    /// pending requests.
    pub fn new(worker_count: usize, queue_capacity: usize) -> Result<Self, AssetError> {
        let (request_sender, request_receiver) = bounded::<ModelRequest>(queue_capacity.max(1));
        let (result_sender, result_receiver) = bounded::<LoadedModel>(queue_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        for i in 0..worker_count.max(1) {
            let receiver = request_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);

            std::thread::Builder::new()
                .name(format!("asset-loader-{i}"))
                .spawn(move || {
                    while let Ok(request) = receiver.recv() {
                        let start = Instant::now();
                        let result = load_model(&request.path).map(Arc::new);
                        let load_time_ms = start.elapsed().as_millis() as u64;

                        let _ = sender.send(LoadedModel {
                            key: request.key,
                            path: request.path,
                            result,
                            load_time_ms,
                        });
                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .map_err(AssetError::WorkerSpawn)?;
        }

        Ok(Self {
            request_sender,
            result_receiver,
            in_flight,
        })
    }

    /// Queue a model for loading.
    pub fn request(
        &self,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<(), AssetError> {
        let request = ModelRequest {
            key: key.into(),
            path: path.into(),
        };
        tracing::debug!(key = %request.key, path = %request.path.display(), "queueing model load");
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        self.request_sender.try_send(request).map_err(|e| {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            let reason = match e {
                TrySendError::Full(_) => "queue full",
                TrySendError::Disconnected(_) => "workers stopped",
            };
            AssetError::Rejected {
                key: e.into_inner().key,
                reason,
            }
        })
    }

    /// Collect every load finished since the last call. Never blocks.
    pub fn drain_completed(&self) -> Vec<LoadedModel> {
        let mut results = Vec::new();
        while let Ok(loaded) = self.result_receiver.try_recv() {
            results.push(loaded);
        }
        results
    }

    /// Requests queued or currently loading.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }
}
