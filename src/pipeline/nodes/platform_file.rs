//! PlatformFileProcessor - file source node.
//!
//! Watches `data.filePath` from a background poller thread and emits the
//! file's text whenever the path or the file's modification stamp changes.
//! Read failures are emitted as errors and leave the last good text in place
//! for replay.
//!
//! # Threading
//!
//! ```text
//! Dispatcher thread               Poller thread ("file-source-<id>")
//!   on_event(update) ── path ──►    recv_timeout(interval)
//!                                   stat / read file
//!   bus ◄────────── Emitter ──────  notify_output / notify_error
//! ```
//!
//! Dropping the processor closes the path channel, which stops the poller,
//! and joins it.

use crate::error::{EngineError, Result, ResultExt};
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{InboundEvent, Payload};
use crossbeam_channel::{unbounded, RecvTimeoutError, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

pub struct PlatformFileProcessor {
    emitter: Emitter,
    path_tx: Option<Sender<Option<PathBuf>>>,
    poller: Option<JoinHandle<()>>,
}

impl PlatformFileProcessor {
    pub fn new(data: &Payload, emitter: Emitter, interval: Duration) -> Result<Self> {
        let (path_tx, path_rx) = unbounded();
        let path = file_path_of(data);
        let poller_emitter = emitter.clone();

        let poller = std::thread::Builder::new()
            .name(format!("file-source-{}", emitter.node_id()))
            .spawn(move || poll_file(path_rx, path, poller_emitter, interval))
            .map_err(EngineError::from)
            .with_context(|| format!("Failed to start file poller for node {}", emitter.node_id()))?;

        Ok(Self {
            emitter,
            path_tx: Some(path_tx),
            poller: Some(poller),
        })
    }

    pub fn name(&self) -> &str {
        "Platform File"
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Input { .. } => Err(EngineError::rejected(
                self.emitter.node_id(),
                "a file source does not accept input",
            )),
            InboundEvent::Update { data } => {
                let path = file_path_of(&data);
                tracing::debug!(node = %self.emitter.node_id(), "Watching {:?}", path);
                if let Some(tx) = &self.path_tx {
                    if tx.send(path).is_err() {
                        tracing::warn!(node = %self.emitter.node_id(), "File poller is gone");
                    }
                }
                Ok(())
            }
            InboundEvent::Pending { .. } | InboundEvent::Disconnect { .. } => {
                self.emitter.notify_pending();
                Ok(())
            }
        }
    }
}

impl Drop for PlatformFileProcessor {
    fn drop(&mut self) {
        // Closing the channel ends the poll loop.
        self.path_tx.take();
        if let Some(poller) = self.poller.take() {
            if poller.join().is_err() {
                tracing::error!(node = %self.emitter.node_id(), "File poller panicked");
            }
        }
    }
}

/// What the poller last saw at the watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Observation {
    NoPath,
    Stamp { modified: Option<SystemTime>, len: u64 },
    Missing(String),
}

fn observe(path: Option<&Path>) -> Observation {
    let Some(path) = path else {
        return Observation::NoPath;
    };
    match std::fs::metadata(path) {
        Ok(meta) => Observation::Stamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        },
        Err(e) => Observation::Missing(e.to_string()),
    }
}

fn poll_file(
    paths: Receiver<Option<PathBuf>>,
    mut path: Option<PathBuf>,
    emitter: Emitter,
    interval: Duration,
) {
    emitter.notify_start();
    let mut seen: Option<Observation> = None;

    loop {
        let current = observe(path.as_deref());
        if seen.as_ref() != Some(&current) {
            report(&emitter, path.as_deref(), &current);
            seen = Some(current);
        }

        match paths.recv_timeout(interval) {
            Ok(next) => {
                if next != path {
                    path = next;
                    seen = None;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::trace!(node = %emitter.node_id(), "File poller stopped");
}

fn report(emitter: &Emitter, path: Option<&Path>, observation: &Observation) {
    let Some(path) = path else {
        return;
    };
    match observation {
        Observation::NoPath => {}
        Observation::Missing(reason) => {
            emitter.notify_error(format!("Cannot read {}: {}", path.display(), reason))
        }
        Observation::Stamp { .. } => match std::fs::read_to_string(path) {
            Ok(text) => emitter.notify_output(Payload::String(text)),
            Err(e) => emitter.notify_error(format!("Cannot read {}: {}", path.display(), e)),
        },
    }
}

fn file_path_of(data: &Payload) -> Option<PathBuf> {
    data.get("filePath")
        .and_then(Payload::as_str)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
