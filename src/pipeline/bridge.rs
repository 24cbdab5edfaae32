//! Thread boundary between the graph source and the engine.
//!
//! The dispatcher runs on a dedicated thread. The graph source (an editor, a
//! file watcher, a test) talks to it through an [`EngineBridge`]: snapshots
//! go in over a bounded command channel, and per-node status comes back out
//! through the shared [`StatusBoard`].

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, ResultExt};
use crate::pipeline::dispatcher::Dispatcher;
use crate::pipeline::factory::FactoryRegistry;
use crate::pipeline::graph::GraphSnapshot;
use crate::pipeline::id::NodeId;
use crate::pipeline::status::{StatusBoard, StatusUpdate};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;

/// Commands sent from the graph source to the dispatcher thread.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// The graph as it looks now.
    Snapshot(GraphSnapshot),
    /// Stop the dispatcher thread.
    Shutdown,
}

/// Channel capacity for commands (graph source → engine).
const CMD_CHANNEL_CAPACITY: usize = 256;

/// Source-side handle for communicating with the dispatcher thread.
#[derive(Clone)]
pub struct EngineBridge {
    cmd_tx: Sender<EngineCommand>,
    status: StatusBoard,
}

impl EngineBridge {
    /// Create a bridge around an existing status board: `(bridge, cmd_rx)`.
    ///
    /// The dispatcher thread owns `cmd_rx`.
    pub fn new(status: StatusBoard) -> (Self, Receiver<EngineCommand>) {
        let (cmd_tx, cmd_rx) = bounded(CMD_CHANNEL_CAPACITY);
        (Self { cmd_tx, status }, cmd_rx)
    }

    /// Push the next graph snapshot. Fails once the engine has stopped.
    pub fn push_snapshot(&self, snapshot: GraphSnapshot) -> Result<()> {
        self.cmd_tx
            .send(EngineCommand::Snapshot(snapshot))
            .map_err(|_| EngineError::Channel("engine thread has stopped".to_string()))
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }

    /// Stream of status updates for `node_id`, current status first.
    pub fn subscribe(&self, node_id: &NodeId) -> Receiver<StatusUpdate> {
        self.status.subscribe(node_id)
    }

    /// Latest status of `node_id`.
    pub fn latest(&self, node_id: &NodeId) -> Option<StatusUpdate> {
        self.status.latest(node_id)
    }

    pub fn status_board(&self) -> &StatusBoard {
        &self.status
    }
}

/// Spawn a dispatcher on its own thread.
///
/// The thread ends on [`EngineBridge::shutdown`], when every bridge clone is
/// dropped, or on the first structural error, which the join handle returns.
pub fn spawn_engine(
    factories: FactoryRegistry,
    config: &EngineConfig,
) -> Result<(EngineBridge, JoinHandle<Result<()>>)> {
    let mut dispatcher = Dispatcher::new(factories, config);
    let (bridge, cmd_rx) = EngineBridge::new(dispatcher.status_board().clone());

    let handle = std::thread::Builder::new()
        .name("pipeflow-dispatcher".to_string())
        .spawn(move || {
            let result = dispatcher.run(&cmd_rx);
            if let Err(e) = &result {
                tracing::error!("Dispatcher stopped: {}", e);
            }
            result
        })
        .map_err(EngineError::from)
        .context("Failed to start dispatcher thread")?;

    Ok((bridge, handle))
}
