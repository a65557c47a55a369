// Background runner: one conversion run at a time, off the caller's thread

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

use super::{ConversionEngine, ConversionSummary, EngineEvent, Transcoder};

/// Message from the run thread to whoever started it
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Something the engine reported (log line, progress, summary)
    Event(EngineEvent),

    /// Run ended normally
    Finished(ConversionSummary),

    /// Run aborted before converting anything
    Failed { error: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("a conversion run is already in progress")]
    AlreadyRunning,

    #[error("failed to spawn conversion thread: {0}")]
    Spawn(String),
}

/// Clears the running flag when the run thread exits, panics included
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs conversion engines on a background thread, one at a time
pub struct ConversionWorker {
    running: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
}

impl Default for ConversionWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionWorker {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        Self {
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// Get the receiver for worker messages
    pub fn receiver(&self) -> &Receiver<WorkerMessage> {
        &self.rx
    }

    /// Whether a run is in progress. Inputs should stay locked while true.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the current run to stop before its next file
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Start a run on a new thread. Fails if one is already going.
    pub fn start<T>(&self, engine: ConversionEngine<T>) -> Result<JoinHandle<()>, WorkerError>
    where
        T: Transcoder + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkerError::AlreadyRunning);
        }
        self.cancel.store(false, Ordering::SeqCst);

        let guard = RunningGuard(self.running.clone());
        let cancel = self.cancel.clone();
        let tx = self.tx.clone();

        thread::Builder::new()
            .name("ffmirror-run".to_string())
            .spawn(move || {
                let tx_events = tx.clone();
                let mut sink = move |event: EngineEvent| {
                    let _ = tx_events.send(WorkerMessage::Event(event));
                };

                let message = match engine.run_with_cancel(&mut sink, &cancel) {
                    Ok(summary) => WorkerMessage::Finished(summary),
                    Err(e) => WorkerMessage::Failed {
                        error: e.to_string(),
                    },
                };

                // Clear the flag before announcing the end, so a listener
                // reacting to the message can start the next run right away
                drop(guard);
                let _ = tx.send(message);
            })
            .map_err(|e| WorkerError::Spawn(e.to_string()))
    }
}
