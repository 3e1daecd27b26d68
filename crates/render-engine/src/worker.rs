//! Background deinterlace worker.
//!
//! The filter process can take seconds, so a front end starts it here and
//! keeps polling its own event loop. Results come back as messages; the
//! worker never touches caller state directly.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use fieldmerge_common::error::{ErrorKind, ErrorReport};
use fieldmerge_core::raster::MergedFrame;

use crate::deinterlace::DeinterlaceBridge;

/// Where the deinterlaced image should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeinterlaceTarget {
    /// Return the frame in a [`DeinterlaceMessage::Complete`].
    InMemory,
    /// Write PNG/JPEG to this path and report [`DeinterlaceMessage::Saved`].
    File(PathBuf),
}

/// Progress notifications posted by the worker thread.
#[derive(Debug, Clone)]
pub enum DeinterlaceMessage {
    Started { backend: String },
    Complete { frame: MergedFrame },
    Saved { path: PathBuf },
    Failed { report: ErrorReport },
}

impl DeinterlaceMessage {
    /// Whether this is the last message the worker will send.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started { .. })
    }
}

/// Final result of a background run.
#[derive(Debug, Clone)]
pub enum DeinterlaceOutcome {
    Frame(MergedFrame),
    Saved(PathBuf),
}

/// Start a deinterlace run on its own thread, posting messages to `tx`.
///
/// The thread drives the bridge with a single-threaded tokio runtime. Send
/// errors are ignored: a dropped receiver means nobody wants the result.
pub fn spawn_deinterlace(
    bridge: Arc<DeinterlaceBridge>,
    frame: MergedFrame,
    target: DeinterlaceTarget,
    tx: Sender<DeinterlaceMessage>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                let _ = tx.send(DeinterlaceMessage::Failed {
                    report: ErrorReport {
                        kind: ErrorKind::Internal,
                        message: format!("Failed to create runtime: {err}"),
                        diagnostics: None,
                    },
                });
                return;
            }
        };

        let _ = tx.send(DeinterlaceMessage::Started {
            backend: bridge.backend_name().to_string(),
        });

        let message = runtime.block_on(async {
            match target {
                DeinterlaceTarget::InMemory => bridge
                    .deinterlace(&frame)
                    .await
                    .map(|frame| DeinterlaceMessage::Complete { frame }),
                DeinterlaceTarget::File(path) => bridge
                    .deinterlace_to(&frame, &path)
                    .await
                    .map(|path| DeinterlaceMessage::Saved { path }),
            }
        });

        let message = message.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Background deinterlace failed");
            DeinterlaceMessage::Failed {
                report: err.report(),
            }
        });
        let _ = tx.send(message);
    })
}

/// Handle to a background run with its own message channel.
pub struct DeinterlaceTask {
    receiver: Receiver<DeinterlaceMessage>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl DeinterlaceTask {
    pub fn spawn(
        bridge: Arc<DeinterlaceBridge>,
        frame: MergedFrame,
        target: DeinterlaceTarget,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_deinterlace(bridge, frame, target, tx);
        Self {
            receiver: rx,
            handle: Some(handle),
            finished: false,
        }
    }

    /// Non-blocking poll, meant to be called from a UI event loop.
    pub fn poll(&mut self) -> Option<DeinterlaceMessage> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(message) => {
                self.finished = message.is_terminal();
                Some(message)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(disconnected())
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Block until the worker reports a result.
    pub fn wait(mut self) -> Result<DeinterlaceOutcome, ErrorReport> {
        let outcome = loop {
            let message = self.receiver.recv().unwrap_or_else(|_| disconnected());
            match message {
                DeinterlaceMessage::Started { .. } => continue,
                DeinterlaceMessage::Complete { frame } => {
                    break Ok(DeinterlaceOutcome::Frame(frame))
                }
                DeinterlaceMessage::Saved { path } => break Ok(DeinterlaceOutcome::Saved(path)),
                DeinterlaceMessage::Failed { report } => break Err(report),
            }
        };
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        outcome
    }
}

fn disconnected() -> DeinterlaceMessage {
    DeinterlaceMessage::Failed {
        report: ErrorReport {
            kind: ErrorKind::Internal,
            message: "Deinterlace worker disconnected".to_string(),
            diagnostics: None,
        },
    }
}
