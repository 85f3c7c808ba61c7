//! Clipboard writes off the control thread
//!
//! A [`ClipboardWorker`] owns a [`Clipboard`] backend on its own thread.
//! Requests are served in order and every request gets exactly one
//! [`Completion`], read back with [`ClipboardWorker::try_completion`] or
//! [`ClipboardWorker::wait_completion`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::color::Repr;

/// Something that can hold text
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard rejected the write: {0}")]
    Rejected(String),
    #[error("clipboard worker stopped")]
    Closed,
}

/// A pending write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: Repr,
    pub text: String,
}

/// Outcome of a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub kind: Repr,
    pub result: Result<(), ClipboardError>,
}

pub struct ClipboardWorker {
    requests: Option<Sender<Request>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl ClipboardWorker {
    /// Start the worker thread
    ///
    /// `open` runs on the worker, right before the first write, so the
    /// backend does not have to be [`Send`] and nothing is opened if nothing
    /// is ever copied. If it fails, every request completes with its error.
    pub fn spawn<C, F>(open: F) -> Self
    where
        C: Clipboard + 'static,
        F: FnOnce() -> Result<C, ClipboardError> + Send + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let handle = thread::spawn(move || serve(open, req_rx, done_tx));
        Self {
            requests: Some(req_tx),
            completions: done_rx,
            handle: Some(handle),
        }
    }

    /// Queue a write, does not wait for it
    pub fn write(&self, request: Request) -> Result<(), ClipboardError> {
        let tx = self.requests.as_ref().ok_or(ClipboardError::Closed)?;
        tx.send(request).map_err(|_| ClipboardError::Closed)
    }

    /// Next finished write, if any, without blocking
    pub fn try_completion(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Block for the next finished write
    ///
    /// `None` means the worker is gone and nothing else will complete.
    pub fn wait_completion(&self) -> Option<Completion> {
        self.completions.recv().ok()
    }

    /// Stop accepting writes and wait for the queued ones to finish
    pub fn shutdown(&mut self) {
        self.requests = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("clipboard worker panicked");
            }
        }
    }
}

impl Drop for ClipboardWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ClipboardWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardWorker")
            .field("running", &self.requests.is_some())
            .finish_non_exhaustive()
    }
}

fn serve<C, F>(open: F, requests: Receiver<Request>, completions: Sender<Completion>)
where
    C: Clipboard,
    F: FnOnce() -> Result<C, ClipboardError>,
{
    let mut open = Some(open);
    let mut clipboard: Option<Result<C, ClipboardError>> = None;

    for Request { kind, text } in requests {
        let backend = clipboard.get_or_insert_with(|| {
            let opened = match open.take() {
                Some(open) => open(),
                None => Err(ClipboardError::Closed),
            };
            if let Err(e) = &opened {
                log::warn!("{e}");
            }
            opened
        });
        let result = match backend {
            Ok(c) => c.set_text(&text),
            Err(e) => Err(e.clone()),
        };
        log::debug!("wrote {kind} {text:?}: {result:?}");
        if completions.send(Completion { kind, result }).is_err() {
            break;
        }
    }
}
