//! Rendezvous fan-out: one producer, N worker threads, identical ordered bytes.
//!
//! Every consumer owns a zero-capacity [`sync_channel`], so a send completes
//! only when that consumer has taken the chunk. The producer therefore
//! suspends until all consumers accepted the current chunk, and nothing is
//! buffered beyond one chunk per consumer. Chunks are shared as `Arc<[u8]>`
//! so N consumers cost one copy.
//!
//! After its body returns, each worker drains the rest of its pipe. A
//! consumer that stops reading early (or fails) can never stall the
//! producer; a consumer whose thread died is reported by [`FanOutGroup::send`].

use std::io::{self, Read};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

type Chunk = Arc<[u8]>;

/// The reading end of one consumer's pipe.
pub struct PipeReader {
    rx: Receiver<Chunk>,
    current: Option<Chunk>,
    pos: usize,
}

impl PipeReader {
    fn new(rx: Receiver<Chunk>) -> Self {
        Self {
            rx,
            current: None,
            pos: 0,
        }
    }

    /// Discard everything until the producer closes the pipe.
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if let Some(chunk) = &self.current {
                let remaining = &chunk[self.pos..];
                if !remaining.is_empty() {
                    let n = remaining.len().min(buf.len());
                    buf[..n].copy_from_slice(&remaining[..n]);
                    self.pos += n;
                    return Ok(n);
                }
            }
            match self.rx.recv() {
                Ok(chunk) => {
                    self.current = Some(chunk);
                    self.pos = 0;
                }
                // Sender dropped: end of stream.
                Err(_) => return Ok(0),
            }
        }
    }
}

/// What a worker produced, tagged with its label.
#[derive(Debug)]
pub struct WorkerOutcome<T> {
    pub label: String,
    /// `Err` carries the panic message if the worker panicked.
    pub result: Result<T, String>,
}

struct Worker<T> {
    label: String,
    sender: Option<SyncSender<Chunk>>,
    handle: JoinHandle<T>,
}

/// A set of worker threads fed from one byte stream.
pub struct FanOutGroup<T> {
    workers: Vec<Worker<T>>,
}

impl<T: Send + 'static> FanOutGroup<T> {
    /// Create a group with no consumers.
    pub fn new() -> Self {
        Self {
            workers: Vec::new(),
        }
    }

    /// Spawn a consumer running `body` over its own pipe.
    pub fn spawn<F>(&mut self, label: impl Into<String>, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut PipeReader) -> T + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = sync_channel::<Chunk>(0);
        let handle = thread::Builder::new()
            .name(format!("fanout-{label}"))
            .spawn(move || {
                let mut reader = PipeReader::new(rx);
                let out = body(&mut reader);
                // Keep accepting chunks so the producer never blocks on us.
                let _ = reader.drain();
                out
            })?;
        self.workers.push(Worker {
            label,
            sender: Some(tx),
            handle,
        });
        Ok(())
    }

    /// Number of consumers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` if the group has no consumers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Hand `buf` to every live consumer, blocking until each accepted it.
    ///
    /// Returns the labels of consumers that went away during this send.
    /// They are skipped for the rest of the stream.
    pub fn send(&mut self, buf: &[u8]) -> Vec<String> {
        if buf.is_empty() {
            return Vec::new();
        }
        let chunk: Chunk = Arc::from(buf);
        let mut gone = Vec::new();
        for worker in &mut self.workers {
            let Some(tx) = &worker.sender else { continue };
            if tx.send(Arc::clone(&chunk)).is_err() {
                debug!(consumer = %worker.label, "fan-out consumer hung up");
                worker.sender = None;
                gone.push(worker.label.clone());
            }
        }
        gone
    }

    /// Signal end of stream and wait for every worker (barrier).
    pub fn finish(mut self) -> Vec<WorkerOutcome<T>> {
        let workers = std::mem::take(&mut self.workers);
        // Close every pipe before joining anyone.
        let handles: Vec<_> = workers
            .into_iter()
            .map(|w| {
                drop(w.sender);
                (w.label, w.handle)
            })
            .collect();
        handles
            .into_iter()
            .map(|(label, handle)| WorkerOutcome {
                label,
                result: handle.join().map_err(|panic| panic_message(&panic)),
            })
            .collect()
    }
}

impl<T: Send + 'static> Default for FanOutGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for FanOutGroup<T> {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.sender = None;
        }
        for worker in self.workers.drain(..) {
            let _ = worker.handle.join();
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
