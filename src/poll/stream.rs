//! Consumer-facing reading stream.
//!
//! The worker pushes one [`Reading`] per trigger into a bounded channel and
//! raises the close signal exactly once when it stops.  The consumer side
//! is a [`ReadingStream`]: a blocking `Iterator`, an async `recv()`, or a
//! `futures_lite::Stream` via [`ReadingStream::into_stream`].

use std::sync::Arc;
use std::time::SystemTime;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use futures_lite::{Stream, future};

use crate::error::Error;

/// Readings buffered between worker and consumer.
pub const READING_DEPTH: usize = 8;

/// Result of one triggered acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    id: String,
    temperature: Option<String>,
    timestamp: SystemTime,
    error: Option<Error>,
}

impl Reading {
    pub(crate) fn new(id: &str, result: Result<f32, Error>) -> Self {
        let timestamp = SystemTime::now();
        match result {
            Ok(celsius) => Self {
                id: id.to_owned(),
                temperature: Some(celsius.to_string()),
                timestamp,
                error: None,
            },
            Err(e) => Self {
                id: id.to_owned(),
                temperature: None,
                timestamp,
                error: Some(e),
            },
        }
    }

    /// Identifier of the sensor that produced this reading.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Temperature in °C, shortest decimal form; absent on failure.
    pub fn temperature(&self) -> Option<&str> {
        self.temperature.as_deref()
    }

    /// Temperature parsed back to a float.
    pub fn celsius(&self) -> Option<f32> {
        self.temperature.as_deref().and_then(|t| t.parse().ok())
    }

    /// When the acquisition finished.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn get(&self) -> (Option<&str>, SystemTime, Option<&Error>) {
        (self.temperature(), self.timestamp, self.error())
    }
}

pub(crate) struct Shared {
    queue: Channel<CriticalSectionRawMutex, Reading, READING_DEPTH>,
    closed: Signal<CriticalSectionRawMutex, ()>,
}

/// Create a connected sender/stream pair.
pub(crate) fn pair() -> (ReadingSender, ReadingStream) {
    let shared = Arc::new(Shared {
        queue: Channel::new(),
        closed: Signal::new(),
    });
    (
        ReadingSender {
            shared: shared.clone(),
        },
        ReadingStream {
            shared,
            done: false,
        },
    )
}

/// Worker end.
pub(crate) struct ReadingSender {
    shared: Arc<Shared>,
}

impl ReadingSender {
    /// Wait for room and deliver.
    pub(crate) async fn send(&self, reading: Reading) {
        self.shared.queue.send(reading).await;
    }

    /// End the stream. Readings still queued are discarded: nothing is
    /// delivered once a close has begun.
    pub(crate) fn close(&self) {
        self.shared.queue.clear();
        self.shared.closed.signal(());
    }
}

/// Consumer end of a polling loop. Ends once the sensor is closed.
pub struct ReadingStream {
    shared: Arc<Shared>,
    done: bool,
}

impl ReadingStream {
    /// Next reading, or `None` after the worker stopped.
    pub async fn recv(&mut self) -> Option<Reading> {
        if self.done {
            return None;
        }
        let shared = &self.shared;
        let next = future::or(async { Some(shared.queue.receive().await) }, async {
            shared.closed.wait().await;
            None
        })
        .await;
        if next.is_none() {
            self.done = true;
        }
        next
    }

    /// Non-blocking variant of [`recv`](Self::recv); `None` if nothing is
    /// queued right now.
    pub fn try_recv(&mut self) -> Option<Reading> {
        self.shared.queue.try_receive().ok()
    }

    /// Whether the worker has closed this stream.
    pub fn is_closed(&self) -> bool {
        self.done || self.shared.closed.signaled()
    }

    /// Adapt into an async `Stream`.
    pub fn into_stream(self) -> impl Stream<Item = Reading> {
        futures_lite::stream::unfold(self, |mut rs| async move {
            let next = rs.recv().await?;
            Some((next, rs))
        })
    }
}

impl Iterator for ReadingStream {
    type Item = Reading;

    fn next(&mut self) -> Option<Reading> {
        future::block_on(self.recv())
    }
}
