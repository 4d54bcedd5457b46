//! Serializing access point for the shared feed.
//!
//! A single worker task owns the [`Feed`] and drains a bounded mailbox of
//! requests in arrival order. Callers hold a cloneable [`AccessPoint`] handle
//! and never see the feed itself, so mutual exclusion comes from ownership
//! rather than from a lock.
//!
//! Each request carries a one-shot reply channel. The worker applies the
//! request, replies, and only then dequeues the next one.

use std::ops::ControlFlow;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::{error::FeedError, feed::Feed};

pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Settings for spawning an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// Requests that may queue before submitters wait for room.
    pub mailbox_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

/// Handle for submitting requests to the feed worker.
///
/// Cloning is cheap; every clone feeds the same mailbox. The worker stops
/// after [`AccessPoint::shutdown`] or once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct AccessPoint {
    mailbox: mpsc::Sender<Request>,
}

impl AccessPoint {
    /// Spawns the feed worker on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(config: FeedConfig) -> Self {
        let capacity = config.mailbox_capacity.max(1);
        let (mailbox, inbox) = mpsc::channel(capacity);
        tokio::spawn(Worker::new(inbox).run());
        info!(capacity, "feed worker started");
        Self { mailbox }
    }

    /// Appends a message and waits until the worker has applied it.
    pub async fn post(&self, message: impl Into<String>) -> Result<(), FeedError> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Request::Append {
            message: message.into(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| FeedError::Closed)
    }

    /// Fetches the most recent `count` messages, oldest first.
    ///
    /// Negative counts are rejected before anything reaches the mailbox.
    pub async fn get(&self, count: i64) -> Result<Vec<String>, FeedError> {
        let count = validate_count(count)?;
        let (respond_to, response) = oneshot::channel();
        self.submit(Request::FetchLast { count, respond_to }).await?;
        response.await.map_err(|_| FeedError::Closed)
    }

    /// Blocking variant of [`AccessPoint::post`] for plain OS threads.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_post(&self, message: impl Into<String>) -> Result<(), FeedError> {
        let (respond_to, response) = oneshot::channel();
        self.mailbox
            .blocking_send(Request::Append {
                message: message.into(),
                respond_to,
            })
            .map_err(|_| FeedError::Closed)?;
        response.blocking_recv().map_err(|_| FeedError::Closed)
    }

    /// Blocking variant of [`AccessPoint::get`] for plain OS threads.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_get(&self, count: i64) -> Result<Vec<String>, FeedError> {
        let count = validate_count(count)?;
        let (respond_to, response) = oneshot::channel();
        self.mailbox
            .blocking_send(Request::FetchLast { count, respond_to })
            .map_err(|_| FeedError::Closed)?;
        response.blocking_recv().map_err(|_| FeedError::Closed)
    }

    /// Stops the worker and waits for it to acknowledge.
    ///
    /// Requests queued behind the shutdown signal are dropped and their
    /// callers observe [`FeedError::Closed`]. Calling this on a stopped
    /// access point is a no-op.
    pub async fn shutdown(&self) {
        let (respond_to, stopped) = oneshot::channel();
        if self.submit(Request::Shutdown { respond_to }).await.is_err() {
            return;
        }
        let _ = stopped.await;
    }

    /// Returns `true` once the worker no longer accepts requests.
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    async fn submit(&self, request: Request) -> Result<(), FeedError> {
        self.mailbox
            .send(request)
            .await
            .map_err(|_| FeedError::Closed)
    }
}

fn validate_count(count: i64) -> Result<usize, FeedError> {
    if count < 0 {
        return Err(FeedError::InvalidArgument { count });
    }
    Ok(usize::try_from(count).unwrap_or(usize::MAX))
}

/// Requests delivered through the mailbox.
enum Request {
    Append {
        message: String,
        respond_to: oneshot::Sender<()>,
    },
    FetchLast {
        count: usize,
        respond_to: oneshot::Sender<Vec<String>>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Sole owner of the feed.
struct Worker {
    feed: Feed,
    inbox: mpsc::Receiver<Request>,
}

impl Worker {
    fn new(inbox: mpsc::Receiver<Request>) -> Self {
        Self {
            feed: Feed::new(),
            inbox,
        }
    }

    async fn run(mut self) {
        while let Some(request) = self.inbox.recv().await {
            if let ControlFlow::Break(respond_to) = self.handle_request(request) {
                self.stop(respond_to);
                return;
            }
        }
        info!(
            messages = self.feed.len(),
            "all feed handles dropped, worker stopped"
        );
    }

    fn handle_request(&mut self, request: Request) -> ControlFlow<oneshot::Sender<()>> {
        match request {
            Request::Append {
                message,
                respond_to,
            } => {
                self.feed.append(message);
                debug!(len = self.feed.len(), "message appended");
                // The append stands even if the caller stopped waiting.
                if respond_to.send(()).is_err() {
                    debug!("post caller went away before acknowledgement");
                }
            }
            Request::FetchLast { count, respond_to } => {
                let snapshot = self.feed.snapshot(count);
                debug!(count, returned = snapshot.len(), "snapshot taken");
                if respond_to.send(snapshot).is_err() {
                    debug!("get caller went away before reply");
                }
            }
            Request::Shutdown { respond_to } => return ControlFlow::Break(respond_to),
        }
        ControlFlow::Continue(())
    }

    fn stop(&mut self, respond_to: oneshot::Sender<()>) {
        self.inbox.close();
        let mut dropped = 0usize;
        // Dropping a queued request drops its reply slot, so its caller sees Closed.
        while self.inbox.try_recv().is_ok() {
            dropped += 1;
        }
        info!(
            dropped,
            messages = self.feed.len(),
            "feed worker stopped"
        );
        let _ = respond_to.send(());
    }
}
