//! Bounded document queue between the commit path and the NRT consumer.
//!
//! Admission never blocks: when the queue is full the document is
//! rejected and the caller counts a drop. Queued documents are never
//! evicted, so whatever is admitted comes out in admission order.
//!
//! Consumers suspend in [`DocumentQueue::take_batch`] until documents
//! arrive, their cancellation token fires, or the queue is closed.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hybrid_types::{Document, MAX_QUEUE_CAPACITY};

use crate::error::IndexingError;

/// Why a document was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferRejected {
    /// Queue is at capacity
    Full,
    /// Queue has been closed for shutdown
    Closed,
}

impl std::fmt::Display for OfferRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferRejected::Full => f.write_str("queue full"),
            OfferRejected::Closed => f.write_str("queue closed"),
        }
    }
}

/// Many-producer, few-consumer FIFO with a fixed capacity.
pub struct DocumentQueue {
    sender: mpsc::Sender<Arc<Document>>,
    receiver: Mutex<mpsc::Receiver<Arc<Document>>>,
    capacity: usize,
    closed: CancellationToken,
}

impl DocumentQueue {
    /// Create a queue holding at most `capacity` documents.
    ///
    /// # Errors
    ///
    /// Returns `IndexingError::Config` if `capacity` is zero or above
    /// [`MAX_QUEUE_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, IndexingError> {
        if capacity == 0 {
            return Err(IndexingError::Config(
                "queue capacity must be > 0".to_string(),
            ));
        }
        if capacity > MAX_QUEUE_CAPACITY {
            return Err(IndexingError::Config(format!(
                "queue capacity must be <= {}",
                MAX_QUEUE_CAPACITY
            )));
        }

        let (sender, receiver) = mpsc::channel(capacity);
        debug!(capacity, "Created document queue");

        Ok(Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
            closed: CancellationToken::new(),
        })
    }

    /// Offer a document without blocking.
    ///
    /// Returns `true` if the document was admitted.
    pub fn offer(&self, doc: Arc<Document>) -> bool {
        self.try_offer(doc).is_ok()
    }

    /// Offer a document, reporting why it was rejected.
    pub fn try_offer(&self, doc: Arc<Document>) -> Result<(), OfferRejected> {
        if self.closed.is_cancelled() {
            return Err(OfferRejected::Closed);
        }
        match self.sender.try_send(doc) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(OfferRejected::Full),
            Err(TrySendError::Closed(_)) => Err(OfferRejected::Closed),
        }
    }

    /// Remove the oldest document, waiting while the queue is empty.
    ///
    /// Returns `None` when `cancel` fires or the queue is closed.
    pub async fn take(&self, cancel: &CancellationToken) -> Option<Arc<Document>> {
        self.take_batch(1, cancel).await.into_iter().next()
    }

    /// Remove up to `max` documents in admission order, waiting while the
    /// queue is empty.
    ///
    /// Returns an empty batch when `cancel` fires or the queue is closed.
    /// Documents still queued at that point stay queued for [`drain`].
    ///
    /// [`drain`]: DocumentQueue::drain
    pub async fn take_batch(&self, max: usize, cancel: &CancellationToken) -> Vec<Arc<Document>> {
        let mut batch = Vec::new();
        if max == 0 {
            return batch;
        }

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => {}
            _ = cancel.cancelled() => {}
            _ = async {
                let mut receiver = self.receiver.lock().await;
                receiver.recv_many(&mut batch, max).await
            } => {}
        }

        batch
    }

    /// Remove up to `max` queued documents without waiting for more.
    ///
    /// Works on a closed queue; shutdown uses it to drain leftovers.
    pub async fn drain(&self, max: usize) -> Vec<Arc<Document>> {
        let mut receiver = self.receiver.lock().await;
        let mut batch = Vec::new();
        while batch.len() < max {
            match receiver.try_recv() {
                Ok(doc) => batch.push(doc),
                Err(_) => break,
            }
        }
        batch
    }

    /// Close the channel itself and take everything still buffered.
    ///
    /// Unlike [`close`](DocumentQueue::close), this cannot race with a
    /// producer that passed the closed check: its send either fails or
    /// lands before the channel closes and is returned here. Waits for
    /// in-flight sends to finish. Nothing can be admitted afterwards.
    pub async fn seal(&self) -> Vec<Arc<Document>> {
        self.close();

        let mut receiver = self.receiver.lock().await;
        receiver.close();

        let mut remaining = Vec::new();
        while let Some(doc) = receiver.recv().await {
            remaining.push(doc);
        }
        remaining
    }

    /// Stop admitting documents and wake every waiting consumer.
    pub fn close(&self) {
        if !self.closed.is_cancelled() {
            self.closed.cancel();
            info!(pending = self.size(), "Document queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Best-effort number of queued documents. Diagnostics only.
    pub fn size(&self) -> usize {
        self.capacity.saturating_sub(self.sender.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for DocumentQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentQueue")
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .field("closed", &self.is_closed())
            .finish()
    }
}
