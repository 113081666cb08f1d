use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::Sender;

use tracing::{debug, trace};

use crate::compute::compute_tile;
use crate::error::RenderError;
use crate::tile::{TileRequest, TileResult};

/// A message posted from a worker back to the orchestrator's mailbox.
///
/// Every message carries the generation it was dispatched under so the
/// orchestrator can drop answers to questions it no longer cares about.
#[derive(Debug)]
pub enum WorkerMessage {
    Completed {
        generation: u64,
        index: usize,
        result: Box<TileResult>,
    },
    Failed {
        generation: u64,
        index: usize,
        message: String,
    },
}

impl WorkerMessage {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Completed { generation, .. } | Self::Failed { generation, .. } => *generation,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Completed { index, .. } | Self::Failed { index, .. } => *index,
        }
    }
}

/// A fixed number of compute threads.
///
/// Workers keep nothing between tasks: each [`TileRequest`] is
/// self-contained and each result goes straight to the mailbox it was
/// dispatched with. Dropping the pool lets queued tasks drain on their own
/// threads; whatever they post afterwards is tagged with a generation the
/// orchestrator has already moved past.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> crate::Result<Self> {
        if size == 0 {
            return Err(RenderError::InvalidWorkerCount(size));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("tile-worker-{i}"))
            .build()
            .map_err(|e| RenderError::ThreadPool(e.to_string()))?;
        debug!(size, "Worker pool started");
        Ok(Self { pool, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue one tile. The result arrives later on `mailbox`.
    pub fn dispatch(
        &self,
        generation: u64,
        index: usize,
        request: TileRequest,
        mailbox: Sender<WorkerMessage>,
    ) {
        self.spawn_task(generation, index, mailbox, move || compute_tile(&request));
    }

    /// Run `task` on the pool, converting a panic into [`WorkerMessage::Failed`].
    pub(crate) fn spawn_task<F>(
        &self,
        generation: u64,
        index: usize,
        mailbox: Sender<WorkerMessage>,
        task: F,
    ) where
        F: FnOnce() -> TileResult + Send + 'static,
    {
        self.pool.spawn(move || {
            let message = match catch_unwind(AssertUnwindSafe(task)) {
                Ok(result) => WorkerMessage::Completed {
                    generation,
                    index,
                    result: Box::new(result),
                },
                Err(payload) => WorkerMessage::Failed {
                    generation,
                    index,
                    message: panic_message(payload.as_ref()),
                },
            };
            // The orchestrator may already be gone; nothing left to tell.
            if mailbox.send(message).is_err() {
                trace!(generation, index, "Mailbox closed, dropping tile result");
            }
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{partition, RenderJob};
    use std::sync::mpsc;
    use std::time::Duration;
    use tilebrot_core::ViewState;

    const WAIT: Duration = Duration::from_secs(30);

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(RenderError::InvalidWorkerCount(0))
        ));
    }

    #[test]
    fn every_dispatch_answers_once() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);
        let tiles = partition(32, 24, 3, &RenderJob::new(ViewState::default())).unwrap();
        let (tx, rx) = mpsc::channel();
        for (i, tile) in tiles.iter().enumerate() {
            pool.dispatch(7, i, *tile, tx.clone());
        }

        let mut seen = vec![false; tiles.len()];
        for _ in 0..tiles.len() {
            match rx.recv_timeout(WAIT).unwrap() {
                WorkerMessage::Completed {
                    generation,
                    index,
                    result,
                } => {
                    assert_eq!(generation, 7);
                    assert_eq!(result.request, tiles[index]);
                    assert!(!seen[index]);
                    seen[index] = true;
                }
                other => panic!("unexpected message {other:?}"),
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn panic_becomes_failure_message() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.spawn_task(3, 0, tx, || panic!("tile exploded"));

        match rx.recv_timeout(WAIT).unwrap() {
            WorkerMessage::Failed {
                generation,
                index,
                message,
            } => {
                assert_eq!((generation, index), (3, 0));
                assert_eq!(message, "tile exploded");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn pool_survives_a_failed_task() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.spawn_task(1, 0, tx.clone(), || panic!("first"));
        let tile = partition(4, 4, 1, &RenderJob::new(ViewState::default())).unwrap()[0];
        pool.dispatch(1, 1, tile, tx);

        let messages: Vec<_> = (0..2).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
        assert!(messages
            .iter()
            .any(|m| matches!(m, WorkerMessage::Completed { index: 1, .. })));
    }
}
