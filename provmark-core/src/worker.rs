//! Background batch worker.
//!
//! Runs a [`BatchJob`] on a single blocking task and streams
//! [`BatchEvent`]s to whoever holds the receiver, keeping the foreground
//! loop free to render progress. Images are processed strictly in sequence;
//! there is no cancellation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use provmark_core::{BatchEvent, BatchJob, BatchWorker, Config, Workflow};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let workflow = Arc::new(Workflow::from_config(&config));
//! let job = BatchJob::embed(&config.originals_dir, &config.watermarked_dir);
//!
//! let (handle, mut events) = BatchWorker::spawn(workflow, job);
//! while let Some(event) = events.recv().await {
//!     if let BatchEvent::Processing { index, total, image } = event {
//!         println!("{index}/{total} {image}");
//!     }
//! }
//! let summary = handle.await??;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::batch::{run_batch, BatchEvent, BatchJob, BatchSummary};
use crate::error::Result;
use crate::watermark::Watermarker;
use crate::workflow::Workflow;

pub struct BatchWorker;

impl BatchWorker {
    /// Start `job` in the background.
    ///
    /// The receiver yields events until the batch ends and then closes. The
    /// handle resolves to the batch result; an aborted batch has already
    /// sent [`BatchEvent::Failed`] by then.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<W>(
        workflow: Arc<Workflow<W>>,
        job: BatchJob,
    ) -> (JoinHandle<Result<BatchSummary>>, UnboundedReceiver<BatchEvent>)
    where
        W: Watermarker + 'static,
    {
        let (tx, rx) = unbounded_channel();

        let handle = tokio::task::spawn_blocking(move || {
            debug!(mode = %job.mode, "Batch worker started");
            run_batch(&workflow, &job, &mut |event| {
                // Receiver gone means nobody is watching; keep working.
                let _ = tx.send(event);
            })
        });

        (handle, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_empty_folder_emits_start_and_finish() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base(dir.path());
        config.ensure_dirs().unwrap();

        let workflow = Arc::new(Workflow::from_config(&config));
        let job = BatchJob::embed(&config.originals_dir, &config.watermarked_dir);
        let (handle, mut rx) = BatchWorker::spawn(workflow, job);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let summary = handle.await.unwrap().unwrap();

        assert_eq!(summary, BatchSummary::default());
        assert!(matches!(events.first(), Some(BatchEvent::Started { total: 0, .. })));
        assert!(matches!(events.last(), Some(BatchEvent::Finished(_))));
    }

    #[tokio::test]
    async fn test_missing_folder_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base(dir.path());

        let workflow = Arc::new(Workflow::from_config(&config));
        let job = BatchJob::extract(dir.path().join("does-not-exist"));
        let (handle, mut rx) = BatchWorker::spawn(workflow, job);

        let first = rx.recv().await;
        assert!(matches!(first, Some(BatchEvent::Failed { image: None, .. })));
        assert!(rx.recv().await.is_none());
        assert!(handle.await.unwrap().is_err());
    }
}
