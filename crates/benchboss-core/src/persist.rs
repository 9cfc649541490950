// Asynchronous snapshot persistence.
//
// The session applies changes in memory and hands back a `WriteJob`; the
// writer task performs it in the background with a bounded retry budget.
// Failures become `PersistWarning`s and never roll back the in-memory lineup.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::lineup::Lineup;
use crate::store::{SaveScope, SnapshotStore, StoreError};

/// One full-lineup write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteJob {
    pub team: String,
    pub lineup: Lineup,
    pub scope: SaveScope,
    /// Today as seen when the change was made; the store refuses to write
    /// anything earlier.
    pub today: NaiveDate,
}

/// How hard to try before giving up on a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }
}

/// A write that did not land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistWarning {
    pub team: String,
    pub scope: SaveScope,
    pub attempts: u32,
    pub message: String,
}

impl fmt::Display for PersistWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lineup for {} ({:?}) not saved after {} attempt(s): {}",
            self.team, self.scope, self.attempts, self.message
        )
    }
}

/// Destination for lineup writes.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, job: &WriteJob) -> Result<(), StoreError>;
}

/// Adapts a blocking [`SnapshotStore`] into a sink, running each save on the
/// blocking pool.
pub struct StoreSink<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> StoreSink<S> {
    pub fn new(store: Arc<S>) -> Self {
        StoreSink { store }
    }
}

#[async_trait]
impl<S> SnapshotSink for StoreSink<S>
where
    S: SnapshotStore + ?Sized + 'static,
{
    async fn write(&self, job: &WriteJob) -> Result<(), StoreError> {
        let store = Arc::clone(&self.store);
        let job = job.clone();
        tokio::task::spawn_blocking(move || store.save(&job.team, &job.lineup, job.scope, job.today))
            .await
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("snapshot write task failed: {e}")))?
    }
}

/// Perform one job under `policy`. Returns the number of attempts used.
/// Writes into the past are refused outright and never retried.
pub async fn persist_with_retry(
    sink: &dyn SnapshotSink,
    job: &WriteJob,
    policy: RetryPolicy,
) -> Result<u32, PersistWarning> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match sink.write(job).await {
            Ok(()) => {
                debug!("saved lineup for {} ({:?}) on attempt {}", job.team, job.scope, attempt);
                return Ok(attempt);
            }
            Err(e @ StoreError::PastDate { .. }) => {
                return Err(warning(job, attempt, &e));
            }
            Err(e) if attempt < policy.max_attempts() => {
                warn!(
                    "snapshot write for {} failed (attempt {}), retrying in {:?}: {}",
                    job.team, attempt, policy.backoff, e
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => {
                let w = warning(job, attempt, &e);
                warn!("{}", w);
                return Err(w);
            }
        }
    }
}

fn warning(job: &WriteJob, attempts: u32, err: &StoreError) -> PersistWarning {
    PersistWarning {
        team: job.team.clone(),
        scope: job.scope,
        attempts,
        message: err.to_string(),
    }
}

/// Keep only the newest job per (team, scope), in the order those newest
/// jobs were submitted. Every job is a whole-lineup replacement, so the
/// dropped ones would have been overwritten anyway.
fn coalesce(batch: Vec<WriteJob>) -> Vec<WriteJob> {
    let mut kept: Vec<WriteJob> = Vec::with_capacity(batch.len());
    for job in batch {
        kept.retain(|k| !(k.team == job.team && k.scope == job.scope));
        kept.push(job);
    }
    kept
}

/// Handle to the background writer task. Dropping every handle lets the
/// task drain its queue and exit.
#[derive(Clone)]
pub struct SnapshotWriter {
    jobs: mpsc::UnboundedSender<WriteJob>,
}

impl SnapshotWriter {
    /// Start the writer. Jobs run in submission order; warnings go to `warnings`.
    pub fn spawn(
        sink: Arc<dyn SnapshotSink>,
        policy: RetryPolicy,
        warnings: mpsc::Sender<PersistWarning>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(rx, sink, policy, warnings));
        (SnapshotWriter { jobs: tx }, handle)
    }

    /// Queue a job without waiting. Returns false if the writer has stopped.
    pub fn submit(&self, job: WriteJob) -> bool {
        self.jobs.send(job).is_ok()
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<WriteJob>,
    sink: Arc<dyn SnapshotSink>,
    policy: RetryPolicy,
    warnings: mpsc::Sender<PersistWarning>,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(job) = rx.try_recv() {
            batch.push(job);
        }
        let submitted = batch.len();
        let batch = coalesce(batch);
        if batch.len() < submitted {
            debug!("coalesced {} superseded snapshot writes", submitted - batch.len());
        }

        for job in batch {
            if let Err(w) = persist_with_retry(sink.as_ref(), &job, policy).await {
                if warnings.send(w).await.is_err() {
                    debug!("persist warning receiver dropped");
                }
            }
        }
    }
    debug!("snapshot writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;
    use crate::slot::FantasySlot;
    use crate::store::MemorySnapshotStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn job(starter: u64, scope: SaveScope) -> WriteJob {
        WriteJob {
            team: "t1".into(),
            lineup: Lineup::from_parts([(FantasySlot::C1, PlayerId(starter))], vec![]).unwrap(),
            scope,
            today: d(17),
        }
    }

    /// Fails the first `failures` writes, then records successes.
    struct FlakySink {
        failures: AtomicU32,
        calls: AtomicU32,
        written: Mutex<Vec<WriteJob>>,
    }

    impl FlakySink {
        fn new(failures: u32) -> Self {
            FlakySink {
                failures: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                written: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SnapshotSink for FlakySink {
        async fn write(&self, job: &WriteJob) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Backend(anyhow::anyhow!("disk unavailable")));
            }
            self.written.lock().unwrap().push(job.clone());
            Ok(())
        }
    }

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            backoff: Duration::from_millis(250),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_failure_is_retried_silently() {
        let sink = FlakySink::new(1);
        let attempts = persist_with_retry(&sink, &job(1, SaveScope::Cascade { from: d(17) }), policy(1))
            .await
            .unwrap();
        assert_eq!(attempts, 2);
        assert_eq!(sink.written.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_become_warning() {
        let sink = FlakySink::new(5);
        let w = persist_with_retry(&sink, &job(1, SaveScope::Date(d(18))), policy(1))
            .await
            .unwrap_err();
        assert_eq!(w.attempts, 2);
        assert_eq!(w.scope, SaveScope::Date(d(18)));
        assert!(w.message.contains("disk unavailable"));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn past_date_is_not_retried() {
        let store: Arc<MemorySnapshotStore> = Arc::new(MemorySnapshotStore::new());
        let sink = StoreSink::new(store);
        let w = persist_with_retry(&sink, &job(1, SaveScope::Date(d(16))), policy(3))
            .await
            .unwrap_err();
        assert_eq!(w.attempts, 1);
    }

    #[test]
    fn coalesce_keeps_latest_per_scope() {
        let cascade = SaveScope::Cascade { from: d(17) };
        let dated = SaveScope::Date(d(18));
        let kept = coalesce(vec![job(1, cascade), job(2, dated), job(3, cascade)]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].scope, dated);
        assert_eq!(kept[1].lineup.occupant(FantasySlot::C1), Some(PlayerId(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn writer_reports_warnings_and_keeps_going() {
        let sink = Arc::new(FlakySink::new(2));
        let (warn_tx, mut warn_rx) = mpsc::channel(8);
        let (writer, handle) = SnapshotWriter::spawn(sink.clone(), policy(1), warn_tx);

        assert!(writer.submit(job(1, SaveScope::Cascade { from: d(17) })));
        let w = warn_rx.recv().await.unwrap();
        assert_eq!(w.attempts, 2);

        assert!(writer.submit(job(2, SaveScope::Cascade { from: d(17) })));
        drop(writer);
        handle.await.unwrap();

        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].lineup.occupant(FantasySlot::C1), Some(PlayerId(2)));
    }

    #[tokio::test]
    async fn writer_lands_jobs_in_store() {
        let store = Arc::new(MemorySnapshotStore::new());
        let (warn_tx, _warn_rx) = mpsc::channel(8);
        let (writer, handle) = SnapshotWriter::spawn(Arc::new(StoreSink::new(store.clone())), RetryPolicy::default(), warn_tx);

        writer.submit(job(1, SaveScope::Cascade { from: d(17) }));
        writer.submit(job(2, SaveScope::Date(d(19))));
        drop(writer);
        handle.await.unwrap();

        assert_eq!(
            store.load_lineup("t1", d(20)).unwrap().and_then(|l| l.occupant(FantasySlot::C1)),
            Some(PlayerId(1))
        );
        assert_eq!(
            store.load_lineup("t1", d(19)).unwrap().and_then(|l| l.occupant(FantasySlot::C1)),
            Some(PlayerId(2))
        );
    }
}
