use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::error::SampleError;
use super::network;
use super::platform::Sampler;
use super::snapshot::InterfaceSnapshot;
use super::usage::{CoreUsage, CpuLoad, LOAD_INTERVAL};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Cpu,
    Network,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Completed,
}

type Work = Box<dyn FnOnce(&dyn Sampler, Duration) + Send>;

struct Job {
    id: u64,
    kind: TaskKind,
    work: Work,
}

/// Receiving end of one dispatched task.
///
/// Resolves exactly once, with the payload or a typed error. Dropping the
/// handle abandons the result; the worker still runs the task to the end.
pub struct TaskHandle<T> {
    id: u64,
    kind: TaskKind,
    rx: oneshot::Receiver<Result<T, SampleError>>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub async fn completion(self) -> Result<T, SampleError> {
        self.rx.await.unwrap_or(Err(SampleError::Abandoned))
    }
}

/// Runs blocking samplers on one dedicated worker thread and hands each
/// result back to the dispatching context.
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Job>,
    _worker: thread::JoinHandle<()>,
}

impl Dispatcher {
    pub fn new(sampler: Arc<dyn Sampler>) -> io::Result<Self> {
        Self::with_load_interval(sampler, LOAD_INTERVAL)
    }

    /// Like `new`, with a different pause inside the CPU two-sample load.
    pub fn with_load_interval(sampler: Arc<dyn Sampler>, interval: Duration) -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let worker = thread::Builder::new()
            .name("hostprobe-sampler".to_string())
            .spawn(move || run_worker(sampler, interval, rx))?;
        Ok(Self {
            queue: tx,
            _worker: worker,
        })
    }

    /// Per-core usage from a fresh two-sample load.
    pub fn dispatch_cpu(&self) -> TaskHandle<Vec<CoreUsage>> {
        self.dispatch(TaskKind::Cpu, |sampler, interval| {
            let _span = tracing::debug_span!("sampler.cpu").entered();
            let mut load = CpuLoad::with_interval(interval);
            load.load(sampler)?;
            load.usage()
        })
    }

    /// Interface counters with the synthetic total appended.
    pub fn dispatch_network(&self) -> TaskHandle<Vec<InterfaceSnapshot>> {
        self.dispatch(TaskKind::Network, |sampler, _| {
            let _span = tracing::debug_span!("sampler.network").entered();
            network::enumerate(sampler)
        })
    }

    pub async fn cpu_usage(&self) -> Result<Vec<CoreUsage>, SampleError> {
        self.dispatch_cpu().completion().await
    }

    pub async fn network_activity(&self) -> Result<Vec<InterfaceSnapshot>, SampleError> {
        self.dispatch_network().completion().await
    }

    fn dispatch<T, F>(&self, kind: TaskKind, f: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Sampler, Duration) -> Result<T, SampleError> + Send + 'static,
    {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        tracing::debug!(task = id, ?kind, state = ?TaskState::Created, "task state");

        let work: Work = Box::new(move |sampler: &dyn Sampler, interval: Duration| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(sampler, interval)))
                .unwrap_or_else(|_| {
                    tracing::warn!(task = id, "sampler panicked");
                    Err(SampleError::Abandoned)
                });
            if let Err(err) = &outcome {
                tracing::warn!(task = id, code = err.code(), %err, "sampling failed");
            }
            if tx.send(outcome).is_err() {
                tracing::debug!(task = id, "completion receiver dropped; result discarded");
            }
        });

        // A closed queue drops the job and its sender, so the handle resolves
        // to `Abandoned`.
        if self.queue.send(Job { id, kind, work }).is_err() {
            tracing::warn!(task = id, "sampling worker is gone");
        }
        TaskHandle { id, kind, rx }
    }
}

fn run_worker(
    sampler: Arc<dyn Sampler>,
    interval: Duration,
    mut rx: mpsc::UnboundedReceiver<Job>,
) {
    while let Some(job) = rx.blocking_recv() {
        let Job { id, kind, work } = job;
        tracing::debug!(task = id, ?kind, state = ?TaskState::Running, "task state");
        work(sampler.as_ref(), interval);
        tracing::debug!(task = id, ?kind, state = ?TaskState::Completed, "task state");
    }
}
