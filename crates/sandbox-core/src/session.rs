//! One interactive session: an owned chain plus at most one background miner.
//!
//! Mining runs on tokio's blocking pool so the caller's event loop stays
//! responsive. Progress is published on a `watch` channel, and the terminal
//! outcome of every recent job is kept so late waiters still get the right
//! answer. Lock order is `active`, then `chain`, then `outcomes`. Only
//! `outcomes` is taken while a `watch` borrow is held.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    audit::{audit, AuditReport},
    block::Block,
    chain::Chain,
    config::ChainConfig,
    constants::JOB_HISTORY,
    error::{Result, SandboxError},
    graph::LinkGraph,
    pow::{mine_block, mine_block_cancellable, CancelToken, Difficulty, MiningStats},
};

pub type JobId = u64;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MiningStatus {
    #[default]
    Idle,
    InProgress {
        job: JobId,
        data: String,
        difficulty: Difficulty,
    },
    Finished {
        job: JobId,
        block: Block,
        attempts: u64,
        elapsed_ms: u64,
    },
    Cancelled {
        job: JobId,
    },
    /// Mined, but the chain had moved on; nothing was appended.
    Discarded {
        job: JobId,
    },
}

impl MiningStatus {
    pub fn job(&self) -> Option<JobId> {
        match self {
            MiningStatus::Idle => None,
            MiningStatus::InProgress { job, .. }
            | MiningStatus::Finished { job, .. }
            | MiningStatus::Cancelled { job }
            | MiningStatus::Discarded { job } => Some(*job),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, MiningStatus::InProgress { .. })
    }
}

struct ActiveJob {
    id: JobId,
    cancel: CancelToken,
}

#[derive(Clone, Debug)]
enum JobOutcome {
    Appended(Block),
    Cancelled,
    Discarded,
}

impl JobOutcome {
    fn into_result(self) -> Result<Block> {
        match self {
            JobOutcome::Appended(block) => Ok(block),
            JobOutcome::Cancelled => Err(SandboxError::Cancelled),
            JobOutcome::Discarded => Err(SandboxError::Stale),
        }
    }
}

/// Terminal outcomes in job id order. A job leaves `active` before the next
/// id is handed out, so ids arrive here strictly increasing.
#[derive(Default)]
struct JobLog {
    outcomes: VecDeque<(JobId, JobOutcome)>,
}

impl JobLog {
    fn record(&mut self, job: JobId, outcome: JobOutcome) {
        if self.outcomes.len() == JOB_HISTORY {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back((job, outcome));
    }

    /// `None` while the job is still running.
    fn lookup(&self, job: JobId) -> Option<Result<Block>> {
        if let Some((_, outcome)) = self.outcomes.iter().find(|(id, _)| *id == job) {
            return Some(outcome.clone().into_result());
        }
        match self.outcomes.front() {
            Some((oldest, _)) if job < *oldest => Some(Err(SandboxError::UnknownJob(job))),
            _ => None,
        }
    }
}

struct Inner {
    chain: Mutex<Chain>,
    active: Mutex<Option<ActiveJob>>,
    outcomes: Mutex<JobLog>,
    status: watch::Sender<MiningStatus>,
    last_job: AtomicU64,
}

/// Cloneable handle to a session. Clones share the same chain.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl Session {
    pub fn new(config: ChainConfig) -> Self {
        let (status, _) = watch::channel(MiningStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                chain: Mutex::new(Chain::new(config)),
                active: Mutex::new(None),
                outcomes: Mutex::new(JobLog::default()),
                status,
                last_job: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> ChainConfig {
        self.inner.chain.lock().config().clone()
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.inner.chain.lock().snapshot()
    }

    pub fn tip(&self) -> Block {
        self.inner.chain.lock().tip().clone()
    }

    pub fn get(&self, index: u64) -> Option<Block> {
        self.inner.chain.lock().get(index)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.inner.chain.lock().len()
    }

    pub fn audit(&self) -> AuditReport {
        let (blocks, mode) = {
            let chain = self.inner.chain.lock();
            (chain.snapshot(), chain.config().timestamp_mode)
        };
        audit(&blocks, mode)
    }

    pub fn graph(&self) -> LinkGraph {
        LinkGraph::from_blocks(&self.snapshot())
    }

    pub fn mining_status(&self) -> MiningStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MiningStatus> {
        self.inner.status.subscribe()
    }

    /// Mines on the calling thread without holding any session lock, so
    /// `reset` and `cancel_mining` stay responsive meanwhile. If the tip moves
    /// during the search the block is rebuilt on the new tip and mined again.
    /// Any background job mining on the old tip is discarded when it finishes.
    pub fn append(&self, data: impl Into<String>, difficulty: Difficulty) -> Block {
        let data = data.into();
        loop {
            let (mut block, epoch, mode) = {
                let chain = self.inner.chain.lock();
                (
                    chain.prepare_next(data.clone()),
                    chain.epoch(),
                    chain.config().timestamp_mode,
                )
            };
            let stats = mine_block(&mut block, difficulty, mode);

            let _active = self.inner.active.lock();
            let mut chain = self.inner.chain.lock();
            if chain.epoch() == epoch && chain.extends_tip(&block) {
                debug!(
                    index = block.index,
                    attempts = stats.attempts,
                    "mined on caller thread"
                );
                chain.push_mined(block.clone(), difficulty);
                return block;
            }
            debug!(index = block.index, "tip moved during foreground mining; retrying");
        }
    }

    /// Starts mining a successor of the current tip in the background,
    /// cancelling any job already in flight. Must be called inside a tokio runtime.
    pub fn start_mining(&self, data: impl Into<String>, difficulty: Difficulty) -> JobId {
        let data = data.into();
        let cancel = CancelToken::new();

        let (id, candidate, epoch, mode) = {
            let mut active = self.inner.active.lock();
            let id = self.inner.last_job.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(previous) = active.replace(ActiveJob {
                id,
                cancel: cancel.clone(),
            }) {
                previous.cancel.cancel();
                self.inner.record(previous.id, JobOutcome::Cancelled);
                debug!(job = previous.id, superseded_by = id, "mining job superseded");
            }
            let chain = self.inner.chain.lock();
            self.inner.status.send_replace(MiningStatus::InProgress {
                job: id,
                data: data.clone(),
                difficulty,
            });
            (
                id,
                chain.prepare_next(data),
                chain.epoch(),
                chain.config().timestamp_mode,
            )
        };

        debug!(job = id, index = candidate.index, %difficulty, "mining job started");
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut block = candidate;
            let outcome = mine_block_cancellable(&mut block, difficulty, mode, &cancel);
            inner.finish(id, epoch, block, difficulty, outcome);
        });
        id
    }

    /// Abandons the in-flight job, if any. Nothing is appended for it.
    pub fn cancel_mining(&self) -> Option<JobId> {
        let mut active = self.inner.active.lock();
        let job = active.take()?;
        job.cancel.cancel();
        self.inner.record(job.id, JobOutcome::Cancelled);
        self.inner
            .status
            .send_replace(MiningStatus::Cancelled { job: job.id });
        info!(job = job.id, "mining cancelled");
        Some(job.id)
    }

    /// Cancels any in-flight job and collapses the chain to a fresh genesis.
    pub fn reset(&self) {
        let mut active = self.inner.active.lock();
        let cancelled = active.take().map(|job| {
            job.cancel.cancel();
            self.inner.record(job.id, JobOutcome::Cancelled);
            job.id
        });
        self.inner.chain.lock().reset();
        self.inner.status.send_replace(match cancelled {
            Some(job) => MiningStatus::Cancelled { job },
            None => MiningStatus::Idle,
        });
    }

    /// Resolves with the outcome of `job` once it is no longer in progress,
    /// even if later jobs or a reset have replaced the published status since.
    pub async fn wait_for(&self, job: JobId) -> Result<Block> {
        if job == 0 || job > self.inner.last_job.load(Ordering::SeqCst) {
            return Err(SandboxError::UnknownJob(job));
        }
        let mut rx = self.inner.status.subscribe();
        let mut settled = None;
        let closed = rx
            .wait_for(|_| {
                settled = self.inner.outcomes.lock().lookup(job);
                settled.is_some()
            })
            .await
            .is_err();
        match settled {
            Some(result) if !closed => result,
            _ => Err(SandboxError::Cancelled),
        }
    }

    pub async fn mine_and_wait(
        &self,
        data: impl Into<String>,
        difficulty: Difficulty,
    ) -> Result<Block> {
        let job = self.start_mining(data, difficulty);
        self.wait_for(job).await
    }
}

impl Inner {
    /// Called with `active` held, before the matching status is published.
    fn record(&self, job: JobId, outcome: JobOutcome) {
        self.outcomes.lock().record(job, outcome);
    }

    fn finish(
        &self,
        id: JobId,
        epoch: u64,
        block: Block,
        difficulty: Difficulty,
        outcome: Result<MiningStats>,
    ) {
        let mut active = self.active.lock();
        if active.as_ref().map(|job| job.id) != Some(id) {
            debug!(job = id, "mining result dropped; job no longer active");
            return;
        }
        active.take();

        let status = match outcome {
            Ok(stats) => {
                let mut chain = self.chain.lock();
                if chain.epoch() != epoch || !chain.extends_tip(&block) {
                    warn!(job = id, index = block.index, "chain moved while mining; block discarded");
                    self.record(id, JobOutcome::Discarded);
                    MiningStatus::Discarded { job: id }
                } else {
                    chain.push_mined(block.clone(), difficulty);
                    info!(
                        job = id,
                        index = block.index,
                        nonce = block.nonce,
                        attempts = stats.attempts,
                        hash_rate = stats.hash_rate(),
                        "background mining finished"
                    );
                    self.record(id, JobOutcome::Appended(block.clone()));
                    MiningStatus::Finished {
                        job: id,
                        block,
                        attempts: stats.attempts,
                        elapsed_ms: stats.elapsed.as_millis() as u64,
                    }
                }
            }
            Err(_) => {
                self.record(id, JobOutcome::Cancelled);
                MiningStatus::Cancelled { job: id }
            }
        };
        self.status.send_replace(status);
    }
}
