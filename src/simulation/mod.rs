use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use validator::Validate;

use crate::config::{AnnealConfig, MinimizeConfig};
use crate::error::ComputeError;
use crate::mcmc::anneal_ensemble;
use crate::minimize::minimize_orientations;
use crate::spins::Dipole;

/// Cooperative cancellation flag shared between a caller and one worker.
///
/// Compute loops poll it between iterations; cancelling is a request, the
/// worker still reports [`ComputeError::Cancelled`] through its channel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// The raw flag, in the shape the compute loops poll.
    pub fn flag(&self) -> &AtomicBool {
        &self.flag
    }
}

/// Result of a finished run: the updated dipole list and its energy in eV.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub dipoles: Vec<Dipole>,
    pub energy: f64,
}

/// Handle to one background run. The worker owns its dipole snapshot and
/// reports exactly once; nothing is shared with the caller except the
/// cancellation flag.
#[derive(Debug)]
pub struct JobHandle {
    rx: Receiver<Result<JobOutput, ComputeError>>,
    token: CancelToken,
    join: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Non-blocking poll. `None` while the worker is still running.
    pub fn try_result(&mut self) -> Option<Result<JobOutput, ComputeError>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.reap();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.reap();
                Some(Err(ComputeError::Disconnected))
            }
        }
    }

    /// Block until the worker reports.
    pub fn wait(mut self) -> Result<JobOutput, ComputeError> {
        let result = self
            .rx
            .recv()
            .unwrap_or(Err(ComputeError::Disconnected));
        self.reap();
        result
    }

    fn reap(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn spawn_worker<F>(compute: F) -> JobHandle
where
    F: FnOnce(&AtomicBool) -> Result<JobOutput, ComputeError> + Send + 'static,
{
    let token = CancelToken::new();
    let worker_token = token.clone();
    let (tx, rx): (SyncSender<_>, Receiver<_>) = mpsc::sync_channel(1);
    let join = thread::spawn(move || {
        let result = compute(worker_token.flag());
        let _ = tx.send(result);
    });
    JobHandle {
        rx,
        token,
        join: Some(join),
    }
}

/// Start a conjugate-gradient minimization on a dedicated worker thread.
///
/// The configuration is validated synchronously; the dipole snapshot moves
/// into the worker. Completion arrives once through the handle.
pub fn spawn_minimize(
    dipoles: Vec<Dipole>,
    config: MinimizeConfig,
) -> Result<JobHandle, ComputeError> {
    config
        .validate()
        .map_err(|e| ComputeError::Config(e.to_string()))?;
    Ok(spawn_worker(move |interrupted| {
        let mut dipoles = dipoles;
        let energy = minimize_orientations(&mut dipoles, &config, interrupted)?;
        Ok(JobOutput { dipoles, energy })
    }))
}

/// Start a Metropolis annealing run (single- or multi-chain per
/// `config.chains`) on a dedicated worker thread.
pub fn spawn_anneal(dipoles: Vec<Dipole>, config: AnnealConfig) -> Result<JobHandle, ComputeError> {
    config
        .validate()
        .map_err(|e| ComputeError::Config(e.to_string()))?;
    Ok(spawn_worker(move |interrupted| {
        let (dipoles, energy) = anneal_ensemble(&dipoles, &config, interrupted)?;
        Ok(JobOutput { dipoles, energy })
    }))
}

/// Per-kind run slots: at most one minimization and one annealing run in
/// flight at a time. A submission while the slot is busy is rejected with
/// [`ComputeError::Busy`]; finished handles are reaped on the next
/// submission.
#[derive(Debug, Default)]
pub struct Scheduler {
    minimize: Option<JobHandle>,
    anneal: Option<JobHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_minimize(
        &mut self,
        dipoles: Vec<Dipole>,
        config: MinimizeConfig,
    ) -> Result<&mut JobHandle, ComputeError> {
        if self.minimize.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ComputeError::Busy("minimize"));
        }
        Ok(self.minimize.insert(spawn_minimize(dipoles, config)?))
    }

    pub fn start_anneal(
        &mut self,
        dipoles: Vec<Dipole>,
        config: AnnealConfig,
    ) -> Result<&mut JobHandle, ComputeError> {
        if self.anneal.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ComputeError::Busy("anneal"));
        }
        Ok(self.anneal.insert(spawn_anneal(dipoles, config)?))
    }

    pub fn minimize_job(&mut self) -> Option<&mut JobHandle> {
        self.minimize.as_mut()
    }

    pub fn anneal_job(&mut self) -> Option<&mut JobHandle> {
        self.anneal.as_mut()
    }

    /// Drop a finished minimize handle, returning its result if it reported.
    pub fn take_minimize_result(&mut self) -> Option<Result<JobOutput, ComputeError>> {
        let result = self.minimize.as_mut().and_then(JobHandle::try_result);
        if result.is_some() {
            self.minimize = None;
        }
        result
    }

    /// Drop a finished anneal handle, returning its result if it reported.
    pub fn take_anneal_result(&mut self) -> Option<Result<JobOutput, ComputeError>> {
        let result = self.anneal.as_mut().and_then(JobHandle::try_result);
        if result.is_some() {
            self.anneal = None;
        }
        result
    }
}
