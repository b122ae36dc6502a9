use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;

use super::{
    ElectionConfig, LeaderState, LeaderStateMachine, LeaseLock, LeaseObservation, Result,
    Transition,
};

/// Callbacks invoked on leadership transitions.
pub trait LeadershipHandler: Send + Sync + 'static {
    /// Runs once every time this replica becomes leader.
    ///
    /// Runs on its own task. Lease renewal continues while it runs, and losing
    /// leadership does not cancel it.
    fn on_started_leading(&self) -> impl std::future::Future<Output = ()> + Send;

    /// Called after leadership was lost or given up.
    fn on_stopped_leading(&self);

    /// Called whenever the observed lease holder changes, including to ourselves.
    fn on_new_leader(&self, identity: &str);
}

/// Runs the election loop for one replica.
pub struct LeaderElector<L, H> {
    lock: L,
    handler: Arc<H>,
    config: ElectionConfig,
    machine: LeaderStateMachine,
    passes: JoinSet<()>,
}

impl<L, H> LeaderElector<L, H>
where
    L: LeaseLock,
    H: LeadershipHandler,
{
    /// Creates an elector in the follower state.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::InvalidConfig`] if `config` does not validate.
    pub fn new(lock: L, handler: Arc<H>, config: ElectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            lock,
            handler,
            config,
            machine: LeaderStateMachine::new(),
            passes: JoinSet::new(),
        })
    }

    pub fn state(&self) -> LeaderState {
        self.machine.state()
    }

    /// Competes for the lease until `shutdown` is cancelled.
    ///
    /// After losing leadership the elector goes back to acquiring. On shutdown a held
    /// lease is released and passes still in flight are awaited before returning.
    pub async fn run(mut self, shutdown: CancellationToken) {
        log::info!(
            "starting leader election for lease {} as `{}`",
            self.lock.describe(),
            self.lock.identity()
        );

        while self.acquire(&shutdown).await {
            self.start_pass();

            if self.renew(&shutdown).await {
                log::info!("leader lease {} lost", self.lock.describe());
                self.handler.on_stopped_leading();
                continue;
            }

            if let Err(err) = self.lock.release().await {
                log::error!("failed to release lease: {}", err);
            }
            if self.machine.stop() == Some(Transition::StoppedLeading) {
                self.handler.on_stopped_leading();
            }
            break;
        }
        self.machine.stop();

        while let Some(result) = self.passes.join_next().await {
            log_pass_result(result);
        }
        log::info!("leader election stopped");
    }

    /// Retries acquisition every retry period. Returns `false` if shut down first.
    async fn acquire(&mut self, shutdown: &CancellationToken) -> bool {
        self.machine.begin_acquire();
        log::info!("attempting to acquire leader lease {}", self.lock.describe());

        loop {
            if shutdown.is_cancelled() {
                return false;
            }

            let attempt = tokio::select! {
                _ = shutdown.cancelled() => return false,
                attempt = self.lock.try_acquire_or_renew() => attempt,
            };
            match attempt {
                Ok(observation) => {
                    self.observe_leader(&observation);
                    if self.machine.observe(observation.acquired)
                        == Some(Transition::StartedLeading)
                    {
                        log::info!("successfully acquired lease {}", self.lock.describe());
                        return true;
                    }
                }
                Err(err) => log::error!("error acquiring lease: {}", err),
            }

            tokio::select! {
                _ = shutdown.cancelled() => return false,
                _ = sleep(self.config.retry_period) => {}
            }
        }
    }

    /// Renews the lease every retry period.
    ///
    /// All attempts after a successful renewal share one renew deadline, measured from
    /// that renewal. Returns `true` once leadership is lost and `false` if shut down
    /// while leading.
    async fn renew(&mut self, shutdown: &CancellationToken) -> bool {
        let mut last_renewal = Instant::now();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return false,
                _ = sleep(self.config.retry_period) => {}
            }

            let remaining = self
                .config
                .renew_deadline
                .saturating_sub(last_renewal.elapsed());
            let renewed = if remaining.is_zero() {
                log::warn!("renew deadline passed without a successful renewal");
                false
            } else {
                let attempt = tokio::select! {
                    _ = shutdown.cancelled() => return false,
                    attempt = timeout(remaining, self.lock.try_acquire_or_renew()) => attempt,
                };
                match attempt {
                    Ok(Ok(observation)) => {
                        self.observe_leader(&observation);
                        observation.acquired
                    }
                    Ok(Err(err)) => {
                        log::warn!("failed to renew lease: {}", err);
                        if last_renewal.elapsed() < self.config.renew_deadline {
                            continue;
                        }
                        false
                    }
                    Err(_) => {
                        log::warn!("renewing lease timed out");
                        false
                    }
                }
            };

            if renewed {
                last_renewal = Instant::now();
                log::trace!("renewed lease {}", self.lock.describe());
                continue;
            }

            if self.machine.observe(false) == Some(Transition::StoppedLeading) {
                return true;
            }
        }
    }

    fn start_pass(&mut self) {
        while let Some(result) = self.passes.try_join_next() {
            log_pass_result(result);
        }

        let handler = Arc::clone(&self.handler);
        self.passes
            .spawn(async move { handler.on_started_leading().await });
    }

    fn observe_leader(&mut self, observation: &LeaseObservation) {
        if let Some(holder) = observation.holder.as_deref() {
            if self.machine.observe_leader(holder) {
                self.handler.on_new_leader(holder);
            }
        }
    }
}

fn log_pass_result(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        log::error!("leader pass did not complete: {}", err);
    }
}
