use super::{DeathReason, Heart};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::lock::Mutex;
use jatsl::{JobScheduler, State, StatusServer};
use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

/// Executable module
#[async_trait]
pub trait Module {
    /// Executed before running the core loop, e.g. to validate the configuration
    async fn pre_startup(&mut self) -> EmptyResult {
        Ok(())
    }

    /// Core run loop of the module
    ///
    /// Usually schedules the jobs of the module and returns a [`Heart`] whose death is
    /// awaited before all jobs are terminated. Returning `None` terminates right away.
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError>;

    /// Shutdown hook executed after the core loop and all associated jobs have terminated
    async fn post_shutdown(&mut self, termination_reason: ModuleTerminationReason) {
        match termination_reason {
            ModuleTerminationReason::HeartDied(_) | ModuleTerminationReason::ExitedNormally => {
                info!("Module exited normally")
            }
            reason => error!(%reason, "Module terminated with an error"),
        }
    }
}

/// Reason why a module has terminated
#[derive(Error, Debug)]
pub enum ModuleTerminationReason {
    /// Startup routine threw an error
    #[error("startup routine threw an error: {0}")]
    StartupFailed(#[source] BoxedError),
    /// Core run loop threw an error
    #[error("error during operation: {0}")]
    OperationalError(#[source] BoxedError),
    /// [`Heart`] provided by module died
    #[error("heart provided by module died: {0}")]
    HeartDied(DeathReason),
    /// Run loop exited cleanly
    #[error("run loop exited cleanly")]
    ExitedNormally,
    /// Startup took longer than permitted
    #[error("timeout during startup")]
    Timeout,
}

/// Runner for [`Module`] implementations
pub struct ModuleRunner {
    startup_timeout: Duration,
    shutdown_timeout: Duration,
    job_termination_timeout: Duration,
    status_server_port: Option<u16>,
}

impl ModuleRunner {
    /// Creates a new instance using default timeouts and optionally exposing job states over HTTP
    pub fn new(status_server_port: Option<u16>) -> Self {
        Self {
            status_server_port,
            ..Default::default()
        }
    }
}

impl Default for ModuleRunner {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(60),
            job_termination_timeout: Duration::from_secs(5),
            status_server_port: None,
        }
    }
}

impl ModuleRunner {
    /// Executes a [`Module`] by calling its lifecycle functions in order until it exits
    #[instrument(skip(self, module), fields(module_name = type_name::<M>()))]
    pub async fn run<M: Module + Send + Sync>(&self, mut module: M) {
        let scheduler = JobScheduler::default();

        let status_state = if let Some(port) = self.status_server_port {
            info!(port, "Spawning status server");
            let (status_state, status_server) = StatusServer::new(&scheduler, port);
            scheduler.spawn_job(status_server).await;
            Some(status_state)
        } else {
            None
        };

        info!("Commencing module startup sequence");
        let termination_reason = match timeout(self.startup_timeout, module.pre_startup()).await {
            Ok(Ok(_)) => self.run_loop(&mut module, &scheduler, &status_state).await,
            Ok(Err(error)) => {
                error!(%error, "Module startup sequence encountered an error");
                ModuleTerminationReason::StartupFailed(error)
            }
            Err(_) => {
                error!("Module startup sequence timed out");
                ModuleTerminationReason::Timeout
            }
        };

        if let Some(state) = status_state {
            *state.lock().await = State::Shutdown;
        }

        info!("Terminating remaining jobs");
        scheduler
            .terminate_jobs(self.job_termination_timeout)
            .await;

        info!("Commencing module shutdown sequence");
        let shutdown = module.post_shutdown(termination_reason);

        if timeout(self.shutdown_timeout, shutdown).await.is_err() {
            error!("Module shutdown sequence timed out");
        }
    }

    async fn run_loop<M: Module + Send + Sync>(
        &self,
        module: &mut M,
        scheduler: &JobScheduler,
        status_state: &Option<Arc<Mutex<State>>>,
    ) -> ModuleTerminationReason {
        info!("Executing module run procedure");

        let heart = match module.run(scheduler).await {
            Ok(heart) => heart,
            Err(error) => {
                error!(%error, "Module run procedure encountered an error");
                return ModuleTerminationReason::OperationalError(error);
            }
        };

        if let Some(state) = status_state {
            *state.lock().await = State::Running;
        }

        match heart {
            None => {
                debug!("Module run procedure completed");
                ModuleTerminationReason::ExitedNormally
            }
            Some(mut heart) => {
                debug!("Module run procedure completed, waiting for heart to die");
                let death_reason = heart.death().await;
                info!(%death_reason, "Heart provided by run procedure died");
                ModuleTerminationReason::HeartDied(death_reason)
            }
        }
    }
}
