//! Pod Status Logger: records the name, node and phase of every pod in a
//! Kubernetes cluster to an append-only log file.
//!
//! When running inside the cluster, replicas elect a leader through a lease and only the
//! leader runs a logging pass. Outside the cluster a single pass runs unguarded.
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use environment::RuntimeEnvironment;
use error::ResultOkLogExt;

pub mod cluster;
pub mod config;
pub mod election;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod logger;
pub mod pod;
pub mod reporter;

use cluster::KubePodLister;
use config::Config;
use election::{KubeLeaseLock, LeaderElector};
use logger::ConcurrentLogger;
use reporter::PodStatusReporter;

/// Runs the Pod Status Logger.
///
/// Parses the command line, detects the runtime environment and either joins the
/// leader election or runs a single logging pass.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid configuration or an empty election identity.
/// - Failure to load cluster credentials or to build the client.
/// - A failed logging pass when running locally.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    run_with(config).await?;
    Ok(())
}

async fn run_with(config: Config) -> error::Result<()> {
    let runtime_env = environment::detect_runtime_environment(environment::SERVICE_ACCOUNT_DIR);
    log::debug!("Runtime environment: {:?}", runtime_env);

    let logger = ConcurrentLogger::new(&config.log_file);
    match runtime_env {
        RuntimeEnvironment::InCluster => {
            let client = cluster::connect_in_cluster()?;
            let identity = config.identity()?;
            let election = config.election();
            let lock = KubeLeaseLock::new(
                client.clone(),
                config.lease_namespace.clone(),
                config.lease_name.clone(),
                identity.clone(),
                election.lease_duration,
            )?;
            let reporter = Arc::new(PodStatusReporter::new(
                KubePodLister::new(client),
                logger,
                identity,
            ));
            let elector = LeaderElector::new(lock, reporter, election)?;

            let shutdown = CancellationToken::new();
            tokio::spawn(cancel_on_signal(shutdown.clone()));
            elector.run(shutdown).await;
        }
        RuntimeEnvironment::Local => {
            let client = cluster::connect_local(&config.kubeconfig_path()?).await?;
            println!("Running locally, skipping leader election.");
            let reporter = PodStatusReporter::new(KubePodLister::new(client), logger, "local");
            reporter.run_pass().await?;
        }
    }

    Ok(())
}

/// Cancels `shutdown` on SIGINT or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    if wait_for_signal()
        .await
        .map_err(error::Error::Signal)
        .ok_log()
        .is_some()
    {
        log::info!("Received shutdown signal");
        shutdown.cancel();
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
