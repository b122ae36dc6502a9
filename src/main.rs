/// Entry point for the Pod Status Logger.
///
/// Inside a Kubernetes cluster the replicas of this binary elect a leader through a
/// lease; the leader appends one `Pod Name: <name>, Node: <node>, Phase: <phase>` line
/// per pod to the log file each time it acquires leadership. Outside a cluster a single
/// pass runs against the cluster of the local kubeconfig.
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., unreadable kubeconfig, invalid
/// election timings, or an empty identity) or if the local pass fails.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info POD_NAME=pod-status-logger-0 cargo run -- --log-file /var/log/pods.log
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    pod_status_logger::run().await
}
