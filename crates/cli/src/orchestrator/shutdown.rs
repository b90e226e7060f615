// Path: crates/cli/src/orchestrator/shutdown.rs

/// Resolves on Ctrl-C, or on SIGTERM where supported.
pub async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "shutdown", error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(target: "shutdown", error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!(target: "shutdown", "Interrupted (Ctrl-C)"),
        _ = terminate => tracing::warn!(target: "shutdown", "Terminated (SIGTERM)"),
    }
}
