use actix_web::dev::ServerHandle;
use tokio::signal;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Interrupt,
    Terminate,
}

pub async fn shutdown_signal() -> Shutdown {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => Shutdown::Interrupt,
        _ = terminate => Shutdown::Terminate,
    }
}

/// Waits for Ctrl+C or SIGTERM, then stops the server once in-flight requests finish.
pub async fn stop_on_signal(handle: ServerHandle) {
    let received = shutdown_signal().await;
    warn!("🛑 {:?} received, draining in-flight requests...", received);
    handle.stop(true).await;
}
