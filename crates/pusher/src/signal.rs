//! OS termination signals (SIGINT / SIGTERM)

use tracing::{info, warn};

use crate::error::Result;

/// Signal that started the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

/// Listener for interrupt and terminate signals
///
/// Handlers are installed in `new`, so a signal that arrives before `recv`
/// is awaited is not lost.
pub struct SignalListener {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl SignalListener {
    /// Install the signal handlers
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let terminate =
                signal(SignalKind::terminate()).map_err(crate::error::PusherError::Signal)?;
            Ok(Self { terminate })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next interrupt or terminate signal
    pub async fn recv(&mut self) -> ShutdownSignal {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            if self.terminate.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let signal = tokio::select! {
            _ = interrupt => ShutdownSignal::Interrupt,
            _ = terminate => ShutdownSignal::Terminate,
        };
        info!(signal = ?signal, "Received shutdown signal");
        signal
    }
}
