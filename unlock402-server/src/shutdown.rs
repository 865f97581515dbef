//! Graceful shutdown on SIGTERM / SIGINT (Ctrl-C elsewhere).

use tokio_util::sync::CancellationToken;

/// Returns a token that is cancelled when the process is asked to stop.
///
/// The listener task is spawned on the current runtime.
///
/// # Errors
///
/// Returns an I/O error if a signal handler cannot be installed.
pub fn shutdown_token() -> Result<CancellationToken, std::io::Error> {
    let token = CancellationToken::new();
    let trigger = token.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
            }
            trigger.cancel();
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        trigger.cancel();
    });

    Ok(token)
}
