use tributary::AbortSignal;

/// Set up the Ctrl+C handler for graceful shutdown.
///
/// The first Ctrl+C fires `signal`, letting running syncs stop after the
/// item in flight; the second exits immediately.
pub(crate) fn setup_shutdown_handler(signal: AbortSignal) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        tracing::warn!("Shutdown requested, finishing current item (Ctrl+C again to force quit)");
        signal.abort();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Force quit");
            std::process::exit(130);
        }
    });
}
