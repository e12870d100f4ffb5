use std::future::Future;
use std::time::Duration;

use axum::Router;
use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// How the server loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Every in-flight request finished inside the grace period.
    Drained,
    /// The grace period elapsed and the server task was aborted.
    Abandoned,
    /// The server stopped on its own, without a shutdown request.
    Exited,
}

/// Serve `app` until `shutdown` resolves, then drain for at most `grace`.
///
/// The server task is always finished or aborted, and awaited, before this
/// returns, so callers can release the store afterwards.
pub async fn serve_with_grace<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> ServeOutcome
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        _ = shutdown => {
            info!("hub: shutdown requested, draining for up to {}ms", grace.as_millis());
            let _ = stop_tx.send(());
            match tokio::time::timeout(grace, &mut server).await {
                Ok(Ok(Ok(()))) => {
                    info!("hub: server stopped");
                    ServeOutcome::Drained
                }
                Ok(Ok(Err(err))) => {
                    error!("hub: server error during shutdown: {err}");
                    ServeOutcome::Drained
                }
                Ok(Err(err)) => {
                    error!("hub: server task failed: {err}");
                    ServeOutcome::Drained
                }
                Err(_) => {
                    warn!("hub: grace period elapsed, abandoning in-flight requests");
                    server.abort();
                    if let Err(err) = (&mut server).await {
                        if !err.is_cancelled() {
                            error!("hub: server task failed: {err}");
                        }
                    }
                    ServeOutcome::Abandoned
                }
            }
        }
        result = &mut server => {
            match result {
                Ok(Ok(())) => warn!("hub: server exited unexpectedly"),
                Ok(Err(err)) => error!("hub: server error: {err}"),
                Err(err) => error!("hub: server task failed: {err}"),
            }
            ServeOutcome::Exited
        }
    }
}
