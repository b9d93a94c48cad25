use std::process;

const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() {
    folio::telemetry::init();

    let state = match folio::initialize_state().await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(
                error = %err,
                "cannot initialize application state"
            );
            process::exit(1);
        },
    };

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .or(state.config.port)
        .unwrap_or(DEFAULT_PORT);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await
    {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %port, "cannot bind port");
            process::exit(1);
        },
    };
    tracing::info!(%port, "server started");

    if let Err(err) = axum::serve(listener, folio::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server exited with error");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
