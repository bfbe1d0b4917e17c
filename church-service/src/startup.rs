//! Server lifecycle: bind, serve, shut down gracefully.

use service_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::ChurchConfig;
use crate::services::Database;
use crate::{build_router, AppState};

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: axum::Router,
}

impl Application {
    /// Connect to PostgreSQL, apply migrations and bind the listener.
    pub async fn build(config: ChurchConfig) -> Result<Self, AppError> {
        let db = Arc::new(Database::connect(&config.database).await?);
        db.run_migrations().await?;
        tracing::info!("Database initialized successfully");

        let state = AppState::new(config, db.clone(), db);
        Self::with_state(state).await
    }

    /// Bind with prepared state. Port 0 picks an ephemeral port.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let address = state.config.common.bind_address();
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        tracing::info!(address = %address, port, "Listening");

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until<F>(self, signal: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
