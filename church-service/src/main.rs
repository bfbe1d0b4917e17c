use church_service::{config::ChurchConfig, startup::Application};
use service_core::error::AppError;
use service_core::observability::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Fail fast on bad configuration
    let config = ChurchConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        deny_inactive_users = config.tenant.deny_inactive_users,
        "Starting church service"
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await
}
