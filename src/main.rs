use anyhow::Context;
use nexus_backend::configuration::get_configuration;
use nexus_backend::startup::Application;
use nexus_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("nexus-backend".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration")?;
    let application = Application::build(configuration)?;
    application.run_until_stopped().await?;
    tracing::info!("NEXUS backend service stopped");
    Ok(())
}
