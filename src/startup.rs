use std::net::TcpListener;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::document_store::DocumentStoreClient;
use crate::domain::EmailAddress;
use crate::email_client::EmailClient;
use crate::routes::{apply, health_check};
use crate::utils::fallback_error_handlers;

/// Fixed destination of application notifications.
pub struct NotificationRecipient(pub EmailAddress);

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let recipient = configuration
            .email_client
            .recipient()
            .map_err(anyhow::Error::msg)?;
        let email_client = configuration.email_client.client()?;
        let document_store = configuration.document_store.client()?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, document_store, email_client, recipient)?;

        tracing::info!("NEXUS backend service online, listening on port {}", port);
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Runs until a shutdown signal (SIGINT, SIGTERM) drains the workers.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
}

pub fn run(
    listener: TcpListener,
    document_store: DocumentStoreClient,
    email_client: EmailClient,
    recipient: EmailAddress,
) -> Result<Server, std::io::Error> {
    let document_store = Data::new(document_store);
    let email_client = Data::new(email_client);
    let recipient = Data::new(NotificationRecipient(recipient));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(fallback_error_handlers())
            .wrap(cors())
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .route("/api/apply", web::post().to(apply))
            .app_data(document_store.clone())
            .app_data(email_client.clone())
            .app_data(recipient.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
