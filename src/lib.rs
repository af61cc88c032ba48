pub mod configuration;
pub mod credentials;
pub mod document_store;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
