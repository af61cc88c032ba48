use crate::credentials::{AccessTokenProvider, ServiceAccountKey, ServiceAccountTokens};
use crate::document_store::DocumentStoreClient;
use crate::domain::EmailAddress;
use crate::email_client::EmailClient;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub document_store: DocumentStoreSettings,
    pub email_client: EmailClientSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DocumentStoreSettings {
    pub base_url: String,
    pub project_id: String,
    pub database_id: String,
    /// Fixed bearer token, only meant for the local emulator.
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
    /// Takes precedence over `access_token` when set.
    #[serde(default)]
    pub service_account_key_path: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl DocumentStoreSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    /// Reads the service account key, if any, once at startup.
    pub fn credentials(&self) -> Result<AccessTokenProvider, anyhow::Error> {
        if let Some(key_path) = &self.service_account_key_path {
            let key = ServiceAccountKey::from_file(std::path::Path::new(key_path))?;
            let tokens = ServiceAccountTokens::new(key, self.timeout())?;
            return Ok(AccessTokenProvider::ServiceAccount(tokens));
        }
        match &self.access_token {
            Some(token) => Ok(AccessTokenProvider::Static(token.clone())),
            None => Err(anyhow::anyhow!(
                "The document store needs either `service_account_key_path` or `access_token`"
            )),
        }
    }

    pub fn client(self) -> Result<DocumentStoreClient, anyhow::Error> {
        let credentials = self.credentials()?;
        let timeout = self.timeout();
        let client = DocumentStoreClient::new(
            self.base_url,
            &self.project_id,
            &self.database_id,
            credentials,
            timeout,
        )?;
        Ok(client)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub recipient_email: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<EmailAddress, String> {
        EmailAddress::parse(self.sender_email.clone())
    }

    /// Where application notifications are delivered.
    pub fn recipient(&self) -> Result<EmailAddress, String> {
        EmailAddress::parse(self.recipient_email.clone())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn client(self) -> Result<EmailClient, anyhow::Error> {
        let sender = self.sender().map_err(anyhow::Error::msg)?;
        let timeout = self.timeout();
        let client = EmailClient::new(
            self.base_url,
            sender,
            self.sender_name,
            self.authorization_token,
            timeout,
        )?;
        Ok(client)
    }
}

/// Layers, last one wins:
/// `configuration/base`, `configuration/{APP_ENVIRONMENT}`, `APP_*` variables,
/// then `PORT`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let mut settings = config::Config::default();
    let configuration_directory = std::path::Path::new("configuration");

    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;

    // E.g. `APP_EMAIL_CLIENT__AUTHORIZATION_TOKEN=...` sets `email_client.authorization_token`
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    if let Ok(port) = std::env::var("PORT") {
        settings.set("application.port", port)?;
    }

    settings.try_into()
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
