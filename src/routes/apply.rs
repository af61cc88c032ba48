use crate::document_store::{DocumentId, DocumentStoreClient, StoreError};
use crate::domain::{
    ApplicantName, ApplicationMessage, ApplicationStatus, EmailAddress, NewApplication,
};
use crate::email_client::EmailClient;
use crate::startup::NotificationRecipient;
use crate::utils::{error_chain_fmt, internal_server_error, ErrorBody};
use actix_web::http::StatusCode;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError};

pub const APPLICATIONS_COLLECTION: &str = "applications";
pub const NOTIFICATION_SUBJECT: &str = "New Application Received";

/// Fields are kept loosely typed: a value that is not a non-empty string
/// counts as missing rather than as an unreadable payload.
#[derive(serde::Deserialize, Default, Debug)]
pub struct ApplicationForm {
    name: Option<serde_json::Value>,
    email: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
    #[serde(default)]
    timestamp: serde_json::Value,
}

impl ApplicationForm {
    /// Only JSON bodies are read. An empty body, a non-JSON content type or a
    /// JSON value that is not an object all yield an empty form; malformed
    /// JSON is the only failure.
    pub fn parse(content_type: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let is_json = content_type == "application/json" || content_type.ends_with("+json");
        if body.is_empty() || !is_json {
            return Ok(Self::default());
        }
        let value: serde_json::Value = serde_json::from_slice(body)?;
        match value {
            object @ serde_json::Value::Object(_) => serde_json::from_value(object),
            _ => Ok(Self::default()),
        }
    }
}

fn required_text(value: Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(text)) => text,
        _ => String::new(),
    }
}

impl TryFrom<ApplicationForm> for NewApplication {
    type Error = String;

    fn try_from(value: ApplicationForm) -> Result<Self, Self::Error> {
        let name = ApplicantName::parse(required_text(value.name))?;
        let email = EmailAddress::parse(required_text(value.email))?;
        let message = ApplicationMessage::parse(required_text(value.message))?;
        Ok(Self {
            name,
            email,
            message,
            timestamp: value.timestamp,
            status: ApplicationStatus::Pending,
        })
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationAccepted {
    success: bool,
    reference_id: DocumentId,
}

#[derive(thiserror::Error)]
pub enum ApplyError {
    #[error("The request body is not valid JSON")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to store the application")]
    PersistenceError(#[source] StoreError),
    // The application is already stored when this happens.
    #[error("Failed to send the application notification")]
    NotificationError(#[source] reqwest::Error),
}

impl std::fmt::Debug for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ApplyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApplyError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApplyError::MalformedPayload(_)
            | ApplyError::PersistenceError(_)
            | ApplyError::NotificationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ApplyError::MalformedPayload(_) => return internal_server_error(),
            ApplyError::ValidationError(_) => "Missing required fields",
            ApplyError::PersistenceError(_) | ApplyError::NotificationError(_) => "Server error",
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error })
    }
}

#[tracing::instrument(
    name = "Submitting a membership application",
    skip(request, body, document_store, email_client, recipient),
    fields(
        applicant_email = tracing::field::Empty,
        applicant_name = tracing::field::Empty,
        reference_id = tracing::field::Empty
    )
)]
pub async fn apply(
    request: HttpRequest,
    body: web::Bytes,
    document_store: web::Data<DocumentStoreClient>,
    email_client: web::Data<EmailClient>,
    recipient: web::Data<NotificationRecipient>,
) -> Result<HttpResponse, ApplyError> {
    let form = ApplicationForm::parse(request.content_type(), &body)
        .map_err(ApplyError::MalformedPayload)?;
    let new_application: NewApplication =
        form.try_into().map_err(ApplyError::ValidationError)?;
    tracing::Span::current()
        .record("applicant_email", &tracing::field::display(&new_application.email))
        .record("applicant_name", &tracing::field::display(&new_application.name));

    let reference_id = store_application(&document_store, &new_application)
        .await
        .map_err(ApplyError::PersistenceError)?;
    tracing::Span::current().record("reference_id", &tracing::field::display(&reference_id));

    send_notification_email(&email_client, &recipient.0, &new_application)
        .await
        .map_err(ApplyError::NotificationError)?;

    Ok(HttpResponse::Created().json(ApplicationAccepted {
        success: true,
        reference_id,
    }))
}

#[tracing::instrument(
    name = "Saving new application in the document store",
    skip(document_store, new_application)
)]
pub async fn store_application(
    document_store: &DocumentStoreClient,
    new_application: &NewApplication,
) -> Result<DocumentId, StoreError> {
    document_store
        .insert_document(APPLICATIONS_COLLECTION, new_application)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store the application: {:?}", e);
            e
        })
}

#[tracing::instrument(
    name = "Send an application notification",
    skip(email_client, recipient, new_application)
)]
pub async fn send_notification_email(
    email_client: &EmailClient,
    recipient: &EmailAddress,
    new_application: &NewApplication,
) -> Result<(), reqwest::Error> {
    email_client
        .send_email(
            recipient,
            NOTIFICATION_SUBJECT,
            &notification_html(new_application),
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to send the notification email: {:?}", e);
            e
        })
}

/// Applicant input is escaped before it lands in the markup.
fn notification_html(new_application: &NewApplication) -> String {
    format!(
        "<h3>New Application</h3>\
        <p><b>Name:</b> {}</p>\
        <p><b>Email:</b> {}</p>\
        <p><b>Message:</b> {}</p>",
        htmlescape::encode_minimal(new_application.name.as_ref()),
        htmlescape::encode_minimal(new_application.email.as_ref()),
        htmlescape::encode_minimal(new_application.message.as_ref()),
    )
}
