use crate::domain::{ApplicantName, ApplicationMessage, ApplicationStatus, EmailAddress};

/// A validated membership application, shaped as the document that gets
/// stored in the `applications` collection.
#[derive(Debug, serde::Serialize)]
pub struct NewApplication {
    pub name: ApplicantName,
    pub email: EmailAddress,
    pub message: ApplicationMessage,
    /// Whatever the caller sent, `null` when absent.
    pub timestamp: serde_json::Value,
    pub status: ApplicationStatus,
}
