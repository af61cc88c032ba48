/// An email address as typed by a person or an operator.
///
/// The format is deliberately not checked: applicants are contacted by a
/// human who reads the notification, not by this service.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(s: String) -> Result<EmailAddress, String> {
        if s.is_empty() {
            Err("The email address is missing".to_string())
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
