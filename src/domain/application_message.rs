#[derive(Debug, serde::Serialize)]
pub struct ApplicationMessage(String);

impl ApplicationMessage {
    pub fn parse(s: String) -> Result<ApplicationMessage, String> {
        if s.is_empty() {
            Err("The application message is missing".to_string())
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for ApplicationMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
