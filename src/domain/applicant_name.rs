#[derive(Debug, serde::Serialize)]
pub struct ApplicantName(String);

impl ApplicantName {
    /// Only presence is checked: any non-empty text is a valid name.
    pub fn parse(s: String) -> Result<ApplicantName, String> {
        if s.is_empty() {
            Err("The applicant name is missing".to_string())
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for ApplicantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicantName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
