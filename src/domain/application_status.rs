/// Review state of a stored application.
///
/// Only the initial state is ever written here; reviews happen outside this
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
        }
    }
}
