mod applicant_name;
mod application_message;
mod application_status;
mod email_address;
mod new_application;

pub use applicant_name::ApplicantName;
pub use application_message::ApplicationMessage;
pub use application_status::ApplicationStatus;
pub use email_address::EmailAddress;
pub use new_application::NewApplication;
