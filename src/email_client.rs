use crate::domain::EmailAddress;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: EmailAddress,
    sender_name: Option<String>,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: EmailAddress,
        sender_name: Option<String>,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            sender_name,
            authorization_token,
        })
    }

    /// One attempt, no retry. Any non-2xx answer is an error.
    pub async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/email", self.base_url);
        let from = self.from_header();
        let request_body = SendEmailRequest {
            from: &from,
            to: recipient.as_ref(),
            subject,
            html_body: html_content,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn from_header(&self) -> String {
        match &self.sender_name {
            Some(name) => format!("\"{}\" <{}>", name, self.sender),
            None => self.sender.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}
