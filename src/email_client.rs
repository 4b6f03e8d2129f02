use async_trait::async_trait;
use serde::Serialize;

use crate::configuration::EmailClientSettings;
use crate::error::EmailError;
use crate::validators::is_valid_email;

/// Outbound account mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation_mail(&self, recipient: &str, activation_url: &str) -> Result<(), EmailError>;

    async fn send_password_mail(&self, recipient: &str, password: &str) -> Result<(), EmailError>;
}

#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

#[derive(Clone, Debug)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, EmailError> {
        let email = is_valid_email(&s).map_err(|e| EmailError::InvalidRecipient(e.to_string()))?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "Html")]
    html: &'a str,
    #[serde(rename = "Text")]
    text: &'a str,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub fn from_settings(settings: &EmailClientSettings) -> Result<Self, EmailError> {
        let sender = SenderEmail::parse(settings.sender_email.clone())?;
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| EmailError::ServiceUnavailable(e.to_string()))?;
        Ok(Self::new(settings.base_url.clone(), sender, http_client))
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner(),
            to: recipient,
            subject,
            html: html_content,
            text: text_content,
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send email: {}", e);
                EmailError::SendFailed(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                EmailError::ServiceUnavailable(e.to_string())
            })?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for EmailClient {
    async fn send_activation_mail(&self, recipient: &str, activation_url: &str) -> Result<(), EmailError> {
        let html = format!(
            "<div><h1>Activate your account</h1>\
             <p>Follow the link to activate your account:</p>\
             <a href=\"{url}\">{url}</a></div>",
            url = activation_url
        );
        let text = format!("Activate your account: {}", activation_url);
        self.send_email(recipient, "Account activation", &html, &text).await
    }

    async fn send_password_mail(&self, recipient: &str, password: &str) -> Result<(), EmailError> {
        let html = format!(
            "<div><h1>Your new password</h1><p>Use this password to sign in: <b>{}</b></p></div>",
            password
        );
        let text = format!("Your new password: {}", password);
        self.send_email(recipient, "Password reset", &html, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_parse_valid_email() {
        let sender = SenderEmail::parse("noreply@example.com".to_string()).unwrap();
        assert_eq!(sender.inner(), "noreply@example.com");
    }

    #[test]
    fn test_sender_parse_invalid_email() {
        assert!(SenderEmail::parse("invalid-email".to_string()).is_err());
    }

    #[test]
    fn test_client_from_settings() {
        let settings = EmailClientSettings {
            base_url: "http://localhost:9000".to_string(),
            sender_email: "noreply@example.com".to_string(),
            timeout_milliseconds: 200,
        };
        assert!(EmailClient::from_settings(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let settings = EmailClientSettings {
            // reserved TEST-NET address, nothing listens there
            base_url: "http://192.0.2.1:9".to_string(),
            sender_email: "noreply@example.com".to_string(),
            timeout_milliseconds: 200,
        };
        let client = EmailClient::from_settings(&settings).unwrap();

        let result = client.send_activation_mail("a@b.com", "http://x/activate/1").await;
        assert!(result.is_err());
    }
}
