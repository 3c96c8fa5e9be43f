use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

use crate::config::email::EmailConfig;
use crate::utils::errors::AppError;

/// Outbound mail. Cloneable so callers can hand a copy to a spawned task and
/// let delivery happen off the request path.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Spawns `fut` and logs its failure instead of surfacing it. Mail
    /// delivery never decides the outcome of the request that triggered it.
    pub fn send_in_background<F>(fut: F)
    where
        F: std::future::Future<Output = Result<(), AppError>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = fut.await {
                tracing::warn!("Email delivery failed: {:?}", e);
            }
        });
    }

    #[instrument(skip(self))]
    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str) -> Result<(), AppError> {
        let html_body = self.branded_template(
            "Welcome",
            to_name,
            "Your account has been created. We're glad to have you on board.",
            None,
        );
        let text_body = format!(
            "Hi {},\n\n\
             Your account has been created. We're glad to have you on board.\n\n\
             Best regards,\n\
             Rolegate Team",
            to_name
        );

        self.send_email(to_email, "Welcome to Rolegate", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, verify_link, code))]
    pub async fn send_verification_email(
        &self,
        to_email: &str,
        to_name: &str,
        verify_link: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let body = format!(
            "Please confirm your email address. You can also enter the code <strong>{}</strong> instead of following the link.",
            code
        );
        let html_body = self.branded_template(
            "Confirm your email",
            to_name,
            &body,
            Some(("Confirm Email", verify_link)),
        );
        let text_body = format!(
            "Hi {},\n\n\
             Please confirm your email address by opening the link below, or enter the code {} in the app:\n\
             {}\n\n\
             Best regards,\n\
             Rolegate Team",
            to_name, code, verify_link
        );

        self.send_email(to_email, "Confirm your email", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, reset_link))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_link: &str,
    ) -> Result<(), AppError> {
        let html_body = self.branded_template(
            "Password Reset Request",
            to_name,
            "We received a request to reset your password. The link below expires in 30 minutes. If you didn't request this, you can ignore this email.",
            Some(("Reset Password", reset_link)),
        );
        let text_body = format!(
            "Hi {},\n\n\
             You requested to reset your password.\n\n\
             Click the link below to reset your password:\n\
             {}\n\n\
             This link will expire in 30 minutes.\n\n\
             If you didn't request this, please ignore this email.\n\n\
             Best regards,\n\
             Rolegate Team",
            to_name, reset_link
        );

        self.send_email(to_email, "Password Reset Request", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self))]
    pub async fn send_password_reset_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), AppError> {
        let html_body = self.branded_template(
            "Password Reset Successful",
            to_name,
            "Your password has been successfully reset. If you didn't make this change, please contact support immediately.",
            None,
        );
        let text_body = format!(
            "Hi {},\n\n\
             Your password has been successfully reset.\n\n\
             If you didn't make this change, please contact support immediately.\n\n\
             Best regards,\n\
             Rolegate Team",
            to_name
        );

        self.send_email(
            to_email,
            "Password Reset Successful",
            &text_body,
            &html_body,
        )
        .await
    }

    /// Sends an already-rendered HTML body, used by the stored-template
    /// delivery path.
    #[instrument(skip(self, html_body))]
    pub async fn send_rendered(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        self.send_email(to_email, subject, html_body, html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::debug!(to = to_email, subject, "Email sending disabled, skipping");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal(anyhow::anyhow!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal(anyhow::anyhow!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create SMTP relay: {}", e)))?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn branded_template(
        &self,
        title: &str,
        name: &str,
        body: &str,
        action: Option<(&str, &str)>,
    ) -> String {
        let action_block = match action {
            Some((label, link)) => format!(
                r#"<table width="100%" cellpadding="0" cellspacing="0" style="margin: 30px 0;">
                    <tr>
                        <td align="center">
                            <a href="{link}" style="display: inline-block; padding: 14px 40px; background-color: #4F46E5; color: #ffffff; text-decoration: none; border-radius: 6px; font-size: 16px; font-weight: bold;">{label}</a>
                        </td>
                    </tr>
                </table>
                <p style="margin: 0 0 10px 0; color: #666666; font-size: 14px; line-height: 1.5;">
                    Or copy and paste this link into your browser:
                </p>
                <p style="margin: 0 0 20px 0; color: #4F46E5; font-size: 14px; word-break: break-all;">{link}</p>"#
            ),
            None => String::new(),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
                    <tr>
                        <td style="background-color: #4F46E5; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">Rolegate</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px;">
                            <h2 style="margin: 0 0 20px 0; color: #333333; font-size: 24px;">{title}</h2>
                            <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                                Hi <strong>{name}</strong>,
                            </p>
                            <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                                {body}
                            </p>
                            {action_block}
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 20px 30px; text-align: center; border-top: 1px solid #e9ecef;">
                            <p style="margin: 0; color: #999999; font-size: 12px;">
                                This is an automated email from Rolegate. Please do not reply.
                            </p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
        )
    }
}
