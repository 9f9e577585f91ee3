//! Email service for welcome messages and password-reset links.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    base_url: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                // File transport for development/testing
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            base_url: config.public_url.clone(),
        })
    }

    pub async fn send_welcome_email(&self, to_email: &str, username: &str) -> Result<(), Error> {
        let subject = "¡Bienvenido a nuestra plataforma!";
        let body = self.create_welcome_body(username);
        self.send_email(to_email, subject, &body).await
    }

    pub async fn send_password_reset_email(&self, to_email: &str, token: &str, expire_minutes: u64) -> Result<(), Error> {
        let reset_link = format!("{}/auth/password-reset?token={}", self.base_url, token);

        let subject = "Restablecimiento de contraseña";
        let body = self.create_password_reset_body(&reset_link, expire_minutes);
        self.send_email(to_email, subject, &body).await
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = to_email.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_welcome_body(&self, username: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Bienvenido</title>
</head>
<body>
    <div style="max-width: 600px; margin: 0 auto; padding: 20px; font-family: Arial, sans-serif;">
        <h2>¡Hola {username}!</h2>
        <p>Tu cuenta ha sido creada exitosamente. Ya puedes empezar a registrar tus jardines y plantas.</p>
        <p>Este es un mensaje automático, por favor no respondas a este correo.</p>
    </div>
</body>
</html>"#
        )
    }

    fn create_password_reset_body(&self, reset_link: &str, expire_minutes: u64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Restablecimiento de contraseña</title>
</head>
<body>
    <div style="max-width: 600px; margin: 0 auto; padding: 20px; font-family: Arial, sans-serif;">
        <h2>Restablecimiento de contraseña</h2>
        <p>Hemos recibido una solicitud para restablecer tu contraseña. Si no hiciste esta solicitud, puedes ignorar este correo.</p>
        <p>Para restablecer tu contraseña, haz clic en el siguiente enlace:</p>
        <p><a href="{reset_link}">Restablecer contraseña</a></p>
        <p>O copia y pega este enlace en tu navegador:</p>
        <p>{reset_link}</p>
        <p>Este enlace expirará en {expire_minutes} minutos.</p>
    </div>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailTransportConfig;

    fn test_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            secret_key: Some("test-secret".to_string()),
            ..Default::default()
        };
        config.email.transport = EmailTransportConfig::File {
            path: dir.keep().to_string_lossy().into_owned(),
        };
        config
    }

    #[tokio::test]
    async fn test_email_service_creation() {
        let config = test_config();
        assert!(EmailService::new(&config).is_ok());
    }

    #[test]
    fn test_password_reset_body_contains_link_and_expiry() {
        let config = test_config();
        let service = EmailService::new(&config).unwrap();

        let body = service.create_password_reset_body("http://localhost:8000/auth/password-reset?token=abc123", 30);

        assert!(body.contains("http://localhost:8000/auth/password-reset?token=abc123"));
        assert!(body.contains("30 minutos"));
        assert!(body.contains("Restablecer contraseña"));
    }

    #[test]
    fn test_welcome_body_greets_by_username() {
        let config = test_config();
        let service = EmailService::new(&config).unwrap();

        let body = service.create_welcome_body("au");
        assert!(body.contains("¡Hola au!"));
    }

    #[tokio::test]
    async fn test_file_transport_writes_reset_email() {
        let config = test_config();
        let service = EmailService::new(&config).unwrap();

        service
            .send_password_reset_email("user@example.com", "tok-123", 30)
            .await
            .unwrap();
    }
}
