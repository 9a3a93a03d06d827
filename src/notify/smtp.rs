//! Fallback transport — authenticated SMTP submission via lettre.

use lettre::Transport;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::{PoolConfig, SmtpTransport};
use secrecy::{ExposeSecret, SecretString};

use crate::error::TransportError;
use crate::notify::transport::{MailTransport, OutgoingMail, build_message, parse_mailbox};

/// Port that expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP mailer holding one authenticated connection for the whole run.
pub struct SmtpMailer {
    from: Mailbox,
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Open and verify the session with the submission server.
    pub fn connect(
        host: &str,
        port: u16,
        sender: &str,
        credential: SecretString,
    ) -> Result<Self, TransportError> {
        let from = parse_mailbox(sender)?;
        let creds = Credentials::new(sender.to_string(), credential.expose_secret().to_string());

        let builder = if port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(host)
        } else {
            SmtpTransport::starttls_relay(host)
        }
        .map_err(|e| session_failed(format!("SMTP relay error: {e}")))?;

        let transport = builder
            .port(port)
            .credentials(creds)
            .pool_config(PoolConfig::new().max_size(1))
            .build();

        match transport.test_connection() {
            Ok(true) => {}
            Ok(false) => return Err(session_failed(format!("{host}:{port} refused the session"))),
            Err(e) => return Err(session_failed(format!("{host}:{port}: {e}"))),
        }

        tracing::info!("SMTP session open to {host}:{port} as {sender}");
        Ok(Self { from, transport })
    }
}

impl MailTransport for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    fn supports_html(&self) -> bool {
        true
    }

    fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = build_message(&self.from, mail)?;
        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(|e| TransportError::SendFailed {
                transport: "smtp".into(),
                reason: format!("SMTP send failed: {e}"),
            })
    }
}

fn session_failed(reason: String) -> TransportError {
    TransportError::SessionFailed {
        transport: "smtp".into(),
        reason,
    }
}
