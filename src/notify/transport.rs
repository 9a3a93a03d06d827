//! Mail transport abstraction and the production transport factory.

use lettre::Message;
use lettre::message::{Mailbox, MultiPart};
use secrecy::SecretString;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::notify::sendmail::SendmailMailer;
use crate::notify::smtp::SmtpMailer;

/// A fully rendered message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Something that can deliver an [`OutgoingMail`].
pub trait MailTransport {
    fn name(&self) -> &str;

    /// Whether an HTML alternative should be rendered for this transport.
    fn supports_html(&self) -> bool;

    fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError>;
}

/// Acquires the primary and fallback transports for a run.
pub trait TransportFactory {
    /// Acquire the local mail client. An error here triggers the fallback.
    fn primary(&self) -> Result<Box<dyn MailTransport>, TransportError>;

    /// Open one authenticated session for the fallback transport.
    fn fallback(
        &self,
        sender: &str,
        credential: SecretString,
    ) -> Result<Box<dyn MailTransport>, TransportError>;
}

/// Resolves the credential for the fallback transport.
pub trait CredentialSource {
    fn resolve(&self, sender: &str) -> Option<SecretString>;
}

/// A credential resolved ahead of time (or known to be absent).
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(pub Option<SecretString>);

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Some(SecretString::from(secret.into())))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn resolve(&self, _sender: &str) -> Option<SecretString> {
        self.0.clone()
    }
}

/// Reads the credential from an environment variable when asked.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn resolve(&self, _sender: &str) -> Option<SecretString> {
        std::env::var(&self.var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from)
    }
}

/// Production transports: local sendmail first, authenticated SMTP second.
#[derive(Debug, Clone)]
pub struct LettreTransports {
    config: TransportConfig,
}

impl LettreTransports {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for LettreTransports {
    fn primary(&self) -> Result<Box<dyn MailTransport>, TransportError> {
        let mailer = SendmailMailer::acquire(
            &self.config.sendmail_command,
            self.config.sender.as_deref(),
        )?;
        Ok(Box::new(mailer))
    }

    fn fallback(
        &self,
        sender: &str,
        credential: SecretString,
    ) -> Result<Box<dyn MailTransport>, TransportError> {
        let mailer = SmtpMailer::connect(
            &self.config.smtp_host,
            self.config.smtp_port,
            sender,
            credential,
        )?;
        Ok(Box::new(mailer))
    }
}

/// Parse an address into a mailbox.
pub fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Build a lettre message, multipart when an HTML body is present.
pub fn build_message(from: &Mailbox, mail: &OutgoingMail) -> Result<Message, TransportError> {
    let builder = Message::builder()
        .from(from.clone())
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.subject.clone());

    let message = match &mail.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            mail.text.clone(),
            html.clone(),
        )),
        None => builder.body(mail.text.clone()),
    };
    message.map_err(|e| TransportError::Build(e.to_string()))
}
