//! Primary transport — hands messages to the local mail client through a
//! sendmail-compatible command.

use std::path::{Path, PathBuf};

use lettre::message::Mailbox;
use lettre::{SendmailTransport, Transport};

use crate::error::TransportError;
use crate::notify::transport::{MailTransport, OutgoingMail, build_message, parse_mailbox};

/// From address used when no sender identity is configured.
const LOCAL_SENDER: &str = "Secret Santa <santa@localhost>";

pub struct SendmailMailer {
    command: PathBuf,
    from: Mailbox,
    transport: SendmailTransport,
}

impl SendmailMailer {
    /// Locate the local mail client. Fails if the command cannot be found.
    pub fn acquire(command: &Path, sender: Option<&str>) -> Result<Self, TransportError> {
        let resolved = resolve_command(command).ok_or_else(|| TransportError::Unavailable {
            transport: "sendmail".into(),
            reason: format!("{} not found", command.display()),
        })?;
        let from = parse_mailbox(sender.unwrap_or(LOCAL_SENDER))?;

        tracing::debug!("Using local mail client at {}", resolved.display());
        Ok(Self {
            transport: SendmailTransport::new_with_command(resolved.as_os_str()),
            command: resolved,
            from,
        })
    }

    pub fn command(&self) -> &Path {
        &self.command
    }
}

impl MailTransport for SendmailMailer {
    fn name(&self) -> &str {
        "sendmail"
    }

    fn supports_html(&self) -> bool {
        true
    }

    fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = build_message(&self.from, mail)?;
        self.transport
            .send(&message)
            .map_err(|e| TransportError::SendFailed {
                transport: "sendmail".into(),
                reason: e.to_string(),
            })
    }
}

/// Resolve `command` to an executable file. Bare names are looked up on `PATH`.
fn resolve_command(command: &Path) -> Option<PathBuf> {
    if command.components().count() > 1 || command.is_absolute() {
        return is_executable(command).then(|| command.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
