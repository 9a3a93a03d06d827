//! Notification dispatch.
//!
//! Picks a transport once per run (local mail client first, authenticated
//! SMTP as the fallback), then sends one message per gifter in draw order.
//! A failed send is recorded in the report and never stops the loop.

pub mod capture;
pub mod sendmail;
pub mod smtp;
pub mod template;
pub mod transport;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::TransportConfig;
use crate::draw::{Assignments, Pair};
use crate::error::{ConfigError, DispatchError, TransportError};
use crate::participants::AddressBook;

pub use capture::FailureCapture;
pub use template::{MessageOptions, RenderedMessage, render};
pub use transport::{
    CredentialSource, EnvCredential, LettreTransports, MailTransport, OutgoingMail,
    StaticCredential, TransportFactory,
};

/// Which transport a run used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Primary,
    Fallback,
}

/// What happened to one participant's notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered {
        address: String,
    },
    /// No address on file.
    Skipped,
    Failed {
        /// Kept so the draw can be relayed by hand.
        giftee: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub participant: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, DeliveryStatus::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, DeliveryStatus::Failed { .. })
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DeliveryStatus::Delivered { address } => {
                write!(f, "{}: sent to {address}", self.participant)
            }
            DeliveryStatus::Skipped => write!(f, "{}: skipped, no email address", self.participant),
            DeliveryStatus::Failed {
                reason, artifact, ..
            } => {
                write!(f, "{}: FAILED ({reason})", self.participant)?;
                match artifact {
                    Some(path) => write!(f, ", draw saved to {}", path.display()),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Full accounting of one dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub run_id: Uuid,
    pub route: Route,
    pub transport: String,
    pub outcomes: Vec<DeliveryOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn outcome_for(&self, participant: &str) -> Option<&DeliveryOutcome> {
        self.outcomes.iter().find(|o| o.participant == participant)
    }
}

/// Sends draw notifications with local-client-then-SMTP transport selection.
pub struct Dispatcher<F, C> {
    factory: F,
    credentials: C,
    use_local_client: bool,
    sender: Option<String>,
}

impl<F: TransportFactory, C: CredentialSource> Dispatcher<F, C> {
    pub fn new(factory: F, credentials: C, config: &TransportConfig) -> Self {
        Self {
            factory,
            credentials,
            use_local_client: config.use_local_client,
            sender: config.sender.clone(),
        }
    }

    /// Notify every gifter in `assignments`.
    ///
    /// Only fails when no transport at all can be used; individual send
    /// failures end up in the report.
    pub fn dispatch(
        &self,
        assignments: &Assignments,
        address_book: &AddressBook,
        options: &MessageOptions,
    ) -> Result<DispatchReport, DispatchError> {
        let run_id = Uuid::new_v4();
        let (route, transport) = self.select_transport()?;

        tracing::info!(
            %run_id,
            "Sending {} notifications via {}",
            assignments.len(),
            transport.name()
        );

        let outcomes = send_all(transport.as_ref(), assignments, address_book, options);
        let report = DispatchReport {
            run_id,
            route,
            transport: transport.name().to_string(),
            outcomes,
            finished_at: Utc::now(),
        };

        tracing::info!(
            %run_id,
            delivered = report.delivered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Dispatch finished via {}",
            report.transport
        );
        Ok(report)
    }

    /// Decide the transport for the whole run.
    fn select_transport(&self) -> Result<(Route, Box<dyn MailTransport>), DispatchError> {
        if !self.use_local_client {
            tracing::info!("Local mail client disabled, using SMTP");
        } else {
            match self.factory.primary() {
                Ok(transport) => return Ok((Route::Primary, transport)),
                Err(e) => tracing::info!("Local mail client not available ({e}), falling back to SMTP"),
            }
        }
        self.open_fallback().map(|t| (Route::Fallback, t))
    }

    fn open_fallback(&self) -> Result<Box<dyn MailTransport>, DispatchError> {
        let sender = self
            .sender
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "SANTA_SENDER".into(),
                hint: "The SMTP fallback needs a sender address.".into(),
            })?;
        let credential = self
            .credentials
            .resolve(sender)
            .ok_or_else(|| ConfigError::MissingCredential {
                sender: sender.to_string(),
            })?;

        self.factory
            .fallback(sender, credential)
            .map_err(|e| match e {
                TransportError::InvalidAddress { address, reason } => {
                    DispatchError::Config(ConfigError::InvalidValue {
                        key: "SANTA_SENDER".into(),
                        message: format!("{address}: {reason}"),
                    })
                }
                other => DispatchError::Session(other),
            })
    }
}

/// Send every notification over `transport`, in draw order.
pub fn send_all(
    transport: &dyn MailTransport,
    assignments: &Assignments,
    address_book: &AddressBook,
    options: &MessageOptions,
) -> Vec<DeliveryOutcome> {
    let capture = FailureCapture::new(options.failure_dir.clone());
    assignments
        .iter()
        .map(|pair| deliver(transport, &capture, address_book, options, pair))
        .collect()
}

/// Notify a single gifter. Never fails; problems become the outcome.
pub fn deliver(
    transport: &dyn MailTransport,
    capture: &FailureCapture,
    address_book: &AddressBook,
    options: &MessageOptions,
    pair: &Pair,
) -> DeliveryOutcome {
    let participant = pair.gifter.clone();

    let Some(address) = address_book.address_of(&pair.gifter) else {
        tracing::warn!("No email address for {participant}, skipping");
        return DeliveryOutcome {
            participant,
            status: DeliveryStatus::Skipped,
        };
    };

    let rendered = render(options, &pair.gifter, &pair.giftee, transport.supports_html());
    let mail = OutgoingMail {
        to: address.to_string(),
        subject: rendered.subject,
        text: rendered.text,
        html: rendered.html,
    };

    let status = match transport.send(&mail) {
        Ok(()) => {
            tracing::info!("Email sent to {participant} at {address}");
            DeliveryStatus::Delivered {
                address: address.to_string(),
            }
        }
        Err(e) => {
            tracing::error!(
                "Error sending email to {participant} at {address} via {}: {e}",
                transport.name()
            );
            tracing::debug!("Undelivered draw: {participant} -> {}", pair.giftee);
            DeliveryStatus::Failed {
                giftee: pair.giftee.clone(),
                reason: e.to_string(),
                artifact: capture.record(&pair.gifter, &pair.giftee),
            }
        }
    };

    DeliveryOutcome {
        participant,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(reason: &str, artifact: Option<&str>) -> DeliveryOutcome {
        DeliveryOutcome {
            participant: "Will".into(),
            status: DeliveryStatus::Failed {
                giftee: "Angela".into(),
                reason: reason.into(),
                artifact: artifact.map(PathBuf::from),
            },
        }
    }

    #[test]
    fn outcome_lines() {
        let sent = DeliveryOutcome {
            participant: "Jesse".into(),
            status: DeliveryStatus::Delivered {
                address: "jesse@example.com".into(),
            },
        };
        assert_eq!(sent.to_string(), "Jesse: sent to jesse@example.com");

        let skipped = DeliveryOutcome {
            participant: "Derek".into(),
            status: DeliveryStatus::Skipped,
        };
        assert_eq!(skipped.to_string(), "Derek: skipped, no email address");

        assert_eq!(failed("boom", None).to_string(), "Will: FAILED (boom)");
        assert_eq!(
            failed("boom", Some("out/Will.txt")).to_string(),
            "Will: FAILED (boom), draw saved to out/Will.txt"
        );
    }

    #[test]
    fn outcome_serializes_flat() {
        let json = serde_json::to_value(failed("boom", None)).unwrap();
        assert_eq!(json["participant"], "Will");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["giftee"], "Angela");
        assert!(json.get("artifact").is_none());
    }

    #[test]
    fn report_counts() {
        let report = DispatchReport {
            run_id: Uuid::new_v4(),
            route: Route::Fallback,
            transport: "smtp".into(),
            outcomes: vec![
                failed("boom", None),
                DeliveryOutcome {
                    participant: "Derek".into(),
                    status: DeliveryStatus::Skipped,
                },
            ],
            finished_at: Utc::now(),
        };
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.delivered(), 0);
        assert!(report.outcome_for("Derek").unwrap().is_skipped());
        assert!(report.outcome_for("Nobody").is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["route"], "fallback");
    }
}
