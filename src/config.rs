//! Configuration types, built from environment variables.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::notify::MessageOptions;

/// Default SMTP submission host for the fallback transport.
pub const DEFAULT_SMTP_HOST: &str = "smtp.office365.com";

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Environment variable holding the SMTP password.
pub const SMTP_PASSWORD_VAR: &str = "SANTA_SMTP_PASSWORD";

/// Transport selection and connection settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Try the local mail client before falling back to SMTP.
    pub use_local_client: bool,
    /// Command used to reach the local mail client.
    pub sendmail_command: PathBuf,
    /// Sender identity. Required by the SMTP fallback.
    pub sender: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            use_local_client: true,
            sendmail_command: PathBuf::from("sendmail"),
            sender: None,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            use_local_client: parse_bool("SANTA_USE_LOCAL_CLIENT")?
                .unwrap_or(defaults.use_local_client),
            sendmail_command: optional("SANTA_SENDMAIL_COMMAND")
                .map(PathBuf::from)
                .unwrap_or(defaults.sendmail_command),
            sender: optional("SANTA_SENDER"),
            smtp_host: optional("SANTA_SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: parse_num("SANTA_SMTP_PORT")?.unwrap_or(defaults.smtp_port),
        })
    }
}

/// Everything the binary needs for one run.
#[derive(Debug, Clone)]
pub struct SantaConfig {
    pub participants_file: PathBuf,
    /// Seed for a reproducible draw.
    pub seed: Option<u64>,
    pub message: MessageOptions,
    pub transport: TransportConfig,
    /// Where to write the JSON run report, if anywhere.
    pub report_file: Option<PathBuf>,
}

impl SantaConfig {
    /// Build config from environment variables.
    ///
    /// `participants_arg` (usually the first CLI argument) wins over
    /// `SANTA_PARTICIPANTS_FILE`.
    pub fn from_env(participants_arg: Option<String>) -> Result<Self, ConfigError> {
        let participants_file = participants_arg
            .or_else(|| optional("SANTA_PARTICIPANTS_FILE"))
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "SANTA_PARTICIPANTS_FILE".into(),
                hint: "Pass a participants JSON file as the first argument or set the variable."
                    .into(),
            })?;

        let message = MessageOptions {
            subject: optional("SANTA_SUBJECT"),
            group: optional("SANTA_GROUP"),
            instructions: optional("SANTA_INSTRUCTIONS"),
            failure_dir: optional("SANTA_FAILURE_DIR").map(PathBuf::from),
        };

        Ok(Self {
            participants_file,
            seed: parse_num("SANTA_SEED")?,
            message,
            transport: TransportConfig::from_env()?,
            report_file: optional("SANTA_REPORT_FILE").map(PathBuf::from),
        })
    }
}

/// A set, non-blank environment variable.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_num<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    optional(key)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got {raw:?}"),
            }),
        })
        .transpose()
}
