use anyhow::Context;

use secret_santa::config::{SMTP_PASSWORD_VAR, SantaConfig};
use secret_santa::notify::{Dispatcher, EnvCredential, LettreTransports};
use secret_santa::participants::load_participants;
use secret_santa::run::run;

fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = SantaConfig::from_env(std::env::args().nth(1))?;

    let participants = load_participants(&config.participants_file).with_context(|| {
        format!(
            "Failed to load participants from {}",
            config.participants_file.display()
        )
    })?;

    eprintln!("🎅 Secret Santa v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Participants: {}", participants.len());
    if let Some(seed) = config.seed {
        eprintln!("   Seed: {seed}");
    }

    let dispatcher = Dispatcher::new(
        LettreTransports::new(config.transport.clone()),
        EnvCredential::new(SMTP_PASSWORD_VAR),
        &config.transport,
    );
    let report = run(&participants, config.seed, &dispatcher, &config.message)?;

    eprintln!();
    for outcome in &report.outcomes {
        eprintln!("   {outcome}");
    }
    eprintln!(
        "\n   {} sent, {} skipped, {} failed (via {})",
        report.delivered(),
        report.skipped(),
        report.failed(),
        report.transport
    );

    if let Some(path) = &config.report_file {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        eprintln!("   Report: {}", path.display());
    }

    Ok(())
}
