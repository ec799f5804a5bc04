//! Webhook Config

use clap::Args;

/// Shortest secret accepted for signing settlement webhooks.
pub const MIN_WEBHOOK_SECRET_CHARS: usize = 16;

/// Settlement webhook settings.
#[derive(Debug, Args)]
pub struct WebhookConfig {
    /// Shared secret the chain service signs webhooks with
    #[arg(
        long,
        env = "WEBHOOK_SECRET",
        hide_env_values = true,
        value_parser = parse_webhook_secret
    )]
    pub webhook_secret: String,
}

fn parse_webhook_secret(raw: &str) -> Result<String, String> {
    if raw.trim().chars().count() < MIN_WEBHOOK_SECRET_CHARS {
        return Err(format!(
            "must be at least {MIN_WEBHOOK_SECRET_CHARS} non-blank characters"
        ));
    }

    Ok(raw.to_string())
}
