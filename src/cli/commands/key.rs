use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum KeyCommands {
    #[command(about = "Set a key's deletion timestamp and enabled flag")]
    UpdateDeletedAt {
        #[arg(help = "Key id")]
        key_id: String,

        #[arg(long, help = "RFC 3339 timestamp; defaults to now")]
        deleted_at: Option<DateTime<Utc>>,

        #[arg(long, help = "Leave the key enabled until the deletion date")]
        enabled: bool,

        #[arg(long, env = "KEYVAULT_URL", default_value = "http://localhost:3000")]
        url: String,

        #[arg(long, env = "KEYVAULT_TOKEN", hide_env_values = true)]
        token: String,
    },
}

pub async fn handle(cmd: KeyCommands) -> anyhow::Result<()> {
    match cmd {
        KeyCommands::UpdateDeletedAt {
            key_id,
            deleted_at,
            enabled,
            url,
            token,
        } => {
            let body = json!({
                "keyId": key_id,
                "deletedAt": deleted_at.unwrap_or_else(Utc::now),
                "enabled": enabled,
            });

            let endpoint = format!("{}/trpc/key.updateDeletedAt", url.trim_end_matches('/'));
            let response = reqwest::Client::new()
                .post(&endpoint)
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("failed to reach {}", endpoint))?;

            let status = response.status();
            let payload: Value = response.json().await.context("server returned invalid JSON")?;

            if !status.is_success() {
                anyhow::bail!(
                    "{} ({}): {}",
                    payload["code"].as_str().unwrap_or("UNKNOWN"),
                    status.as_u16(),
                    payload["message"].as_str().unwrap_or("no message")
                );
            }

            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}
