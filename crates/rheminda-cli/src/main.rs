use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rheminda_api::HttpReminderApi;
use rheminda_core::{slot_of, ReminderId, RhemindaConfig};
use rheminda_notify::{
    ActionPerformed, MemoryBridge, NotificationAction, NotificationBridge, NotificationSetup,
    Scheduler,
};
use rheminda_sync::{ActionReconciler, ReminderService};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Operator tool for the reminder notification core.
///
/// No native notification shell is available from a terminal, so local
/// notifications go to an in-process bridge and are printed instead of shown.
#[derive(Parser, Debug)]
#[command(name = "rheminda", version)]
struct Cli {
    /// Config file. Falls back to RHEMINDA_CONFIG, then ~/.rheminda/rheminda.toml.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override `api.base_url`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Override `api.user_id`.
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the notification slot for a reminder id.
    Slot { id: String },
    /// Fetch the reminder history and print the resulting notification queue.
    Sync,
    /// Apply one notification action against the server.
    Action { id: String, action: ActionArg },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Tap,
    Snooze,
    Complete,
}

impl From<ActionArg> for NotificationAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Tap => NotificationAction::Tap,
            ActionArg::Snooze => NotificationAction::Snooze,
            ActionArg::Complete => NotificationAction::Complete,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rheminda_cli=info,rheminda_sync=info,rheminda_notify=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Slot { id } = &cli.command {
        let slot = slot_of(id);
        println!("{slot} (0x{:06x})", slot.get());
        return Ok(());
    }

    let config = load_config(&cli);
    let bridge = Arc::new(MemoryBridge::new());
    let readiness = NotificationSetup::new(bridge.clone(), &config.notifications)
        .ensure_ready()
        .await;
    info!(?readiness, "notification setup done");

    let api = Arc::new(HttpReminderApi::new(&config.api).context("building HTTP client")?);
    let scheduler = Arc::new(Scheduler::new(bridge.clone(), &config.notifications));
    let service = Arc::new(ReminderService::new(api, scheduler, &config));

    match cli.command {
        Command::Slot { .. } => {}
        Command::Sync => {
            let (reminders, report) = service
                .refresh()
                .await
                .with_context(|| format!("fetching history for {}", service.user_id()))?;
            info!(count = reminders.len(), "history fetched");
            println!("{}", serde_json::to_string_pretty(&report)?);
            let pending = bridge.pending().await?;
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
        Command::Action { id, action } => {
            let (tx, mut rx) = mpsc::channel(1);
            let reconciler = ActionReconciler::new(service).with_intents(tx);
            let action = NotificationAction::from(action);
            let event = ActionPerformed::new(action.as_str(), ReminderId::from(id));

            let outcome = reconciler.handle(event).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let Ok(intent) = rx.try_recv() {
                println!("open reminder {}", intent.reminder_id);
            }
        }
    }

    Ok(())
}

/// Explicit flag > RHEMINDA_CONFIG env > default path; defaults on failure.
fn load_config(cli: &Cli) -> RhemindaConfig {
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("RHEMINDA_CONFIG").ok());
    let mut config = RhemindaConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        RhemindaConfig::default()
    });
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(user) = &cli.user {
        config.api.user_id = user.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_command() {
        let cli = Cli::try_parse_from([
            "rheminda",
            "--user",
            "sam",
            "action",
            "64fae2b1d9a0c123456789ab",
            "snooze",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("sam"));
        match cli.command {
            Command::Action { id, action } => {
                assert_eq!(id, "64fae2b1d9a0c123456789ab");
                assert_eq!(NotificationAction::from(action), NotificationAction::Snooze);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(Cli::try_parse_from(["rheminda", "action", "x", "dismiss"]).is_err());
    }
}
