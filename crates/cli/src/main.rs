mod app;
mod db_commands;
mod doctor_commands;

use std::sync::Arc;

use {
    askgeorge_common::types::InboundMessage,
    askgeorge_config::AskGeorgeConfig,
    askgeorge_gateway::AppState,
    askgeorge_metrics::{MetricsRecorderConfig, init_metrics},
    askgeorge_sessions::{SessionStore, SqliteSessionStore},
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "askgeorge",
    about = "Ask George: text an address, get the closest restrooms"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/askgeorge/).
    #[arg(long, global = true, env = "ASKGEORGE_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
    /// Custom data directory (overrides default data dir).
    #[arg(long, global = true, env = "ASKGEORGE_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the SMS webhook server (default when no subcommand is provided).
    Serve,
    /// Run one inbound text through the reply pipeline and print the reply.
    Text {
        /// Sender identifier, usually a phone number.
        #[arg(long)]
        from: String,
        /// Message body; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        body: Vec<String>,
    },
    /// Show a sender's most recent texts.
    History {
        #[arg(long)]
        from: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Database management (reset, migrate).
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
    /// Config validation and environment audit.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "askgeorge starting");

    // Apply directory overrides before loading config
    if let Some(ref dir) = cli.config_dir {
        askgeorge_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        askgeorge_config::set_data_dir(dir.clone());
    }

    match cli.command {
        // Default: serve when no subcommand is provided
        None | Some(Commands::Serve) => {
            let config = askgeorge_config::discover_and_load();
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);
            serve(&config, &bind, port).await
        },
        Some(Commands::Text { from, body }) => {
            let config = askgeorge_config::discover_and_load();
            text(&config, &from, &body.join(" ")).await
        },
        Some(Commands::History { from, limit }) => {
            let config = askgeorge_config::discover_and_load();
            history(&config, &from, limit).await
        },
        Some(Commands::Db { action }) => {
            let config = askgeorge_config::discover_and_load();
            db_commands::handle_db(action, &app::db_path(&config)).await
        },
        Some(Commands::Doctor) => doctor_commands::handle_doctor().await,
    }
}

async fn serve(config: &AskGeorgeConfig, bind: &str, port: u16) -> anyhow::Result<()> {
    let metrics_handle = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: vec![("service".into(), "askgeorge".into())],
    })?;

    let pool = app::connect(&app::db_path(config)).await?;
    let reply = app::build_auto_reply(config, pool)?;

    askgeorge_gateway::start_server(bind, port, AppState {
        reply: Arc::new(reply),
        metrics_handle,
    })
    .await
}

async fn text(config: &AskGeorgeConfig, from: &str, body: &str) -> anyhow::Result<()> {
    let pool = app::connect(&app::db_path(config)).await?;
    let reply = app::build_auto_reply(config, pool.clone())?;

    let outcome = reply.get_reply(&InboundMessage::new(from, body)).await;
    // History, activity and cache writes outlive the reply; flush them first.
    reply.drain_background().await;
    pool.close().await;

    println!("{}", outcome?.text());
    Ok(())
}

async fn history(config: &AskGeorgeConfig, from: &str, limit: u32) -> anyhow::Result<()> {
    let pool = app::connect(&app::db_path(config)).await?;
    let sessions = SqliteSessionStore::new(pool.clone());

    match sessions.find_session(from).await? {
        None => println!("No session for {from}"),
        Some(session) => {
            let created = format_millis(session.created_at);
            println!("Sender:   {}", session.sender);
            println!("Since:    {created}");
            if let Some(location) = session.active_location {
                println!("Location: {location}");
            }
            println!("Pages:    {}", session.next_page_no);
            println!();
            for record in sessions.recent_messages(from, limit).await? {
                println!("{}  {}", format_millis(record.received_at), record.body);
            }
        },
    }

    pool.close().await;
    Ok(())
}

fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["askgeorge", "--port", "8080"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn text_joins_body_words() {
        let cli = Cli::try_parse_from([
            "askgeorge",
            "text",
            "--from",
            "+15551234567",
            "45th",
            "st",
            "&",
            "8th",
            "Ave",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Text { from, body }) => {
                assert_eq!(from, "+15551234567");
                assert_eq!(body.join(" "), "45th st & 8th Ave");
            },
            _ => panic!("expected text command"),
        }
    }

    #[test]
    fn text_requires_body() {
        assert!(Cli::try_parse_from(["askgeorge", "text", "--from", "+1555"]).is_err());
    }

    #[test]
    fn history_defaults_limit() {
        let cli = Cli::try_parse_from(["askgeorge", "history", "--from", "+1555"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::History { limit: 20, .. })
        ));
    }

    #[test]
    fn formats_epoch_millis() {
        assert_eq!(format_millis(1_741_100_400_000), "2025-03-04 15:00:00 UTC");
    }
}
