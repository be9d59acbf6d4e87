use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lucid::prelude::*;
use lucid::protocol::error_message;
use lucid::transport::HttpTransport;

/// State file used when neither `--state-file` nor `LUCID_STATE_FILE` is set.
const DEFAULT_STATE_FILE: &str = "lucid-state.json";

#[derive(Parser, Debug)]
#[command(name = "lucid-cli")]
#[command(about = "Command-line client for a Lucid key-value server", long_about = None)]
struct Cli {
    /// Where the session is kept between runs [env: LUCID_STATE_FILE]
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Validate a server and a token, then log in
    Login {
        endpoint: String,
        token: String,
        /// Keep the endpoint after logging out
        #[arg(long)]
        remember: bool,
    },
    /// Validate and record a server without logging in
    Endpoint {
        address: String,
        #[arg(long)]
        remember: bool,
    },
    /// Log out
    Logout,
    /// Show the current session
    Status,
    /// Print the value stored under a key
    Get { key: String },
    /// Store a value under a key
    Put {
        key: String,
        value: String,
        /// Parse the value as JSON and send it as application/json
        #[arg(long)]
        json: bool,
    },
    /// Delete a key
    Delete { key: String },
    /// Check whether a key exists
    Exists { key: String },
    /// Lock a key against writes
    Lock { key: String },
    /// Unlock a key
    Unlock { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    lucid::telemetry::init_tracing(&cli.log_level);

    let mut config = ClientConfig::from_env()?;
    let state_file = cli
        .state_file
        .or_else(|| config.state_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));
    config.state_path = Some(state_file.clone());

    let transport = ReqwestTransport::new(config.request_timeout)?;
    let (client, mut intents) = LucidClientBuilder::new()
        .config(config)
        .build(transport, FileStateStore::new(&state_file))
        .await;
    let mut guard = client.route_guard();

    if let ResumeOutcome::LoggedOut { reason } = client.resume().await {
        eprintln!("previous session ended: {reason}");
    }

    let result = run(&client, cli.command).await;

    while let Ok(intent) = intents.try_recv() {
        guard.apply(intent);
    }
    tracing::debug!(route = %guard.current(), "final view");

    client
        .shutdown()
        .await
        .with_context(|| format!("failed to save session to {}", state_file.display()))?;

    println!("{}", result?);
    Ok(())
}

/// Runs one command and returns what to print.
async fn run<T, P>(client: &LucidClient<T, P>, command: Command) -> Result<String>
where
    T: HttpTransport + Clone,
    P: PersistenceAdapter,
{
    let gateway = client.gateway();

    let output = match command {
        Command::Login {
            endpoint,
            token,
            remember,
        } => {
            let session = client.login(&endpoint, token, remember).await?;
            format!(
                "Logged in to {} ({})",
                endpoint_of(&session),
                session.current_version().unwrap_or_default().trim_end()
            )
        }
        Command::Endpoint { address, remember } => {
            let session = client.set_endpoint(&address, remember).await?;
            format!(
                "{} is {}",
                endpoint_of(&session),
                session.current_version().unwrap_or_default().trim_end()
            )
        }
        Command::Logout => {
            client.logout().await;
            format!("Logged out. Next login: {}", client.login_prefill())
        }
        Command::Status => status(&client.store().snapshot(), client.store().state()),
        Command::Get { key } => gateway
            .get_key(&key)
            .await
            .with_context(|| format!("failed to read {key:?}"))?
            .text(),
        Command::Put { key, value, json } => {
            let response = if json {
                let value: serde_json::Value =
                    serde_json::from_str(&value).context("value is not valid JSON")?;
                gateway.store_json(&key, &value).await?
            } else {
                gateway.store_any(&key, value).await?
            };
            acknowledgement(&response)
        }
        Command::Delete { key } => acknowledgement(&gateway.delete_key(&key).await?),
        Command::Exists { key } => match gateway.exists_key(&key).await {
            Ok(_) => "true".into(),
            Err(GatewayError::RemoteError { status: 404, .. }) => "false".into(),
            Err(e) => return Err(e.into()),
        },
        Command::Lock { key } => acknowledgement(&gateway.lock_key(&key).await?),
        Command::Unlock { key } => acknowledgement(&gateway.unlock_key(&key).await?),
    };

    Ok(output)
}

fn endpoint_of(session: &Session) -> String {
    session
        .current_address()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".into())
}

fn status(session: &Session, state: SessionState) -> String {
    format!(
        "state:    {state}\nendpoint: {}\nversion:  {}\nremember: {}",
        endpoint_of(session),
        session.current_version().unwrap_or("-").trim_end(),
        session.remember_endpoint(),
    )
}

/// The server's `{"message": ...}`, or a plain "OK".
fn acknowledgement(response: &HttpResponse) -> String {
    error_message(response).unwrap_or_else(|| "OK".into())
}
