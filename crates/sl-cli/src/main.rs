mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sl_infra::{GuestId, InstanceSpec, Provisioner, VirtualServer};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::CliError;

/// Provision and reconcile SoftLayer virtual guests.
///
/// Prints the tracked guest as JSON; keeping that output between runs is
/// up to the caller.
#[derive(Parser)]
#[command(name = "slctl", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the guest described by a spec file, or update it when --id is given.
    Apply {
        /// JSON file with the desired guest attributes.
        #[arg(long)]
        spec: PathBuf,
        /// Existing guest to update instead of creating a new one.
        #[arg(long)]
        id: Option<GuestId>,
    },
    /// Read a guest back from the provider.
    Show { id: GuestId },
    /// Destroy a guest once its pending transactions have finished.
    Destroy { id: GuestId },
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "slctl failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    let provisioner = Provisioner::from_env().with_timeouts(config.timeouts);

    let server = match cli.command {
        Command::Apply { spec, id } => {
            let spec = load_spec(&spec)?;
            match id {
                Some(id) => {
                    let mut server = VirtualServer::existing(id);
                    provisioner.update(&mut server, &spec).await?;
                    provisioner.read(&mut server).await?;
                    server
                }
                None => {
                    let mut server = VirtualServer::default();
                    let result = provisioner.create(&mut server, &spec).await;
                    if let (Err(_), Some(id)) = (&result, server.id) {
                        tracing::warn!(guest_id = %id, phase = %server.phase, "guest exists but create did not finish");
                    }
                    result?;
                    server
                }
            }
        }
        Command::Show { id } => {
            let mut server = VirtualServer::existing(id);
            provisioner.read(&mut server).await?;
            server
        }
        Command::Destroy { id } => {
            let mut server = VirtualServer::existing(id);
            provisioner.delete(&mut server).await?;
            server
        }
    };

    println!("{}", serde_json::to_string_pretty(&server)?);
    Ok(())
}

fn load_spec(path: &Path) -> Result<InstanceSpec, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_guest_ids() {
        let cli = Cli::try_parse_from(["slctl", "destroy", "4242"]).unwrap();
        assert!(matches!(cli.command, Command::Destroy { id } if id == GuestId(4242)));

        assert!(Cli::try_parse_from(["slctl", "show", "web01"]).is_err());
    }

    #[test]
    fn apply_accepts_optional_id() {
        let cli = Cli::try_parse_from(["slctl", "apply", "--spec", "guest.json", "--id", "7"])
            .unwrap();
        match cli.command {
            Command::Apply { spec, id } => {
                assert_eq!(spec, PathBuf::from("guest.json"));
                assert_eq!(id, Some(GuestId(7)));
            }
            _ => panic!("expected apply"),
        }
    }
}
