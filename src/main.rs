use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use ssh_fleet::cli;
use ssh_fleet::config::{Settings, DEFAULT_CONFIG_FILE, DEFAULT_PORT, DEFAULT_USER};
use ssh_fleet::logging;

#[derive(Parser)]
#[command(name = "ssh-fleet")]
#[command(version)]
#[command(about = "Run commands and move files across a list of SSH hosts, one host at a time", long_about = None)]
struct Cli {
    /// Host table (JSON object: host -> password, empty for key auth)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory holding <host>_private.key / <host>_public.key
    #[arg(long, global = true, default_value = ".")]
    key_dir: PathBuf,

    /// Remote login user
    #[arg(long, global = true, default_value = DEFAULT_USER)]
    user: String,

    /// Remote SSH port
    #[arg(long, global = true, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Give up on connect, commands and transfers after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// More diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to every configured host in turn (default)
    Run,

    /// Generate an RSA key pair for a host
    Keygen {
        /// Host identifier the key files are named after
        host: String,
    },

    /// Manage the host table
    Hosts {
        #[command(subcommand)]
        action: HostCommands,
    },
}

#[derive(Subcommand)]
enum HostCommands {
    /// Show configured hosts
    List,
    /// Add or update a host
    Add {
        /// Hostname or IP address
        host: String,
        /// Use a generated key pair instead of a password
        #[arg(long)]
        key: bool,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            config_path: self.config.clone(),
            key_dir: self.key_dir.clone(),
            user: self.user.clone(),
            port: self.port,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose).context("failed to initialise logging") {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ssh_fleet::Result<()> {
    let settings = cli.settings();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run::run(&settings),
        Commands::Keygen { host } => cli::keygen::run(&settings, &host),
        Commands::Hosts { action } => match action {
            HostCommands::List => cli::hosts::list(&settings),
            HostCommands::Add { host, key } => cli::hosts::add(&settings, &host, key),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["ssh-fleet"]);
        let settings = cli.settings();
        assert!(cli.command.is_none());
        assert_eq!(settings.config_path, PathBuf::from("config.json"));
        assert_eq!(settings.user, "root");
        assert_eq!(settings.port, 22);
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["ssh-fleet", "hosts", "add", "10.0.0.5", "--key", "--timeout", "30", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings().timeout, Some(Duration::from_secs(30)));
        assert!(matches!(
            cli.command,
            Some(Commands::Hosts { action: HostCommands::Add { ref host, key: true } }) if host == "10.0.0.5"
        ));
    }
}
