//! Interactive fleet run over every configured host

use colored::Colorize;

use crate::config::{ConfigStore, Settings};
use crate::console::Console;
use crate::error::Result;
use crate::fleet::FleetRunner;
use crate::keys::KeyStore;
use crate::ssh::SshConnector;

pub fn run(settings: &Settings) -> Result<()> {
    let connector = SshConnector::new(settings)?;
    let mut runner = FleetRunner::new(
        ConfigStore::new(&settings.config_path),
        KeyStore::new(&settings.key_dir),
        connector,
        Console::stdio(),
    );

    println!(
        "{} {} host(s) from {}",
        "Fleet:".cyan().bold(),
        runner.hosts().len(),
        settings.config_path.display()
    );

    runner.run()?;
    Ok(())
}
