//! Host table management

use colored::Colorize;
use secrecy::ExposeSecret;

use crate::config::{ConfigStore, HostEntry, Settings};
use crate::console::Console;
use crate::error::{FleetError, Result};
use crate::keys::KeyStore;

/// Register a host, generating its keypair or storing its password
pub fn add(settings: &Settings, host: &str, key: bool) -> Result<()> {
    let store = ConfigStore::new(&settings.config_path);
    let keys = KeyStore::new(&settings.key_dir);
    let mut hosts = store.load();

    // Validate before prompting
    keys.paths(host)?;

    let entry = if key {
        match keys.generate(host) {
            Ok(pair) => println!(
                "{} {}",
                "Key pair written to".green(),
                pair.private_key_path.display()
            ),
            Err(FleetError::KeyAlreadyExists(_)) => {
                println!("{}", "Key pair already exists, reusing it.".yellow())
            }
            Err(e) => return Err(e),
        }
        HostEntry::key_based(host)
    } else {
        let mut console = Console::stdio();
        let password = console
            .prompt_secret("Host password: ")?
            .ok_or(FleetError::Usage("a password is required without --key"))?;
        HostEntry::new(host, Some(password.expose_secret().clone()))
    };

    let added = hosts.upsert(entry);
    store.save(&hosts)?;

    println!(
        "{} Host '{}' {}.",
        "Success:".green().bold(),
        host,
        if added { "added" } else { "updated" }
    );
    Ok(())
}

/// Show every configured host and how it authenticates
pub fn list(settings: &Settings) -> Result<()> {
    let hosts = ConfigStore::new(&settings.config_path).load();
    let keys = KeyStore::new(&settings.key_dir);

    if hosts.is_empty() {
        println!("No hosts configured.");
        println!();
        println!("Run {} to add one.", "ssh-fleet hosts add <HOST>".cyan());
        return Ok(());
    }

    println!("{:<30} {:<20}", "HOST".bold(), "AUTH".bold());
    println!("{}", "─".repeat(50).dimmed());

    for entry in hosts.iter() {
        let auth = if entry.has_password() {
            "password".normal()
        } else if keys.locate(&entry.host).is_ok() {
            "key file".normal()
        } else {
            "key missing".red()
        };
        println!("{:<30} {:<20}", entry.host, auth);
    }

    println!();
    Ok(())
}
