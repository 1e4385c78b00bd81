//! Generate a keypair for one host

use colored::Colorize;

use crate::config::Settings;
use crate::error::Result;
use crate::keys::KeyStore;

pub fn run(settings: &Settings, host: &str) -> Result<()> {
    let keys = KeyStore::new(&settings.key_dir);

    print!("{}", "Generating RSA key pair... ".cyan());
    std::io::Write::flush(&mut std::io::stdout())?;

    let pair = match keys.generate(host) {
        Ok(pair) => pair,
        Err(e) => {
            println!("{}", "failed".red());
            return Err(e);
        }
    };
    println!("{}", "done".green());

    println!();
    println!("Private key: {}", pair.private_key_path.display());
    println!("Public key:  {}", pair.public_key_path.display());
    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!("{}", pair.read_public_key()?);
    println!("{}", "─".repeat(60).dimmed());
    println!();
    println!("Add this key to {} on {}.", "~/.ssh/authorized_keys".cyan(), host);

    Ok(())
}
