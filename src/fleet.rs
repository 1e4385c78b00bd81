//! The fleet loop
//!
//! Visits every configured host in file order, one at a time:
//! connect, hand the session to the operator until `exit`, close.
//! Afterwards the operator may register one more host.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use secrecy::ExposeSecret;

use crate::config::{ConfigStore, HostEntry, HostList};
use crate::console::Console;
use crate::dispatch::{self, Flow, HELP};
use crate::error::{FleetError, Result};
use crate::keys::KeyStore;
use crate::ssh::{Auth, RemoteSession, SessionFactory};

/// Per-run tally, for the final log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetReport {
    pub connected: usize,
    pub failed: usize,
}

pub struct FleetRunner<F, R, W> {
    store: ConfigStore,
    hosts: HostList,
    keys: KeyStore,
    factory: F,
    console: Console<R, W>,
}

impl<F, R, W> FleetRunner<F, R, W>
where
    F: SessionFactory,
    R: BufRead,
    W: Write,
{
    /// Build a runner over the host table currently in `store`
    pub fn new(store: ConfigStore, keys: KeyStore, factory: F, console: Console<R, W>) -> Self {
        let hosts = store.load();
        Self {
            store,
            hosts,
            keys,
            factory,
            console,
        }
    }

    pub fn hosts(&self) -> &HostList {
        &self.hosts
    }

    pub fn console(&mut self) -> &mut Console<R, W> {
        &mut self.console
    }

    /// Visit all configured hosts, then offer to add a new one
    pub fn run(&mut self) -> Result<FleetReport> {
        let mut report = FleetReport::default();

        if self.hosts.is_empty() {
            self.console.say("No hosts configured.")?;
        }

        for entry in self.hosts.iter() {
            let auth = match resolve_auth(entry, &self.keys) {
                Ok(auth) => auth,
                Err(e) => {
                    tracing::warn!(host = %entry.host, error = %e, "skipping host");
                    dispatch::report(self.console.output(), &e)?;
                    report.failed += 1;
                    continue;
                }
            };

            if visit(&self.factory, &mut self.console, &entry.host, &auth)? {
                report.connected += 1;
            } else {
                report.failed += 1;
            }
        }

        self.offer_new_host(&mut report)?;

        tracing::info!(connected = report.connected, failed = report.failed, "fleet run finished");
        Ok(report)
    }

    /// Register one host: either generate its keypair (connect on a later
    /// run) or connect right away with a password
    fn offer_new_host(&mut self, report: &mut FleetReport) -> Result<()> {
        if !self.console.confirm("Add a new host?")? {
            return Ok(());
        }

        let host = match self.console.prompt("Host IP address: ")? {
            Some(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => {
                self.console.say("No host entered.")?;
                return Ok(());
            }
        };

        if self.console.confirm("Generate a key pair?")? {
            return self.register_key_host(&host);
        }

        let Some(password) = self.console.prompt_secret("Host password: ")? else {
            return Ok(());
        };

        if visit(&self.factory, &mut self.console, &host, &Auth::Password(&password))? {
            report.connected += 1;
            self.hosts.upsert(HostEntry::with_password(
                host.as_str(),
                password.expose_secret().as_str(),
            ));
            self.store.save(&self.hosts)?;
        } else {
            report.failed += 1;
        }
        Ok(())
    }

    fn register_key_host(&mut self, host: &str) -> Result<()> {
        match self.keys.generate(host) {
            Ok(pair) => {
                self.console.say(format!(
                    "{}\n  private key: {}\n  public key:  {}",
                    "Key pair generated.".green(),
                    pair.private_key_path.display(),
                    pair.public_key_path.display()
                ))?;
                self.console.say(pair.read_public_key()?)?;
                self.console.say(
                    "Append the public key to ~/.ssh/authorized_keys on the host, then run again to connect.",
                )?;
            }
            Err(e @ FleetError::KeyAlreadyExists(_)) => dispatch::report(self.console.output(), &e)?,
            Err(e) => {
                dispatch::report(self.console.output(), &e)?;
                return Ok(());
            }
        }

        if self.hosts.get(host).is_none() {
            self.hosts.upsert(HostEntry::key_based(host));
            self.store.save(&self.hosts)?;
        }
        Ok(())
    }
}

/// Password when the entry has one, otherwise the host's key file
pub fn resolve_auth<'a>(entry: &'a HostEntry, keys: &KeyStore) -> Result<Auth<'a>> {
    match &entry.secret {
        Some(secret) => Ok(Auth::Password(secret)),
        None => Ok(Auth::KeyFile(keys.locate(&entry.host)?.private_key_path)),
    }
}

/// Connect to one host and run the command loop.
/// Returns whether a session was established.
fn visit<F, R, W>(factory: &F, console: &mut Console<R, W>, host: &str, auth: &Auth<'_>) -> io::Result<bool>
where
    F: SessionFactory,
    R: BufRead,
    W: Write,
{
    let mut session = match factory.connect(host, auth) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(host, error = %e, "connection failed");
            dispatch::report(console.output(), &e)?;
            return Ok(false);
        }
    };

    console.say(format!("{} {}", "Connected to host".cyan(), host.bold()))?;

    let outcome = command_loop(console, &mut session, host);
    session.close();
    outcome?;

    console.say(format!("{} {}", "Disconnected from".cyan(), host))?;
    Ok(true)
}

/// Read and dispatch operator lines until `exit` or end of input
fn command_loop<S, R, W>(console: &mut Console<R, W>, session: &mut S, host: &str) -> io::Result<()>
where
    S: RemoteSession,
    R: BufRead,
    W: Write,
{
    console.say(HELP)?;
    let prompt = format!("{}> ", host);

    while let Some(line) = console.prompt(&prompt)? {
        if line.trim().is_empty() {
            continue;
        }
        match dispatch::parse(&line) {
            Ok(intent) => {
                if dispatch::dispatch(intent, session, console.output())? == Flow::Exit {
                    break;
                }
            }
            Err(e) => dispatch::report(console.output(), &e)?,
        }
    }
    Ok(())
}
