//! `contactbook` - CLI for the contact book
//!
//! Runs the web server and offers a few maintenance commands.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use contactbook::cli::{Cli, Command, ConfigCommand, ListCommand, OutputFormat, ServeCommand};
use contactbook::{init_logging, Config, ContactRepository, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd).await,
        Command::List(list_cmd) => handle_list(&config, &list_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if let Some(store) = cmd.store {
        config.storage.path = Some(store);
    }
    config.validate()?;
    contactbook::serve(&config).await?;
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let repository = ContactRepository::new(RecordStore::open(config.store_path())?);
    let mut contacts = repository.all()?;
    if let Some(name) = &cmd.name {
        contacts.retain(|c| c.name_matches_ignore_case(name));
    }

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&contacts)?),
        OutputFormat::Plain => {
            for contact in &contacts {
                println!("{}\t{}\t{}", contact.name, contact.email, contact.phone);
            }
        }
        OutputFormat::Table => {
            let width = contacts
                .iter()
                .map(|c| c.name.chars().count())
                .max()
                .unwrap_or(0)
                .max("Name".len());
            println!("{:<width$}  {:<30}  Phone", "Name", "Email");
            println!("{}", "-".repeat(width + 2 + 30 + 2 + 13));
            for contact in &contacts {
                println!(
                    "{:<width$}  {:<30}  {}",
                    contact.name, contact.email, contact.phone
                );
            }
            println!();
            println!(
                "{} contact(s) in {}",
                contacts.len(),
                repository.store().path().display()
            );
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
                println!();
                println!("[Storage]");
                println!("  Contacts file:      {}", config.store_path().display());
                println!();
                println!("[Validation]");
                println!("  Phone region:       {}", config.validation.phone_region);
                println!();
                println!("[Session]");
                println!("  Cookie name:        {}", config.session.cookie_name);
                println!("  Max age (ms):       {}", config.session.max_age_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path: PathBuf = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
