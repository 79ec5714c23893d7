//! Configuration view and validation commands — `craic config`.

use anyhow::Result;
use std::path::PathBuf;

use craic::config::{CONFIG_FILE_NAME, CraicToml};

use super::load_config;
use crate::{Cli, ConfigCommands};

/// Show only the last four characters of a secret.
fn mask(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = load_config(cli)?;

            println!();
            println!("Craic Configuration");
            println!("===================");
            println!();

            match &config.config_path {
                Some(path) => println!("Config file: {}", path.display()),
                None => {
                    println!("No {} found. Using defaults.", CONFIG_FILE_NAME);
                    println!("Run 'craic config init' to create one.");
                }
            }
            println!();

            let toml = &config.toml;
            println!("[places]");
            println!("  base_url = \"{}\"", toml.places.base_url);
            println!("  radius_m = {}", toml.places.radius_m);
            println!();
            println!("[store]");
            println!("  backend = \"{}\"", toml.store.backend);
            if let Some(path) = &toml.store.path {
                println!("  path = \"{}\"", path.display());
            }
            println!("  collection = \"{}\"", toml.store.collection);
            if let Some(project) = &toml.store.firestore_project {
                println!("  firestore_project = \"{}\"", project);
            }
            println!();
            println!("[location]");
            println!("  default_lat = {}", toml.location.default_lat);
            println!("  default_lng = {}", toml.location.default_lng);
            println!();

            println!("Effective values (with env/CLI overrides):");
            match config.store_backend() {
                Ok(backend) => println!("  store = \"{}\"", backend),
                Err(e) => println!("  store = <invalid: {:#}>", e),
            }
            println!("  db_path = \"{}\"", config.db_path().display());
            match config.places_api_key() {
                Some(key) => println!("  places_api_key = \"{}\"", mask(&key)),
                None => println!("  places_api_key = <not set>"),
            }
            if let Some(project) = config.firestore_project() {
                println!("  firestore_project = \"{}\"", project);
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            let config = load_config(cli)?;

            println!();
            println!("Validating configuration...");
            println!();

            if config.config_path.is_none() {
                println!("No {} found. Checking defaults.", CONFIG_FILE_NAME);
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init { force }) => {
            let config_path = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

            if config_path.exists() && !force {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Use --force to overwrite it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }

            CraicToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [places] api_key, radius_m");
            println!("  - [store] backend, path, firestore_project");
            println!("  - [location] default_lat, default_lng");
            println!();
        }
    }

    Ok(())
}
