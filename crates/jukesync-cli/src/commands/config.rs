//! Configuration commands.

use clap::Subcommand;
use jukesync_core::Config;

use super::common::CliError;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "server.base_url")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Show the full configuration
    List,
}

pub fn run(action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match get_key(&config, &key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            set_key(&mut config, &key, &value)?;
            config.save()?;
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn get_key(config: &Config, key: &str) -> Option<String> {
    match key {
        "server.base_url" => Some(config.server.base_url.clone()),
        "server.request_timeout_secs" => Some(config.server.request_timeout_secs.to_string()),
        "server.api_version" => Some(config.server.api_version.clone()),
        "library.music_dir" => Some(config.library.music_dir.clone().unwrap_or_default()),
        "username" => Some(config.username.clone().unwrap_or_default()),
        _ => None,
    }
}

fn set_key(config: &mut Config, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "server.base_url" => config.server.base_url = value.to_string(),
        "server.request_timeout_secs" => {
            config.server.request_timeout_secs = value
                .parse()
                .map_err(|_| format!("cannot parse '{value}' as seconds"))?;
        }
        "server.api_version" => config.server.api_version = value.to_string(),
        "library.music_dir" => config.library.music_dir = Some(value.to_string()),
        "username" => config.username = Some(value.to_string()),
        _ => return Err(format!("unknown config key: {key}").into()),
    }
    Ok(())
}
