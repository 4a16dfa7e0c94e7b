use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::ConfigAction;
use crate::config::Config;

fn print_status(json_output: bool, message: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "status": "success", "message": message }));
    } else {
        println!("{}", message);
    }
}

/// `config` acts on the file at `config_path`, without environment overrides applied
pub fn handle_config_action(action: ConfigAction, config_path: &Path, json_output: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::default().save_to(config_path)?;
            print_status(
                json_output,
                &format!("Configuration initialized at: {}", config_path.display()),
            );
        }
        ConfigAction::Show => {
            let mut config = Config::load_from(config_path)?;
            if config.model.api_key.is_some() {
                config.model.api_key = Some("********".to_string());
            }

            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config).context("Failed to serialize config to JSON")?
                );
            } else {
                let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;
                println!("Configuration ({})", config_path.display());
                println!("{}", toml_str);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set_value(&key, &value)?;
            config.save_to(config_path)?;

            let shown = if key == "model.api_key" { "********" } else { value.as_str() };
            print_status(json_output, &format!("Configuration updated: {} = {}", key, shown));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_persists_to_given_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        handle_config_action(ConfigAction::Init, &path, true).unwrap();
        handle_config_action(
            ConfigAction::Set {
                key: "source.provider".to_string(),
                value: "aws".to_string(),
            },
            &path,
            true,
        )
        .unwrap();

        assert_eq!(Config::load_from(&path).unwrap().source.provider, "aws");
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let result = handle_config_action(
            ConfigAction::Set {
                key: "output.list_limit".to_string(),
                value: "zero".to_string(),
            },
            &path,
            false,
        );
        assert!(result.is_err());
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
