//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::input::EngineOptions;
use crate::output::Formatter;
use roster_extractor::ExtractorConfig;
use std::fs;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, options: &EngineOptions, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = options.resolve()?;
            println!("{}", config.to_toml().map_err(CliError::Config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Init { path, preset, force } => {
            write_extractor_config(&path, &preset.into(), force)?;
            println!(
                "{}",
                formatter.success(&format!("Wrote extractor configuration to {}", path.display()))
            );
        }
    }
    Ok(())
}

/// Write `config` as TOML, refusing to replace a file unless `force` is set.
pub fn write_extractor_config(path: &Path, config: &ExtractorConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    let contents = config.to_toml().map_err(CliError::Config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");

        write_extractor_config(&path, &ExtractorConfig::lenient(), false).unwrap();
        assert_eq!(ExtractorConfig::from_file(&path).unwrap(), ExtractorConfig::lenient());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        fs::write(&path, "# mine").unwrap();

        let err = write_extractor_config(&path, &ExtractorConfig::default(), false).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine");

        write_extractor_config(&path, &ExtractorConfig::default(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[sectioner]"));
    }
}
