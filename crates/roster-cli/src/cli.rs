//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use roster_extractor::{ExtractorConfig, RecognizerKind};
use std::path::PathBuf;

/// Roster CLI - Extract provider roster records from email bodies.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Extractor configuration file (TOML)
    #[arg(short, long, global = true, env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the gazetteer YAML files
    #[arg(short, long, global = true, env = "ROSTER_GAZETTEER")]
    pub gazetteer: Option<PathBuf>,

    /// Tuning preset applied when no config file is given
    #[arg(long, value_enum, global = true)]
    pub preset: Option<PresetArg>,

    /// Entity recognizer back-end
    #[arg(long, value_enum, global = true)]
    pub recognizer: Option<RecognizerArg>,

    /// Log extraction decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (name and NPI per record)
    Quiet,
}

/// Extractor tuning presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Default thresholds
    Default,
    /// Fewer, better-evidenced blocks
    Strict,
    /// Wider windows and looser matching
    Lenient,
}

/// Entity recognizer choice.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RecognizerArg {
    /// Structural recognizer over capitalisation and punctuation
    Heuristic,
    /// Regex-only fallback
    Pattern,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract records from one email body
    Extract(ExtractArgs),

    /// Extract records from every email body in a directory
    Batch(BatchArgs),

    /// Show the provider blocks found in an email body
    Blocks(BlocksArgs),

    /// Manage CLI and extractor configuration
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Plain-text or HTML email body
    pub file: PathBuf,

    /// Treat the input as HTML regardless of extension
    #[arg(long)]
    pub html: bool,

    /// Skip record validation warnings
    #[arg(long)]
    pub no_validate: bool,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Directory of email bodies
    pub dir: PathBuf,

    /// Write one JSON report per input into this directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// File extensions to read
    #[arg(long, value_delimiter = ',', default_value = "txt,html,htm")]
    pub extensions: Vec<String>,
}

/// Arguments for the blocks command.
#[derive(Debug, Parser)]
pub struct BlocksArgs {
    /// Plain-text or HTML email body
    pub file: PathBuf,

    /// Treat the input as HTML regardless of extension
    #[arg(long)]
    pub html: bool,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective extractor configuration as TOML
    Show,

    /// Print the CLI settings file location
    Path,

    /// Write an extractor configuration file with default values
    Init {
        /// Destination file
        path: PathBuf,

        /// Preset to write
        #[arg(long, value_enum, default_value = "default")]
        preset: PresetArg,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<RecognizerArg> for RecognizerKind {
    fn from(arg: RecognizerArg) -> Self {
        match arg {
            RecognizerArg::Heuristic => RecognizerKind::Heuristic,
            RecognizerArg::Pattern => RecognizerKind::Pattern,
        }
    }
}

impl From<PresetArg> for ExtractorConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => ExtractorConfig::default(),
            PresetArg::Strict => ExtractorConfig::strict(),
            PresetArg::Lenient => ExtractorConfig::lenient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from(["roster", "extract", "email.txt", "--html"]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, PathBuf::from("email.txt"));
                assert!(args.html);
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "roster",
            "batch",
            "inbox",
            "--format",
            "json",
            "--recognizer",
            "pattern",
            "--extensions",
            "txt,htm",
        ]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(cli.recognizer, Some(RecognizerArg::Pattern)));
        match cli.command {
            Command::Batch(args) => assert_eq!(args.extensions, vec!["txt", "htm"]),
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_preset_conversion() {
        let config: ExtractorConfig = PresetArg::Strict.into();
        assert_eq!(config, ExtractorConfig::strict());
        let kind: RecognizerKind = RecognizerArg::Pattern.into();
        assert_eq!(kind, RecognizerKind::Pattern);
    }
}
