use clap::{Parser, ValueEnum};
use folder_creator_core::CreatorConfig;
use folder_creator_core::config::{DEFAULT_COLUMN, DEFAULT_MAX_IN_FLIGHT};
use folder_creator_core::destination::DEFAULT_STORE_FILE;
use std::path::PathBuf;

/// Folder Creator: create one folder per identifier listed in a CSV file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// CSV file whose identifier column lists the folders to create.
    pub source: PathBuf,

    /// Directory to create the folders in. Defaults to the remembered destination.
    pub destination: Option<PathBuf>,

    /// Header label of the identifier column.
    #[arg(long, env = "FOLDER_CREATOR_COLUMN", default_value = DEFAULT_COLUMN)]
    pub column: String,

    /// Field delimiter of the source file (a single ASCII character, or `tab`).
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Maximum number of folders being created at the same time.
    #[arg(
        long,
        env = "FOLDER_CREATOR_MAX_IN_FLIGHT",
        default_value_t = DEFAULT_MAX_IN_FLIGHT,
        value_parser = parse_max_in_flight
    )]
    pub max_in_flight: usize,

    /// File that remembers the last destination used.
    #[arg(long, env = "FOLDER_CREATOR_REMEMBER_FILE", default_value = DEFAULT_STORE_FILE)]
    pub remember_file: PathBuf,

    /// Do not save the destination for the next run.
    #[arg(long)]
    pub no_remember: bool,

    /// Report which folders would be created without creating them.
    #[arg(long)]
    pub dry_run: bool,

    /// Output format of the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn creator_config(&self) -> CreatorConfig {
        CreatorConfig::default()
            .with_column(self.column.clone())
            .with_delimiter(self.delimiter)
            .with_max_in_flight(self.max_in_flight)
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("delimiter must be a single ASCII character, got '{value}'")),
        },
    }
}

fn parse_max_in_flight(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["folder-creator", "orders.csv", "/srv/jobs"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("orders.csv"));
        assert_eq!(cli.destination, Some(PathBuf::from("/srv/jobs")));
        assert_eq!(cli.column, DEFAULT_COLUMN);
        assert_eq!(cli.delimiter, b',');
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.dry_run);
        assert_eq!(cli.creator_config(), CreatorConfig::default());
    }

    #[test]
    fn test_destination_is_optional() {
        let cli = Cli::try_parse_from(["folder-creator", "orders.csv"]).unwrap();
        assert!(cli.destination.is_none());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["folder-creator"]).is_err());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "folder-creator",
            "orders.tsv",
            "out",
            "--column",
            "Ref",
            "--delimiter",
            "tab",
            "--max-in-flight",
            "4",
            "--format",
            "json",
            "--dry-run",
            "-vv",
        ])
        .unwrap();
        let config = cli.creator_config();
        assert_eq!(config.column, "Ref");
        assert_eq!(config.delimiter, b'\t');
        assert_eq!(config.max_in_flight, 4);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["folder-creator", "a.csv", "--max-in-flight", "0"]).is_err());
        assert!(Cli::try_parse_from(["folder-creator", "a.csv", "--delimiter", ";;"]).is_err());
        assert!(Cli::try_parse_from(["folder-creator", "a.csv", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter("é").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
