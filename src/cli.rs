//! CLI argument parsing for eafsum

use crate::config::AnalysisConfig;
use crate::csv_output::Delimiter;
use crate::sweep::ActivationMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "eafsum")]
#[command(version)]
#[command(
    about = "Analyze and report the annotated time segments for tiers in annotation files",
    long_about = None,
    after_help = "Examples:\n    eafsum -o foo.csv raw_FOO/*.json\n    eafsum --ignore-tiers EE1 UC1 -- raw_FOO/*.json\n\n\
                  [When using list options, separate tier names from file names with '--'.]"
)]
pub struct Cli {
    /// Write output to <FILE> instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Field separator for the report
    #[arg(short = 'd', long = "delimiter", value_enum)]
    pub delimiter: Option<Delimiter>,

    /// Additional tiers to ignore (space or comma separated)
    #[arg(long = "ignore-tiers", value_name = "TIER", num_args = 1.., value_delimiter = ',')]
    pub ignore_tiers: Vec<String>,

    /// Only count time during which this tier is active
    #[arg(long = "limiting-tier", value_name = "TIER")]
    pub limiting_tier: Option<String>,

    /// Don't count time during which any of these tiers is active
    #[arg(long = "masking-tiers", value_name = "TIER", num_args = 1.., value_delimiter = ',')]
    pub masking_tiers: Vec<String>,

    /// Don't summarize ADS & CDS amounts
    #[arg(long = "no-xds")]
    pub no_xds: bool,

    /// Don't include tier overlap details in output
    #[arg(long = "no-overlap")]
    pub no_overlap: bool,

    /// Don't include per-file totals and grand totals rows
    #[arg(long = "no-totals")]
    pub no_totals: bool,

    /// How overlapping segments on the same tier are counted
    #[arg(long = "activation", value_enum)]
    pub activation: Option<ActivationMode>,

    /// Load analysis options from a TOML file (flags override it)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Load the category code table from a TOML file
    #[arg(long = "categories", value_name = "FILE")]
    pub categories: Option<PathBuf>,

    /// Number of files analyzed in parallel
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value = "1")]
    pub jobs: usize,

    /// Write status messages to stderr (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The annotation file(s) to process
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    ///
    /// Lists extend, scalars replace, `--no-*` switches force features off.
    pub fn apply_to(&self, config: &mut AnalysisConfig) {
        config.ignore_tiers.extend(self.ignore_tiers.iter().cloned());
        config.masking_tiers.extend(self.masking_tiers.iter().cloned());

        if let Some(limiting) = &self.limiting_tier {
            config.limiting_tier = Some(limiting.clone());
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(activation) = self.activation {
            config.activation = activation;
        }
        if self.no_xds {
            config.xds = false;
        }
        if self.no_overlap {
            config.overlap = false;
        }
        if self.no_totals {
            config.totals = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_files() {
        let cli = Cli::parse_from(["eafsum", "a.json", "b.json"]);
        assert_eq!(cli.files.len(), 2);
        assert!(cli.output.is_none());
        assert_eq!(cli.jobs, 1);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(Cli::try_parse_from(["eafsum"]).is_err());
    }

    #[test]
    fn test_cli_ignore_tiers_before_separator() {
        let cli = Cli::parse_from(["eafsum", "--ignore-tiers", "EE1", "UC1", "--", "a.json"]);
        assert_eq!(cli.ignore_tiers, vec!["EE1", "UC1"]);
        assert_eq!(cli.files, vec![PathBuf::from("a.json")]);
    }

    #[test]
    fn test_cli_comma_separated_masking() {
        let cli = Cli::parse_from(["eafsum", "--masking-tiers", "EE1,UC1", "--", "a.json"]);
        assert_eq!(cli.masking_tiers, vec!["EE1", "UC1"]);
        assert_eq!(cli.files.len(), 1);
    }

    #[test]
    fn test_cli_delimiter_choices() {
        let cli = Cli::parse_from(["eafsum", "-d", "comma", "a.json"]);
        assert_eq!(cli.delimiter, Some(Delimiter::Comma));

        assert!(Cli::try_parse_from(["eafsum", "-d", "pipe", "a.json"]).is_err());
    }

    #[test]
    fn test_cli_verbose_count() {
        let cli = Cli::parse_from(["eafsum", "-vvv", "a.json"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_apply_to_overrides() {
        let cli = Cli::parse_from([
            "eafsum",
            "--no-overlap",
            "--limiting-tier",
            "L",
            "--activation",
            "multiset",
            "--ignore-tiers",
            "UC1",
            "--",
            "a.json",
        ]);
        let mut config = AnalysisConfig {
            ignore_tiers: vec!["EE1".to_string()],
            ..Default::default()
        };
        cli.apply_to(&mut config);

        assert!(!config.overlap);
        assert!(config.xds);
        assert!(config.totals);
        assert_eq!(config.limiting_tier.as_deref(), Some("L"));
        assert_eq!(config.activation, ActivationMode::Multiset);
        assert_eq!(config.ignore_tiers, vec!["EE1", "UC1"]);
    }

    #[test]
    fn test_apply_to_keeps_config_defaults() {
        let cli = Cli::parse_from(["eafsum", "a.json"]);
        let mut config = AnalysisConfig {
            delimiter: Delimiter::Ascii,
            ..Default::default()
        };
        cli.apply_to(&mut config);
        assert_eq!(config.delimiter, Delimiter::Ascii);
    }
}
