use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use replace_tokens::config::{ConfigOverrides, FAIL_ON_MISSING_INPUT, parse_bool};
use replace_tokens::{ProcessEnv, Result, RunConfig, RunOptions, RunSummary, list_placeholders, run};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LONG_HELP: &str = r#"
Inputs (read from the environment, CLI flags take precedence):
  INPUT_PREFIX                           - Placeholder opening delimiter (default: #{)
  INPUT_SUFFIX                           - Placeholder closing delimiter (default: }#)
  INPUT_FILES                            - Glob selecting files, relative to the root (default: **)
  INPUT_FAIL-IF-NO-PROVIDED-REPLACEMENT  - true/false, abort on a placeholder without a value
                                           (default: true; INPUT_FAIL_IF_NO_PROVIDED_REPLACEMENT
                                           is accepted as well)

Each placeholder's inner text is looked up verbatim as an environment variable:
  #{DATABASE_URL}#  ->  $DATABASE_URL

Examples:
  # Replace tokens in every file below the current directory
  DATABASE_URL=postgres://db replace-tokens
  # Only YAML files under deploy/
  replace-tokens --files 'deploy/**/*.yaml'
  # Blank placeholders that have no value instead of failing
  replace-tokens --fail-if-no-provided-replacement false
  # Show which files would change without writing
  replace-tokens --dry-run
  # List placeholders per file as JSON
  replace-tokens --list=json

Set REPLACE_TOKENS_ROOT to change the default search directory, and REPLACE_TOKENS_LOG
(e.g. REPLACE_TOKENS_LOG=debug) to override the log filter.
"#;

/// Replace placeholder tokens in files with environment variable values.
#[derive(Parser, Debug)]
#[command(
    name = "replace-tokens",
    version,
    about = "Replace placeholder tokens in files with environment variable values.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Directory to search for files
    #[arg(
        short = 'C',
        long,
        value_name = "DIR",
        default_value = ".",
        env = "REPLACE_TOKENS_ROOT"
    )]
    root: PathBuf,

    /// Placeholder opening delimiter
    #[arg(long, value_name = "PREFIX", value_parser = NonEmptyStringValueParser::new())]
    prefix: Option<String>,

    /// Placeholder closing delimiter
    #[arg(long, value_name = "SUFFIX", value_parser = NonEmptyStringValueParser::new())]
    suffix: Option<String>,

    /// Glob selecting the files to process, relative to the root
    #[arg(long, value_name = "GLOB", value_parser = NonEmptyStringValueParser::new())]
    files: Option<String>,

    /// Abort on the first placeholder that has no value (true/false)
    #[arg(long, value_name = "BOOL", value_parser = parse_bool_arg)]
    fail_if_no_provided_replacement: Option<bool>,

    /// Resolve every placeholder but write nothing
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// List placeholders per file (optionally with format: plain, json)
    #[arg(long, value_name = "FORMAT", num_args = 0..=1, default_missing_value = "plain")]
    list: Option<ListFormat>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum ListFormat {
    /// One block per file with its keys
    Plain,
    /// JSON output for scripting
    Json,
}

fn parse_bool_arg(value: &str) -> std::result::Result<bool, String> {
    parse_bool(FAIL_ON_MISSING_INPUT, value).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    if let Err(e) = execute(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter =
        EnvFilter::try_from_env("REPLACE_TOKENS_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn execute(cli: &Cli) -> Result<()> {
    let config = RunConfig::resolve_with(&ProcessEnv, &overrides(cli))?;
    tracing::debug!(
        prefix = %config.prefix,
        suffix = %config.suffix,
        files = %config.files,
        fail_on_missing = config.fail_on_missing,
        "resolved configuration"
    );

    if let Some(format) = cli.list {
        return print_listing(&config, &cli.root, format);
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
    };
    let summary = run(&config, &cli.root, &ProcessEnv, &options)?;

    if cli.dry_run {
        print_dry_run(&summary, &cli.root)?;
    }

    tracing::info!(
        scanned = summary.files_scanned,
        rewritten = summary.files_rewritten,
        placeholders = summary.placeholders_replaced,
        blanked = summary.blanked().count(),
        "processing complete"
    );
    Ok(())
}

fn overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        prefix: cli.prefix.clone(),
        suffix: cli.suffix.clone(),
        files: cli.files.clone(),
        fail_on_missing: cli.fail_if_no_provided_replacement,
    }
}

fn display_path<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

fn print_dry_run(summary: &RunSummary, root: &Path) -> Result<()> {
    let mut stdout = io::stdout().lock();

    for report in summary.reports.iter().filter(|r| r.changed) {
        writeln!(
            stdout,
            "would rewrite {} ({} placeholders)",
            display_path(&report.path, root),
            report.placeholders
        )?;
        for key in &report.blanked {
            writeln!(stdout, "  {key} -> (empty)")?;
        }
    }

    let changed = summary.reports.iter().filter(|r| r.changed).count();
    writeln!(
        stdout,
        "\nSummary: {} files scanned, {changed} would change",
        summary.files_scanned
    )?;
    stdout.flush()?;
    Ok(())
}

fn print_listing(config: &RunConfig, root: &Path, format: ListFormat) -> Result<()> {
    let listings = list_placeholders(config, root)?;
    let mut stdout = io::stdout().lock();

    match format {
        ListFormat::Plain => {
            for listing in &listings {
                writeln!(stdout, "{}", display_path(&listing.path, root))?;
                for key in &listing.keys {
                    writeln!(stdout, "  {key}")?;
                }
            }
        }
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&listings)?;
            writeln!(stdout, "{json}")?;
        }
    }

    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_take_precedence() {
        let cli = Cli::parse_from([
            "replace-tokens",
            "--prefix",
            "<<",
            "--files",
            "*.ini",
            "--fail-if-no-provided-replacement",
            "FALSE",
        ]);
        // An invalid environment value is never read when the flag is given
        let env = HashMap::from([(
            "INPUT_FAIL-IF-NO-PROVIDED-REPLACEMENT".to_string(),
            "panic".to_string(),
        )]);
        let config = RunConfig::resolve_with(&env, &overrides(&cli)).unwrap();
        assert_eq!(config.prefix, "<<");
        assert_eq!(config.suffix, "}#");
        assert_eq!(config.files, "*.ini");
        assert!(!config.fail_on_missing);

        let cli = Cli::parse_from(["replace-tokens"]);
        assert!(RunConfig::resolve_with(&env, &overrides(&cli)).is_err());
    }

    #[test]
    fn test_root_reads_environment() {
        use clap::CommandFactory;
        let command = Cli::command();
        let root = command
            .get_arguments()
            .find(|arg| arg.get_id() == "root")
            .unwrap();
        assert_eq!(
            root.get_env(),
            Some(std::ffi::OsStr::new("REPLACE_TOKENS_ROOT"))
        );
    }

    #[test]
    fn test_invalid_bool_flag_rejected() {
        let result = Cli::try_parse_from([
            "replace-tokens",
            "--fail-if-no-provided-replacement",
            "panic",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        assert!(Cli::try_parse_from(["replace-tokens", "--prefix", ""]).is_err());
    }

    #[test]
    fn test_list_default_format() {
        let cli = Cli::parse_from(["replace-tokens", "--list"]);
        assert_eq!(cli.list, Some(ListFormat::Plain));
        let cli = Cli::parse_from(["replace-tokens", "--list=json"]);
        assert_eq!(cli.list, Some(ListFormat::Json));
        assert!(Cli::try_parse_from(["replace-tokens", "--list", "--dry-run"]).is_err());
    }
}
