//! popu-rank - population change ranking by prefecture
//!
//! Reads a yearly population-by-prefecture CSV, keeps the rows of two
//! reference years and prints every prefecture ranked by the ratio of its
//! later count to its earlier count.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, malformed line, bad config, etc.)

mod analysis;
mod cli;
mod config;
mod input;
mod models;
mod report;

use analysis::{AggregateStats, ReferenceYears};
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use input::LineSource;
use models::RankingEntry;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config errors are fatal; logging is not up yet, so report them directly.
    let config = match load_config(&args, Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(log_level(&args, config.general.verbose));

    debug!("popu-rank v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(&args, config) {
        error!("Ranking failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .popu-rank.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Pick the log level.
///
/// `verbose` from the config file applies unless `--quiet` was given.
fn log_level(args: &Args, config_verbose: bool) -> tracing::Level {
    if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging. Logs go to stderr.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the whole batch: read, aggregate, rank, print once.
fn run(args: &Args, mut config: Config) -> Result<()> {
    let start_time = Instant::now();

    config.merge_with_args(args);
    config.validate()?;

    let (lines, stats) = render_report(&config)?;

    let stdout = std::io::stdout();
    report::write_listing(&mut stdout.lock(), &lines).context("Failed to write ranking")?;

    info!(
        lines_read = stats.lines_read,
        printed = lines.len(),
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Ranking complete"
    );

    Ok(())
}

/// Build the formatted ranking lines for a merged configuration.
fn render_report(config: &Config) -> Result<(Vec<String>, AggregateStats)> {
    let years = ReferenceYears::from(config.years);
    let (mut ranking, stats) = build_ranking(&config.general.input, years)?;

    if let Some(top) = config.report.top {
        ranking.truncate(top);
    }

    Ok((report::format_ranking(&ranking), stats))
}

/// Read `path` to exhaustion, then finalize and rank the summary.
fn build_ranking(
    path: &Path,
    years: ReferenceYears,
) -> Result<(Vec<RankingEntry>, AggregateStats)> {
    info!(
        "Ranking {} by change from {} to {}",
        path.display(),
        years.early,
        years.late
    );

    let source = LineSource::open(path)?;
    let (mut table, stats) = analysis::aggregate(source.lines(), years)
        .with_context(|| format!("Failed to aggregate {}", path.display()))?;

    if table.is_empty() {
        warn!(
            "No lines for {} or {} in {}",
            years.early,
            years.late,
            path.display()
        );
    }

    table.finalize();
    Ok((table.rank(), stats))
}

/// Load configuration from `-c`, else from `.popu-rank.toml` in `dir`, else defaults.
///
/// A config file that exists but cannot be read or parsed is an error.
fn load_config(args: &Args, dir: &Path) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    Ok(Config::load_from_dir(dir)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YEARS: ReferenceYears = ReferenceYears {
        early: 2010,
        late: 2015,
    };

    fn write_input(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn ranking_lines(path: &Path) -> Vec<String> {
        let (ranking, _) = build_ranking(path, YEARS).unwrap();
        report::format_ranking(&ranking)
    }

    #[test]
    fn test_end_to_end_scenario() {
        let file = write_input("2010,Tokyo,x,100\n2015,Tokyo,x,120\n2010,Osaka,x,200\n2015,Osaka,x,180\n");

        assert_eq!(
            ranking_lines(file.path()),
            vec![
                "Tokyo: 100 => 120 change-ratio:1.2",
                "Osaka: 200 => 180 change-ratio:0.9",
            ]
        );
    }

    #[test]
    fn test_missing_early_year_still_printed() {
        let file = write_input("2010,Tokyo,x,100\n2015,Tokyo,x,120\n2015,Okinawa,x,50\n");

        let lines = ranking_lines(file.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Okinawa: 0 => 50 change-ratio:Infinity");
    }

    #[test]
    fn test_output_length_matches_distinct_keys() {
        let file = write_input(
            "集計年,都道府県名,10〜14歳人口,15〜19歳人口\n\
             2010,北海道,x,258530\n2015,北海道,x,241222\n\
             2010,青森県,x,68715\n2015,青森県,x,60526\n\
             2005,岩手県,x,1\n\
             2015,岩手県,x,60\n",
        );

        let (ranking, stats) = build_ranking(file.path(), YEARS).unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(stats.lines_read, 7);
        assert_eq!(stats.lines_skipped, 2);
    }

    #[test]
    fn test_runs_are_repeatable() {
        let file = write_input("2010,A,x,3\n2015,A,x,6\n2010,B,x,4\n2015,B,x,8\n2010,C,x,9\n2015,C,x,1\n");
        assert_eq!(ranking_lines(file.path()), ranking_lines(file.path()));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_ranking(&dir.path().join("popu-pref.csv"), YEARS).unwrap_err();
        assert!(err.to_string().contains("cannot open input"));
    }

    #[test]
    fn test_short_line_is_an_error() {
        let file = write_input("2010,Tokyo,x,100\n2015,Tokyo\n2015,Osaka,x,120\n");
        let err = build_ranking(file.path(), YEARS).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_undecodable_bytes_are_tolerated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"2010,Tokyo,\xff,100\n2015,Tokyo,x,120\n").unwrap();

        assert_eq!(
            ranking_lines(file.path()),
            vec!["Tokyo: 100 => 120 change-ratio:1.2"]
        );
    }

    fn make_args() -> Args {
        Args {
            input: None,
            early_year: None,
            late_year: None,
            top: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_broken_default_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[years\nearly = ").unwrap();

        let err = load_config(&make_args(), dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&make_args(), dir.path()).unwrap();
        assert_eq!(config.years.early, 2010);
        assert_eq!(config.report.top, None);
    }

    #[test]
    fn test_explicit_config_wins_over_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[report]\ntop = 9\n").unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "[report]\ntop = 2\n").unwrap();

        let mut args = make_args();
        args.config = Some(explicit);
        assert_eq!(load_config(&args, dir.path()).unwrap().report.top, Some(2));
    }

    #[test]
    fn test_report_top_truncates_ranking() {
        let file = write_input("2010,A,x,10\n2015,A,x,30\n2010,B,x,10\n2015,B,x,20\n2010,C,x,10\n2015,C,x,5\n");
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[report]\ntop = 2\n").unwrap();

        let mut config = load_config(&make_args(), dir.path()).unwrap();
        let mut args = make_args();
        args.input = Some(file.path().to_path_buf());
        config.merge_with_args(&args);
        config.validate().unwrap();

        let (lines, stats) = render_report(&config).unwrap();
        assert_eq!(
            lines,
            vec!["A: 10 => 30 change-ratio:3", "B: 10 => 20 change-ratio:2"]
        );
        assert_eq!(stats.lines_read, 6);

        args.top = Some(1);
        config.merge_with_args(&args);
        assert_eq!(render_report(&config).unwrap().0.len(), 1);
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let mut args = make_args();
        assert_eq!(log_level(&args, false), tracing::Level::WARN);
        assert_eq!(log_level(&args, true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(log_level(&args, true), tracing::Level::ERROR);
    }
}
