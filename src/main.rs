mod config;
mod error;
mod export;
mod format;
mod monitor;
mod platform;

use std::io;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{MonitorConfig, DEFAULT_INTERVAL_MS, DEFAULT_OUTPUT_TEMPLATE};
use crate::export::{CsvFile, Exporter};
use crate::monitor::RunEnd;
use crate::platform::SysinfoSource;

/// Process utilization monitor.
#[derive(Parser, Debug)]
#[command(name = "procmon", version, about)]
struct Args {
    /// PID of the monitored process
    pid: u32,

    /// Print results to the screen instead of a file
    #[arg(short, long)]
    stdout: bool,

    /// File to write the results to; `{dt}` and `{pid}` are expanded
    #[arg(short, long, default_value = DEFAULT_OUTPUT_TEMPLATE)]
    output: String,

    /// Sampling interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Stop after this many samples
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Maximum CPU frequency in MHz, instead of the value read from the OS
    #[arg(long)]
    max_mhz: Option<f64>,

    /// Increase log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> error::Result<RunEnd> {
    let started = Local::now();
    let max_mhz = args.max_mhz.unwrap_or_else(platform::max_cpu_mhz);

    let cfg = MonitorConfig {
        interval: Duration::from_millis(args.interval),
        max_samples: args.count,
    };
    let mut source = SysinfoSource::new(args.pid);

    if args.stdout {
        let mut exporter = Exporter::Console(io::stdout());
        monitor::run(&cfg, &mut source, &mut exporter, max_mhz)
    } else {
        let path = config::render_output_path(&args.output, &started, args.pid)?;
        let file = CsvFile::new(path);
        info!(path = %file.path().display(), "recording to file");
        let mut exporter: Exporter<io::Stdout> = Exporter::File(file);
        monitor::run(&cfg, &mut source, &mut exporter, max_mhz)
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(RunEnd::Completed { samples }) => info!(samples, "sample limit reached"),
        Ok(end @ RunEnd::Ended { samples, .. }) => {
            info!(samples, "monitored process exited");
            println!("{}", end);
        }
        Ok(end @ RunEnd::NotFound { .. }) => println!("{}", end),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_file_mode() {
        let args = Args::try_parse_from(["procmon", "1234"]).unwrap();
        assert_eq!(args.pid, 1234);
        assert!(!args.stdout);
        assert_eq!(args.output, "{dt}-PID{pid}.csv");
        assert_eq!(args.interval, 1000);
        assert_eq!(args.count, None);
    }

    #[test]
    fn short_flags() {
        let args =
            Args::try_parse_from(["procmon", "-s", "-o", "x-{pid}.csv", "-n", "3", "-vv", "42"])
                .unwrap();
        assert!(args.stdout);
        assert_eq!(args.output, "x-{pid}.csv");
        assert_eq!(args.count, Some(3));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.pid, 42);
    }

    #[test]
    fn pid_must_be_numeric() {
        assert!(Args::try_parse_from(["procmon", "abc"]).is_err());
        assert!(Args::try_parse_from(["procmon"]).is_err());
    }
}
