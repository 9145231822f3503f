use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use beacon_cli::commands;
use beacon_cli::commands::run::RunConfig;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Batch Lighthouse analysis via the PageSpeed Insights page",
    long_about = "Beacon drives a headless browser through the public PageSpeed Insights \
                  page for a list of URLs, scrapes the injected Lighthouse results for both \
                  device classes, and accumulates scores, metrics, and audit insights into \
                  CSV stores and static reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every URL in the target list and append results to the stores
    Run {
        /// Target list: one URL per line, # comments allowed
        #[arg(long, default_value = "urls.txt")]
        urls: PathBuf,

        /// Directory the CSV stores and screenshots are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Path to the Chrome binary (auto-detected when omitted)
        #[arg(long)]
        chrome_path: Option<PathBuf>,

        /// Capture Full HD full-page screenshots per device class
        #[arg(long)]
        screenshots: bool,

        /// Delete existing CSV stores before the batch instead of appending
        #[arg(long)]
        fresh: bool,

        /// Run with a visible browser window
        #[arg(long)]
        headful: bool,

        /// Minimum delay between targets, in seconds
        #[arg(long, default_value_t = 5)]
        min_delay: u64,

        /// Maximum delay between targets, in seconds
        #[arg(long, default_value_t = 10)]
        max_delay: u64,

        /// Maximum wait for the first device's data, in seconds
        #[arg(long, default_value_t = 180)]
        max_wait: u64,

        /// Additional wait for the second device's data, in seconds
        #[arg(long, default_value_t = 60)]
        settle_wait: u64,
    },

    /// Print a console summary of the primary store
    Report {
        /// Path to the primary results store
        #[arg(value_name = "FILE", default_value = "pagespeed_results.csv")]
        file: PathBuf,
    },

    /// Generate the static HTML dashboard from the primary store
    Html {
        /// Path to the primary results store
        #[arg(value_name = "FILE", default_value = "pagespeed_results.csv")]
        file: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "pagespeed_report.html")]
        output: PathBuf,
    },

    /// Check that Chrome, the target list, and the output directory are usable
    Doctor {
        /// Target list to validate
        #[arg(long, default_value = "urls.txt")]
        urls: PathBuf,

        /// Path to the Chrome binary (auto-detected when omitted)
        #[arg(long)]
        chrome_path: Option<PathBuf>,

        /// Output directory to check for writability
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            urls,
            output_dir,
            chrome_path,
            screenshots,
            fresh,
            headful,
            min_delay,
            max_delay,
            max_wait,
            settle_wait,
        } => {
            let config = RunConfig::new(urls, output_dir)
                .chrome_path(chrome_path)
                .screenshots(screenshots)
                .fresh(fresh)
                .headless(!headful)
                .delay_window(min_delay, max_delay)
                .wait_budget(max_wait, settle_wait);
            commands::run::execute(config).await
        }
        Commands::Report { file } => commands::report::execute(&file),
        Commands::Html { file, output } => commands::html::execute(&file, &output),
        Commands::Doctor {
            urls,
            chrome_path,
            output_dir,
        } => commands::doctor::execute(&urls, chrome_path, &output_dir),
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("beacon=debug,beacon_core=debug,beacon_browser=debug")
    } else {
        EnvFilter::new("beacon=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
