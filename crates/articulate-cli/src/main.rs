//! Articulate: scrape articulation agreement pages into a CSV.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use articulate::{ChromeExecutable, LaunchOptions, Lookup, WindowSize};
use articulate_cli::config::{resolve_urls, RunOptions, DEFAULT_OUTPUT_PATH, DEFAULT_SCROLL_PASSES};

#[derive(Parser)]
#[command(
    name = "articulate",
    about = "Extract course equivalencies from articulation agreement pages",
    version
)]
struct Cli {
    /// File with one agreement URL per line (`#` starts a comment).
    #[arg(long)]
    links: Option<PathBuf>,

    /// Agreement URL. May be repeated; processed after the links file.
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Output CSV path.
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    out: PathBuf,

    /// Show the browser window.
    #[arg(long)]
    no_headless: bool,

    /// Explicit Chrome/Chromium binary.
    #[arg(long)]
    driver_path: Option<PathBuf>,

    /// Scroll intensity; each pass allows three convergence iterations.
    #[arg(long, default_value_t = DEFAULT_SCROLL_PASSES, allow_negative_numbers = true)]
    scroll_passes: i64,

    /// Browser window size as W,H.
    #[arg(long, default_value = "1600,2200")]
    window_size: WindowSize,

    /// Override the browser user agent.
    #[arg(long)]
    user_agent: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   articulate completions bash > ~/.local/share/bash-completion/completions/articulate
    ///   articulate completions zsh > ~/.zfunc/_articulate
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Look up rows in a written dataset.
    ///
    /// Examples:
    ///   articulate lookup --course "CS 61A"
    ///   articulate lookup --college "Foothill College" --csv data/articulations.csv
    Lookup {
        /// Dataset to read.
        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        csv: PathBuf,

        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct QueryArgs {
    /// Receiving course; prints every equivalent (cc_name, cc_course).
    #[arg(long)]
    course: Option<String>,

    /// Sending institution; prints every mapping (b_course, cc_course).
    #[arg(long)]
    college: Option<String>,
}

impl QueryArgs {
    fn into_lookup(self) -> Option<Lookup> {
        match (self.course, self.college) {
            (Some(course), _) => Some(Lookup::Course(course)),
            (None, Some(college)) => Some(Lookup::College(college)),
            (None, None) => None,
        }
    }
}

fn print_completions(shell: Shell) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut Cli::command(), "articulate", &mut buf);
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&buf).context("writing completions")?;
    stdout.flush().context("flushing completions")?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            return match print_completions(shell) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("{e:#}");
                    ExitCode::FAILURE
                }
            };
        }
        Some(Commands::Lookup { csv, query }) => {
            let Some(query) = query.into_lookup() else {
                return ExitCode::from(2);
            };
            return match articulate_cli::lookup(&csv, &query, std::io::stdout().lock()) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("{e}");
                    ExitCode::from(e.exit_code())
                }
            };
        }
        None => {}
    }

    let urls = match resolve_urls(cli.links.as_deref(), &cli.urls) {
        Ok(urls) => urls,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let launch = LaunchOptions {
        headless: !cli.no_headless,
        executable: cli
            .driver_path
            .map(ChromeExecutable::Explicit)
            .unwrap_or_default(),
        window_size: cli.window_size,
        user_agent: cli.user_agent,
    };
    let options = RunOptions::new(urls, cli.out, launch, cli.scroll_passes);

    match articulate_cli::run(options).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
