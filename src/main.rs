use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand};

use mdpage::config::SiteConfig;
use mdpage::content::PageContent;
use mdpage::logging::{init_logging, LogFormat};
use mdpage::site::{build_site, record_slug, render_record, slug_path};
use mdpage::toc;

/// Explicit subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Render one content record to a standalone HTML page
    Render {
        /// Path to the JSON content record
        record: PathBuf,
        /// Site configuration (YAML)
        #[arg(long, env = "MDPAGE_CONFIG")]
        config: Option<PathBuf>,
        /// Locale to render with (defaults to the config's default_locale)
        #[arg(long)]
        locale: Option<String>,
        /// URL path of the page, used to mark the current sidebar item
        #[arg(long)]
        path: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render every record in a directory
    Build {
        /// Directory of JSON content records
        input: PathBuf,
        /// Output directory
        out: PathBuf,
        /// Site configuration (YAML)
        #[arg(long, env = "MDPAGE_CONFIG")]
        config: Option<PathBuf>,
        /// Locale to render with (defaults to the config's default_locale)
        #[arg(long)]
        locale: Option<String>,
    },
    /// Report TOC anchors whose target heading is missing
    Check {
        /// Path to the JSON content record
        record: PathBuf,
    },
}

#[derive(Parser)]
#[command(
    name = "mdpage",
    version,
    about = "Render documentation pages with a scroll-synced table of contents"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Human, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Render {
            record,
            config,
            locale,
            path,
            output,
        } => {
            run_render(&record, config.as_deref(), locale.as_deref(), path, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Build {
            input,
            out,
            config,
            locale,
        } => {
            let config = SiteConfig::load_or_default(config.as_deref())?;
            let locale = config.locale(locale.as_deref())?;
            let summary = build_site(&input, &out, &locale, &config)?;
            println!(
                "rendered {} page(s), skipped {}",
                summary.rendered, summary.skipped
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { record } => run_check(&record),
    }
}

fn run_render(
    record: &Path,
    config: Option<&Path>,
    locale: Option<&str>,
    path: Option<String>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = SiteConfig::load_or_default(config)?;
    let locale = config.locale(locale)?;
    let page = PageContent::load(record)?;
    let path = path.unwrap_or_else(|| slug_path(&record_slug(&page, record)));
    tracing::info!(record = %record.display(), path = %path, "rendering");

    let html = render_record(&page, &path, &locale, &config);
    match output {
        Some(out) => {
            fs::write(out, html).with_context(|| format!("writing {}", out.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .context("writing to stdout")?;
        }
    }
    Ok(())
}

fn run_check(record: &Path) -> anyhow::Result<ExitCode> {
    let page = PageContent::load(record)?;
    let broken = toc::broken_anchors(&page);
    for anchor in &broken {
        println!("{}: #{} ({})", record.display(), anchor.fragment, anchor.text);
    }
    tracing::info!(record = %record.display(), broken = broken.len(), "checked");
    if broken.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
