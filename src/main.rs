use clap::Parser;
use jobimport_config::Config;
use jobimport_pipeline::error::ErrorKind;
use jobimport_pipeline::{Importer, Mode, Record};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Import a job posting from a web page and print its fields.
#[derive(Debug, Parser)]
#[command(name = "jobimport", version, about)]
struct Cli {
    /// Address of a single job posting. `https://` is assumed when no scheme is given.
    url: String,

    /// Render the page in headless Chrome instead of fetching it.
    #[arg(long)]
    browser: bool,

    /// When the plain fetch fails or returns a listing, retry once in a browser.
    #[arg(long, conflicts_with = "browser")]
    fallback_browser: bool,

    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the fields as a JSON object.
    #[arg(long)]
    json: bool,

    /// Include internal `_`-prefixed fields.
    #[arg(long)]
    internal: bool,

    /// More logging on stderr (-v, -vv, -vvv). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

/// Form inputs often omit the scheme.
fn with_scheme(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() || input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    }
}

async fn run(importer: &Importer, url: &str, cli: &Cli) -> jobimport_pipeline::error::Result<Record> {
    if cli.browser {
        return importer.import(url, Mode::Browser).await;
    }
    match importer.import(url, Mode::Auto).await {
        Err(err) if cli.fallback_browser && err.suggests_browser() && importer.renderer().is_available() => {
            let kind: &ErrorKind = &err;
            tracing::warn!(error = %kind, "Import failed, retrying in browser mode");
            importer.import(url, Mode::Browser).await
        },
        result => result,
    }
}

fn print(fields: &BTreeMap<String, String>, json: bool) -> Result<(), String> {
    if json {
        let text = serde_json::to_string_pretty(fields).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        for (key, value) in fields {
            println!("{key}: {value}");
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", &*err);
            return ExitCode::from(2);
        },
    };
    let importer = match Importer::from_config(&config) {
        Ok(importer) => importer,
        Err(err) => {
            eprintln!("error: {}", &*err);
            return ExitCode::FAILURE;
        },
    };
    tracing::debug!(?importer, "Importer ready");

    let url = with_scheme(&cli.url);
    match run(&importer, &url, &cli).await {
        Ok(record) => {
            let fields = if cli.internal { record.to_map() } else { record.prefill() };
            match print(&fields, cli.json) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("error: {err}");
                    ExitCode::FAILURE
                },
            }
        },
        Err(err) => {
            let kind: &ErrorKind = &err;
            eprintln!("error: {kind}");
            if kind.suggests_browser() && !cli.browser {
                eprintln!("hint: retry with --browser to render the page in headless Chrome");
            }
            tracing::debug!(error = ?err, "Import failed");
            match kind {
                ErrorKind::InvalidUrl(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        },
    }
}
