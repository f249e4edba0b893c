use anyhow::{bail, Context, Result};
use chartpress::fetch::ChartFetcher;
use chartpress::server::{serve, ServerConfig};
use chartpress::{pipeline, Dataset, LayoutOptions, VisualSpec};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chartpress")]
#[command(about = "Resolve visual specs against tabular data and emit chart options", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a spec against a CSV/TSV dataset and print chart options as JSON
    Render {
        /// Path to the visual spec (JSON)
        spec: PathBuf,
        /// Path to the dataset; omit to fetch the spec's dataUrl, or pass
        /// `-` to read from stdin (ignored when the spec carries inline
        /// data)
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 420)]
        height: u32,
    },
    /// Validate a visual spec without touching any data
    Check {
        spec: PathBuf,
    },
    /// Run the content site's API endpoints
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
    },
}

fn load_spec(path: &PathBuf) -> Result<VisualSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read spec {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse spec {}", path.display()))
}

async fn render(
    spec_path: &PathBuf,
    data: Option<&PathBuf>,
    layout: &LayoutOptions,
) -> Result<()> {
    let spec = load_spec(spec_path)?;
    spec.validate()?;

    let options = if spec.data.is_some() {
        pipeline::run_inline(&spec, layout)?
    } else {
        let dataset = load_dataset(&spec, data).await?;
        pipeline::run(&spec, &dataset, layout)?
    };

    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

async fn load_dataset(spec: &VisualSpec, data: Option<&PathBuf>) -> Result<Dataset> {
    match data {
        Some(path) if path.as_os_str() == "-" => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read data from stdin")?;
            Ok(Dataset::from_delimited(&buffer)?)
        }
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read data {}", path.display()))?;
            Ok(Dataset::from_delimited(&text)?)
        }
        None => {
            let url = match &spec.data_url {
                Some(url) => url,
                None => bail!("spec has no dataUrl; pass --data"),
            };
            let fetcher = ChartFetcher::new(reqwest::Client::new(), None);
            match fetcher.load(url).await? {
                Some(dataset) => Ok(dataset),
                None => bail!("fetch was superseded"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Render {
            spec,
            data,
            width,
            height,
        } => {
            let layout = LayoutOptions { width, height };
            render(&spec, data.as_ref(), &layout).await
        }
        Command::Check { spec } => {
            let parsed = load_spec(&spec)?;
            parsed.validate()?;
            parsed.shape()?;
            println!("ok");
            Ok(())
        }
        Command::Serve { bind } => {
            let config = ServerConfig {
                bind,
                ..Default::default()
            };
            serve(config).await
        }
    }
}
