use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::path::PathBuf;

use portfolio_api::store::gallery::validate_gallery;

#[derive(Parser)]
#[command(name = "portfolio-cli")]
#[command(about = "Operator CLI for the portfolio content API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3080")]
    url: String,

    /// Bearer key for ROM management endpoints
    #[arg(short, long, env = "PORTFOLIO_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,
    /// List consoles with available games
    Consoles,
    /// Rescan the ROM directory
    Scan,
    /// Fetch ScreenScraper metadata for a game
    Scrape { id: i32 },
    /// Fetch IGDB metadata for a game
    Igdb { id: i32 },
    /// Check a gallery JSON file offline
    ValidateGallery {
        path: PathBuf,
        /// Directory holding the gallery's image files
        #[arg(long)]
        photos_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))?,
        );
    }

    let request = match cli.command {
        Commands::Health => client.get(format!("{}/api/health", cli.url)),
        Commands::Consoles => client.get(format!("{}/api/roms/consoles", cli.url)),
        Commands::Scan => client.post(format!("{}/api/roms/scan", cli.url)),
        Commands::Scrape { id } => client.post(format!("{}/api/roms/{id}/scrape", cli.url)),
        Commands::Igdb { id } => client.post(format!("{}/api/roms/{id}/igdb", cli.url)),
        Commands::ValidateGallery { path, photos_dir } => {
            return validate(&path, photos_dir.as_deref());
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

fn validate(
    path: &std::path::Path,
    photos_dir: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)?;
    let report = validate_gallery(&document, photos_dir);

    println!("{}", path.display());
    println!("{report}");

    if report.is_valid() {
        Ok(())
    } else {
        Err(format!("{} error(s) found", report.errors.len()).into())
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Err(format!("request failed with status {status}").into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
