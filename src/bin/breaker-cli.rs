use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Url};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "breaker-cli")]
#[command(about = "Management CLI for the breaker registry", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token, when the service has one configured.
    #[arg(short, long, env = "BREAKER_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Show every breaker and its state
    List,
    /// List registered keys
    Keys,
    /// Show statistics for one breaker
    Show { key: String },
    /// Show the state of one breaker
    State { key: String },
    /// Show the last recorded failure of one breaker
    Exception { key: String },
    /// Force a breaker open until reset
    Isolate { key: String },
    /// Close a breaker and clear its statistics
    Reset { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let (method, segments): (Method, Vec<&str>) = match &cli.command {
        Commands::Status => (Method::GET, vec!["status"]),
        Commands::List => (Method::GET, vec!["breakers"]),
        Commands::Keys => (Method::GET, vec!["keys"]),
        Commands::Show { key } => (Method::GET, vec!["breakers", key.as_str()]),
        Commands::State { key } => (Method::GET, vec!["breakers", key.as_str(), "state"]),
        Commands::Exception { key } => (Method::GET, vec!["breakers", key.as_str(), "exception"]),
        Commands::Isolate { key } => (Method::POST, vec!["breakers", key.as_str(), "isolate"]),
        Commands::Reset { key } => (Method::POST, vec!["breakers", key.as_str(), "reset"]),
    };

    let res = client
        .request(method, endpoint(&cli.url, &segments)?)
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

/// Append `segments` to `base`, percent-encoding each one.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("cannot append a path to {}", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: management API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
