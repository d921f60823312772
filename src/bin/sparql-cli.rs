//! Small client for exercising the proxy from a shell.

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

#[derive(Parser)]
#[command(name = "sparql-cli")]
#[command(about = "Send queries through the SPARQL proxy", long_about = None)]
struct Cli {
    /// Proxy base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer credential forwarded to the authorization service.
    #[arg(short, long)]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a SPARQL query as a raw query document.
    Query { query: String },
    /// Submit a SPARQL query as a form-encoded `query=` field.
    Form { query: String },
    /// Fetch a path through the raw passthrough strategy.
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&cli.token)?);

    let response = match cli.command {
        Commands::Query { query } => {
            client
                .post(&cli.url)
                .headers(headers)
                .header(CONTENT_TYPE, "application/sparql-query")
                .body(query)
                .send()
                .await?
        }
        Commands::Form { query } => {
            client
                .post(&cli.url)
                .headers(headers)
                .form(&[("query", query)])
                .send()
                .await?
        }
        Commands::Get { path } => {
            let path = path.trim_start_matches('/');
            client
                .get(format!("{}/{}", cli.url.trim_end_matches('/'), path))
                .headers(headers)
                .send()
                .await?
        }
    };

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        eprintln!("Error: proxy returned status {status}");
        eprintln!("{body}");
        return Ok(());
    }
    println!("{body}");
    Ok(())
}
