use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde_json::json;

use link_proxy::config::loader::load_config;
use link_proxy::config::DeliveryMode;
use link_proxy::resolver::{ResolveRequest, ResolverClient};
use link_proxy::ProxyConfig;

#[derive(Parser)]
#[command(name = "link-cli")]
#[command(about = "Command line client for the link proxy", long_about = None)]
struct Cli {
    /// Proxy configuration used for resolver settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a share link through the resolver API and print the result
    Resolve {
        url: String,
    },
    /// Ask a running proxy for the redirect target of a share link
    Fetch {
        url: String,

        #[arg(short, long, default_value = "http://localhost:8080")]
        proxy: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    match cli.command {
        Commands::Resolve { url } => {
            let client = ResolverClient::new(&config.resolver, &config.file_host)?;
            match client.resolve(&ResolveRequest::new(url, DeliveryMode::Redirect)).await {
                Ok(link) => println!("{}", serde_json::to_string_pretty(&link)?),
                Err(e) => {
                    let body = json!({ "error": e.reason().code(), "message": e.to_string() });
                    eprintln!("{}", serde_json::to_string_pretty(&body)?);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fetch { url, proxy } => {
            let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
            let res = client
                .get(&proxy)
                .query(&[("url", url.as_str()), ("proxy", "false")])
                .send()
                .await?;

            let location = res
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            match location {
                Some(location) => println!("{}", location),
                None => {
                    eprintln!("Error: proxy returned status {}", res.status());
                    if let Ok(text) = res.text().await {
                        eprintln!("Response: {}", text);
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
