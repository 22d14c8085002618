use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use nginx_manager::generate::SaveDestination;

#[derive(Parser)]
#[command(name = "nginx-cli")]
#[command(about = "Management CLI for the nginx manager", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check manager status
    Status,
    /// Show the identity of the managed host
    Host,
    /// List registered machines
    Machines,
    /// Register a machine
    RegisterMachine {
        name: String,
        #[arg(long)]
        address: Option<Ipv4Addr>,
    },
    /// List registered sites
    Sites,
    /// Reconcile a site directory against the registry
    Scan {
        /// Directory to scan (defaults to the configured scan directory)
        #[arg(long)]
        directory: Option<PathBuf>,
    },
    /// Generate a site file from a template
    Create {
        #[arg(long)]
        template: String,
        /// Server names, primary first
        #[arg(long = "server-name", required = true)]
        server_names: Vec<String>,
        #[arg(long)]
        app_host: String,
        #[arg(long)]
        port: u16,
        #[arg(long, default_value = "sites-available")]
        destination: SaveDestination,
    },
    /// Delete every site record
    Clear,
    /// Parse a local site file without contacting the manager
    Parse { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/status", cli.url)),
        Commands::Host => client.get(format!("{}/machines/name", cli.url)),
        Commands::Machines => client.get(format!("{}/machines", cli.url)),
        Commands::RegisterMachine { name, address } => client
            .post(format!("{}/machines", cli.url))
            .json(&json!({ "machineName": name, "localIpAddress": address })),
        Commands::Sites => client.get(format!("{}/nginx", cli.url)),
        Commands::Scan { directory } => client
            .post(format!("{}/nginx/scan", cli.url))
            .json(&json!({ "directory": directory })),
        Commands::Create {
            template,
            server_names,
            app_host,
            port,
            destination,
        } => client
            .post(format!("{}/nginx/create-config-file", cli.url))
            .json(&json!({
                "templateFileName": template,
                "serverNames": server_names,
                "appHostServerMachineId": app_host,
                "portNumber": port,
                "saveDestination": destination.as_str(),
            })),
        Commands::Clear => client.delete(format!("{}/nginx/clear", cli.url)),
        Commands::Parse { file } => {
            let content = std::fs::read_to_string(file)?;
            let facts = nginx_manager::nginx::parse(&content);
            println!("{}", serde_json::to_string_pretty(&facts)?);
            return Ok(());
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: manager returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
