//! Currency Converter CLI
//!
//! Command-line interface for the converter's IPC protocol.

use anyhow::Result;
use clap::{Parser, Subcommand};

use converter_client::{ClientError, ConverterClient};
use converter_types::{DEFAULT_ENDPOINT, IpcEndpoint};

#[derive(Parser)]
#[command(name = "currency")]
#[command(author, version, about = "Currency converter CLI client", long_about = None)]
struct Cli {
    /// Endpoint of the converter service (ipc://<socket path>)
    #[arg(long, env = "CURRENCY_CONVERTER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: IpcEndpoint,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount between two currencies
    Convert {
        /// Source currency code (e.g. USD)
        from: String,
        /// Target currency code (e.g. EUR)
        to: String,
        /// Amount in the source currency
        amount: f64,
    },
    /// Show every rate relative to one currency
    Rates {
        /// Currency code; defaults to the service's base currency
        code: Option<String>,
    },
    /// List supported currencies
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let client = ConverterClient::connect(&cli.endpoint)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot reach converter at {}: {}", cli.endpoint, e))?;

    let result = match cli.command {
        Commands::Convert { from, to, amount } => client
            .convert_currency(&from, &to, amount)
            .await
            .and_then(|reply| Ok(serde_json::to_string_pretty(&reply)?)),
        Commands::Rates { code } => client
            .get_exchange_rates(code.as_deref())
            .await
            .and_then(|rates| Ok(serde_json::to_string_pretty(&rates)?)),
        Commands::Currencies => client
            .get_supported_currencies()
            .await
            .and_then(|names| Ok(serde_json::to_string_pretty(&names)?)),
    };

    match result {
        Ok(out) => println!("{}", out),
        Err(ClientError::Service(message)) => {
            eprintln!("✗ {}", message);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
