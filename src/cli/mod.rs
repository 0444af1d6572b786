// src/cli/mod.rs
// Command line entry points: the HTTP server plus sheet diagnostics

pub mod inspect;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::settings::Settings;
use crate::sheets::ids::generate_id;
use crate::sheets::{GoogleSheetsClient, SheetResult};

#[derive(Parser)]
#[command(name = "dealsheet")]
#[command(about = "Dealsheet - partner deal registration backed by Google Sheets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default when no command is given)
    Serve {
        /// Port to listen on, overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Authenticate and print the spreadsheet title and tab names
    TestConnection,

    /// Print the rows of a tab as records
    Read {
        /// Tab name, e.g. Deals
        tab: String,
        /// A1 range within the tab, e.g. A1:D20
        #[arg(long)]
        range: Option<String>,
        /// Print the raw cell grid instead of header-keyed records
        #[arg(long)]
        raw: bool,
    },

    /// Find the first row whose column equals a value
    Find {
        tab: String,
        column: String,
        value: String,
    },

    /// Print a freshly generated record id
    GenerateId,
}

pub async fn run(cli: Cli) -> SheetResult<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve::run(port).await,
        Commands::TestConnection => inspect::test_connection(&client()?).await,
        Commands::Read { tab, range, raw } => inspect::read(&client()?, &tab, range.as_deref(), raw).await,
        Commands::Find { tab, column, value } => inspect::find(&client()?, &tab, &column, &value).await,
        Commands::GenerateId => {
            println!("{}", generate_id());
            Ok(())
        }
    }
}

fn client() -> SheetResult<GoogleSheetsClient> {
    GoogleSheetsClient::new(&Settings::from_env()?)
}
