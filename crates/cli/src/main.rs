//! Record store CLI - migrations, seeding and support tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! rs-cli migrate
//!
//! # Load the demo catalog, shipping/payment options and bank details
//! rs-cli seed
//!
//! # Create a local account
//! rs-cli account create -u kurt -e kurt@example.com --first-name Kurt
//!
//! # Mark an order as paid once the transfer arrived
//! rs-cli order set-state 42 paid
//!
//! # Mint a development bearer token
//! rs-cli token issue 1 --hours 24
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use record_store_core::{AccountId, OrderId, OrderState};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "Record store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the demo catalog (idempotent)
    Seed,
    /// Manage customer accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Development bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address, receives payment instructions
        #[arg(short, long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Change an order's state (`ordered`, `paid`, `shipped`)
    SetState { id: OrderId, state: OrderState },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for an account
    Issue {
        account: AccountId,

        /// Validity in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Create {
                username,
                email,
                first_name,
                last_name,
            } => {
                commands::account::create(&username, &email, &first_name, &last_name).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::SetState { id, state } => {
                commands::order::set_state(id, state).await?;
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Issue { account, hours } => {
                let token = commands::token::issue(account, hours)?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{token}");
                }
            }
        },
    }
    Ok(())
}
