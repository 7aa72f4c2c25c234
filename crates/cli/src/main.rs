//! HONOR loyalty staff CLI.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from LOYALTY_PASSWORD or stdin)
//! loyalty login -u admin
//!
//! # Find a customer, award points, redeem a gift
//! loyalty customers list --search lim
//! loyalty points add <customer-id> 100 -d "Birthday bonus"
//! loyalty redeem <customer-id> <gift-id>
//!
//! # Search interactively, one query per line
//! loyalty customers search
//! ```
//!
//! # Environment Variables
//!
//! - `LOYALTY_API_URL` - backend base URL (required)
//! - `LOYALTY_SESSION_PATH` - where the session is kept
//! - `LOYALTY_PASSWORD` - password for `login`
//! - `RUST_LOG` - log filter (default `warn`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use honor_loyalty_core::{CustomerId, GiftId};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "loyalty")]
#[command(author, version, about = "HONOR loyalty staff tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as a staff member
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from stdin when not given
        #[arg(long, env = "LOYALTY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in staff member
    Whoami {
        /// Ask the backend instead of reading the stored token
        #[arg(long)]
        remote: bool,
    },
    /// Check that the backend is up
    Health,
    /// Manage customers
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Award or deduct points
    Points {
        #[command(subcommand)]
        action: PointsAction,
    },
    /// Manage the gift catalog
    Gifts {
        #[command(subcommand)]
        action: GiftAction,
    },
    /// Redeem a gift for a customer
    Redeem {
        customer: CustomerId,
        gift: GiftId,
    },
    /// List redemptions
    Redemptions,
    /// Dashboard totals
    Stats,
}

#[derive(Subcommand)]
enum CustomerAction {
    /// List customers, optionally filtered by name or phone
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one customer
    Show { id: CustomerId },
    /// Register a customer
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        phone: String,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Change a customer's details
    Update {
        id: CustomerId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Delete a customer
    Delete { id: CustomerId },
    /// Point history
    History { id: CustomerId },
    /// Interactive search: each stdin line replaces the query
    Search,
}

#[derive(Subcommand)]
enum PointsAction {
    /// Award points
    Add {
        id: CustomerId,
        amount: u32,

        /// Reason recorded in the point history
        #[arg(short, long)]
        description: String,
    },
    /// Deduct points
    Deduct {
        id: CustomerId,
        amount: u32,

        /// Reason recorded in the point history
        #[arg(short, long)]
        description: String,
    },
}

#[derive(Subcommand)]
enum GiftAction {
    /// List the catalog
    List,
    /// Add a gift
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        points: u32,

        #[arg(short, long)]
        stock: u32,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a gift
    Update {
        id: GiftId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        points: Option<u32>,

        #[arg(short, long)]
        stock: Option<u32>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove a gift
    Delete { id: GiftId },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&ctx, &username, password).await?;
        }
        Commands::Logout => commands::session::logout(&ctx).await?,
        Commands::Whoami { remote } => commands::session::whoami(&ctx, remote).await?,
        Commands::Health => commands::session::health(&ctx).await?,
        Commands::Customers { action } => {
            ctx.watch_session();
            match action {
                CustomerAction::List { search } => {
                    commands::customers::list(&ctx, search.as_deref()).await?;
                }
                CustomerAction::Show { id } => commands::customers::show(&ctx, id).await?,
                CustomerAction::Create { name, phone, email } => {
                    commands::customers::create(&ctx, &name, &phone, email.as_deref()).await?;
                }
                CustomerAction::Update {
                    id,
                    name,
                    phone,
                    email,
                } => commands::customers::update(&ctx, id, name, phone, email).await?,
                CustomerAction::Delete { id } => commands::customers::delete(&ctx, id).await?,
                CustomerAction::History { id } => commands::customers::history(&ctx, id).await?,
                CustomerAction::Search => commands::customers::search(&ctx).await?,
            }
        }
        Commands::Points { action } => {
            ctx.watch_session();
            match action {
                PointsAction::Add {
                    id,
                    amount,
                    description,
                } => commands::customers::add_points(&ctx, id, amount, &description).await?,
                PointsAction::Deduct {
                    id,
                    amount,
                    description,
                } => commands::customers::deduct_points(&ctx, id, amount, &description).await?,
            }
        }
        Commands::Gifts { action } => {
            ctx.watch_session();
            match action {
                GiftAction::List => commands::gifts::list(&ctx).await?,
                GiftAction::Create {
                    name,
                    points,
                    stock,
                    description,
                } => {
                    commands::gifts::create(&ctx, &name, description.as_deref(), points, stock)
                        .await?;
                }
                GiftAction::Update {
                    id,
                    name,
                    points,
                    stock,
                    description,
                } => commands::gifts::update(&ctx, id, name, description, points, stock).await?,
                GiftAction::Delete { id } => commands::gifts::delete(&ctx, id).await?,
            }
        }
        Commands::Redeem { customer, gift } => {
            ctx.watch_session();
            commands::redeem::redeem(&ctx, customer, gift).await?;
        }
        Commands::Redemptions => {
            ctx.watch_session();
            commands::redeem::list(&ctx).await?;
        }
        Commands::Stats => {
            ctx.watch_session();
            commands::redeem::stats(&ctx).await?;
        }
    }
    Ok(())
}
