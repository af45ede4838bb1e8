//! Bug Studio CLI - Command-line interface for the bug tracker
//!
//! A terminal front end over the same library and session file the GUI
//! uses: log in once, then list and mutate bugs from scripts.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Emoji};
use std::str::FromStr;

use bug_studio::api::{BugApi, BugDraft, BugFilter, BugStatus, HttpBugApi, Priority};
use bug_studio::config::{self, AppConfig};
use bug_studio::session::Session;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "+ ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

#[derive(Parser)]
#[command(name = "bugs-cli")]
#[command(version)]
#[command(about = "Bug Studio CLI - manage bug reports from the terminal")]
#[command(long_about = r#"
Bug Studio CLI talks to the same bug tracker backend as the GUI and shares
its session file, so logging in with either is enough for both.

Examples:
  bugs-cli login alice secret       # Obtain and store a session token
  bugs-cli list --status open       # List open bugs
  bugs-cli add "Crash on save" --priority high
  bugs-cli update 3 "Crash on save" --status closed --priority high
  bugs-cli delete 3
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the configured server URL
    #[arg(long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login { username: String, password: String },

    /// Create a new account
    Register { username: String, password: String },

    /// Forget the stored session token
    Logout,

    /// List bugs
    List {
        /// Only bugs with this status (open, in-progress, closed)
        #[arg(long, value_parser = BugStatus::from_str)]
        status: Option<BugStatus>,

        /// Only bugs with this priority (low, medium, high)
        #[arg(long, value_parser = Priority::from_str)]
        priority: Option<Priority>,

        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create a bug
    Add {
        title: String,

        #[arg(long, default_value = "open", value_parser = BugStatus::from_str)]
        status: BugStatus,

        #[arg(long, default_value = "medium", value_parser = Priority::from_str)]
        priority: Priority,
    },

    /// Replace a bug's title, status and priority
    Update {
        id: String,
        title: String,

        #[arg(long, value_parser = BugStatus::from_str)]
        status: BugStatus,

        #[arg(long, value_parser = Priority::from_str)]
        priority: Priority,
    },

    /// Delete a bug
    Delete { id: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config_dir = config::config_dir();
    let app_config = AppConfig::load(&config_dir);
    let server_url = cli.server.unwrap_or(app_config.server_url);
    let api = HttpBugApi::new(server_url);
    let mut session = Session::load(&config_dir);

    match cli.command {
        Commands::Login { username, password } => {
            let token = api
                .login(&username, &password)
                .map_err(|e| anyhow!(e.user_message("Failed to login")))?;
            session.save(token);
            println!("{}Logged in as {}", CHECK, style(&username).bold());
        }

        Commands::Register { username, password } => {
            api.register(&username, &password)
                .map_err(|e| anyhow!(e.user_message("Failed to register")))?;
            println!(
                "{}Account {} created, you can log in now",
                CHECK,
                style(&username).bold()
            );
        }

        Commands::Logout => {
            session.clear();
            println!("{}Session cleared", CHECK);
        }

        Commands::List {
            status,
            priority,
            json,
        } => {
            let token = require_token(&session)?;
            let filter = BugFilter { status, priority };
            let bugs = api
                .list(&filter, token)
                .map_err(|e| anyhow!(e.user_message("Failed to fetch bugs. Please try again later.")))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&bugs)?);
            } else if bugs.is_empty() {
                println!("No bugs to show.");
            } else {
                for bug in &bugs {
                    println!(
                        "{:>6}  {:<12} {:<8} {}",
                        style(&bug.id).dim(),
                        colored_status(bug.status),
                        colored_priority(bug.priority),
                        bug.title
                    );
                }
            }
        }

        Commands::Add {
            title,
            status,
            priority,
        } => {
            let token = require_token(&session)?;
            let draft = BugDraft {
                title,
                status,
                priority,
            };
            let bug = api
                .create(&draft, token)
                .map_err(|e| anyhow!(e.user_message("Failed to add bug")))?;
            println!("{}Created bug {}", CHECK, style(&bug.id).bold());
        }

        Commands::Update {
            id,
            title,
            status,
            priority,
        } => {
            let token = require_token(&session)?;
            let draft = BugDraft {
                title,
                status,
                priority,
            };
            api.update(&id, &draft, token)
                .map_err(|e| anyhow!(e.user_message("Failed to update bug")))?;
            println!("{}Updated bug {}", CHECK, style(&id).bold());
        }

        Commands::Delete { id } => {
            let token = require_token(&session)?;
            api.delete(&id, token)
                .map_err(|e| anyhow!(e.user_message("Failed to delete bug")))?;
            println!("{}Deleted bug {}", CROSS, style(&id).bold());
        }
    }

    Ok(())
}

fn require_token(session: &Session) -> Result<&str> {
    session
        .token()
        .context("Not logged in - run `bugs-cli login <username> <password>` first")
}

fn colored_status(status: BugStatus) -> String {
    let text = status.as_str();
    match status {
        BugStatus::Open => style(text).blue().to_string(),
        BugStatus::InProgress => style(text).yellow().to_string(),
        BugStatus::Closed => style(text).green().to_string(),
    }
}

fn colored_priority(priority: Priority) -> String {
    let text = priority.as_str();
    match priority {
        Priority::Low => style(text).dim().to_string(),
        Priority::Medium => style(text).yellow().to_string(),
        Priority::High => style(text).red().to_string(),
    }
}
