use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use gmail_mailer::EmailApi;
use gmail_mailer::config::{default_config_path, load_config_from, write_template};
use gmail_mailer::domain::email::EmailRecord;

#[derive(Parser)]
#[command(name = "gmail_mailer")]
#[command(about = "Gmail inbox reader and sender with a local cache", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List recent inbox messages
    Inbox {
        /// Skip the cache and fetch from the server
        #[arg(long)]
        refresh: bool,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one message from the current list
    Show { id: String },

    /// Send a plain-text message (body read from stdin when --body is omitted)
    Send {
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        body: Option<String>,
    },

    /// Write a template config file to edit
    InitConfig,
}

fn print_summary(e: &EmailRecord) {
    println!("[{}] {}", e.id, e.subject);
    println!("    from: {}", e.sender);
    println!("    date: {}", e.date);
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(p) => p,
        None => default_config_path()?,
    };

    if let Command::InitConfig = cli.cmd {
        if write_template(&config_path)? {
            println!("Created template config at {}", config_path.display());
        } else {
            println!("Config already exists at {}", config_path.display());
        }
        return Ok(());
    }

    let cfg = load_config_from(&config_path).map_err(|e| anyhow!("Configuration error: {e}"))?;
    let mut api = EmailApi::from_config(&cfg)?;

    match cli.cmd {
        Command::Inbox { refresh, json } => {
            let emails = api.get_emails(!refresh);
            if json {
                println!("{}", serde_json::to_string_pretty(emails)?);
            } else if emails.is_empty() {
                println!("No emails.");
            } else {
                for e in emails {
                    print_summary(e);
                }
            }
            Ok(())
        }

        Command::Show { id } => {
            api.get_emails(true);
            let e = api
                .find(&id)
                .ok_or_else(|| anyhow!("no email with id {id} in the current list"))?;
            print_summary(e);
            println!();
            println!("{}", e.body);
            Ok(())
        }

        Command::Send { to, subject, body } => {
            let body = match body {
                Some(b) => b,
                None => {
                    eprintln!("Type the message body (end with Ctrl-D):");
                    let mut b = String::new();
                    std::io::stdin().read_to_string(&mut b)?;
                    b
                }
            };
            if api.send_email(&to, &subject, &body) {
                println!("Message sent to {to}!");
                Ok(())
            } else {
                Err(anyhow!("sending to {to} failed (run with RUST_LOG=warn for details)"))
            }
        }

        Command::InitConfig => Ok(()),
    }
}
