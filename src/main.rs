//! # docchat CLI
//!
//! Terminal front end for a document question-answering backend.
//!
//! ## Usage
//!
//! ```bash
//! docchat --config ./config/docchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat files [--group G]` | List uploaded documents |
//! | `docchat groups` | List document groups |
//! | `docchat upload <path>` | Upload a document and print its extracted text |
//! | `docchat show <filename>` | Print a document's extracted text |
//! | `docchat rename <old> <new>` | Rename a document |
//! | `docchat delete <filename>` | Delete a document (asks for confirmation) |
//! | `docchat group <filename> <group>` | Move a document into a group |
//! | `docchat ask "<question>"` | Ask one question |
//! | `docchat chat` | Interactive question/answer session |
//! | `docchat history` | Print the saved transcript |
//! | `docchat clear` | Clear the saved transcript |
//! | `docchat key test <key>` | Check an LLM API key with the backend |
//! | `docchat key save <key>` | Store an LLM API key on the backend |

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docchat::app::App;
use docchat::backend::FileUpload;
use docchat::config::{self, Config};
use docchat::registry::Confirmation;
use docchat::view;

/// docchat: upload documents, group them, and ask questions about them.
///
/// All commands talk to the backend configured in `[backend].base_url`
/// (default `http://localhost:8004`). The chat transcript is kept under
/// `[storage].dir` and survives restarts.
#[derive(Parser)]
#[command(name = "docchat", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults are used when missing.
    #[arg(long, global = true, default_value = "./config/docchat.toml")]
    config: PathBuf,

    /// Override `[backend].base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List uploaded documents.
    Files {
        /// Only show documents in this group.
        #[arg(long)]
        group: Option<String>,
    },

    /// List document groups. The first entry means "all groups".
    Groups,

    /// Upload a document (.docx, .xlsx, .pdf) and print its extracted text.
    Upload {
        path: PathBuf,
    },

    /// Print the extracted text of an uploaded document.
    Show {
        filename: String,
    },

    /// Rename an uploaded document.
    Rename {
        old_name: String,
        new_name: String,
    },

    /// Delete an uploaded document.
    ///
    /// Prompts for confirmation unless `--yes` is given.
    Delete {
        filename: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Move a document into a group.
    Group {
        filename: String,
        group: String,
    },

    /// Ask a single question about the uploaded documents.
    Ask {
        question: String,
        /// Only search documents in this group.
        #[arg(long)]
        group: Option<String>,
    },

    /// Interactive chat. `/clear` empties the transcript, `/group <name>`
    /// changes the search group, `/quit` exits.
    Chat {
        /// Only search documents in this group.
        #[arg(long)]
        group: Option<String>,
    },

    /// Print the saved chat transcript.
    History,

    /// Clear the saved chat transcript.
    Clear,

    /// Test or save the backend's LLM API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Check whether a key is accepted by the LLM provider.
    Test { key: String },
    /// Store a key on the backend.
    Save { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docchat=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load_or_default(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        cfg.backend.base_url = base_url;
        config::validate(&cfg)?;
    }

    match cli.command {
        Commands::Files { group } => {
            let mut app = App::start(&cfg).await?;
            if let Some(group) = group {
                app.registry.set_group_filter(group);
            }
            print!("{}", view::render_documents(&app.registry));
            exit_on_error(app.registry.error());
        }
        Commands::Groups => {
            let mut app = App::connect(&cfg)?;
            app.registry.list_groups().await;
            print!("{}", view::render_groups(&app.registry));
        }
        Commands::Upload { path } => {
            let file = FileUpload::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut app = App::connect(&cfg)?;
            match app.registry.upload(Some(file)).await {
                Ok(outcome) => {
                    println!("Uploaded as {}", outcome.filename);
                    println!();
                    println!("{}", outcome.text);
                }
                Err(_) => exit_on_error(app.registry.upload_error()),
            }
        }
        Commands::Show { filename } => {
            let mut app = App::connect(&cfg)?;
            if app.registry.select(&filename).await.is_err() {
                exit_on_error(app.registry.error());
            }
            println!("{}", app.registry.content().unwrap_or_default());
        }
        Commands::Rename { old_name, new_name } => {
            let mut app = App::start(&cfg).await?;
            match app.registry.rename(&old_name, &new_name).await {
                Ok(true) => println!("Renamed {} -> {}", old_name, new_name),
                Ok(false) => println!("Nothing to rename."),
                Err(_) => exit_on_error(app.registry.error()),
            }
        }
        Commands::Delete { filename, yes } => {
            let mut app = App::start(&cfg).await?;
            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                confirm(&format!("Delete file {}?", filename))?
            };
            match app.registry.remove(&filename, confirmation).await {
                Ok(true) => println!("Deleted {}", filename),
                Ok(false) => println!("Cancelled."),
                Err(_) => exit_on_error(app.registry.error()),
            }
        }
        Commands::Group { filename, group } => {
            let mut app = App::start(&cfg).await?;
            match app.registry.set_group(&filename, &group).await {
                Ok(true) => println!("{} -> {}", filename, group),
                Ok(false) => println!("Group name is empty; nothing changed."),
                Err(_) => exit_on_error(app.registry.error()),
            }
        }
        Commands::Ask { question, group } => {
            let mut app = App::connect(&cfg)?;
            select_qa_group(&mut app, &cfg, group);
            app.conversation.set_question(question);
            if ask_and_print(&mut app).await.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Chat { group } => {
            let mut app = App::start(&cfg).await?;
            select_qa_group(&mut app, &cfg, group);
            run_chat(&mut app, &cfg).await;
        }
        Commands::History => {
            let app = App::connect(&cfg)?;
            print!("{}", view::render_transcript(app.session.messages()));
        }
        Commands::Clear => {
            let mut app = App::connect(&cfg)?;
            app.clear_chat();
            println!("Transcript cleared.");
        }
        Commands::Key { action } => {
            let mut app = App::connect(&cfg)?;
            match action {
                KeyAction::Test { key } => {
                    app.credentials.set_key(key);
                    app.credentials.validate().await;
                }
                KeyAction::Save { key } => {
                    app.credentials.set_key(key);
                    app.credentials.persist().await;
                }
            }
            print!("{}", view::render_key_panel(&app.credentials));
            if app.credentials.passed() == Some(false) {
                let _ = io::stdout().flush();
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn select_qa_group(app: &mut App, cfg: &Config, group: Option<String>) {
    let group = group.unwrap_or_else(|| cfg.labels.all_groups.clone());
    app.conversation.set_qa_group(group);
}

/// Ask the buffered question and print the answer or the chat error.
async fn ask_and_print(app: &mut App) -> Result<(), ()> {
    let before = app.session.len();
    let result = app.ask().await;
    if app.session.take_scroll_signal() {
        for msg in &app.session.messages()[before..] {
            if msg.role() == docchat::models::Role::Assistant {
                print!("{}", view::render_message(msg));
            }
        }
    }
    match result {
        Ok(_) => Ok(()),
        Err(_) => {
            if let Some(status) = view::render_chat_status(&app.conversation) {
                eprintln!("{}", status);
            }
            Err(())
        }
    }
}

async fn run_chat(app: &mut App, cfg: &Config) {
    if !app.session.is_empty() {
        print!("{}", view::render_transcript(app.session.messages()));
        println!();
    }
    println!(
        "Asking in group '{}'. /group <name>, /clear, /quit",
        app.conversation.qa_group()
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();

        match line {
            "/quit" | "/exit" => break,
            "/clear" => {
                app.clear_chat();
                println!("Transcript cleared.");
            }
            _ if line.starts_with("/group") => {
                let name = line.trim_start_matches("/group").trim();
                let name = if name.is_empty() {
                    cfg.labels.all_groups.as_str()
                } else {
                    name
                };
                app.conversation.set_qa_group(name);
                println!("Asking in group '{}'.", app.conversation.qa_group());
            }
            _ => {
                app.conversation.set_question(line);
                let _ = ask_and_print(app).await;
            }
        }
    }
}

/// Destructive-action gate: anything but `y`/`yes` declines.
fn confirm(prompt: &str) -> anyhow::Result<Confirmation> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(Confirmation::from(answer == "y" || answer == "yes"))
}

fn exit_on_error(error: Option<&str>) {
    if let Some(message) = error {
        eprintln!("{}", view::render_error(message));
        std::process::exit(1);
    }
}
