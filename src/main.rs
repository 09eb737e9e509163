//! # asKNOU CLI (`asknou`)
//!
//! Terminal front end for the asKNOU chatbot backend: ask questions, chat
//! interactively, and manage the document store as an administrator.
//!
//! ## Usage
//!
//! ```bash
//! asknou --config ./config/asknou.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `asknou ask "<question>"` | Ask one question and print the answer with sources |
//! | `asknou chat` | Interactive chat (`/faq N` for suggested questions, `/quit` to leave) |
//! | `asknou search "<query>"` | Similarity search without answer generation |
//! | `asknou status <doc_id>` | Processing status of an uploaded document |
//! | `asknou health` / `info` / `qa-test` | Backend diagnostics |
//! | `asknou admin login` | Open an admin session |
//! | `asknou admin documents` | List stored documents |
//! | `asknou admin upload <file.pdf>` | Upload a PDF |
//! | `asknou admin delete <doc_id>` | Delete one document |
//! | `asknou admin delete-selected <ids..>` | Delete several documents |
//! | `asknou admin rename <doc_id> <name>` | Rename a document |
//! | `asknou admin cleanup` | Remove incompletely processed documents |
//! | `asknou admin stats` | Document and system statistics |
//!
//! Every admin command except `login` requires a live session.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use asknou::admin::{AdminConsole, Modal, NotificationKind};
use asknou::chat::{ChatPanel, MessageBody, SUGGESTED_QUESTIONS};
use asknou::client::ApiClient;
use asknou::config::{self, Config};
use asknou::error::ApiError;
use asknou::models::QuestionRequest;
use asknou::progress::ProgressMode;
use asknou::render;
use asknou::session::{hash_password, AuthContext, SessionState};
use asknou::traits::RagApi;
use asknou::upload::{FileCandidate, UploadForm, UploadSettings};

/// asKNOU CLI: a terminal client for the asKNOU academic information chatbot.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults plus environment overrides.
#[derive(Parser)]
#[command(
    name = "asknou",
    about = "Terminal client for the asKNOU academic information chatbot",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/asknou.toml")]
    config: PathBuf,

    /// Upload progress output: auto, human, json, or off.
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    /// Log requests and responses to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question.
    Ask {
        question: String,
        /// Number of chunks to retrieve (server default when omitted).
        #[arg(long)]
        top_k: Option<u32>,
    },

    /// Interactive chat session.
    Chat,

    /// Similarity search over the stored documents.
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<u32>,
    },

    /// Processing status of an uploaded document.
    Status { doc_id: String },

    /// Backend health check.
    Health,

    /// Backend name, version and endpoints.
    Info,

    /// Backend self-test of the LLM, embedding model and document store.
    QaTest,

    /// Print the SHA-256 digest of a password read from stdin, for
    /// `[admin].password_sha256`.
    HashPassword,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Administrator commands.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Open an admin session. The password is read from stdin.
    Login {
        #[arg(long)]
        id: Option<String>,
    },

    /// Close the admin session.
    Logout,

    /// Show whether a session is open and until when.
    Session,

    /// List stored documents.
    Documents,

    /// Details of one document.
    Show { doc_id: String },

    /// Document and system statistics.
    Stats,

    /// Upload a PDF document.
    Upload {
        path: PathBuf,
        /// Content type to declare instead of the one inferred from the extension.
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Delete one document.
    Delete {
        doc_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Delete several documents at once.
    DeleteSelected {
        doc_ids: Vec<String>,
        /// Select every stored document.
        #[arg(long, conflicts_with = "doc_ids")]
        all: bool,
        #[arg(long)]
        yes: bool,
    },

    /// Rename a document. `.pdf` is appended by the server when missing.
    Rename { doc_id: String, new_name: String },

    /// Remove documents whose processing never completed.
    Cleanup {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "asknou", &mut std::io::stdout());
            return Ok(());
        }
        Commands::HashPassword => {
            let password = read_secret("Password: ")?;
            if password.is_empty() {
                bail!("Please enter your password.");
            }
            println!("{}", hash_password(&password));
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;
    asknou::logging::init(&cfg.logging, cli.verbose);
    let progress = ProgressMode::from_flag(&cli.progress)?;
    let api: Arc<dyn RagApi> = Arc::new(ApiClient::new(&cfg.api)?);

    match cli.command {
        Commands::Ask { question, top_k } => {
            run_ask(api.as_ref(), &cfg, &question, top_k).await?;
        }
        Commands::Chat => {
            run_chat(api.as_ref(), &cfg).await?;
        }
        Commands::Search { query, top_k } => {
            let request = QuestionRequest::new(query, top_k.or(cfg.chat.top_k));
            let response = api.search(&request).await.map_err(api_error)?;
            print!("{}", render::render_search(&response));
        }
        Commands::Status { doc_id } => {
            let status = api.upload_status(&doc_id).await.map_err(api_error)?;
            print!("{}", render::render_upload_status(&status));
        }
        Commands::Health => {
            let report = api.health().await.map_err(api_error)?;
            println!("Status: {}", report.status);
            if let Some(ts) = &report.timestamp {
                println!("Time:   {}", ts);
            }
            if let Some(err) = &report.error {
                println!("Error:  {}", err);
            }
            if report.status != "healthy" {
                bail!("backend reports status '{}'", report.status);
            }
        }
        Commands::Info => {
            let info = api.server_info().await.map_err(api_error)?;
            println!("{} {}", info.message, info.version);
            if !info.description.is_empty() {
                println!("{}", info.description);
            }
            if !info.endpoints.is_empty() {
                println!();
                for (name, path) in &info.endpoints {
                    println!("  {:<20} {}", name, path);
                }
            }
        }
        Commands::QaTest => {
            let report = api.test_qa().await.map_err(api_error)?;
            println!("Status: {}", report.status);
            if !report.message.is_empty() {
                println!("{}", report.message);
            }
            for (label, value) in [
                ("LLM", &report.gemini_api),
                ("Embedding", &report.embedding_model),
                ("Documents", &report.document_status),
            ] {
                if !value.is_null() {
                    println!("{:<10} {}", label, value);
                }
            }
        }
        Commands::Admin { action } => {
            run_admin(api, &cfg, progress, action).await?;
        }
        Commands::Completions { .. } | Commands::HashPassword => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

fn api_error(err: ApiError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

async fn run_ask(
    api: &dyn RagApi,
    cfg: &Config,
    question: &str,
    top_k: Option<u32>,
) -> Result<()> {
    let mut panel =
        ChatPanel::new().with_limits(top_k.or(cfg.chat.top_k), cfg.chat.max_question_chars);
    let reply = panel.ask(api, question).await?;
    if let MessageBody::Error(text) = &reply.body {
        bail!("{}", text);
    }
    println!("{}", reply.text());
    let sources = render::render_sources(reply.sources());
    if !sources.is_empty() {
        println!();
        print!("{}", sources);
    }
    Ok(())
}

async fn run_chat(api: &dyn RagApi, cfg: &Config) -> Result<()> {
    let mut panel =
        ChatPanel::new().with_limits(cfg.chat.top_k, cfg.chat.max_question_chars);
    if let Some(greeting) = panel.messages().first() {
        print!("{}", render::render_message(greeting));
    }
    println!();
    println!("Frequently asked questions:");
    for (i, q) in ChatPanel::suggested_questions().iter().enumerate() {
        println!("  /faq {}  {}", i + 1, q);
    }
    println!("Type /quit to leave.");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }

        let question = match input.strip_prefix("/faq") {
            Some(rest) => match faq_question(rest.trim()) {
                Some(q) => {
                    println!("{}", q);
                    q.to_string()
                }
                None => {
                    eprintln!("Choose a question between 1 and {}.", SUGGESTED_QUESTIONS.len());
                    continue;
                }
            },
            None => input.to_string(),
        };

        match panel.ask(api, &question).await {
            Ok(reply) => print!("{}", render::render_message(reply)),
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

fn faq_question(arg: &str) -> Option<&'static str> {
    let n: usize = arg.parse().ok()?;
    SUGGESTED_QUESTIONS.get(n.checked_sub(1)?).copied()
}

// ============ Admin ============

async fn run_admin(
    api: Arc<dyn RagApi>,
    cfg: &Config,
    progress: ProgressMode,
    action: AdminAction,
) -> Result<()> {
    let auth = AuthContext::from_config(&cfg.session, &cfg.admin)?;

    if let AdminAction::Login { id } = &action {
        let id = match id {
            Some(id) => id.clone(),
            None => prompt_line("ID: ")?,
        };
        let password = read_secret("Password: ")?;
        let state = auth.login(&id, &password).await?;
        if let SessionState::LoggedIn { expires_at, .. } = state {
            println!(
                "Logged in. Session valid until {}.",
                expires_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            );
        }
        return Ok(());
    }

    if matches!(action, AdminAction::Logout) {
        auth.logout()?;
        println!("Logged out.");
        return Ok(());
    }

    let state = auth.check()?;
    if !state.is_logged_in() {
        bail!("not logged in: run `asknou admin login` first");
    }

    let mut console = AdminConsole::new(Arc::clone(&api));
    match action {
        AdminAction::Login { .. } | AdminAction::Logout => unreachable!(),
        AdminAction::Session => {
            if let SessionState::LoggedIn { since, expires_at } = state {
                let fmt = "%Y-%m-%d %H:%M";
                println!(
                    "Logged in since {}, expires {}.",
                    since.with_timezone(&chrono::Local).format(fmt),
                    expires_at.with_timezone(&chrono::Local).format(fmt)
                );
            }
        }
        AdminAction::Documents => {
            console.load_data().await;
            finish(&mut console)?;
            print!(
                "{}",
                render::render_documents(console.documents(), console.selection())
            );
        }
        AdminAction::Show { doc_id } => {
            let details = api.document_details(&doc_id).await.map_err(api_error)?;
            print!("{}", render::render_document_details(&details));
        }
        AdminAction::Stats => {
            console.load_data().await;
            finish(&mut console)?;
            if let Some(stats) = console.statistics() {
                print!("{}", render::render_statistics(stats));
            }
        }
        AdminAction::Upload { path, content_type } => {
            let candidate = FileCandidate::from_path(&path, content_type.as_deref())?;
            let mut form = UploadForm::new(UploadSettings::from(&cfg.upload));
            match form.select(candidate) {
                Ok(()) => {
                    let reporter = progress.reporter();
                    match form.upload(api.as_ref(), reporter.as_ref()).await {
                        Ok(response) => console.on_upload_success(&response).await,
                        Err(e) => console.on_upload_error(&e.to_string()),
                    }
                }
                Err(rejection) => console.on_upload_error(&rejection.to_string()),
            }
            finish(&mut console)?;
        }
        AdminAction::Delete { doc_id, yes } => {
            console.load_data().await;
            finish(&mut console)?;
            let filename = console
                .documents()
                .iter()
                .find(|d| d.doc_id == doc_id)
                .map(|d| d.filename.clone())
                .unwrap_or_else(|| doc_id.clone());
            if !confirm(&format!("Delete {}?", filename), yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            console.delete_document(&doc_id, &filename).await;
            finish(&mut console)?;
        }
        AdminAction::DeleteSelected { doc_ids, all, yes } => {
            console.load_data().await;
            finish(&mut console)?;
            if all {
                console.select_all();
            } else {
                for id in &doc_ids {
                    if console.documents().iter().any(|d| &d.doc_id == id) {
                        console.select(id);
                    } else {
                        eprintln!("Skipping unknown document: {}", id);
                    }
                }
            }
            if !console.request_delete_selected() {
                return finish(&mut console);
            }
            let names: Vec<&str> = console
                .documents()
                .iter()
                .filter(|d| console.selection().contains(&d.doc_id))
                .map(|d| d.filename.as_str())
                .collect();
            let prompt = format!(
                "Delete {} document(s)?\n  {}\n",
                names.len(),
                names.join("\n  ")
            );
            if !confirm(&prompt, yes)? {
                console.dismiss_modal();
                println!("Cancelled.");
                return Ok(());
            }
            console.confirm_delete_selected().await;
            finish(&mut console)?;
        }
        AdminAction::Rename { doc_id, new_name } => {
            console.load_data().await;
            finish(&mut console)?;
            if console.begin_rename(&doc_id) {
                console.set_rename_draft(&new_name);
                console.confirm_rename().await;
            }
            finish(&mut console)?;
        }
        AdminAction::Cleanup { yes } => {
            if !console.open_cleanup().await {
                return finish(&mut console);
            }
            let preview = match console.modal() {
                Modal::Cleanup(preview) => preview.clone(),
                _ => return finish(&mut console),
            };
            print!("{}", render::render_cleanup_preview(&preview));
            if preview.cleanup_targets.is_empty() {
                console.dismiss_modal();
                return Ok(());
            }
            if !confirm("Clean up these files?", yes)? {
                console.dismiss_modal();
                println!("Cancelled.");
                return Ok(());
            }
            console.confirm_cleanup().await;
            finish(&mut console)?;
        }
    }
    Ok(())
}

/// Print queued notifications. Errors become the command's failure.
fn finish(console: &mut AdminConsole) -> Result<()> {
    let mut errors = Vec::new();
    for note in console.take_notifications() {
        match note.kind {
            NotificationKind::Error => errors.push(note.message),
            NotificationKind::Success | NotificationKind::Info => println!("{}", note.message),
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        bail!("{}", errors.join("\n"))
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a secret line from stdin. Only prompts when stdin is a terminal.
fn read_secret(prompt: &str) -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        prompt_line(prompt)
    } else {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Ask a yes/no question on stderr. `assume_yes` skips the prompt.
fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt_line(&format!("{} [y/N] ", prompt))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
