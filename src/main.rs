//! # DocChat CLI (`dc`)
//!
//! The `dc` binary is the terminal interface to a DocChat backend. It
//! covers account management, assistant creation from a PDF (with a live
//! progress feed), and chatting with an assistant.
//!
//! ## Usage
//!
//! ```bash
//! dc --config ./config/docchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dc signup <user>` | Create an account and sign in |
//! | `dc login <user>` | Sign in; persists the bearer token |
//! | `dc logout` | Drop the stored session |
//! | `dc whoami` | Show the signed-in username |
//! | `dc assistants list` | List your assistants |
//! | `dc assistants create <file.pdf> --name <n>` | Upload a PDF and build an assistant |
//! | `dc assistants delete <id>` | Delete an assistant |
//! | `dc ask <id> "<question>"` | One-shot question |
//! | `dc chat` | Interactive chat session |
//! | `dc admin …` | User/assistant management (admin role) |

use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use docchat::progress::ProgressMode;
use docchat::{admin, assistants_cmd, auth, chat_cmd, config};

/// DocChat CLI — chat with assistants built from your own documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; every setting has a default, so the flag is optional against a
/// local backend.
#[derive(Parser)]
#[command(
    name = "dc",
    about = "DocChat — chat with assistants built from your own documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in.
    Signup {
        username: String,
        /// Password; prompted on stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in and persist the session.
    ///
    /// The bearer token and username are written to the session file
    /// (`[session].path`) and attached to every later call.
    Login {
        username: String,
        /// Password; prompted on stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Drop the stored session.
    Logout,

    /// Show the signed-in username.
    Whoami,

    /// Manage assistants.
    Assistants {
        #[command(subcommand)]
        action: AssistantsAction,
    },

    /// Ask one assistant one question and print the answer.
    Ask {
        /// Assistant id (see `dc assistants list`).
        assistant_id: i64,
        /// The question.
        query: String,
    },

    /// Start an interactive chat session.
    ///
    /// Keeps the assistant list and per-assistant message logs in memory
    /// for the life of the session. `/help` lists the in-session commands.
    Chat {
        /// Assistant to start with; defaults to the only assistant when
        /// exactly one exists.
        #[arg(long)]
        assistant: Option<i64>,
    },

    /// User and assistant management (requires the admin role).
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

/// Assistant management subcommands.
#[derive(Subcommand)]
enum AssistantsAction {
    /// List your assistants.
    List,

    /// Upload a PDF and build an assistant from it.
    ///
    /// Streams the backend's ingestion progress to stderr while the
    /// document is chunked and indexed. Numeric parameters are clamped
    /// client-side (temperature 0–1, top-k 1–20, chunk size ≤ 1024,
    /// chunk overlap ≤ 150); the server has the final say.
    Create {
        /// Path to the PDF to upload.
        file: PathBuf,

        /// Display name for the assistant.
        #[arg(long)]
        name: String,

        /// Generation temperature in [0, 1]. Defaults from config.
        #[arg(long)]
        temperature: Option<f64>,

        /// Number of retrieved passages per answer. Defaults from config.
        #[arg(long)]
        top_k: Option<i64>,

        /// Document chunk size at ingestion time. Defaults from config.
        #[arg(long)]
        chunk_size: Option<i64>,

        /// Overlap between adjacent chunks. Defaults from config.
        #[arg(long)]
        chunk_overlap: Option<i64>,

        /// Progress output: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a TTY, otherwise `off`.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Delete one of your assistants. Its chat log dies with it.
    Delete {
        /// Assistant id.
        id: i64,
    },
}

/// Admin subcommands.
#[derive(Subcommand)]
enum AdminAction {
    /// List all users with their assistants.
    Users,
    /// Delete a user (and, server-side, everything they own).
    DeleteUser { id: i64 },
    /// Delete any user's assistant.
    DeleteAssistant { id: i64 },
    /// Grant the admin role to a user.
    GrantAdmin { id: i64 },
}

/// Resolve the password: flag value, or a stdin prompt.
fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Signup { username, password } => {
            let password = resolve_password(password)?;
            auth::run_signup(&cfg, &username, &password).await?;
        }
        Commands::Login { username, password } => {
            let password = resolve_password(password)?;
            auth::run_login(&cfg, &username, &password).await?;
        }
        Commands::Logout => {
            auth::run_logout(&cfg)?;
        }
        Commands::Whoami => {
            auth::run_whoami(&cfg)?;
        }
        Commands::Assistants { action } => match action {
            AssistantsAction::List => {
                assistants_cmd::run_list(&cfg).await?;
            }
            AssistantsAction::Create {
                file,
                name,
                temperature,
                top_k,
                chunk_size,
                chunk_overlap,
                progress,
            } => {
                let progress = match progress {
                    Some(mode) => mode.parse()?,
                    None => ProgressMode::default_for_tty(),
                };
                assistants_cmd::run_create(
                    &cfg,
                    &file,
                    &name,
                    temperature,
                    top_k,
                    chunk_size,
                    chunk_overlap,
                    progress,
                )
                .await?;
            }
            AssistantsAction::Delete { id } => {
                assistants_cmd::run_delete(&cfg, id).await?;
            }
        },
        Commands::Ask {
            assistant_id,
            query,
        } => {
            chat_cmd::run_ask(&cfg, assistant_id, &query).await?;
        }
        Commands::Chat { assistant } => {
            chat_cmd::run_chat(&cfg, assistant).await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Users => {
                admin::run_users(&cfg).await?;
            }
            AdminAction::DeleteUser { id } => {
                admin::run_delete_user(&cfg, id).await?;
            }
            AdminAction::DeleteAssistant { id } => {
                admin::run_delete_assistant(&cfg, id).await?;
            }
            AdminAction::GrantAdmin { id } => {
                admin::run_grant_admin(&cfg, id).await?;
            }
        },
    }

    Ok(())
}
