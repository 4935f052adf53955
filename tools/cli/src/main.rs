//! StashPoint CLI - Command line interface for shared file vaults.
//!
//! This tool provides the interactive surface for creating vaults, logging
//! in with a passkey, and working with a vault's file catalog.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use stashpoint_common::{Passkey, SessionToken, VaultName};
use stashpoint_storage::{create_default_registry, ObjectStore};
use stashpoint_store::Database;
use stashpoint_vault::{ActionKind, Config, SessionClaims, VaultManager};

#[derive(Parser)]
#[command(name = "stashpoint")]
#[command(about = "StashPoint - Shared file vaults")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Path to the table store database.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Root directory for the local storage backend.
    #[arg(long)]
    storage_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault.
    Create {
        /// Vault name.
        #[arg(short, long)]
        name: String,
    },

    /// Log into a vault and print a session token.
    Login {
        /// Vault name.
        #[arg(short, long)]
        name: String,
    },

    /// End a session.
    Logout {
        /// Session token.
        #[arg(short, long)]
        token: String,
    },

    /// List files in the vault.
    List {
        /// Session token.
        #[arg(short, long)]
        token: String,
    },

    /// Search files by name.
    Search {
        /// Session token.
        #[arg(short, long)]
        token: String,

        /// Search query, matched against filename stems.
        query: String,
    },

    /// Upload a file into the vault.
    Upload {
        /// Session token.
        #[arg(short, long)]
        token: String,

        /// Source file to upload.
        #[arg(short, long)]
        source: PathBuf,

        /// Name to store the file under (defaults to the source filename).
        #[arg(short = 'f', long)]
        file: Option<String>,
    },

    /// Download a file from the vault.
    Download {
        /// Session token.
        #[arg(short, long)]
        token: String,

        /// File to download.
        #[arg(short = 'f', long)]
        file: String,

        /// Destination path.
        #[arg(short, long)]
        dest: PathBuf,
    },

    /// Rename a file.
    Rename {
        /// Session token.
        #[arg(short, long)]
        token: String,

        /// Current filename.
        #[arg(long)]
        from: String,

        /// New filename. The original extension is kept when omitted here.
        #[arg(long)]
        to: String,
    },

    /// Delete a file.
    Delete {
        /// Session token.
        #[arg(short, long)]
        token: String,

        /// File to delete.
        #[arg(short = 'f', long)]
        file: String,
    },

    /// Print an access URL for a file.
    Url {
        /// Session token.
        #[arg(short, long)]
        token: String,

        /// File to resolve.
        #[arg(short = 'f', long)]
        file: String,
    },

    /// Show the vault's activity log.
    Activity {
        /// Session token.
        #[arg(short, long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manager = open_manager(&cli)?;

    match cli.command {
        Commands::Create { name } => cmd_create(&manager, &name).await,

        Commands::Login { name } => cmd_login(&manager, &name),

        Commands::Logout { token } => {
            manager.logout(&SessionToken::parse(token)?)?;
            println!("Session ended.");
            Ok(())
        }

        Commands::List { token } => {
            let claims = open_session(&manager, &token)?;
            cmd_list(&manager, &claims).await
        }

        Commands::Search { token, query } => {
            let claims = open_session(&manager, &token)?;
            cmd_search(&manager, &claims, &query).await
        }

        Commands::Upload {
            token,
            source,
            file,
        } => {
            let claims = open_session(&manager, &token)?;
            cmd_upload(&manager, &claims, &source, file.as_deref()).await
        }

        Commands::Download { token, file, dest } => {
            let claims = open_session(&manager, &token)?;
            cmd_download(&manager, &claims, &file, &dest).await
        }

        Commands::Rename { token, from, to } => {
            let claims = open_session(&manager, &token)?;
            cmd_rename(&manager, &claims, &from, &to).await
        }

        Commands::Delete { token, file } => {
            let claims = open_session(&manager, &token)?;
            cmd_delete(&manager, &claims, &file).await
        }

        Commands::Url { token, file } => {
            let claims = open_session(&manager, &token)?;
            let url = manager.catalog().resolve_url(&claims, &file).await?;
            println!("{}", url);
            Ok(())
        }

        Commands::Activity { token } => {
            let claims = open_session(&manager, &token)?;
            cmd_activity(&manager, &claims)
        }
    }
}

/// Build the manager from environment configuration and CLI overrides.
fn open_manager(cli: &Cli) -> Result<VaultManager> {
    let config = Config::from_env();

    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stashpoint");
    std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    let db_path = cli.db.clone().unwrap_or_else(|| data_dir.join("stashpoint.db"));
    let db = Database::open(&db_path).context("Failed to open table store")?;

    let store = resolve_store(cli, &config, &data_dir)?;
    Ok(VaultManager::new(db, store, config))
}

/// Pick the storage backend: the remote endpoint when configured,
/// otherwise a local directory.
fn resolve_store(cli: &Cli, config: &Config, data_dir: &std::path::Path) -> Result<Arc<dyn ObjectStore>> {
    let registry = create_default_registry();

    if let Some(remote_config) = config.remote_backend_config() {
        return registry
            .resolve("remote", remote_config)
            .context("Failed to configure remote storage backend");
    }

    let root = cli
        .storage_root
        .clone()
        .unwrap_or_else(|| data_dir.join("objects"));
    registry
        .resolve(
            "local",
            serde_json::json!({ "root": root.to_string_lossy() }),
        )
        .context("Failed to configure local storage backend")
}

/// Restore claims from a token string.
fn open_session(manager: &VaultManager, token: &str) -> Result<SessionClaims> {
    let token = SessionToken::parse(token)?;
    manager
        .open(&token)?
        .context("Session is invalid or expired; log in again")
}

/// Prompt for a passkey without echoing.
fn prompt_passkey(prompt: &str) -> Result<Passkey> {
    let passkey = rpassword::prompt_password(prompt).context("Failed to read passkey")?;
    Ok(Passkey::new(passkey))
}

/// Identity recorded as vault creator and session owner.
fn host_identity() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

/// Create a new vault.
async fn cmd_create(manager: &VaultManager, name: &str) -> Result<()> {
    let vault = VaultName::new(name).context("Invalid vault name")?;

    let member = prompt_passkey("Member passkey: ")?;
    let admin = prompt_passkey("Admin passkey: ")?;

    manager
        .create_vault(&vault, &member, &admin, &host_identity())
        .await
        .context("Failed to create vault")?;

    println!("Vault created: {}", vault);
    Ok(())
}

/// Log into a vault.
fn cmd_login(manager: &VaultManager, name: &str) -> Result<()> {
    let vault = VaultName::new(name).context("Invalid vault name")?;
    let passkey = prompt_passkey("Passkey: ")?;

    let login = manager
        .login(&vault, &passkey, &host_identity())
        .context("Login failed")?;

    println!("Logged into {} as {}", login.vault, login.tier);
    println!("Session token: {}", login.token);
    Ok(())
}

/// List vault contents.
async fn cmd_list(manager: &VaultManager, claims: &SessionClaims) -> Result<()> {
    let files = manager.catalog().list(claims).await?;

    if files.is_empty() {
        println!("Vault is empty.");
    } else {
        println!("Files in {}:", claims.vault);
        for name in files {
            println!("  {}", name);
        }
    }
    Ok(())
}

/// Search vault contents.
async fn cmd_search(manager: &VaultManager, claims: &SessionClaims, query: &str) -> Result<()> {
    let hits = manager.catalog().search(claims, query).await?;

    if hits.is_empty() {
        println!("No matching files.");
    } else {
        for name in hits {
            println!("  {}", name);
        }
    }
    Ok(())
}

/// Upload a file.
async fn cmd_upload(
    manager: &VaultManager,
    claims: &SessionClaims,
    source: &PathBuf,
    file: Option<&str>,
) -> Result<()> {
    let filename = match file {
        Some(name) => name.to_string(),
        None => source
            .file_name()
            .context("Source path has no filename")?
            .to_string_lossy()
            .to_string(),
    };

    let data = tokio::fs::read(source)
        .await
        .context("Failed to read source file")?;
    let size = data.len();

    manager
        .catalog()
        .upload(claims, &filename, data)
        .await
        .context("Upload failed")?;
    manager
        .activity()
        .record_best_effort(claims, ActionKind::Upload, &filename, None);

    println!("Uploaded {} ({} bytes)", filename, size);
    Ok(())
}

/// Download a file.
async fn cmd_download(
    manager: &VaultManager,
    claims: &SessionClaims,
    file: &str,
    dest: &PathBuf,
) -> Result<()> {
    let data = manager
        .catalog()
        .download(claims, file)
        .await
        .context("Download failed")?;

    tokio::fs::write(dest, &data)
        .await
        .context("Failed to write output file")?;

    println!("Downloaded {} ({} bytes)", dest.display(), data.len());
    Ok(())
}

/// Rename a file, keeping the original extension when the new name
/// doesn't carry one.
async fn cmd_rename(
    manager: &VaultManager,
    claims: &SessionClaims,
    from: &str,
    to: &str,
) -> Result<()> {
    let to = if to.contains('.') {
        to.to_string()
    } else {
        match from.rsplit_once('.') {
            Some((_, ext)) => format!("{}.{}", to, ext),
            None => to.to_string(),
        }
    };

    manager
        .catalog()
        .rename(claims, from, &to)
        .await
        .context("Rename failed")?;
    manager.activity().record_best_effort(
        claims,
        ActionKind::Rename,
        from,
        Some(&format!("-> {}", to)),
    );

    println!("Renamed {} -> {}", from, to);
    Ok(())
}

/// Delete a file.
async fn cmd_delete(manager: &VaultManager, claims: &SessionClaims, file: &str) -> Result<()> {
    manager
        .catalog()
        .delete(claims, file)
        .await
        .context("Delete failed")?;
    manager
        .activity()
        .record_best_effort(claims, ActionKind::Delete, file, None);

    println!("Deleted {}", file);
    Ok(())
}

/// Show the activity log.
fn cmd_activity(manager: &VaultManager, claims: &SessionClaims) -> Result<()> {
    let entries = manager.activity().read(claims)?;

    if entries.is_empty() {
        println!("No activity recorded.");
        return Ok(());
    }

    println!("Activity for {}:", claims.vault);
    for entry in entries {
        let details = entry.details.as_deref().unwrap_or("");
        println!(
            "  {}  {:<11}  {:<7}  {} {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.actor,
            entry.action,
            entry.filename,
            details
        );
    }
    Ok(())
}
