use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use targetup::admin;
use targetup::app::{App, Controller};
use targetup::backend::{
    Backend, BackendError, KeyringVault, MemoryBackend, MemoryVault, RestClient, TokenVault,
};
use targetup::model::Role;
use targetup::sync::{GuestStore, ProgressSync};
use targetup::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Offline sample accounts; the password is the part before the @
const DEMO_STUDENT: &str = "student@targetup.in";
const DEMO_ADMIN: &str = "admin@targetup.in";

#[derive(Parser)]
#[command(name = "targetup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use the built-in sample data instead of the hosted backend
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the exams visible with the configured access code
    Exams,
    /// Bulk-import questions from a CSV file (admin only)
    Import {
        /// CSV with question_text, exam_id, option_a..option_d and correct_option columns
        path: PathBuf,
        /// Validate the file without uploading
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    // The terminal belongs to the UI, so logs go to a file
    let log_dir = Config::log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "targetup.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "targetup=info".into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(false))
        .init();

    let (backend, vault) = connect(&config, cli.offline)?;

    match cli.command {
        Some(Commands::Exams) => {
            let exams = backend.content.list_exams(config.access_code.as_deref()).await?;
            if exams.is_empty() {
                println!("No exams available.");
            }
            for exam in exams {
                println!("{:<8} {:<20} {}", exam.id, exam.name, exam.subjects.join(", "));
            }
        }
        Some(Commands::Import { path, dry_run }) => {
            let questions = admin::read_questions(&path)?;
            println!("{} valid rows in {}", questions.len(), path.display());
            if dry_run {
                return Ok(());
            }
            match backend.identity.current_session().await? {
                Some(identity) if identity.is_admin() => {}
                Some(identity) => bail!("{} is not an admin", identity.email),
                None => bail!(BackendError::NotSignedIn),
            }
            let inserted = admin::import_batch(backend.content.as_ref(), &questions).await?;
            println!("Imported {} questions.", inserted);
        }
        None => {
            // Launch TUI
            let progress = ProgressSync::guest(GuestStore::new(Config::guest_path()?))?;
            let controller = Controller::new(config, backend, vault, progress).persist_config();
            let mut app = App::new(controller)?;
            app.run().await?;
        }
    }

    Ok(())
}

/// The hosted backend, or sample data when offline or unconfigured
fn connect(config: &Config, offline: bool) -> Result<(Backend, Arc<dyn TokenVault>)> {
    if !offline {
        let vault: Arc<dyn TokenVault> = Arc::new(KeyringVault);
        match RestClient::new(&config.backend, vault.clone()) {
            Ok(client) => return Ok((Backend::from_shared(Arc::new(client)), vault)),
            Err(BackendError::NotConfigured) => {
                tracing::warn!("Backend not configured, using sample data");
            }
            Err(e) => return Err(e.into()),
        }
    }
    let sample = MemoryBackend::seeded()
        .with_account(DEMO_STUDENT, "student", Role::Student)
        .with_account(DEMO_ADMIN, "admin", Role::Admin);
    let vault: Arc<dyn TokenVault> = Arc::new(MemoryVault::default());
    Ok((Backend::from_shared(Arc::new(sample)), vault))
}
