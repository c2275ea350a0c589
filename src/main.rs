use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use dexterm::api::{CatalogClient, CatalogStore};
use dexterm::app::{App, AppEvent};
use dexterm::config::Config;
use dexterm::keybindings::KeybindingRegistry;
use dexterm::preferences::{self, PreferenceStore};
use dexterm::storage::{Database, DatabaseError};
use dexterm::util::{capitalize, format_id};
use dexterm::ui;

/// Get the config directory path (~/.config/dexterm/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("dexterm"))
}

#[derive(Parser, Debug)]
#[command(name = "dexterm", about = "Terminal browser for the PokeAPI species catalog")]
struct Args {
    /// Forget favorites, sound and theme settings before starting
    #[arg(long)]
    reset_prefs: bool,

    /// Override the catalog API base URL
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Print one page of the catalog listing and exit
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    print_page: Option<u32>,
}

/// Print page `page` (1-based) of the paged listing to stdout.
async fn print_page(store: &CatalogStore, page: u32, page_size: usize) -> Result<()> {
    let offset = (page as usize - 1) * page_size;
    let listing = store
        .listing_page(offset, page_size)
        .await
        .with_context(|| format!("Failed to fetch page {}", page))?;

    if listing.entries.is_empty() {
        println!("Page {} is empty", page);
        return Ok(());
    }
    for entry in &listing.entries {
        let id = entry.id().map(format_id).unwrap_or_default();
        println!("{:<6} {}", id, capitalize(&entry.name));
    }
    if listing.has_next {
        println!("-- more on page {} --", page + 1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never land in the alternate screen buffer.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml")).context("Failed to load config")?;

    let api_base = args.api_base.as_deref().unwrap_or(&config.api_base_url);
    let client = CatalogClient::with_options(api_base, config.client_options())
        .with_context(|| format!("Invalid API base URL '{}'", api_base))?;
    let store = CatalogStore::new(client);

    if let Some(page) = args.print_page {
        return print_page(&store, page, config.effective_page_size()).await;
    }

    let db_path = config_dir.join("dexterm.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of dexterm appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    if args.reset_prefs {
        let existed = preferences::reset(&db)
            .await
            .context("Failed to reset preferences")?;
        tracing::info!(existed, "Preferences reset");
    }

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!("{}", warning);
    }

    let prefs = PreferenceStore::load(&db, config.default_preferences()).await;
    let persistence = preferences::spawn_persistence(db.clone(), prefs.subscribe());

    let mut app = App::new(store, prefs, keybindings);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);

    let result = ui::run(&mut app, event_tx, event_rx).await;

    // Dropping the app closes the preference channel; the writer flushes
    // the last snapshot and exits.
    drop(app);
    if let Err(e) = persistence.await {
        tracing::warn!(error = %e, "Preference writer ended abnormally");
    }

    result
}
