//! revstore demo
//!
//! Runs a scripted deploy against the in-memory store: three uploads with
//! retention 2, activation of the latest, then prints the history as JSON.
//!
//! Set `REVSTORE_CONFIG` to a TOML file to override the store config.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revstore_core::impls::InMemoryNodeStore;
use revstore_core::{Filename, Key, RevisionKey, RevisionStore, StoreConfig};

fn load_config() -> Result<StoreConfig> {
    match std::env::var_os("REVSTORE_CONFIG") {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            StoreConfig::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Ok(StoreConfig::default()
            .with_key_prefix("/deploy/demo")
            .with_retention(2)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revstore=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // (A) set up the store and the RevisionStore
    let config = load_config()?;
    let revisions = RevisionStore::new(InMemoryNodeStore::new(), config)?;
    tracing::info!(
        key_prefix = %revisions.config().key_prefix,
        retention = revisions.config().retention,
        "revision store ready"
    );

    // (B) deploy: upload -> trim, three times
    let key = Key::new("index")?;
    let index = Filename::new("index.html")?;
    revisions.will_deploy(&key).await?;

    let mut last = None;
    for n in 1..=3 {
        let revision = RevisionKey::new(format!("rev-{n}"))?;
        let html = format!("<html><body>release {n}</body></html>");
        let path = revisions
            .upload(&key, Some(&revision), &index, html.as_bytes())
            .await?;
        revisions.trim_recent_uploads(&key, Some(&revision)).await?;
        tracing::info!(%path, "deployed");
        last = Some(revision);
    }

    // (C) activate
    if let Some(revision) = last {
        revisions.activate(&key, &revision).await?;
    }

    // (D) print the results
    let history = revisions.fetch_revisions(&key).await?;
    println!("{}", serde_json::to_string_pretty(&history)?);

    if let Some(content) = revisions.fetch_active(&key, &index).await? {
        println!("serving: {}", String::from_utf8_lossy(&content));
    }
    for path in revisions.store().paths().await {
        println!("{path}");
    }
    Ok(())
}
