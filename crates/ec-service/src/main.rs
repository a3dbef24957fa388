//! EC hierarchy lookup binary.
//!
//! Usage: `ec-lookup [EC_NUMBER...]`. With no arguments, prints the
//! flattened tree as JSON.

use ec_service::{describe, describe_replaced, ServiceConfig};
use ec_types::EcLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    tracing::info!(
        source = %config.source_path.display(),
        cache = %config.cache_dir.display(),
        "Loading EC hierarchy"
    );

    let index = config.load_index()?;
    for level in EcLevel::ALL {
        tracing::info!("{:>6} {} nodes", index.count_at_level(level), level);
    }

    let codes: Vec<String> = std::env::args().skip(1).collect();
    if codes.is_empty() {
        println!("{}", serde_json::to_string_pretty(&index.tree_nodes())?);
        return Ok(());
    }

    for raw in &codes {
        match describe(&index, raw) {
            Some(text) => println!("{}\n", text),
            None => match describe_replaced(&index, raw) {
                Some(text) => println!("{}\n", text),
                None => tracing::warn!("EC number {} not found", raw),
            },
        }
    }

    Ok(())
}
