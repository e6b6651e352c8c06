use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

const SERVICE_NAME: &str = "ringtable";

/// Installs a global subscriber that writes bunyan-formatted json lines to stdout.
/// The level defaults to INFO and can be overridden through `RUST_LOG`.
pub fn initialize_json_subscriber() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new(SERVICE_NAME.to_string(), std::io::stdout);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .init();
}
