//! Tracing setup for one-shot commands
//!
//! Logs go to stderr, filtered by `RUST_LOG`. The interactive interface uses
//! file-based logging instead (see `tui::logging`).

use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use tracing_subscriber::Layer;

pub fn init_tracing_subscriber() {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry().with(console_layer).init();
}
