use tracing_subscriber::EnvFilter;

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

// sqlx logs every statement at info; keep it quiet unless RUST_LOG asks.
fn default_directives(verbosity: u8) -> String {
    format!("{},sqlx=warn", default_level(verbosity))
}

/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG` wins
/// over the `-v` count when set.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
