use tracing_subscriber::filter::EnvFilter;

/// Log target of this crate, used to scope the verbosity flag.
const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Install the global subscriber. `RUST_LOG` wins over the `-v` count when set.
pub fn set_up(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,{}={}", CRATE_TARGET, max_level(verbosity)))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn max_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
