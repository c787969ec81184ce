//! Logging setup shared by the command line tools

/// Default log filter for a `-v` count
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialise logging from the verbosity count unless RUST_LOG is set.
pub fn setup_logging(verbose: u8) {
    let env = env_logger::Env::default().default_filter_or(default_filter(verbose));
    env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .init();
}
