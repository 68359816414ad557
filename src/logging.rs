use env_logger::{Builder, Env, Target};

/// Logs go to stderr. A set `RUST_LOG` replaces the `-v` filter entirely.
pub fn init(verbose: u8) {
    Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .target(Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,nephranet=info",
        _ => "warn,nephranet=debug",
    }
}
