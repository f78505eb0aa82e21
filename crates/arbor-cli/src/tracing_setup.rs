//! Tracing subscriber for the `arbor` binary.
//!
//! Filter priority: `ARBOR_LOG`, then `RUST_LOG`, then `-v` / `-q`, then `warn`.
//! Logs go to stderr so stdout stays valid JSON.

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ARBOR_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// `-v` wins over `-q`.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_subscriber(verbosity: Verbosity, no_color: bool) {
    let use_ansi = !no_color && std::io::IsTerminal::is_terminal(&std::io::stderr());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity, std::env::var(LOG_ENV).ok()))
        .with(fmt_layer)
        .try_init();
}

fn build_env_filter(verbosity: Verbosity, project_directives: Option<String>) -> EnvFilter {
    // Unparsable directives fall through rather than abort startup.
    if let Some(filter) = project_directives.and_then(|d| EnvFilter::try_new(d).ok()) {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = verbosity.default_level();
    if verbosity == Verbosity::Verbose {
        EnvFilter::new(format!("warn,arbor_tree={level},arbor_store={level},arbor={level}"))
    } else {
        EnvFilter::new(level.to_string())
    }
}
