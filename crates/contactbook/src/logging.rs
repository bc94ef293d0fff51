//! Logging for the server and the CLI.
//!
//! [`init_logging`] installs the tracing subscriber; [`log_requests`] is the
//! axum middleware that wraps every request in an `http.request` span and
//! records its status and latency.

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn, Instrument, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose chatter is capped unless tracing everything.
const NOISY_TARGETS: &[&str] = &["hyper", "axum"];

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Startup, mutations and one line per request.
    #[default]
    Normal,
    /// Adds store reads, rejected forms and missing contacts.
    Verbose,
    /// Everything, including the HTTP stack.
    Trace,
}

impl Verbosity {
    /// Map the `-q` flag and the `-v` count to a verbosity.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Level for this crate's own events.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directives(self) -> String {
        let level = self.level();
        let mut directives = format!("contactbook={level}");
        let dependency_level = if self == Self::Trace {
            Level::TRACE
        } else {
            Level::WARN
        };
        for target in NOISY_TARGETS {
            directives.push_str(&format!(",{target}={dependency_level}"));
        }
        directives
    }
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity`.
///
/// # Examples
///
/// ```no_run
/// use contactbook::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(verbosity >= Verbosity::Verbose));

    // A subscriber may already be installed (repeated calls, test harness).
    let _ = subscriber.try_init();
}

/// Request logging middleware.
///
/// Server errors are logged at `warn`, everything else at `info`.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        path = %request.uri().path(),
    );
    let started = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        if response.status().is_server_error() {
            warn!(status, elapsed_ms, "Request failed");
        } else {
            info!(status, elapsed_ms, "Handled request");
        }
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(2, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(5, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
    }

    #[test]
    fn test_levels() {
        assert_eq!(Verbosity::Quiet.level(), Level::ERROR);
        assert_eq!(Verbosity::Normal.level(), Level::INFO);
        assert_eq!(Verbosity::Verbose.level(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.level(), Level::TRACE);
    }

    #[test]
    fn test_directives_cap_http_stack() {
        assert_eq!(
            Verbosity::Normal.directives(),
            "contactbook=INFO,hyper=WARN,axum=WARN"
        );
        assert_eq!(
            Verbosity::Trace.directives(),
            "contactbook=TRACE,hyper=TRACE,axum=TRACE"
        );
    }

    #[test]
    fn test_ordering() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Verbose >= Verbosity::Verbose);
        assert!(Verbosity::Trace > Verbosity::Verbose);
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }
}
