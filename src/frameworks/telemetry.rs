// Tracing setup for binaries embedding the client. `ACM_LOG` filters events
// and falls back to `RUST_LOG`; `LOG_FORMAT=json` switches to structured output.

use tracing_subscriber::EnvFilter;

// Client events at info, everything else (reqwest, hyper) only from warn.
pub const DEFAULT_FILTER: &str = "warn,acm_client=info";

// First non-blank directive string wins.
fn filter_directives(acm_log: Option<String>, rust_log: Option<String>) -> String {
    [acm_log, rust_log]
        .into_iter()
        .flatten()
        .map(|directives| directives.trim().to_string())
        .find(|directives| !directives.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Installs a global subscriber unless the host already has one.
pub fn init_tracing() {
    let directives = filter_directives(std::env::var("ACM_LOG").ok(), std::env::var("RUST_LOG").ok());
    let (filter, rejected) = match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_FILTER), Some(err)),
    };

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let installed = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
    };
    if let Err(err) = installed {
        tracing::debug!(error = %err, "subscriber already installed; keeping the host's");
        return;
    }
    if let Some(err) = rejected {
        tracing::warn!(%directives, error = %err, "invalid log filter; using {DEFAULT_FILTER}");
    }

    // Log panics, then let the previous hook print them as usual.
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
        previous(info);
    }));
}
