use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    Compact,
    /// One JSON object per line for CI log collectors.
    Json,
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "domain_itest=debug,info"
    } else {
        "domain_itest=info,warn"
    }
}

/// `RUST_LOG` wins over the built-in directive when it parses.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn format_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let base = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Json => base.json().with_current_span(false).boxed(),
    }
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    tracing_subscriber::registry()
        .with(format_layer(format))
        .with(filter(verbose))
        .init();
}
