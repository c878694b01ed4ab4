use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs go to stderr so stdout stays the dashboard.
///
/// `RUST_LOG` is honoured; on top of it `sbb_dashboard=info`, or `=error` when `quiet`.
pub fn init_logging(quiet: bool) {
    let directive = if quiet {
        "sbb_dashboard=error"
    } else {
        "sbb_dashboard=info"
    };

    let filter = match directive.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}
