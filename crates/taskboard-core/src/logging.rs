use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{BoardError, BoardResult};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Output goes to stderr so it never
/// mixes with anything a host writes to stdout.
pub fn init_tracing(default_filter: &str) -> BoardResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| BoardError::Internal(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_an_error() {
        init_tracing("warn").unwrap();
        tracing::warn!("subscriber installed");
        assert!(matches!(init_tracing("debug"), Err(BoardError::Internal(_))));
    }
}
