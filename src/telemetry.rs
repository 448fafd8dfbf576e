#[cfg(feature = "telemetry")]
use std::sync::OnceLock;

#[cfg(feature = "telemetry")]
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the tracing subscriber once per process.
///
/// `RUST_LOG` overrides the default `cast_migrate=info` filter. Events go to
/// stderr so they never mix with diagnostics or diffs on stdout.
pub fn init_tracing() {
    #[cfg(feature = "telemetry")]
    static INIT: OnceLock<()> = OnceLock::new();

    #[cfg(feature = "telemetry")]
    {
        INIT.get_or_init(|| {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cast_migrate=info"));
            let _ = fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        });
    }
}

/// Instrument an inline block with a span if telemetry is enabled.
#[macro_export]
macro_rules! instrument_block {
    ($name:expr, $block:block) => {{
        #[cfg(feature = "telemetry")]
        {
            let span = tracing::info_span!("cast_migrate", phase = $name);
            let _guard = span.enter();
            (|| $block)()
        }
        #[cfg(not(feature = "telemetry"))]
        {
            (|| $block)()
        }
    }};
}
