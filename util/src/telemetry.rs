//! Configures the tracing subscriber stack for the engine's binaries

pub use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// A builder for configuring the subscriber layers
#[derive(Default)]
pub struct TelemetryBuilder {
    /// The subscriber layers to add to the telemetry stack
    layers: Vec<Box<dyn Layer<Registry> + Send + Sync + 'static>>,
}

impl TelemetryBuilder {
    /// Add a subscriber layer to the telemetry builder
    fn with_layer<L: Layer<Registry> + Send + Sync>(mut self, layer: L) -> Self {
        self.layers.push(layer.boxed());
        self
    }

    /// Configure log output, either as JSON lines or pretty printed
    pub fn with_logging(self, json: bool) -> Self {
        if json {
            self.with_layer(fmt::layer().json())
        } else {
            self.with_layer(fmt::layer().pretty())
        }
    }

    /// The number of layers configured so far
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Initialize the global subscriber with the configured layers
    ///
    /// `RUST_LOG` directives take precedence over the default level
    pub fn build(self, default_level: LevelFilter) {
        let layers = self.layers.with_filter(
            EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy(),
        );
        tracing_subscriber::registry().with(layers).init()
    }
}

/// The default log level implied by the `debug` flag
pub fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Configure logging for a binary
pub fn configure_telemetry(json_logs: bool, default_level: LevelFilter) {
    TelemetryBuilder::default().with_logging(json_logs).build(default_level);
}

#[cfg(test)]
mod test {
    use super::{LevelFilter, TelemetryBuilder, level_for};

    /// Tests that each logging call adds a layer
    #[test]
    fn test_builder_layers() {
        let builder = TelemetryBuilder::default().with_logging(true);
        assert_eq!(builder.num_layers(), 1);
    }

    /// Tests the level selected by the debug flag
    #[test]
    fn test_level_for() {
        assert_eq!(level_for(true), LevelFilter::DEBUG);
        assert_eq!(level_for(false), LevelFilter::INFO);
    }
}
