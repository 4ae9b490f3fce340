use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use tracing_flame::{FlameLayer, FlushGuard};
use tracing_subscriber::{filter, prelude::*};

use crate::error::{Result, RoutingError};

/// Installs the global subscriber for hosts that want the router's events:
/// pretty INFO output on stdout, everything at DEBUG into a log file, and
/// optionally a flamegraph capture.
pub struct RoutingTracer {
    flame_guard: Option<FlushGuard<BufWriter<File>>>,
}

impl RoutingTracer {
    pub fn install(debug_log: &Path) -> Result<Self> {
        Self::install_with_flame(debug_log, None)
    }

    pub fn install_with_flame(debug_log: &Path, flame_output: Option<&Path>) -> Result<Self> {
        let stdout_log = tracing_subscriber::fmt::layer().pretty();

        // A layer that logs events to a file.
        let file = File::create(debug_log).map_err(|source| RoutingError::Io {
            path: debug_log.to_path_buf(),
            source,
        })?;
        let debug_log = tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_filter(filter::LevelFilter::DEBUG);

        let (flame_layer, flame_guard) = match flame_output {
            Some(path) => {
                let (layer, guard) = FlameLayer::with_file(path).map_err(|e| RoutingError::Tracing(e.to_string()))?;
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(
                stdout_log
                    // Add an `INFO` filter to the stdout logging layer
                    .with_filter(filter::LevelFilter::INFO)
                    // Combine the filtered `stdout_log` layer with the
                    // `debug_log` layer, producing a new `Layered` layer.
                    .and_then(debug_log),
            )
            .with(flame_layer)
            .try_init()
            .map_err(|e| RoutingError::Tracing(e.to_string()))?;

        Ok(Self { flame_guard })
    }

    /// Flush the flamegraph samples collected so far.
    pub fn flush(&self) -> Result<()> {
        if let Some(guard) = &self.flame_guard {
            guard.flush().map_err(|e| RoutingError::Tracing(e.to_string()))?;
        }
        Ok(())
    }
}
