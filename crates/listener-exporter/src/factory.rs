// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Construction of one exporter per signal.

use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{ConfigurationError, Signal};
use crate::exporter::ListenerExporter;

/// Exporter for the traces signal. Requires the traces token.
pub fn create_traces_exporter(
    config: Option<ExportConfig>,
) -> Result<ListenerExporter, ConfigurationError> {
    create_exporter(config, Signal::Traces)
}

/// Exporter for the metrics signal. Requires the metrics token.
pub fn create_metrics_exporter(
    config: Option<ExportConfig>,
) -> Result<ListenerExporter, ConfigurationError> {
    create_exporter(config, Signal::Metrics)
}

fn create_exporter(
    config: Option<ExportConfig>,
    signal: Signal,
) -> Result<ListenerExporter, ConfigurationError> {
    let config = config.ok_or(ConfigurationError::Missing)?;
    config.validate()?;
    config.require(signal)?;
    let exporter = ListenerExporter::from_validated(config);
    debug!(
        "Created {signal} exporter for {}",
        exporter.config().listener_url()
    );
    Ok(exporter)
}
