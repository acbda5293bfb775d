//! Decoder configuration, threaded through construction of the pipeline and
//! every station.

use std::time::Duration;

/// Decoder options.
///
/// Built by the CLI, but the library defaults are usable directly.
#[derive(Clone, Debug)]
pub struct Options {
    /// Use North American (RBDS) programme type names and derive callsigns
    /// from PI codes.
    pub rbds: bool,
    /// Attach a receive timestamp to every record.
    pub timestamp: bool,
    /// strftime-style format for the receive timestamp.
    pub time_format: String,
    /// Emit partial PS / RadioText / AF lists as they assemble.
    pub show_partial: bool,
    /// Include the raw block hex in every record.
    pub show_raw: bool,
    /// Number of input channels; above one, records carry a channel index.
    pub num_channels: usize,
    /// Attach the running block error rate to every record.
    pub bler: bool,
    /// Flush a stale TMC multi-group buffer when the next part arrives this
    /// long after the previous one. `None` disables the staleness check.
    pub tmc_message_timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rbds: false,
            timestamp: false,
            time_format: "%Y-%m-%dT%H:%M:%S%.3f%:z".to_string(),
            show_partial: false,
            show_raw: false,
            num_channels: 1,
            bler: false,
            tmc_message_timeout: Some(Duration::from_secs(15)),
        }
    }
}
