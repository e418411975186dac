//! Per-direction channel accessor for the AD9361.
//!
//! A [`RadioChannel`] groups the four sub-channel handles that make up one
//! RF direction (RX or TX): the two streaming data paths carrying I and Q
//! samples, the front-end configuration path (RF port, analog bandwidth,
//! baseband sample rate), and the local-oscillator configuration path
//! (tuning frequency). It exposes typed getters and setters for the named
//! attributes the AD9361 driver publishes, and enables or disables the
//! streaming pair as a unit.

use crate::backend::IioChannel;
use crate::error::Result;

/// Attribute carrying the active RF front-end port (string valued).
pub const ATTR_RF_PORT: &str = "rf_port_select";
/// Attribute carrying the analog bandwidth in Hz.
pub const ATTR_BANDWIDTH: &str = "rf_bandwidth";
/// Attribute carrying the baseband sample rate in Hz.
pub const ATTR_SAMPLING_FREQUENCY: &str = "sampling_frequency";
/// Attribute carrying the local-oscillator tuning frequency in Hz.
pub const ATTR_LO_FREQUENCY: &str = "frequency";

/// Typed attribute access for one RF direction.
///
/// Exactly one instance per direction exists while the controller is
/// initialized; it is released (with its streaming pair disabled) on
/// deinitialization or re-initialization.
pub struct RadioChannel<C: IioChannel> {
    stream_i: C,
    stream_q: C,
    phy: C,
    lo: C,
}

impl<C: IioChannel> RadioChannel<C> {
    pub(crate) fn new(stream_i: C, stream_q: C, phy: C, lo: C) -> Self {
        Self {
            stream_i,
            stream_q,
            phy,
            lo,
        }
    }

    /// Read the active RF front-end port (e.g. `"A_BALANCED"`).
    pub fn rf_port(&self) -> Result<String> {
        self.phy.attr_read_str(ATTR_RF_PORT)
    }

    /// Select the RF front-end port.
    pub fn set_rf_port(&self, port: &str) -> Result<()> {
        self.phy.attr_write_str(ATTR_RF_PORT, port)
    }

    /// Read the analog bandwidth in Hz.
    pub fn bandwidth_hz(&self) -> Result<i64> {
        self.phy.attr_read_int(ATTR_BANDWIDTH)
    }

    /// Set the analog bandwidth in Hz.
    pub fn set_bandwidth_hz(&self, hz: i64) -> Result<()> {
        self.phy.attr_write_int(ATTR_BANDWIDTH, hz)
    }

    /// Read the baseband sample rate in Hz.
    pub fn sampling_rate(&self) -> Result<i64> {
        self.phy.attr_read_int(ATTR_SAMPLING_FREQUENCY)
    }

    /// Set the baseband sample rate in Hz.
    pub fn set_sampling_rate(&self, hz: i64) -> Result<()> {
        self.phy.attr_write_int(ATTR_SAMPLING_FREQUENCY, hz)
    }

    /// Read the local-oscillator tuning frequency in Hz.
    pub fn lo_frequency(&self) -> Result<i64> {
        self.lo.attr_read_int(ATTR_LO_FREQUENCY)
    }

    /// Tune the local oscillator, in Hz.
    ///
    /// Reads and writes go to the same `frequency` attribute; see DESIGN.md
    /// for the history of this accessor pair.
    pub fn set_lo_frequency(&self, hz: i64) -> Result<()> {
        self.lo.attr_write_int(ATTR_LO_FREQUENCY, hz)
    }

    /// Enable the I and Q streaming sub-channels as a pair.
    ///
    /// Best-effort: scan-element toggles do not report failure.
    pub fn enable_stream(&self) {
        self.stream_i.enable();
        self.stream_q.enable();
    }

    /// Disable the I and Q streaming sub-channels as a pair.
    pub fn disable_stream(&self) {
        self.stream_i.disable();
        self.stream_q.disable();
    }

    /// Whether both streaming sub-channels are currently enabled.
    pub fn stream_enabled(&self) -> bool {
        self.stream_i.is_enabled() && self.stream_q.is_enabled()
    }
}
