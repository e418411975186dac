//! Error types for rs-pluto operations.

use thiserror::Error;

/// Result type for rs-pluto operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to an AD9361 over libiio.
///
/// libiio failures are captured as formatted detail strings at the call
/// site; the underlying library reports errno-style codes that carry no
/// additional structure worth preserving.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not create an IIO context against the device host.
    #[error("failed to connect to {addr}: {detail}")]
    Connect { addr: String, detail: String },

    /// A required logical device is missing from the context.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A required sub-channel is missing from a logical device.
    #[error("channel not found: {channel} on {device}")]
    ChannelNotFound { device: String, channel: String },

    /// An attribute read or write failed.
    #[error("attribute {attr}: {detail}")]
    Attribute { attr: String, detail: String },

    /// The controller has not been initialized (or was torn down).
    #[error("device not initialized")]
    NotReady,

    /// Sample buffer allocation failed.
    #[error("buffer allocation failed: {0}")]
    Buffer(String),

    /// A buffer refill failed mid-stream.
    #[error("streaming error: {0}")]
    Stream(String),
}

impl Error {
    /// Create an attribute error with a custom detail message.
    pub fn attr<S: Into<String>, D: Into<String>>(attr: S, detail: D) -> Self {
        Error::Attribute {
            attr: attr.into(),
            detail: detail.into(),
        }
    }
}
