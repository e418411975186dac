#![doc = include_str!("../readme.md")]

pub mod ad9361;
pub mod backend;
pub mod channel;
pub mod error;
pub mod mock;

pub use ad9361::{
    Ad9361, RxStats, StopHandle, PHY_DEVICE, RX_BUFFER_SAMPLES, RX_STREAM_DEVICE, TX_STREAM_DEVICE,
};
pub use channel::RadioChannel;
pub use error::{Error, Result};

/// Controller bound to the network libiio backend (requires the `iio` feature).
#[cfg(feature = "iio")]
pub type NetAd9361 = Ad9361<backend::iio::NetContext>;
