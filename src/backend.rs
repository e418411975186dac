//! Trait seam over the libiio object tree.
//!
//! The AD9361 controller and its channel accessors operate on these traits
//! rather than directly on `industrial-io` types, enabling both real
//! hardware access (the `iio` submodule, behind the `iio` cargo
//! feature) and deterministic unit testing with the in-memory types from
//! [`crate::mock`].
//!
//! The traits mirror the libiio object model one-to-one: a context owns
//! devices, a device owns named channels and can allocate sample buffers,
//! and a buffer is refilled by one blocking call that returns a byte count.

use crate::error::Result;

/// A connection context owning all downstream device handles.
pub trait IioContext: Sized {
    type Device: IioDevice;

    /// Establish a context against a network-reachable device host.
    fn connect(addr: &str) -> Result<Self>;

    /// Look up a logical device by its fixed name.
    fn find_device(&self, name: &str) -> Option<Self::Device>;
}

/// A logical device (streamer or front end) looked up from a context.
pub trait IioDevice {
    type Channel: IioChannel;
    type Buffer: SampleBuffer;

    /// Look up a sub-channel by name and direction.
    fn find_channel(&self, name: &str, output: bool) -> Option<Self::Channel>;

    /// Allocate a sample buffer of `samples` entries on this device.
    ///
    /// The buffer layout follows the device's enabled scan elements, so
    /// streaming channels must be enabled before calling this.
    fn create_buffer(&self, samples: usize) -> Result<Self::Buffer>;
}

/// A named sub-channel: either a streaming data path (I or Q samples) or a
/// configuration path (front-end or local-oscillator attributes).
pub trait IioChannel {
    /// Read a string-valued attribute.
    fn attr_read_str(&self, attr: &str) -> Result<String>;

    /// Write a string-valued attribute.
    fn attr_write_str(&self, attr: &str, value: &str) -> Result<()>;

    /// Read an integer-valued attribute (Hz values on the AD9361).
    fn attr_read_int(&self, attr: &str) -> Result<i64>;

    /// Write an integer-valued attribute.
    fn attr_write_int(&self, attr: &str, value: i64) -> Result<()>;

    /// Mark this channel as an active scan element.
    fn enable(&self);

    /// Remove this channel from the active scan elements.
    fn disable(&self);

    /// Whether this channel is currently enabled.
    fn is_enabled(&self) -> bool;
}

/// A fixed-size sample buffer bound to a streaming device.
pub trait SampleBuffer {
    /// Fetch the next block of samples from the hardware.
    ///
    /// Blocks until the transport delivers a full buffer (there is no
    /// timeout; a stalled transport blocks the caller indefinitely).
    /// Returns the number of bytes fetched.
    fn refill(&mut self) -> Result<usize>;
}

#[cfg(feature = "iio")]
pub mod iio {
    //! Backend implementation over the `industrial-io` crate.

    use industrial_io as iio;

    use super::{IioChannel, IioContext, IioDevice, SampleBuffer};
    use crate::error::{Error, Result};

    /// Network-backed IIO context.
    pub struct NetContext {
        ctx: iio::Context,
    }

    impl IioContext for NetContext {
        type Device = NetDevice;

        fn connect(addr: &str) -> Result<Self> {
            let uri = format!("ip:{addr}");
            let ctx = iio::Context::from_uri(&uri).map_err(|e| Error::Connect {
                addr: addr.to_string(),
                detail: format!("{e:?}"),
            })?;
            Ok(Self { ctx })
        }

        fn find_device(&self, name: &str) -> Option<NetDevice> {
            self.ctx.find_device(name).map(|dev| NetDevice { dev })
        }
    }

    /// A logical device handle (lifetime tied to the reference-counted
    /// context inside `industrial-io`).
    pub struct NetDevice {
        dev: iio::Device,
    }

    impl IioDevice for NetDevice {
        type Channel = NetChannel;
        type Buffer = NetBuffer;

        fn find_channel(&self, name: &str, output: bool) -> Option<NetChannel> {
            self.dev
                .find_channel(name, output)
                .map(|chan| NetChannel { chan })
        }

        fn create_buffer(&self, samples: usize) -> Result<NetBuffer> {
            let buf = self
                .dev
                .create_buffer(samples, false)
                .map_err(|e| Error::Buffer(format!("{e:?}")))?;
            Ok(NetBuffer { buf })
        }
    }

    /// A sub-channel handle on a logical device.
    pub struct NetChannel {
        chan: iio::Channel,
    }

    impl IioChannel for NetChannel {
        fn attr_read_str(&self, attr: &str) -> Result<String> {
            self.chan
                .attr_read_str(attr)
                .map_err(|e| Error::attr(attr, format!("{e:?}")))
        }

        fn attr_write_str(&self, attr: &str, value: &str) -> Result<()> {
            self.chan
                .attr_write_str(attr, value)
                .map_err(|e| Error::attr(attr, format!("{e:?}")))
        }

        fn attr_read_int(&self, attr: &str) -> Result<i64> {
            self.chan
                .attr_read_int(attr)
                .map_err(|e| Error::attr(attr, format!("{e:?}")))
        }

        fn attr_write_int(&self, attr: &str, value: i64) -> Result<()> {
            self.chan
                .attr_write_int(attr, value)
                .map_err(|e| Error::attr(attr, format!("{e:?}")))
        }

        fn enable(&self) {
            self.chan.enable();
        }

        fn disable(&self) {
            self.chan.disable();
        }

        fn is_enabled(&self) -> bool {
            self.chan.is_enabled()
        }
    }

    /// A DMA-style sample buffer on a streaming device.
    pub struct NetBuffer {
        buf: iio::Buffer,
    }

    impl SampleBuffer for NetBuffer {
        fn refill(&mut self) -> Result<usize> {
            self.buf
                .refill()
                .map_err(|e| Error::Stream(format!("refill failed: {e:?}")))
        }
    }
}
