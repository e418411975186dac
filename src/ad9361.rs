//! AD9361 device controller: lifecycle management and the blocking RX loop.
//!
//! The controller owns the connection context, resolves the three logical
//! devices the AD9361 driver exposes (RX streamer, TX streamer, analog
//! front end), and constructs one [`RadioChannel`] accessor per direction.
//! Configuration happens through the accessors; sample delivery happens
//! through [`Ad9361::start_rx_stream`], a blocking loop cancelled
//! cooperatively through a [`StopHandle`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::{IioContext, IioDevice, SampleBuffer};
use crate::channel::RadioChannel;
use crate::error::{Error, Result};

/// Logical device carrying the TX DMA streaming channels.
pub const TX_STREAM_DEVICE: &str = "cf-ad9361-dds-core-lpc";
/// Logical device carrying the RX DMA streaming channels.
pub const RX_STREAM_DEVICE: &str = "cf-ad9361-lpc";
/// Logical device carrying front-end and local-oscillator configuration.
pub const PHY_DEVICE: &str = "ad9361-phy";

/// Samples per RX buffer. One refill fetches this many complex samples.
pub const RX_BUFFER_SAMPLES: usize = 1024 * 1024;

/// Bytes per complex sample: two 16-bit scan elements (I and Q).
const BYTES_PER_SAMPLE: usize = 4;

type Dev<Ctx> = <Ctx as IioContext>::Device;
type Chan<Ctx> = <<Ctx as IioContext>::Device as IioDevice>::Channel;

/// Counters accumulated over one streaming run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RxStats {
    /// Number of completed buffer refills.
    pub buffers: u64,
    /// Total bytes fetched.
    pub bytes: u64,
    /// Total complex samples fetched.
    pub samples: u64,
}

/// Cloneable cancellation handle for the blocking RX loop.
///
/// The loop polls the shared flag once per buffer refill; calling
/// [`StopHandle::stop`] from any thread (typically a signal handler)
/// terminates it after the in-flight refill completes. There is no
/// mid-refill cancellation.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request the streaming loop to stop after the current refill.
    pub fn stop(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Whether the receive loop is currently executing.
    pub fn is_streaming(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Controller for one AD9361 transceiver reached through an IIO context.
///
/// Lifecycle: uninitialized → ready → (streaming) → ready → torn down,
/// with ready reachable again through re-initialization. The controller
/// never holds a channel accessor while it is not ready.
///
/// Apart from the stop flag, no method is safe to call concurrently with
/// an in-progress [`start_rx_stream`](Ad9361::start_rx_stream): the
/// accessors and the streaming loop share device handles without locking.
pub struct Ad9361<Ctx: IioContext> {
    ctx: Option<Ctx>,
    rx_dev: Option<Dev<Ctx>>,
    rx: Option<RadioChannel<Chan<Ctx>>>,
    tx: Option<RadioChannel<Chan<Ctx>>>,
    ready: bool,
    streaming: Arc<AtomicBool>,
}

impl<Ctx: IioContext> Default for Ad9361<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: IioContext> Ad9361<Ctx> {
    /// Create an uninitialized controller.
    pub fn new() -> Self {
        Self {
            ctx: None,
            rx_dev: None,
            rx: None,
            tx: None,
            ready: false,
            streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connect to the device host at `addr` and resolve all handles.
    ///
    /// Initialization is all-or-nothing: if the context cannot be created,
    /// or any of the three logical devices or eight required sub-channels
    /// is missing, the controller is left fully torn down and the specific
    /// lookup failure is returned. On success any previously constructed
    /// accessor pair is released (its streaming channels disabled) before
    /// the fresh pair replaces it.
    pub fn init(&mut self, addr: &str) -> Result<()> {
        match Ctx::connect(addr) {
            Ok(ctx) => self.init_with(ctx),
            Err(e) => {
                // Readiness drops on any initialization failure, and no
                // accessor may outlive it.
                self.deinit();
                Err(e)
            }
        }
    }

    /// Resolve all handles on an already-established context.
    ///
    /// This is the seam used by tests and by callers that build their
    /// context through other means (USB or local backends).
    pub fn init_with(&mut self, ctx: Ctx) -> Result<()> {
        self.ready = false;

        match Self::resolve(&ctx) {
            Ok((rx_dev, rx, tx)) => {
                self.release_accessors();
                self.ctx = Some(ctx);
                self.rx_dev = Some(rx_dev);
                self.rx = Some(rx);
                self.tx = Some(tx);
                self.ready = true;
                Ok(())
            }
            Err(e) => {
                // Leave nothing half-built: a failed lookup tears down any
                // prior state along with the context we just created.
                self.deinit();
                Err(e)
            }
        }
    }

    /// Look up the devices and sub-channels and build the accessor pair.
    #[allow(clippy::type_complexity)]
    fn resolve(
        ctx: &Ctx,
    ) -> Result<(
        Dev<Ctx>,
        RadioChannel<Chan<Ctx>>,
        RadioChannel<Chan<Ctx>>,
    )> {
        let tx_dev = require_device(ctx, TX_STREAM_DEVICE)?;
        let rx_dev = require_device(ctx, RX_STREAM_DEVICE)?;
        let phy_dev = require_device(ctx, PHY_DEVICE)?;

        // Streaming pairs, falling back from voltageN to altvoltageN.
        let rx_i = stream_channel(&rx_dev, RX_STREAM_DEVICE, "voltage0", "altvoltage0", false)?;
        let rx_q = stream_channel(&rx_dev, RX_STREAM_DEVICE, "voltage1", "altvoltage1", false)?;
        let tx_i = stream_channel(&tx_dev, TX_STREAM_DEVICE, "voltage0", "altvoltage0", true)?;
        let tx_q = stream_channel(&tx_dev, TX_STREAM_DEVICE, "voltage1", "altvoltage1", true)?;

        // Local oscillators and front-end configuration on the phy device.
        let lo_rx = require_channel(&phy_dev, PHY_DEVICE, "altvoltage0", true)?;
        let lo_tx = require_channel(&phy_dev, PHY_DEVICE, "altvoltage1", true)?;
        let phy_rx = require_channel(&phy_dev, PHY_DEVICE, "voltage0", false)?;
        let phy_tx = require_channel(&phy_dev, PHY_DEVICE, "voltage0", true)?;

        tracing::debug!("resolved all AD9361 devices and sub-channels");

        let rx = RadioChannel::new(rx_i, rx_q, phy_rx, lo_rx);
        let tx = RadioChannel::new(tx_i, tx_q, phy_tx, lo_tx);
        Ok((rx_dev, rx, tx))
    }

    /// Tear everything down: accessors, device handles, context.
    ///
    /// Streaming channels of any held accessor are disabled before release.
    /// Safe to call when never initialized.
    pub fn deinit(&mut self) {
        self.ready = false;
        self.release_accessors();
        self.rx_dev = None;
        self.ctx = None;
    }

    fn release_accessors(&mut self) {
        if let Some(tx) = self.tx.take() {
            tx.disable_stream();
        }
        if let Some(rx) = self.rx.take() {
            rx.disable_stream();
        }
    }

    /// Whether initialization completed and the controller is usable.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The RX channel accessor, if initialized.
    pub fn rx(&self) -> Option<&RadioChannel<Chan<Ctx>>> {
        self.rx.as_ref()
    }

    /// The TX channel accessor, if initialized.
    pub fn tx(&self) -> Option<&RadioChannel<Chan<Ctx>>> {
        self.tx.as_ref()
    }

    /// Obtain a cancellation handle for [`start_rx_stream`](Self::start_rx_stream).
    ///
    /// The handle is `Send + Clone`; hand it to a signal handler or another
    /// thread rather than sharing the controller itself.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.streaming),
        }
    }

    /// Whether the receive loop is currently executing.
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Receive I/Q sample buffers until externally stopped.
    ///
    /// Tunes the RX local oscillator to `freq_hz` (best effort), enables
    /// the RX streaming pair, allocates one [`RX_BUFFER_SAMPLES`]-sample
    /// buffer, and then blocks in a refill loop, printing one progress line
    /// per buffer. The loop exits when [`StopHandle::stop`] (or
    /// [`stop_rx_stream`](Self::stop_rx_stream) from another thread) is
    /// called, taking effect after the in-flight refill completes, or when
    /// a refill fails.
    ///
    /// Returns the accumulated counters on a clean stop, [`Error::NotReady`]
    /// when called before initialization, and the underlying error when
    /// buffer allocation or a refill fails. The streaming pair is disabled
    /// on every exit path.
    pub fn start_rx_stream(&self, freq_hz: i64) -> Result<RxStats> {
        if !self.ready {
            return Err(Error::NotReady);
        }
        let rx = self.rx.as_ref().ok_or(Error::NotReady)?;
        let rx_dev = self.rx_dev.as_ref().ok_or(Error::NotReady)?;

        if let Err(e) = rx.set_lo_frequency(freq_hz) {
            tracing::warn!("failed to tune RX LO to {} Hz: {}", freq_hz, e);
        }

        // Enable the scan elements before the buffer is laid out.
        rx.enable_stream();
        let mut buf = match rx_dev.create_buffer(RX_BUFFER_SAMPLES) {
            Ok(buf) => buf,
            Err(e) => {
                rx.disable_stream();
                return Err(e);
            }
        };

        self.streaming.store(true, Ordering::SeqCst);
        tracing::info!("RX streaming started at {} Hz", freq_hz);

        let mut stats = RxStats::default();
        while self.streaming.load(Ordering::SeqCst) {
            match buf.refill() {
                Ok(bytes) => {
                    let samples = bytes / BYTES_PER_SAMPLE;
                    println!("Got {bytes} bytes in {samples} I/Q samples");
                    stats.buffers += 1;
                    stats.bytes += bytes as u64;
                    stats.samples += samples as u64;
                }
                Err(e) => {
                    self.streaming.store(false, Ordering::SeqCst);
                    rx.disable_stream();
                    tracing::info!("RX streaming aborted after {} buffers", stats.buffers);
                    return Err(e);
                }
            }
        }

        rx.disable_stream();
        tracing::info!(
            "RX streaming stopped after {} buffers ({} samples)",
            stats.buffers,
            stats.samples
        );
        Ok(stats)
    }

    /// Request the receive loop to stop.
    ///
    /// Takes effect only after the in-flight buffer refill completes. Must
    /// be called from a different thread than the one blocked inside
    /// [`start_rx_stream`](Self::start_rx_stream); [`stop_handle`](Self::stop_handle)
    /// gives out a handle suited for that.
    pub fn stop_rx_stream(&self) {
        self.streaming.store(false, Ordering::SeqCst);
    }
}

fn require_device<Ctx: IioContext>(ctx: &Ctx, name: &str) -> Result<Dev<Ctx>> {
    tracing::debug!("looking up device {}", name);
    ctx.find_device(name)
        .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
}

/// Find a streaming sub-channel, falling back to its `alt` name.
fn stream_channel<D: IioDevice>(
    dev: &D,
    dev_name: &str,
    primary: &str,
    alt: &str,
    output: bool,
) -> Result<D::Channel> {
    dev.find_channel(primary, output)
        .or_else(|| {
            tracing::debug!("{}: {} missing, trying {}", dev_name, primary, alt);
            dev.find_channel(alt, output)
        })
        .ok_or_else(|| Error::ChannelNotFound {
            device: dev_name.to_string(),
            channel: primary.to_string(),
        })
}

fn require_channel<D: IioDevice>(
    dev: &D,
    dev_name: &str,
    name: &str,
    output: bool,
) -> Result<D::Channel> {
    dev.find_channel(name, output)
        .ok_or_else(|| Error::ChannelNotFound {
            device: dev_name.to_string(),
            channel: name.to_string(),
        })
}
