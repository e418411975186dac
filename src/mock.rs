//! In-memory backend for deterministic testing without radio hardware.
//!
//! [`MockContext`] and friends implement the [`crate::backend`] traits over
//! plain hash maps and atomics, so controller lifecycle, attribute access,
//! and the streaming loop can all be exercised in unit tests. All state is
//! behind `Arc`, making every type cheaply cloneable and `Send + Sync`:
//! tests can keep a handle on a channel or device, hand a clone to the
//! controller, and observe the effect of controller calls afterwards.
//!
//! Buffer refills are scripted: queue byte counts or errors with
//! [`MockDevice::push_refill`], optionally with a per-refill delay to
//! exercise cancellation latency. When the script runs dry, refills keep
//! returning a full buffer, which lets a streaming loop run until stopped.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::backend::{IioChannel, IioContext, IioDevice, SampleBuffer};
use crate::channel::{ATTR_BANDWIDTH, ATTR_LO_FREQUENCY, ATTR_RF_PORT, ATTR_SAMPLING_FREQUENCY};
use crate::error::{Error, Result};
use crate::{PHY_DEVICE, RX_STREAM_DEVICE, TX_STREAM_DEVICE};

/// Address that `MockContext::connect` refuses, for connect-failure tests.
pub const UNREACHABLE_ADDR: &str = "unreachable";

/// A mock sub-channel backed by an in-memory attribute store.
#[derive(Clone, Default)]
pub struct MockChannel {
    attrs: Arc<Mutex<HashMap<String, String>>>,
    enabled: Arc<AtomicBool>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel pre-seeded with the given attributes.
    pub fn with_attrs(attrs: &[(&str, &str)]) -> Self {
        let chan = Self::new();
        {
            let mut store = chan.attrs.lock().unwrap();
            for (name, value) in attrs {
                store.insert(name.to_string(), value.to_string());
            }
        }
        chan
    }

    /// Remove an attribute, so subsequent reads and writes of it fail.
    pub fn drop_attr(&self, name: &str) {
        self.attrs.lock().unwrap().remove(name);
    }
}

impl IioChannel for MockChannel {
    fn attr_read_str(&self, attr: &str) -> Result<String> {
        self.attrs
            .lock()
            .unwrap()
            .get(attr)
            .cloned()
            .ok_or_else(|| Error::attr(attr, "no such attribute"))
    }

    fn attr_write_str(&self, attr: &str, value: &str) -> Result<()> {
        let mut store = self.attrs.lock().unwrap();
        if !store.contains_key(attr) {
            return Err(Error::attr(attr, "no such attribute"));
        }
        store.insert(attr.to_string(), value.to_string());
        Ok(())
    }

    fn attr_read_int(&self, attr: &str) -> Result<i64> {
        let raw = self.attr_read_str(attr)?;
        raw.trim()
            .parse()
            .map_err(|e| Error::attr(attr, format!("not an integer: {e}")))
    }

    fn attr_write_int(&self, attr: &str, value: i64) -> Result<()> {
        self.attr_write_str(attr, &value.to_string())
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct RefillScript {
    queue: VecDeque<Result<usize>>,
    delay: Duration,
    refills: u64,
}

/// A mock logical device holding named channels and a refill script.
#[derive(Clone, Default)]
pub struct MockDevice {
    channels: Arc<Mutex<HashMap<(String, bool), MockChannel>>>,
    script: Arc<Mutex<RefillScript>>,
    buffer_unavailable: Arc<AtomicBool>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under `(name, output)`.
    pub fn add_channel(&self, name: &str, output: bool, chan: MockChannel) {
        self.channels
            .lock()
            .unwrap()
            .insert((name.to_string(), output), chan);
    }

    /// Remove a channel, inducing a lookup failure.
    pub fn remove_channel(&self, name: &str, output: bool) {
        self.channels
            .lock()
            .unwrap()
            .remove(&(name.to_string(), output));
    }

    /// A clone of the channel under `(name, output)`, for observation.
    pub fn channel(&self, name: &str, output: bool) -> Option<MockChannel> {
        self.channels
            .lock()
            .unwrap()
            .get(&(name.to_string(), output))
            .cloned()
    }

    /// Queue the outcome of a future refill (byte count or error).
    pub fn push_refill(&self, result: Result<usize>) {
        self.script.lock().unwrap().queue.push_back(result);
    }

    /// Make every refill block for `delay` before returning.
    pub fn set_refill_delay(&self, delay: Duration) {
        self.script.lock().unwrap().delay = delay;
    }

    /// Number of refills served so far across all buffers.
    pub fn refill_count(&self) -> u64 {
        self.script.lock().unwrap().refills
    }

    /// Make the next `create_buffer` call fail.
    pub fn refuse_buffers(&self) {
        self.buffer_unavailable.store(true, Ordering::SeqCst);
    }
}

impl IioDevice for MockDevice {
    type Channel = MockChannel;
    type Buffer = MockBuffer;

    fn find_channel(&self, name: &str, output: bool) -> Option<MockChannel> {
        self.channel(name, output)
    }

    fn create_buffer(&self, samples: usize) -> Result<MockBuffer> {
        if self.buffer_unavailable.load(Ordering::SeqCst) {
            return Err(Error::Buffer("no kernel buffers available".into()));
        }
        Ok(MockBuffer {
            script: Arc::clone(&self.script),
            // Matches the layout of two 16-bit scan elements per sample.
            full_refill_bytes: samples * 4,
        })
    }
}

/// A mock sample buffer replaying its device's refill script.
pub struct MockBuffer {
    script: Arc<Mutex<RefillScript>>,
    full_refill_bytes: usize,
}

impl SampleBuffer for MockBuffer {
    fn refill(&mut self) -> Result<usize> {
        let (result, delay) = {
            let mut script = self.script.lock().unwrap();
            script.refills += 1;
            let result = script
                .queue
                .pop_front()
                .unwrap_or(Ok(self.full_refill_bytes));
            (result, script.delay)
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        result
    }
}

/// A mock connection context holding named logical devices.
#[derive(Clone, Default)]
pub struct MockContext {
    devices: Arc<Mutex<HashMap<String, MockDevice>>>,
}

impl MockContext {
    /// An empty context (every device lookup fails).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical device under `name`.
    pub fn add_device(&self, name: &str, dev: MockDevice) {
        self.devices.lock().unwrap().insert(name.to_string(), dev);
    }

    /// Remove a logical device, inducing a lookup failure.
    pub fn remove_device(&self, name: &str) {
        self.devices.lock().unwrap().remove(name);
    }

    /// A clone of the device under `name`, for observation and scripting.
    pub fn device(&self, name: &str) -> Option<MockDevice> {
        self.devices.lock().unwrap().get(name).cloned()
    }

    /// Build the complete default AD9361 topology: both streaming devices
    /// with `voltage0`/`voltage1` pairs, and a phy device carrying the
    /// front-end and local-oscillator configuration channels.
    pub fn ad9361() -> Self {
        let ctx = Self::new();

        let rx_dev = MockDevice::new();
        rx_dev.add_channel("voltage0", false, MockChannel::new());
        rx_dev.add_channel("voltage1", false, MockChannel::new());
        ctx.add_device(RX_STREAM_DEVICE, rx_dev);

        let tx_dev = MockDevice::new();
        tx_dev.add_channel("voltage0", true, MockChannel::new());
        tx_dev.add_channel("voltage1", true, MockChannel::new());
        ctx.add_device(TX_STREAM_DEVICE, tx_dev);

        let front_end = &[
            (ATTR_RF_PORT, "A_BALANCED"),
            (ATTR_BANDWIDTH, "18000000"),
            (ATTR_SAMPLING_FREQUENCY, "30720000"),
        ];
        let lo = &[(ATTR_LO_FREQUENCY, "2400000000")];

        let phy_dev = MockDevice::new();
        phy_dev.add_channel("voltage0", false, MockChannel::with_attrs(front_end));
        phy_dev.add_channel("voltage0", true, MockChannel::with_attrs(front_end));
        phy_dev.add_channel("altvoltage0", true, MockChannel::with_attrs(lo));
        phy_dev.add_channel("altvoltage1", true, MockChannel::with_attrs(lo));
        ctx.add_device(PHY_DEVICE, phy_dev);

        ctx
    }
}

impl IioContext for MockContext {
    type Device = MockDevice;

    fn connect(addr: &str) -> Result<Self> {
        if addr == UNREACHABLE_ADDR {
            return Err(Error::Connect {
                addr: addr.to_string(),
                detail: "mock host unreachable".into(),
            });
        }
        Ok(Self::ad9361())
    }

    fn find_device(&self, name: &str) -> Option<MockDevice> {
        self.device(name)
    }
}
