//! Receive I/Q samples from a network-attached AD9361 until interrupted.
//!
//! Connects to the device host, reports the initial RX configuration, and
//! streams sample buffers to stdout-logged progress lines. Ctrl-C stops the
//! stream after the in-flight buffer refill completes.
//!
//! ```sh
//! cargo run --features iio --bin pluto_rx
//! ```

use std::process;

use rs_pluto::NetAd9361;

const DEVICE_ADDR: &str = "192.168.2.1";
const RX_FREQ_HZ: i64 = 96_000_000;

fn main() {
    tracing_subscriber::fmt::init();

    let mut radio = NetAd9361::new();
    if let Err(e) = radio.init(DEVICE_ADDR) {
        eprintln!("Unable to initialize AD9361 context on {DEVICE_ADDR}: {e}");
        process::exit(1);
    }

    if let Some(rx) = radio.rx() {
        match (rx.rf_port(), rx.sampling_rate(), rx.bandwidth_hz()) {
            (Ok(port), Ok(rate), Ok(bw)) => {
                eprintln!(
                    "RX front end: port {port}, {:.3} MS/s, {:.3} MHz bandwidth",
                    rate as f64 / 1_000_000.0,
                    bw as f64 / 1_000_000.0
                );
            }
            _ => eprintln!("RX front end: configuration not readable"),
        }
    }

    // The interrupt handler owns a cloned stop handle; the controller
    // itself stays on this thread, blocked inside the streaming call.
    let stop = radio.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Waiting for streaming to stop");
        stop.stop();
    }) {
        eprintln!("Unable to install interrupt handler: {e}");
        process::exit(1);
    }

    eprintln!(
        "Streaming RX at {:.3} MHz, press Ctrl-C to stop",
        RX_FREQ_HZ as f64 / 1_000_000.0
    );
    match radio.start_rx_stream(RX_FREQ_HZ) {
        Ok(stats) => {
            eprintln!(
                "Received {} buffers, {} I/Q samples ({:.2} MB)",
                stats.buffers,
                stats.samples,
                stats.bytes as f64 / 1_000_000.0
            );
        }
        Err(e) => {
            eprintln!("Unable to stream RX samples: {e}");
            radio.deinit();
            process::exit(1);
        }
    }

    radio.deinit();
    // Final status joins the per-refill progress lines on stdout.
    println!("Done, exiting");
}
