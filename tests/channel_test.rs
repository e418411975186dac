//! Attribute accessor tests for the per-direction radio channels.

use rs_pluto::channel::ATTR_LO_FREQUENCY;
use rs_pluto::mock::MockContext;
use rs_pluto::{Ad9361, PHY_DEVICE};

fn ready_controller() -> Ad9361<MockContext> {
    let mut radio = Ad9361::new();
    radio.init_with(MockContext::ad9361()).unwrap();
    radio
}

#[test]
fn bandwidth_round_trip() {
    let radio = ready_controller();
    let rx = radio.rx().unwrap();

    for hz in [0, 1_000_000, 56_000_000] {
        rx.set_bandwidth_hz(hz).unwrap();
        assert_eq!(rx.bandwidth_hz().unwrap(), hz);
    }
}

#[test]
fn sampling_rate_round_trip() {
    let radio = ready_controller();
    let rx = radio.rx().unwrap();

    rx.set_sampling_rate(2_000_000).unwrap();
    assert_eq!(rx.sampling_rate().unwrap(), 2_000_000);
}

#[test]
fn rf_port_round_trip() {
    let radio = ready_controller();
    let rx = radio.rx().unwrap();

    assert_eq!(rx.rf_port().unwrap(), "A_BALANCED");
    rx.set_rf_port("B_BALANCED").unwrap();
    assert_eq!(rx.rf_port().unwrap(), "B_BALANCED");
}

#[test]
fn lo_frequency_setter_and_getter_share_one_attribute() {
    let ctx = MockContext::ad9361();
    let lo_rx = ctx
        .device(PHY_DEVICE)
        .unwrap()
        .channel("altvoltage0", true)
        .unwrap();

    let mut radio = Ad9361::new();
    radio.init_with(ctx).unwrap();
    let rx = radio.rx().unwrap();

    rx.set_lo_frequency(433_920_000).unwrap();
    assert_eq!(rx.lo_frequency().unwrap(), 433_920_000);

    // The write landed on the same `frequency` attribute the getter reads.
    use rs_pluto::backend::IioChannel;
    assert_eq!(lo_rx.attr_read_int(ATTR_LO_FREQUENCY).unwrap(), 433_920_000);
}

#[test]
fn rx_and_tx_front_ends_are_independent() {
    let radio = ready_controller();
    let rx = radio.rx().unwrap();
    let tx = radio.tx().unwrap();

    rx.set_sampling_rate(2_000_000).unwrap();
    tx.set_sampling_rate(4_000_000).unwrap();

    assert_eq!(rx.sampling_rate().unwrap(), 2_000_000);
    assert_eq!(tx.sampling_rate().unwrap(), 4_000_000);
}

#[test]
fn disable_then_enable_leaves_both_streams_enabled() {
    let radio = ready_controller();
    let rx = radio.rx().unwrap();

    assert!(!rx.stream_enabled());
    rx.enable_stream();
    assert!(rx.stream_enabled());
    rx.disable_stream();
    assert!(!rx.stream_enabled());
    rx.enable_stream();
    assert!(rx.stream_enabled());
    // Repeated enables are harmless.
    rx.enable_stream();
    assert!(rx.stream_enabled());
}

#[test]
fn unreadable_attribute_is_a_distinct_error_not_zero() {
    let ctx = MockContext::ad9361();
    let front_end = ctx
        .device(PHY_DEVICE)
        .unwrap()
        .channel("voltage0", false)
        .unwrap();
    front_end.drop_attr("rf_bandwidth");

    let mut radio = Ad9361::new();
    radio.init_with(ctx).unwrap();
    let rx = radio.rx().unwrap();

    // A missing attribute must not masquerade as a legitimate zero reading.
    assert!(rx.bandwidth_hz().is_err());
    assert!(rx.set_bandwidth_hz(1_000_000).is_err());
}
