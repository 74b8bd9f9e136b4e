//! Construction, direct acquisition and device maintenance through the
//! `Sensor` facade.

use embedded_hal::spi::ErrorKind;
use max31865::{BusRegistry, DeviceConfig, Error, PollState, Sensor, WiringMode};

use crate::mock_hw::{MockTransfer, OPEN_RTD, POR, ROOM};

fn named(id: &str) -> DeviceConfig {
    DeviceConfig {
        identifier: id.to_owned(),
        ..DeviceConfig::default()
    }
}

// ── Construction ──────────────────────────────────────────────

#[test]
fn stuck_low_then_stuck_high_then_healthy() {
    let t = MockTransfer::scripted(&[[0x00; 8], [0xFF; 8], POR], ROOM);

    assert_eq!(Sensor::new(t.clone(), named("a")).err(), Some(Error::StuckLow));
    assert_eq!(Sensor::new(t.clone(), named("a")).err(), Some(Error::StuckHigh));
    assert!(t.writes().is_empty(), "nothing written to an unhealthy bus");

    let sensor = Sensor::new(t.clone(), named("a")).unwrap();
    assert_eq!(sensor.state(), PollState::Idle);
    assert_eq!(t.writes(), [vec![0x80, 0xD1]]);
}

#[test]
fn initial_register_follows_wiring() {
    for (wiring, value) in [
        (WiringMode::TwoWire, 0xC1),
        (WiringMode::ThreeWire, 0xD1),
        (WiringMode::FourWire, 0xC1),
    ] {
        let t = MockTransfer::new(ROOM);
        let config = DeviceConfig::new(wiring, 430.0, 100.0, "w");
        let sensor = Sensor::new(t.clone(), config).unwrap();
        assert_eq!(sensor.register().unwrap().value(), value);
        assert_eq!(t.writes(), [vec![0x80, value]]);
    }
}

#[test]
fn invalid_config_never_touches_the_bus() {
    let t = MockTransfer::new(ROOM);
    let config = DeviceConfig::new(WiringMode::TwoWire, 100.0, 100.0, "bad");
    assert!(matches!(Sensor::new(t.clone(), config), Err(Error::Config(_))));
    assert!(t.log().frames.is_empty());
}

#[test]
fn json_config_end_to_end() {
    let config = DeviceConfig::from_json(
        r#"{"wiring":"fourWire","referenceResistance":4300,"nominalResistance":1000,"identifier":"boiler"}"#,
    )
    .unwrap();
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t.clone(), config).unwrap();
    assert_eq!(sensor.id(), "boiler");
    assert_eq!(t.writes(), [vec![0x80, 0xC1]]);

    // Same ratio, PT1000 scaled: still room temperature.
    let c = sensor.temperature().unwrap();
    assert!((c - 25.0).abs() < 1.0, "got {c}");
}

// ── Direct acquisition ────────────────────────────────────────

#[test]
fn temperature_reads_full_block() {
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t.clone(), named("room")).unwrap();
    let c = sensor.temperature().unwrap();
    assert!((c - 25.0).abs() < 1.0, "got {c}");
    assert_eq!(t.log().frames.last().map(Vec::len), Some(9));
}

#[test]
fn faulted_read_clears_and_reports_causes() {
    let t = MockTransfer::scripted(&[POR, OPEN_RTD], ROOM);
    let sensor = Sensor::new(t.clone(), named("f")).unwrap();

    match sensor.temperature() {
        Err(Error::RtdFault(report)) => {
            assert_eq!(report.status, 0x80);
            assert!(report.causes[0].starts_with("Open RTD element"));
        }
        other => panic!("expected RtdFault, got {other:?}"),
    }
    assert_eq!(
        t.writes(),
        [vec![0x80, 0xD1], vec![0x80, 0xD3], vec![0x80, 0xD1]]
    );

    // The device stays usable.
    assert!(sensor.temperature().is_ok());
}

#[test]
fn fault_survives_failed_clear() {
    let t = MockTransfer::scripted(&[POR, OPEN_RTD], ROOM);
    let sensor = Sensor::new(t.clone(), named("wf")).unwrap();
    t.log().fail_writes = true;

    match sensor.temperature() {
        Err(Error::RtdFault(report)) => assert_eq!(report.status, 0x80),
        other => panic!("expected RtdFault, got {other:?}"),
    }
    // The clear pulse was attempted and rejected; restore never ran.
    assert_eq!(t.writes(), [vec![0x80, 0xD1], vec![0x80, 0xD3]]);
}

#[test]
fn transport_failure_surfaces_immediately() {
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t.clone(), named("io")).unwrap();
    t.set_fail(true);
    let frames = t.log().frames.len();
    assert_eq!(sensor.temperature(), Err(Error::Interface(ErrorKind::Other)));
    assert_eq!(t.log().frames.len(), frames + 1, "no retry");
}

// ── Maintenance ───────────────────────────────────────────────

#[test]
fn fault_detect_clean_cycle() {
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t.clone(), named("fd")).unwrap();
    assert_eq!(sensor.fault_detect(), Ok(()));
    assert_eq!(
        t.writes(),
        [vec![0x80, 0xD1], vec![0x80, 0x95], vec![0x80, 0xD1]]
    );
}

#[test]
fn fault_thresholds_written_in_one_frame() {
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t.clone(), named("th")).unwrap();
    sensor.set_fault_thresholds(0x0000, 0x4000).unwrap();
    assert_eq!(t.writes()[1], [0x83, 0x80, 0x00, 0x00, 0x00]);
}

// ── Close ─────────────────────────────────────────────────────

#[test]
fn close_while_idle_releases_transfer_once() {
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t.clone(), named("c")).unwrap();
    sensor.close().unwrap();
    sensor.close().unwrap();
    drop(sensor);
    assert_eq!(t.closes(), 1);
}

#[test]
fn operations_after_close_report_closed() {
    let t = MockTransfer::new(ROOM);
    let sensor = Sensor::new(t, named("c")).unwrap();
    sensor.close().unwrap();
    assert_eq!(sensor.state(), PollState::Stopped);
    assert_eq!(sensor.temperature(), Err(Error::Closed));
    assert_eq!(sensor.fault_detect(), Err(Error::Closed));
    assert_eq!(sensor.set_fault_thresholds(0, 1), Err(Error::Closed));
}

// ── Shared bus ────────────────────────────────────────────────

#[test]
fn sensors_on_one_registered_bus() {
    let t = MockTransfer::scripted(&[POR, POR], ROOM);
    let buses = BusRegistry::new();
    let opener = |_: &str| -> Result<MockTransfer, ErrorKind> { Ok(t.clone()) };

    let a = Sensor::new(buses.open("/dev/spidev0.0", opener).unwrap(), named("a")).unwrap();
    let b = Sensor::new(buses.open("/dev/spidev0.0", opener).unwrap(), named("b")).unwrap();
    assert_eq!(buses.users("/dev/spidev0.0"), 2);

    a.close().unwrap();
    assert_eq!(t.closes(), 0);
    assert!(b.temperature().is_ok());

    b.close().unwrap();
    assert_eq!(t.closes(), 1);
    assert!(buses.is_empty());
}
