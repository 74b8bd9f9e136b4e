//! Fuzz target: register block decoding
//!
//! Treats each 8-byte chunk as a register snapshot and runs it through the
//! health check, ratio extraction, fault decoding and conversion.  None of
//! them may panic and a clean sample must convert to a finite value.
//!
//! cargo fuzz run fuzz_register_block

#![no_main]

use libfuzzer_sys::fuzz_target;
use max31865::config::WiringMode;
use max31865::fault;
use max31865::protocol::RegisterBlock;
use max31865::rtd::{self, RtdSample};

fuzz_target!(|data: &[u8]| {
    for chunk in data.chunks_exact(8) {
        let mut regs = [0u8; 8];
        regs.copy_from_slice(chunk);
        let block = RegisterBlock(regs);
        let _ = block.check();

        let sample = RtdSample::from_registers(block.rtd_msb(), block.rtd_lsb());
        if sample.faulted {
            for wiring in [WiringMode::TwoWire, WiringMode::ThreeWire, WiringMode::FourWire] {
                let report = fault::report(block.fault_status(), wiring);
                assert!(report.causes.len() <= 6);
                assert_eq!(report.status, block.fault_status());
            }
        } else {
            let t = rtd::temperature(sample.raw_ratio, 430.0, 100.0);
            assert!(t.is_finite(), "ratio {} -> {}", sample.raw_ratio, t);
        }
    }
});
