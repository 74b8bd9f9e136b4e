//! Fuzz target: `Device` against an arbitrary bus
//!
//! Every byte the converter would shift back comes from the fuzz input, so
//! construction, acquisition and fault-detect see garbage, short reads and
//! transport errors.  The driver must surface them as errors, never panic.
//!
//! cargo fuzz run fuzz_device

#![no_main]

use embedded_hal::spi::ErrorKind;
use libfuzzer_sys::fuzz_target;
use max31865::DeviceConfig;
use max31865::device::Device;
use max31865::transfer::Transfer;

struct FuzzBus<'a> {
    data: &'a [u8],
}

impl Transfer for FuzzBus<'_> {
    type Error = ErrorKind;

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        if self.data.len() < buf.len() {
            return Err(ErrorKind::Other);
        }
        let (head, rest) = self.data.split_at(buf.len());
        buf.copy_from_slice(head);
        self.data = rest;
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut device) = Device::new(FuzzBus { data }, &DeviceConfig::default()) else {
        return;
    };
    for _ in 0..4 {
        let _ = device.temperature();
        let _ = device.fault_detect();
    }
    let _ = device.close();
});
