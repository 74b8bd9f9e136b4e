//! Integration test driver for `tests/integration/`.
//!
//! Each `mod` below maps to a file that exercises one area of the driver
//! against mock hardware.  All tests run on the host with no real
//! converter attached.

mod mock_hw;
mod sensor_tests;
