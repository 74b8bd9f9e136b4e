//! Adapters: host-side implementations of the driver's collaborators.
//!
//! | Adapter       | Provides                 | Connects to            |
//! |---------------|--------------------------|------------------------|
//! | `console_log` | `log::Log`               | stderr                 |
//! | `linux_spi`   | `Transfer`               | Linux `spidev` device  |

pub mod console_log;
#[cfg(feature = "linux")]
pub mod linux_spi;
