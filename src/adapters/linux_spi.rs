//! Linux `spidev` transfer channel.
//!
//! Opens the character device at 5 MHz, SPI mode 1, 8 bits per word (the
//! converter samples on the falling edge and accepts CPHA=1 in either
//! polarity).  Chip-select is driven by the kernel for each transfer.

use std::io;

use embedded_hal::spi::ErrorKind;
use log::{info, warn};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::transfer::Transfer;

pub const SPI_SPEED_HZ: u32 = 5_000_000;
pub const SPI_BITS_PER_WORD: u8 = 8;

pub struct LinuxSpi {
    path: String,
    spi: Option<Spidev>,
}

impl LinuxSpi {
    /// Open and configure `path`, e.g. `/dev/spidev0.0`.
    pub fn open(path: &str) -> io::Result<Self> {
        let mut spi = Spidev::open(path)?;
        spi.configure(
            &SpidevOptions::new()
                .bits_per_word(SPI_BITS_PER_WORD)
                .max_speed_hz(SPI_SPEED_HZ)
                .mode(SpiModeFlags::SPI_MODE_1)
                .build(),
        )?;
        info!("spidev {}: opened ({} Hz, mode 1)", path, SPI_SPEED_HZ);
        Ok(Self {
            path: path.to_owned(),
            spi: Some(spi),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transfer for LinuxSpi {
    type Error = ErrorKind;

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        let Some(spi) = self.spi.as_mut() else {
            return Err(ErrorKind::Other);
        };
        let mut transfer = SpidevTransfer::read_write_in_place(buf);
        spi.transfer(&mut transfer).map_err(|e| {
            warn!("spidev {}: {}", self.path, e);
            ErrorKind::Other
        })
    }

    fn close(&mut self) -> Result<(), ErrorKind> {
        if self.spi.take().is_some() {
            info!("spidev {}: closed", self.path);
        }
        Ok(())
    }
}
