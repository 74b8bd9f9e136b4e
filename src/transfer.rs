//! Byte-transfer channel consumed by the register protocol.
//!
//! The converter speaks full-duplex SPI: every byte shifted out shifts one
//! back in.  [`Transfer`] is the narrow contract the driver needs; anything
//! implementing `embedded_hal::spi::SpiDevice` gets it through
//! [`SpiTransfer`].  Chip-select, bus speed and arbitration stay the
//! implementor's business.

use embedded_hal::spi::{Error as SpiError, SpiDevice};

/// Full-duplex transfer channel to one converter.
pub trait Transfer: Send {
    type Error: SpiError;

    /// Shift `buf` out and replace its contents with the bytes shifted in.
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Release the channel. Called exactly once by the sensor.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<T: Transfer + ?Sized> Transfer for Box<T> {
    type Error = T::Error;

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).transfer_in_place(buf)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

/// Adapter for any `embedded-hal` SPI device (chip-select handled by it).
pub struct SpiTransfer<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiTransfer<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Give the device back.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Transfer for SpiTransfer<SPI>
where
    SPI: SpiDevice + Send,
{
    type Error = SPI::Error;

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer_in_place(buf)
    }
}
