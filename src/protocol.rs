//! Addressed register I/O over a [`Transfer`] channel.
//!
//! Reads shift out the address followed by padding and drop the first
//! returned byte (the byte clocked in while the address went out).
//! Writes shift out `address | WRITE_BIT` followed by the payload; the
//! device auto-increments the address for multi-byte payloads.

use embedded_hal::spi::Error as _;
use heapless::Vec;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::registers::{
    REG_CONFIG, REG_FAULT_STATUS, REG_RTD_LSB, REG_RTD_MSB, REGISTER_COUNT, WRITE_BIT,
};
use crate::transfer::Transfer;

/// Longest single transaction: address byte plus the full register block.
const MAX_FRAME: usize = REGISTER_COUNT + 1;

/// Snapshot of registers 0x00..=0x07.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBlock(pub [u8; REGISTER_COUNT]);

impl RegisterBlock {
    pub fn config(&self) -> u8 {
        self.0[REG_CONFIG as usize]
    }

    pub fn rtd_msb(&self) -> u8 {
        self.0[REG_RTD_MSB as usize]
    }

    pub fn rtd_lsb(&self) -> u8 {
        self.0[REG_RTD_LSB as usize]
    }

    pub fn fault_status(&self) -> u8 {
        self.0[REG_FAULT_STATUS as usize]
    }

    /// Health verdict for a block read straight after power-up.
    pub fn check(&self) -> Result<()> {
        if self.0.iter().all(|b| *b == 0x00) {
            return Err(Error::StuckLow);
        }
        if self.0.iter().all(|b| *b == 0xFF) {
            return Err(Error::StuckHigh);
        }
        Ok(())
    }
}

/// Register-level access to one converter.
pub struct RegisterBus<T> {
    transfer: T,
}

impl<T: Transfer> RegisterBus<T> {
    pub fn new(transfer: T) -> Self {
        Self { transfer }
    }

    /// Write `payload` starting at `address`.
    pub fn write(&mut self, address: u8, payload: &[u8]) -> Result<()> {
        let mut frame: Vec<u8, MAX_FRAME> = Vec::new();
        frame
            .push(address | WRITE_BIT)
            .map_err(|_| Error::Config("register write too long"))?;
        frame
            .extend_from_slice(payload)
            .map_err(|_| Error::Config("register write too long"))?;
        self.exchange(&mut frame)
    }

    /// Read `N` consecutive registers starting at `address`.
    pub fn read<const N: usize>(&mut self, address: u8) -> Result<[u8; N]> {
        let mut frame: Vec<u8, MAX_FRAME> = Vec::new();
        frame
            .resize(N + 1, 0)
            .map_err(|_| Error::Config("register read too long"))?;
        frame[0] = address;
        self.exchange(&mut frame)?;

        let mut out = [0u8; N];
        out.copy_from_slice(&frame[1..]);
        Ok(out)
    }

    /// Read the whole register block in one transaction.
    pub fn read_block(&mut self) -> Result<RegisterBlock> {
        let block = RegisterBlock(self.read::<REGISTER_COUNT>(REG_CONFIG)?);
        debug!("registers: {:02X?}", block.0);
        Ok(block)
    }

    /// Detect a dead or miswired bus before anything is written to it.
    pub fn check_bus(&mut self) -> Result<()> {
        let block = self.read_block()?;
        block.check().inspect_err(|e| warn!("bus health check failed: {}", e))
    }

    /// Write the configuration register.
    pub fn configure(&mut self, value: u8) -> Result<()> {
        self.write(REG_CONFIG, &[value])
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    /// Release the underlying channel.
    pub fn close(&mut self) -> Result<()> {
        self.transfer
            .close()
            .map_err(|e| Error::Interface(e.kind()))
    }

    fn exchange(&mut self, frame: &mut [u8]) -> Result<()> {
        self.transfer.transfer_in_place(frame).map_err(|e| {
            let kind = e.kind();
            warn!("transfer failed: {:?}", kind);
            Error::Interface(kind)
        })
    }
}
