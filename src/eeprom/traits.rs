// Licensed under the Apache-2.0 license

//! # Bus seam for the EEPROM engine
//!
//! The engine never talks to an I2C controller directly. It consumes exactly
//! two primitives, defined by [`EepromBus`]:
//!
//! ```text
//! transact(word address, Transfer::Read(buf))    S addr+W [word address] S addr+R [buf...] P
//! transact(word address, Transfer::Write(data))  S addr+W [word address][data...] P
//! probe()                                        S addr+W P   (zero-length write)
//! ```
//!
//! Implementations are provided for any `embedded_hal::i2c::I2c`
//! ([`I2cBus`](super::i2c_bus::I2cBus)) and, with the `std` feature, for the
//! Linux i2c-dev interface ([`LinuxI2cBus`](super::linux::LinuxI2cBus)).

use core::fmt::Debug;

use super::common::MAX_PAGE_SIZE;

/// Longest write frame: two word-address bytes plus one full page.
pub const MAX_FRAME_LEN: usize = 2 + MAX_PAGE_SIZE;

/// One combined address-plus-data write frame.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Data phase of a bus transaction.
#[derive(Debug)]
pub enum Transfer<'a> {
    /// Sequential read starting at the word address.
    Read(&'a mut [u8]),
    /// Bytes sent immediately after the word address in the same frame.
    Write(&'a [u8]),
}

/// Two-phase addressed transport for a single EEPROM slave.
///
/// # Examples
///
/// ```rust,no_run
/// use eeprom24x::eeprom::{EepromBus, Transfer};
///
/// fn read_first_byte<B: EepromBus>(bus: &mut B) -> Result<u8, B::Error> {
///     let mut byte = [0u8; 1];
///     bus.transact(&[0x00, 0x00], Transfer::Read(&mut byte))?;
///     Ok(byte[0])
/// }
/// ```
pub trait EepromBus {
    type Error: Debug;

    /// Send `address` and run the data phase described by `transfer`.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged. The engine does not retry.
    fn transact(&mut self, address: &[u8], transfer: Transfer<'_>) -> Result<(), Self::Error>;

    /// Zero-length write used for liveness checks and acknowledgement polling.
    ///
    /// # Errors
    ///
    /// Any error means the device did not acknowledge its address. A chip in
    /// its internal write cycle reports this way.
    fn probe(&mut self) -> Result<(), Self::Error>;
}

impl<T: EepromBus + ?Sized> EepromBus for &mut T {
    type Error = T::Error;

    fn transact(&mut self, address: &[u8], transfer: Transfer<'_>) -> Result<(), Self::Error> {
        T::transact(self, address, transfer)
    }

    fn probe(&mut self) -> Result<(), Self::Error> {
        T::probe(self)
    }
}

/// Payload did not fit in a [`Frame`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("write frame of {len} bytes exceeds {MAX_FRAME_LEN}")]
pub struct FrameOverflow {
    pub len: usize,
}

/// Build the combined write frame `address ++ payload`.
///
/// # Errors
///
/// Returns [`FrameOverflow`] if the frame would exceed [`MAX_FRAME_LEN`].
pub fn write_frame(address: &[u8], payload: &[u8]) -> Result<Frame, FrameOverflow> {
    let overflow = FrameOverflow {
        len: address.len() + payload.len(),
    };
    let mut frame = Frame::new();
    frame.extend_from_slice(address).map_err(|()| overflow)?;
    frame.extend_from_slice(payload).map_err(|()| overflow)?;
    Ok(frame)
}
