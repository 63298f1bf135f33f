// Licensed under the Apache-2.0 license

//! `embedded-io` stream view of an EEPROM.

use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};

use super::engine::Eeprom24xEngine;
use super::error::Error;
use super::traits::EepromBus;

/// Seekable byte stream over the whole chip.
///
/// Reads and writes stop at the end of the chip with a short count. At the
/// end, reads return `Ok(0)` and non-empty writes fail with
/// [`Error::InvalidAddress`].
pub struct Eeprom24xCursor<'a, B, D> {
    engine: &'a mut Eeprom24xEngine<B, D>,
    position: u32,
}

impl<'a, B: EepromBus, D: DelayNs> Eeprom24xCursor<'a, B, D> {
    pub(crate) fn new(engine: &'a mut Eeprom24xEngine<B, D>) -> Self {
        Self {
            engine,
            position: 0,
        }
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    fn remaining(&self) -> usize {
        self.engine.capacity().saturating_sub(self.position) as usize
    }
}

impl<B: EepromBus, D: DelayNs> ErrorType for Eeprom24xCursor<'_, B, D> {
    type Error = Error<B::Error>;
}

impl<B: EepromBus, D: DelayNs> Read for Eeprom24xCursor<'_, B, D> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = buf.len().min(self.remaining());
        let (head, _) = buf.split_at_mut(len);
        self.engine.read(self.position, head)?;
        self.position += len as u32;
        Ok(len)
    }
}

impl<B: EepromBus, D: DelayNs> Write for Eeprom24xCursor<'_, B, D> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !buf.is_empty() && self.remaining() == 0 {
            return Err(Error::InvalidAddress {
                address: self.position,
                len: buf.len(),
                capacity: self.engine.capacity(),
            });
        }
        let len = buf.len().min(self.remaining());
        let (head, _) = buf.split_at(len);
        self.engine.write(self.position, head)?;
        self.position += len as u32;
        Ok(len)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<B: EepromBus, D: DelayNs> Seek for Eeprom24xCursor<'_, B, D> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let capacity = i64::from(self.engine.capacity());
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            SeekFrom::End(delta) => capacity.saturating_add(delta),
            SeekFrom::Current(delta) => i64::from(self.position).saturating_add(delta),
        };
        if !(0..=capacity).contains(&target) {
            return Err(Error::InvalidArgument("seek outside chip"));
        }
        self.position = target as u32;
        Ok(target as u64)
    }
}
