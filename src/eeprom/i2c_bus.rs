// Licensed under the Apache-2.0 license

//! [`EepromBus`] over any embedded-hal I2C master.
//!
//! Lets the engine run on every HAL that implements `embedded_hal::i2c::I2c`,
//! bare-metal controllers and bus simulators alike.

use embedded_hal::i2c::{I2c, SevenBitAddress};

use super::traits::{write_frame, EepromBus, FrameOverflow, Transfer};

#[derive(Debug, thiserror::Error)]
pub enum I2cBusError<E> {
    #[error("i2c transfer failed: {0:?}")]
    I2c(E),
    #[error(transparent)]
    FrameOverflow(#[from] FrameOverflow),
}

pub struct I2cBus<I> {
    i2c: I,
    address: SevenBitAddress,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    #[must_use]
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.i2c
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> EepromBus for I2cBus<I> {
    type Error = I2cBusError<I::Error>;

    fn transact(&mut self, address: &[u8], transfer: Transfer<'_>) -> Result<(), Self::Error> {
        match transfer {
            Transfer::Read(buffer) => {
                self.i2c
                    .write(self.address, address)
                    .map_err(I2cBusError::I2c)?;
                self.i2c
                    .read(self.address, buffer)
                    .map_err(I2cBusError::I2c)
            }
            Transfer::Write(payload) => {
                let frame = write_frame(address, payload)?;
                self.i2c
                    .write(self.address, &frame)
                    .map_err(I2cBusError::I2c)
            }
        }
    }

    fn probe(&mut self) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[]).map_err(I2cBusError::I2c)
    }
}
