// Licensed under the Apache-2.0 license

//! [`EepromBus`] over the Linux i2c-dev interface (`/dev/i2c-N`).

use std::io;
use std::path::{Path, PathBuf};

use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::debug;

use super::common::{ChipModel, EngineConfig};
use super::engine::Eeprom24xEngine;
use super::error::Error;
use super::traits::{write_frame, EepromBus, Transfer};
use crate::common::StdDelay;

/// An open i2c-dev file bound to one slave address.
///
/// The file is closed when the bus is dropped.
pub struct LinuxI2cBus {
    device: LinuxI2CDevice,
    address: u8,
    path: PathBuf,
}

impl LinuxI2cBus {
    /// Open `path` and select slave `address` (`I2C_SLAVE`).
    ///
    /// # Errors
    ///
    /// Returns the OS error if the device file cannot be opened or the slave
    /// address cannot be set.
    pub fn open(path: impl AsRef<Path>, address: u8) -> Result<Self, LinuxI2CError> {
        let path = path.as_ref();
        let device = LinuxI2CDevice::new(path, u16::from(address))?;
        debug!("opened {} for slave {address:#04x}", path.display());
        Ok(Self {
            device,
            address,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EepromBus for LinuxI2cBus {
    type Error = LinuxI2CError;

    fn transact(&mut self, address: &[u8], transfer: Transfer<'_>) -> Result<(), Self::Error> {
        match transfer {
            Transfer::Read(buffer) => {
                self.device.write(address)?;
                self.device.read(buffer)
            }
            Transfer::Write(payload) => {
                let frame = write_frame(address, payload)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                // i2c-dev returns the full count or an error, never a short write.
                self.device.write(&frame)
            }
        }
    }

    /// SMBus quick write: the slave address with the write bit and no data.
    fn probe(&mut self) -> Result<(), Self::Error> {
        self.device.smbus_write_quick(false)
    }
}

impl Drop for LinuxI2cBus {
    fn drop(&mut self) {
        debug!("closing {}", self.path.display());
    }
}

impl Eeprom24xEngine<LinuxI2cBus, StdDelay> {
    /// Open `i2c_dev`, bind slave `i2c_address` and check that a `model`
    /// chip answers there.
    ///
    /// # Errors
    ///
    /// [`Error::NotSupported`] before the device is opened, [`Error::Open`]
    /// if the device cannot be opened, otherwise as for
    /// [`Eeprom24xEngine::new`].
    pub fn open(
        model: ChipModel,
        i2c_address: u8,
        i2c_dev: impl AsRef<Path>,
        config: EngineConfig,
    ) -> Result<Self, Error<LinuxI2CError>> {
        if !model.geometry().block_addressing_supported {
            return Err(Error::NotSupported(model));
        }
        let bus = LinuxI2cBus::open(i2c_dev, i2c_address).map_err(Error::Open)?;
        Self::new(model, bus, StdDelay, config)
    }
}
