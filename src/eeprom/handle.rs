// Licensed under the Apache-2.0 license

//! Thread-safe EEPROM handle with an explicit init/finalize lifecycle.
//!
//! [`Eeprom24x`] owns at most one [`Eeprom24xEngine`] behind a mutex. The
//! lock is held for a whole logical operation, acknowledgement polling
//! included, so concurrent callers never interleave bus traffic. Every
//! failure is also latched into a last-error record that can be read once.
//!
//! ```no_run
//! use eeprom24x::eeprom::{ChipModel, Eeprom24x};
//!
//! static EEPROM: Eeprom24x = Eeprom24x::new();
//!
//! EEPROM.initialize(ChipModel::Eeprom64Kbit, 0x50, "/dev/i2c-1")?;
//! EEPROM.write(0x100, b"serial:0042")?;
//! let serial = EEPROM.read(0x100, 11)?;
//! EEPROM.finalize()?;
//! # Ok::<(), eeprom24x::eeprom::Error<i2cdev::linux::LinuxI2CError>>(())
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use i2cdev::linux::LinuxI2CError;
use log::{debug, warn};

use super::common::{ChipGeometry, ChipModel, EngineConfig};
use super::engine::Eeprom24xEngine;
use super::error::{Error, ErrorCode, ErrorSource, ErrorStatus};
use super::linux::LinuxI2cBus;
use super::traits::EepromBus;
use crate::common::StdDelay;

const NO_ERROR: ErrorStatus = ErrorStatus {
    source: ErrorSource::Internal,
    code: ErrorCode::NoError,
};

// Operations never leave partial state in the slot, so a poisoned lock is
// still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Eeprom24x<B = LinuxI2cBus, D = StdDelay> {
    slot: Mutex<Option<Eeprom24xEngine<B, D>>>,
    last_error: Mutex<ErrorStatus>,
}

impl<B, D> Default for Eeprom24x<B, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, D> Eeprom24x<B, D> {
    /// An uninitialized handle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            last_error: Mutex::new(NO_ERROR),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Return the first error latched since the previous call and clear it.
    pub fn last_error(&self) -> ErrorStatus {
        core::mem::replace(&mut *lock(&self.last_error), NO_ERROR)
    }

    fn latch(&self, status: ErrorStatus) {
        let mut last = lock(&self.last_error);
        if !last.is_error() {
            *last = status;
        }
    }
}

impl<B: EepromBus, D: DelayNs> Eeprom24x<B, D> {
    /// Move a bus into the handle and bring the chip up.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyInitialized`] if the handle already holds an engine,
    /// otherwise as for [`Eeprom24xEngine::new`]. The bus is dropped on
    /// failure.
    pub fn initialize_with(
        &self,
        model: ChipModel,
        bus: B,
        delay: D,
        config: EngineConfig,
    ) -> Result<(), Error<B::Error>> {
        self.install(|| Eeprom24xEngine::new(model, bus, delay, config))
    }

    fn install(
        &self,
        open: impl FnOnce() -> Result<Eeprom24xEngine<B, D>, Error<B::Error>>,
    ) -> Result<(), Error<B::Error>> {
        let mut slot = lock(&self.slot);
        let result = if slot.is_some() {
            Err(Error::AlreadyInitialized)
        } else {
            guarded("initialize", open).map(|engine| *slot = Some(engine))
        };
        drop(slot);
        self.record("initialize", result)
    }

    /// Release the engine and close the bus.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if there is nothing to release.
    pub fn finalize(&self) -> Result<(), Error<B::Error>> {
        let engine = lock(&self.slot).take();
        let result = match engine {
            Some(engine) => {
                drop(engine.release());
                Ok(())
            }
            None => Err(Error::NotInitialized),
        };
        self.record("finalize", result)
    }

    /// Read `len` bytes starting at `address`.
    pub fn read(&self, address: u32, len: usize) -> Result<Vec<u8>, Error<B::Error>> {
        self.with_engine("read", |engine| {
            engine.validate(address, len)?;
            let mut data = vec![0u8; len];
            engine.read(address, &mut data)?;
            Ok(data)
        })
    }

    pub fn read_into(&self, address: u32, buffer: &mut [u8]) -> Result<(), Error<B::Error>> {
        self.with_engine("read", |engine| engine.read(address, buffer))
    }

    pub fn write(&self, address: u32, data: &[u8]) -> Result<(), Error<B::Error>> {
        self.with_engine("write", |engine| engine.write(address, data))
    }

    pub fn erase(&self) -> Result<(), Error<B::Error>> {
        self.with_engine("erase", Eeprom24xEngine::erase)
    }

    pub fn read_u8(&self, address: u32) -> Result<u8, Error<B::Error>> {
        self.with_engine("read_u8", |engine| engine.read_u8(address))
    }

    pub fn read_u16(&self, address: u32) -> Result<u16, Error<B::Error>> {
        self.with_engine("read_u16", |engine| engine.read_u16(address))
    }

    pub fn read_u32(&self, address: u32) -> Result<u32, Error<B::Error>> {
        self.with_engine("read_u32", |engine| engine.read_u32(address))
    }

    pub fn write_u8(&self, address: u32, value: u8) -> Result<(), Error<B::Error>> {
        self.with_engine("write_u8", |engine| engine.write_u8(address, value))
    }

    pub fn write_u16(&self, address: u32, value: u16) -> Result<(), Error<B::Error>> {
        self.with_engine("write_u16", |engine| engine.write_u16(address, value))
    }

    pub fn write_u32(&self, address: u32, value: u32) -> Result<(), Error<B::Error>> {
        self.with_engine("write_u32", |engine| engine.write_u32(address, value))
    }

    pub fn geometry(&self) -> Result<ChipGeometry, Error<B::Error>> {
        self.with_engine("geometry", |engine| Ok(*engine.geometry()))
    }

    pub fn model(&self) -> Result<ChipModel, Error<B::Error>> {
        self.with_engine("model", |engine| Ok(engine.model()))
    }

    fn with_engine<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Eeprom24xEngine<B, D>) -> Result<T, Error<B::Error>>,
    ) -> Result<T, Error<B::Error>> {
        let mut slot = lock(&self.slot);
        let result = match slot.as_mut() {
            Some(engine) => guarded(op, || f(engine)),
            None => Err(Error::NotInitialized),
        };
        drop(slot);
        self.record(op, result)
    }

    fn record<T>(
        &self,
        op: &'static str,
        result: Result<T, Error<B::Error>>,
    ) -> Result<T, Error<B::Error>> {
        if let Err(e) = &result {
            debug!("{op} failed: {e}");
            self.latch(e.status());
        }
        result
    }
}

/// Run `f`, turning a panic into [`Error::UnexpectedException`].
fn guarded<T, E>(op: &'static str, f: impl FnOnce() -> Result<T, Error<E>>) -> Result<T, Error<E>> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        warn!("{op} panicked");
        Err(Error::UnexpectedException)
    })
}

impl Eeprom24x<LinuxI2cBus, StdDelay> {
    /// Open `i2c_dev` with default settings and bring up the chip at
    /// `i2c_address`.
    ///
    /// # Errors
    ///
    /// As for [`Self::initialize_with_config`].
    pub fn initialize(
        &self,
        model: ChipModel,
        i2c_address: u8,
        i2c_dev: impl AsRef<Path>,
    ) -> Result<(), Error<LinuxI2CError>> {
        self.initialize_with_config(model, i2c_address, i2c_dev, EngineConfig::default())
    }

    /// # Errors
    ///
    /// [`Error::AlreadyInitialized`] before the device is touched,
    /// [`Error::Open`] if it cannot be opened, otherwise as for
    /// [`Eeprom24xEngine::new`].
    pub fn initialize_with_config(
        &self,
        model: ChipModel,
        i2c_address: u8,
        i2c_dev: impl AsRef<Path>,
        config: EngineConfig,
    ) -> Result<(), Error<LinuxI2CError>> {
        self.install(|| Eeprom24xEngine::open(model, i2c_address, i2c_dev, config))
    }
}
