// Licensed under the Apache-2.0 license

//! Address/page engine for I2C 24xx serial EEPROMs.
//!
//! Layers, bottom up:
//! - [`common`]: chip geometry table and engine configuration
//! - [`traits`]: the [`EepromBus`] seam the engine drives
//! - [`i2c_bus`] and `linux`: bus implementations
//! - [`engine`]: validation, page chunking and acknowledgement polling
//! - [`io`]: `embedded-io` stream view of an engine
//! - `handle`: thread-safe handle with init/finalize and a last-error latch

pub mod common;
pub mod engine;
pub mod error;
#[cfg(feature = "std")]
pub mod handle;
pub mod i2c_bus;
pub mod io;
#[cfg(feature = "std")]
pub mod linux;
#[cfg(test)]
pub(crate) mod sim;
pub mod traits;

pub use common::{
    AddressWidth, ChipGeometry, ChipModel, EngineConfig, EngineConfigBuilder, WordAddress,
    DEFAULT_I2C_ADDRESS,
};
pub use engine::{Chunk, Eeprom24xEngine, PageChunks, ERASED_BYTE};
pub use error::{error_string, Error, ErrorCode, ErrorSource, ErrorStatus};
#[cfg(feature = "std")]
pub use handle::Eeprom24x;
pub use i2c_bus::{I2cBus, I2cBusError};
pub use io::Eeprom24xCursor;
#[cfg(feature = "std")]
pub use linux::LinuxI2cBus;
pub use traits::{EepromBus, Transfer};
