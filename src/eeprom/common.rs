// Licensed under the Apache-2.0 license

//! Chip geometry and engine configuration for 24xx EEPROMs.
//!
//! The geometry of every supported part is fixed by its datasheet and looked
//! up from [`ChipModel`]. Timing and transfer limits that depend on the host
//! I2C controller rather than the chip live in [`EngineConfig`].

use fugit::MicrosDurationU32;

/// Largest page buffer of any 24xx part in the table (24xx1025 class).
pub const MAX_PAGE_SIZE: usize = 256;

/// Default upper bound for one read transfer. Some i2c-dev controllers time
/// out on longer transfers.
pub const DEFAULT_MAX_TRANSFER_BYTES: usize = 1000;

/// Default interval between acknowledgement polls.
pub const DEFAULT_POLL_INTERVAL: MicrosDurationU32 = MicrosDurationU32::millis(1);

/// Default 7-bit slave address with A0..A2 tied low.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x50;

/// Supported 24xx part sizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChipModel {
    Eeprom128bit,
    Eeprom1Kbit,
    Eeprom2Kbit,
    Eeprom4Kbit,
    Eeprom8Kbit,
    Eeprom16Kbit,
    Eeprom32Kbit,
    Eeprom64Kbit,
    Eeprom128Kbit,
    Eeprom256Kbit,
    Eeprom512Kbit,
    Eeprom1Mbit,
}

impl ChipModel {
    pub const ALL: [ChipModel; 12] = [
        ChipModel::Eeprom128bit,
        ChipModel::Eeprom1Kbit,
        ChipModel::Eeprom2Kbit,
        ChipModel::Eeprom4Kbit,
        ChipModel::Eeprom8Kbit,
        ChipModel::Eeprom16Kbit,
        ChipModel::Eeprom32Kbit,
        ChipModel::Eeprom64Kbit,
        ChipModel::Eeprom128Kbit,
        ChipModel::Eeprom256Kbit,
        ChipModel::Eeprom512Kbit,
        ChipModel::Eeprom1Mbit,
    ];

    /// Datasheet geometry of this part.
    #[must_use]
    pub const fn geometry(self) -> ChipGeometry {
        use AddressWidth::{One, Two};

        // (bytes, address width, page size, write cycle ms, single block)
        let (total_bytes, address_width, page_size_bytes, write_ms, supported) = match self {
            ChipModel::Eeprom128bit => (16, One, 0, 4, true),
            ChipModel::Eeprom1Kbit => (128, One, 8, 5, true),
            ChipModel::Eeprom2Kbit => (256, One, 8, 5, true),
            // Upper address bits go into the slave address on these parts.
            ChipModel::Eeprom4Kbit => (512, One, 16, 5, false),
            ChipModel::Eeprom8Kbit => (1024, One, 16, 5, false),
            ChipModel::Eeprom16Kbit => (2048, One, 16, 5, false),
            ChipModel::Eeprom32Kbit => (4096, Two, 32, 5, true),
            ChipModel::Eeprom64Kbit => (8192, Two, 32, 5, true),
            ChipModel::Eeprom128Kbit => (16384, Two, 64, 5, true),
            ChipModel::Eeprom256Kbit => (32768, Two, 64, 5, true),
            ChipModel::Eeprom512Kbit => (65536, Two, 128, 5, true),
            ChipModel::Eeprom1Mbit => (131_072, Two, 256, 5, false),
        };

        ChipGeometry {
            total_bytes,
            address_width,
            page_size_bytes,
            page_write_time: MicrosDurationU32::millis(write_ms),
            block_addressing_supported: supported,
        }
    }
}

/// Number of word-address bytes sent ahead of data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressWidth {
    One = 1,
    Two = 2,
}

impl AddressWidth {
    #[must_use]
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Word address in bus order, most significant byte first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WordAddress {
    bytes: [u8; 2],
    width: AddressWidth,
}

impl WordAddress {
    /// Encodes the low `width` bytes of `address`.
    #[must_use]
    pub fn new(address: u32, width: AddressWidth) -> Self {
        let [_, _, high, low] = address.to_be_bytes();
        Self {
            bytes: [high, low],
            width,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let (_, tail) = self.bytes.split_at(2 - self.width.bytes());
        tail
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChipGeometry {
    pub total_bytes: u32,
    pub address_width: AddressWidth,
    /// Zero for parts without a page buffer.
    pub page_size_bytes: u32,
    pub page_write_time: MicrosDurationU32,
    pub block_addressing_supported: bool,
}

impl ChipGeometry {
    #[must_use]
    pub const fn is_byte_only(&self) -> bool {
        self.page_size_bytes == 0
    }

    #[must_use]
    pub const fn page_count(&self) -> u32 {
        if self.page_size_bytes == 0 {
            self.total_bytes
        } else {
            self.total_bytes / self.page_size_bytes
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_transfer_bytes: usize,
    pub poll_interval: MicrosDurationU32,
    /// Overrides the datasheet write-cycle time when set.
    pub page_write_time: Option<MicrosDurationU32>,
    pub write_protected: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfigBuilder::new().build()
    }
}

pub struct EngineConfigBuilder {
    max_transfer_bytes: usize,
    poll_interval: MicrosDurationU32,
    page_write_time: Option<MicrosDurationU32>,
    write_protected: bool,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_transfer_bytes: DEFAULT_MAX_TRANSFER_BYTES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_write_time: None,
            write_protected: false,
        }
    }
    #[must_use]
    pub fn max_transfer_bytes(mut self, bytes: usize) -> Self {
        self.max_transfer_bytes = bytes;
        self
    }
    #[must_use]
    pub fn poll_interval(mut self, interval: MicrosDurationU32) -> Self {
        self.poll_interval = interval;
        self
    }
    #[must_use]
    pub fn page_write_time(mut self, time: MicrosDurationU32) -> Self {
        self.page_write_time = Some(time);
        self
    }
    #[must_use]
    pub fn write_protected(mut self, enabled: bool) -> Self {
        self.write_protected = enabled;
        self
    }
    #[must_use]
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            max_transfer_bytes: self.max_transfer_bytes,
            poll_interval: self.poll_interval,
            page_write_time: self.page_write_time,
            write_protected: self.write_protected,
        }
    }
}
