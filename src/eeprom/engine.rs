// Licensed under the Apache-2.0 license

//! Address/page engine for 24xx EEPROMs.
//!
//! Turns byte-addressed read, write and erase requests into bus transactions
//! that respect the chip geometry:
//!
//! - reads are split into blocks of at most `max_transfer_bytes`
//! - writes are split at page boundaries (one byte at a time on parts without
//!   a page buffer) and each chunk is followed by acknowledgement polling
//!   until the internal write cycle has finished
//!
//! Every request is validated against the chip capacity before the first
//! bus transaction. Multi-chunk writes and erase are not atomic; a failure
//! part way leaves earlier chunks written.

use embedded_hal::delay::DelayNs;
use fugit::MicrosDurationU32;
use log::{debug, info, trace, warn};

use super::common::{ChipGeometry, ChipModel, EngineConfig, WordAddress, MAX_PAGE_SIZE};
use super::error::Error;
use super::io::Eeprom24xCursor;
use super::traits::{EepromBus, Transfer};

/// Value of an erased cell.
pub const ERASED_BYTE: u8 = 0xFF;

static ERASED_PAGE: [u8; MAX_PAGE_SIZE] = [ERASED_BYTE; MAX_PAGE_SIZE];

/// One write transaction: `len` bytes starting at `address`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub address: u32,
    pub len: usize,
}

/// Splits `[address, address + len)` into write chunks that never cross a
/// page boundary.
///
/// Parts without a page buffer get one chunk per byte.
#[derive(Clone, Debug)]
pub struct PageChunks {
    next: u32,
    end: u32,
    page_size: u32,
    max_chunk: u32,
}

impl PageChunks {
    #[must_use]
    pub fn new(geometry: &ChipGeometry, max_transfer_bytes: usize, address: u32, len: usize) -> Self {
        let max_chunk = u32::try_from(max_transfer_bytes).unwrap_or(u32::MAX).max(1);
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        Self {
            next: address,
            end: address.saturating_add(len),
            page_size: geometry.page_size_bytes,
            max_chunk,
        }
    }
}

impl Iterator for PageChunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next >= self.end {
            return None;
        }
        let room = match self.page_size {
            0 => 1,
            page => page - self.next % page,
        };
        let len = room.min(self.max_chunk).min(self.end - self.next);
        let chunk = Chunk {
            address: self.next,
            len: len as usize,
        };
        self.next += len;
        Some(chunk)
    }
}

pub struct Eeprom24xEngine<B, D> {
    bus: B,
    delay: D,
    model: ChipModel,
    geometry: ChipGeometry,
    config: EngineConfig,
}

impl<B: EepromBus, D: DelayNs> Eeprom24xEngine<B, D> {
    /// Bind `bus` to a chip of type `model` and check that it answers.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSupported`] for block-addressed parts, before any bus I/O
    /// - [`Error::InvalidArgument`] for a zero transfer size or poll interval
    /// - [`Error::DeviceNotResponding`] if the liveness probe is not acknowledged
    pub fn new(
        model: ChipModel,
        mut bus: B,
        delay: D,
        config: EngineConfig,
    ) -> Result<Self, Error<B::Error>> {
        let geometry = model.geometry();
        if !geometry.block_addressing_supported {
            return Err(Error::NotSupported(model));
        }
        if config.max_transfer_bytes == 0 {
            return Err(Error::InvalidArgument("max_transfer_bytes must be non-zero"));
        }
        if config.poll_interval.ticks() == 0 {
            return Err(Error::InvalidArgument("poll_interval must be non-zero"));
        }

        if let Err(e) = bus.probe() {
            debug!("{model:?}: liveness probe not acknowledged: {e:?}");
            return Err(Error::DeviceNotResponding);
        }

        info!(
            "{model:?} ready: {} bytes, page size {}",
            geometry.total_bytes, geometry.page_size_bytes
        );

        Ok(Self {
            bus,
            delay,
            model,
            geometry,
            config,
        })
    }

    #[must_use]
    pub fn model(&self) -> ChipModel {
        self.model
    }

    #[must_use]
    pub fn geometry(&self) -> &ChipGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.geometry.total_bytes
    }

    /// Write-cycle timeout in effect, config override first.
    #[must_use]
    pub fn page_write_time(&self) -> MicrosDurationU32 {
        self.config
            .page_write_time
            .unwrap_or(self.geometry.page_write_time)
    }

    /// Byte-addressed random access over the whole chip.
    pub fn cursor(&mut self) -> Eeprom24xCursor<'_, B, D> {
        Eeprom24xCursor::new(self)
    }

    /// Hand back the bus and delay, ending the session with the chip.
    pub fn release(self) -> (B, D) {
        debug!("{:?} released", self.model);
        (self.bus, self.delay)
    }

    /// Check that `len` bytes starting at `address` lie inside the chip.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `len` alone exceeds the capacity,
    /// [`Error::InvalidAddress`] if the range runs past the end.
    pub fn validate(&self, address: u32, len: usize) -> Result<(), Error<B::Error>> {
        let capacity = self.geometry.total_bytes;
        if len > capacity as usize {
            return Err(Error::InvalidArgument("length exceeds chip capacity"));
        }
        match (address as usize).checked_add(len) {
            Some(end) if end <= capacity as usize => Ok(()),
            _ => Err(Error::InvalidAddress {
                address,
                len,
                capacity,
            }),
        }
    }

    /// Fill `buffer` with the chip contents starting at `address`.
    ///
    /// # Errors
    ///
    /// Validation errors before any bus I/O, [`Error::Bus`] from the transport.
    pub fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error<B::Error>> {
        self.validate(address, buffer.len())?;

        let mut block_address = address;
        for block in buffer.chunks_mut(self.config.max_transfer_bytes) {
            let word = WordAddress::new(block_address, self.geometry.address_width);
            trace!("read {} bytes at {block_address:#x}", block.len());
            let len = block.len() as u32;
            self.bus
                .transact(word.as_bytes(), Transfer::Read(block))
                .map_err(Error::Bus)?;
            block_address += len;
        }
        Ok(())
    }

    /// Program `data` starting at `address`.
    ///
    /// # Errors
    ///
    /// Validation errors before any bus I/O, [`Error::OperationNotAllowed`] when
    /// write protected, [`Error::Bus`] from the transport and
    /// [`Error::DeviceNotResponding`] if a write cycle does not complete in time.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), Error<B::Error>> {
        self.validate(address, data.len())?;
        self.check_writable()?;

        let mut rest = data;
        for chunk in PageChunks::new(&self.geometry, self.config.max_transfer_bytes, address, data.len()) {
            let (head, tail) = rest.split_at(chunk.len);
            self.write_chunk(chunk.address, head)?;
            rest = tail;
        }
        Ok(())
    }

    /// Set every cell to [`ERASED_BYTE`].
    ///
    /// # Errors
    ///
    /// As for [`Self::write`].
    pub fn erase(&mut self) -> Result<(), Error<B::Error>> {
        self.check_writable()?;
        let capacity = self.geometry.total_bytes;
        debug!("erasing {:?}, {capacity} bytes", self.model);

        // Chunks never exceed a page, so one page of fill covers every chunk.
        let max_chunk = self.config.max_transfer_bytes.min(MAX_PAGE_SIZE);
        for chunk in PageChunks::new(&self.geometry, max_chunk, 0, capacity as usize) {
            let (fill, _) = ERASED_PAGE.split_at(chunk.len);
            self.write_chunk(chunk.address, fill)?;
        }
        Ok(())
    }

    pub fn read_u8(&mut self, address: u32) -> Result<u8, Error<B::Error>> {
        let mut bytes = [0u8; 1];
        self.read(address, &mut bytes)?;
        Ok(u8::from_le_bytes(bytes))
    }

    pub fn read_u16(&mut self, address: u32) -> Result<u16, Error<B::Error>> {
        let mut bytes = [0u8; 2];
        self.read(address, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&mut self, address: u32) -> Result<u32, Error<B::Error>> {
        let mut bytes = [0u8; 4];
        self.read(address, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_u8(&mut self, address: u32, value: u8) -> Result<(), Error<B::Error>> {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_u16(&mut self, address: u32, value: u16) -> Result<(), Error<B::Error>> {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<(), Error<B::Error>> {
        self.write(address, &value.to_le_bytes())
    }

    fn check_writable(&self) -> Result<(), Error<B::Error>> {
        if self.config.write_protected {
            return Err(Error::OperationNotAllowed("EEPROM is write protected"));
        }
        Ok(())
    }

    fn write_chunk(&mut self, address: u32, data: &[u8]) -> Result<(), Error<B::Error>> {
        let word = WordAddress::new(address, self.geometry.address_width);
        trace!("write {} bytes at {address:#x}", data.len());
        self.bus
            .transact(word.as_bytes(), Transfer::Write(data))
            .map_err(Error::Bus)?;
        self.wait_for_write_cycle()
    }

    /// Acknowledgement polling: the chip ignores its address until the
    /// internal write cycle is over.
    fn wait_for_write_cycle(&mut self) -> Result<(), Error<B::Error>> {
        let timeout_us = self.page_write_time().to_micros();
        let poll_us = self.config.poll_interval.to_micros();
        let mut waited_us: u32 = 0;

        loop {
            match self.bus.probe() {
                Ok(()) => {
                    trace!("write cycle done after {waited_us} us");
                    return Ok(());
                }
                Err(e) => trace!("busy: {e:?}"),
            }
            if waited_us >= timeout_us {
                warn!(
                    "{:?} still busy after {waited_us} us, giving up",
                    self.model
                );
                return Err(Error::DeviceNotResponding);
            }
            self.delay.delay_us(poll_us);
            waited_us = waited_us.saturating_add(poll_us);
        }
    }
}
