// Licensed under the Apache-2.0 license

//! Simulated 24xx chip on an `embedded_hal` I2C bus, for tests.
//!
//! Behaves like the real part where the engine depends on it:
//! - a write frame sets the word address and loads data into the page latch,
//!   wrapping inside the page as the datasheet describes
//! - after a data write the chip NACKs its address until the write cycle has
//!   elapsed on the simulated clock
//! - reads are sequential from the current word address
//!
//! Time only moves when [`SimDelay`] sleeps.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use super::common::ChipModel;
use super::engine::ERASED_BYTE;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    Probe { acked: bool },
    SetAddress { address: u32 },
    Write { address: u32, len: usize },
    Read { address: u32, len: usize },
    Fault,
}

struct SimState {
    memory: Vec<u8>,
    address_bytes: usize,
    page_size: usize,
    write_time_us: u64,
    now_us: u64,
    busy_until_us: u64,
    pointer: usize,
    events: Vec<SimEvent>,
    hold_busy: bool,
    fail_transfers: bool,
}

impl SimState {
    fn busy(&self) -> bool {
        self.now_us < self.busy_until_us
    }

    /// A held chip still accepts data frames but never finishes its write cycle.
    fn acks_probe(&self) -> bool {
        !self.hold_busy && !self.busy()
    }

    fn write_frame(&mut self, frame: &[u8]) {
        let (word, data) = frame.split_at(self.address_bytes.min(frame.len()));
        let address = word.iter().fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
        self.pointer = address % self.memory.len();

        if data.is_empty() {
            self.events.push(SimEvent::SetAddress {
                address: self.pointer as u32,
            });
            return;
        }

        self.events.push(SimEvent::Write {
            address: self.pointer as u32,
            len: data.len(),
        });
        let page = self.page_size.max(1);
        let page_start = self.pointer - self.pointer % page;
        for (i, byte) in data.iter().enumerate() {
            let offset = (self.pointer - page_start + i) % page;
            self.memory[page_start + offset] = *byte;
        }
        self.busy_until_us = self.now_us + self.write_time_us;
    }

    fn read_into(&mut self, buffer: &mut [u8]) {
        self.events.push(SimEvent::Read {
            address: self.pointer as u32,
            len: buffer.len(),
        });
        for byte in buffer.iter_mut() {
            *byte = self.memory[self.pointer];
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
    }
}

/// Shared handle; clones see the same chip.
#[derive(Clone)]
pub struct SimEeprom {
    state: Arc<Mutex<SimState>>,
}

impl SimEeprom {
    pub const ADDRESS: SevenBitAddress = 0x50;

    pub fn new(model: ChipModel) -> Self {
        let geometry = model.geometry();
        let state = SimState {
            memory: vec![ERASED_BYTE; geometry.total_bytes as usize],
            address_bytes: geometry.address_width.bytes(),
            page_size: geometry.page_size_bytes as usize,
            write_time_us: u64::from(geometry.page_write_time.to_micros()),
            now_us: 0,
            busy_until_us: 0,
            pointer: 0,
            events: Vec::new(),
            hold_busy: false,
            fail_transfers: false,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            state: Arc::clone(&self.state),
        }
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.lock().events.clone()
    }

    pub fn writes(&self) -> Vec<SimEvent> {
        self.filtered(|e| matches!(e, SimEvent::Write { .. }))
    }

    pub fn reads(&self) -> Vec<SimEvent> {
        self.filtered(|e| matches!(e, SimEvent::Read { .. }))
    }

    fn filtered(&self, keep: impl Fn(&SimEvent) -> bool) -> Vec<SimEvent> {
        self.lock().events.iter().copied().filter(|e| keep(e)).collect()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    pub fn memory(&self) -> Vec<u8> {
        self.lock().memory.clone()
    }

    pub fn now_us(&self) -> u64 {
        self.lock().now_us
    }

    /// Keep NACKing probes as if the write cycle never ends. Data frames are
    /// still accepted.
    pub fn hold_busy(&self, enabled: bool) {
        self.lock().hold_busy = enabled;
    }

    /// Fail every data transfer with a bus error. Probes are unaffected.
    pub fn fail_transfers(&self, enabled: bool) {
        self.lock().fail_transfers = enabled;
    }
}

impl ErrorType for SimEeprom {
    type Error = ErrorKind;
}

impl I2c for SimEeprom {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.lock();
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);

        let is_probe = matches!(&*operations, [Operation::Write(bytes)] if bytes.is_empty());
        if is_probe {
            let acked = address == Self::ADDRESS && state.acks_probe();
            state.events.push(SimEvent::Probe { acked });
            return if acked { Ok(()) } else { Err(nack) };
        }

        if address != Self::ADDRESS || state.busy() {
            return Err(nack);
        }
        if state.fail_transfers {
            state.events.push(SimEvent::Fault);
            return Err(ErrorKind::Bus);
        }

        for op in operations {
            match op {
                Operation::Write(frame) => state.write_frame(frame),
                Operation::Read(buffer) => state.read_into(buffer),
            }
        }
        Ok(())
    }
}

pub struct SimDelay {
    state: Arc<Mutex<SimState>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.lock().unwrap().now_us += u64::from(ns).div_ceil(1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.state.lock().unwrap().now_us += u64::from(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_write_wraps_inside_page() {
        let mut sim = SimEeprom::new(ChipModel::Eeprom2Kbit);
        sim.write(SimEeprom::ADDRESS, &[6, 0xa, 0xb, 0xc]).unwrap();

        let memory = sim.memory();
        assert_eq!(memory[6..8], [0xa, 0xb]);
        assert_eq!(memory[0], 0xc);
        assert_eq!(memory[8], ERASED_BYTE);
    }

    #[test]
    fn test_busy_until_write_cycle_elapses() {
        let mut sim = SimEeprom::new(ChipModel::Eeprom64Kbit);
        let mut delay = sim.delay();
        sim.write(SimEeprom::ADDRESS, &[0, 0, 1]).unwrap();

        assert!(sim.write(SimEeprom::ADDRESS, &[]).is_err());
        delay.delay_ms(5);
        assert!(sim.write(SimEeprom::ADDRESS, &[]).is_ok());
    }

    #[test]
    fn test_held_chip_accepts_data_but_never_acks() {
        let mut sim = SimEeprom::new(ChipModel::Eeprom64Kbit);
        let mut delay = sim.delay();
        sim.hold_busy(true);

        sim.write(SimEeprom::ADDRESS, &[0, 0, 1]).unwrap();
        delay.delay_ms(50);
        assert!(sim.write(SimEeprom::ADDRESS, &[]).is_err());
        assert_eq!(sim.memory()[0], 1);

        sim.hold_busy(false);
        assert!(sim.write(SimEeprom::ADDRESS, &[]).is_ok());
    }

    #[test]
    fn test_random_read() {
        let mut sim = SimEeprom::new(ChipModel::Eeprom64Kbit);
        let mut delay = sim.delay();
        sim.write(SimEeprom::ADDRESS, &[0x01, 0x00, 1, 2, 3]).unwrap();
        delay.delay_ms(5);

        let mut buffer = [0u8; 3];
        sim.write_read(SimEeprom::ADDRESS, &[0x01, 0x00], &mut buffer)
            .unwrap();
        assert_eq!(buffer, [1, 2, 3]);
    }
}
