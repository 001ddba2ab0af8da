//! # Mock dummy structures for doc examples
//!
//! [ExampleSPIBus] emulates the register file and RAM of a controller: written bytes are stored,
//! read commands return what was written before. Reset commands are ignored.
use core::cell::Cell;
use core::convert::Infallible;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};

/// Covers the entire 12 bit address space
const MEMORY_SIZE: usize = 0x1000;

/// TXQ status register
const TXQ_STATUS: usize = 0x054;

pub struct ExampleSPIBus {
    memory: [u8; MEMORY_SIZE],
}

impl Default for ExampleSPIBus {
    fn default() -> Self {
        let mut memory = [0u8; MEMORY_SIZE];

        // TXQ not full
        memory[TXQ_STATUS] = 0x1;

        Self { memory }
    }
}

impl ExampleSPIBus {
    /// Returns the stored bytes starting at the given address
    pub fn memory(&self, address: u16, length: usize) -> &[u8] {
        let start = (address as usize).min(MEMORY_SIZE);
        let end = (start + length).min(MEMORY_SIZE);

        &self.memory[start..end]
    }
}

impl Transfer<u8> for ExampleSPIBus {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        if words.len() < 2 {
            return Ok(words);
        }

        let command = u16::from_be_bytes([words[0], words[1]]);
        let address = (command & 0x0FFF) as usize;

        match command >> 12 {
            // Write
            0b0010 => {
                for (offset, byte) in words[2..].iter().enumerate() {
                    self.memory[(address + offset) % MEMORY_SIZE] = *byte;
                }
            }
            // Read
            0b0011 => {
                for (offset, byte) in words[2..].iter_mut().enumerate() {
                    *byte = self.memory[(address + offset) % MEMORY_SIZE];
                }
            }
            _ => {}
        }

        Ok(words)
    }
}

pub struct ExampleCSPin {}

impl OutputPin for ExampleCSPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Interrupt line, active low
#[derive(Default)]
pub struct ExampleInterruptPin {
    pub pending: bool,
}

impl InputPin for ExampleInterruptPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self.pending)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.pending)
    }
}

/// Microsecond clock advancing by one tick on every read
#[derive(Default, Debug)]
pub struct ExampleClock {
    now: Cell<u64>,
}

impl Clock for ExampleClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        let now = self.now.get();
        self.now.set(now + 1);

        Ok(Instant::new(now))
    }

    fn new_timer<Dur: Duration + FixedPoint>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur> {
        Timer::new(self, duration)
    }
}
