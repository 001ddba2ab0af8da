//!# SPI transport
//! Both controllers share one SPI bus and are addressed by their own chip select line.
//! [SpiBus] bundles the bus, the two chip select pins and a clock used for the chip select
//! recovery time.
//!
//!```
//!# use mcp2517_dual::bus::{ChannelId, SpiBus};
//!# use mcp2517_dual::example::*;
//!#
//! let bus = SpiBus::new(
//!     ExampleSPIBus::default(),
//!     ExampleCSPin {},
//!     ExampleCSPin {},
//!     ExampleClock::default(),
//! );
//!
//! // Any selector above 1 addresses the second controller
//! assert_eq!(ChannelId::Two, ChannelId::from(2));
//!```
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::Microseconds;
use embedded_time::fraction::Fraction;
use embedded_time::Clock;
use serde::{Deserialize, Serialize};

/// Minimum time the chip select line stays released between two transactions
pub const CS_RECOVERY_TIME: Microseconds<u32> = Microseconds(1);

/// Controller instance on the shared bus
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelId {
    One,
    Two,
}

impl From<u8> for ChannelId {
    fn from(selector: u8) -> Self {
        if selector <= 1 {
            Self::One
        } else {
            Self::Two
        }
    }
}

/// SPI instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Reset = 0b0000,
    Write = 0b0010,
    Read = 0b0011,
}

/// Packs the 4 bit instruction and the 12 bit address into the two byte command header
pub fn command_header(operation: Operation, address: u16) -> [u8; 2] {
    let command = (address & 0x0FFF) | ((operation as u16) << 12);

    [(command >> 8) as u8, (command & 0xFF) as u8]
}

/// Byte exchange with chip select control
pub trait Transport {
    type Error;

    /// Drives the chip select line of the given channel low
    fn select(&mut self, channel: ChannelId) -> Result<(), Self::Error>;

    /// Releases the chip select line of the given channel.
    /// Returns not before the chip select recovery time elapsed.
    fn deselect(&mut self, channel: ChannelId) -> Result<(), Self::Error>;

    /// Full duplex exchange, returns the bytes clocked in
    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error>;
}

/// Errors of the SPI bus or the chip select pins
#[derive(Debug, PartialEq)]
pub enum BusError<B, CS> {
    /// SPI transfer failed
    TransferError(B),
    /// Setting a chip select pin failed
    CSError(CS),
    /// Clock failed while waiting for the chip select recovery time
    ClockError,
}

impl<B, CS> From<embedded_time::clock::Error> for BusError<B, CS> {
    fn from(_error: embedded_time::clock::Error) -> Self {
        BusError::ClockError
    }
}

/// SPI bus shared by two controllers
pub struct SpiBus<B, CS1, CS2, CLK> {
    bus: B,

    /// Chip select of channel one
    pin_cs1: CS1,

    /// Chip select of channel two
    pin_cs2: CS2,

    clock: CLK,
}

impl<B, CS1, CS2, CLK> SpiBus<B, CS1, CS2, CLK> {
    pub fn new(bus: B, pin_cs1: CS1, pin_cs2: CS2, clock: CLK) -> Self {
        Self {
            bus,
            pin_cs1,
            pin_cs2,
            clock,
        }
    }

    /// Returns the owned peripherals
    pub fn release(self) -> (B, CS1, CS2, CLK) {
        (self.bus, self.pin_cs1, self.pin_cs2, self.clock)
    }
}

impl<B, CS1, CS2, CLK> SpiBus<B, CS1, CS2, CLK>
where
    B: Transfer<u8>,
    CS1: OutputPin,
    CS2: OutputPin<Error = CS1::Error>,
    CLK: Clock,
{
    /// Busy waits for at least [CS_RECOVERY_TIME].
    /// Returns once more than the rounded up number of ticks passed, so a partial first tick is never counted.
    fn wait_recovery(&self) -> Result<(), BusError<B::Error, CS1::Error>> {
        let ticks = CLK::T::from(recovery_ticks(CLK::SCALING_FACTOR));
        let start = self.clock.try_now()?;

        loop {
            let elapsed = self
                .clock
                .try_now()?
                .checked_duration_since(&start)
                .ok_or(BusError::ClockError)?;

            if elapsed.integer() > ticks {
                return Ok(());
            }
        }
    }
}

/// [CS_RECOVERY_TIME] in ticks of a clock with the given tick period, rounded up to at least one tick
fn recovery_ticks(scaling_factor: Fraction) -> u32 {
    let tick_period = *scaling_factor.numerator() as u64 * 1_000_000;
    let recovery = CS_RECOVERY_TIME.0 as u64 * *scaling_factor.denominator() as u64;

    let ticks = (recovery + tick_period - 1) / tick_period;

    u32::try_from(ticks.max(1)).unwrap_or(u32::MAX)
}

impl<B, CS1, CS2, CLK> Transport for SpiBus<B, CS1, CS2, CLK>
where
    B: Transfer<u8>,
    CS1: OutputPin,
    CS2: OutputPin<Error = CS1::Error>,
    CLK: Clock,
{
    type Error = BusError<B::Error, CS1::Error>;

    fn select(&mut self, channel: ChannelId) -> Result<(), Self::Error> {
        match channel {
            ChannelId::One => self.pin_cs1.set_low(),
            ChannelId::Two => self.pin_cs2.set_low(),
        }
        .map_err(BusError::CSError)
    }

    fn deselect(&mut self, channel: ChannelId) -> Result<(), Self::Error> {
        match channel {
            ChannelId::One => self.pin_cs1.set_high(),
            ChannelId::Two => self.pin_cs2.set_high(),
        }
        .map_err(BusError::CSError)?;

        self.wait_recovery()
    }

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        let received = self.bus.transfer(words).map_err(BusError::TransferError)?;

        Ok(received)
    }
}
