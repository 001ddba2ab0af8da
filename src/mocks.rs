use crate::bus::{ChannelId, Operation, Transport};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};
use mockall::mock;

/// Size of the emulated address space of each controller
const MEMORY_SIZE: usize = 0x1000;

/// Returns the scripted instants first.
/// Afterwards it fails, or advances by one tick per call if free running.
#[derive(Debug)]
pub struct TestClock {
    pub next_instants: RefCell<Vec<u64>>,
    free_running: bool,
    now: Cell<u64>,
}

impl TestClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
            free_running: false,
            now: Cell::new(0),
        }
    }

    pub fn free_running() -> Self {
        Self {
            free_running: true,
            ..Self::new(vec![])
        }
    }

    fn next_tick(&self) -> Result<u64, Error> {
        if !self.next_instants.borrow().is_empty() {
            let next = self.next_instants.borrow_mut().remove(0);
            self.now.set(next);
            return Ok(next);
        }

        if !self.free_running {
            return Err(Error::Unspecified);
        }

        self.now.set(self.now.get() + 1);
        Ok(self.now.get())
    }
}

impl Clock for TestClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        Ok(Instant::new(self.next_tick()?))
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

/// [TestClock] with a tick period of one millisecond
#[derive(Debug)]
pub struct TestMillisClock(pub TestClock);

impl Clock for TestMillisClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        Ok(Instant::new(self.0.next_tick()?))
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

mock! {
    pub SPIBus {}

    impl Transfer<u8> for SPIBus{
        type Error = u32;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'static [u8], u32>;
    }
}

mock! {
    pub Pin {}

    impl OutputPin for Pin {
        type Error = u32;

        fn set_low(&mut self) -> Result<(), u32>;
        fn set_high(&mut self) -> Result<(), u32>;
    }
}

mock! {
    pub InterruptPin {}

    impl InputPin for InterruptPin {
        type Error = u32;

        fn is_high(&self) -> Result<bool, u32>;
        fn is_low(&self) -> Result<bool, u32>;
    }
}

/// Single transfer recorded by [FakeTransport]
#[derive(Debug, Clone, PartialEq)]
pub struct Access {
    pub channel: ChannelId,
    pub operation: Operation,
    /// Address of the first data byte
    pub address: u16,
    /// Bytes written or read, without command header
    pub data: Vec<u8>,
    /// Bytes sent on MOSI, without command header
    pub clocked_out: Vec<u8>,
}

/// Emulates register file and RAM of both controllers.
/// Transfers following the first one within a chip select assertion continue at the next address.
pub struct FakeTransport {
    memories: [Vec<u8>; 2],
    selected: Option<ChannelId>,
    /// Operation and address of the next byte within the current chip select assertion
    cursor: Option<(Operation, u16)>,
    /// Byte addresses whose writes are dropped
    ignored: Vec<u16>,
    pub log: Vec<Access>,
    /// Number of select, deselect and transfer calls
    pub calls: usize,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            memories: [vec![0; MEMORY_SIZE], vec![0; MEMORY_SIZE]],
            selected: None,
            cursor: None,
            ignored: vec![],
            log: vec![],
            calls: 0,
        }
    }
}

impl FakeTransport {
    pub fn set_byte(&mut self, channel: ChannelId, address: u16, value: u8) {
        self.memory_mut(channel)[address as usize] = value;
    }

    /// Stores a register value LSB first
    pub fn set_register(&mut self, channel: ChannelId, address: u16, value: u32) {
        self.set_memory(channel, address, &value.to_le_bytes());
    }

    pub fn set_memory(&mut self, channel: ChannelId, address: u16, data: &[u8]) {
        let start = address as usize;
        self.memory_mut(channel)[start..start + data.len()].copy_from_slice(data);
    }

    pub fn register(&self, channel: ChannelId, address: u16) -> u32 {
        let mut value = [0u8; 4];
        value.copy_from_slice(self.memory(channel, address, 4));
        u32::from_le_bytes(value)
    }

    pub fn memory(&self, channel: ChannelId, address: u16, length: usize) -> &[u8] {
        let start = address as usize;
        &self.memories[Self::index(channel)][start..start + length]
    }

    /// Drops all writes to the given register bytes, simulating read only or faulty bits
    pub fn ignore_writes(&mut self, address: u16, length: u16) {
        self.ignored.extend(address..address + length);
    }

    /// Recorded accesses of the given operation
    pub fn accesses(&self, operation: Operation) -> Vec<&Access> {
        self.log.iter().filter(|access| access.operation == operation).collect()
    }

    fn memory_mut(&mut self, channel: ChannelId) -> &mut Vec<u8> {
        &mut self.memories[Self::index(channel)]
    }

    fn index(channel: ChannelId) -> usize {
        match channel {
            ChannelId::One => 0,
            ChannelId::Two => 1,
        }
    }
}

impl Transport for FakeTransport {
    type Error = Infallible;

    fn select(&mut self, channel: ChannelId) -> Result<(), Self::Error> {
        self.calls += 1;

        assert_eq!(None, self.selected, "chip select already asserted");
        self.selected = Some(channel);
        self.cursor = None;

        Ok(())
    }

    fn deselect(&mut self, channel: ChannelId) -> Result<(), Self::Error> {
        self.calls += 1;

        assert_eq!(Some(channel), self.selected, "chip select of other channel asserted");
        self.selected = None;
        self.cursor = None;

        Ok(())
    }

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        self.calls += 1;

        let channel = self.selected.expect("transfer without chip select");

        let (operation, address, data_start) = match self.cursor {
            Some((operation, address)) => (operation, address, 0),
            None => {
                let command = u16::from_be_bytes([words[0], words[1]]);
                let operation = match command >> 12 {
                    0b0010 => Operation::Write,
                    0b0011 => Operation::Read,
                    _ => Operation::Reset,
                };

                (operation, command & 0x0FFF, 2)
            }
        };

        let clocked_out = words[data_start..].to_vec();

        for (offset, byte) in words[data_start..].iter_mut().enumerate() {
            let target = address.wrapping_add(offset as u16) & 0x0FFF;

            match operation {
                Operation::Write if !self.ignored.contains(&target) => {
                    self.memory_mut(channel)[target as usize] = *byte;
                }
                Operation::Read => *byte = self.memories[Self::index(channel)][target as usize],
                _ => {}
            }
        }

        let length = (words.len() - data_start) as u16;
        self.cursor = Some((operation, address.wrapping_add(length) & 0x0FFF));

        self.log.push(Access {
            channel,
            operation,
            address,
            data: words[data_start..].to_vec(),
            clocked_out,
        });

        Ok(words)
    }
}
