//!# CAN channel
//! A [Channel] drives one controller on the shared bus. All operations borrow the transport
//! mutably, so transactions of both channels can never overlap.
//!
//!```
//!# use mcp2517_dual::bus::{ChannelId, SpiBus};
//!# use mcp2517_dual::can::Channel;
//!# use mcp2517_dual::config::Configuration;
//!# use mcp2517_dual::example::*;
//!#
//! let mut bus = SpiBus::new(
//!     ExampleSPIBus::default(),
//!     ExampleCSPin {},
//!     ExampleCSPin {},
//!     ExampleClock::default(),
//! );
//!
//! let mut channel = Channel::new(ChannelId::One, ExampleInterruptPin::default());
//!
//! // 500 kbit/s, transmit via TXQ, receive in FIFO 1
//! channel.configure(&mut bus, &Configuration::default()).unwrap();
//!
//! assert!(!channel.check_message().unwrap());
//! ```

use crate::bus::{command_header, ChannelId, Operation, Transport};
use crate::config::{ClockConfiguration, Configuration};
use crate::filter::Filter;
use crate::message::{RxHeader, RxMessage, TxMessage, HEADER_SIZE, MAX_PAYLOAD_CAN_FD, TIMESTAMP_SIZE};
use crate::registers::*;
use crate::status::{OperationStatus, OscillatorStatus};
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use embedded_hal::digital::v2::InputPin;
use log::debug;

/// Size of the SPI command header
const COMMAND_SIZE: usize = 2;

/// Clocked out while streaming message objects, keeps MOSI high
const DUMMY_BYTE: u8 = 0xFF;

/// Fault code reported for bus errors, which have no stage code
const BUS_FAULT_CODE: u8 = 0xFF;

/// Possible errors when accessing message memory
#[derive(Debug, PartialEq)]
pub enum CanError<E> {
    /// Transport error
    BusError(E),
    /// Buffer is configured for transmission
    NotRxFifo,
    /// Buffer is configured for reception
    NotTxFifo,
    /// Receive FIFO holds no message or transmit FIFO holds nothing to send
    FifoEmpty,
    /// Transmit FIFO has no free message object
    FifoFull,
    /// TXQ holds nothing to send
    QueueEmpty,
    /// TXQ has no free message object
    QueueFull,
    /// Message object address outside of RAM
    InvalidRamAddress(u16),
}

/// Initialization stage, each with its own fault code
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitStage {
    Oscillator = 10,
    IoControl = 11,
    NominalBitTime = 101,
    DataBitTime = 102,
    DelayCompensation = 103,
    Timestamp = 105,
    Interrupts = 107,
    TransmitEventFifo = 116,
    TransmitBuffer = 119,
    ReceiveFifo = 122,
    ModeControl = 199,
}

impl InitStage {
    pub fn fault_code(&self) -> u8 {
        *self as u8
    }
}

/// Possible errors during channel initialization
#[derive(Debug, PartialEq)]
pub enum ConfigError<E> {
    /// Transport error
    BusError(E),
    /// Transmit and receive buffer index are equal after clamping
    BufferIndexConflict,
    /// Register read back differs from the written value
    Verification(InitStage),
}

impl<E> ConfigError<E> {
    /// Numeric fault code, bus errors report 0xFF
    pub fn fault_code(&self) -> u8 {
        match self {
            Self::BusError(_) => BUS_FAULT_CODE,
            Self::BufferIndexConflict => 1,
            Self::Verification(stage) => stage.fault_code(),
        }
    }
}

/// Filter programming step, each with its own fault code
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterStage {
    Disable = 11,
    Object = 21,
    Mask = 31,
    Enable = 12,
}

impl FilterStage {
    pub fn fault_code(&self) -> u8 {
        *self as u8
    }
}

/// Possible errors during filter programming
#[derive(Debug, PartialEq)]
pub enum FilterError<E> {
    /// Transport error
    BusError(E),
    /// Register read back differs from the written value
    Verification(FilterStage),
}

impl<E> FilterError<E> {
    /// Numeric fault code, bus errors report 0xFF
    pub fn fault_code(&self) -> u8 {
        match self {
            Self::BusError(_) => BUS_FAULT_CODE,
            Self::Verification(stage) => stage.fault_code(),
        }
    }
}

/// Register bytes addressed by a single access
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ByteSelector {
    /// Single byte 0 (LSB) to 3 (MSB)
    Byte(u8),
    /// All four bytes
    All,
}

impl From<u8> for ByteSelector {
    /// Indices above 3 select the entire register
    fn from(index: u8) -> Self {
        Self::Byte(index).normalized()
    }
}

impl ByteSelector {
    fn normalized(self) -> Self {
        match self {
            Self::Byte(index) if index > 3 => Self::All,
            selector => selector,
        }
    }
}

/// Single write-then-verify step of the initialization program
struct RegisterWrite {
    stage: InitStage,
    address: u16,
    value: u32,
    /// Bytes written and read back
    access: ByteSelector,
    /// Bytes compared after read back
    compared: &'static [ByteSelector],
}

impl RegisterWrite {
    fn register(stage: InitStage, address: u16, value: u32) -> Self {
        Self {
            stage,
            address,
            value,
            access: ByteSelector::All,
            compared: &[ByteSelector::All],
        }
    }
}

/// One controller on the shared bus
pub struct Channel<INT> {
    id: ChannelId,

    /// Interrupt line, active low
    interrupt: INT,

    /// Last written register value, index 0 is the LSB
    write_buffer: [u8; 4],

    /// Last read register value, index 0 is the LSB
    read_buffer: [u8; 4],
}

impl<INT> Channel<INT> {
    pub fn new(id: ChannelId, interrupt: INT) -> Self {
        Self {
            id,
            interrupt,
            write_buffer: [0; 4],
            read_buffer: [0; 4],
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Returns the interrupt pin
    pub fn release(self) -> INT {
        self.interrupt
    }

    /// Register value of the last write
    pub fn write_buffer(&self) -> [u8; 4] {
        self.write_buffer
    }

    /// Register value of the last read, bytes not read are zero
    pub fn read_buffer(&self) -> [u8; 4] {
        self.read_buffer
    }

    /// Compares the selected bytes of the last written and the last read register value
    pub fn verify(&self, selector: ByteSelector) -> bool {
        match selector.normalized() {
            ByteSelector::Byte(index) => self.write_buffer[index as usize] == self.read_buffer[index as usize],
            ByteSelector::All => self.write_buffer == self.read_buffer,
        }
    }

    /// Reads the selected bytes of the register at the given address
    pub fn read_register<T: Transport>(
        &mut self,
        bus: &mut T,
        address: u16,
        selector: ByteSelector,
    ) -> Result<[u8; 4], T::Error> {
        self.read_buffer = [0; 4];

        match selector.normalized() {
            ByteSelector::Byte(index) => {
                let mut buffer = [0u8; COMMAND_SIZE + 1];
                let byte_address = address.wrapping_add(index as u16);
                buffer[..COMMAND_SIZE].copy_from_slice(&command_header(Operation::Read, byte_address));

                let received = self.transaction(bus, &mut buffer)?;
                self.read_buffer[index as usize] = received.get(COMMAND_SIZE).copied().unwrap_or_default();
            }
            ByteSelector::All => {
                let mut buffer = [0u8; COMMAND_SIZE + 4];
                buffer[..COMMAND_SIZE].copy_from_slice(&command_header(Operation::Read, address));

                let received = self.transaction(bus, &mut buffer)?;
                copy_received(&mut self.read_buffer, received, COMMAND_SIZE);
            }
        }

        Ok(self.read_buffer)
    }

    /// Writes the selected bytes of the given register value
    pub fn write_register<T: Transport>(
        &mut self,
        bus: &mut T,
        address: u16,
        selector: ByteSelector,
        value: u32,
    ) -> Result<(), T::Error> {
        self.write_buffer = value.to_le_bytes();

        match selector.normalized() {
            ByteSelector::Byte(index) => {
                let mut buffer = [0u8; COMMAND_SIZE + 1];
                let byte_address = address.wrapping_add(index as u16);
                buffer[..COMMAND_SIZE].copy_from_slice(&command_header(Operation::Write, byte_address));
                buffer[COMMAND_SIZE] = self.write_buffer[index as usize];

                self.transaction(bus, &mut buffer)?;
            }
            ByteSelector::All => {
                let mut buffer = [0u8; COMMAND_SIZE + 4];
                buffer[..COMMAND_SIZE].copy_from_slice(&command_header(Operation::Write, address));
                buffer[COMMAND_SIZE..].copy_from_slice(&self.write_buffer);

                self.transaction(bus, &mut buffer)?;
            }
        }

        Ok(())
    }

    /// Resets all registers to default and enters configuration mode
    pub fn reset<T: Transport>(&mut self, bus: &mut T) -> Result<(), T::Error> {
        let mut buffer = command_header(Operation::Reset, 0);
        self.transaction(bus, &mut buffer)?;

        Ok(())
    }

    /// Resets the controller and runs the verified register program.
    /// Aborts at the first register whose read back differs.
    pub fn configure<T: Transport>(&mut self, bus: &mut T, config: &Configuration) -> Result<(), ConfigError<T::Error>> {
        let tx_buffer = tx_buffer_index(config.tx_buffer);
        let rx_buffer = rx_fifo_index(config.rx_buffer);

        if tx_buffer == rx_buffer {
            debug!("Transmit and receive buffer share index {tx_buffer}");
            return Err(ConfigError::BufferIndexConflict);
        }

        self.reset(bus).map_err(ConfigError::BusError)?;

        for step in Self::register_program(config, tx_buffer, rx_buffer) {
            if !self
                .write_verified(bus, step.address, step.access, step.value, step.compared)
                .map_err(ConfigError::BusError)?
            {
                return Err(ConfigError::Verification(step.stage));
            }
        }

        Ok(())
    }

    /// Installs the filter: disable, filter object, mask, enable. Each step is verified.
    pub fn set_filter<T: Transport>(&mut self, bus: &mut T, filter: &Filter) -> Result<(), FilterError<T::Error>> {
        let control_register = filter_control_register(filter.group);
        let slot = ByteSelector::Byte(filter.slot);
        let control_value = |enabled: bool| (filter.control_byte(enabled) as u32) << (8 * filter.slot);

        let steps = [
            (FilterStage::Disable, control_register, slot, control_value(false)),
            (
                FilterStage::Object,
                filter_object_register(filter.index()),
                ByteSelector::All,
                u32::from(filter.filter_bits),
            ),
            (
                FilterStage::Mask,
                filter_mask_register(filter.index()),
                ByteSelector::All,
                u32::from(filter.mask_bits),
            ),
            (FilterStage::Enable, control_register, slot, control_value(true)),
        ];

        for (stage, address, selector, value) in steps {
            if !self
                .write_verified(bus, address, selector, value, &[selector])
                .map_err(FilterError::BusError)?
            {
                return Err(FilterError::Verification(stage));
            }
        }

        Ok(())
    }

    /// Reads the message object at the head of the given receive FIFO (1-31)
    pub fn read_memory<T: Transport>(&mut self, bus: &mut T, fifo: u8) -> Result<RxMessage, CanError<T::Error>> {
        let fifo = rx_fifo_index(fifo);

        let control = FifoControlReg0::from(self.read_low_byte(bus, fifo_control_register(fifo))?);
        if control.txen() {
            debug!("FIFO {fifo} is configured for transmission");
            return Err(CanError::NotRxFifo);
        }

        let status = FifoStatusReg0::from(self.read_low_byte(bus, fifo_status_register(fifo))?);
        if !status.tfnrfnif() {
            return Err(CanError::FifoEmpty);
        }

        let timestamped = control.rxtsen();
        let prefix_size = HEADER_SIZE + if timestamped { TIMESTAMP_SIZE } else { 0 };
        let address = self.message_address(bus, fifo, prefix_size)?;

        let message = self
            .selected(bus, |bus| stream_rx_object(bus, address, timestamped))
            .map_err(CanError::BusError)?;

        self.increment_head(bus, fifo)?;

        Ok(message)
    }

    /// Loads the message into the TXQ (0) or a transmit FIFO (1-31), without requesting transmission
    pub fn write_memory<T: Transport>(
        &mut self,
        bus: &mut T,
        buffer: u8,
        message: &TxMessage,
    ) -> Result<(), CanError<T::Error>> {
        let buffer = tx_buffer_index(buffer);

        if buffer == TXQ_INDEX {
            let status = TxQueueStatusReg0::from(self.read_low_byte(bus, fifo_status_register(buffer))?);
            if !status.txqnif() {
                return Err(CanError::QueueFull);
            }
        } else {
            self.ensure_tx_fifo(bus, buffer)?;

            let status = FifoStatusReg0::from(self.read_low_byte(bus, fifo_status_register(buffer))?);
            if !status.tfnrfnif() {
                return Err(CanError::FifoFull);
            }
        }

        let object_size = HEADER_SIZE + message.length();
        let address = self.message_address(bus, buffer, object_size)?;

        let mut object = [0u8; COMMAND_SIZE + HEADER_SIZE + MAX_PAYLOAD_CAN_FD];
        object[..COMMAND_SIZE].copy_from_slice(&command_header(Operation::Write, address));
        object[COMMAND_SIZE..COMMAND_SIZE + HEADER_SIZE].copy_from_slice(&message.header_bytes());

        // Payload beyond the buffer is zero padded up to the DLC length
        let payload = message.get_payload();
        let copied = payload.len().min(message.length());
        let payload_start = COMMAND_SIZE + HEADER_SIZE;
        object[payload_start..payload_start + copied].copy_from_slice(&payload[..copied]);

        self.transaction(bus, &mut object[..COMMAND_SIZE + object_size])
            .map_err(CanError::BusError)?;

        self.increment_head(bus, buffer)
    }

    /// Requests transmission of all messages loaded into the TXQ (0) or a transmit FIFO (1-31)
    pub fn start_transmit<T: Transport>(&mut self, bus: &mut T, buffer: u8) -> Result<(), CanError<T::Error>> {
        let buffer = tx_buffer_index(buffer);

        if buffer == TXQ_INDEX {
            let status = TxQueueStatusReg0::from(self.read_low_byte(bus, fifo_status_register(buffer))?);
            if status.txqeif() {
                return Err(CanError::QueueEmpty);
            }
        } else {
            self.ensure_tx_fifo(bus, buffer)?;

            let status = FifoStatusReg0::from(self.read_low_byte(bus, fifo_status_register(buffer))?);
            if status.tferffif() {
                return Err(CanError::FifoEmpty);
            }
        }

        self.write_control_byte1(bus, buffer, FifoControlReg1::new().with_txreq(true))
    }

    /// Reads and returns the operation status
    pub fn read_operation_status<T: Transport>(&mut self, bus: &mut T) -> Result<OperationStatus, CanError<T::Error>> {
        let data = self
            .read_register(bus, REGISTER_C1CON, ByteSelector::Byte(2))
            .map_err(CanError::BusError)?;

        Ok(OperationStatus::from_register(data[2]))
    }

    /// Reads and returns the oscillator status
    pub fn read_oscillator_status<T: Transport>(&mut self, bus: &mut T) -> Result<OscillatorStatus, CanError<T::Error>> {
        let data = self
            .read_register(bus, REGISTER_OSC, ByteSelector::Byte(1))
            .map_err(CanError::BusError)?;

        Ok(OscillatorStatus::from_register(data[1]))
    }

    /// Reads and returns the current clock configuration
    pub fn read_clock_configuration<T: Transport>(
        &mut self,
        bus: &mut T,
    ) -> Result<ClockConfiguration, CanError<T::Error>> {
        let data = self
            .read_register(bus, REGISTER_OSC, ByteSelector::Byte(0))
            .map_err(CanError::BusError)?;

        Ok(ClockConfiguration::from_register(data[0]))
    }

    /// Register program of channel initialization in write order
    fn register_program(config: &Configuration, tx_buffer: u8, rx_buffer: u8) -> [RegisterWrite; 11] {
        [
            RegisterWrite {
                stage: InitStage::Oscillator,
                address: REGISTER_OSC,
                value: config.clock.as_register() as u32,
                access: ByteSelector::Byte(0),
                compared: &[ByteSelector::Byte(0)],
            },
            RegisterWrite {
                compared: &[ByteSelector::Byte(3), ByteSelector::Byte(0)],
                ..RegisterWrite::register(InitStage::IoControl, REGISTER_IOCON, config.io_control_register())
            },
            RegisterWrite::register(
                InitStage::NominalBitTime,
                REGISTER_C1NBTCFG,
                config.bit_rate.nominal_bit_time_register(),
            ),
            RegisterWrite::register(
                InitStage::DataBitTime,
                REGISTER_C1DBTCFG,
                config.bit_rate.data_bit_time_register(),
            ),
            RegisterWrite::register(InitStage::DelayCompensation, REGISTER_C1TDC, config.tdc_register()),
            RegisterWrite::register(InitStage::Timestamp, REGISTER_C1TSCON, config.timestamp_register()),
            // Lower bytes hold read only flags
            RegisterWrite {
                compared: &[ByteSelector::Byte(3), ByteSelector::Byte(2)],
                ..RegisterWrite::register(InitStage::Interrupts, REGISTER_C1INT, config.interrupt_register())
            },
            RegisterWrite::register(
                InitStage::TransmitEventFifo,
                REGISTER_C1TEFCON,
                config.fifo.as_tef_register(),
            ),
            RegisterWrite::register(
                InitStage::TransmitBuffer,
                fifo_control_register(tx_buffer),
                config.fifo.as_tx_register(),
            ),
            RegisterWrite::register(
                InitStage::ReceiveFifo,
                fifo_control_register(rx_buffer),
                config.fifo.as_rx_register(),
            ),
            RegisterWrite::register(InitStage::ModeControl, REGISTER_C1CON, config.control_register()),
        ]
    }

    /// Writes the register, reads it back and compares the given bytes.
    /// Returns false on mismatch.
    fn write_verified<T: Transport>(
        &mut self,
        bus: &mut T,
        address: u16,
        access: ByteSelector,
        value: u32,
        compared: &[ByteSelector],
    ) -> Result<bool, T::Error> {
        self.write_register(bus, address, access, value)?;
        self.read_register(bus, address, access)?;

        if compared.iter().all(|selector| self.verify(*selector)) {
            return Ok(true);
        }

        debug!(
            "Verification of register {:#05X} failed. Written: {:02X?}, read: {:02X?}",
            address, self.write_buffer, self.read_buffer
        );
        Ok(false)
    }

    /// Fails with [CanError::NotTxFifo] if the FIFO is configured for reception
    fn ensure_tx_fifo<T: Transport>(&mut self, bus: &mut T, fifo: u8) -> Result<(), CanError<T::Error>> {
        let control = FifoControlReg0::from(self.read_low_byte(bus, fifo_control_register(fifo))?);

        if !control.txen() {
            debug!("FIFO {fifo} is configured for reception");
            return Err(CanError::NotTxFifo);
        }

        Ok(())
    }

    /// Reads the entire register and returns the LSB
    fn read_low_byte<T: Transport>(&mut self, bus: &mut T, address: u16) -> Result<u8, CanError<T::Error>> {
        let data = self
            .read_register(bus, address, ByteSelector::All)
            .map_err(CanError::BusError)?;

        Ok(data[0])
    }

    /// Returns the RAM address of the next message object of the buffer.
    /// The object of the given size must fit into RAM.
    fn message_address<T: Transport>(
        &mut self,
        bus: &mut T,
        buffer: u8,
        object_size: usize,
    ) -> Result<u16, CanError<T::Error>> {
        let data = self
            .read_register(bus, fifo_user_address_register(buffer), ByteSelector::All)
            .map_err(CanError::BusError)?;

        let address = (((data[1] as u32) << 8) | data[0] as u32) + RAM_START as u32;

        if address + object_size as u32 > RAM_END as u32 + 1 {
            debug!("Message object at {address:#X} with {object_size} bytes exceeds RAM");
            return Err(CanError::InvalidRamAddress(u16::try_from(address).unwrap_or(u16::MAX)));
        }

        Ok(address as u16)
    }

    /// Increments head (transmit) or tail (receive) of the buffer by one message
    fn increment_head<T: Transport>(&mut self, bus: &mut T, buffer: u8) -> Result<(), CanError<T::Error>> {
        self.write_control_byte1(bus, buffer, FifoControlReg1::new().with_uinc(true))
    }

    fn write_control_byte1<T: Transport>(
        &mut self,
        bus: &mut T,
        buffer: u8,
        value: FifoControlReg1,
    ) -> Result<(), CanError<T::Error>> {
        self.write_register(
            bus,
            fifo_control_register(buffer),
            ByteSelector::Byte(1),
            (u8::from(value) as u32) << 8,
        )
        .map_err(CanError::BusError)
    }

    /// Single transfer bracketed by chip select
    fn transaction<'w, T: Transport>(&self, bus: &mut T, buffer: &'w mut [u8]) -> Result<&'w [u8], T::Error> {
        self.selected(bus, move |bus| bus.transfer(buffer))
    }

    /// Runs the transfers with chip select asserted.
    /// The chip select is released even if a transfer failed.
    fn selected<T: Transport, R>(
        &self,
        bus: &mut T,
        transfers: impl FnOnce(&mut T) -> Result<R, T::Error>,
    ) -> Result<R, T::Error> {
        bus.select(self.id)?;
        let result = transfers(bus);
        let released = bus.deselect(self.id);

        let value = result?;
        released?;

        Ok(value)
    }
}

impl<INT: InputPin> Channel<INT> {
    /// True while the interrupt line is active (low)
    pub fn check_message(&self) -> Result<bool, INT::Error> {
        self.interrupt.is_low()
    }
}

/// Streams header, optional timestamp and payload of a receive message object.
/// Chip select must be asserted.
fn stream_rx_object<T: Transport>(bus: &mut T, address: u16, timestamped: bool) -> Result<RxMessage, T::Error> {
    let mut buffer = [DUMMY_BYTE; COMMAND_SIZE + HEADER_SIZE + TIMESTAMP_SIZE];
    let prefix_size = COMMAND_SIZE + HEADER_SIZE + if timestamped { TIMESTAMP_SIZE } else { 0 };
    buffer[..COMMAND_SIZE].copy_from_slice(&command_header(Operation::Read, address));

    let mut prefix = [0u8; HEADER_SIZE + TIMESTAMP_SIZE];
    copy_received(&mut prefix, bus.transfer(&mut buffer[..prefix_size])?, COMMAND_SIZE);

    let mut header_bytes = [0u8; HEADER_SIZE];
    header_bytes.copy_from_slice(&prefix[..HEADER_SIZE]);
    let header = RxHeader::from_ram(header_bytes);

    let timestamp = timestamped.then(|| LittleEndian::read_u32(&prefix[HEADER_SIZE..]));

    let length = header.payload_length();
    let mut payload = [0u8; MAX_PAYLOAD_CAN_FD];

    if length > 0 {
        let mut dummy = [DUMMY_BYTE; MAX_PAYLOAD_CAN_FD];
        copy_received(&mut payload[..length], bus.transfer(&mut dummy[..length])?, 0);
    }

    Ok(RxMessage {
        header,
        timestamp,
        payload: Bytes::copy_from_slice(&payload[..length]),
    })
}

/// Copies the received bytes following the given offset
fn copy_received(target: &mut [u8], received: &[u8], offset: usize) {
    for (target, source) in target.iter_mut().zip(received.iter().skip(offset)) {
        *target = *source;
    }
}
