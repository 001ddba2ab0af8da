//!# Channel configuration
//! [Configuration] holds everything written during channel initialization.
//! The default settings produce the register program of a 500 kbit/s CAN FD channel
//! using the TXQ for transmission and FIFO 1 for reception.
//!
//!```
//!# use mcp2517_dual::config::{CanSpeed, Configuration};
//!#
//! let config = Configuration {
//!     bit_rate: CanSpeed::Kbps250,
//!     tx_buffer: 2,
//!     rx_buffer: 3,
//!     ..Default::default()
//! };
//!```
use crate::registers::{
    FifoControlReg0, FifoControlReg1, FifoControlReg2, FifoControlReg3, C1CON, C1DBTCFG, C1INT, C1NBTCFG, C1TDC,
    C1TEFCON, C1TSCON, IOCON,
};
use crate::status::OperationMode;
use serde::{Deserialize, Serialize};

/// Entire configuration of a single channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub clock: ClockConfiguration,

    /// Nominal bit rate
    pub bit_rate: CanSpeed,

    pub fifo: FifoConfiguration,

    /// Transmit buffer index, 0 selects the TXQ
    pub tx_buffer: u8,

    /// Receive FIFO index (1-31)
    pub rx_buffer: u8,

    /// Operation mode requested at the end of initialization
    pub mode: RequestMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            clock: ClockConfiguration {
                clock_output: ClockOutputDivisor::DivideBy4,
                ..Default::default()
            },
            bit_rate: CanSpeed::default(),
            fifo: FifoConfiguration::default(),
            tx_buffer: 0,
            rx_buffer: 1,
            mode: RequestMode::default(),
        }
    }
}

impl Configuration {
    /// Input/output control: interrupt pins open drain, GPIO0 as interrupt pin, transceiver standby control
    pub(crate) fn io_control_register(&self) -> u32 {
        IOCON::new().with_intod(true).with_pm0(true).with_xstbyen(true).into()
    }

    /// Transmitter delay compensation disabled
    pub(crate) fn tdc_register(&self) -> u32 {
        C1TDC::new().into()
    }

    /// Time base counter enabled without prescaler
    pub(crate) fn timestamp_register(&self) -> u32 {
        C1TSCON::new().with_tbcen(true).into()
    }

    /// Only the receive FIFO interrupt is enabled
    pub(crate) fn interrupt_register(&self) -> u32 {
        C1INT::new().with_rxie(true).into()
    }

    /// CAN control with TXQ and TEF enabled and the requested operation mode
    pub(crate) fn control_register(&self) -> u32 {
        C1CON::new()
            .with_reqop(self.mode as u8)
            .with_opmod(OperationMode::Configuration as u8)
            .with_txqen(true)
            .with_stef(true)
            .with_wft(0b11)
            .with_wakfil(true)
            .with_pxedis(true)
            .into()
    }
}

/// Oscillator/Clock configuration
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockConfiguration {
    /// Divisor for clock output
    pub clock_output: ClockOutputDivisor,

    /// Divisor for system clock
    pub system_clock: SystemClockDivisor,

    /// Disable clock/oscillator?
    pub disable_clock: bool,

    /// PLL configuration
    pub pll: PLLSetting,
}

impl ClockConfiguration {
    /// Maps register values to configuration
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            clock_output: ClockOutputDivisor::from_register(register),
            system_clock: SystemClockDivisor::from_register(register),
            disable_clock: register & (1 << 2) != 0,
            pll: PLLSetting::from_register(register),
        }
    }

    /// Encodes the configuration to register byte
    pub(crate) fn as_register(&self) -> u8 {
        let mut register = 0x0;

        register |= (self.clock_output as u8) << 5;
        register |= (self.system_clock as u8) << 4;
        register |= (self.disable_clock as u8) << 2;
        register |= self.pll as u8;

        register
    }
}

/// Divisor for clock output
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ClockOutputDivisor {
    DivideBy10 = 0b11,
    DivideBy4 = 0b10,
    DivideBy2 = 0b01,
    #[default]
    DivideBy1 = 0b00,
}

impl ClockOutputDivisor {
    /// Maps register values to configuration
    pub(crate) fn from_register(register: u8) -> Self {
        match (register >> 5) & 0b11 {
            0b11 => Self::DivideBy10,
            0b10 => Self::DivideBy4,
            0b01 => Self::DivideBy2,
            _ => Self::DivideBy1,
        }
    }
}

/// Divisor for system clock
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SystemClockDivisor {
    DivideBy2 = 0b1,
    #[default]
    DivideBy1 = 0b0,
}

impl SystemClockDivisor {
    /// Maps register values to configuration
    pub(crate) fn from_register(register: u8) -> Self {
        if register & (1 << 4) != 0 {
            Self::DivideBy2
        } else {
            Self::DivideBy1
        }
    }
}

/// PLL configuration
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PLLSetting {
    /// System clock from 10x PLL
    TenTimesPLL = 0b1,
    /// System clock comes directly from XTAL oscillator
    #[default]
    DirectXTALOscillator = 0b0,
}

impl PLLSetting {
    /// Maps register values to configuration
    pub(crate) fn from_register(register: u8) -> Self {
        if register & 1 != 0 {
            Self::TenTimesPLL
        } else {
            Self::DirectXTALOscillator
        }
    }
}

/// Nominal bit rate, timings assume a 40 MHz system clock
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CanSpeed {
    Kbps125,
    Kbps250,
    #[default]
    Kbps500,
}

impl CanSpeed {
    /// Returns BRP, TSEG1, TSEG2 and SJW of the nominal bit time
    pub fn nominal_timing(&self) -> [u8; 4] {
        match self {
            Self::Kbps125 => [0, 254, 63, 63],
            Self::Kbps250 => [0, 126, 31, 31],
            Self::Kbps500 => [0, 62, 15, 15],
        }
    }

    pub(crate) fn nominal_bit_time_register(&self) -> u32 {
        let [brp, tseg1, tseg2, sjw] = self.nominal_timing();

        C1NBTCFG::new()
            .with_brp(brp)
            .with_tseg1(tseg1)
            .with_tseg2(tseg2)
            .with_sjw(sjw)
            .into()
    }

    /// Data phase runs at 2 Mbit/s for every nominal bit rate
    pub(crate) fn data_bit_time_register(&self) -> u32 {
        C1DBTCFG::new().with_brp(0).with_tseg1(30).with_tseg2(7).with_sjw(7).into()
    }
}

/// Payload size of the message objects in a FIFO
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PayloadSize {
    EightBytes = 0b000,
    TwelveBytes = 0b001,
    SixteenBytes = 0b010,
    TwentyBytes = 0b011,
    TwentyFourBytes = 0b100,
    ThirtyTwoBytes = 0b101,
    FortyEightBytes = 0b110,
    #[default]
    SixtyFourBytes = 0b111,
}

/// Number of retransmission attempts of the transmit buffer
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum RetransmissionAttempts {
    Disabled = 0b00,
    Three = 0b01,
    #[default]
    Unlimited = 0b11,
}

/// Requested operation mode written to REQOP at the end of initialization
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum RequestMode {
    #[default]
    NormalCANFD = 0b000,
    InternalLoopback = 0b010,
    ListenOnly = 0b011,
    ExternalLoopback = 0b101,
    NormalCAN2_0 = 0b110,
}

impl RequestMode {
    /// Returns the operation mode reported once the request is granted
    pub fn to_operation_mode(self) -> OperationMode {
        match self {
            Self::NormalCANFD => OperationMode::NormalCANFD,
            Self::InternalLoopback => OperationMode::InternalLoopback,
            Self::ListenOnly => OperationMode::ListenOnly,
            Self::ExternalLoopback => OperationMode::ExternalLoopback,
            Self::NormalCAN2_0 => OperationMode::NormalCAN2_0,
        }
    }
}

/// Transmit/receive buffer and transmit event FIFO settings
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FifoConfiguration {
    /// Depth of the transmit buffer (1-32)
    pub tx_size: u8,

    /// Depth of the receive FIFO (1-32)
    pub rx_size: u8,

    /// Depth of the transmit event FIFO (1-32)
    pub tef_size: u8,

    pub tx_attempts: RetransmissionAttempts,

    /// Transmit priority (0-31)
    pub tx_priority: u8,

    /// Payload size of transmit and receive buffer
    pub payload_size: PayloadSize,

    /// Capture a timestamp with every received message
    pub rx_timestamp: bool,
}

impl Default for FifoConfiguration {
    fn default() -> Self {
        Self {
            tx_size: 1,
            rx_size: 4,
            tef_size: 32,
            tx_attempts: RetransmissionAttempts::default(),
            tx_priority: 0,
            payload_size: PayloadSize::default(),
            rx_timestamp: true,
        }
    }
}

impl FifoConfiguration {
    /// Transmit event FIFO reset with timestamps enabled
    pub(crate) fn as_tef_register(&self) -> u32 {
        C1TEFCON::new()
            .with_fifo_size(self.tef_size)
            .with_freset(true)
            .with_teftsen(true)
            .into()
    }

    /// Transmit buffer control register, LSB first
    pub(crate) fn as_tx_register(&self) -> u32 {
        let reg0 = FifoControlReg0::new().with_txen(true);

        self.control_register(self.tx_size, reg0)
    }

    /// Receive FIFO control register, LSB first
    pub(crate) fn as_rx_register(&self) -> u32 {
        let reg0 = FifoControlReg0::new()
            .with_rxtsen(self.rx_timestamp)
            .with_tfnrfnie(true);

        self.control_register(self.rx_size, reg0)
    }

    fn control_register(&self, size: u8, reg0: FifoControlReg0) -> u32 {
        let reg1 = FifoControlReg1::new().with_freset(true);
        let reg2 = FifoControlReg2::new()
            .with_txat(self.tx_attempts as u8)
            .with_txpri(self.tx_priority.min(31));
        let reg3 = FifoControlReg3::new()
            .with_plsize(self.payload_size as u8)
            .with_fifo_size(size);

        u32::from_le_bytes([
            u8::from(reg0),
            u8::from(reg1),
            u8::from(reg2),
            u8::from(reg3),
        ])
    }
}
