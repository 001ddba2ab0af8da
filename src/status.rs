//! Decoded status registers, read via [Channel](crate::can::Channel) diagnostics
use crate::registers::{C1CONReg2, OSCReg1};

/// Operation status read from C1CON register byte 2
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OperationStatus {
    /// Current operation mode
    pub mode: OperationMode,

    /// True if TXQ is enabled and reserves space in RAM
    pub txq_reserved: bool,

    /// True if transmitted messages are stored in TEF and RAM space is reserved
    pub store_transmit_event: bool,

    /// True => Transition to listen-only mode on system error bit
    /// False => Transition to restricted-operation mode on system error bit
    pub error_trans_listen_only_mode: bool,

    /// True => ESI is transmitted recessive when ESI of message is high or CAN controller error passive
    /// False => ESI reflects error status of CAN controller
    pub transmit_esi_gateway: bool,

    /// True => Restricted retransmission attempts. TXAT is used
    /// False => Unlimited number of retransmission attempts, TXAT will be ignored
    pub restrict_retransmission: bool,
}

impl OperationStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        let reg = C1CONReg2::from(register);

        Self {
            mode: OperationMode::from_register(register),
            txq_reserved: reg.txqen(),
            store_transmit_event: reg.stef(),
            error_trans_listen_only_mode: reg.serr2lom(),
            transmit_esi_gateway: reg.esigm(),
            restrict_retransmission: reg.rtxat(),
        }
    }
}

/// Operation mode reported by OPMOD
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OperationMode {
    /// Normal CAN FD mode, supports mixing of CAN FD and classic CAN 2.0 frames
    NormalCANFD = 0b000,
    Sleep = 0b001,
    InternalLoopback = 0b010,
    ListenOnly = 0b011,
    /// Registers writable, set after reset
    Configuration = 0b100,
    ExternalLoopback = 0b101,
    /// Normal CAN 2.0 mode, possible error frames on CAN FD frames
    NormalCAN2_0 = 0b110,
    RestrictedOperation = 0b111,
}

impl OperationMode {
    /// Decodes OPMOD of C1CON byte 2
    pub(crate) fn from_register(register: u8) -> Self {
        match C1CONReg2::from(register).opmod() {
            0b000 => Self::NormalCANFD,
            0b001 => Self::Sleep,
            0b010 => Self::InternalLoopback,
            0b011 => Self::ListenOnly,
            0b100 => Self::Configuration,
            0b101 => Self::ExternalLoopback,
            0b110 => Self::NormalCAN2_0,
            _ => Self::RestrictedOperation,
        }
    }
}

/// Oscillator status read from OSC register byte 1
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OscillatorStatus {
    /// Synchronized SCLKDIV bit
    pub sclk_ready: bool,

    /// True if clock is running and stable
    pub clock_ready: bool,

    /// True if PLL is locked
    pub pll_ready: bool,
}

impl OscillatorStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        let reg = OSCReg1::from(register);

        Self {
            sclk_ready: reg.sclkrdy(),
            clock_ready: reg.oscrdy(),
            pll_ready: reg.pllrdy(),
        }
    }

    /// Clock running and, if enabled, PLL locked
    pub fn is_ready(&self, pll_enabled: bool) -> bool {
        self.clock_ready && (self.pll_ready || !pll_enabled)
    }
}
