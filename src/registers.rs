#![allow(unused_braces)]
use modular_bitfield_msb::prelude::*;

/// First address of message object RAM
pub(crate) const RAM_START: u16 = 0x400;

/// Last address of message object RAM
pub(crate) const RAM_END: u16 = 0xBFF;

pub(crate) const REGISTER_C1CON: u16 = 0x000;
pub(crate) const REGISTER_C1NBTCFG: u16 = 0x004;
pub(crate) const REGISTER_C1DBTCFG: u16 = 0x008;
pub(crate) const REGISTER_C1TDC: u16 = 0x00C;
pub(crate) const REGISTER_C1TSCON: u16 = 0x014;
pub(crate) const REGISTER_C1INT: u16 = 0x01C;
pub(crate) const REGISTER_C1TEFCON: u16 = 0x040;
pub(crate) const REGISTER_OSC: u16 = 0xE00;
pub(crate) const REGISTER_IOCON: u16 = 0xE04;

/// Buffer index of the transmit queue
pub(crate) const TXQ_INDEX: u8 = 0;

/// Highest FIFO index
pub(crate) const MAX_FIFO_INDEX: u8 = 31;

/// Returns the control register address of the given buffer. Index 0 is the TXQ.
pub(crate) fn fifo_control_register(index: u8) -> u16 {
    0x050 + 12 * index as u16
}

/// Returns the status register address of the given buffer. Index 0 is the TXQ.
pub(crate) fn fifo_status_register(index: u8) -> u16 {
    0x054 + 12 * index as u16
}

/// Returns the user address register of the given buffer. Index 0 is the TXQ.
pub(crate) fn fifo_user_address_register(index: u8) -> u16 {
    0x058 + 12 * index as u16
}

/// Returns the filter control register address of the given group (4 filters per register)
pub(crate) fn filter_control_register(group: u8) -> u16 {
    0x1D0 + 4 * group as u16
}

/// Returns the filter object register address of the given filter
pub(crate) fn filter_object_register(filter_index: u8) -> u16 {
    0x1F0 + 8 * filter_index as u16
}

/// Returns the mask register address of the given filter
pub(crate) fn filter_mask_register(filter_index: u8) -> u16 {
    0x1F4 + 8 * filter_index as u16
}

/// Clamps a transmit buffer index to TXQ (0) or FIFO 1-31
pub(crate) fn tx_buffer_index(index: u8) -> u8 {
    index.min(MAX_FIFO_INDEX)
}

/// Clamps a receive buffer index to FIFO 1-31, the TXQ is never a receive buffer
pub(crate) fn rx_fifo_index(index: u8) -> u8 {
    index.clamp(1, MAX_FIFO_INDEX)
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Fourth byte of FIFO Control register
pub struct FifoControlReg3 {
    pub plsize: B3,
    fsize: B5,
}

impl FifoControlReg3 {
    /// set FIFO size (number of messages 1-32)
    pub fn with_fifo_size(mut self, value: u8) -> Self {
        let size = value.clamp(1, 32);
        self.set_fsize(size - 1);
        self
    }

    /// get FIFO size
    pub fn get_fifo_size(&self) -> u8 {
        self.fsize() + 1
    }
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Third byte of FIFO Control register
pub struct FifoControlReg2 {
    #[skip]
    __: B1,
    /// Retransmission attempts bits
    pub txat: B2,
    /// Message transmit priority bits
    pub txpri: B5,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Second byte of FIFO Control register
pub struct FifoControlReg1 {
    #[skip]
    __: B5,
    /// FIFO Reset bit
    pub freset: bool,
    /// Message Send Request bit
    pub txreq: bool,
    /// Increment FIFO Head/Tail bit
    pub uinc: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// First byte of FIFO Control register
pub struct FifoControlReg0 {
    /// TX/RX FIFO Selection bit
    pub txen: bool,
    /// Auto RTR Enable bit
    pub rtren: bool,
    /// Received Message Time Stamp Enable bit
    pub rxtsen: bool,
    /// Transmit Attempts Exhausted Interrupt Enable bit
    pub txatie: bool,
    /// Overflow Interrupt Enable bit
    pub rxovie: bool,
    /// Transmit/Receive FIFO Empty/Full Interrupt Enable bit
    pub tferffie: bool,
    /// Transmit/Receive FIFO Half Empty/Half Full Interrupt Enable bit
    pub tfhrfhie: bool,
    /// Transmit/Receive FIFO Not Full/Not Empty Interrupt Enable bit
    pub tfnrfnie: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// First byte of FIFO Status register
pub struct FifoStatusReg0 {
    /// Message Aborted Status bit
    pub txabt: bool,
    /// Message Lost Arbitration Status bit
    pub txlarb: bool,
    /// Error Detected During Transmission bit
    pub txerr: bool,
    /// Transmit Attempts Exhausted Interrupt Pending bit
    pub txatif: bool,
    /// Receive FIFO Overflow Interrupt Flag bit
    pub rxovif: bool,
    /// Transmit/Receive FIFO Empty/Full Interrupt Flag bit
    pub tferffif: bool,
    /// Transmit/Receive FIFO Half Empty/Half Full Interrupt Flag bit
    pub tfhrfhif: bool,
    /// Transmit/Receive FIFO Not Full/Not Empty Interrupt Flag bit
    pub tfnrfnif: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Third byte of CAN Control register
pub struct C1CONReg2 {
    /// Operation Mode Status bits
    pub opmod: B3,
    pub txqen: bool,
    pub stef: bool,
    pub serr2lom: bool,
    pub esigm: bool,
    pub rtxat: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Second byte of Oscillator Control register
pub struct OSCReg1 {
    #[skip]
    __: B3,
    /// Synchronized SCLKDIV bit
    pub sclkrdy: bool,
    #[skip]
    __: B1,
    /// Oscillator Ready bit
    pub oscrdy: bool,
    #[skip]
    __: B1,
    /// PLL Ready bit
    pub pllrdy: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// First byte of TXQ Status register
pub struct TxQueueStatusReg0 {
    pub txabt: bool,
    pub txlarb: bool,
    pub txerr: bool,
    pub txatif: bool,
    #[skip]
    __: B1,
    /// Transmit Queue Empty Interrupt Flag bit
    pub txqeif: bool,
    #[skip]
    __: B1,
    /// Transmit Queue Not Full Interrupt Flag bit
    pub txqnif: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// One byte of Filter Control register
pub struct FilterControlReg {
    /// Enable Filter bit
    pub flten: bool,
    #[skip]
    __: B2,
    /// Pointer to FIFO when filter hits
    pub fbp: B5,
}

#[bitfield]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
/// Filter Object register
pub struct FilterObjectReg {
    #[skip]
    __: B1,
    /// Extended Identifier Enable bit
    pub exide: bool,
    /// Standard Identifier filter bit 11 (FD mode only)
    pub sid11: bool,
    /// Extended Identifier filter bits
    pub eid: B18,
    /// Standard Identifier filter bits
    pub sid: B11,
}

#[bitfield]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
/// Filter Mask register
pub struct FilterMaskReg {
    #[skip]
    __: B1,
    /// Identifier Receive mode bit
    pub mide: bool,
    /// Standard Identifier Mask bit 11 (FD mode only)
    pub msid11: bool,
    /// Extended Identifier Mask bits
    pub meid: B18,
    /// Standard Identifier Mask bits
    pub msid: B11,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Nominal Bit Time Configuration register
pub struct C1NBTCFG {
    /// Baud Rate Prescaler bits
    pub brp: B8,
    /// Time Segment 1 bits (Propagation Segment + Phase Segment 1)
    pub tseg1: B8,
    #[skip]
    __: B1,
    /// Time Segment 2 bits (Phase Segment 2)
    pub tseg2: B7,
    #[skip]
    __: B1,
    /// Synchronization Jump Width bits
    pub sjw: B7,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Data Bit Time Configuration register
pub struct C1DBTCFG {
    pub brp: B8,
    #[skip]
    __: B3,
    pub tseg1: B5,
    #[skip]
    __: B4,
    pub tseg2: B4,
    #[skip]
    __: B4,
    pub sjw: B4,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Transmitter Delay Compensation register
pub struct C1TDC {
    #[skip]
    __: B6,
    /// Enable Edge Filtering during Bus Integration state bit
    pub edgflten: bool,
    /// Enable 12-Bit SID in CAN FD Base Format Messages bit
    pub sid11en: bool,
    #[skip]
    __: B6,
    /// Transmitter Delay Compensation Mode bits
    pub tdcmod: B2,
    #[skip]
    __: B1,
    /// Transmitter Delay Compensation Offset bits
    pub tdco: B7,
    #[skip]
    __: B2,
    /// Transmitter Delay Compensation Value bits
    pub tdcv: B6,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Time Stamp Control register
pub struct C1TSCON {
    #[skip]
    __: B13,
    /// Time Stamp res bit (FD frames only)
    pub tsres: bool,
    /// Time Stamp EOF bit
    pub tseof: bool,
    /// Time Base Counter Enable bit
    pub tbcen: bool,
    #[skip]
    __: B6,
    /// Time Base Counter Prescaler bits
    pub tbcpre: B10,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Interrupt register, only the enable bits in the upper half are writable
pub struct C1INT {
    pub ivmie: bool,
    pub wakie: bool,
    pub cerrie: bool,
    pub serrie: bool,
    pub rxovie: bool,
    pub txatie: bool,
    pub spicrcie: bool,
    pub eccie: bool,
    #[skip]
    __: B3,
    pub tefie: bool,
    pub modie: bool,
    pub tbcie: bool,
    /// Receive FIFO Interrupt Enable bit
    pub rxie: bool,
    /// Transmit FIFO Interrupt Enable bit
    pub txie: bool,
    #[skip]
    __: B16,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Transmit Event FIFO Control register
pub struct C1TEFCON {
    #[skip]
    __: B3,
    fsize: B5,
    #[skip]
    __: B13,
    pub freset: bool,
    #[skip]
    __: B1,
    pub uinc: bool,
    #[skip]
    __: B2,
    /// Transmit Event FIFO Time Stamp Enable bit
    pub teftsen: bool,
    #[skip]
    __: B1,
    pub tefovie: bool,
    pub teffie: bool,
    pub tefhie: bool,
    pub tefneie: bool,
}

impl C1TEFCON {
    /// set TEF size (number of objects 1-32)
    pub fn with_fifo_size(mut self, value: u8) -> Self {
        let size = value.clamp(1, 32);
        self.set_fsize(size - 1);
        self
    }
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Input/Output Control register
pub struct IOCON {
    #[skip]
    __: B1,
    /// Interrupt pins Open-Drain Mode bit
    pub intod: bool,
    /// Start-Of-Frame signal bit
    pub sof: bool,
    /// TXCAN Open-Drain Mode bit
    pub txcanod: bool,
    #[skip]
    __: B2,
    pub pm1: bool,
    pub pm0: bool,
    #[skip]
    __: B6,
    pub gpio1: bool,
    pub gpio0: bool,
    #[skip]
    __: B6,
    pub lat1: bool,
    pub lat0: bool,
    #[skip]
    __: B1,
    /// Enable Transceiver Standby Pin Control bit
    pub xstbyen: bool,
    #[skip]
    __: B4,
    pub tris1: bool,
    pub tris0: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// CAN Control register
pub struct C1CON {
    /// Transmit Bandwidth Sharing bits
    pub txbws: B4,
    /// Abort All Pending Transmissions bit
    pub abat: bool,
    /// Request Operation Mode bits
    pub reqop: B3,
    /// Operation Mode Status bits (read only)
    pub opmod: B3,
    /// Enable Transmit Queue bit
    pub txqen: bool,
    /// Store in Transmit Event FIFO bit
    pub stef: bool,
    pub serr2lom: bool,
    pub esigm: bool,
    /// Restrict Retransmission Attempts bit
    pub rtxat: bool,
    #[skip]
    __: B3,
    pub brsdis: bool,
    pub busy: bool,
    /// Selectable Wake-up Filter Time bits
    pub wft: B2,
    /// Enable CAN Bus Line Wake-up Filter bit
    pub wakfil: bool,
    #[skip]
    __: B1,
    /// Protocol Exception Event Detection Disabled bit
    pub pxedis: bool,
    pub isocrcen: bool,
    /// Device Net Filter Bit Number bits
    pub dncnt: B5,
}
