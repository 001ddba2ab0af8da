//!# CAN Message
//! Both CAN 2.0 (up to 8 data bytes per frame) and CAN FD (up to 64 data bytes per frame)
//! formats are supported with standard and extended identifiers.
//!
//! The data length code stored in the message header is the only length persisted to the
//! controller. Payload lengths are always derived from it by [payload_length].
//!
//! ## CAN 2.0 message construction example
//! ```
//!# use bytes::Bytes;
//!# use mcp2517_dual::message::{FrameFormat, TxMessage};
//!# use embedded_can::{Id, StandardId};
//!#
//! let message_id = Id::Standard(StandardId::new(0x123).unwrap());
//! let payload = Bytes::copy_from_slice(&[0x1, 0x2, 0x3]);
//!
//! let tx_message = TxMessage::new(message_id, FrameFormat::Can20, payload).unwrap();
//! assert_eq!(3, tx_message.length());
//!```
//! ## CAN FD message construction example
//! ```
//!# use bytes::Bytes;
//!# use mcp2517_dual::message::{FrameFormat, TxMessage};
//!# use mcp2517_dual::message::identifier;
//!#
//! // IDs above 0x7FF are always extended
//! let message_id = identifier(0x18DA_F110, false).unwrap();
//! // 22 bytes are sent as 24 byte frame, the remaining bytes are zero padded
//! let payload = Bytes::copy_from_slice(&[0u8; 22]);
//!
//! let format = FrameFormat::CanFd { bit_rate_switch: true };
//! let tx_message = TxMessage::new(message_id, format, payload).unwrap();
//! assert_eq!(24, tx_message.length());
//! ```

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use bytes::Bytes;
use embedded_can::{ExtendedId, Id, StandardId};
use log::debug;
use modular_bitfield_msb::prelude::*;

pub const STANDARD_IDENTIFIER_MASK: u16 = 0x7FF;

pub const EXTENDED_IDENTIFIER_MASK: u32 = 0x3FFFF;

pub const MAX_PAYLOAD_CAN_2_0: usize = 8;

pub const MAX_PAYLOAD_CAN_FD: usize = 64;

/// Size of a message object header in controller RAM
pub const HEADER_SIZE: usize = 8;

/// Size of the optional receive timestamp in controller RAM
pub const TIMESTAMP_SIZE: usize = 4;

/// Payload lengths of CAN FD frames indexed by DLC
const FD_PAYLOAD_LENGTHS: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Data length code
#[derive(BitfieldSpecifier, Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
#[allow(clippy::upper_case_acronyms)]
#[bits = 4]
pub enum DLC {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Twelve,
    Sixteen,
    Twenty,
    TwentyFour,
    ThirtyTwo,
    FortyEight,
    SixtyFour,
}

/// Errors of the DLC <-> payload length conversion
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[allow(clippy::upper_case_acronyms)]
pub enum DLCError {
    /// DLC above 15
    InvalidCode(u8),
    /// CAN FD payload above 64 bytes
    InvalidLength(usize),
}

/// Possible errors when creating a message object
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum MessageError {
    /// Payload does not fit the frame format
    InvalidLength(usize),
    /// Identifier above 29 bits
    InvalidId(u32),
}

impl DLC {
    /// Maps the 4 bit code to the enum
    pub fn from_code(code: u8) -> Result<Self, DLCError> {
        match code {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            9 => Ok(Self::Twelve),
            10 => Ok(Self::Sixteen),
            11 => Ok(Self::Twenty),
            12 => Ok(Self::TwentyFour),
            13 => Ok(Self::ThirtyTwo),
            14 => Ok(Self::FortyEight),
            15 => Ok(Self::SixtyFour),
            code => Err(DLCError::InvalidCode(code)),
        }
    }

    /// Returns the 4 bit code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Number of payload bytes of the given frame format
    pub fn payload_length(self, fd_frame: bool) -> usize {
        let code = self.code() as usize;

        if code <= MAX_PAYLOAD_CAN_2_0 || !fd_frame {
            return code.min(MAX_PAYLOAD_CAN_2_0);
        }

        FD_PAYLOAD_LENGTHS[code]
    }

    /// Smallest DLC holding the given number of bytes
    pub fn for_payload(fd_frame: bool, length: usize) -> Result<Self, DLCError> {
        Self::from_code(dlc_for_payload(fd_frame, length)?)
    }
}

/// Returns the number of payload bytes for the given DLC.
/// CAN 2.0 frames are limited to 8 bytes regardless of the code.
pub fn payload_length(fd_frame: bool, dlc: u8) -> Result<usize, DLCError> {
    Ok(DLC::from_code(dlc)?.payload_length(fd_frame))
}

/// Returns the smallest DLC whose payload holds `length` bytes.
/// CAN 2.0 lengths above 8 saturate at DLC 8.
pub fn dlc_for_payload(fd_frame: bool, length: usize) -> Result<u8, DLCError> {
    if length <= MAX_PAYLOAD_CAN_2_0 {
        return Ok(length as u8);
    }

    if !fd_frame {
        return Ok(MAX_PAYLOAD_CAN_2_0 as u8);
    }

    FD_PAYLOAD_LENGTHS
        .iter()
        .position(|&supported| supported >= length)
        .map(|code| code as u8)
        .ok_or(DLCError::InvalidLength(length))
}

/// Builds an identifier from its raw value.
/// The identifier is extended if requested or if the value exceeds 11 bits.
pub fn identifier(raw: u32, extended: bool) -> Result<Id, MessageError> {
    if extended || raw > STANDARD_IDENTIFIER_MASK as u32 {
        return ExtendedId::new(raw).map(Id::Extended).ok_or(MessageError::InvalidId(raw));
    }

    StandardId::new(raw as u16)
        .map(Id::Standard)
        .ok_or(MessageError::InvalidId(raw))
}

/// Splits an identifier into SID, EID and IDE flag of the message object.
/// The SID of an extended identifier holds its 11 most significant bits.
pub fn split_identifier(identifier: Id) -> (u16, u32, bool) {
    match identifier {
        Id::Standard(sid) => (sid.as_raw(), 0, false),
        Id::Extended(eid) => (
            (eid.as_raw() >> 18) as u16 & STANDARD_IDENTIFIER_MASK,
            eid.as_raw() & EXTENDED_IDENTIFIER_MASK,
            true,
        ),
    }
}

/// Reverse of [split_identifier]
pub fn join_identifier(sid: u16, eid: u32, extended: bool) -> Id {
    let sid = sid & STANDARD_IDENTIFIER_MASK;

    if extended {
        let raw = ((sid as u32) << 18) | (eid & EXTENDED_IDENTIFIER_MASK);
        Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::ZERO))
    } else {
        Id::Standard(StandardId::new(sid).unwrap_or(StandardId::ZERO))
    }
}

/// Swaps the byte order of each 32 bit word, converting between
/// bitfield (MSB first) and controller RAM (LSB first) layout
pub(crate) fn swap_words(buffer: &mut [u8]) {
    for word in buffer.chunks_exact_mut(4) {
        let num = BigEndian::read_u32(word);
        LittleEndian::write_u32(word, num);
    }
}

/// Frame format of a transmitted message
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameFormat {
    /// Classic data frame, up to 8 bytes
    Can20,
    /// Classic remote frame, the payload length is the requested length
    Can20Remote,
    /// CAN FD frame, up to 64 bytes
    CanFd { bit_rate_switch: bool },
}

impl FrameFormat {
    fn max_payload(&self) -> usize {
        match self {
            Self::CanFd { .. } => MAX_PAYLOAD_CAN_FD,
            _ => MAX_PAYLOAD_CAN_2_0,
        }
    }
}

/// Transmit message object header
#[bitfield(bits = 64)]
#[derive(BitfieldSpecifier, Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct TxHeader {
    // T0
    #[skip]
    __: B2,
    /// standard ID in FD mode can be extended to 12 bits if sid11 is set
    pub sid11: bool,
    /// 18 lsb of extended ID
    pub extended_identifier: B18,
    /// standard ID bits or msb 11 bits of extended ID
    pub standard_identifier: B11,
    // T1
    #[skip]
    __: B16,
    /// Sequence keeping track of transmitted messages in Transmit Event FIFO
    pub sequence: B7,
    /// In normal ESI mode, set if node is error passive, cleared if node is error active
    pub error_status_indicator: bool,
    /// Bit distinguishing between CAN and CAN FD formats
    pub fd_frame: bool,
    /// Enables bit rate switching in CAN FD frames
    pub bit_rate_switch: bool,
    /// Set if the frame is a RTR frame
    pub remote_transmission_request: bool,
    /// Set if extended ID is used
    pub identifier_extension_flag: bool,
    /// 4 bits identifying the payload length
    pub data_length_code: DLC,
}

/// Transmit Message Object
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxMessage {
    /// T0 and T1 of the message object
    pub(crate) header: TxHeader,
    /// Payload bytes, shorter than [TxMessage::length] if padding is needed
    pub(crate) buff: Bytes,
    /// Payload length derived from DLC
    pub(crate) length: usize,
}

impl TxMessage {
    /// Creates a new message, the DLC is the smallest code holding the payload
    pub fn new(identifier: Id, format: FrameFormat, data: Bytes) -> Result<Self, MessageError> {
        let payload_length = data.len();

        if payload_length > format.max_payload() {
            debug!(
                "Payload of {} bytes exceeds maximum of {} bytes",
                payload_length,
                format.max_payload()
            );
            return Err(MessageError::InvalidLength(payload_length));
        }

        let mut header = TxHeader::new();

        match format {
            FrameFormat::Can20 => {}
            FrameFormat::Can20Remote => header.set_remote_transmission_request(true),
            FrameFormat::CanFd { bit_rate_switch } => {
                header.set_fd_frame(true);
                header.set_bit_rate_switch(bit_rate_switch);
            }
        }

        let dlc = DLC::for_payload(header.fd_frame(), payload_length)
            .map_err(|_| MessageError::InvalidLength(payload_length))?;
        header.set_data_length_code(dlc);

        let (sid, eid, extended) = split_identifier(identifier);
        header.set_standard_identifier(sid);
        header.set_extended_identifier(eid);
        header.set_identifier_extension_flag(extended);

        let length = dlc.payload_length(header.fd_frame());

        Ok(TxMessage {
            header,
            buff: data,
            length,
        })
    }

    /// Sets the sequence number reported in the transmit event FIFO
    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.header.set_sequence(sequence & 0x7F);
        self
    }

    /// Sets the error status indicator
    pub fn with_error_status_indicator(mut self, esi: bool) -> Self {
        self.header.set_error_status_indicator(esi);
        self
    }

    /// Returns payload as a `&[u8]`
    pub fn get_payload(&self) -> &[u8] {
        self.buff.as_ref()
    }

    /// Returns Header register of Transmit Message Object
    pub fn get_header(&self) -> &TxHeader {
        &self.header
    }

    /// Returns the identifier
    pub fn id(&self) -> Id {
        join_identifier(
            self.header.standard_identifier(),
            self.header.extended_identifier(),
            self.header.identifier_extension_flag(),
        )
    }

    /// Number of payload bytes transmitted, derived from DLC and FDF
    pub fn length(&self) -> usize {
        self.length
    }

    /// Header bytes in controller RAM layout
    pub(crate) fn header_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = self.header.into_bytes();
        swap_words(&mut bytes);
        bytes
    }
}

/// Receive message object header
#[bitfield(bits = 64)]
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
#[repr(u64)]
pub struct RxHeader {
    // R0
    #[skip]
    __: B2,
    /// In FD mode the standard ID can be extended to 12 bit using r1
    pub sid11: bool,
    /// Extended Identifier
    pub extended_identifier: B18,
    /// Standard Identifier
    pub standard_identifier: B11,
    // R1
    #[skip]
    __: B16,
    /// Filter Hit, number of filter that matched
    pub filter_hit: B5,
    #[skip]
    __: B2,
    /// Error Status Indicator
    pub error_status_indicator: bool,
    /// FD Frame; distinguishes between CAN and CAN FD formats
    pub fd_frame: bool,
    /// Bit Rate Switch; indicates if data bit rate was switched
    pub bit_rate_switch: bool,
    /// Remote Transmission Request; not used in CAN FD
    pub remote_transmission_request: bool,
    /// Identifier Extension Flag; distinguishes between base and extended format
    pub identifier_extension_flag: bool,
    /// Data Length Code
    pub data_length_code: DLC,
}

impl RxHeader {
    /// Parses the header from controller RAM layout
    pub(crate) fn from_ram(bytes: [u8; HEADER_SIZE]) -> Self {
        let mut bytes = bytes;
        swap_words(&mut bytes);

        Self::from_bytes(bytes)
    }

    /// Identifier of the received frame
    pub fn get_id(&self) -> Id {
        join_identifier(
            self.standard_identifier(),
            self.extended_identifier(),
            self.identifier_extension_flag(),
        )
    }

    /// Number of payload bytes stored after the header
    pub fn payload_length(&self) -> usize {
        self.data_length_code().payload_length(self.fd_frame())
    }

    #[cfg(test)]
    pub fn new_test_cfg(identifier: Id) -> Self {
        let (sid, eid, extended) = split_identifier(identifier);

        Self::new()
            .with_data_length_code(DLC::Eight)
            .with_standard_identifier(sid)
            .with_extended_identifier(eid)
            .with_identifier_extension_flag(extended)
    }
}

/// Receive Message Object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxMessage {
    pub(crate) header: RxHeader,
    /// Present if the FIFO captures timestamps
    pub(crate) timestamp: Option<u32>,
    pub(crate) payload: Bytes,
}

impl RxMessage {
    /// Returns the identifier
    pub fn id(&self) -> Id {
        self.header.get_id()
    }

    /// Returns Header register of Receive Message Object
    pub fn get_header(&self) -> &RxHeader {
        &self.header
    }

    /// Index of the filter that accepted the frame
    pub fn filter_hit(&self) -> u8 {
        self.header.filter_hit()
    }

    pub fn dlc(&self) -> DLC {
        self.header.data_length_code()
    }

    pub fn is_fd_frame(&self) -> bool {
        self.header.fd_frame()
    }

    pub fn is_bit_rate_switched(&self) -> bool {
        self.header.bit_rate_switch()
    }

    pub fn is_remote_frame(&self) -> bool {
        self.header.remote_transmission_request()
    }

    pub fn is_error_passive(&self) -> bool {
        self.header.error_status_indicator()
    }

    /// Time base counter value captured at reception
    pub fn timestamp(&self) -> Option<u32> {
        self.timestamp
    }

    /// Returns payload as a `&[u8]`
    pub fn payload(&self) -> &[u8] {
        self.payload.as_ref()
    }

    /// Number of payload bytes, derived from DLC and FDF
    pub fn length(&self) -> usize {
        self.payload.len()
    }
}
