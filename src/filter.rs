//!# CAN Filter
//! The [Filter] object describes an acceptance filter routing matching frames to a receive FIFO.
//! The controller has 8 filter control registers with 4 filters each. The absolute filter index
//! is `4 * group + slot`, lower indices have higher priority.
//!
//! ```
//!# use mcp2517_dual::filter::{Filter, FilterType};
//!# use embedded_can::{Id, ExtendedId};
//!
//! // ID to match
//! let id = Id::Extended(ExtendedId::new(0xC672).unwrap());
//! // Route to FIFO 1 using filter 2 of group 0, only the upper byte of the ID needs to match
//! let filter = Filter::new(1, 0, 2, FilterType::ExtendedOnly, id, 0xFF00);
//!
//! assert_eq!(2, filter.index());
//! ```
use crate::message::{split_identifier, EXTENDED_IDENTIFIER_MASK, STANDARD_IDENTIFIER_MASK};
use crate::registers::{rx_fifo_index, FilterControlReg, FilterMaskReg, FilterObjectReg};
use embedded_can::Id;
use serde::{Deserialize, Serialize};

/// Highest filter control register index
const MAX_GROUP: u8 = 7;

/// Highest filter index within a filter control register
const MAX_SLOT: u8 = 3;

/// Frame formats accepted by a filter
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterType {
    /// Standard and extended frames whose ID matches
    #[default]
    Either,
    /// Only standard frames
    StandardOnly,
    /// Only extended frames
    ExtendedOnly,
}

impl FilterType {
    /// Extended Identifier Enable bit of the filter object
    fn exide(&self) -> bool {
        matches!(self, Self::Either | Self::ExtendedOnly)
    }

    /// Identifier Receive mode bit of the mask
    fn mide(&self) -> bool {
        matches!(self, Self::StandardOnly | Self::ExtendedOnly)
    }
}

/// Struct representing a filter object
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Filter {
    /// receive FIFO of matching frames
    pub(crate) rx_fifo: u8,
    /// filter control register index
    pub(crate) group: u8,
    /// filter index inside the control register
    pub(crate) slot: u8,
    /// mask register bitfield
    pub(crate) mask_bits: FilterMaskReg,
    /// filter register bitfield
    pub(crate) filter_bits: FilterObjectReg,
}

impl Filter {
    /// Creates a new filter.
    /// Group is clamped to 0-7, slot to 0-3 and the receive FIFO to 1-31.
    ///
    /// The mask is interpreted in the layout of the identifier: for standard identifiers
    /// the lower 11 bits mask the SID, for extended identifiers the lower 29 bits mask the full ID.
    pub fn new(rx_fifo: u8, group: u8, slot: u8, filter_type: FilterType, identifier: Id, mask: u32) -> Self {
        let (sid, eid, _) = split_identifier(identifier);

        let filter_bits = FilterObjectReg::new()
            .with_sid(sid)
            .with_eid(eid)
            .with_exide(filter_type.exide());

        let mask_bits = match identifier {
            Id::Standard(_) => FilterMaskReg::new().with_msid(mask as u16 & STANDARD_IDENTIFIER_MASK),
            Id::Extended(_) => FilterMaskReg::new()
                .with_msid((mask >> 18) as u16 & STANDARD_IDENTIFIER_MASK)
                .with_meid(mask & EXTENDED_IDENTIFIER_MASK),
        };

        Self {
            rx_fifo: rx_fifo_index(rx_fifo),
            group: group.min(MAX_GROUP),
            slot: slot.min(MAX_SLOT),
            mask_bits: mask_bits.with_mide(filter_type.mide()),
            filter_bits,
        }
    }

    /// Absolute filter index
    pub fn index(&self) -> u8 {
        4 * self.group + self.slot
    }

    /// Receive FIFO matching frames are routed to
    pub fn rx_fifo(&self) -> u8 {
        self.rx_fifo
    }

    /// Filter control byte routing to the receive FIFO
    pub(crate) fn control_byte(&self, enabled: bool) -> u8 {
        FilterControlReg::new()
            .with_flten(enabled)
            .with_fbp(self.rx_fifo)
            .into()
    }
}
