#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
#![allow(dead_code)]
#![allow(clippy::identity_op)]

//! # Library for two MCP2517FD CAN controllers sharing one SPI bus
//!
//! Crate currently offer the following features:
//! * Two controllers on one SPI bus, each with its own chip select and interrupt line
//! * Channel initialization with verified register writes and stage specific fault codes
//! * CAN2.0 and CAN FD format support
//! * Standard and extended ID formats for CAN frames
//! * Acceptance filters routing frames to receive FIFOs
//! * no_std support
//!
//!## CAN Tx example
//!
//!```
//!use mcp2517_dual::example::{ExampleClock, ExampleCSPin, ExampleInterruptPin, ExampleSPIBus};
//!use mcp2517_dual::bus::{ChannelId, SpiBus};
//!use mcp2517_dual::can::Channel;
//!use mcp2517_dual::config::*;
//!use mcp2517_dual::filter::{Filter, FilterType};
//!use mcp2517_dual::message::{identifier, FrameFormat, TxMessage};
//!use bytes::Bytes;
//!
//!let mut bus = SpiBus::new(
//!    ExampleSPIBus::default(),
//!    ExampleCSPin {},
//!    ExampleCSPin {},
//!    ExampleClock::default(),
//!);
//!let mut channel = Channel::new(ChannelId::One, ExampleInterruptPin::default());
//!
//!// configure channel for 500 kbit/s, transmit via TXQ and receive in FIFO 1
//!channel
//!    .configure(
//!        &mut bus,
//!        &Configuration {
//!            bit_rate: CanSpeed::Kbps500,
//!            tx_buffer: 0,
//!            rx_buffer: 1,
//!            ..Default::default()
//!        },
//!    )
//!    .unwrap();
//!
//!// route standard frames with ID 0x123 to FIFO 1
//!let can_id = identifier(0x123, false).unwrap();
//!let filter = Filter::new(1, 0, 0, FilterType::StandardOnly, can_id, 0x7FF);
//!channel.set_filter(&mut bus, &filter).unwrap();
//!
//!// load the message into the TXQ and request transmission
//!let payload = Bytes::copy_from_slice(&[0xDE, 0xAD]);
//!let message = TxMessage::new(can_id, FrameFormat::Can20, payload).unwrap();
//!channel.write_memory(&mut bus, 0, &message).unwrap();
//!channel.start_transmit(&mut bus, 0).unwrap();
//!```

extern crate alloc;

pub mod bus;
pub mod can;
pub mod config;
pub mod status;

pub mod filter;
pub mod frame;
pub mod message;

pub mod example;
#[cfg(test)]
pub(crate) mod mocks;
mod registers;
#[cfg(test)]
mod tests;
