use crate::config::RequestMode;
use crate::status::{OperationMode, OperationStatus, OscillatorStatus};
use OperationMode::{
    Configuration, ExternalLoopback, InternalLoopback, ListenOnly, NormalCAN2_0, NormalCANFD, RestrictedOperation,
    Sleep,
};

#[test]
fn test_operation_mode_from_register() {
    for (register, mode) in [
        (0b0001_0100, NormalCANFD),
        (0b0011_0100, Sleep),
        (0b0101_0100, InternalLoopback),
        (0b0111_0100, ListenOnly),
        (0b1001_0100, Configuration),
        (0b1011_0100, ExternalLoopback),
        (0b1101_0100, NormalCAN2_0),
        (0b1111_0100, RestrictedOperation),
    ] {
        assert_eq!(mode, OperationStatus::from_register(register).mode);
    }
}

#[test]
fn test_operation_status_flags() {
    assert!(OperationStatus::from_register(0b0001_0100).txq_reserved);
    assert!(!OperationStatus::from_register(0b0000_0100).txq_reserved);

    assert!(OperationStatus::from_register(0b0001_1100).store_transmit_event);
    assert!(!OperationStatus::from_register(0b0000_0100).store_transmit_event);

    assert!(OperationStatus::from_register(0b0001_1110).error_trans_listen_only_mode);
    assert!(!OperationStatus::from_register(0b0000_0000).error_trans_listen_only_mode);

    assert!(OperationStatus::from_register(0b0001_1110).transmit_esi_gateway);
    assert!(!OperationStatus::from_register(0b0000_0100).transmit_esi_gateway);

    assert!(OperationStatus::from_register(0b0001_1111).restrict_retransmission);
    assert!(!OperationStatus::from_register(0b0000_0100).restrict_retransmission);
}

#[test]
fn test_status_after_initialization() {
    // Byte 2 of the control register written during initialization
    let status = OperationStatus::from_register(0x98);

    assert_eq!(Configuration, status.mode);
    assert!(status.txq_reserved);
    assert!(status.store_transmit_event);

    // Granted request reports the requested mode
    let status = OperationStatus::from_register(0x18);
    assert_eq!(RequestMode::NormalCANFD.to_operation_mode(), status.mode);
}

#[test]
fn test_oscillator_status_from_register() {
    assert!(OscillatorStatus::from_register(0b0001_0100).sclk_ready);
    assert!(!OscillatorStatus::from_register(0b0000_0100).sclk_ready);

    assert!(OscillatorStatus::from_register(0b0001_0100).clock_ready);
    assert!(!OscillatorStatus::from_register(0b0000_0000).clock_ready);

    assert!(OscillatorStatus::from_register(0b0001_0101).pll_ready);
    assert!(!OscillatorStatus::from_register(0b0000_0100).pll_ready);
}

#[test]
fn test_oscillator_ready() {
    assert!(OscillatorStatus::from_register(0b0000_0100).is_ready(false));
    assert!(!OscillatorStatus::from_register(0b0000_0100).is_ready(true));
    assert!(OscillatorStatus::from_register(0b0000_0101).is_ready(true));
    assert!(!OscillatorStatus::from_register(0b0000_0001).is_ready(false));
}
