use crate::config::{PayloadSize, RetransmissionAttempts};
use crate::registers::*;

#[test]
fn test_fifocontrolreg0() {
    assert_eq!([0b1000_0000], FifoControlReg0::new().with_txen(true).into_bytes());
}

#[test]
fn test_fifocontrolreg1() {
    assert_eq!(
        [0b0000_0011],
        FifoControlReg1::new().with_uinc(true).with_txreq(true).into_bytes()
    );
}

#[test]
fn test_fifocontrolreg2() {
    assert_eq!(
        [0b0110_0011],
        FifoControlReg2::new()
            .with_txat(RetransmissionAttempts::Unlimited as u8)
            .with_txpri(3)
            .into_bytes()
    );
}

#[test]
fn test_fifocontrolreg3() {
    let fifo_control_reg3 = FifoControlReg3::new()
        .with_plsize(PayloadSize::TwentyFourBytes as u8)
        .with_fifo_size(32);

    assert_eq!(32, fifo_control_reg3.get_fifo_size());
    assert_eq!([0b1001_1111], fifo_control_reg3.into_bytes());
}

#[test]
fn test_fifostatusreg0() {
    assert_eq!([0b0000_0001], FifoStatusReg0::new().with_tfnrfnif(true).into_bytes());
}

#[test]
fn test_txqueuestatusreg0() {
    assert_eq!([0b0000_0001], TxQueueStatusReg0::new().with_txqnif(true).into_bytes());
    assert_eq!([0b0000_0100], TxQueueStatusReg0::new().with_txqeif(true).into_bytes());

    let status = TxQueueStatusReg0::from(0x05);
    assert!(status.txqnif());
    assert!(status.txqeif());
}

#[test]
fn test_filtercontrolreg() {
    assert_eq!(
        [0b1000_0001],
        FilterControlReg::new().with_flten(true).with_fbp(1).into_bytes()
    );
    assert_eq!([0b0001_1111], FilterControlReg::new().with_fbp(31).into_bytes());
}

#[test]
fn test_filter_object_register() {
    let filter = FilterObjectReg::new().with_sid(0x532).with_eid(0x12A2B).with_exide(true);

    assert_eq!(0x4951_5D32, u32::from(filter));
    assert_eq!([0x32, 0x5D, 0x51, 0x49], u32::from(filter).to_le_bytes());
}

#[test]
fn test_filter_mask_register() {
    let mask = FilterMaskReg::new().with_msid(0x3).with_mide(true);

    assert_eq!(0x4000_0003, u32::from(mask));
}

#[test]
fn test_nominal_bit_time_register() {
    let register = C1NBTCFG::new().with_brp(0).with_tseg1(62).with_tseg2(15).with_sjw(15);

    assert_eq!(0x003E_0F0F, u32::from(register));
}

#[test]
fn test_data_bit_time_register() {
    let register = C1DBTCFG::new().with_brp(0).with_tseg1(30).with_tseg2(7).with_sjw(7);

    assert_eq!(0x001E_0707, u32::from(register));
}

#[test]
fn test_control_register() {
    let register = C1CON::new()
        .with_reqop(0)
        .with_opmod(4)
        .with_txqen(true)
        .with_stef(true)
        .with_wft(3)
        .with_wakfil(true)
        .with_pxedis(true);

    assert_eq!(0x0098_0740, u32::from(register));
}

#[test]
fn test_buffer_register_addresses() {
    assert_eq!(0x050, fifo_control_register(0));
    assert_eq!(0x054, fifo_status_register(0));
    assert_eq!(0x058, fifo_user_address_register(0));

    assert_eq!(0x05C, fifo_control_register(1));
    assert_eq!(0x060, fifo_status_register(1));
    assert_eq!(0x064, fifo_user_address_register(1));

    assert_eq!(0x1C4, fifo_control_register(31));
    assert_eq!(0x1C8, fifo_status_register(31));
    assert_eq!(0x1CC, fifo_user_address_register(31));
}

#[test]
fn test_filter_register_addresses() {
    assert_eq!(0x1D0, filter_control_register(0));
    assert_eq!(0x1EC, filter_control_register(7));

    assert_eq!(0x1F0, filter_object_register(0));
    assert_eq!(0x1F4, filter_mask_register(0));
    assert_eq!(0x2E8, filter_object_register(31));
    assert_eq!(0x2EC, filter_mask_register(31));
}

#[test]
fn test_buffer_index_clamping() {
    assert_eq!(0, tx_buffer_index(0));
    assert_eq!(5, tx_buffer_index(5));
    assert_eq!(31, tx_buffer_index(32));
    assert_eq!(31, tx_buffer_index(255));

    assert_eq!(1, rx_fifo_index(0));
    assert_eq!(1, rx_fifo_index(1));
    assert_eq!(31, rx_fifo_index(31));
    assert_eq!(31, rx_fifo_index(200));
}
