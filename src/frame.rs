use crate::message::{FrameFormat, TxMessage, MAX_PAYLOAD_CAN_2_0};
use bytes::Bytes;
use embedded_can::{Frame, Id};

/// Payload of remote frames
static REMOTE_PAYLOAD: [u8; MAX_PAYLOAD_CAN_2_0] = [0; MAX_PAYLOAD_CAN_2_0];

/// Classic CAN 2.0 frames for generic `embedded-can` users
impl Frame for TxMessage {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        TxMessage::new(id.into(), FrameFormat::Can20, Bytes::copy_from_slice(data)).ok()
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD_CAN_2_0 {
            return None;
        }

        TxMessage::new(
            id.into(),
            FrameFormat::Can20Remote,
            Bytes::from_static(&REMOTE_PAYLOAD[..dlc]),
        )
        .ok()
    }

    fn is_extended(&self) -> bool {
        self.header.identifier_extension_flag()
    }

    fn is_remote_frame(&self) -> bool {
        self.header.remote_transmission_request()
    }

    fn id(&self) -> Id {
        TxMessage::id(self)
    }

    fn dlc(&self) -> usize {
        self.header.data_length_code().code() as usize
    }

    fn data(&self) -> &[u8] {
        self.get_payload()
    }
}
