//--------------------------------------------------------------------------------------------------------------------------------------------------
// Module transport
// Thin contract over the CAN interface
// The master sends CROs with the configured CRO id and the receive pump drops
// every inbound frame whose id is not the configured DTO id

use std::future::Future;
use std::io;
use std::time::Instant;

use crate::frame::CCP_FRAME_LEN;

/// A classic CAN 2.0 frame as seen by the CCP layer
/// CCP uses the full 8 byte payload, unused trailing bytes are zero
#[derive(Debug, Clone, Copy)]
pub struct CanFrame {
    pub id: u32,
    pub data: [u8; CCP_FRAME_LEN],
    pub timestamp: Instant,
}

impl CanFrame {
    /// Frame with the payload zero filled to 8 bytes
    pub fn new(id: u32, data: &[u8]) -> CanFrame {
        assert!(data.len() <= CCP_FRAME_LEN);
        let mut payload = [0u8; CCP_FRAME_LEN];
        payload[..data.len()].copy_from_slice(data);
        CanFrame {
            id,
            data: payload,
            timestamp: Instant::now(),
        }
    }
}

/// The CAN bus driver contract consumed by the master
///
/// Both methods take `&self` so the master and its receive pump can share one
/// transport behind an `Arc`. Implementations wrap whatever CAN access the
/// embedder has (socketcan, a vendor API, a channel pair in tests).
pub trait CanTransport: Send + Sync + 'static {
    /// Publish one frame on the bus
    fn send(&self, frame: CanFrame) -> impl Future<Output = io::Result<()>> + Send;

    /// Wait for the next inbound frame, any id
    fn recv(&self) -> impl Future<Output = io::Result<CanFrame>> + Send;
}
