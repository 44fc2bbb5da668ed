//-----------------------------------------------------------------------------
// Crate ccp
// Path: src/lib.rs
//
// CCP (CAN Calibration Protocol) master
//
// One master talks to one slave ECU over a pair of CAN identifiers: CROs go
// out with the CRO id, every CRM, event and DAQ DTO comes back on the DTO id.
// The embedder supplies the CAN driver (transport::CanTransport), the signal
// descriptors (element::Element, typically distilled from an A2L file) and a
// sample sink, and gets connect/upload/download primitives plus a DAQ
// scheduler that streams scaled engineering values.

// This crate is a library
#![crate_type = "lib"]
// The library crate is named "ccp"
#![crate_name = "ccp"]

use std::time::Duration;

//-----------------------------------------------------------------------------

// Protocol definitions
pub mod ccp;
pub use ccp::CcpError;
pub use ccp::Command;
pub use ccp::ResourceMask;
pub use ccp::ReturnCode;
pub use ccp::SessionStatus;

// Frame codec
pub mod frame;
pub use frame::DisconnectKind;
pub use frame::Dto;
pub use frame::Endian;
pub use frame::StartStopMode;

// CAN transport contract
pub mod transport;
pub use transport::CanFrame;
pub use transport::CanTransport;

// Signal metadata
pub mod element;
pub use element::Element;

// DAQ partitioning and decoding
pub mod daq;
pub use daq::SampleSink;

// Command engine and session manager
pub mod master;
pub use master::CcpEvent;
pub use master::CcpMaster;
pub use master::CounterSnapshot;
pub use master::SessionState;

//-----------------------------------------------------------------------------
// Master configuration

/// Default per command response timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

/// Per session configuration of a [`CcpMaster`]
#[derive(Debug, Clone, Copy)]
pub struct MasterConfig {
    /// CAN id of master to slave CROs
    pub cro_id: u32,
    /// CAN id of slave to master DTOs (CRM, event and DAQ share it)
    pub dto_id: u32,
    /// 16 bit station address of the slave, always little endian on the wire
    pub station_address: u16,
    /// Byte order of multi byte CRO parameters and CRM return data
    pub byte_order: Endian,
    /// Response timeout per request
    pub timeout: Duration,
}

impl MasterConfig {
    pub fn new(cro_id: u32, dto_id: u32, station_address: u16) -> MasterConfig {
        MasterConfig {
            cro_id,
            dto_id,
            station_address,
            byte_order: Endian::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_byte_order(mut self, byte_order: Endian) -> MasterConfig {
        self.byte_order = byte_order;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> MasterConfig {
        self.timeout = timeout;
        self
    }
}
