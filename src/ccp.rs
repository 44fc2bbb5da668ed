//--------------------------------------------------------------------------------------------------------------------------------------------------
// Module ccp
// CCP protocol definitions: command codes, command return codes, resource and session status masks, error type

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::master::SessionState;

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CCP command codes

pub const CC_CONNECT: u8 = 0x01;
pub const CC_SET_MTA: u8 = 0x02;
pub const CC_DNLOAD: u8 = 0x03;
pub const CC_UPLOAD: u8 = 0x04;
pub const CC_TEST: u8 = 0x05;
pub const CC_START_STOP: u8 = 0x06;
pub const CC_DISCONNECT: u8 = 0x07;
pub const CC_START_STOP_ALL: u8 = 0x08;
pub const CC_SET_S_STATUS: u8 = 0x0C;
pub const CC_GET_S_STATUS: u8 = 0x0D;
pub const CC_BUILD_CHKSUM: u8 = 0x0E;
pub const CC_SHORT_UP: u8 = 0x0F;
pub const CC_CLEAR_MEMORY: u8 = 0x10;
pub const CC_GET_SEED: u8 = 0x12;
pub const CC_UNLOCK: u8 = 0x13;
pub const CC_GET_DAQ_SIZE: u8 = 0x14;
pub const CC_SET_DAQ_PTR: u8 = 0x15;
pub const CC_WRITE_DAQ: u8 = 0x16;
pub const CC_EXCHANGE_ID: u8 = 0x17;
pub const CC_PROGRAM: u8 = 0x18;
pub const CC_MOVE: u8 = 0x19;
pub const CC_GET_CCP_VERSION: u8 = 0x1B;
pub const CC_DIAG_SERVICE: u8 = 0x20;
pub const CC_ACTION_SERVICE: u8 = 0x21;
pub const CC_PROGRAM_6: u8 = 0x22;
pub const CC_DNLOAD_6: u8 = 0x23;

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CCP command enum

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect = CC_CONNECT as isize,
    SetMta = CC_SET_MTA as isize,
    Dnload = CC_DNLOAD as isize,
    Upload = CC_UPLOAD as isize,
    Test = CC_TEST as isize,
    StartStop = CC_START_STOP as isize,
    Disconnect = CC_DISCONNECT as isize,
    StartStopAll = CC_START_STOP_ALL as isize,
    SetSStatus = CC_SET_S_STATUS as isize,
    GetSStatus = CC_GET_S_STATUS as isize,
    BuildChksum = CC_BUILD_CHKSUM as isize,
    ShortUp = CC_SHORT_UP as isize,
    ClearMemory = CC_CLEAR_MEMORY as isize,
    GetSeed = CC_GET_SEED as isize,
    Unlock = CC_UNLOCK as isize,
    GetDaqSize = CC_GET_DAQ_SIZE as isize,
    SetDaqPtr = CC_SET_DAQ_PTR as isize,
    WriteDaq = CC_WRITE_DAQ as isize,
    ExchangeId = CC_EXCHANGE_ID as isize,
    Program = CC_PROGRAM as isize,
    Move = CC_MOVE as isize,
    GetCcpVersion = CC_GET_CCP_VERSION as isize,
    DiagService = CC_DIAG_SERVICE as isize,
    ActionService = CC_ACTION_SERVICE as isize,
    Program6 = CC_PROGRAM_6 as isize,
    Dnload6 = CC_DNLOAD_6 as isize,
}

impl Command {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Command> {
        match code {
            CC_CONNECT => Some(Command::Connect),
            CC_SET_MTA => Some(Command::SetMta),
            CC_DNLOAD => Some(Command::Dnload),
            CC_UPLOAD => Some(Command::Upload),
            CC_TEST => Some(Command::Test),
            CC_START_STOP => Some(Command::StartStop),
            CC_DISCONNECT => Some(Command::Disconnect),
            CC_START_STOP_ALL => Some(Command::StartStopAll),
            CC_SET_S_STATUS => Some(Command::SetSStatus),
            CC_GET_S_STATUS => Some(Command::GetSStatus),
            CC_BUILD_CHKSUM => Some(Command::BuildChksum),
            CC_SHORT_UP => Some(Command::ShortUp),
            CC_CLEAR_MEMORY => Some(Command::ClearMemory),
            CC_GET_SEED => Some(Command::GetSeed),
            CC_UNLOCK => Some(Command::Unlock),
            CC_GET_DAQ_SIZE => Some(Command::GetDaqSize),
            CC_SET_DAQ_PTR => Some(Command::SetDaqPtr),
            CC_WRITE_DAQ => Some(Command::WriteDaq),
            CC_EXCHANGE_ID => Some(Command::ExchangeId),
            CC_PROGRAM => Some(Command::Program),
            CC_MOVE => Some(Command::Move),
            CC_GET_CCP_VERSION => Some(Command::GetCcpVersion),
            CC_DIAG_SERVICE => Some(Command::DiagService),
            CC_ACTION_SERVICE => Some(Command::ActionService),
            CC_PROGRAM_6 => Some(Command::Program6),
            CC_DNLOAD_6 => Some(Command::Dnload6),
            _ => None,
        }
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CCP command return codes (CRC_ERR byte of the CRM)

pub const CRC_OK: u8 = 0x00;
pub const CRC_DAQ_OVERLOAD: u8 = 0x01;
pub const CRC_CMD_BUSY: u8 = 0x10;
pub const CRC_DAQ_BUSY: u8 = 0x11;
pub const CRC_INTERNAL_TIMEOUT: u8 = 0x12;
pub const CRC_CMD_UNKNOWN: u8 = 0x30;
pub const CRC_CMD_SYNTAX: u8 = 0x31;
pub const CRC_OUT_OF_RANGE: u8 = 0x32;
pub const CRC_ACCESS_DENIED: u8 = 0x33;
pub const CRC_OVERLOAD: u8 = 0x34;
pub const CRC_ACCESS_LOCKED: u8 = 0x35;
pub const CRC_NOT_AVAILABLE: u8 = 0x36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Acknowledge,
    DaqOverload,
    CommandProcessorBusy,
    DaqProcessorBusy,
    InternalTimeout,
    UnknownCommand,
    CommandSyntax,
    OutOfRange,
    AccessDenied,
    Overload,
    AccessLocked,
    ResourceNotAvailable,
    Other(u8),
}

impl ReturnCode {
    pub fn from_code(code: u8) -> ReturnCode {
        match code {
            CRC_OK => ReturnCode::Acknowledge,
            CRC_DAQ_OVERLOAD => ReturnCode::DaqOverload,
            CRC_CMD_BUSY => ReturnCode::CommandProcessorBusy,
            CRC_DAQ_BUSY => ReturnCode::DaqProcessorBusy,
            CRC_INTERNAL_TIMEOUT => ReturnCode::InternalTimeout,
            CRC_CMD_UNKNOWN => ReturnCode::UnknownCommand,
            CRC_CMD_SYNTAX => ReturnCode::CommandSyntax,
            CRC_OUT_OF_RANGE => ReturnCode::OutOfRange,
            CRC_ACCESS_DENIED => ReturnCode::AccessDenied,
            CRC_OVERLOAD => ReturnCode::Overload,
            CRC_ACCESS_LOCKED => ReturnCode::AccessLocked,
            CRC_NOT_AVAILABLE => ReturnCode::ResourceNotAvailable,
            other => ReturnCode::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ReturnCode::Acknowledge => CRC_OK,
            ReturnCode::DaqOverload => CRC_DAQ_OVERLOAD,
            ReturnCode::CommandProcessorBusy => CRC_CMD_BUSY,
            ReturnCode::DaqProcessorBusy => CRC_DAQ_BUSY,
            ReturnCode::InternalTimeout => CRC_INTERNAL_TIMEOUT,
            ReturnCode::UnknownCommand => CRC_CMD_UNKNOWN,
            ReturnCode::CommandSyntax => CRC_CMD_SYNTAX,
            ReturnCode::OutOfRange => CRC_OUT_OF_RANGE,
            ReturnCode::AccessDenied => CRC_ACCESS_DENIED,
            ReturnCode::Overload => CRC_OVERLOAD,
            ReturnCode::AccessLocked => CRC_ACCESS_LOCKED,
            ReturnCode::ResourceNotAvailable => CRC_NOT_AVAILABLE,
            ReturnCode::Other(code) => code,
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReturnCode::Acknowledge => write!(f, "acknowledge"),
            ReturnCode::DaqOverload => write!(f, "DAQ overload"),
            ReturnCode::CommandProcessorBusy => write!(f, "command processor busy"),
            ReturnCode::DaqProcessorBusy => write!(f, "DAQ processor busy"),
            ReturnCode::InternalTimeout => write!(f, "internal timeout"),
            ReturnCode::UnknownCommand => write!(f, "unknown command"),
            ReturnCode::CommandSyntax => write!(f, "command syntax"),
            ReturnCode::OutOfRange => write!(f, "parameter out of range"),
            ReturnCode::AccessDenied => write!(f, "access denied"),
            ReturnCode::Overload => write!(f, "overload"),
            ReturnCode::AccessLocked => write!(f, "access locked"),
            ReturnCode::ResourceNotAvailable => write!(f, "resource or function not available"),
            ReturnCode::Other(code) => write!(f, "return code 0x{code:02X}"),
        }
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Resource mask for EXCHANGE_ID, GET_SEED and UNLOCK

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ResourceMask: u8 {
        const CAL = 0x01;
        const DAQ = 0x02;
        const PGM = 0x40;
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Session status bits for SET_S_STATUS / GET_S_STATUS

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SessionStatus: u8 {
        const CAL = 0x01;
        const DAQ = 0x02;
        const RESUME = 0x04;
        const STORE = 0x40;
        const RUN = 0x80;
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CCP error type

#[derive(Debug, thiserror::Error)]
pub enum CcpError {
    /// No CRM arrived within the configured request timeout
    #[error("command response timeout")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The CRM carried a non-zero command return code
    #[error("{command:?}: slave returned {code}")]
    Slave { command: Command, code: ReturnCode },

    #[error("cannot encode {field}: {reason}")]
    Encode { field: &'static str, reason: &'static str },

    #[error("cannot decode frame at byte {offset}: {reason}")]
    Decode { offset: usize, reason: &'static str },

    #[error("operation requires session state {expected:?}, current state is {actual:?}")]
    ProtocolViolation { expected: SessionState, actual: SessionState },

    /// The element set does not fit the ODTs the slave reported
    #[error("DAQ capacity exceeded: {requested_bytes} signal bytes requested, {available} available")]
    Capacity { requested_bytes: usize, available: usize },

    #[error("request cancelled")]
    Cancelled,

    /// `daq_run` without a prior successful `daq_initialize`
    #[error("DAQ is not initialized")]
    DaqNotInitialized,

    /// The receive pump terminated, the session is unusable
    #[error("receive pump terminated")]
    PumpTerminated,
}

impl CcpError {
    /// Errors which poison the session until DISCONNECT
    pub fn is_fatal(&self) -> bool {
        match self {
            CcpError::Timeout | CcpError::Transport(_) | CcpError::PumpTerminated => true,
            CcpError::Slave { code, .. } => *code == ReturnCode::InternalTimeout,
            _ => false,
        }
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Tests
