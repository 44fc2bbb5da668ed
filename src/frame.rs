//--------------------------------------------------------------------------------------------------------------------------------------------------
// Module frame
// CCP frame codec: CRO builders and DTO parsing
// A CRO is always 8 bytes [CMD, CTR, param0..param5], unused trailing bytes zero filled
// A DTO is distinguished by its first byte: 0xFF CRM, 0xFE event, otherwise DAQ with PID = byte 0

use bytes::{BufMut, BytesMut};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::ccp::{CcpError, ResourceMask, SessionStatus};
use crate::ccp::{
    CC_BUILD_CHKSUM, CC_CLEAR_MEMORY, CC_CONNECT, CC_DISCONNECT, CC_DNLOAD, CC_DNLOAD_6, CC_EXCHANGE_ID, CC_GET_CCP_VERSION, CC_GET_DAQ_SIZE, CC_GET_SEED,
    CC_GET_S_STATUS, CC_MOVE, CC_SET_DAQ_PTR, CC_SET_MTA, CC_SET_S_STATUS, CC_SHORT_UP, CC_START_STOP, CC_START_STOP_ALL, CC_UNLOCK, CC_UPLOAD, CC_WRITE_DAQ,
};

/// CAN payload length, CCP always uses full 8 byte frames
pub const CCP_FRAME_LEN: usize = 8;

/// Largest PID value of a DAQ DTO, 0xFE and 0xFF are event and CRM
pub const DAQ_PID_MAX: u8 = 0xFD;

pub const PID_CRM: u8 = 0xFF;
pub const PID_EVENT: u8 = 0xFE;

/// Maximum data bytes of UPLOAD, SHORT_UP and DNLOAD
pub const MAX_BLOCK_SIZE: u8 = 5;

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Byte order of multi byte CRO parameters and DAQ signal data

/// Byte order of the slave, configured per session
/// CCP slaves are most commonly Motorola devices, so big endian is the default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Big => BigEndian::read_u16(buf),
            Endian::Little => LittleEndian::read_u16(buf),
        }
    }

    pub fn read_i16(self, buf: &[u8]) -> i16 {
        match self {
            Endian::Big => BigEndian::read_i16(buf),
            Endian::Little => LittleEndian::read_i16(buf),
        }
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Big => BigEndian::read_u32(buf),
            Endian::Little => LittleEndian::read_u32(buf),
        }
    }

    pub fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Big => BigEndian::read_i32(buf),
            Endian::Little => LittleEndian::read_i32(buf),
        }
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CRO builder

/// Build an 8 byte CRO payload
/// Multi byte parameters are written in the slave byte order, except where the
/// protocol fixes little endian (station address in CONNECT/DISCONNECT)
pub struct CroBuilder {
    data: BytesMut,
    endian: Endian,
}

impl CroBuilder {
    pub fn new(command_code: u8, ctr: u8, endian: Endian) -> CroBuilder {
        let mut cro = CroBuilder {
            data: BytesMut::with_capacity(CCP_FRAME_LEN),
            endian,
        };
        cro.data.put_u8(command_code);
        cro.data.put_u8(ctr);
        cro
    }

    pub fn add_u8(&mut self, value: u8) -> &mut Self {
        self.data.put_u8(value);
        self
    }

    pub fn add_u16(&mut self, value: u16) -> &mut Self {
        match self.endian {
            Endian::Big => self.data.put_u16(value),
            Endian::Little => self.data.put_u16_le(value),
        }
        self
    }

    // Station address fields are little endian regardless of the slave byte order
    pub fn add_u16_le(&mut self, value: u16) -> &mut Self {
        self.data.put_u16_le(value);
        self
    }

    pub fn add_u32(&mut self, value: u32) -> &mut Self {
        match self.endian {
            Endian::Big => self.data.put_u32(value),
            Endian::Little => self.data.put_u32_le(value),
        }
        self
    }

    pub fn add_slice(&mut self, value: &[u8]) -> &mut Self {
        self.data.put_slice(value);
        self
    }

    pub fn build(&mut self) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
        if self.data.len() > CCP_FRAME_LEN {
            return Err(CcpError::Encode {
                field: "payload",
                reason: "CRO parameters exceed 8 bytes",
            });
        }
        let mut frame = [0u8; CCP_FRAME_LEN];
        frame[..self.data.len()].copy_from_slice(&self.data);
        Ok(frame)
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Typed CRO encoders, one per command kind

/// START_STOP mode parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStopMode {
    Stop = 0x00,
    Start = 0x01,
    Prepare = 0x02,
}

/// DISCONNECT type parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectKind {
    Temporary = 0x00,
    EndOfSession = 0x01,
}

pub fn connect(ctr: u8, station_address: u16) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_CONNECT, ctr, Endian::Little);
    cro.add_u16_le(station_address);
    cro.build().unwrap()
}

pub fn exchange_id(ctr: u8, master_id: &[u8]) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if master_id.len() > 6 {
        return Err(CcpError::Encode {
            field: "master_id",
            reason: "master device id is limited to 6 bytes",
        });
    }
    let mut cro = CroBuilder::new(CC_EXCHANGE_ID, ctr, Endian::Big);
    cro.add_slice(master_id);
    cro.build()
}

pub fn get_ccp_version(ctr: u8, major: u8, minor: u8) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_GET_CCP_VERSION, ctr, Endian::Big);
    cro.add_u8(major).add_u8(minor);
    cro.build().unwrap()
}

pub fn get_seed(ctr: u8, resource: ResourceMask) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_GET_SEED, ctr, Endian::Big);
    cro.add_u8(resource.bits());
    cro.build().unwrap()
}

pub fn unlock(ctr: u8, key: &[u8]) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if key.is_empty() || key.len() > 6 {
        return Err(CcpError::Encode {
            field: "key",
            reason: "key must be 1 to 6 bytes",
        });
    }
    let mut cro = CroBuilder::new(CC_UNLOCK, ctr, Endian::Big);
    cro.add_slice(key);
    cro.build()
}

pub fn set_mta(ctr: u8, endian: Endian, mta: u8, extension: u8, address: u32) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if mta > 1 {
        return Err(CcpError::Encode {
            field: "mta",
            reason: "MTA number must be 0 or 1",
        });
    }
    let mut cro = CroBuilder::new(CC_SET_MTA, ctr, endian);
    cro.add_u8(mta).add_u8(extension).add_u32(address);
    cro.build()
}

pub fn dnload(ctr: u8, data: &[u8]) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if data.is_empty() || data.len() > MAX_BLOCK_SIZE as usize {
        return Err(CcpError::Encode {
            field: "data",
            reason: "DNLOAD carries 1 to 5 bytes",
        });
    }
    let mut cro = CroBuilder::new(CC_DNLOAD, ctr, Endian::Big);
    cro.add_u8(data.len() as u8).add_slice(data);
    cro.build()
}

pub fn dnload_6(ctr: u8, data: &[u8; 6]) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_DNLOAD_6, ctr, Endian::Big);
    cro.add_slice(data);
    cro.build().unwrap()
}

pub fn upload(ctr: u8, size: u8) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if size == 0 || size > MAX_BLOCK_SIZE {
        return Err(CcpError::Encode {
            field: "size",
            reason: "UPLOAD reads 1 to 5 bytes",
        });
    }
    let mut cro = CroBuilder::new(CC_UPLOAD, ctr, Endian::Big);
    cro.add_u8(size);
    cro.build()
}

pub fn short_up(ctr: u8, endian: Endian, size: u8, extension: u8, address: u32) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if size == 0 || size > MAX_BLOCK_SIZE {
        return Err(CcpError::Encode {
            field: "size",
            reason: "SHORT_UP reads 1 to 5 bytes",
        });
    }
    let mut cro = CroBuilder::new(CC_SHORT_UP, ctr, endian);
    cro.add_u8(size).add_u8(extension).add_u32(address);
    cro.build()
}

pub fn clear_memory(ctr: u8, endian: Endian, size: u32) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_CLEAR_MEMORY, ctr, endian);
    cro.add_u32(size);
    cro.build().unwrap()
}

pub fn move_memory(ctr: u8, endian: Endian, size: u32) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_MOVE, ctr, endian);
    cro.add_u32(size);
    cro.build().unwrap()
}

pub fn build_chksum(ctr: u8, endian: Endian, size: u32) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_BUILD_CHKSUM, ctr, endian);
    cro.add_u32(size);
    cro.build().unwrap()
}

pub fn set_s_status(ctr: u8, status: SessionStatus) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_SET_S_STATUS, ctr, Endian::Big);
    cro.add_u8(status.bits());
    cro.build().unwrap()
}

pub fn get_s_status(ctr: u8) -> [u8; CCP_FRAME_LEN] {
    CroBuilder::new(CC_GET_S_STATUS, ctr, Endian::Big).build().unwrap()
}

pub fn get_daq_size(ctr: u8, endian: Endian, daq_list: u8, dto_id: u32) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_GET_DAQ_SIZE, ctr, endian);
    cro.add_u8(daq_list).add_u8(0).add_u32(dto_id);
    cro.build().unwrap()
}

pub fn set_daq_ptr(ctr: u8, daq_list: u8, odt: u8, element: u8) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_SET_DAQ_PTR, ctr, Endian::Big);
    cro.add_u8(daq_list).add_u8(odt).add_u8(element);
    cro.build().unwrap()
}

pub fn write_daq(ctr: u8, endian: Endian, size: u8, extension: u8, address: u32) -> Result<[u8; CCP_FRAME_LEN], CcpError> {
    if !matches!(size, 1 | 2 | 4) {
        return Err(CcpError::Encode {
            field: "size",
            reason: "DAQ element size must be 1, 2 or 4",
        });
    }
    let mut cro = CroBuilder::new(CC_WRITE_DAQ, ctr, endian);
    cro.add_u8(size).add_u8(extension).add_u32(address);
    cro.build()
}

pub fn start_stop(ctr: u8, endian: Endian, mode: StartStopMode, daq_list: u8, last_odt: u8, event_channel: u8, prescaler: u16) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_START_STOP, ctr, endian);
    cro.add_u8(mode as u8).add_u8(daq_list).add_u8(last_odt).add_u8(event_channel).add_u16(prescaler);
    cro.build().unwrap()
}

pub fn start_stop_all(ctr: u8, start: bool) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_START_STOP_ALL, ctr, Endian::Big);
    cro.add_u8(start as u8);
    cro.build().unwrap()
}

pub fn disconnect(ctr: u8, kind: DisconnectKind, station_address: u16) -> [u8; CCP_FRAME_LEN] {
    let mut cro = CroBuilder::new(CC_DISCONNECT, ctr, Endian::Little);
    cro.add_u8(kind as u8).add_u8(0).add_u16_le(station_address);
    cro.build().unwrap()
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// DTO parsing

/// A parsed slave to master DTO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dto {
    /// Command return message: [0xFF, CRC_ERR, CTR, return0..return4]
    Crm { crc: u8, ctr: u8, data: [u8; 5] },
    /// Asynchronous event message: [0xFE, EVENT_CODE, ..]
    Event { code: u8 },
    /// DAQ data: [ODT PID, data0..data6]
    Daq { pid: u8, data: [u8; 7] },
}

impl Dto {
    pub fn parse(payload: &[u8]) -> Result<Dto, CcpError> {
        if payload.len() < CCP_FRAME_LEN {
            return Err(CcpError::Decode {
                offset: payload.len(),
                reason: "DTO payload shorter than 8 bytes",
            });
        }
        match payload[0] {
            PID_CRM => {
                let mut data = [0u8; 5];
                data.copy_from_slice(&payload[3..8]);
                Ok(Dto::Crm {
                    crc: payload[1],
                    ctr: payload[2],
                    data,
                })
            }
            PID_EVENT => Ok(Dto::Event { code: payload[1] }),
            pid => {
                let mut data = [0u8; 7];
                data.copy_from_slice(&payload[1..8]);
                Ok(Dto::Daq { pid, data })
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// DTO encoders
// The master never sends DTOs, these exist for the slave side of loopback test benches

pub fn encode_crm(crc: u8, ctr: u8, data: &[u8]) -> [u8; CCP_FRAME_LEN] {
    assert!(data.len() <= 5);
    let mut frame = [0u8; CCP_FRAME_LEN];
    frame[0] = PID_CRM;
    frame[1] = crc;
    frame[2] = ctr;
    frame[3..3 + data.len()].copy_from_slice(data);
    frame
}

pub fn encode_event(code: u8) -> [u8; CCP_FRAME_LEN] {
    let mut frame = [0u8; CCP_FRAME_LEN];
    frame[0] = PID_EVENT;
    frame[1] = code;
    frame
}

pub fn encode_daq(pid: u8, data: &[u8]) -> [u8; CCP_FRAME_LEN] {
    assert!(pid <= DAQ_PID_MAX && data.len() <= 7);
    let mut frame = [0u8; CCP_FRAME_LEN];
    frame[0] = pid;
    frame[1..1 + data.len()].copy_from_slice(data);
    frame
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CRM payload layouts

/// EXCHANGE_ID return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeIdInfo {
    pub slave_id_length: u8,
    pub data_type: u8,
    pub availability: ResourceMask,
    pub protection: ResourceMask,
}

pub fn parse_exchange_id(data: &[u8; 5]) -> ExchangeIdInfo {
    ExchangeIdInfo {
        slave_id_length: data[0],
        data_type: data[1],
        availability: ResourceMask::from_bits_truncate(data[2]),
        protection: ResourceMask::from_bits_truncate(data[3]),
    }
}

/// GET_SEED return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedInfo {
    /// True while the requested resource is still locked
    pub protected: bool,
    pub seed: [u8; 4],
}

pub fn parse_get_seed(data: &[u8; 5]) -> SeedInfo {
    let mut seed = [0u8; 4];
    seed.copy_from_slice(&data[1..5]);
    SeedInfo {
        protected: data[0] != 0,
        seed,
    }
}

/// GET_CCP_VERSION return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u8,
    pub minor: u8,
}

pub fn parse_version(data: &[u8; 5]) -> VersionInfo {
    VersionInfo { major: data[0], minor: data[1] }
}

/// GET_DAQ_SIZE return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaqSizeInfo {
    /// Number of ODTs available in the DAQ list
    pub odt_count: u8,
    /// PID of the first ODT of the list in DAQ DTO frames
    pub first_pid: u8,
}

pub fn parse_daq_size(data: &[u8; 5]) -> DaqSizeInfo {
    DaqSizeInfo {
        odt_count: data[0],
        first_pid: data[1],
    }
}

/// DNLOAD / DNLOAD_6 return data: the slave MTA0 after the write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtaInfo {
    pub extension: u8,
    pub address: u32,
}

pub fn parse_mta(data: &[u8; 5], endian: Endian) -> MtaInfo {
    MtaInfo {
        extension: data[0],
        address: endian.read_u32(&data[1..5]),
    }
}

/// BUILD_CHKSUM return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumInfo {
    pub size: u8,
    pub checksum: [u8; 4],
}

pub fn parse_chksum(data: &[u8; 5]) -> ChecksumInfo {
    let mut checksum = [0u8; 4];
    checksum.copy_from_slice(&data[1..5]);
    ChecksumInfo { size: data[0], checksum }
}

/// GET_S_STATUS return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatusInfo {
    pub status: SessionStatus,
    pub qualifier: u8,
}

pub fn parse_s_status(data: &[u8; 5]) -> SessionStatusInfo {
    SessionStatusInfo {
        status: SessionStatus::from_bits_truncate(data[0]),
        qualifier: data[1],
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Tests
