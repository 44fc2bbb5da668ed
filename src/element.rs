//--------------------------------------------------------------------------------------------------------------------------------------------------
// Module element
// Signal metadata consumed by the DAQ layer
// An A2L toolchain (or any other symbol source) produces these, the core never
// parses symbol files itself

use crate::ccp::CcpError;
use crate::frame::Endian;

/// A signal to be acquired via DAQ
///
/// `size` is the slave side storage size in bytes and must be 1, 2 or 4.
/// The decoded raw value is linearized to `raw * scale + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub address: u32,
    pub extension: u8,
    pub size: u8,
    pub is_signed: bool,
    pub byte_order: Endian,
    pub scale: f64,
    pub offset: f64,
}

impl Element {
    pub fn new<N: Into<String>>(name: N, address: u32, size: u8) -> Result<Element, CcpError> {
        if !matches!(size, 1 | 2 | 4) {
            return Err(CcpError::Encode {
                field: "size",
                reason: "element size must be 1, 2 or 4",
            });
        }
        Ok(Element {
            name: name.into(),
            address,
            extension: 0,
            size,
            is_signed: false,
            byte_order: Endian::default(),
            scale: 1.0,
            offset: 0.0,
        })
    }

    pub fn signed(mut self) -> Element {
        self.is_signed = true;
        self
    }

    pub fn with_extension(mut self, extension: u8) -> Element {
        self.extension = extension;
        self
    }

    pub fn with_byte_order(mut self, byte_order: Endian) -> Element {
        self.byte_order = byte_order;
        self
    }

    pub fn with_scaling(mut self, scale: f64, offset: f64) -> Element {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Interpret `size` raw bytes and linearize to an engineering value
    /// Returns None if the slice is shorter than the element
    pub fn decode(&self, bytes: &[u8]) -> Option<f64> {
        if bytes.len() < self.size as usize {
            return None;
        }
        let raw: f64 = match (self.size, self.is_signed) {
            (1, false) => bytes[0] as f64,
            (1, true) => bytes[0] as i8 as f64,
            (2, false) => self.byte_order.read_u16(bytes) as f64,
            (2, true) => self.byte_order.read_i16(bytes) as f64,
            (4, false) => self.byte_order.read_u32(bytes) as f64,
            (4, true) => self.byte_order.read_i32(bytes) as f64,
            _ => return None,
        };
        Some(raw * self.scale + self.offset)
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Tests
