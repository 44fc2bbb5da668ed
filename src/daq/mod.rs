//--------------------------------------------------------------------------------------------------------------------------------------------------
// Module daq
// DAQ list partitioning and DAQ DTO decoding
// Elements are packed first fit into ODTs of 7 signal bytes (byte 0 of the
// DAQ DTO frame carries the ODT PID), an element never straddles an ODT
// boundary. The decoder turns inbound DAQ DTOs back into scaled samples.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use std::sync::Arc;
use std::time::Instant;

use crate::ccp::CcpError;
use crate::element::Element;
use crate::master::SessionCounters;

/// Signal bytes per ODT, one byte of the 8 byte frame is the PID
pub const ODT_PAYLOAD: usize = 7;

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Sample sink

/// Receives every decoded sample
/// Implemented for any `FnMut(&str, f64, Instant)` closure
pub trait SampleSink: Send + 'static {
    fn on_sample(&mut self, name: &str, value: f64, timestamp: Instant);
}

impl<F> SampleSink for F
where
    F: FnMut(&str, f64, Instant) + Send + 'static,
{
    fn on_sample(&mut self, name: &str, value: f64, timestamp: Instant) {
        self(name, value, timestamp)
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// ODT map

/// Placement of one element inside its ODT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OdtEntry {
    /// Index into the element list of the map
    pub element: usize,
    /// Byte offset inside the 7 signal bytes of the ODT
    pub offset: u8,
}

/// The packing result for one DAQ list
#[derive(Debug, Clone)]
pub struct OdtMap {
    pub daq_list: u8,
    pub elements: Vec<Element>,
    pub odts: Vec<Vec<OdtEntry>>,
}

impl OdtMap {
    pub fn last_odt(&self) -> u8 {
        (self.odts.len() as u8).saturating_sub(1)
    }

    /// Entries in arming order: ODT by ODT, elements in packing order
    pub fn iter_entries(&self) -> impl Iterator<Item = (u8, u8, &Element)> + '_ {
        self.odts.iter().enumerate().flat_map(move |(odt, entries)| {
            entries
                .iter()
                .enumerate()
                .map(move |(idx, entry)| (odt as u8, idx as u8, &self.elements[entry.element]))
        })
    }
}

/// First fit packing of `elements` into the ODTs of one DAQ list
///
/// The caller order is kept, each element lands at the next free offset of
/// the current ODT or opens a new one. An element that would fill a row to
/// all 7 bytes opens a new ODT instead, a row carries at most 6 signal
/// bytes. Fails when more ODTs are needed than the slave reported for this
/// list.
pub fn partition(daq_list: u8, elements: Vec<Element>, available_odts: u8) -> Result<OdtMap, CcpError> {
    let mut odts: Vec<Vec<OdtEntry>> = Vec::new();
    let mut fill: usize = ODT_PAYLOAD; // force a new ODT for the first element

    for (element_idx, element) in elements.iter().enumerate() {
        let size = element.size as usize;
        if fill + size >= ODT_PAYLOAD {
            odts.push(Vec::new());
            fill = 0;
        }
        odts.last_mut().unwrap().push(OdtEntry {
            element: element_idx,
            offset: fill as u8,
        });
        fill += size;
    }

    if odts.len() > available_odts as usize {
        let requested_bytes = elements.iter().map(|e| e.size as usize).sum();
        return Err(CcpError::Capacity {
            requested_bytes,
            available: available_odts as usize * ODT_PAYLOAD,
        });
    }

    debug!("DAQ list {}: packed {} elements into {} ODTs", daq_list, elements.len(), odts.len());
    Ok(OdtMap { daq_list, elements, odts })
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// DAQ DTO decoder

/// Decodes inbound DAQ DTOs against the armed ODT map and feeds the sink
///
/// Fed by the receive pump. Never fails upward: frames with a PID outside the
/// armed range and undecodable slices only bump the session counters.
pub struct DaqDecoder {
    map: OdtMap,
    first_pid: u8,
    sink: Box<dyn SampleSink>,
    counters: Arc<SessionCounters>,
    running: bool,
}

impl DaqDecoder {
    pub fn new(map: OdtMap, first_pid: u8, sink: Box<dyn SampleSink>, counters: Arc<SessionCounters>) -> DaqDecoder {
        DaqDecoder {
            map,
            first_pid,
            sink,
            counters,
            running: false,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle(&mut self, pid: u8, data: &[u8; ODT_PAYLOAD], timestamp: Instant) {
        if !self.running {
            trace!("DAQ DTO pid=0x{:02X} while measurement stopped, dropped", pid);
            return;
        }
        let odt = match pid.checked_sub(self.first_pid) {
            Some(odt) if (odt as usize) < self.map.odts.len() => odt as usize,
            _ => {
                self.counters.bump_unexpected_pid();
                warn!("DAQ DTO with unexpected pid=0x{:02X}, first_pid=0x{:02X}", pid, self.first_pid);
                return;
            }
        };
        for entry in &self.map.odts[odt] {
            let element = &self.map.elements[entry.element];
            match element.decode(&data[entry.offset as usize..]) {
                Some(value) => self.sink.on_sample(&element.name, value, timestamp),
                None => {
                    self.counters.bump_decode_errors();
                    error!("cannot decode element {} from ODT {} at offset {}", element.name, odt, entry.offset);
                }
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Tests
