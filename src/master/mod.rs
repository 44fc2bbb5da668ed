//--------------------------------------------------------------------------------------------------------------------------------------------------
// Module master
// CCP master: command engine and session manager
// Owns the command counter and the single outstanding request, correlates CROs
// with their CRM by CTR, drives the session lifecycle and the MTA mirrors, and
// feeds DAQ DTOs to the armed decoder

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::timeout;

use crate::MasterConfig;
use crate::ccp::{CcpError, Command, ResourceMask, ReturnCode, SessionStatus};
use crate::daq::{self, DaqDecoder, SampleSink};
use crate::element::Element;
use crate::frame::{self, ChecksumInfo, DaqSizeInfo, DisconnectKind, Dto, ExchangeIdInfo, MtaInfo, SeedInfo, SessionStatusInfo, StartStopMode, VersionInfo};
use crate::transport::{CanFrame, CanTransport};

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Session state

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Exchanging,
    Ready,
    DaqRunning,
    Faulted,
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Diagnostic counters
// The decoder and the receive pump never raise, they count

#[derive(Debug, Default)]
pub struct SessionCounters {
    crm_mismatched_ctr: AtomicU32,
    unexpected_pid: AtomicU32,
    decode_errors: AtomicU32,
}

impl SessionCounters {
    pub(crate) fn bump_crm_mismatched(&self) {
        self.crm_mismatched_ctr.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_unexpected_pid(&self) {
        self.unexpected_pid.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_decode_errors(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            crm_mismatched_ctr: self.crm_mismatched_ctr.load(Ordering::Relaxed),
            unexpected_pid: self.unexpected_pid.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub crm_mismatched_ctr: u32,
    pub unexpected_pid: u32,
    pub decode_errors: u32,
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Asynchronous slave events

/// An Event Message (pid 0xFE) forwarded by the receive pump
#[derive(Debug, Clone, Copy)]
pub struct CcpEvent {
    pub code: u8,
    pub timestamp: Instant,
}

/// Event code a slave reports when the DAQ processor cannot keep up
pub const EV_DAQ_OVERLOAD: u8 = 0x01;

//--------------------------------------------------------------------------------------------------------------------------------------------------
// Receive pump

#[derive(Debug, Clone, Copy)]
struct CrmMessage {
    ctr: u8,
    crc: u8,
    data: [u8; 5],
}

// Clears the pending slot when a request is dropped or times out, so that a
// late CRM with this CTR is discarded instead of completing a dead request
struct PendingGuard {
    pending: Arc<Mutex<Option<u8>>>,
    ctr: u8,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        if *pending == Some(self.ctr) {
            *pending = None;
            debug!("request ctr={} abandoned", self.ctr);
        }
    }
}

// The only reader of the transport and the only writer to the pending request
// completion channel and the DAQ decoder
async fn receive_pump<T: CanTransport>(
    transport: Arc<T>,
    dto_id: u32,
    pending: Arc<Mutex<Option<u8>>>,
    tx_crm: Sender<CrmMessage>,
    tx_event: Sender<CcpEvent>,
    decoder: Arc<Mutex<Option<DaqDecoder>>>,
    counters: Arc<SessionCounters>,
    transport_failed: Arc<AtomicBool>,
) {
    loop {
        let frame = match transport.recv().await {
            Ok(frame) => frame,
            Err(e) => {
                error!("receive pump: transport failed: {e}");
                transport_failed.store(true, Ordering::Relaxed);
                break;
            }
        };
        if frame.id != dto_id {
            trace!("dropped frame with id 0x{:X}", frame.id);
            continue;
        }
        match Dto::parse(&frame.data) {
            Err(e) => {
                counters.bump_decode_errors();
                warn!("undecodable DTO: {e}");
            }
            Ok(Dto::Crm { crc, ctr, data }) => {
                let matched = {
                    let mut pending = pending.lock();
                    if *pending == Some(ctr) {
                        *pending = None;
                        true
                    } else {
                        false
                    }
                };
                if matched {
                    // Capacity 1 is enough: the slot is cleared, a duplicate
                    // CRM with this CTR will take the mismatch path
                    let _ = tx_crm.try_send(CrmMessage { ctr, crc, data });
                } else {
                    counters.bump_crm_mismatched();
                    warn!("CRM with stale ctr={ctr} discarded");
                }
            }
            Ok(Dto::Event { code }) => {
                if code == EV_DAQ_OVERLOAD {
                    warn!("slave reports DAQ processor overload");
                }
                if tx_event
                    .try_send(CcpEvent {
                        code,
                        timestamp: frame.timestamp,
                    })
                    .is_err()
                {
                    warn!("event channel full, event 0x{code:02X} dropped");
                }
            }
            Ok(Dto::Daq { pid, data }) => {
                if let Some(decoder) = decoder.lock().as_mut() {
                    decoder.handle(pid, &data, frame.timestamp);
                }
            }
        }
    }
    // tx_crm is dropped here which fails a pending request
}

//--------------------------------------------------------------------------------------------------------------------------------------------------
// CcpMaster

/// Parameters of an initialized DAQ session, kept across stop/run cycles
#[derive(Debug, Clone, Copy)]
struct DaqConfig {
    daq_list: u8,
    last_odt: u8,
    event_channel: u8,
    prescaler: u16,
}

/// One CCP master bound to one slave
///
/// Requests are strictly sequential per master (`&mut self`); callers that
/// need to share a master serialize it behind a `tokio::sync::Mutex`, which
/// queues them FIFO. To talk to several slaves, instantiate several masters.
pub struct CcpMaster<T: CanTransport> {
    config: MasterConfig,
    transport: Arc<T>,
    state: SessionState,
    ctr: u8,
    mta0: Option<MtaInfo>,
    mta1: Option<MtaInfo>,
    daq: Option<DaqConfig>,
    pending: Arc<Mutex<Option<u8>>>,
    rx_crm: Receiver<CrmMessage>,
    rx_event: Option<Receiver<CcpEvent>>,
    decoder: Arc<Mutex<Option<DaqDecoder>>>,
    counters: Arc<SessionCounters>,
    transport_failed: Arc<AtomicBool>,
    pump: tokio::task::JoinHandle<()>,
}

impl<T: CanTransport> CcpMaster<T> {
    /// Create a master and spawn its receive pump
    /// Must be called from within a tokio runtime
    pub fn new(config: MasterConfig, transport: T) -> CcpMaster<T> {
        let transport = Arc::new(transport);
        let pending: Arc<Mutex<Option<u8>>> = Arc::new(Mutex::new(None));
        let decoder: Arc<Mutex<Option<DaqDecoder>>> = Arc::new(Mutex::new(None));
        let counters = Arc::new(SessionCounters::default());
        let transport_failed = Arc::new(AtomicBool::new(false));
        let (tx_crm, rx_crm) = mpsc::channel(1);
        let (tx_event, rx_event) = mpsc::channel(16);

        let pump = tokio::spawn(receive_pump(
            Arc::clone(&transport),
            config.dto_id,
            Arc::clone(&pending),
            tx_crm,
            tx_event,
            Arc::clone(&decoder),
            Arc::clone(&counters),
            Arc::clone(&transport_failed),
        ));

        CcpMaster {
            config,
            transport,
            state: SessionState::Disconnected,
            ctr: 0,
            mta0: None,
            mta1: None,
            daq: None,
            pending,
            rx_crm,
            rx_event: Some(rx_event),
            decoder,
            counters,
            transport_failed,
            pump,
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Mirrored MTA0 register (the authoritative value lives in the slave)
    pub fn mta0(&self) -> Option<MtaInfo> {
        self.mta0
    }

    pub fn mta1(&self) -> Option<MtaInfo> {
        self.mta1
    }

    /// The channel of asynchronous slave Event Messages, available once
    pub fn take_event_receiver(&mut self) -> Option<Receiver<CcpEvent>> {
        self.rx_event.take()
    }

    //------------------------------------------------------------------------
    // Command engine

    fn next_ctr(&mut self) -> u8 {
        let ctr = self.ctr;
        self.ctr = self.ctr.wrapping_add(1);
        ctr
    }

    fn require(&self, expected: SessionState, allowed: &[SessionState]) -> Result<(), CcpError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CcpError::ProtocolViolation { expected, actual: self.state })
        }
    }

    // Session errors that are fatal poison the session until DISCONNECT
    fn fail(&mut self, err: CcpError) -> CcpError {
        if err.is_fatal() && self.state != SessionState::Disconnected {
            error!("session faulted: {err}");
            self.state = SessionState::Faulted;
            if let Some(decoder) = self.decoder.lock().as_mut() {
                decoder.set_running(false);
            }
        }
        err
    }

    /// Send one CRO and wait for the matching CRM
    /// Returns the 5 return data bytes of an acknowledged CRM
    async fn request(&mut self, command: Command, cro: [u8; frame::CCP_FRAME_LEN]) -> Result<[u8; 5], CcpError> {
        let ctr = cro[1];

        // Completions of abandoned requests may still sit in the channel
        while self.rx_crm.try_recv().is_ok() {}

        *self.pending.lock() = Some(ctr);
        let _pending_guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            ctr,
        };

        trace!("CRO {:?} ctr={} {:02X?}", command, ctr, cro);
        if let Err(e) = self.transport.send(CanFrame::new(self.config.cro_id, &cro)).await {
            return Err(self.fail(CcpError::Transport(e)));
        }

        let crm = timeout(self.config.timeout, async {
            loop {
                match self.rx_crm.recv().await {
                    Some(msg) if msg.ctr == ctr => break Some(msg),
                    Some(msg) => debug!("completion for dead ctr={} discarded", msg.ctr),
                    None => break None,
                }
            }
        })
        .await;

        match crm {
            Err(_elapsed) => Err(self.fail(CcpError::Timeout)),
            Ok(None) => {
                let err = if self.transport_failed.load(Ordering::Relaxed) {
                    CcpError::Transport(io::Error::other("CAN transport receive failed"))
                } else {
                    CcpError::PumpTerminated
                };
                Err(self.fail(err))
            }
            Ok(Some(msg)) => {
                trace!("CRM {:?} ctr={} crc=0x{:02X} {:02X?}", command, msg.ctr, msg.crc, msg.data);
                match ReturnCode::from_code(msg.crc) {
                    ReturnCode::Acknowledge => Ok(msg.data),
                    code => Err(self.fail(CcpError::Slave { command, code })),
                }
            }
        }
    }

    //------------------------------------------------------------------------
    // Session lifecycle

    pub async fn connect(&mut self) -> Result<(), CcpError> {
        self.require(SessionState::Disconnected, &[SessionState::Disconnected])?;
        let cro = frame::connect(self.next_ctr(), self.config.station_address);
        self.request(Command::Connect, cro).await?;
        self.state = SessionState::Connected;
        info!("connected to station 0x{:04X}", self.config.station_address);
        Ok(())
    }

    /// DISCONNECT is always permitted and is the only exit from `Faulted`
    pub async fn disconnect(&mut self, kind: DisconnectKind) -> Result<(), CcpError> {
        let cro = frame::disconnect(self.next_ctr(), kind, self.config.station_address);
        let res = self.request(Command::Disconnect, cro).await;
        self.state = SessionState::Disconnected;
        self.mta0 = None;
        self.mta1 = None;
        if let Some(decoder) = self.decoder.lock().as_mut() {
            decoder.set_running(false);
        }
        info!("disconnected ({kind:?})");
        res.map(|_| ())
    }

    /// Exchange station identifications, completes the session setup
    pub async fn exchange_id(&mut self, master_id: &[u8]) -> Result<ExchangeIdInfo, CcpError> {
        self.require(SessionState::Connected, &[SessionState::Connected, SessionState::Ready])?;
        let previous = self.state;
        self.state = SessionState::Exchanging;
        let cro = frame::exchange_id(self.next_ctr(), master_id)?;
        match self.request(Command::ExchangeId, cro).await {
            Ok(data) => {
                self.state = SessionState::Ready;
                let info = frame::parse_exchange_id(&data);
                debug!("slave id length {}, resources available {:?}, protected {:?}", info.slave_id_length, info.availability, info.protection);
                Ok(info)
            }
            Err(e) => {
                // a fatal error has already moved the state to Faulted
                if self.state == SessionState::Exchanging {
                    self.state = previous;
                }
                Err(e)
            }
        }
    }

    /// Strict slaves require this directly after CONNECT
    pub async fn get_ccp_version(&mut self, major: u8, minor: u8) -> Result<VersionInfo, CcpError> {
        self.require(SessionState::Connected, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::get_ccp_version(self.next_ctr(), major, minor);
        let data = self.request(Command::GetCcpVersion, cro).await?;
        Ok(frame::parse_version(&data))
    }

    pub async fn get_seed(&mut self, resource: ResourceMask) -> Result<SeedInfo, CcpError> {
        self.require(SessionState::Connected, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::get_seed(self.next_ctr(), resource);
        let data = self.request(Command::GetSeed, cro).await?;
        Ok(frame::parse_get_seed(&data))
    }

    /// Send the key derived from the seed by the embedder
    /// Returns the resulting resource protection mask
    pub async fn unlock(&mut self, key: &[u8]) -> Result<ResourceMask, CcpError> {
        self.require(SessionState::Connected, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::unlock(self.next_ctr(), key)?;
        let data = self.request(Command::Unlock, cro).await?;
        Ok(ResourceMask::from_bits_truncate(data[0]))
    }

    //------------------------------------------------------------------------
    // Memory access

    pub async fn set_mta(&mut self, mta: u8, extension: u8, address: u32) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::set_mta(self.next_ctr(), self.config.byte_order, mta, extension, address)?;
        self.request(Command::SetMta, cro).await?;
        let mirror = MtaInfo { extension, address };
        if mta == 0 {
            self.mta0 = Some(mirror);
        } else {
            self.mta1 = Some(mirror);
        }
        Ok(())
    }

    /// Read `size` (1..=5) bytes at MTA0, which advances by `size`
    pub async fn upload(&mut self, size: u8) -> Result<Vec<u8>, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::upload(self.next_ctr(), size)?;
        let data = self.request(Command::Upload, cro).await?;
        if let Some(mta) = &mut self.mta0 {
            mta.address = mta.address.wrapping_add(size as u32);
        }
        Ok(data[..size as usize].to_vec())
    }

    /// Ad hoc read that leaves MTA0 untouched
    pub async fn short_upload(&mut self, size: u8, extension: u8, address: u32) -> Result<Vec<u8>, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::short_up(self.next_ctr(), self.config.byte_order, size, extension, address)?;
        let data = self.request(Command::ShortUp, cro).await?;
        Ok(data[..size as usize].to_vec())
    }

    /// Write 1..=5 bytes at MTA0
    /// The CRM returns the slave MTA0 after the write, which refreshes the mirror
    pub async fn download(&mut self, data: &[u8]) -> Result<MtaInfo, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::dnload(self.next_ctr(), data)?;
        let crm = self.request(Command::Dnload, cro).await?;
        let mta = frame::parse_mta(&crm, self.config.byte_order);
        self.mta0 = Some(mta);
        Ok(mta)
    }

    /// Fixed 6 byte variant of DNLOAD
    pub async fn download_6(&mut self, data: &[u8; 6]) -> Result<MtaInfo, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::dnload_6(self.next_ctr(), data);
        let crm = self.request(Command::Dnload6, cro).await?;
        let mta = frame::parse_mta(&crm, self.config.byte_order);
        self.mta0 = Some(mta);
        Ok(mta)
    }

    /// Clear `size` bytes of memory starting at MTA0
    pub async fn clear_memory(&mut self, size: u32) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::clear_memory(self.next_ctr(), self.config.byte_order, size);
        self.request(Command::ClearMemory, cro).await?;
        Ok(())
    }

    /// Copy `size` bytes from MTA0 to MTA1
    pub async fn move_memory(&mut self, size: u32) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::move_memory(self.next_ctr(), self.config.byte_order, size);
        self.request(Command::Move, cro).await?;
        Ok(())
    }

    pub async fn build_checksum(&mut self, size: u32) -> Result<ChecksumInfo, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::build_chksum(self.next_ctr(), self.config.byte_order, size);
        let data = self.request(Command::BuildChksum, cro).await?;
        Ok(frame::parse_chksum(&data))
    }

    //------------------------------------------------------------------------
    // Session status

    pub async fn set_session_status(&mut self, status: SessionStatus) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::set_s_status(self.next_ctr(), status);
        self.request(Command::SetSStatus, cro).await?;
        Ok(())
    }

    pub async fn get_session_status(&mut self) -> Result<SessionStatusInfo, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::get_s_status(self.next_ctr());
        let data = self.request(Command::GetSStatus, cro).await?;
        Ok(frame::parse_s_status(&data))
    }

    //------------------------------------------------------------------------
    // DAQ primitives

    pub async fn get_daq_size(&mut self, daq_list: u8) -> Result<DaqSizeInfo, CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::get_daq_size(self.next_ctr(), self.config.byte_order, daq_list, self.config.dto_id);
        let data = self.request(Command::GetDaqSize, cro).await?;
        Ok(frame::parse_daq_size(&data))
    }

    pub async fn set_daq_ptr(&mut self, daq_list: u8, odt: u8, element: u8) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::set_daq_ptr(self.next_ctr(), daq_list, odt, element);
        self.request(Command::SetDaqPtr, cro).await?;
        Ok(())
    }

    pub async fn write_daq(&mut self, size: u8, extension: u8, address: u32) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Connected, SessionState::Ready])?;
        let cro = frame::write_daq(self.next_ctr(), self.config.byte_order, size, extension, address)?;
        self.request(Command::WriteDaq, cro).await?;
        Ok(())
    }

    pub async fn start_stop(&mut self, mode: StartStopMode, daq_list: u8, last_odt: u8, event_channel: u8, prescaler: u16) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::start_stop(self.next_ctr(), self.config.byte_order, mode, daq_list, last_odt, event_channel, prescaler);
        self.request(Command::StartStop, cro).await?;
        Ok(())
    }

    pub async fn start_stop_all(&mut self, start: bool) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Ready, SessionState::DaqRunning])?;
        let cro = frame::start_stop_all(self.next_ctr(), start);
        self.request(Command::StartStopAll, cro).await?;
        Ok(())
    }

    //------------------------------------------------------------------------
    // DAQ session

    /// Partition `elements` into the ODTs of `daq_list` and arm the slave
    ///
    /// Issues GET_DAQ_SIZE, packs first fit, then SET_DAQ_PTR/WRITE_DAQ per
    /// element. A previously armed map is discarded. The measurement does not
    /// run until `daq_run` is called.
    pub async fn daq_initialize<S: SampleSink>(&mut self, elements: Vec<Element>, daq_list: u8, event_channel: u8, prescaler: u16, sink: S) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Ready])?;
        *self.decoder.lock() = None;
        self.daq = None;

        let info = self.get_daq_size(daq_list).await?;
        debug!("DAQ list {} has {} ODTs, first pid 0x{:02X}", daq_list, info.odt_count, info.first_pid);
        let map = daq::partition(daq_list, elements, info.odt_count)?;

        let placements: Vec<(u8, u8, u8, u8, u32)> = map
            .iter_entries()
            .map(|(odt, idx, element)| (odt, idx, element.size, element.extension, element.address))
            .collect();
        for (odt, idx, size, extension, address) in placements {
            self.set_daq_ptr(daq_list, odt, idx).await?;
            self.write_daq(size, extension, address).await?;
        }

        self.daq = Some(DaqConfig {
            daq_list,
            last_odt: map.last_odt(),
            event_channel,
            prescaler,
        });
        *self.decoder.lock() = Some(DaqDecoder::new(map, info.first_pid, Box::new(sink), Arc::clone(&self.counters)));
        info!("DAQ list {} armed", daq_list);
        Ok(())
    }

    /// Start the armed measurement
    /// Valid again after `daq_stop` without re-initializing
    pub async fn daq_run(&mut self) -> Result<(), CcpError> {
        self.require(SessionState::Ready, &[SessionState::Ready])?;
        let cfg = self.daq.ok_or(CcpError::DaqNotInitialized)?;

        self.start_stop(StartStopMode::Prepare, cfg.daq_list, cfg.last_odt, cfg.event_channel, cfg.prescaler).await?;

        // accept DAQ DTOs before the slave starts sending
        if let Some(decoder) = self.decoder.lock().as_mut() {
            decoder.set_running(true);
        }
        if let Err(e) = self.start_stop_all(true).await {
            if let Some(decoder) = self.decoder.lock().as_mut() {
                decoder.set_running(false);
            }
            return Err(e);
        }
        self.state = SessionState::DaqRunning;
        info!("DAQ running");
        Ok(())
    }

    /// Stop the measurement, the ODT map is retained
    pub async fn daq_stop(&mut self) -> Result<(), CcpError> {
        self.require(SessionState::DaqRunning, &[SessionState::DaqRunning])?;
        self.state = SessionState::Ready;
        let res = self.start_stop_all(false).await;
        if let Some(decoder) = self.decoder.lock().as_mut() {
            decoder.set_running(false);
        }
        if let Err(e) = res {
            return Err(e);
        }
        info!("DAQ stopped");
        Ok(())
    }
}

impl<T: CanTransport> Drop for CcpMaster<T> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
