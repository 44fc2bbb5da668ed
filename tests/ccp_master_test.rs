//-----------------------------------------------------------------------------
// Module ccp_master_test
// Runs the CCP master against a simulated slave on a channel backed CAN bus

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::sleep;

use ccp::ccp as proto;
use ccp::frame::{self, DisconnectKind};
use ccp::{CanFrame, CanTransport, CcpError, CcpMaster, Element, MasterConfig, ResourceMask, ReturnCode, SessionState};

//-----------------------------------------------------------------------------
// Test parameters

const CRO_ID: u32 = 0x6A2;
const DTO_ID: u32 = 0x6A3;
const STATION: u16 = 0x0037;

// Leaves the pump time to drain injected frames
const SETTLE: Duration = Duration::from_millis(50);

fn test_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//-----------------------------------------------------------------------------
// Channel backed CAN bus

struct ChannelTransport {
    tx: mpsc::Sender<CanFrame>,
    rx: tokio::sync::Mutex<mpsc::Receiver<CanFrame>>,
}

impl CanTransport for ChannelTransport {
    fn send(&self, frame: CanFrame) -> impl std::future::Future<Output = io::Result<()>> + Send {
        let tx = self.tx.clone();
        async move { tx.send(frame).await.map_err(|_| io::Error::other("bus closed")) }
    }

    fn recv(&self) -> impl std::future::Future<Output = io::Result<CanFrame>> + Send {
        async move { self.rx.lock().await.recv().await.ok_or_else(|| io::Error::other("bus closed")) }
    }
}

//-----------------------------------------------------------------------------
// Simulated slave
// Answers CROs like a conforming CCP slave: byte order of multi byte CRO
// parameters is big endian (the default master configuration), the station
// address in CONNECT/DISCONNECT is little endian.
// Memory reads come from a deterministic pattern (low address byte) with a
// write overlay, so UPLOAD sequences are checkable without sharing state.

#[derive(Clone, Default)]
struct SlaveOptions {
    /// Number of ODTs and first PID reported by GET_DAQ_SIZE
    odt_count: u8,
    first_pid: u8,
    /// Response delay per command code
    delay: HashMap<u8, Duration>,
    /// Forced command return code per command code
    errors: HashMap<u8, u8>,
    /// Event Message sent immediately before the CRM of this command
    event_before: Option<(u8, u8)>,
}

struct SlaveHandle {
    /// Every CRO the slave received, in order
    seen: Arc<Mutex<Vec<[u8; 8]>>>,
    /// Injects raw DTO frames into the slave to master direction
    inject: mpsc::Sender<CanFrame>,
}

impl SlaveHandle {
    fn seen_with_cmd(&self, cmd: u8) -> Vec<[u8; 8]> {
        self.seen.lock().iter().filter(|cro| cro[0] == cmd).copied().collect()
    }

    async fn inject_dto(&self, payload: [u8; 8]) {
        self.inject.send(CanFrame::new(DTO_ID, &payload)).await.unwrap();
    }
}

fn mem_read(overlay: &HashMap<u32, u8>, addr: u32) -> u8 {
    overlay.get(&addr).copied().unwrap_or((addr & 0xFF) as u8)
}

async fn slave_task(mut rx: mpsc::Receiver<CanFrame>, tx: mpsc::Sender<CanFrame>, opts: SlaveOptions, seen: Arc<Mutex<Vec<[u8; 8]>>>) {
    let mut overlay: HashMap<u32, u8> = HashMap::new();
    let mut mta0: (u8, u32) = (0, 0);
    let mut mta1: (u8, u32) = (0, 0);
    let mut session_status: u8 = 0;

    while let Some(frame) = rx.recv().await {
        if frame.id != CRO_ID {
            continue;
        }
        let cro = frame.data;
        seen.lock().push(cro);
        let cmd = cro[0];
        let ctr = cro[1];

        let crm: [u8; 8] = if let Some(&crc) = opts.errors.get(&cmd) {
            frame::encode_crm(crc, ctr, &[])
        } else {
            match cmd {
                proto::CC_CONNECT => {
                    let station = u16::from_le_bytes([cro[2], cro[3]]);
                    if station != STATION {
                        continue; // not addressed to this slave
                    }
                    frame::encode_crm(0x00, ctr, &[])
                }
                proto::CC_DISCONNECT => frame::encode_crm(0x00, ctr, &[]),
                proto::CC_EXCHANGE_ID => frame::encode_crm(0x00, ctr, &[0x04, 0x00, 0x03, 0x40, 0x00]),
                proto::CC_GET_CCP_VERSION => frame::encode_crm(0x00, ctr, &[cro[2], cro[3]]),
                proto::CC_GET_SEED => frame::encode_crm(0x00, ctr, &[0x01, 0xA5, 0x5A, 0x12, 0x34]),
                proto::CC_UNLOCK => frame::encode_crm(0x00, ctr, &[0x00]),
                proto::CC_SET_MTA => {
                    let mta = (cro[3], u32::from_be_bytes([cro[4], cro[5], cro[6], cro[7]]));
                    if cro[2] == 0 {
                        mta0 = mta;
                    } else {
                        mta1 = mta;
                    }
                    frame::encode_crm(0x00, ctr, &[])
                }
                proto::CC_UPLOAD => {
                    let size = cro[2] as usize;
                    let mut data = [0u8; 5];
                    for (i, byte) in data.iter_mut().take(size).enumerate() {
                        *byte = mem_read(&overlay, mta0.1 + i as u32);
                    }
                    mta0.1 += size as u32;
                    frame::encode_crm(0x00, ctr, &data[..size])
                }
                proto::CC_SHORT_UP => {
                    let size = cro[2] as usize;
                    let addr = u32::from_be_bytes([cro[4], cro[5], cro[6], cro[7]]);
                    let mut data = [0u8; 5];
                    for (i, byte) in data.iter_mut().take(size).enumerate() {
                        *byte = mem_read(&overlay, addr + i as u32);
                    }
                    frame::encode_crm(0x00, ctr, &data[..size])
                }
                proto::CC_DNLOAD => {
                    let size = cro[2] as usize;
                    for i in 0..size {
                        overlay.insert(mta0.1 + i as u32, cro[3 + i]);
                    }
                    mta0.1 += size as u32;
                    let addr = mta0.1.to_be_bytes();
                    frame::encode_crm(0x00, ctr, &[mta0.0, addr[0], addr[1], addr[2], addr[3]])
                }
                proto::CC_DNLOAD_6 => {
                    for i in 0..6 {
                        overlay.insert(mta0.1 + i as u32, cro[2 + i as usize]);
                    }
                    mta0.1 += 6;
                    let addr = mta0.1.to_be_bytes();
                    frame::encode_crm(0x00, ctr, &[mta0.0, addr[0], addr[1], addr[2], addr[3]])
                }
                proto::CC_SET_S_STATUS => {
                    session_status = cro[2];
                    frame::encode_crm(0x00, ctr, &[])
                }
                proto::CC_GET_S_STATUS => frame::encode_crm(0x00, ctr, &[session_status, 0x00, 0, 0, 0]),
                proto::CC_BUILD_CHKSUM => frame::encode_crm(0x00, ctr, &[0x02, 0xBE, 0xEF, 0, 0]),
                proto::CC_CLEAR_MEMORY => frame::encode_crm(0x00, ctr, &[]),
                proto::CC_MOVE => {
                    let size = u32::from_be_bytes([cro[2], cro[3], cro[4], cro[5]]);
                    for i in 0..size {
                        let byte = mem_read(&overlay, mta0.1 + i);
                        overlay.insert(mta1.1 + i, byte);
                    }
                    frame::encode_crm(0x00, ctr, &[])
                }
                proto::CC_GET_DAQ_SIZE => frame::encode_crm(0x00, ctr, &[opts.odt_count, opts.first_pid, 0, 0, 0]),
                proto::CC_SET_DAQ_PTR | proto::CC_WRITE_DAQ | proto::CC_START_STOP | proto::CC_START_STOP_ALL => frame::encode_crm(0x00, ctr, &[]),
                _ => frame::encode_crm(proto::CRC_CMD_UNKNOWN, ctr, &[]),
            }
        };

        if let Some((event_cmd, code)) = opts.event_before {
            if event_cmd == cmd && tx.send(CanFrame::new(DTO_ID, &frame::encode_event(code))).await.is_err() {
                break;
            }
        }

        let response = CanFrame::new(DTO_ID, &crm);
        if let Some(&delay) = opts.delay.get(&cmd) {
            let tx = tx.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                let _ = tx.send(response).await;
            });
        } else if tx.send(response).await.is_err() {
            break;
        }
    }
}

fn setup_with_config(opts: SlaveOptions, config: MasterConfig) -> (CcpMaster<ChannelTransport>, SlaveHandle) {
    test_setup();
    let (tx_to_slave, rx_from_master) = mpsc::channel(64);
    let (tx_to_master, rx_from_slave) = mpsc::channel(64);

    let seen: Arc<Mutex<Vec<[u8; 8]>>> = Arc::new(Mutex::new(Vec::new()));
    tokio::spawn(slave_task(rx_from_master, tx_to_master.clone(), opts, Arc::clone(&seen)));

    let transport = ChannelTransport {
        tx: tx_to_slave,
        rx: tokio::sync::Mutex::new(rx_from_slave),
    };
    let master = CcpMaster::new(config, transport);
    (master, SlaveHandle { seen, inject: tx_to_master })
}

fn setup(opts: SlaveOptions) -> (CcpMaster<ChannelTransport>, SlaveHandle) {
    setup_with_config(opts, MasterConfig::new(CRO_ID, DTO_ID, STATION))
}

async fn bring_up(master: &mut CcpMaster<ChannelTransport>) {
    master.connect().await.unwrap();
    master.get_ccp_version(2, 1).await.unwrap();
    master.exchange_id(&[]).await.unwrap();
    assert_eq!(master.session_state(), SessionState::Ready);
}

//-----------------------------------------------------------------------------
// Session tests

#[tokio::test]
async fn test_connect() {
    let (mut master, slave) = setup(SlaveOptions::default());

    assert_eq!(master.session_state(), SessionState::Disconnected);
    master.connect().await.unwrap();
    assert_eq!(master.session_state(), SessionState::Connected);

    // CONNECT to station 0x0037, CTR 0, station address little endian
    let connects = slave.seen_with_cmd(proto::CC_CONNECT);
    assert_eq!(connects, vec![[0x01, 0x00, 0x37, 0x00, 0, 0, 0, 0]]);
}

#[tokio::test]
async fn test_session_bringup() {
    let (mut master, _slave) = setup(SlaveOptions::default());

    master.connect().await.unwrap();
    let version = master.get_ccp_version(2, 1).await.unwrap();
    assert_eq!((version.major, version.minor), (2, 1));

    let id = master.exchange_id(&[]).await.unwrap();
    assert_eq!(master.session_state(), SessionState::Ready);
    assert_eq!(id.slave_id_length, 4);
    assert_eq!(id.availability, ResourceMask::CAL | ResourceMask::DAQ);
    assert_eq!(id.protection, ResourceMask::PGM);

    let seed = master.get_seed(ResourceMask::DAQ).await.unwrap();
    assert!(seed.protected);
    assert_eq!(seed.seed, [0xA5, 0x5A, 0x12, 0x34]);
    let protection = master.unlock(&[0xA5, 0x5A, 0x12, 0x34]).await.unwrap();
    assert!(protection.is_empty());
}

#[tokio::test]
async fn test_operations_require_connection() {
    let (mut master, _slave) = setup(SlaveOptions::default());

    match master.upload(4).await {
        Err(CcpError::ProtocolViolation { actual, .. }) => assert_eq!(actual, SessionState::Disconnected),
        other => panic!("expected ProtocolViolation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_advances_mta() {
    let (mut master, _slave) = setup(SlaveOptions::default());
    bring_up(&mut master).await;

    master.set_mta(0, 0x00, 0x4000AA56).await.unwrap();
    // consecutive uploads read consecutive memory, the slave pattern is the low address byte
    assert_eq!(master.upload(4).await.unwrap(), vec![0x56, 0x57, 0x58, 0x59]);
    assert_eq!(master.upload(2).await.unwrap(), vec![0x5A, 0x5B]);
    assert_eq!(master.mta0().unwrap().address, 0x4000AA5C);
}

#[tokio::test]
async fn test_download_and_readback() {
    let (mut master, _slave) = setup(SlaveOptions::default());
    bring_up(&mut master).await;

    master.set_mta(0, 0x00, 0x2000).await.unwrap();
    let mta = master.download(&[0xDE, 0xAD, 0xBE]).await.unwrap();
    // the CRM returns the slave MTA0 after the write and refreshes the mirror
    assert_eq!(mta.address, 0x2003);
    assert_eq!(master.mta0().unwrap().address, 0x2003);

    assert_eq!(master.short_upload(3, 0, 0x2000).await.unwrap(), vec![0xDE, 0xAD, 0xBE]);
    // SHORT_UP leaves the mirror alone
    assert_eq!(master.mta0().unwrap().address, 0x2003);

    // MOVE copies from MTA0 to MTA1
    master.set_mta(0, 0x00, 0x2000).await.unwrap();
    master.set_mta(1, 0x00, 0x3000).await.unwrap();
    assert_eq!(master.mta1().unwrap().address, 0x3000);
    master.move_memory(3).await.unwrap();
    assert_eq!(master.short_upload(3, 0, 0x3000).await.unwrap(), vec![0xDE, 0xAD, 0xBE]);
}

#[tokio::test]
async fn test_download_6() {
    let (mut master, _slave) = setup(SlaveOptions::default());
    bring_up(&mut master).await;

    master.set_mta(0, 0x00, 0x4000).await.unwrap();
    let mta = master.download_6(&[1, 2, 3, 4, 5, 6]).await.unwrap();
    assert_eq!(mta.address, 0x4006);
    assert_eq!(master.short_upload(3, 0, 0x4003).await.unwrap(), vec![4, 5, 6]);
}

#[tokio::test]
async fn test_session_status_and_checksum() {
    use ccp::SessionStatus;

    let (mut master, _slave) = setup(SlaveOptions::default());
    bring_up(&mut master).await;

    master.set_session_status(SessionStatus::CAL | SessionStatus::RUN).await.unwrap();
    let status = master.get_session_status().await.unwrap();
    assert_eq!(status.status, SessionStatus::CAL | SessionStatus::RUN);
    assert_eq!(status.qualifier, 0);

    let chksum = master.build_checksum(0x1000).await.unwrap();
    assert_eq!(chksum.size, 2);
    assert_eq!(&chksum.checksum[..2], &[0xBE, 0xEF]);
}

#[tokio::test]
async fn test_slave_error_is_recoverable() {
    let mut opts = SlaveOptions::default();
    opts.errors.insert(proto::CC_CLEAR_MEMORY, proto::CRC_ACCESS_DENIED);
    let (mut master, _slave) = setup(opts);
    bring_up(&mut master).await;

    match master.clear_memory(0x100).await {
        Err(CcpError::Slave { code, .. }) => assert_eq!(code, ReturnCode::AccessDenied),
        other => panic!("expected Slave error, got {other:?}"),
    }
    // access denied does not poison the session
    assert_eq!(master.session_state(), SessionState::Ready);
    master.upload(1).await.unwrap();
}

#[tokio::test]
async fn test_internal_timeout_faults_session() {
    let mut opts = SlaveOptions::default();
    opts.errors.insert(proto::CC_MOVE, proto::CRC_INTERNAL_TIMEOUT);
    let (mut master, _slave) = setup(opts);
    bring_up(&mut master).await;

    match master.move_memory(8).await {
        Err(CcpError::Slave { code, .. }) => assert_eq!(code, ReturnCode::InternalTimeout),
        other => panic!("expected Slave error, got {other:?}"),
    }
    assert_eq!(master.session_state(), SessionState::Faulted);

    // only DISCONNECT leaves Faulted
    match master.upload(1).await {
        Err(CcpError::ProtocolViolation { actual, .. }) => assert_eq!(actual, SessionState::Faulted),
        other => panic!("expected ProtocolViolation, got {other:?}"),
    }
    master.disconnect(DisconnectKind::EndOfSession).await.unwrap();
    assert_eq!(master.session_state(), SessionState::Disconnected);
    master.connect().await.unwrap();
}

//-----------------------------------------------------------------------------
// Command engine tests

#[tokio::test]
async fn test_timeout_and_late_crm_discard() {
    let mut opts = SlaveOptions::default();
    opts.delay.insert(proto::CC_UPLOAD, Duration::from_millis(250));
    let config = MasterConfig::new(CRO_ID, DTO_ID, STATION).with_timeout(Duration::from_millis(100));
    let (mut master, _slave) = setup_with_config(opts, config);
    bring_up(&mut master).await;

    // no CRM within 100 ms: the request times out and the session faults
    let t0 = std::time::Instant::now();
    match master.upload(2).await {
        Err(CcpError::Timeout) => {}
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(t0.elapsed() >= Duration::from_millis(100));
    assert_eq!(master.session_state(), SessionState::Faulted);

    // the CRM arriving at t=250 ms hits an abandoned slot and is discarded
    sleep(Duration::from_millis(300)).await;
    assert_eq!(master.counters().crm_mismatched_ctr, 1);
}

#[tokio::test]
async fn test_ctr_wrap() {
    let (mut master, slave) = setup(SlaveOptions::default());

    master.connect().await.unwrap(); // CTR 0x00
    for _ in 0..256 {
        master.get_ccp_version(2, 1).await.unwrap();
    }

    // request 257 wrapped back to CTR 0x00 and still correlated
    let versions = slave.seen_with_cmd(proto::CC_GET_CCP_VERSION);
    assert_eq!(versions.len(), 256);
    assert_eq!(versions[0][1], 0x01);
    assert_eq!(versions[255][1], 0x00);

    // a stale CTR 0 CRM from the long dead first request is dropped
    slave.inject_dto(frame::encode_crm(0x00, 0x00, &[])).await;
    sleep(SETTLE).await;
    assert_eq!(master.counters().crm_mismatched_ctr, 1);

    // the engine is still healthy
    master.get_ccp_version(2, 1).await.unwrap();
}

#[tokio::test]
async fn test_event_routing() {
    // the slave emits an Event Message while GET_CCP_VERSION is pending
    let opts = SlaveOptions {
        event_before: Some((proto::CC_GET_CCP_VERSION, 0x05)),
        ..Default::default()
    };
    let (mut master, _slave) = setup(opts);
    let mut events = master.take_event_receiver().unwrap();
    master.connect().await.unwrap();

    // the event does not satisfy the pending request, the CRM does
    let version = master.get_ccp_version(2, 1).await.unwrap();
    assert_eq!(version.major, 2);

    let event = events.recv().await.unwrap();
    assert_eq!(event.code, 0x05);
    assert_eq!(master.counters().crm_mismatched_ctr, 0);
}

//-----------------------------------------------------------------------------
// DAQ tests

fn daq_elements() -> Vec<Element> {
    vec![
        Element::new("raw32", 0x1000, 4).unwrap(),
        Element::new("speed", 0x1010, 2).unwrap().with_scaling(0.1, 0.0),
        Element::new("temp", 0x1020, 2).unwrap().signed().with_scaling(0.1, 0.0),
        Element::new("level4", 0x1030, 4).unwrap(),
        Element::new("flag", 0x1040, 1).unwrap().with_extension(1),
    ]
}

fn daq_slave() -> SlaveOptions {
    SlaveOptions {
        odt_count: 4,
        first_pid: 0xF0,
        ..Default::default()
    }
}

fn collecting_sink() -> (Arc<Mutex<Vec<(String, f64)>>>, impl FnMut(&str, f64, std::time::Instant) + Send + 'static) {
    let samples: Arc<Mutex<Vec<(String, f64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);
    (samples, move |name: &str, value: f64, _ts| sink.lock().push((name.to_string(), value)))
}

#[tokio::test]
async fn test_daq_arming_sequence() {
    let (mut master, slave) = setup(daq_slave());
    bring_up(&mut master).await;

    let (_samples, sink) = collecting_sink();
    master.daq_initialize(daq_elements(), 0, 1, 1, sink).await.unwrap();

    // sizes [4, 2, 2, 4, 1] pack first fit into [[4, 2], [2, 4], [1]]
    let ptrs: Vec<(u8, u8, u8)> = slave.seen_with_cmd(proto::CC_SET_DAQ_PTR).iter().map(|cro| (cro[2], cro[3], cro[4])).collect();
    assert_eq!(ptrs, vec![(0, 0, 0), (0, 0, 1), (0, 1, 0), (0, 1, 1), (0, 2, 0)]);

    let writes: Vec<(u8, u8, u32)> = slave
        .seen_with_cmd(proto::CC_WRITE_DAQ)
        .iter()
        .map(|cro| (cro[2], cro[3], u32::from_be_bytes([cro[4], cro[5], cro[6], cro[7]])))
        .collect();
    assert_eq!(writes, vec![(4, 0, 0x1000), (2, 0, 0x1010), (2, 0, 0x1020), (4, 0, 0x1030), (1, 1, 0x1040)]);

    master.daq_run().await.unwrap();
    assert_eq!(master.session_state(), SessionState::DaqRunning);

    // prepare for the whole list, then global start
    let starts = slave.seen_with_cmd(proto::CC_START_STOP);
    assert_eq!(starts.len(), 1);
    let cro = starts[0];
    assert_eq!((cro[2], cro[3], cro[4], cro[5]), (0x02, 0x00, 0x02, 0x01));
    assert_eq!(u16::from_be_bytes([cro[6], cro[7]]), 1);
    assert_eq!(slave.seen_with_cmd(proto::CC_START_STOP_ALL)[0][2], 0x01);
}

#[tokio::test]
async fn test_daq_decode_stream() {
    let (mut master, slave) = setup(daq_slave());
    bring_up(&mut master).await;

    let (samples, sink) = collecting_sink();
    master.daq_initialize(daq_elements(), 0, 1, 1, sink).await.unwrap();
    master.daq_run().await.unwrap();

    // ODT 0: raw32 = 256, speed = 0x012C * 0.1 = 30.0
    slave.inject_dto(frame::encode_daq(0xF0, &[0x00, 0x00, 0x01, 0x00, 0x01, 0x2C, 0x00])).await;
    // ODT 1: temp = 0xFFF6 * 0.1 = -1.0, level4 = 42
    slave.inject_dto(frame::encode_daq(0xF1, &[0xFF, 0xF6, 0x00, 0x00, 0x00, 0x2A, 0x00])).await;
    // ODT 2: flag = 7
    slave.inject_dto(frame::encode_daq(0xF2, &[0x07, 0, 0, 0, 0, 0, 0])).await;
    // outside the armed range
    slave.inject_dto(frame::encode_daq(0x10, &[0; 7])).await;
    sleep(SETTLE).await;

    {
        let got = samples.lock();
        let expected: Vec<(&str, f64)> = vec![("raw32", 256.0), ("speed", 30.0), ("temp", -1.0), ("level4", 42.0), ("flag", 7.0)];
        assert_eq!(got.len(), expected.len());
        for ((name, value), (expected_name, expected_value)) in got.iter().zip(expected) {
            assert_eq!(name, expected_name);
            assert!((value - expected_value).abs() < 1e-9, "{name}: {value} != {expected_value}");
        }
    }
    assert_eq!(master.counters().unexpected_pid, 1);
    assert_eq!(master.counters().decode_errors, 0);
}

#[tokio::test]
async fn test_daq_stop_retains_map() {
    let (mut master, slave) = setup(daq_slave());
    bring_up(&mut master).await;

    let (samples, sink) = collecting_sink();
    master.daq_initialize(daq_elements(), 0, 1, 1, sink).await.unwrap();
    master.daq_run().await.unwrap();
    master.daq_stop().await.unwrap();
    assert_eq!(master.session_state(), SessionState::Ready);
    assert_eq!(slave.seen_with_cmd(proto::CC_START_STOP_ALL).last().unwrap()[2], 0x00);

    // frames after stop are not decoded
    slave.inject_dto(frame::encode_daq(0xF2, &[0x07, 0, 0, 0, 0, 0, 0])).await;
    sleep(SETTLE).await;
    assert!(samples.lock().is_empty());

    // run again without re-initializing, the map was retained
    master.daq_run().await.unwrap();
    slave.inject_dto(frame::encode_daq(0xF2, &[0x07, 0, 0, 0, 0, 0, 0])).await;
    sleep(SETTLE).await;
    assert_eq!(samples.lock().as_slice(), &[("flag".to_string(), 7.0)]);
}

#[tokio::test]
async fn test_daq_capacity() {
    let mut opts = daq_slave();
    opts.odt_count = 2;
    let (mut master, _slave) = setup(opts);
    bring_up(&mut master).await;

    let (_samples, sink) = collecting_sink();
    match master.daq_initialize(daq_elements(), 0, 1, 1, sink).await {
        Err(CcpError::Capacity { requested_bytes, available }) => {
            assert_eq!(requested_bytes, 13);
            assert_eq!(available, 14);
        }
        other => panic!("expected Capacity, got {other:?}"),
    }
}

#[tokio::test]
async fn test_daq_run_requires_initialize() {
    let (mut master, _slave) = setup(daq_slave());
    bring_up(&mut master).await;

    match master.daq_run().await {
        Err(CcpError::DaqNotInitialized) => {}
        other => panic!("expected DaqNotInitialized, got {other:?}"),
    }
}
