//! Directory message codec
//!
//! Bidirectional mapping between the directory message types and the wire
//! container grammar. Outer to inner: a message envelope (class, domain
//! marker, stream id, per-class flags and fields), then a map keyed by
//! service id, then one filter list per service record, then element lists
//! (or, for the Link group, a nested name-keyed map) per attribute group.
//!
//! Filter ids outside the known set of seven are tolerated by skipping the
//! entry's payload; a malformed payload for a known id fails the message.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use types::{FilterId, FilterMask, Qos, QosRate, QosTimeliness, SourceMirroringMode, Status};
use wire::{
    Decoder, ElementListDecoder, ElementListEncoder, EncodeError, Encoder, FilterEntryAction,
    FilterListDecoder, FilterListEncoder, KeyType, MapDecoder, MapEncoder, MapEntryAction, MapKey,
};

use crate::messages::{
    ConsumerStatusChange, ConsumerStatusService, DirectoryClose, DirectoryConsumerStatus,
    DirectoryMessage, DirectoryRefresh, DirectoryRequest, DirectoryStatus, DirectoryUpdate,
};
use crate::service::{
    AddressPort, GroupStatus, LinkSet, McastChannel, SeqMcastInfo, ServiceChange, ServiceData,
    ServiceEntry, ServiceInfo, ServiceLink, ServiceLoad, ServiceRecord, ServiceState,
};

/// Domain marker carried by every directory envelope.
pub const DOMAIN_SOURCE_DIRECTORY: u8 = 4;

/// Message classes of the envelope.
mod class {
    pub const REQUEST: u8 = 1;
    pub const REFRESH: u8 = 2;
    pub const STATUS: u8 = 3;
    pub const UPDATE: u8 = 4;
    pub const CLOSE: u8 = 5;
    /// Consumer status rides the generic class on the login stream.
    pub const GENERIC: u8 = 6;
}

mod rq_flags {
    pub const STREAMING: u16 = 0x01;
    pub const HAS_SERVICE_ID: u16 = 0x02;
}

mod rf_flags {
    pub const SOLICITED: u16 = 0x01;
    pub const CLEAR_CACHE: u16 = 0x02;
    pub const HAS_SEQ_NUM: u16 = 0x04;
    pub const HAS_SERVICE_ID: u16 = 0x08;
}

mod up_flags {
    pub const HAS_FILTER: u16 = 0x01;
    pub const HAS_SERVICE_ID: u16 = 0x02;
    pub const HAS_SEQ_NUM: u16 = 0x04;
}

mod st_flags {
    pub const HAS_FILTER: u16 = 0x01;
    pub const HAS_SERVICE_ID: u16 = 0x02;
    pub const HAS_STATE: u16 = 0x04;
    pub const CLEAR_CACHE: u16 = 0x08;
}

/// Fixed element name ids, grouped by the filter they belong to.
mod elem {
    // Info
    pub const NAME: u16 = 1;
    pub const VENDOR: u16 = 2;
    pub const IS_SOURCE: u16 = 3;
    pub const CAPABILITIES: u16 = 4;
    pub const DICTIONARIES_PROVIDED: u16 = 5;
    pub const DICTIONARIES_USED: u16 = 6;
    pub const QOS: u16 = 7;
    pub const SUPPORTS_QOS_RANGE: u16 = 8;
    pub const ITEM_LIST: u16 = 9;
    pub const SUPPORTS_OOB_SNAPSHOTS: u16 = 10;
    pub const ACCEPTING_CONSUMER_STATUS: u16 = 11;
    // State
    pub const SERVICE_STATE: u16 = 20;
    pub const ACCEPTING_REQUESTS: u16 = 21;
    pub const STATUS: u16 = 22;
    // Group
    pub const GROUP: u16 = 30;
    pub const MERGED_TO_GROUP: u16 = 31;
    pub const GROUP_STATUS: u16 = 32;
    // Load
    pub const OPEN_LIMIT: u16 = 40;
    pub const OPEN_WINDOW: u16 = 41;
    pub const LOAD_FACTOR: u16 = 42;
    // Data
    pub const DATA_TYPE: u16 = 50;
    pub const DATA: u16 = 51;
    // Link
    pub const LINK_TYPE: u16 = 60;
    pub const LINK_STATE: u16 = 61;
    pub const LINK_CODE: u16 = 62;
    pub const LINK_TEXT: u16 = 63;
    // SeqMcast
    pub const SNAPSHOT_HOST: u16 = 70;
    pub const SNAPSHOT_PORT: u16 = 71;
    pub const GAP_REC_HOST: u16 = 72;
    pub const GAP_REC_PORT: u16 = 73;
    pub const REF_DATA_HOST: u16 = 74;
    pub const REF_DATA_PORT: u16 = 75;
    pub const STREAMING_CHANNELS: u16 = 76;
    pub const GAP_CHANNELS: u16 = 77;
    // ConsumerStatus
    pub const SOURCE_MIRRORING_MODE: u16 = 80;
}

/// Errors raised by the directory message codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Wrong message class, wrong container shape, or a missing required
    /// field. Non-recoverable for the message; never retried here.
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error(transparent)]
    Decode(#[from] wire::DecodeError),

    #[error(transparent)]
    Encode(#[from] wire::EncodeError),
}

fn malformed(reason: impl fmt::Display) -> CodecError {
    CodecError::Malformed(reason.to_string())
}

// ── Envelope ────────────────────────────────────────────────────────

fn encode_envelope(
    enc: &mut Encoder<'_>,
    msg_class: u8,
    stream_id: i32,
    flags: u16,
) -> Result<(), EncodeError> {
    enc.put_u8(msg_class)?;
    enc.put_u8(DOMAIN_SOURCE_DIRECTORY)?;
    enc.put_i32(stream_id)?;
    enc.put_u16(flags)
}

fn decode_envelope(dec: &mut Decoder<'_>) -> Result<(u8, i32, u16), CodecError> {
    let msg_class = dec.get_u8()?;
    let domain = dec.get_u8()?;
    if domain != DOMAIN_SOURCE_DIRECTORY {
        return Err(malformed(format!("unexpected domain marker {domain}")));
    }
    let stream_id = dec.get_i32()?;
    let flags = dec.get_u16()?;
    Ok((msg_class, stream_id, flags))
}

fn expect_class(actual: u8, expected: u8, kind: &str) -> Result<(), CodecError> {
    if actual != expected {
        return Err(malformed(format!(
            "expected {kind} envelope, got message class {actual}"
        )));
    }
    Ok(())
}

// ── Status ──────────────────────────────────────────────────────────

fn encode_status(enc: &mut Encoder<'_>, status: &Status) -> Result<(), EncodeError> {
    enc.put_u8(status.stream_state as u8)?;
    enc.put_u8(status.data_state as u8)?;
    enc.put_u8(status.code as u8)?;
    enc.put_str(&status.text)
}

fn decode_status(dec: &mut Decoder<'_>) -> Result<Status, CodecError> {
    let stream_state =
        types::StreamState::from_wire(dec.get_u8()?).map_err(malformed)?;
    let data_state = types::DataState::from_wire(dec.get_u8()?).map_err(malformed)?;
    let code = types::StatusCode::from_wire(dec.get_u8()?).map_err(malformed)?;
    let text = dec.get_str()?.to_string();
    Ok(Status {
        stream_state,
        data_state,
        code,
        text,
    })
}

fn status_bytes(status: &Status) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    encode_status(&mut enc, status)?;
    Ok(buf)
}

// ── Attribute groups ────────────────────────────────────────────────

fn encode_info(enc: &mut Encoder<'_>, info: &ServiceInfo) -> Result<(), EncodeError> {
    let mut el = ElementListEncoder::begin(enc)?;
    el.elem_str(elem::NAME, &info.service_name)?;
    if let Some(vendor) = &info.vendor {
        el.elem_str(elem::VENDOR, vendor)?;
    }
    if let Some(is_source) = info.is_source {
        el.elem_uint(elem::IS_SOURCE, is_source as u64)?;
    }
    el.elem_array_uint(elem::CAPABILITIES, &info.capabilities)?;
    if let Some(dicts) = &info.dictionaries_provided {
        el.elem_array_str(elem::DICTIONARIES_PROVIDED, dicts)?;
    }
    if let Some(dicts) = &info.dictionaries_used {
        el.elem_array_str(elem::DICTIONARIES_USED, dicts)?;
    }
    let qos_items: Vec<[u8; 2]> = info
        .qos
        .iter()
        .map(|q| [q.timeliness as u8, q.rate as u8])
        .collect();
    el.elem_array_bytes(elem::QOS, &qos_items)?;
    if let Some(v) = info.supports_qos_range {
        el.elem_uint(elem::SUPPORTS_QOS_RANGE, v as u64)?;
    }
    if let Some(item_list) = &info.item_list {
        el.elem_str(elem::ITEM_LIST, item_list)?;
    }
    if let Some(v) = info.supports_out_of_band_snapshots {
        el.elem_uint(elem::SUPPORTS_OOB_SNAPSHOTS, v as u64)?;
    }
    if let Some(v) = info.accepting_consumer_status {
        el.elem_uint(elem::ACCEPTING_CONSUMER_STATUS, v as u64)?;
    }
    el.complete()
}

fn decode_qos(bytes: &[u8]) -> Result<Qos, CodecError> {
    if bytes.len() < 2 {
        return Err(malformed("qos value shorter than two bytes"));
    }
    let timeliness = QosTimeliness::from_wire(bytes[0]).map_err(malformed)?;
    let rate = QosRate::from_wire(bytes[1]).map_err(malformed)?;
    Ok(Qos { timeliness, rate })
}

fn decode_info(dec: &mut Decoder<'_>) -> Result<ServiceInfo, CodecError> {
    let mut info = ServiceInfo::default();
    let mut has_name = false;

    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::NAME => {
                info.service_name = e.value.as_str()?.to_string();
                has_name = true;
            }
            elem::VENDOR => info.vendor = Some(e.value.as_str()?.to_string()),
            elem::IS_SOURCE => info.is_source = Some(e.value.as_bool()?),
            elem::CAPABILITIES => info.capabilities = e.value.into_array()?.uints()?,
            elem::DICTIONARIES_PROVIDED => {
                info.dictionaries_provided = Some(e.value.into_array()?.strings()?)
            }
            elem::DICTIONARIES_USED => {
                info.dictionaries_used = Some(e.value.into_array()?.strings()?)
            }
            elem::QOS => {
                let items = e.value.into_array()?.byte_items()?;
                info.qos = items
                    .iter()
                    .map(|bytes| decode_qos(bytes))
                    .collect::<Result<Vec<_>, _>>()?;
            }
            elem::SUPPORTS_QOS_RANGE => info.supports_qos_range = Some(e.value.as_bool()?),
            elem::ITEM_LIST => info.item_list = Some(e.value.as_str()?.to_string()),
            elem::SUPPORTS_OOB_SNAPSHOTS => {
                info.supports_out_of_band_snapshots = Some(e.value.as_bool()?)
            }
            elem::ACCEPTING_CONSUMER_STATUS => {
                info.accepting_consumer_status = Some(e.value.as_bool()?)
            }
            other => debug!(name_id = other, "skipping unknown element in service info"),
        }
    }
    if !has_name {
        return Err(malformed("service info missing service name"));
    }
    Ok(info)
}

fn encode_state(enc: &mut Encoder<'_>, state: &ServiceState) -> Result<(), EncodeError> {
    let mut el = ElementListEncoder::begin(enc)?;
    el.elem_uint(elem::SERVICE_STATE, state.service_state)?;
    if let Some(v) = state.accepting_requests {
        el.elem_uint(elem::ACCEPTING_REQUESTS, v as u64)?;
    }
    if let Some(status) = &state.status {
        el.elem_bytes(elem::STATUS, &status_bytes(status)?)?;
    }
    el.complete()
}

fn decode_state(dec: &mut Decoder<'_>) -> Result<ServiceState, CodecError> {
    let mut state = ServiceState {
        service_state: 0,
        accepting_requests: None,
        status: None,
    };
    let mut has_service_state = false;

    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::SERVICE_STATE => {
                state.service_state = e.value.as_uint()?;
                has_service_state = true;
            }
            elem::ACCEPTING_REQUESTS => state.accepting_requests = Some(e.value.as_bool()?),
            elem::STATUS => {
                let mut status_dec = Decoder::new(e.value.as_bytes()?);
                state.status = Some(decode_status(&mut status_dec)?);
            }
            other => debug!(name_id = other, "skipping unknown element in service state"),
        }
    }
    if !has_service_state {
        return Err(malformed("service state missing state value"));
    }
    Ok(state)
}

fn encode_group_status(enc: &mut Encoder<'_>, group: &GroupStatus) -> Result<(), EncodeError> {
    let mut el = ElementListEncoder::begin(enc)?;
    el.elem_bytes(elem::GROUP, &group.group)?;
    if let Some(merged) = &group.merged_to_group {
        el.elem_bytes(elem::MERGED_TO_GROUP, merged)?;
    }
    if let Some(status) = &group.status {
        el.elem_bytes(elem::GROUP_STATUS, &status_bytes(status)?)?;
    }
    el.complete()
}

fn decode_group_status(dec: &mut Decoder<'_>) -> Result<GroupStatus, CodecError> {
    let mut group = None;
    let mut merged_to_group = None;
    let mut status = None;

    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::GROUP => group = Some(e.value.as_bytes()?.to_vec()),
            elem::MERGED_TO_GROUP => merged_to_group = Some(e.value.as_bytes()?.to_vec()),
            elem::GROUP_STATUS => {
                let mut status_dec = Decoder::new(e.value.as_bytes()?);
                status = Some(decode_status(&mut status_dec)?);
            }
            other => debug!(name_id = other, "skipping unknown element in group status"),
        }
    }
    let group = group.ok_or_else(|| malformed("group status missing group id"))?;
    Ok(GroupStatus {
        group,
        merged_to_group,
        status,
    })
}

fn encode_load(enc: &mut Encoder<'_>, load: &ServiceLoad) -> Result<(), EncodeError> {
    let mut el = ElementListEncoder::begin(enc)?;
    if let Some(v) = load.open_limit {
        el.elem_uint(elem::OPEN_LIMIT, v)?;
    }
    if let Some(v) = load.open_window {
        el.elem_uint(elem::OPEN_WINDOW, v)?;
    }
    if let Some(v) = load.load_factor {
        el.elem_uint(elem::LOAD_FACTOR, v)?;
    }
    el.complete()
}

fn decode_load(dec: &mut Decoder<'_>) -> Result<ServiceLoad, CodecError> {
    let mut load = ServiceLoad::default();
    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::OPEN_LIMIT => load.open_limit = Some(e.value.as_uint()?),
            elem::OPEN_WINDOW => load.open_window = Some(e.value.as_uint()?),
            elem::LOAD_FACTOR => load.load_factor = Some(e.value.as_uint()?),
            other => debug!(name_id = other, "skipping unknown element in service load"),
        }
    }
    Ok(load)
}

fn encode_data(enc: &mut Encoder<'_>, data: &ServiceData) -> Result<(), EncodeError> {
    let mut el = ElementListEncoder::begin(enc)?;
    el.elem_uint(elem::DATA_TYPE, data.data_type)?;
    el.elem_bytes(elem::DATA, &data.data)?;
    el.complete()
}

fn decode_data(dec: &mut Decoder<'_>) -> Result<ServiceData, CodecError> {
    let mut data_type = None;
    let mut data = None;

    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::DATA_TYPE => data_type = Some(e.value.as_uint()?),
            elem::DATA => data = Some(e.value.as_bytes()?.to_vec()),
            other => debug!(name_id = other, "skipping unknown element in service data"),
        }
    }
    match (data_type, data) {
        (Some(data_type), Some(data)) => Ok(ServiceData { data_type, data }),
        _ => Err(malformed("service data missing type or payload")),
    }
}

fn encode_link(enc: &mut Encoder<'_>, link: &LinkSet) -> Result<(), EncodeError> {
    let mut map = MapEncoder::begin(enc, KeyType::Str)?;
    for entry in &link.links {
        map.entry_with(MapKey::Str(&entry.name), MapEntryAction::Add, |e| {
            let mut el = ElementListEncoder::begin(e)?;
            if let Some(v) = entry.link_type {
                el.elem_uint(elem::LINK_TYPE, v)?;
            }
            el.elem_uint(elem::LINK_STATE, entry.link_state)?;
            if let Some(v) = entry.link_code {
                el.elem_uint(elem::LINK_CODE, v)?;
            }
            if let Some(text) = &entry.text {
                el.elem_str(elem::LINK_TEXT, text)?;
            }
            el.complete()
        })?;
    }
    map.complete()
}

fn decode_link(dec: &mut Decoder<'_>) -> Result<LinkSet, CodecError> {
    let mut links = Vec::new();
    let mut map = MapDecoder::begin(dec)?;
    if map.key_type() != KeyType::Str {
        return Err(malformed("link collection must be keyed by link name"));
    }
    while let Some(entry) = map.next_entry()? {
        let name = entry.key.as_str()?.to_string();
        let Some(mut payload) = entry.payload else {
            // A deleted link simply vanishes from the set.
            debug!(link = %name, "link entry deleted");
            continue;
        };

        let mut link = ServiceLink {
            name,
            link_type: None,
            link_state: 0,
            link_code: None,
            text: None,
        };
        let mut has_state = false;
        let mut el = ElementListDecoder::begin(&mut payload)?;
        while let Some(e) = el.next_element()? {
            match e.name_id {
                elem::LINK_TYPE => link.link_type = Some(e.value.as_uint()?),
                elem::LINK_STATE => {
                    link.link_state = e.value.as_uint()?;
                    has_state = true;
                }
                elem::LINK_CODE => link.link_code = Some(e.value.as_uint()?),
                elem::LINK_TEXT => link.text = Some(e.value.as_str()?.to_string()),
                other => debug!(name_id = other, "skipping unknown element in link"),
            }
        }
        if !has_state {
            return Err(malformed("link entry missing link state"));
        }
        links.push(link);
    }
    Ok(LinkSet { links })
}

fn channel_bytes(channel: &McastChannel) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.put_str(&channel.address)?;
    enc.put_u16(channel.port)?;
    enc.put_u8(channel.domain)?;
    Ok(buf)
}

fn decode_channel(bytes: &[u8]) -> Result<McastChannel, CodecError> {
    let mut dec = Decoder::new(bytes);
    let address = dec.get_str()?.to_string();
    let port = dec.get_u16()?;
    let domain = dec.get_u8()?;
    Ok(McastChannel {
        address,
        port,
        domain,
    })
}

fn encode_seq_mcast(enc: &mut Encoder<'_>, info: &SeqMcastInfo) -> Result<(), EncodeError> {
    let mut el = ElementListEncoder::begin(enc)?;
    if let Some(server) = &info.snapshot_server {
        el.elem_str(elem::SNAPSHOT_HOST, &server.address)?;
        el.elem_uint(elem::SNAPSHOT_PORT, server.port as u64)?;
    }
    if let Some(server) = &info.gap_recovery_server {
        el.elem_str(elem::GAP_REC_HOST, &server.address)?;
        el.elem_uint(elem::GAP_REC_PORT, server.port as u64)?;
    }
    if let Some(server) = &info.ref_data_server {
        el.elem_str(elem::REF_DATA_HOST, &server.address)?;
        el.elem_uint(elem::REF_DATA_PORT, server.port as u64)?;
    }
    if !info.streaming_channels.is_empty() {
        let items = info
            .streaming_channels
            .iter()
            .map(channel_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        el.elem_array_bytes(elem::STREAMING_CHANNELS, &items)?;
    }
    if !info.gap_channels.is_empty() {
        let items = info
            .gap_channels
            .iter()
            .map(channel_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        el.elem_array_bytes(elem::GAP_CHANNELS, &items)?;
    }
    el.complete()
}

fn decode_port(value: u64) -> Result<u16, CodecError> {
    u16::try_from(value).map_err(|_| malformed(format!("port value {value} out of range")))
}

fn decode_seq_mcast(dec: &mut Decoder<'_>) -> Result<SeqMcastInfo, CodecError> {
    let mut info = SeqMcastInfo::default();
    let mut hosts: [Option<String>; 3] = [None, None, None];
    let mut ports: [Option<u16>; 3] = [None, None, None];

    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::SNAPSHOT_HOST => hosts[0] = Some(e.value.as_str()?.to_string()),
            elem::SNAPSHOT_PORT => ports[0] = Some(decode_port(e.value.as_uint()?)?),
            elem::GAP_REC_HOST => hosts[1] = Some(e.value.as_str()?.to_string()),
            elem::GAP_REC_PORT => ports[1] = Some(decode_port(e.value.as_uint()?)?),
            elem::REF_DATA_HOST => hosts[2] = Some(e.value.as_str()?.to_string()),
            elem::REF_DATA_PORT => ports[2] = Some(decode_port(e.value.as_uint()?)?),
            elem::STREAMING_CHANNELS => {
                info.streaming_channels = e
                    .value
                    .into_array()?
                    .byte_items()?
                    .iter()
                    .map(|bytes| decode_channel(bytes))
                    .collect::<Result<Vec<_>, _>>()?;
            }
            elem::GAP_CHANNELS => {
                info.gap_channels = e
                    .value
                    .into_array()?
                    .byte_items()?
                    .iter()
                    .map(|bytes| decode_channel(bytes))
                    .collect::<Result<Vec<_>, _>>()?;
            }
            other => debug!(name_id = other, "skipping unknown element in seq mcast"),
        }
    }

    let servers = [
        &mut info.snapshot_server,
        &mut info.gap_recovery_server,
        &mut info.ref_data_server,
    ];
    for (slot, (host, port)) in servers.into_iter().zip(hosts.into_iter().zip(ports)) {
        if let (Some(address), Some(port)) = (host, port) {
            *slot = Some(AddressPort { address, port });
        }
    }
    Ok(info)
}

// ── Service records ─────────────────────────────────────────────────

fn encode_record(enc: &mut Encoder<'_>, record: &ServiceRecord) -> Result<(), EncodeError> {
    let mut fl = FilterListEncoder::begin(enc)?;
    for id in FilterId::ALL {
        // A Clear entry does not suppress payload entries for the same id:
        // clear-then-append is how a delta drops old group statuses while
        // carrying fresh ones.
        if record.cleared.contains(id) {
            fl.entry_clear(id as u8)?;
        }
        match id {
            FilterId::Info => {
                if let Some(info) = &record.info {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| encode_info(e, info))?;
                }
            }
            FilterId::State => {
                if let Some(state) = &record.state {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| encode_state(e, state))?;
                }
            }
            FilterId::Group => {
                // One filter entry per group status, in catalog order.
                for group in &record.groups {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| {
                        encode_group_status(e, group)
                    })?;
                }
            }
            FilterId::Load => {
                if let Some(load) = &record.load {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| encode_load(e, load))?;
                }
            }
            FilterId::Data => {
                if let Some(data) = &record.data {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| encode_data(e, data))?;
                }
            }
            FilterId::Link => {
                if let Some(link) = &record.link {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| encode_link(e, link))?;
                }
            }
            FilterId::SeqMcast => {
                if let Some(info) = &record.seq_mcast {
                    fl.entry_with(id as u8, FilterEntryAction::Set, |e| {
                        encode_seq_mcast(e, info)
                    })?;
                }
            }
        }
    }
    fl.complete()
}

fn decode_record(dec: &mut Decoder<'_>) -> Result<ServiceRecord, CodecError> {
    let mut record = ServiceRecord::default();
    let mut fl = FilterListDecoder::begin(dec)?;
    while let Some(entry) = fl.next_entry()? {
        let Some(id) = FilterId::from_wire(entry.filter_id) else {
            // Forward compatibility: unknown groups are skipped, the rest
            // of the record is kept.
            warn!(filter_id = entry.filter_id, "skipping unknown filter entry");
            continue;
        };
        let Some(mut payload) = entry.payload else {
            record.cleared.insert(id);
            continue;
        };
        match id {
            FilterId::Info => record.info = Some(decode_info(&mut payload)?),
            FilterId::State => record.state = Some(decode_state(&mut payload)?),
            FilterId::Group => record.groups.push(decode_group_status(&mut payload)?),
            FilterId::Load => record.load = Some(decode_load(&mut payload)?),
            FilterId::Data => record.data = Some(decode_data(&mut payload)?),
            FilterId::Link => record.link = Some(decode_link(&mut payload)?),
            FilterId::SeqMcast => record.seq_mcast = Some(decode_seq_mcast(&mut payload)?),
        }
    }
    Ok(record)
}

fn encode_services(enc: &mut Encoder<'_>, entries: &[ServiceEntry]) -> Result<(), EncodeError> {
    let mut map = MapEncoder::begin(enc, KeyType::UInt)?;
    for entry in entries {
        let key = MapKey::UInt(entry.service_id);
        match &entry.change {
            ServiceChange::Add(record) => {
                map.entry_with(key, MapEntryAction::Add, |e| encode_record(e, record))?
            }
            ServiceChange::Update(record) => {
                map.entry_with(key, MapEntryAction::Update, |e| encode_record(e, record))?
            }
            ServiceChange::Delete => map.entry_no_payload(key, MapEntryAction::Delete)?,
        }
    }
    map.complete()
}

fn decode_services(dec: &mut Decoder<'_>) -> Result<Vec<ServiceEntry>, CodecError> {
    let mut map = MapDecoder::begin(dec)?;
    if map.key_type() != KeyType::UInt {
        return Err(malformed("service collection must be keyed by service id"));
    }
    let mut entries = Vec::with_capacity(map.remaining() as usize);
    while let Some(entry) = map.next_entry()? {
        let service_id = entry.key.as_uint()?;
        let change = match (entry.action, entry.payload) {
            (MapEntryAction::Delete, _) => ServiceChange::Delete,
            (MapEntryAction::Add, Some(mut payload)) => {
                ServiceChange::Add(decode_record(&mut payload)?)
            }
            (MapEntryAction::Update, Some(mut payload)) => {
                ServiceChange::Update(decode_record(&mut payload)?)
            }
            _ => return Err(malformed("service entry missing payload")),
        };
        entries.push(ServiceEntry { service_id, change });
    }
    Ok(entries)
}

// ── Messages ────────────────────────────────────────────────────────

impl DirectoryRequest {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        let mut flags = 0u16;
        if self.streaming {
            flags |= rq_flags::STREAMING;
        }
        if self.service_id.is_some() {
            flags |= rq_flags::HAS_SERVICE_ID;
        }
        encode_envelope(enc, class::REQUEST, self.stream_id, flags)?;
        enc.put_u32(self.filter.bits())?;
        if let Some(service_id) = self.service_id {
            enc.put_u32(service_id)?;
        }
        Ok(())
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, flags) = decode_envelope(dec)?;
        expect_class(msg_class, class::REQUEST, "request")?;
        Self::decode_body(dec, stream_id, flags)
    }

    fn decode_body(dec: &mut Decoder<'_>, stream_id: i32, flags: u16) -> Result<Self, CodecError> {
        let filter = FilterMask::from_bits(dec.get_u32()?);
        let service_id = if flags & rq_flags::HAS_SERVICE_ID != 0 {
            Some(dec.get_u32()?)
        } else {
            None
        };
        Ok(Self {
            stream_id,
            filter,
            streaming: flags & rq_flags::STREAMING != 0,
            service_id,
        })
    }
}

impl DirectoryRefresh {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        let mut flags = 0u16;
        if self.solicited {
            flags |= rf_flags::SOLICITED;
        }
        if self.clear_cache {
            flags |= rf_flags::CLEAR_CACHE;
        }
        if self.sequence_number.is_some() {
            flags |= rf_flags::HAS_SEQ_NUM;
        }
        if self.service_id.is_some() {
            flags |= rf_flags::HAS_SERVICE_ID;
        }
        encode_envelope(enc, class::REFRESH, self.stream_id, flags)?;
        encode_status(enc, &self.state)?;
        enc.put_u32(self.filter.bits())?;
        if let Some(seq) = self.sequence_number {
            enc.put_u32(seq)?;
        }
        if let Some(service_id) = self.service_id {
            enc.put_u32(service_id)?;
        }
        encode_services(enc, &self.services)?;
        Ok(())
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, flags) = decode_envelope(dec)?;
        expect_class(msg_class, class::REFRESH, "refresh")?;
        Self::decode_body(dec, stream_id, flags)
    }

    fn decode_body(dec: &mut Decoder<'_>, stream_id: i32, flags: u16) -> Result<Self, CodecError> {
        let state = decode_status(dec)?;
        let filter = FilterMask::from_bits(dec.get_u32()?);
        let sequence_number = if flags & rf_flags::HAS_SEQ_NUM != 0 {
            Some(dec.get_u32()?)
        } else {
            None
        };
        let service_id = if flags & rf_flags::HAS_SERVICE_ID != 0 {
            Some(dec.get_u32()?)
        } else {
            None
        };
        let services = decode_services(dec)?;
        Ok(Self {
            stream_id,
            filter,
            state,
            solicited: flags & rf_flags::SOLICITED != 0,
            clear_cache: flags & rf_flags::CLEAR_CACHE != 0,
            sequence_number,
            service_id,
            services,
        })
    }
}

impl DirectoryUpdate {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        let mut flags = 0u16;
        if self.filter.is_some() {
            flags |= up_flags::HAS_FILTER;
        }
        if self.service_id.is_some() {
            flags |= up_flags::HAS_SERVICE_ID;
        }
        if self.sequence_number.is_some() {
            flags |= up_flags::HAS_SEQ_NUM;
        }
        encode_envelope(enc, class::UPDATE, self.stream_id, flags)?;
        if let Some(filter) = self.filter {
            enc.put_u32(filter.bits())?;
        }
        if let Some(service_id) = self.service_id {
            enc.put_u32(service_id)?;
        }
        if let Some(seq) = self.sequence_number {
            enc.put_u32(seq)?;
        }
        encode_services(enc, &self.services)?;
        Ok(())
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, flags) = decode_envelope(dec)?;
        expect_class(msg_class, class::UPDATE, "update")?;
        Self::decode_body(dec, stream_id, flags)
    }

    fn decode_body(dec: &mut Decoder<'_>, stream_id: i32, flags: u16) -> Result<Self, CodecError> {
        let filter = if flags & up_flags::HAS_FILTER != 0 {
            Some(FilterMask::from_bits(dec.get_u32()?))
        } else {
            None
        };
        let service_id = if flags & up_flags::HAS_SERVICE_ID != 0 {
            Some(dec.get_u32()?)
        } else {
            None
        };
        let sequence_number = if flags & up_flags::HAS_SEQ_NUM != 0 {
            Some(dec.get_u32()?)
        } else {
            None
        };
        let services = decode_services(dec)?;
        Ok(Self {
            stream_id,
            filter,
            service_id,
            sequence_number,
            services,
        })
    }
}

impl DirectoryStatus {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        let mut flags = 0u16;
        if self.filter.is_some() {
            flags |= st_flags::HAS_FILTER;
        }
        if self.service_id.is_some() {
            flags |= st_flags::HAS_SERVICE_ID;
        }
        if self.state.is_some() {
            flags |= st_flags::HAS_STATE;
        }
        if self.clear_cache {
            flags |= st_flags::CLEAR_CACHE;
        }
        encode_envelope(enc, class::STATUS, self.stream_id, flags)?;
        if let Some(filter) = self.filter {
            enc.put_u32(filter.bits())?;
        }
        if let Some(service_id) = self.service_id {
            enc.put_u32(service_id)?;
        }
        if let Some(state) = &self.state {
            encode_status(enc, state)?;
        }
        Ok(())
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, flags) = decode_envelope(dec)?;
        expect_class(msg_class, class::STATUS, "status")?;
        Self::decode_body(dec, stream_id, flags)
    }

    fn decode_body(dec: &mut Decoder<'_>, stream_id: i32, flags: u16) -> Result<Self, CodecError> {
        let filter = if flags & st_flags::HAS_FILTER != 0 {
            Some(FilterMask::from_bits(dec.get_u32()?))
        } else {
            None
        };
        let service_id = if flags & st_flags::HAS_SERVICE_ID != 0 {
            Some(dec.get_u32()?)
        } else {
            None
        };
        let state = if flags & st_flags::HAS_STATE != 0 {
            Some(decode_status(dec)?)
        } else {
            None
        };
        Ok(Self {
            stream_id,
            filter,
            service_id,
            state,
            clear_cache: flags & st_flags::CLEAR_CACHE != 0,
        })
    }
}

impl DirectoryClose {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        encode_envelope(enc, class::CLOSE, self.stream_id, 0)?;
        Ok(())
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, _flags) = decode_envelope(dec)?;
        expect_class(msg_class, class::CLOSE, "close")?;
        Ok(Self { stream_id })
    }
}

impl DirectoryConsumerStatus {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        encode_envelope(enc, class::GENERIC, self.stream_id, 0)?;
        let mut map = MapEncoder::begin(enc, KeyType::UInt)?;
        for entry in &self.services {
            let key = MapKey::UInt(entry.service_id);
            match entry.change {
                ConsumerStatusChange::Add(mode) => {
                    map.entry_with(key, MapEntryAction::Add, |e| {
                        let mut el = ElementListEncoder::begin(e)?;
                        el.elem_uint(elem::SOURCE_MIRRORING_MODE, mode as u64)?;
                        el.complete()
                    })?
                }
                ConsumerStatusChange::Update(mode) => {
                    map.entry_with(key, MapEntryAction::Update, |e| {
                        let mut el = ElementListEncoder::begin(e)?;
                        el.elem_uint(elem::SOURCE_MIRRORING_MODE, mode as u64)?;
                        el.complete()
                    })?
                }
                ConsumerStatusChange::Delete => {
                    map.entry_no_payload(key, MapEntryAction::Delete)?
                }
            }
        }
        map.complete()?;
        Ok(())
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, _flags) = decode_envelope(dec)?;
        expect_class(msg_class, class::GENERIC, "consumer status")?;
        Self::decode_body(dec, stream_id)
    }

    fn decode_body(dec: &mut Decoder<'_>, stream_id: i32) -> Result<Self, CodecError> {
        let mut map = MapDecoder::begin(dec)?;
        if map.key_type() != KeyType::UInt {
            return Err(malformed(
                "consumer status collection must be keyed by service id",
            ));
        }
        let mut services = Vec::with_capacity(map.remaining() as usize);
        while let Some(entry) = map.next_entry()? {
            let service_id = entry.key.as_uint()?;
            let change = match (entry.action, entry.payload) {
                (MapEntryAction::Delete, _) => ConsumerStatusChange::Delete,
                (action, Some(mut payload)) => {
                    let mode = decode_mirroring_mode(&mut payload)?;
                    match action {
                        MapEntryAction::Add => ConsumerStatusChange::Add(mode),
                        MapEntryAction::Update => ConsumerStatusChange::Update(mode),
                        MapEntryAction::Delete => unreachable!("handled above"),
                    }
                }
                _ => return Err(malformed("consumer status entry missing payload")),
            };
            services.push(ConsumerStatusService { service_id, change });
        }
        Ok(Self {
            stream_id,
            services,
        })
    }
}

fn decode_mirroring_mode(dec: &mut Decoder<'_>) -> Result<SourceMirroringMode, CodecError> {
    let mut mode = None;
    let mut el = ElementListDecoder::begin(dec)?;
    while let Some(e) = el.next_element()? {
        match e.name_id {
            elem::SOURCE_MIRRORING_MODE => {
                mode = Some(SourceMirroringMode::from_wire(e.value.as_uint()?).map_err(malformed)?)
            }
            other => debug!(name_id = other, "skipping unknown element in consumer status"),
        }
    }
    mode.ok_or_else(|| malformed("consumer status entry missing mirroring mode"))
}

impl DirectoryMessage {
    pub fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), CodecError> {
        match self {
            DirectoryMessage::Request(m) => m.encode(enc),
            DirectoryMessage::Refresh(m) => m.encode(enc),
            DirectoryMessage::Update(m) => m.encode(enc),
            DirectoryMessage::Status(m) => m.encode(enc),
            DirectoryMessage::Close(m) => m.encode(enc),
            DirectoryMessage::ConsumerStatus(m) => m.encode(enc),
        }
    }

    /// Decode any directory-domain message, dispatching on the envelope's
    /// message class.
    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let (msg_class, stream_id, flags) = decode_envelope(dec)?;
        match msg_class {
            class::REQUEST => Ok(DirectoryMessage::Request(DirectoryRequest::decode_body(
                dec, stream_id, flags,
            )?)),
            class::REFRESH => Ok(DirectoryMessage::Refresh(DirectoryRefresh::decode_body(
                dec, stream_id, flags,
            )?)),
            class::UPDATE => Ok(DirectoryMessage::Update(DirectoryUpdate::decode_body(
                dec, stream_id, flags,
            )?)),
            class::STATUS => Ok(DirectoryMessage::Status(DirectoryStatus::decode_body(
                dec, stream_id, flags,
            )?)),
            class::CLOSE => Ok(DirectoryMessage::Close(DirectoryClose { stream_id })),
            class::GENERIC => Ok(DirectoryMessage::ConsumerStatus(
                DirectoryConsumerStatus::decode_body(dec, stream_id)?,
            )),
            other => Err(malformed(format!("unknown message class {other}"))),
        }
    }
}
