//! Property tests for the directory message codec
//!
//! Generates messages across the whole flag and presence space and checks
//! that decoding an encoded message reproduces it exactly, with no bytes
//! left over.

use proptest::prelude::*;

use directory::{
    AddressPort, ConsumerStatusChange, ConsumerStatusService, DirectoryClose,
    DirectoryConsumerStatus, DirectoryMessage, DirectoryRefresh, DirectoryRequest,
    DirectoryStatus, DirectoryUpdate, GroupStatus, LinkSet, McastChannel, SeqMcastInfo,
    ServiceChange, ServiceData, ServiceEntry, ServiceInfo, ServiceLink, ServiceLoad,
    ServiceRecord, ServiceState,
};
use types::{
    DataState, FilterId, FilterMask, Qos, QosRate, QosTimeliness, SourceMirroringMode, Status,
    StatusCode, StreamState,
};
use wire::{Decoder, Encoder};

fn stream_state() -> impl Strategy<Value = StreamState> {
    prop::sample::select(vec![
        StreamState::Open,
        StreamState::NonStreaming,
        StreamState::ClosedRecover,
        StreamState::Closed,
        StreamState::Redirected,
    ])
}

fn status() -> impl Strategy<Value = Status> {
    (
        stream_state(),
        prop::sample::select(vec![DataState::NoChange, DataState::Ok, DataState::Suspect]),
        prop::sample::select(vec![
            StatusCode::None,
            StatusCode::NotFound,
            StatusCode::Timeout,
            StatusCode::NoResources,
        ]),
        "[ -~]{0,24}",
    )
        .prop_map(|(stream_state, data_state, code, text)| Status {
            stream_state,
            data_state,
            code,
            text,
        })
}

fn qos() -> impl Strategy<Value = Qos> {
    (
        prop::sample::select(vec![
            QosTimeliness::Realtime,
            QosTimeliness::DelayedUnknown,
            QosTimeliness::Delayed,
        ]),
        prop::sample::select(vec![
            QosRate::TickByTick,
            QosRate::JitConflated,
            QosRate::TimeConflated,
        ]),
    )
        .prop_map(|(timeliness, rate)| Qos { timeliness, rate })
}

fn filter_mask() -> impl Strategy<Value = FilterMask> {
    (0u32..=0x7f).prop_map(FilterMask::from_bits)
}

fn service_info() -> impl Strategy<Value = ServiceInfo> {
    (
        (
            "[A-Z_]{1,12}",
            prop::option::of("[A-Za-z ]{1,12}"),
            prop::option::of(any::<bool>()),
            prop::collection::vec(any::<u64>(), 0..4),
        ),
        (
            prop::option::of(prop::collection::vec("[A-Za-z]{1,8}", 0..3)),
            prop::option::of(prop::collection::vec("[A-Za-z]{1,8}", 0..3)),
            prop::collection::vec(qos(), 0..3),
        ),
        (
            prop::option::of(any::<bool>()),
            prop::option::of("_[A-Z]{1,10}"),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
        ),
    )
        .prop_map(
            |(
                (service_name, vendor, is_source, capabilities),
                (dictionaries_provided, dictionaries_used, qos),
                (supports_qos_range, item_list, supports_out_of_band_snapshots, accepting_consumer_status),
            )| ServiceInfo {
                service_name,
                vendor,
                is_source,
                capabilities,
                dictionaries_provided,
                dictionaries_used,
                qos,
                supports_qos_range,
                item_list,
                supports_out_of_band_snapshots,
                accepting_consumer_status,
            },
        )
}

fn service_state() -> impl Strategy<Value = ServiceState> {
    (
        any::<u64>(),
        prop::option::of(any::<bool>()),
        prop::option::of(status()),
    )
        .prop_map(|(service_state, accepting_requests, status)| ServiceState {
            service_state,
            accepting_requests,
            status,
        })
}

fn service_load() -> impl Strategy<Value = ServiceLoad> {
    (
        prop::option::of(any::<u64>()),
        prop::option::of(any::<u64>()),
        prop::option::of(any::<u64>()),
    )
        .prop_map(|(open_limit, open_window, load_factor)| ServiceLoad {
            open_limit,
            open_window,
            load_factor,
        })
}

fn service_data() -> impl Strategy<Value = ServiceData> {
    (any::<u64>(), prop::collection::vec(any::<u8>(), 0..16))
        .prop_map(|(data_type, data)| ServiceData { data_type, data })
}

fn service_link() -> impl Strategy<Value = ServiceLink> {
    (
        "[a-z-]{1,12}",
        prop::option::of(any::<u64>()),
        any::<u64>(),
        prop::option::of(any::<u64>()),
        prop::option::of("[ -~]{0,16}"),
    )
        .prop_map(|(name, link_type, link_state, link_code, text)| ServiceLink {
            name,
            link_type,
            link_state,
            link_code,
            text,
        })
}

fn group_status() -> impl Strategy<Value = GroupStatus> {
    (
        prop::collection::vec(any::<u8>(), 1..6),
        prop::option::of(prop::collection::vec(any::<u8>(), 1..6)),
        prop::option::of(status()),
    )
        .prop_map(|(group, merged_to_group, status)| GroupStatus {
            group,
            merged_to_group,
            status,
        })
}

fn address_port() -> impl Strategy<Value = AddressPort> {
    ("[0-9.]{7,15}", any::<u16>()).prop_map(|(address, port)| AddressPort { address, port })
}

fn mcast_channel() -> impl Strategy<Value = McastChannel> {
    ("[0-9.]{7,15}", any::<u16>(), any::<u8>()).prop_map(|(address, port, domain)| McastChannel {
        address,
        port,
        domain,
    })
}

fn seq_mcast() -> impl Strategy<Value = SeqMcastInfo> {
    (
        prop::option::of(address_port()),
        prop::option::of(address_port()),
        prop::option::of(address_port()),
        prop::collection::vec(mcast_channel(), 0..3),
        prop::collection::vec(mcast_channel(), 0..3),
    )
        .prop_map(
            |(snapshot_server, gap_recovery_server, ref_data_server, streaming_channels, gap_channels)| {
                SeqMcastInfo {
                    snapshot_server,
                    gap_recovery_server,
                    ref_data_server,
                    streaming_channels,
                    gap_channels,
                }
            },
        )
}

/// A delta-shaped record: any subset of groups present; clear bits only on
/// absent groups, except Group, where a Clear may legally precede appended
/// statuses (clear-then-append).
fn service_record() -> impl Strategy<Value = ServiceRecord> {
    (
        (
            prop::option::of(service_info()),
            prop::option::of(service_state()),
            prop::option::of(service_load()),
            prop::option::of(service_data()),
        ),
        (
            prop::option::of(
                prop::collection::vec(service_link(), 0..3).prop_map(|links| LinkSet { links }),
            ),
            prop::collection::vec(group_status(), 0..3),
            prop::option::of(seq_mcast()),
        ),
        0u32..=0x7f,
        any::<bool>(),
    )
        .prop_map(
            |((info, state, load, data), (link, groups, seq_mcast), clear_bits, clear_groups)| {
                let mut record = ServiceRecord {
                    info,
                    state,
                    load,
                    data,
                    link,
                    groups,
                    seq_mcast,
                    cleared: FilterMask::NONE,
                };
                record.cleared =
                    FilterMask::from_bits(clear_bits & !record.present_mask().bits());
                if clear_groups {
                    record.cleared.insert(FilterId::Group);
                }
                record
            },
        )
}

fn service_entry() -> impl Strategy<Value = ServiceEntry> {
    (any::<u32>(), prop::option::of((any::<bool>(), service_record()))).prop_map(
        |(service_id, payload)| {
            let change = match payload {
                None => ServiceChange::Delete,
                Some((true, record)) => ServiceChange::Add(record),
                Some((false, record)) => ServiceChange::Update(record),
            };
            ServiceEntry { service_id, change }
        },
    )
}

fn request() -> impl Strategy<Value = DirectoryRequest> {
    (
        any::<i32>(),
        filter_mask(),
        any::<bool>(),
        prop::option::of(any::<u32>()),
    )
        .prop_map(|(stream_id, filter, streaming, service_id)| DirectoryRequest {
            stream_id,
            filter,
            streaming,
            service_id,
        })
}

fn refresh() -> impl Strategy<Value = DirectoryRefresh> {
    (
        (any::<i32>(), filter_mask(), status()),
        (any::<bool>(), any::<bool>()),
        (prop::option::of(any::<u32>()), prop::option::of(any::<u32>())),
        prop::collection::vec(service_entry(), 0..3),
    )
        .prop_map(
            |(
                (stream_id, filter, state),
                (solicited, clear_cache),
                (sequence_number, service_id),
                services,
            )| DirectoryRefresh {
                stream_id,
                filter,
                state,
                solicited,
                clear_cache,
                sequence_number,
                service_id,
                services,
            },
        )
}

fn update() -> impl Strategy<Value = DirectoryUpdate> {
    (
        any::<i32>(),
        prop::option::of(filter_mask()),
        prop::option::of(any::<u32>()),
        prop::option::of(any::<u32>()),
        prop::collection::vec(service_entry(), 0..3),
    )
        .prop_map(
            |(stream_id, filter, service_id, sequence_number, services)| DirectoryUpdate {
                stream_id,
                filter,
                service_id,
                sequence_number,
                services,
            },
        )
}

fn dir_status() -> impl Strategy<Value = DirectoryStatus> {
    (
        any::<i32>(),
        prop::option::of(filter_mask()),
        prop::option::of(any::<u32>()),
        prop::option::of(status()),
        any::<bool>(),
    )
        .prop_map(
            |(stream_id, filter, service_id, state, clear_cache)| DirectoryStatus {
                stream_id,
                filter,
                service_id,
                state,
                clear_cache,
            },
        )
}

fn consumer_status() -> impl Strategy<Value = DirectoryConsumerStatus> {
    let mode = prop::sample::select(vec![
        SourceMirroringMode::ActiveNoStandby,
        SourceMirroringMode::ActiveWithStandby,
        SourceMirroringMode::Standby,
    ]);
    let change = prop::option::of((any::<bool>(), mode)).prop_map(|payload| match payload {
        None => ConsumerStatusChange::Delete,
        Some((true, mode)) => ConsumerStatusChange::Add(mode),
        Some((false, mode)) => ConsumerStatusChange::Update(mode),
    });
    (
        any::<i32>(),
        prop::collection::vec(
            (any::<u32>(), change).prop_map(|(service_id, change)| ConsumerStatusService {
                service_id,
                change,
            }),
            0..4,
        ),
    )
        .prop_map(|(stream_id, services)| DirectoryConsumerStatus {
            stream_id,
            services,
        })
}

fn message() -> impl Strategy<Value = DirectoryMessage> {
    prop_oneof![
        request().prop_map(DirectoryMessage::Request),
        refresh().prop_map(DirectoryMessage::Refresh),
        update().prop_map(DirectoryMessage::Update),
        dir_status().prop_map(DirectoryMessage::Status),
        any::<i32>().prop_map(|stream_id| DirectoryMessage::Close(DirectoryClose { stream_id })),
        consumer_status().prop_map(DirectoryMessage::ConsumerStatus),
    ]
}

proptest! {
    #[test]
    fn prop_message_round_trip(msg in message()) {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        msg.encode(&mut enc).unwrap();

        let mut dec = Decoder::new(&buf);
        let back = DirectoryMessage::decode(&mut dec).unwrap();
        prop_assert_eq!(back, msg);
        prop_assert!(dec.is_empty());
    }

    #[test]
    fn prop_truncated_message_never_panics(msg in message(), cut in 0usize..64) {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        msg.encode(&mut enc).unwrap();

        let keep = buf.len().saturating_sub(cut + 1);
        buf.truncate(keep);
        let mut dec = Decoder::new(&buf);
        // Decoding may fail, but must do so through an error.
        let _ = DirectoryMessage::decode(&mut dec);
    }
}
