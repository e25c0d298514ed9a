//! End-to-end catalog synchronization
//!
//! Drives a provider catalog and a consumer cache through the full wire
//! path: request, solicited refresh, delta updates, withdrawal, and a
//! status excursion. Every message crosses encode/decode before it is
//! applied.

use directory::{
    DirectoryMessage, DirectoryRequest, DirectoryStatus, DirectoryUpdate, ProviderCatalog,
    ServiceCache, ServiceEntry, ServiceInfo, ServiceLoad, ServiceRecord, ServiceState,
};
use types::{FilterId, FilterMask, Qos, Status};
use wire::{Decoder, Encoder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn through_wire(msg: DirectoryMessage) -> DirectoryMessage {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    msg.encode(&mut enc).unwrap();
    let mut dec = Decoder::new(&buf);
    let back = DirectoryMessage::decode(&mut dec).unwrap();
    assert!(dec.is_empty());
    back
}

fn advertised(name: &str) -> ServiceRecord {
    ServiceRecord {
        info: Some(ServiceInfo {
            qos: vec![Qos::realtime()],
            capabilities: vec![6, 7],
            ..ServiceInfo::named(name)
        }),
        state: Some(ServiceState::up()),
        load: Some(ServiceLoad {
            open_limit: Some(250),
            open_window: None,
            load_factor: Some(1),
        }),
        ..ServiceRecord::default()
    }
}

#[test]
fn test_full_synchronization_cycle() {
    init_tracing();

    let mut catalog = ProviderCatalog::new();
    catalog.upsert(10, advertised("EQUITIES"));
    catalog.upsert(20, advertised("BONDS"));

    let mut cache = ServiceCache::new();

    // Consumer opens the directory stream.
    let request = DirectoryRequest {
        stream_id: 2,
        filter: FilterMask::INFO | FilterMask::STATE | FilterMask::LOAD,
        streaming: true,
        service_id: None,
    };
    let DirectoryMessage::Request(request) = through_wire(DirectoryMessage::Request(request))
    else {
        panic!("request changed class in transit");
    };

    // Provider answers with a solicited refresh; consumer applies it.
    let refresh = catalog.refresh_for(&request);
    let DirectoryMessage::Refresh(refresh) = through_wire(DirectoryMessage::Refresh(refresh))
    else {
        panic!("refresh changed class in transit");
    };
    assert!(refresh.solicited);
    cache.apply_refresh(&refresh);

    assert_eq!(cache.len(), 2);
    let equities = cache.get(10).unwrap();
    assert_eq!(equities.info.as_ref().unwrap().service_name, "EQUITIES");
    assert_eq!(equities.load.unwrap().open_limit, Some(250));

    // Provider pushes a delta: EQUITIES goes down, its load group is
    // withdrawn.
    let mut delta = ServiceRecord {
        state: Some(ServiceState::down()),
        ..ServiceRecord::default()
    };
    delta.cleared.insert(FilterId::Load);
    let update = DirectoryUpdate {
        stream_id: 2,
        filter: Some(FilterMask::STATE | FilterMask::LOAD),
        service_id: None,
        sequence_number: Some(1),
        services: vec![ServiceEntry::update(10, delta)],
    };
    let DirectoryMessage::Update(update) = through_wire(DirectoryMessage::Update(update)) else {
        panic!("update changed class in transit");
    };
    cache.apply_update(&update);

    let equities = cache.get(10).unwrap();
    assert!(!equities.state.as_ref().unwrap().is_up());
    assert!(equities.load.is_none());
    // Info untouched by the delta.
    assert_eq!(equities.info.as_ref().unwrap().service_name, "EQUITIES");

    // BONDS is withdrawn entirely.
    catalog.remove(20);
    let update = DirectoryUpdate {
        stream_id: 2,
        filter: None,
        service_id: None,
        sequence_number: Some(2),
        services: vec![ServiceEntry::delete(20)],
    };
    let DirectoryMessage::Update(update) = through_wire(DirectoryMessage::Update(update)) else {
        panic!("update changed class in transit");
    };
    cache.apply_update(&update);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(20).is_none());

    // Provider loses its upstream: stream leaves Open, cache goes stale
    // but keeps its contents.
    let status = DirectoryStatus {
        stream_id: 2,
        filter: None,
        service_id: None,
        state: Some(Status::closed_recover("upstream connection lost")),
        clear_cache: false,
    };
    let DirectoryMessage::Status(status) = through_wire(DirectoryMessage::Status(status)) else {
        panic!("status changed class in transit");
    };
    cache.apply_status(&status);
    assert!(cache.is_stale());
    assert_eq!(cache.len(), 1);

    // Recovery: a fresh solicited refresh rebuilds the view and clears the
    // stale flag.
    catalog.upsert(20, advertised("BONDS"));
    let refresh = catalog.refresh_for(&request);
    let DirectoryMessage::Refresh(refresh) = through_wire(DirectoryMessage::Refresh(refresh))
    else {
        panic!("refresh changed class in transit");
    };
    cache.apply_refresh(&refresh);
    assert!(!cache.is_stale());
    assert_eq!(cache.len(), 2);
    // The earlier delta is gone: the refresh is authoritative.
    assert!(cache.get(10).unwrap().state.as_ref().unwrap().is_up());
}

#[test]
fn test_scoped_request_yields_scoped_refresh() {
    let mut catalog = ProviderCatalog::new();
    catalog.upsert(10, advertised("EQUITIES"));
    catalog.upsert(20, advertised("BONDS"));

    let request = DirectoryRequest {
        stream_id: 3,
        filter: FilterMask::INFO,
        streaming: false,
        service_id: Some(20),
    };
    let refresh = catalog.refresh_for(&request);
    let DirectoryMessage::Refresh(refresh) = through_wire(DirectoryMessage::Refresh(refresh))
    else {
        panic!("refresh changed class in transit");
    };

    assert_eq!(refresh.service_id, Some(20));
    assert_eq!(refresh.services.len(), 1);
    let record = refresh.services[0].change.record().unwrap();
    assert_eq!(record.info.as_ref().unwrap().service_name, "BONDS");
    // Only the requested group came back.
    assert!(record.state.is_none());
    assert!(record.load.is_none());

    let mut cache = ServiceCache::new();
    cache.apply_refresh(&refresh);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_replaying_identical_updates_converges_except_groups() {
    // Per-group merge is idempotent for every keyed group; only the
    // append-only group-status list grows on replay.
    let mut cache_once = ServiceCache::new();
    let mut cache_twice = ServiceCache::new();

    let update = DirectoryUpdate {
        stream_id: 2,
        filter: None,
        service_id: None,
        sequence_number: None,
        services: vec![ServiceEntry::update(
            1,
            ServiceRecord {
                state: Some(ServiceState::up()),
                load: Some(ServiceLoad {
                    open_limit: Some(5),
                    open_window: None,
                    load_factor: None,
                }),
                ..ServiceRecord::default()
            },
        )],
    };
    cache_once.apply_update(&update);
    cache_twice.apply_update(&update);
    cache_twice.apply_update(&update);

    assert_eq!(cache_once.get(1), cache_twice.get(1));
}
