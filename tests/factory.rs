mod common;

use serde_json::json;
use std::sync::Arc;

use common::RecordingTransport;
use search_nexus::config::TypesenseConfig;
use search_nexus::{
    create_search_service,
    create_search_service_from_config,
    SearchConfig,
    SearchError,
    ServiceType,
};

#[test]
fn unknown_service_type_fails_before_config_or_transport() {
    let transport = Arc::new(RecordingTransport::new());
    let err = create_search_service("nonexistent", transport.clone(), &json!({})).err().unwrap();
    assert_eq!(err.to_string(), "Unsupported service type: nonexistent");
    assert_eq!(transport.count(), 0);
}

#[test]
fn builds_each_backend() {
    let cases = [
        ("algolia", json!({ "appId": "APP", "apiKey": "k" }), ServiceType::Algolia),
        ("elasticsearch", json!({ "hosts": "http://es:9200" }), ServiceType::Elasticsearch),
        ("meilisearch", json!({ "host": "http://m:7700", "apiKey": "k" }), ServiceType::Meilisearch),
        ("typesense", json!({ "apiKey": "k", "nodes": [{}] }), ServiceType::Typesense),
        ("openai", json!({ "apiKey": "k" }), ServiceType::OpenAi),
    ];
    for (name, config, expected) in cases {
        let transport = Arc::new(RecordingTransport::new());
        let service = create_search_service(name, transport.clone(), &config).unwrap();
        assert_eq!(service.service_type(), expected);
        assert_eq!(transport.count(), 0, "constructing {} sent a request", name);
    }
}

#[test]
fn each_call_builds_a_new_service() {
    let transport = Arc::new(RecordingTransport::new());
    let config = json!({ "apiKey": "k" });
    let first = create_search_service("openai", transport.clone(), &config).unwrap();
    let second = create_search_service("openai", transport.clone(), &config).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn invalid_config_is_reported_per_service() {
    let transport = Arc::new(RecordingTransport::new());
    let err = create_search_service("meilisearch", transport, &json!({ "host": "http://m" })).err().unwrap();
    match err {
        SearchError::Config { service, reason } => {
            assert_eq!(service, "meilisearch");
            assert!(reason.contains("apiKey"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn config_union_reports_its_service() {
    let config = SearchConfig::from_value(
        ServiceType::Typesense,
        &json!({ "apiKey": "k", "nodes": [{ "host": "ts" }] })
    ).unwrap();
    assert_eq!(config.service_type(), ServiceType::Typesense);
    assert_eq!(config.base_url(), "http://ts:8108");
}

#[test]
fn typesense_without_nodes_is_rejected_up_front() {
    let transport = Arc::new(RecordingTransport::new());
    let err = create_search_service("typesense", transport.clone(), &json!({ "apiKey": "k" }))
        .err()
        .unwrap();
    match err {
        SearchError::Config { service, reason } => {
            assert_eq!(service, "typesense");
            assert!(reason.contains("node"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(transport.count(), 0);

    let config = SearchConfig::Typesense(TypesenseConfig::new("k", Vec::new()));
    assert!(create_search_service_from_config(transport, config).is_err());
}
