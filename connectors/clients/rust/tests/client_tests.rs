// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP contract tests against a mock inventory service

use std::sync::Arc;

use fleetq_client::{FleetqClient, FleetqError};
use fleetq_filter::{
    to_persisted, BlockPatch, FilterConfig, FilterTree, FilterType, KeyCatalog, QueryRequest,
    TemplateDraft,
};
use fleetq_session::{Collaborators, FilterSession, SessionError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options_body() -> serde_json::Value {
    json!({
        "deviceFields": [{"label": "IP address", "value": "ip"}, "hostname"],
        "nodeLabelKeys": ["zone"],
        "nodeTaintKeys": []
    })
}

#[tokio::test]
async fn test_query_devices_posts_flattened_groups() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/devices/query"))
        .and(body_partial_json(json!({
            "page": 1,
            "size": 20,
            "groups": [{"blocks": [{"conditionType": "in", "value": "a,b", "field": "ip", "key": "ip"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [{"ip": "a", "hostname": "edge-1"}],
            "total": 1,
            "page": 1,
            "size": 20
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(FleetqClient::new(&server.uri()).unwrap());
    let mut session = FilterSession::new(Collaborators::shared(client), FilterConfig::default());

    let gid = session.add_group();
    let bid = session.add_block(&gid, FilterType::Device).unwrap().unwrap();
    session.update_block(&gid, &bid, BlockPatch::field("ip"));
    session.update_block(&gid, &bid, BlockPatch::value(vec!["a", "b"]));

    let outcome = session.run(1, None).await.unwrap();
    assert_eq!(outcome.page.total, 1);
    assert_eq!(outcome.page.list[0].text("hostname").as_deref(), Some("edge-1"));
    assert_eq!(outcome.summary, "(ip in [a, b])");
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/filters/options"))
        .respond_with(ResponseTemplate::new(200).set_body_json(options_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/filters/nodeLabel/values"))
        .and(query_param("key", "zone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["eu-1", {"label": "US East", "value": "us-1"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/field-values"))
        .and(query_param("field", "ip"))
        .and(query_param("size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": ["10.0.0.1", "10.0.0.2"]})))
        .mount(&server)
        .await;

    let client = FleetqClient::new(&server.uri()).unwrap();

    let catalog = client.get_filter_options().await.unwrap().into_catalog();
    assert_eq!(catalog.label_for(FilterType::Device, "ip"), Some("IP address"));
    assert_eq!(catalog.options(FilterType::Device)[1].value, "hostname");

    let zones = client.get_values_for_key(KeyCatalog::NodeLabel, "zone").await.unwrap();
    assert_eq!(zones.len(), 2);
    assert_eq!(zones[1].label, "US East");

    let ips = client.get_device_field_values("ip", 50).await.unwrap();
    assert_eq!(ips, vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]);
}

#[tokio::test]
async fn test_session_refresh_fills_blank_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/filters/options"))
        .respond_with(ResponseTemplate::new(200).set_body_json(options_body()))
        .mount(&server)
        .await;

    let client = Arc::new(FleetqClient::new(&server.uri()).unwrap());
    let mut session = FilterSession::new(Collaborators::shared(client), FilterConfig::default());
    let gid = session.add_group();
    let bid = session.add_block(&gid, FilterType::NodeLabel).unwrap().unwrap();

    session.refresh_catalog().await.unwrap();
    assert_eq!(session.tree().block(&gid, &bid).unwrap().field, "zone");
}

#[tokio::test]
async fn test_template_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/query-templates"))
        .and(body_partial_json(json!({"name": "edge", "id": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "name": "edge"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query-templates"))
        .and(query_param("page", "2"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [{"id": 4, "name": "edge", "description": "edge routers"}],
            "total": 11,
            "page": 2,
            "size": 10
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query-templates/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "name": "edge",
            "groups": "[{\"id\":\"g\",\"operator\":\"AND\",\"blocks\":[{\"id\":\"b\",\"type\":\"device\",\"conditionType\":\"equal\",\"field\":\"ip\",\"key\":\"\",\"value\":\"10.0.0.1\"}]}]"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/query-templates/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = FleetqClient::new(&server.uri()).unwrap();

    let template = to_persisted(FilterTree::new().groups(), &TemplateDraft::new("edge").updating(4), true);
    let saved = client.save_template(&template).await.unwrap();
    assert_eq!(saved.id, 4);

    let page = client.list_templates(2, 10).await.unwrap();
    assert_eq!(page.list[0].description, "edge routers");
    assert!(!page.has_more());

    let raw = client.fetch_template(4).await.unwrap();
    let loaded = fleetq_filter::load_template(&raw);
    let block = &loaded.tree.groups()[0].blocks[0];
    assert_eq!((block.field.as_str(), block.key.as_str()), ("ip", "ip"));

    client.delete_template(4).await.unwrap();
}

#[tokio::test]
async fn test_error_statuses_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query-templates/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not_found", "message": "no template 99"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/devices/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/filters/options"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = FleetqClient::new(&server.uri()).unwrap();

    match client.fetch_template(99).await {
        Err(FleetqError::NotFound(message)) => assert_eq!(message, "no template 99"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    let request = QueryRequest {
        groups: Vec::new(),
        page: 1,
        size: 20,
    };
    match client.query_devices(&request).await {
        Err(FleetqError::Server { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "HTTP 503");
        }
        other => panic!("expected Server error, got {other:?}"),
    }

    assert!(matches!(
        client.get_filter_options().await,
        Err(FleetqError::Unauthorized(_))
    ));

    let session_err: SessionError = client.fetch_template(99).await.unwrap_err().into();
    assert!(matches!(session_err, SessionError::NotFound(_)));
}

#[tokio::test]
async fn test_api_key_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("X-API-Key", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = FleetqClient::with_api_key(&server.uri(), "secret").unwrap();
    assert!(client.health().await.unwrap());

    let anonymous = FleetqClient::new(&server.uri()).unwrap();
    assert!(!anonymous.health().await.unwrap());
}
