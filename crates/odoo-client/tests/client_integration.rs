//! Integration tests for authentication, model calls and catalog aggregation.

mod common;

use std::sync::Arc;

use common::{connected, field, fields, MockOdoo, PASSWORD, UID};
use odoo_client::proto::{fault_codes, Domain, Fault, Value, OBJECT_PATH};
use odoo_client::{
    AuthError, BareModelPolicy, CallError, CatalogOptions, ClientConfig, FieldDescriptor,
    FieldType, ModelDescriptor, OdooClient, SearchReadOptions,
};
use pretty_assertions::assert_eq;
use serde::Deserialize;

fn partner_fields() -> Value {
    fields(vec![("name", field("char", "Name", true, false))])
}

fn scenario() -> MockOdoo {
    MockOdoo::new()
        .with_model(1, "res.partner", "Partner")
        .with_model(2, "sale.order", "Sales Order")
        .with_fields("res.partner", partner_fields())
        .with_fields_fault(
            "sale.order",
            Fault::new(
                fault_codes::ACCESS_ERROR,
                "You are not allowed to access 'Sales Order' (sale.order) records.",
            ),
        )
}

// =========================================================================
// Authentication
// =========================================================================

#[tokio::test]
async fn test_connect_is_deterministic() {
    let mock = Arc::new(MockOdoo::new());
    let mut client = OdooClient::with_transport(common::config(), Arc::clone(&mock));

    let first = client.connect().await.unwrap();
    let second = client.connect().await.unwrap();

    assert_eq!(first.get(), UID);
    assert_eq!(first, second);
    assert!(client.is_connected());
    assert_eq!(client.session().unwrap().uid(), first);
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let mock = Arc::new(MockOdoo::new());
    let config = ClientConfig::new("http://odoo.test", common::DB, common::USER, "nope").unwrap();
    let mut client = OdooClient::with_transport(config, mock);

    for _ in 0..3 {
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials), "{:?}", err);
    }
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_auth_fault_is_transport_failure() {
    let mock = Arc::new(MockOdoo::new());
    let config = ClientConfig::new("http://odoo.test", "missing", common::USER, PASSWORD).unwrap();
    let mut client = OdooClient::with_transport(config, mock);

    let err = client.connect().await.unwrap_err();
    match err {
        AuthError::TransportFailure(source) => {
            let fault = source.fault().unwrap();
            assert!(fault.message.contains("does not exist"));
        }
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_model_calls_require_connect() {
    let mock = Arc::new(scenario());
    let client = OdooClient::with_transport(common::config(), Arc::clone(&mock));

    assert!(matches!(
        client.get_fields("res.partner").await,
        Err(CallError::NotConnected)
    ));
    assert!(matches!(client.get_models().await, Err(CallError::NotConnected)));

    // Nothing was sent with a missing session id.
    assert!(mock.calls().is_empty());
}

// =========================================================================
// search_read / fields_get
// =========================================================================

#[derive(Debug, PartialEq, Deserialize)]
struct Account {
    code: String,
    name: String,
    deprecated: bool,
}

fn account(code: &str, name: &str) -> Value {
    let mut record = std::collections::BTreeMap::new();
    record.insert("code".to_string(), Value::from(code));
    record.insert("name".to_string(), Value::from(name));
    record.insert("deprecated".to_string(), Value::Bool(false));
    Value::Struct(record)
}

#[tokio::test]
async fn test_search_read_domain_round_trip() {
    let mock = Arc::new(MockOdoo::new().with_records(
        "account.account",
        vec![account("101000", "Current Assets"), account("400000", "Product Sales")],
    ));
    let client = connected(&mock).await;

    let domain = Domain::new().eq("deprecated", false);
    let options = SearchReadOptions::new().with_order("code asc");
    let accounts: Vec<Account> = client
        .search_read("account.account", &domain, &["code", "name", "deprecated"], &options)
        .await
        .unwrap();

    assert_eq!(
        accounts,
        vec![
            Account {
                code: "101000".into(),
                name: "Current Assets".into(),
                deprecated: false,
            },
            Account {
                code: "400000".into(),
                name: "Product Sales".into(),
                deprecated: false,
            },
        ]
    );

    let calls = mock.calls_to("account.account", "search_read");
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.path, OBJECT_PATH);
    assert_eq!(
        call.params[..5].to_vec(),
        vec![
            Value::from(common::DB),
            Value::Int(UID),
            Value::from(PASSWORD),
            Value::from("account.account"),
            Value::from("search_read"),
        ]
    );
    assert_eq!(
        call.params[5],
        Value::Array(vec![Value::Array(vec![
            Value::from("deprecated"),
            Value::from("="),
            Value::Bool(false),
        ])])
    );
    assert_eq!(call.kwargs().unwrap().get("order"), Some(&Value::from("code asc")));
}

#[tokio::test]
async fn test_search_read_decode_error() {
    let mock = Arc::new(
        MockOdoo::new().with_records("account.account", vec![Value::from("not a record")]),
    );
    let client = connected(&mock).await;

    let result: Result<Vec<Account>, _> = client
        .search_read("account.account", &Domain::new(), &["code"], &SearchReadOptions::new())
        .await;
    assert!(matches!(result, Err(CallError::Decode(_))));

    // The raw form still works.
    let raw = client
        .search_read_values("account.account", &Domain::new(), &["code"], &SearchReadOptions::new())
        .await
        .unwrap();
    assert_eq!(raw, vec![Value::from("not a record")]);
}

#[tokio::test]
async fn test_get_fields_decodes_descriptors() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    let fields = client.get_fields("res.partner").await.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(
        fields["name"],
        FieldDescriptor::new(FieldType::Char, "Name").required(true)
    );

    let call = &mock.calls_to("res.partner", "fields_get")[0];
    assert_eq!(call.params[5], Value::Array(vec![]));
    assert_eq!(
        call.params[6].get("attributes"),
        Some(&Value::from(vec![
            "string", "help", "type", "required", "readonly", "relation"
        ]))
    );
}

#[tokio::test]
async fn test_get_fields_is_idempotent() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    let first = client.get_fields("res.partner").await.unwrap();
    let second = client.get_fields("res.partner").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_get_fields_access_denied() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    let err = client.get_fields("sale.order").await.unwrap_err();
    assert!(err.is_access_denied(), "{:?}", err);

    // Not retried.
    assert_eq!(mock.calls_to("sale.order", "fields_get").len(), 1);
}

#[tokio::test]
async fn test_get_fields_rejects_non_struct() {
    let mock = Arc::new(MockOdoo::new().with_fields("odd.model", Value::Bool(false)));
    let client = connected(&mock).await;

    let err = client.get_fields("odd.model").await.unwrap_err();
    match err {
        CallError::Decode(decode) => assert!(decode.message.contains("expected struct")),
        other => panic!("expected decode error, got {:?}", other),
    }
}

// =========================================================================
// Catalog
// =========================================================================

#[tokio::test]
async fn test_catalog_scenario() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    let models = client.get_models().await.unwrap();

    let mut partner_fields = std::collections::BTreeMap::new();
    partner_fields.insert(
        "name".to_string(),
        FieldDescriptor::new(FieldType::Char, "Name").required(true),
    );
    assert_eq!(
        models,
        vec![
            ModelDescriptor::new(1, "res.partner", "Partner").with_fields(partner_fields),
            ModelDescriptor::new(2, "sale.order", "Sales Order"),
        ]
    );

    // One full page, then one empty page.
    assert_eq!(mock.calls_to("ir.model", "search_read").len(), 2);
}

#[tokio::test]
async fn test_catalog_discovery_request_shape() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    client.get_models().await.unwrap();

    let call = &mock.calls_to("ir.model", "search_read")[0];
    let kwargs = call.kwargs().unwrap();
    assert_eq!(call.params[5], Value::Array(vec![]));
    assert_eq!(kwargs.get("fields"), Some(&Value::from(vec!["id", "model", "name"])));
    assert_eq!(kwargs.get("offset"), Some(&Value::Int(0)));
    assert_eq!(kwargs.get("limit"), Some(&Value::Int(100)));
    assert_eq!(kwargs.get("order"), Some(&Value::from("model asc")));
}

#[tokio::test]
async fn test_catalog_report_and_drop_policy() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    let options = CatalogOptions::new().with_bare_models(BareModelPolicy::Drop);
    let catalog = client.get_models_report(&options).await.unwrap();

    assert_eq!(catalog.models.len(), 1);
    assert_eq!(catalog.models[0].model, "res.partner");
    assert_eq!(catalog.failures.len(), 1);
    assert_eq!(catalog.failures[0].model, "sale.order");
    assert!(catalog.failures[0].error.is_access_denied());

    let summary = catalog.summary();
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.enriched, 1);
    assert_eq!(summary.bare, 1);
    assert_eq!(summary.pages, 2);
}

#[tokio::test]
async fn test_pagination_completeness() {
    for (count, page_size) in [(0usize, 5u32), (4, 5), (5, 5), (23, 5), (25, 5), (7, 1)] {
        let mock = Arc::new(MockOdoo::new().with_generated_models(count));
        let client = connected(&mock).await;

        let options = CatalogOptions::new().with_page_size(page_size);
        let catalog = client.get_models_report(&options).await.unwrap();

        // Pages stop at the first empty one.
        let expected_pages = count.div_ceil(page_size as usize) + 1;
        assert_eq!(catalog.pages, expected_pages, "{} models / {}", count, page_size);

        let pages = mock.calls_to("ir.model", "search_read");
        assert_eq!(pages.len(), expected_pages);
        let offsets: Vec<i64> = pages
            .iter()
            .map(|call| call.kwargs().unwrap().get("offset").unwrap().as_i64().unwrap())
            .collect();
        let expected_offsets: Vec<i64> = (0..expected_pages as i64)
            .map(|page| page * page_size as i64)
            .collect();
        assert_eq!(offsets, expected_offsets);

        let names: Vec<String> = catalog.models.iter().map(|m| m.model.clone()).collect();
        let expected: Vec<String> = (0..count).map(|i| format!("test.model{:04}", i)).collect();
        assert_eq!(names, expected);
    }
}

#[tokio::test]
async fn test_failure_isolated_within_chunk() {
    let mock = Arc::new(
        MockOdoo::new()
            .with_generated_models(5)
            .with_fields_fault(
                "test.model0002",
                Fault::new(fault_codes::APPLICATION_ERROR, "KeyError: 'test.model0002'"),
            ),
    );
    let client = connected(&mock).await;

    let options = CatalogOptions::new().with_chunk_size(5);
    let catalog = client.get_models_report(&options).await.unwrap();

    assert_eq!(catalog.models.len(), 5);
    for model in &catalog.models {
        if model.model == "test.model0002" {
            assert!(!model.is_enriched());
        } else {
            assert_eq!(model.field_count(), 2, "{}", model.model);
        }
    }
    assert_eq!(catalog.failures.len(), 1);
    assert!(!catalog.failures[0].error.is_access_denied());
    assert_eq!(mock.calls_to("test.model0002", "fields_get").len(), 1);
}

#[tokio::test]
async fn test_enrichment_concurrency_is_bounded() {
    let mock = Arc::new(MockOdoo::new().with_generated_models(12).with_delay(20));
    let client = connected(&mock).await;

    let options = CatalogOptions::new().with_chunk_size(5);
    let models = client.get_models_with(&options).await.unwrap();

    assert_eq!(models.len(), 12);
    assert!(models.iter().all(ModelDescriptor::is_enriched));
    assert_eq!(mock.max_in_flight(), 5);

    // Chunks follow discovery order; calls within a chunk race.
    let fetched: Vec<String> = mock
        .calls()
        .iter()
        .filter_map(|call| match call.model_method() {
            Some((model, "fields_get")) => Some(model.to_string()),
            _ => None,
        })
        .collect();
    let discovered: Vec<String> = models.iter().map(|m| m.model.clone()).collect();
    assert_eq!(fetched.len(), 12);
    for (fetched_chunk, discovered_chunk) in fetched.chunks(5).zip(discovered.chunks(5)) {
        let mut fetched_chunk = fetched_chunk.to_vec();
        fetched_chunk.sort();
        assert_eq!(fetched_chunk, discovered_chunk.to_vec());
    }
}

#[tokio::test]
async fn test_sequential_enrichment_with_chunk_of_one() {
    let mock = Arc::new(MockOdoo::new().with_generated_models(4).with_delay(5));
    let client = connected(&mock).await;

    let options = CatalogOptions::new().with_chunk_size(1);
    client.get_models_with(&options).await.unwrap();

    assert_eq!(mock.max_in_flight(), 1);
}

#[tokio::test]
async fn test_page_limit_exceeded() {
    let mock = Arc::new(MockOdoo::new().endless());
    let client = connected(&mock).await;

    let options = CatalogOptions::new().with_page_size(10).with_max_pages(3);
    let err = client.get_models_with(&options).await.unwrap_err();

    assert!(matches!(err, CallError::PageLimitExceeded { pages: 3, .. }), "{:?}", err);
    assert_eq!(mock.calls_to("ir.model", "search_read").len(), 3);
    // Enrichment never started.
    assert!(mock
        .calls()
        .iter()
        .all(|call| call.model_method().map_or(true, |(_, method)| method != "fields_get")));
}

#[tokio::test]
async fn test_discovery_failure_is_fatal() {
    let mock = Arc::new(
        scenario().with_catalog_fault(Fault::new(fault_codes::APPLICATION_ERROR, "boom")),
    );
    let client = connected(&mock).await;

    let err = client.get_models().await.unwrap_err();
    match err {
        CallError::Transport { model, method, .. } => {
            assert_eq!(model, "ir.model");
            assert_eq!(method, "search_read");
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_business_models_domain_is_sent() {
    let mock = Arc::new(scenario());
    let client = connected(&mock).await;

    let options = CatalogOptions::new().with_domain(Domain::business_models());
    client.get_models_with(&options).await.unwrap();

    let call = &mock.calls_to("ir.model", "search_read")[0];
    assert_eq!(call.params[5], Domain::business_models().to_value());
}
