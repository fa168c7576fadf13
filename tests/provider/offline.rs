use httpmock::Method::GET;
use httpmock::MockServer;
use npiregistry_rs::{NpiError, ProviderBuilder};

use crate::common::{client_for, empty_envelope, envelope};

#[tokio::test]
async fn provider_lookup_decodes_first_result() {
    let server = MockServer::start();
    let npi = "1234567890";

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/")
            .query_param("version", "2.1")
            .query_param("number", npi)
            .query_param("limit", "1")
            .header("accept", "application/json");
        then.status(200)
            .header("content-type", "application/json")
            .body(envelope(&[npi]));
    });

    let client = client_for(&server);
    let p = client.get_provider(npi).await.unwrap();
    mock.assert();

    assert_eq!(p.number, npi);
    assert_eq!(p.enumeration_type, "NPI-1");
    assert_eq!(p.basic.first_name, "JOHN");
    assert_eq!(p.display_name(), "JOHN DOE");
    assert_eq!(p.location_address().map(|a| a.city.as_str()), Some("ANYTOWN"));
    assert_eq!(
        p.primary_taxonomy().map(|t| t.code.as_str()),
        Some("207Q00000X")
    );
}

#[tokio::test]
async fn zero_results_is_not_found_not_a_network_error() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/").query_param("number", "9999999999");
        then.status(200)
            .header("content-type", "application/json")
            .body(empty_envelope());
    });

    let client = client_for(&server);
    let err = client.get_provider("9999999999").await.unwrap_err();

    // a successful call with no records is not retried
    mock.assert_calls(1);
    assert!(err.is_not_found());
    match err {
        NpiError::NotFound { npi } => assert_eq!(npi, "9999999999"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_npi_is_rejected_before_any_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/");
        then.status(200).body(empty_envelope());
    });

    let client = client_for(&server);
    for npi in ["", "   "] {
        let err = ProviderBuilder::new(&client, npi).fetch().await.unwrap_err();
        assert!(
            matches!(err, NpiError::InvalidParams(_)),
            "expected InvalidParams, got {err:?}"
        );
    }
    mock.assert_calls(0);
}
