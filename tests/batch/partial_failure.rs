use std::sync::Arc;

use npiregistry_rs::{BatchBuilder, NpiClient, NpiError, RawResponse};

use crate::common::{MockTransport, always_ok, empty_envelope, envelope, fast_retry};

const GOOD_A: &str = "1111111111";
const BAD: &str = "2222222222";
const GOOD_B: &str = "3333333333";

fn second_key_broken(npi: Option<&str>) -> RawResponse {
    match npi {
        Some(BAD) => RawResponse::new(500, "Internal Server Error"),
        Some(n) => RawResponse::new(200, envelope(&[n])),
        None => RawResponse::new(400, "missing number"),
    }
}

fn second_key_unknown(npi: Option<&str>) -> RawResponse {
    match npi {
        Some(BAD) => RawResponse::new(200, empty_envelope()),
        Some(n) => RawResponse::new(200, envelope(&[n])),
        None => RawResponse::new(400, "missing number"),
    }
}

fn client(transport: Arc<MockTransport>) -> NpiClient {
    NpiClient::builder()
        .transport(transport)
        .retry_config(fast_retry(2))
        .build()
        .unwrap()
}

#[tokio::test]
async fn one_failing_key_does_not_sink_the_batch() {
    let transport = Arc::new(MockTransport::new(second_key_broken));
    let client = client(transport.clone());

    let result = client.get_providers([GOOD_A, BAD, GOOD_B]).await.unwrap();

    assert_eq!(result.total(), 3);
    assert!(!result.is_complete());
    assert_eq!(result.succeeded().len(), 2);
    assert_eq!(result.get(GOOD_A).unwrap().number, GOOD_A);
    assert_eq!(result.get(GOOD_B).unwrap().number, GOOD_B);
    assert!(result.get(BAD).is_none());

    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, BAD);
    assert!(matches!(
        failures[0].1,
        NpiError::RetriesExhausted { attempts: 3, .. }
    ));

    // 1 call each for the good keys, 3 for the broken one
    assert_eq!(transport.calls(), 5);
}

#[tokio::test]
async fn into_parts_reports_an_aggregate_partial_failure() {
    let transport = Arc::new(MockTransport::new(second_key_unknown));
    let client = client(transport);

    let (found, err) = client
        .get_providers([GOOD_A, BAD, GOOD_B])
        .await
        .unwrap()
        .into_parts();

    assert_eq!(found.len(), 2);
    assert!(found.contains_key(GOOD_A));
    assert!(found.contains_key(GOOD_B));

    match err {
        Some(NpiError::PartialBatch {
            failed,
            total,
            key,
            source,
        }) => {
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
            assert_eq!(key, BAD);
            assert!(source.is_not_found());
        }
        other => panic!("expected PartialBatch, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_batch_has_no_error() {
    let transport = Arc::new(MockTransport::new(always_ok));
    let client = client(transport.clone());

    let result = client.get_providers([GOOD_A, GOOD_B]).await.unwrap();
    assert!(result.is_complete());

    let (found, err) = result.into_parts();
    assert_eq!(found.len(), 2);
    assert!(err.is_none());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn empty_batch_is_rejected_before_any_request() {
    let transport = Arc::new(MockTransport::new(always_ok));
    let client = client(transport.clone());

    let err = client
        .get_providers(Vec::<String>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NpiError::InvalidParams(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn duplicate_keys_are_fetched_once() {
    let transport = Arc::new(MockTransport::new(always_ok));
    let client = client(transport.clone());

    let result = client
        .get_providers([GOOD_A, GOOD_A, GOOD_B, GOOD_A])
        .await
        .unwrap();

    assert_eq!(result.total(), 2);
    assert_eq!(result.succeeded().len(), 2);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn zero_concurrency_is_a_config_error() {
    let transport = Arc::new(MockTransport::new(always_ok));
    let client = client(transport.clone());

    let err = BatchBuilder::new(&client, [GOOD_A])
        .concurrency(0)
        .fetch()
        .await
        .unwrap_err();

    assert!(matches!(err, NpiError::Config(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn batch_fills_and_reads_the_cache() {
    let transport = Arc::new(MockTransport::new(always_ok));
    let client = NpiClient::builder()
        .transport(transport.clone())
        .cache_ttl(std::time::Duration::from_secs(60))
        .build()
        .unwrap();

    client.get_providers([GOOD_A, GOOD_B]).await.unwrap();
    assert_eq!(transport.calls(), 2);

    let p = client.get_provider(GOOD_A).await.unwrap();
    assert_eq!(p.number, GOOD_A);
    let again = client.get_providers([GOOD_A, GOOD_B]).await.unwrap();
    assert!(again.is_complete());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn padded_duplicates_collapse_to_one_trimmed_key() {
    let transport = Arc::new(MockTransport::new(always_ok));
    let client = client(transport.clone());
    assert!(!client.cache_enabled());

    let result = client
        .get_providers([GOOD_A, " 1111111111 ", "1111111111\t"])
        .await
        .unwrap();

    assert_eq!(result.total(), 1);
    assert_eq!(transport.calls(), 1);
    assert_eq!(result.succeeded().len(), 1);
    assert!(result.get(GOOD_A).is_some());
}

#[tokio::test]
async fn failures_are_reported_under_the_trimmed_key() {
    let transport = Arc::new(MockTransport::new(second_key_unknown));
    let client = client(transport);

    let result = client
        .get_providers([" 2222222222 ", GOOD_B])
        .await
        .unwrap();

    assert_eq!(result.failures().len(), 1);
    assert_eq!(result.failures()[0].0, BAD);
    assert!(result.get(GOOD_B).is_some());
}
