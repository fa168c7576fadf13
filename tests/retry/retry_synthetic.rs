use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use npiregistry_rs::{NpiClient, NpiError, RawResponse, RetryConfig};

use crate::common::{MockTransport, always_bad_request, always_unavailable, envelope, fast_retry};

fn client_with(transport: Arc<MockTransport>, retry: RetryConfig) -> NpiClient {
    NpiClient::builder()
        .transport(transport)
        .retry_config(retry)
        .build()
        .unwrap()
}

#[tokio::test]
async fn persistent_transient_fault_makes_r_plus_one_attempts() {
    for max_retries in [0_u32, 1, 2, 5] {
        let transport = Arc::new(MockTransport::new(always_unavailable));
        let client = client_with(transport.clone(), fast_retry(max_retries));

        let err = client.get_provider("1234567890").await.unwrap_err();

        assert_eq!(transport.calls(), (max_retries + 1) as usize);
        match err {
            NpiError::RetriesExhausted { attempts, last, .. } => {
                assert_eq!(attempts, max_retries + 1);
                assert_eq!(last.status(), Some(503));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn fatal_status_makes_one_attempt_without_delay() {
    let transport = Arc::new(MockTransport::new(always_bad_request));
    let client = client_with(transport.clone(), RetryConfig::default());

    let started = tokio::time::Instant::now();
    let err = client.get_provider("1234567890").await.unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert_eq!(started.elapsed(), std::time::Duration::ZERO);
    assert!(matches!(err, NpiError::Status { status: 400, .. }));
    assert!(!matches!(err, NpiError::RetriesExhausted { .. }));
}

fn third_time_lucky(npi: Option<&str>) -> RawResponse {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    if CALLS.fetch_add(1, Ordering::SeqCst) < 2 {
        RawResponse::new(503, "Service Unavailable")
    } else {
        RawResponse::new(200, envelope(&[npi.unwrap_or_default()]))
    }
}

#[tokio::test]
async fn recovers_when_upstream_comes_back() {
    let transport = Arc::new(MockTransport::new(third_time_lucky));
    let client = client_with(transport.clone(), fast_retry(3));

    let p = client.get_provider("1234567890").await.unwrap();

    assert_eq!(p.number, "1234567890");
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn per_call_retry_override_wins() {
    let transport = Arc::new(MockTransport::new(always_unavailable));
    let client = client_with(transport.clone(), fast_retry(5));

    let err = npiregistry_rs::ProviderBuilder::new(&client, "1234567890")
        .retry_policy(Some(RetryConfig::disabled()))
        .fetch()
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert!(matches!(err, NpiError::RetriesExhausted { attempts: 1, .. }));
}
