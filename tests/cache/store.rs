use std::time::Duration;

use npiregistry_rs::CacheStore;

#[tokio::test(start_paused = true)]
async fn entry_is_served_until_it_expires() {
    let store = CacheStore::new(true);
    store.put("a", 1_u32, Duration::from_secs(10)).await;

    assert_eq!(store.get("a").await, Some(1));

    tokio::time::advance(Duration::from_secs(9)).await;
    assert_eq!(store.get("a").await, Some(1));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(store.get("a").await, None);
    // expiry on read is passive
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn reads_never_extend_an_entry() {
    let store = CacheStore::new(true);
    store.put("a", "x".to_string(), Duration::from_secs(10)).await;

    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(2)).await;
        let _ = store.get("a").await;
    }
    tokio::time::advance(Duration::from_secs(1)).await;

    assert_eq!(store.get("a").await, None);
}

#[tokio::test(start_paused = true)]
async fn put_replaces_value_and_expiry() {
    let store = CacheStore::new(true);
    store.put("a", 1_u32, Duration::from_secs(5)).await;
    tokio::time::advance(Duration::from_secs(4)).await;
    store.put("a", 2_u32, Duration::from_secs(5)).await;
    tokio::time::advance(Duration::from_secs(4)).await;

    assert_eq!(store.get("a").await, Some(2));
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn sweep_removes_only_expired_entries() {
    let store = CacheStore::new(true);
    store.put("short", 1_u32, Duration::from_secs(1)).await;
    store.put("long", 2_u32, Duration::from_secs(100)).await;

    assert_eq!(store.sweep().await, 0);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(store.sweep().await, 1);
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get("long").await, Some(2));
}

#[tokio::test]
async fn disabled_store_is_inert() {
    let store: CacheStore<u32> = CacheStore::default();
    assert!(!store.is_enabled());

    store.put("a", 1, Duration::from_secs(60)).await;
    assert!(store.is_empty().await);
    assert_eq!(store.get("a").await, None);
}

#[tokio::test]
async fn toggling_hides_but_keeps_entries() {
    let store = CacheStore::new(true);
    store.put("a", 1_u32, Duration::from_secs(60)).await;

    store.set_enabled(false);
    assert_eq!(store.get("a").await, None);
    assert_eq!(store.len().await, 1);

    store.set_enabled(true);
    assert_eq!(store.get("a").await, Some(1));

    store.clear().await;
    assert!(store.is_empty().await);
}
