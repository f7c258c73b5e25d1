use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use pretty_assertions::assert_eq;
use wgui_core::core::data_loader::{DataLoader, LoadError, Loader};

/// Backing store that records every batch it is asked for.
#[derive(Clone, Default)]
struct Store {
    rows: HashMap<u32, String>,
    failing: Vec<u32>,
    batches: Arc<Mutex<Vec<Vec<u32>>>>,
}

impl Store {
    fn with_rows(n: u32) -> Self {
        Self { rows: (0..n).map(|i| (i, format!("row-{i}"))).collect(), ..Default::default() }
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl Loader<u32> for Store {
    type Value = String;
    type Error = String;

    async fn load(&self, keys: &[u32]) -> Vec<Result<Option<String>, String>> {
        self.batches.lock().unwrap().push(keys.to_vec());
        keys.iter()
            .map(|key| {
                if self.failing.contains(key) {
                    Err(format!("row {key} is corrupt"))
                } else {
                    Ok(self.rows.get(key).cloned())
                }
            })
            .collect()
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_are_split_by_max_batch_size() {
    let store = Store::with_rows(1500);
    let loader = DataLoader::<u32, _>::new(store.clone())
        .delay(Duration::from_micros(250))
        .max_batch_size(1000);

    let results = loader.load_many(0..1500).await;

    assert_eq!(results.len(), 1500);
    assert_eq!(results[1499], Ok(Some("row-1499".to_string())));
    assert_eq!(store.batch_sizes(), vec![1000, 500]);
}

#[tokio::test]
async fn test_fetch_count_is_bounded_by_unique_keys() {
    let store = Store::with_rows(10);
    let loader = DataLoader::<u32, _>::new(store.clone()).max_batch_size(4);

    let keys = [1, 2, 3, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9];
    let results = loader.load_many(keys).await;

    assert_eq!(results.len(), keys.len());
    assert_eq!(results[3], Ok(Some("row-1".to_string())));
    // 9 unique keys, at most 4 per batch
    assert_eq!(store.batch_sizes(), vec![4, 4, 1]);
}

#[tokio::test]
async fn test_resolved_keys_are_served_from_cache() {
    let store = Store::with_rows(3);
    let loader = DataLoader::<u32, _>::new(store.clone());

    let first = loader.load_one(1).await;
    let second = loader.load_one(1).await;

    assert_eq!(first, Ok(Some("row-1".to_string())));
    assert_eq!(first, second);
    assert_eq!(store.batch_sizes(), vec![1]);
}

#[tokio::test]
async fn test_errors_stay_with_their_key() {
    let store = Store { failing: vec![1], ..Store::with_rows(3) };
    let loader = DataLoader::<u32, _>::new(store.clone());

    let results = join_all([loader.load(0), loader.load(1), loader.load(2)]).await;
    assert_eq!(
        results,
        vec![
            Ok(Some("row-0".to_string())),
            Err(LoadError::Fetch("row 1 is corrupt".to_string())),
            Ok(Some("row-2".to_string())),
        ]
    );

    // only the failed key is fetched again
    let retry = join_all([loader.load(0), loader.load(1)]).await;
    assert_eq!(retry[0], Ok(Some("row-0".to_string())));
    assert!(retry[1].is_err());
    assert_eq!(store.batches.lock().unwrap().last().cloned(), Some(vec![1]));

    let errors: Vec<_> = results.iter().chain(&retry).filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(
        loader.format_errors(errors),
        Some("2 errors occurred:\n * 2 row 1 is corrupt\n\n".to_string())
    );
}

#[tokio::test]
async fn test_prime_only_fills_missing_keys() {
    let store = Store::with_rows(3);
    let loader = DataLoader::<u32, _>::new(store.clone());

    assert!(loader.prime(7, "primed".to_string()));
    assert!(!loader.prime(7, "again".to_string()));
    assert_eq!(loader.load_one(7).await, Ok(Some("primed".to_string())));
    assert!(store.batch_sizes().is_empty());
}
