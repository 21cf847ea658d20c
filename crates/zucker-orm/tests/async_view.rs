//! Async views, streaming and bulk batching

use crate::common::fixtures::{RECORD_IDS, async_client, fetched_offsets};
use crate::common::modules::{Demo, ids};
use futures::{FutureExt, StreamExt};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use zucker_client::AsyncSugarClient;
use zucker_client::testing::{FakeSugar, json_map};
use zucker_core::ZuckerError;
use zucker_orm::{AsyncManager, AsyncView, Module, MutableField, PREFETCH};

type Client = AsyncSugarClient<FakeSugar>;

fn batch_sizes(server: &FakeSugar) -> Vec<usize> {
	server.bulk_batches().iter().map(Vec::len).collect()
}

#[rstest]
#[tokio::test]
async fn test_stream_prefetches_in_bulk_rounds(async_client: Arc<Client>) {
	// Arrange
	let view = AsyncView::<Demo, _>::new(Arc::clone(&async_client));

	// Act
	let records = view.records().await.unwrap();

	// Assert
	let expected: Vec<String> = RECORD_IDS.iter().map(ToString::to_string).collect();
	assert_eq!(ids(&records), expected);
	let server = async_client.transport();
	assert_eq!(
		server.endpoints(),
		vec!["oauth2/token/", "Demo/count", "bulk", "bulk", "bulk"]
	);
	assert_eq!(batch_sizes(server), vec![6, 6, 1]);
	assert_eq!(PREFETCH, 6);
}

#[rstest]
#[tokio::test]
async fn test_reversed_stream(async_client: Arc<Client>) {
	let view = AsyncView::<Demo, _>::new(async_client).reversed();

	let records = view.records().await.unwrap();

	let expected: Vec<String> = RECORD_IDS.iter().rev().map(ToString::to_string).collect();
	assert_eq!(ids(&records), expected);
}

#[rstest]
#[tokio::test]
async fn test_stream_can_stop_early(async_client: Arc<Client>) {
	// Arrange
	let view = AsyncView::<Demo, _>::new(Arc::clone(&async_client))
		.slice(3..)
		.unwrap();

	// Act
	let first: Vec<Demo> = view
		.stream()
		.take(2)
		.map(|record| record.unwrap())
		.collect()
		.await;

	// Assert
	assert_eq!(ids(&first), vec!["three", "four"]);
	assert_eq!(
		fetched_offsets(async_client.transport()),
		vec![3, 4, 5, 6, 7, 8]
	);
}

#[rstest]
#[tokio::test]
async fn test_resolved_view_batches_lookups_into_one_round(async_client: Arc<Client>) {
	// Arrange
	let view = AsyncView::<Demo, _>::new(Arc::clone(&async_client));
	assert_eq!(view.len().await.unwrap(), 13);

	// Act
	let records = async_client
		.bulk(vec![
			view.get(0).boxed(),
			view.get(5).boxed(),
			view.get(-1).boxed(),
		])
		.await
		.unwrap();

	// Assert
	assert_eq!(ids(&records), vec!["zero", "five", "twelve"]);
	assert_eq!(batch_sizes(async_client.transport()), vec![3]);
}

#[rstest]
#[tokio::test]
async fn test_unresolved_view_counts_then_fetches(async_client: Arc<Client>) {
	let view = AsyncView::<Demo, _>::new(Arc::clone(&async_client));

	let records = async_client
		.bulk(vec![view.get(1).boxed(), view.get(2).boxed()])
		.await
		.unwrap();

	assert_eq!(ids(&records), vec!["one", "two"]);
	assert_eq!(batch_sizes(async_client.transport()), vec![2, 2]);
}

#[rstest]
#[tokio::test]
async fn test_get_optional_turns_out_of_range_into_none(async_client: Arc<Client>) {
	let view = AsyncView::<Demo, _>::new(async_client);

	let present = view.get_optional(-13).await.unwrap();
	let absent = view.get_optional(13).await.unwrap();

	assert_eq!(present.and_then(|record| record.id().map(str::to_string)), Some("zero".to_string()));
	assert!(absent.is_none());
}

#[rstest]
#[tokio::test]
async fn test_get_by_id(async_client: Arc<Client>) {
	let view = AsyncView::<Demo, _>::new(async_client);

	let found = view.get_by_id("seven").await.unwrap();
	let missing = view.get_by_id("thirteen").await.unwrap_err();

	assert_eq!(found.id(), Some("seven"));
	assert!(matches!(missing, ZuckerError::NotFound(key) if key == "thirteen"));
}

#[rstest]
#[tokio::test]
async fn test_invalid_key_is_rejected_locally(async_client: Arc<Client>) {
	let view = AsyncView::<Demo, _>::new(Arc::clone(&async_client));

	let error = view.get_by_id("a/b").await.unwrap_err();

	assert!(error.is_validation());
	assert!(async_client.transport().requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_manager_saves_and_caches(async_client: Arc<Client>) {
	// Arrange
	let manager = AsyncManager::<Demo, _>::new(Arc::clone(&async_client));
	let mut record = Demo::new(json_map(json!({"name": "Fresh"}))).unwrap();

	// Act
	manager.save(&mut record).await.unwrap();
	Demo::NAME.set(&mut record, "Renamed".to_string()).unwrap();
	manager.save(&mut record).await.unwrap();

	// Assert
	let requests = async_client.transport().requests();
	let methods: Vec<String> = requests
		.iter()
		.skip(1)
		.map(|raw| format!("{} {}", raw.request.method, raw.request.endpoint))
		.collect();
	assert_eq!(methods, vec!["POST Demo", "PUT Demo/created"]);
	assert!(!record.record().has_changes());
	let cached = manager.get_by_id("created").await.unwrap();
	assert_eq!(cached.record().get_str("name"), Some("Renamed"));
	assert_eq!(async_client.transport().requests().len(), requests.len());
}
