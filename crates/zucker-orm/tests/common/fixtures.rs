//! Fake Sugar server serving a fixed `Demo` collection

use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use zucker_client::testing::{FakeSugar, test_config};
use zucker_client::{AsyncSugarClient, Method, RawResponse, Request, SugarClient};

/// IDs of the thirteen records in the fixture collection
pub const RECORD_IDS: [&str; 13] = [
	"zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
	"twelve",
];

/// Answers listing, count and single-record requests for `Demo`
///
/// `reported_count` overrides the count sent by `Demo/count`, which simulates
/// records disappearing between counting and fetching.
pub fn demo_handler(reported_count: Option<usize>) -> impl Fn(&Request) -> RawResponse + Send + Sync + 'static {
	move |request: &Request| {
		let matching: Vec<&str> = match request.params.get("filter[0][id][$equals]") {
			Some(key) => RECORD_IDS.iter().copied().filter(|id| *id == key.as_str()).collect(),
			None => RECORD_IDS.to_vec(),
		};

		match (&request.method, request.endpoint.as_str()) {
			(&Method::GET, "Demo/count") => {
				RawResponse::ok(json!({"record_count": reported_count.unwrap_or(matching.len())}))
			}
			(&Method::GET, "Demo") => {
				let number = |key: &str| -> usize {
					request.params[key].parse().expect("numeric listing parameter")
				};
				let offset = number("offset");
				let max_num = number("max_num");
				let records: Vec<Value> = matching
					.iter()
					.skip(offset)
					.take(max_num)
					.map(|id| json!({"_module": "Demo", "id": id, "name": format!("Record {id}")}))
					.collect();
				RawResponse::ok(json!({"records": records}))
			}
			(&Method::POST, "Demo") => {
				let mut data = request.json.clone().unwrap_or_default();
				data.insert("id".to_string(), json!("created"));
				data.insert("_module".to_string(), json!("Demo"));
				RawResponse::ok(Value::Object(data))
			}
			(&Method::PUT, endpoint) => {
				let id = endpoint.trim_start_matches("Demo/");
				let mut data = request.json.clone().unwrap_or_default();
				data.insert("id".to_string(), json!(id));
				RawResponse::ok(Value::Object(data))
			}
			(&Method::GET, endpoint) if is_record_endpoint(endpoint) => {
				let id = endpoint.trim_start_matches("Demo/");
				RawResponse::ok(json!({"_module": "Demo", "id": id, "name": "From server"}))
			}
			(&Method::DELETE, endpoint) => {
				RawResponse::ok(json!({"id": endpoint.trim_start_matches("Demo/")}))
			}
			_ => RawResponse::new(404, json!({"error_message": "no such endpoint"})),
		}
	}
}

fn is_record_endpoint(endpoint: &str) -> bool {
	endpoint
		.strip_prefix("Demo/")
		.is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

#[fixture]
pub fn sync_client() -> Arc<SugarClient<FakeSugar>> {
	Arc::new(SugarClient::with_transport(test_config(), FakeSugar::new(demo_handler(None))).unwrap())
}

#[fixture]
pub fn async_client() -> Arc<AsyncSugarClient<FakeSugar>> {
	Arc::new(
		AsyncSugarClient::with_transport(test_config(), FakeSugar::new(demo_handler(None))).unwrap(),
	)
}

/// Offsets requested from the `Demo` listing, directly or inside bulk calls
pub fn fetched_offsets(server: &FakeSugar) -> Vec<i64> {
	let direct = server.requests().into_iter().map(|raw| raw.request);
	let bulked = server.bulk_batches().into_iter().flatten();
	direct
		.chain(bulked)
		.filter(|request| request.endpoint == "Demo")
		.filter_map(|request| request.params.get("offset")?.parse().ok())
		.collect()
}
