//! Bulk request coordination
//!
//! [`bulk`] runs several actions together on the current task. Whenever an
//! action is polled, requests it makes through [`AsyncClient::request`] are
//! queued in the task-local session instead of being sent. Once every
//! unfinished action is waiting on a queued request, the whole queue goes out
//! as one physical `bulk` call and the results are handed back by key. This
//! repeats until all actions are done.
//!
//! The coordinator relies on polling all actions from a single task. It is
//! not meant for actions that are spawned onto other tasks or threads.

use crate::async_client::AsyncClient;
use crate::request::Request;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::poll_fn;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;
use zucker_core::json::kind_of;
use zucker_core::{JsonMap, Result, ZuckerError};

tokio::task_local! {
	static SESSION: Arc<Session>;
}

#[derive(Default)]
struct Session {
	state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
	/// Action currently being polled
	current: Option<usize>,
	next_action: usize,
	/// Unfinished actions that are not waiting on a nested `bulk`
	running: HashSet<usize>,
	/// Requests waiting for the next round, in submission order
	queue: Vec<Queued>,
}

impl SessionState {
	fn register<'a, T>(&mut self, actions: Vec<BoxFuture<'a, Result<T>>>) -> Vec<(usize, Slot<'a, T>)> {
		actions
			.into_iter()
			.map(|action| {
				let id = self.next_action;
				self.next_action += 1;
				self.running.insert(id);
				(id, Slot::Running(action))
			})
			.collect()
	}

	/// Whether every running action has a request in the queue
	fn all_waiting(&self) -> bool {
		self.running
			.iter()
			.all(|id| self.queue.iter().any(|queued| queued.action == *id))
	}
}

struct Queued {
	key: Uuid,
	action: usize,
	request: Request,
	reply: oneshot::Sender<Result<JsonMap>>,
}

pub(crate) enum Enqueued {
	/// The request joined the session's queue
	Queued(oneshot::Receiver<Result<JsonMap>>),
	/// No session is active, the request has to be executed directly
	Direct(Request),
}

/// Queues the request if it is made from an action of an active session
pub(crate) fn enqueue(request: Request) -> Enqueued {
	let Ok(session) = SESSION.try_with(Arc::clone) else {
		return Enqueued::Direct(request);
	};
	let mut state = session.state.lock();
	let Some(action) = state.current else {
		return Enqueued::Direct(request);
	};

	let (reply, receiver) = oneshot::channel();
	let key = Uuid::new_v4();
	debug!(%key, action, endpoint = %request.endpoint, "queued request for bulk execution");
	state.queue.push(Queued {
		key,
		action,
		request,
		reply,
	});
	Enqueued::Queued(receiver)
}

/// Whether the current task is inside a bulk session
pub fn in_session() -> bool {
	SESSION.try_with(|_| ()).is_ok()
}

enum Slot<'a, T> {
	Running(BoxFuture<'a, Result<T>>),
	Done(Result<T>),
}

/// Runs the actions together and batches their requests
///
/// Results are returned in the order of `actions`. If an action fails, the
/// first failure (in that order) is returned once all actions are finished.
/// A failing physical bulk call aborts every action.
///
/// Calling `bulk` from inside another `bulk` action does not open a new
/// session: the inner actions join the outer session and each of them has to
/// be waiting on a request before a round is sent.
///
/// # Examples
///
/// ```rust,no_run
/// use futures::FutureExt;
/// use zucker_client::{AsyncClient, AsyncSugarClient, ClientConfig, Request, bulk};
///
/// # async fn run() -> zucker_core::Result<()> {
/// let client = AsyncSugarClient::connect(ClientConfig::from_env()?)?;
/// let counts = bulk(
///     &client,
///     vec![
///         client.request(Request::get("Accounts/count")).boxed(),
///         client.request(Request::get("Contacts/count")).boxed(),
///     ],
/// )
/// .await?;
/// assert_eq!(counts.len(), 2);
/// # Ok(())
/// # }
/// ```
pub async fn bulk<'a, C, T>(client: &'a C, actions: Vec<BoxFuture<'a, Result<T>>>) -> Result<Vec<T>>
where
	C: AsyncClient + ?Sized,
	T: Send + 'a,
{
	if let Ok(session) = SESSION.try_with(Arc::clone) {
		return join_nested(session, actions).await;
	}

	let session = Arc::new(Session::default());
	let mut slots = session.state.lock().register(actions);
	let mut round = 0usize;

	loop {
		poll_fn(|cx| {
			poll_actions(&session, &mut slots, None, cx);
			if session.state.lock().all_waiting() {
				Poll::Ready(())
			} else {
				Poll::Pending
			}
		})
		.await;

		let batch = std::mem::take(&mut session.state.lock().queue);
		if batch.is_empty() {
			break;
		}
		round += 1;
		debug!(round, size = batch.len(), "dispatching bulk round");

		let mut keys = Vec::with_capacity(batch.len());
		let mut replies = HashMap::with_capacity(batch.len());
		let mut requests = Vec::with_capacity(batch.len());
		for queued in batch {
			keys.push(queued.key);
			replies.insert(queued.key, queued.reply);
			requests.push(queued.request);
		}

		let results = client.execute_bulk(requests).await?;
		if results.len() != keys.len() {
			return Err(ZuckerError::InvalidResponse(format!(
				"bulk call returned {} results for {} requests",
				results.len(),
				keys.len()
			)));
		}
		for (key, result) in keys.into_iter().zip(results) {
			if let Some(reply) = replies.remove(&key) {
				// The action may have been dropped already.
				let _ = reply.send(result);
			}
		}
	}

	into_results(slots)
}

/// Runs the actions of a nested `bulk` as actions of the outer session
///
/// The calling action stops counting for the round barrier until the nested
/// actions are finished, each of which counts on its own instead.
async fn join_nested<'a, T>(session: Arc<Session>, actions: Vec<BoxFuture<'a, Result<T>>>) -> Result<Vec<T>> {
	let (parent, mut slots) = {
		let mut state = session.state.lock();
		let parent = state.current;
		if let Some(parent) = parent {
			state.running.remove(&parent);
		}
		(parent, state.register(actions))
	};
	let _delegation = Delegation {
		session: session.as_ref(),
		actions: slots.iter().map(|(id, _)| *id).collect(),
		parent,
	};

	poll_fn(|cx| {
		if poll_actions(&session, &mut slots, parent, cx) {
			Poll::Ready(())
		} else {
			Poll::Pending
		}
	})
	.await;
	into_results(slots)
}

/// Hands the barrier back to the calling action once a nested `bulk` ends
struct Delegation<'s> {
	session: &'s Session,
	actions: Vec<usize>,
	parent: Option<usize>,
}

impl Drop for Delegation<'_> {
	fn drop(&mut self) {
		let mut state = self.session.state.lock();
		for id in &self.actions {
			state.running.remove(id);
		}
		if let Some(parent) = self.parent {
			state.running.insert(parent);
		}
	}
}

/// Polls every unfinished action once, returning whether all are finished
///
/// `parent` is the action that is current again after each poll.
fn poll_actions<T>(
	session: &Arc<Session>,
	slots: &mut [(usize, Slot<'_, T>)],
	parent: Option<usize>,
	cx: &mut Context<'_>,
) -> bool {
	for (id, slot) in slots.iter_mut() {
		let Slot::Running(action) = slot else {
			continue;
		};
		session.state.lock().current = Some(*id);
		let poll = SESSION.sync_scope(Arc::clone(session), || action.as_mut().poll(cx));
		{
			let mut state = session.state.lock();
			state.current = parent;
			if poll.is_ready() {
				state.running.remove(id);
			}
		}
		if let Poll::Ready(result) = poll {
			*slot = Slot::Done(result);
		}
	}
	slots.iter().all(|(_, slot)| matches!(slot, Slot::Done(_)))
}

fn into_results<T>(slots: Vec<(usize, Slot<'_, T>)>) -> Result<Vec<T>> {
	slots
		.into_iter()
		.map(|(_, slot)| match slot {
			Slot::Done(result) => result,
			Slot::Running(_) => Err(ZuckerError::InvalidResponse(
				"bulk action did not complete".to_string(),
			)),
		})
		.collect()
}

/// Splits a `bulk` response body into per-request results
///
/// Every element must be an object with an integer `status` and an object
/// `contents`. Elements with an error status become [`ZuckerError::Api`].
pub fn split_response(body: Value, expected: usize) -> Result<Vec<Result<JsonMap>>> {
	let Value::Array(elements) = body else {
		return Err(protocol_violation(format!(
			"expected the bulk response to be an array, got {}",
			kind_of(&body)
		)));
	};
	if elements.len() != expected {
		return Err(protocol_violation(format!(
			"bulk response has {} elements for {expected} requests",
			elements.len()
		)));
	}

	elements
		.into_iter()
		.map(|element| {
			let Value::Object(mut element) = element else {
				return Err(protocol_violation(
					"bulk response elements must be objects".to_string(),
				));
			};
			let status = element
				.get("status")
				.and_then(Value::as_u64)
				.and_then(|status| u16::try_from(status).ok())
				.ok_or_else(|| {
					protocol_violation("bulk response element has no integer status".to_string())
				})?;
			let Some(Value::Object(contents)) = element.remove("contents") else {
				return Err(protocol_violation(
					"bulk response element has no object contents".to_string(),
				));
			};
			if status >= 400 {
				let message = contents
					.get("error_message")
					.and_then(Value::as_str)
					.map(str::to_string)
					.unwrap_or_else(|| format!("request failed with status {status}"));
				return Ok(Err(ZuckerError::Api { status, message }));
			}
			Ok(Ok(contents))
		})
		.collect()
}

fn protocol_violation(message: String) -> ZuckerError {
	warn!(%message, "invalid bulk response");
	ZuckerError::InvalidResponse(message)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_split_response() {
		// Arrange
		let body = json!([
			{"status": 200, "contents": {"record_count": 3}},
			{"status": 404, "contents": {"error_message": "gone"}},
		]);

		// Act
		let results = split_response(body, 2).unwrap();

		// Assert
		assert_eq!(results[0].as_ref().unwrap()["record_count"], json!(3));
		assert_eq!(results[1].as_ref().unwrap_err().status(), Some(404));
	}

	#[rstest]
	#[case(json!({"status": 200}), 1)]
	#[case(json!([]), 1)]
	#[case(json!([{"status": "200", "contents": {}}]), 1)]
	#[case(json!([{"status": 200, "contents": []}]), 1)]
	#[case(json!([{"status": 200}]), 1)]
	#[case(json!(["x"]), 1)]
	fn test_split_response_rejects_malformed(#[case] body: Value, #[case] expected: usize) {
		let result = split_response(body, expected);

		assert!(result.unwrap_err().is_invalid_response());
	}

	#[rstest]
	fn test_enqueue_outside_session_is_direct() {
		let result = enqueue(Request::get("Demo"));

		assert!(matches!(result, Enqueued::Direct(_)));
		assert!(!in_session());
	}
}
