//! Async views

use super::state::{Fetch, ViewCore};
use crate::module::Module;
use crate::range::{IndexRange, Slice};
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt, TryStreamExt};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zucker_client::{AsyncClient, bulk};
use zucker_core::{Result, ZuckerError};
use zucker_filters::Filter;

/// Number of records requested together while streaming
pub const PREFETCH: i64 = 6;

/// Lazy cursor over records of module `M` for async code
///
/// Behaves like [`SyncView`](crate::SyncView) with awaitable lookups. Requests
/// issued inside [`bulk`] are batched with those of the other actions.
pub struct AsyncView<M, C: ?Sized> {
	core: ViewCore<M>,
	client: Arc<C>,
}

impl<M: Module, C: AsyncClient + ?Sized> AsyncView<M, C> {
	/// View over all records of the module
	pub fn new(client: Arc<C>) -> Self {
		Self::with_endpoint(client, M::API_NAME)
	}

	/// View over a listing endpoint returning records of the module
	pub fn with_endpoint(client: Arc<C>, base_endpoint: impl Into<String>) -> Self {
		Self {
			core: ViewCore::new(base_endpoint.into()),
			client,
		}
	}

	fn derive(&self, core: ViewCore<M>) -> Self {
		Self {
			core,
			client: Arc::clone(&self.client),
		}
	}

	pub fn client(&self) -> &Arc<C> {
		&self.client
	}

	pub fn endpoint(&self) -> &str {
		self.core.base_endpoint()
	}

	pub fn filter(&self) -> Option<&Filter> {
		self.core.filter()
	}

	/// New view with `filters` ANDed onto this view's filter
	pub fn filtered<I>(&self, filters: I) -> Result<Self>
	where
		I: IntoIterator,
		I::Item: Into<Filter>,
	{
		let filters = filters.into_iter().map(Into::into).collect();
		Ok(self.derive(self.core.filtered(filters)?))
	}

	/// New view over a part of this one, like `view[start:stop:step]`
	pub fn slice(&self, slice: impl Into<Slice>) -> Result<Self> {
		Ok(self.derive(self.core.sliced(slice.into())?))
	}

	/// New view iterating in the opposite direction, like `view[::-1]`
	pub fn reversed(&self) -> Self {
		self.derive(self.core.reversed())
	}

	async fn resolve(&self) -> Result<IndexRange> {
		if let Some(range) = self.core.try_resolve()? {
			return Ok(range);
		}
		let body = self.client.request(self.core.count_request()).await?;
		self.core.finalize_count(body)
	}

	/// Number of records in the view
	pub async fn len(&self) -> Result<usize> {
		Ok(self.resolve().await?.len())
	}

	pub async fn is_empty(&self) -> Result<bool> {
		Ok(self.len().await? == 0)
	}

	async fn fetch(&self, offset: i64) -> Result<Option<M>> {
		match self.core.prepare_fetch(offset) {
			Fetch::Cached(record) => Ok(record),
			Fetch::Remote(request) => {
				let body = self.client.request(request).await?;
				self.core.finalize_fetch(offset, body)
			}
		}
	}

	/// Record at `index`, negative indices counting from the end
	pub async fn get(&self, index: i64) -> Result<M> {
		let range = self.resolve().await?;
		let offset = ViewCore::<M>::locate(&range, index)?;
		self.fetch(offset).await?.ok_or(ZuckerError::IndexOutOfRange(index))
	}

	/// Like [`get`](Self::get), with `None` for indices that hold no record
	pub async fn get_optional(&self, index: i64) -> Result<Option<M>> {
		match self.get(index).await {
			Ok(record) => Ok(Some(record)),
			Err(ZuckerError::IndexOutOfRange(_)) => Ok(None),
			Err(error) => Err(error),
		}
	}

	/// Record with ID `key` among the records matching this view's filter
	///
	/// The view's slices are ignored.
	pub async fn get_by_id(&self, key: &str) -> Result<M> {
		let lookup = self.derive(self.core.id_lookup(key)?);
		lookup.get(0).await.map_err(|error| match error {
			ZuckerError::IndexOutOfRange(_) => ZuckerError::NotFound(key.to_string()),
			other => other,
		})
	}

	/// Position inside this view of the record at server offset `offset`
	pub async fn offset_to_index(&self, offset: i64) -> Result<Option<usize>> {
		let range = self.resolve().await?;
		Ok(ViewCore::<M>::offset_to_index(&range, offset))
	}

	/// Fetches the records at `first..first + PREFETCH` in one bulk round
	async fn prefetch(&self, first: i64) -> Result<Vec<Option<M>>> {
		self.resolve().await?;
		debug!(endpoint = %self.endpoint(), first, "prefetching records");
		let actions: Vec<BoxFuture<'_, Result<Option<M>>>> = (first..first + PREFETCH)
			.map(|index| self.get_optional(index).boxed())
			.collect();
		bulk(self.client.as_ref(), actions).await
	}

	/// Streams the records in window order
	///
	/// Records are fetched [`PREFETCH`] at a time, each batch in one bulk call.
	/// The stream ends at the first index without a record.
	pub fn stream(&self) -> BoxStream<'_, Result<M>> {
		let state = StreamState {
			view: self,
			next: 0,
			buffer: VecDeque::new(),
			exhausted: false,
		};
		stream::unfold(state, |mut state| async move {
			loop {
				if let Some(record) = state.buffer.pop_front() {
					return Some((Ok(record), state));
				}
				if state.exhausted {
					return None;
				}
				match state.view.prefetch(state.next).await {
					Ok(batch) => {
						state.next += PREFETCH;
						for record in batch {
							match record {
								Some(record) => state.buffer.push_back(record),
								None => {
									state.exhausted = true;
									break;
								}
							}
						}
					}
					Err(error) => {
						state.exhausted = true;
						return Some((Err(error), state));
					}
				}
			}
		})
		.boxed()
	}

	/// Fetches every record of the view
	pub async fn records(&self) -> Result<Vec<M>> {
		self.stream().try_collect().await
	}
}

struct StreamState<'a, M, C: ?Sized> {
	view: &'a AsyncView<M, C>,
	next: i64,
	buffer: VecDeque<M>,
	exhausted: bool,
}

impl<M, C: ?Sized> PartialEq for AsyncView<M, C> {
	fn eq(&self, other: &Self) -> bool {
		self.core == other.core
	}
}

impl<M: Module, C: ?Sized> fmt::Display for AsyncView<M, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.core.fmt_repr(f)
	}
}

impl<M: Module, C: ?Sized> fmt::Debug for AsyncView<M, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}
