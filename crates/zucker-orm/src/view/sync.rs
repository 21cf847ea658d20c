//! Blocking views

use super::state::{Fetch, ViewCore};
use crate::module::Module;
use crate::range::{IndexRange, Offsets, Slice};
use std::fmt;
use std::sync::Arc;
use zucker_client::SyncClient;
use zucker_core::{Result, ZuckerError};
use zucker_filters::Filter;

/// Lazy, blocking cursor over records of module `M`
///
/// Creating, filtering and slicing views never talks to the server. The
/// record count is fetched the first time the window has to be known (on
/// [`len`](Self::len), indexing or iteration) and shared with all views derived
/// from this one that keep its filter.
///
/// # Examples
///
/// ```rust,no_run
/// # use zucker_orm::{Module, Record, SyncView};
/// # use zucker_client::{ClientConfig, SugarClient};
/// # use std::sync::Arc;
/// # #[derive(Debug, Clone)] struct Lead(Record);
/// # impl Module for Lead {
/// #     const API_NAME: &'static str = "Leads";
/// #     fn from_record(r: Record) -> Self { Lead(r) }
/// #     fn record(&self) -> &Record { &self.0 }
/// #     fn record_mut(&mut self) -> &mut Record { &mut self.0 }
/// # }
/// let client = Arc::new(SugarClient::connect(ClientConfig::from_env()?)?);
/// let leads = SyncView::<Lead, _>::new(client);
///
/// for lead in leads.slice(..10)?.reversed().iter()? {
///     println!("{}", lead?.record());
/// }
/// # Ok::<(), zucker_core::ZuckerError>(())
/// ```
pub struct SyncView<M, C: ?Sized> {
	core: ViewCore<M>,
	client: Arc<C>,
}

impl<M: Module, C: SyncClient + ?Sized> SyncView<M, C> {
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

	fn resolve(&self) -> Result<IndexRange> {
		if let Some(range) = self.core.try_resolve()? {
			return Ok(range);
		}
		let body = self.client.request(self.core.count_request())?;
		self.core.finalize_count(body)
	}

	/// Number of records in the view
	pub fn len(&self) -> Result<usize> {
		Ok(self.resolve()?.len())
	}

	pub fn is_empty(&self) -> Result<bool> {
		Ok(self.len()? == 0)
	}

	fn fetch(&self, offset: i64) -> Result<Option<M>> {
		match self.core.prepare_fetch(offset) {
			Fetch::Cached(record) => Ok(record),
			Fetch::Remote(request) => {
				let body = self.client.request(request)?;
				self.core.finalize_fetch(offset, body)
			}
		}
	}

	/// Record at `index`, negative indices counting from the end
	///
	/// Returns [`ZuckerError::IndexOutOfRange`] if the index is outside the view
	/// or the server has no record there anymore.
	pub fn get(&self, index: i64) -> Result<M> {
		let range = self.resolve()?;
		let offset = ViewCore::<M>::locate(&range, index)?;
		self.fetch(offset)?.ok_or(ZuckerError::IndexOutOfRange(index))
	}

	/// Record with ID `key` among the records matching this view's filter
	///
	/// The view's slices are ignored.
	pub fn get_by_id(&self, key: &str) -> Result<M> {
		let lookup = self.derive(self.core.id_lookup(key)?);
		lookup.get(0).map_err(|error| match error {
			ZuckerError::IndexOutOfRange(_) => ZuckerError::NotFound(key.to_string()),
			other => other,
		})
	}

	/// Position inside this view of the record at server offset `offset`
	pub fn offset_to_index(&self, offset: i64) -> Result<Option<usize>> {
		let range = self.resolve()?;
		Ok(ViewCore::<M>::offset_to_index(&range, offset))
	}

	/// Iterates over the records in window order
	///
	/// Records that vanished between counting and fetching are skipped.
	pub fn iter(&self) -> Result<Iter<'_, M, C>> {
		Ok(Iter {
			view: self,
			offsets: self.resolve()?.iter(),
		})
	}

	/// Fetches every record of the view
	pub fn records(&self) -> Result<Vec<M>> {
		self.iter()?.collect()
	}
}

impl<M, C: ?Sized> PartialEq for SyncView<M, C> {
	fn eq(&self, other: &Self) -> bool {
		self.core == other.core
	}
}

impl<M: Module, C: ?Sized> fmt::Display for SyncView<M, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.core.fmt_repr(f)
	}
}

impl<M: Module, C: ?Sized> fmt::Debug for SyncView<M, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

/// Iterator returned by [`SyncView::iter`]
pub struct Iter<'a, M, C: ?Sized> {
	view: &'a SyncView<M, C>,
	offsets: Offsets,
}

impl<M: Module, C: SyncClient + ?Sized> Iterator for Iter<'_, M, C> {
	type Item = Result<M>;

	fn next(&mut self) -> Option<Result<M>> {
		for offset in self.offsets.by_ref() {
			match self.view.fetch(offset) {
				Ok(Some(record)) => return Some(Ok(record)),
				Ok(None) => continue,
				Err(error) => return Some(Err(error)),
			}
		}
		None
	}
}
