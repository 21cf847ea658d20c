//! State and request logic shared by both view flavors
//!
//! Nothing in here performs I/O. The blocking and async views ask the core
//! what to send, send it with their client and hand the response back.

use crate::module::Module;
use crate::range::{IndexRange, Slice};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};
use zucker_client::Request;
use zucker_core::json::kind_of;
use zucker_core::{JsonMap, Result, ZuckerError};
use zucker_filters::{Filter, FilterSet, ValuesFilter, render_query_params};

/// Which part of the filtered collection a view covers
#[derive(Debug, Clone, Default)]
struct Window {
	/// Slices already folded into `range`
	applied: Vec<Slice>,
	/// Slices waiting for the collection size
	pending: Vec<Slice>,
	range: Option<IndexRange>,
}

impl Window {
	/// Same slices, nothing resolved
	fn unresolved(&self) -> Self {
		Self {
			applied: Vec::new(),
			pending: self.applied.iter().chain(&self.pending).copied().collect(),
			range: None,
		}
	}

	fn resolve(&mut self, size: Option<usize>) -> Result<Option<IndexRange>> {
		if self.pending.is_empty() && self.range.is_some() {
			return Ok(self.range);
		}
		let Some(mut range) = self.range.or_else(|| size.map(IndexRange::full)) else {
			return Ok(None);
		};
		for slice in &self.pending {
			range = range.slice(*slice)?;
		}
		self.applied.append(&mut self.pending);
		self.range = Some(range);
		Ok(Some(range))
	}
}

/// Server-side facts that hold for every view with the same filter
#[derive(Debug)]
struct Shared<M> {
	size: Option<usize>,
	/// Records by offset, `None` marks offsets known to be empty
	records: HashMap<i64, Option<M>>,
}

impl<M> Default for Shared<M> {
	fn default() -> Self {
		Self {
			size: None,
			records: HashMap::new(),
		}
	}
}

/// Outcome of looking up a record before asking the server
pub(crate) enum Fetch<M> {
	Cached(Option<M>),
	Remote(Request),
}

#[derive(Debug)]
pub(crate) struct ViewCore<M> {
	base_endpoint: String,
	filter: Option<Filter>,
	/// `fields` plus the rendered filter
	params: IndexMap<String, String>,
	window: Mutex<Window>,
	shared: Arc<Mutex<Shared<M>>>,
	_module: PhantomData<fn() -> M>,
}

impl<M: Module> ViewCore<M> {
	pub(crate) fn new(base_endpoint: String) -> Self {
		Self {
			params: base_params::<M>(),
			base_endpoint,
			filter: None,
			window: Mutex::new(Window::default()),
			shared: Arc::default(),
			_module: PhantomData,
		}
	}

	pub(crate) fn base_endpoint(&self) -> &str {
		&self.base_endpoint
	}

	pub(crate) fn filter(&self) -> Option<&Filter> {
		self.filter.as_ref()
	}

	pub(crate) fn params(&self) -> &IndexMap<String, String> {
		&self.params
	}

	/// Copy sharing the cache and size
	pub(crate) fn fork(&self) -> Self {
		Self {
			base_endpoint: self.base_endpoint.clone(),
			filter: self.filter.clone(),
			params: self.params.clone(),
			window: Mutex::new(self.window.lock().clone()),
			shared: Arc::clone(&self.shared),
			_module: PhantomData,
		}
	}

	/// Copy with another filter and the given window
	///
	/// Offsets depend on the filter, so a changed filter starts from an empty
	/// cache and an unknown size.
	fn refiltered(&self, filter: Option<Filter>, window: Window) -> Result<Self> {
		if filter == self.filter {
			let view = self.fork();
			*view.window.lock() = window;
			return Ok(view);
		}
		let mut params = base_params::<M>();
		if let Some(filter) = &filter {
			params.extend(render_query_params(filter)?);
		}
		Ok(Self {
			base_endpoint: self.base_endpoint.clone(),
			filter,
			params,
			window: Mutex::new(window.unresolved()),
			shared: Arc::default(),
			_module: PhantomData,
		})
	}

	/// Copy with `filters` ANDed onto the current filter
	///
	/// A single filter expression on an unfiltered view is used as is.
	pub(crate) fn filtered(&self, filters: Vec<Filter>) -> Result<Self> {
		let window = self.window.lock().clone();
		self.filtered_with_window(filters, window)
	}

	fn filtered_with_window(&self, mut filters: Vec<Filter>, window: Window) -> Result<Self> {
		let filter = match (&self.filter, filters.len()) {
			(_, 0) => self.filter.clone(),
			(None, 1) if filters[0].is_expression() => filters.pop(),
			(existing, _) => Some(Filter::Set(FilterSet::and(
				existing.iter().cloned().chain(filters),
			))),
		};
		self.refiltered(filter, window)
	}

	/// Copy with `slice` queued on top of the current window
	pub(crate) fn sliced(&self, slice: Slice) -> Result<Self> {
		if slice.step == Some(0) {
			return Err(ZuckerError::Validation("slice step cannot be zero".to_string()));
		}
		let view = self.fork();
		view.window.lock().pending.push(slice);
		Ok(view)
	}

	/// Copy walking the window backwards
	pub(crate) fn reversed(&self) -> Self {
		let view = self.fork();
		view.window.lock().pending.push(Slice::reversed());
		view
	}

	/// Unwindowed view matching only the record with ID `key`
	pub(crate) fn id_lookup(&self, key: &str) -> Result<Self> {
		if key.contains('/') || key.contains(' ') {
			return Err(ZuckerError::Validation(format!(
				"record keys cannot contain slashes or spaces, got '{key}'"
			)));
		}
		let by_id = ValuesFilter::new("id", [key])?;
		self.filtered_with_window(vec![by_id.into()], Window::default())
	}

	/// Window in offsets, if it can be computed without asking the server
	pub(crate) fn try_resolve(&self) -> Result<Option<IndexRange>> {
		let size = self.shared.lock().size;
		self.window.lock().resolve(size)
	}

	pub(crate) fn count_request(&self) -> Request {
		debug!(endpoint = %self.base_endpoint, "fetching record count");
		Request::get(format!("{}/count", self.base_endpoint)).with_params(self.params.clone())
	}

	/// Stores the size from a count response and resolves the window with it
	pub(crate) fn finalize_count(&self, body: JsonMap) -> Result<IndexRange> {
		let size = match body.get("record_count") {
			Some(Value::Number(count)) => count.as_u64().and_then(|c| usize::try_from(c).ok()),
			_ => None,
		}
		.ok_or_else(|| {
			let got = body.get("record_count").map_or("nothing", kind_of);
			warn!(endpoint = %self.base_endpoint, got, "invalid record count");
			ZuckerError::InvalidResponse(format!("got invalid record count: {got}"))
		})?;

		self.shared.lock().size = Some(size);
		self.window
			.lock()
			.resolve(Some(size))?
			.ok_or_else(|| ZuckerError::InvalidResponse("view window could not be resolved".to_string()))
	}

	/// Offset of the record at `index`, which must not be negative
	pub(crate) fn index_to_offset(range: &IndexRange, index: i64) -> Option<i64> {
		range.get(usize::try_from(index).ok()?)
	}

	pub(crate) fn offset_to_index(range: &IndexRange, offset: i64) -> Option<usize> {
		range.index_of(offset)
	}

	/// Offset of the record at `index`, counting negative indices from the end
	pub(crate) fn locate(range: &IndexRange, index: i64) -> Result<i64> {
		let absolute = if index < 0 {
			i64::try_from(range.len()).ok().map(|len| index + len)
		} else {
			Some(index)
		};
		absolute
			.and_then(|absolute| Self::index_to_offset(range, absolute))
			.ok_or(ZuckerError::IndexOutOfRange(index))
	}

	pub(crate) fn prepare_fetch(&self, offset: i64) -> Fetch<M> {
		if let Some(cached) = self.shared.lock().records.get(&offset) {
			return Fetch::Cached(cached.clone());
		}
		debug!(endpoint = %self.base_endpoint, offset, "fetching record");
		let request = Request::get(self.base_endpoint.clone())
			.with_param("max_num", "1")
			.with_param("offset", offset.to_string())
			.with_params(self.params.clone());
		Fetch::Remote(request)
	}

	/// Builds and caches the record from a single-record listing
	pub(crate) fn finalize_fetch(&self, offset: i64, mut body: JsonMap) -> Result<Option<M>> {
		let Some(Value::Array(mut records)) = body.remove("records") else {
			return Err(ZuckerError::InvalidResponse(
				"records filter request did not return any data".to_string(),
			));
		};
		if records.len() > 1 {
			warn!(endpoint = %self.base_endpoint, offset, count = records.len(), "expected a single record");
			return Err(ZuckerError::InvalidResponse(
				"requested a single record but got more than one".to_string(),
			));
		}
		let record = match records.pop() {
			None => None,
			Some(Value::Object(data)) => Some(M::new(data)?),
			Some(other) => {
				return Err(ZuckerError::InvalidResponse(format!(
					"got invalid record data: {}",
					kind_of(&other)
				)));
			}
		};
		self.shared.lock().records.insert(offset, record.clone());
		Ok(record)
	}

	#[cfg(test)]
	pub(crate) fn cached_offsets(&self) -> Vec<i64> {
		let mut offsets: Vec<i64> = self.shared.lock().records.keys().copied().collect();
		offsets.sort_unstable();
		offsets
	}

	pub(crate) fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let prefix = if self.filter.is_some() { "filtered view" } else { "view" };
		write!(f, "<{prefix} on {}", M::API_NAME)?;

		let size = self.shared.lock().size;
		let window = self.window.lock().clone();
		if let (Some(range), Some(size)) = (window.range, size) {
			write_range(f, &range, size)?;
		}
		for slice in &window.pending {
			write!(f, "[{slice}]")?;
		}
		f.write_str(">")
	}
}

impl<M> PartialEq for ViewCore<M> {
	fn eq(&self, other: &Self) -> bool {
		self.base_endpoint == other.base_endpoint && self.filter == other.filter
	}
}

fn base_params<M: Module>() -> IndexMap<String, String> {
	let mut params = IndexMap::new();
	params.insert("fields".to_string(), M::field_names().join(","));
	params
}

/// Writes a resolved window in slice notation, leaving out default parts
fn write_range(f: &mut fmt::Formatter<'_>, range: &IndexRange, size: usize) -> fmt::Result {
	let size = i64::try_from(size).unwrap_or(i64::MAX);
	let (default_start, default_stop) = if range.step() < 0 { (size - 1, -1) } else { (0, size) };

	let show = |value: i64, default: i64| {
		if value == default { String::new() } else { value.to_string() }
	};
	let mut parts = vec![
		show(range.start(), default_start),
		show(range.stop(), default_stop),
	];
	if range.step() != 1 {
		parts.push(range.step().to_string());
	}
	if parts.iter().all(String::is_empty) {
		return Ok(());
	}
	write!(f, "[{}]", parts.join(":"))
}
