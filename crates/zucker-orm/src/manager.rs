//! Module managers
//!
//! A manager ties a module type to a client. It is the entry point for views
//! and performs the server side of record saving, deletion and refreshing.
//! Records seen through [`get_by_id`](SyncManager::get_by_id) or written by the
//! manager are remembered by ID in a bounded cache.

use crate::module::Module;
use crate::view::{AsyncView, SyncView};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use zucker_client::{AsyncClient, Request, SyncClient};
use zucker_core::Result;
use zucker_filters::Filter;

/// Default number of records kept by a manager's ID cache
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Records by ID, evicting the oldest entry once full
///
/// Entries are never invalidated by the server. Call
/// [`clear`](IdCache::clear) when records may have changed remotely.
#[derive(Debug)]
pub struct IdCache<M> {
	capacity: usize,
	entries: IndexMap<String, M>,
}

impl<M: Clone> IdCache<M> {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			entries: IndexMap::new(),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, id: &str) -> Option<M> {
		self.entries.get(id).cloned()
	}

	/// Stores `record`, replacing an entry with the same ID
	pub fn insert(&mut self, id: String, record: M) {
		if self.capacity == 0 {
			return;
		}
		self.entries.shift_remove(&id);
		while self.entries.len() >= self.capacity {
			self.entries.shift_remove_index(0);
		}
		self.entries.insert(id, record);
	}

	pub fn remove(&mut self, id: &str) -> Option<M> {
		self.entries.shift_remove(id)
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

fn remember<M: Module>(cache: &Mutex<IdCache<M>>, record: &M) {
	if let Some(id) = record.id() {
		cache.lock().insert(id.to_string(), record.clone());
	}
}

fn forget<M: Module>(cache: &Mutex<IdCache<M>>, record: &M) {
	if let Some(id) = record.id() {
		cache.lock().remove(id);
	}
}

/// Entry point for module `M` on a blocking client
///
/// # Examples
///
/// ```rust,no_run
/// # use zucker_orm::{Module, Record, StringField, SyncManager, MutableField, ScalarFilters};
/// # use zucker_client::{ClientConfig, SugarClient};
/// # use std::sync::Arc;
/// # #[derive(Debug, Clone)] struct Lead(Record);
/// # impl Lead { const NAME: StringField = StringField::new("name"); }
/// # impl Module for Lead {
/// #     const API_NAME: &'static str = "Leads";
/// #     fn from_record(r: Record) -> Self { Lead(r) }
/// #     fn record(&self) -> &Record { &self.0 }
/// #     fn record_mut(&mut self) -> &mut Record { &mut self.0 }
/// # }
/// let client = Arc::new(SugarClient::connect(ClientConfig::from_env()?)?);
/// let leads = SyncManager::<Lead, _>::new(client);
///
/// let mut ben = leads.find([Lead::NAME.eq("Ben".to_string())?])?.get(0)?;
/// Lead::NAME.set(&mut ben, "Benjamin".to_string())?;
/// leads.save(&mut ben)?;
/// # Ok::<(), zucker_core::ZuckerError>(())
/// ```
pub struct SyncManager<M, C: ?Sized> {
	client: Arc<C>,
	cache: Mutex<IdCache<M>>,
}

impl<M: Module, C: SyncClient + ?Sized> SyncManager<M, C> {
	pub fn new(client: Arc<C>) -> Self {
		Self {
			client,
			cache: Mutex::new(IdCache::new(DEFAULT_CACHE_CAPACITY)),
		}
	}

	pub fn with_cache_capacity(self, capacity: usize) -> Self {
		Self {
			cache: Mutex::new(IdCache::new(capacity)),
			..self
		}
	}

	pub fn client(&self) -> &Arc<C> {
		&self.client
	}

	/// View over all records of the module
	pub fn all(&self) -> SyncView<M, C> {
		SyncView::new(Arc::clone(&self.client))
	}

	/// View over the records matching all `filters`
	pub fn find<I>(&self, filters: I) -> Result<SyncView<M, C>>
	where
		I: IntoIterator,
		I::Item: Into<Filter>,
	{
		self.all().filtered(filters)
	}

	/// Record with ID `key`, served from the cache when possible
	pub fn get_by_id(&self, key: &str) -> Result<M> {
		if let Some(record) = self.cached(key) {
			debug!(module = M::API_NAME, key, "record served from cache");
			return Ok(record);
		}
		let record = self.all().get_by_id(key)?;
		remember(&self.cache, &record);
		Ok(record)
	}

	pub fn cached(&self, key: &str) -> Option<M> {
		self.cache.lock().get(key)
	}

	pub fn clear_cache(&self) {
		self.cache.lock().clear();
	}

	/// Creates or updates the record on the server
	pub fn save(&self, record: &mut M) -> Result<()> {
		let mutation = record.record().prepare_save()?;
		debug!(module = M::API_NAME, method = %mutation.method, endpoint = %mutation.endpoint, "saving record");
		let data = self.client.request(mutation.into_request())?;
		record.record_mut().finalize_save(data)?;
		remember(&self.cache, record);
		Ok(())
	}

	/// Deletes the record on the server, keeping its values locally
	pub fn delete(&self, record: &mut M) -> Result<()> {
		let mutation = record.record().prepare_delete()?;
		self.client.request(mutation.into_request())?;
		forget(&self.cache, record);
		record.record_mut().finalize_delete();
		Ok(())
	}

	/// Reloads the record from the server, dropping unsaved changes
	pub fn refresh(&self, record: &mut M) -> Result<()> {
		let mutation = record.record().prepare_refresh()?;
		let data = self.client.request(Request::from(mutation))?;
		record.record_mut().finalize_refresh(data)?;
		remember(&self.cache, record);
		Ok(())
	}
}

/// Entry point for module `M` on an async client
pub struct AsyncManager<M, C: ?Sized> {
	client: Arc<C>,
	cache: Mutex<IdCache<M>>,
}

impl<M: Module, C: AsyncClient + ?Sized> AsyncManager<M, C> {
	pub fn new(client: Arc<C>) -> Self {
		Self {
			client,
			cache: Mutex::new(IdCache::new(DEFAULT_CACHE_CAPACITY)),
		}
	}

	pub fn with_cache_capacity(self, capacity: usize) -> Self {
		Self {
			cache: Mutex::new(IdCache::new(capacity)),
			..self
		}
	}

	pub fn client(&self) -> &Arc<C> {
		&self.client
	}

	pub fn all(&self) -> AsyncView<M, C> {
		AsyncView::new(Arc::clone(&self.client))
	}

	pub fn find<I>(&self, filters: I) -> Result<AsyncView<M, C>>
	where
		I: IntoIterator,
		I::Item: Into<Filter>,
	{
		self.all().filtered(filters)
	}

	pub async fn get_by_id(&self, key: &str) -> Result<M> {
		if let Some(record) = self.cached(key) {
			debug!(module = M::API_NAME, key, "record served from cache");
			return Ok(record);
		}
		let record = self.all().get_by_id(key).await?;
		remember(&self.cache, &record);
		Ok(record)
	}

	pub fn cached(&self, key: &str) -> Option<M> {
		self.cache.lock().get(key)
	}

	pub fn clear_cache(&self) {
		self.cache.lock().clear();
	}

	pub async fn save(&self, record: &mut M) -> Result<()> {
		let mutation = record.record().prepare_save()?;
		debug!(module = M::API_NAME, method = %mutation.method, endpoint = %mutation.endpoint, "saving record");
		let data = self.client.request(mutation.into_request()).await?;
		record.record_mut().finalize_save(data)?;
		remember(&self.cache, record);
		Ok(())
	}

	pub async fn delete(&self, record: &mut M) -> Result<()> {
		let mutation = record.record().prepare_delete()?;
		self.client.request(mutation.into_request()).await?;
		forget(&self.cache, record);
		record.record_mut().finalize_delete();
		Ok(())
	}

	pub async fn refresh(&self, record: &mut M) -> Result<()> {
		let mutation = record.record().prepare_refresh()?;
		let data = self.client.request(Request::from(mutation)).await?;
		record.record_mut().finalize_refresh(data)?;
		remember(&self.cache, record);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_cache_evicts_oldest_entry() {
		// Arrange
		let mut cache = IdCache::new(2);

		// Act
		cache.insert("a".to_string(), 1);
		cache.insert("b".to_string(), 2);
		cache.insert("c".to_string(), 3);

		// Assert
		assert_eq!(cache.get("a"), None);
		assert_eq!(cache.get("b"), Some(2));
		assert_eq!(cache.get("c"), Some(3));
	}

	#[rstest]
	fn test_cache_reinsert_refreshes_position() {
		let mut cache = IdCache::new(2);
		cache.insert("a".to_string(), 1);
		cache.insert("b".to_string(), 2);

		cache.insert("a".to_string(), 10);
		cache.insert("c".to_string(), 3);

		assert_eq!(cache.get("a"), Some(10));
		assert_eq!(cache.get("b"), None);
		assert_eq!(cache.len(), 2);
	}

	#[rstest]
	fn test_zero_capacity_cache_stays_empty() {
		let mut cache = IdCache::new(0);

		cache.insert("a".to_string(), 1);

		assert!(cache.is_empty());
	}
}
