//! Server metadata cache

use crate::request::Request;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use zucker_core::json::require_str;
use zucker_core::{JsonMap, Result, ZuckerError};

/// Version information reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
	pub flavor: String,
	pub version: String,
	pub build: String,
}

/// Metadata items fetched so far, keyed by type name
#[derive(Debug, Default)]
pub struct Metadata {
	items: Mutex<JsonMap>,
}

impl Metadata {
	/// Request fetching the given metadata types
	pub fn request(types: &[&str]) -> Request {
		Request::get("metadata").with_param("type_filter", types.join(","))
	}

	pub fn merge(&self, fetched: JsonMap) {
		self.items.lock().extend(fetched);
	}

	/// Cached value of a metadata item
	///
	/// # Errors
	///
	/// [`ZuckerError::UnfetchedMetadata`] if the item was never fetched and
	/// [`ZuckerError::InvalidResponse`] if it is not an object.
	pub fn item(&self, type_name: &str) -> Result<JsonMap> {
		let items = self.items.lock();
		let value = items
			.get(type_name)
			.ok_or_else(|| ZuckerError::UnfetchedMetadata(type_name.to_string()))?;
		value
			.as_object()
			.cloned()
			.ok_or_else(|| ZuckerError::InvalidResponse("got invalid server metadata".to_string()))
	}

	/// Needs the `server_info` item
	pub fn server_info(&self) -> Result<ServerInfo> {
		let info = self.item("server_info")?;
		Ok(ServerInfo {
			flavor: require_str(&info, "flavor")?.to_string(),
			version: require_str(&info, "version")?.to_string(),
			build: require_str(&info, "build")?.to_string(),
		})
	}

	/// Names of all available modules, from the `full_module_list` item
	pub fn module_names(&self) -> Result<Vec<String>> {
		Ok(self
			.item("full_module_list")?
			.keys()
			.filter(|name| !name.starts_with('_'))
			.cloned()
			.collect())
	}

	pub fn contains_module(&self, name: &str) -> Result<bool> {
		Ok(self.module_names()?.iter().any(|module| module == name))
	}
}
