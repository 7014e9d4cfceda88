use crate::error::Result;

/// Abstract interface for the key-value medium the store persists into.
///
/// Keys are collection names (plus a few bookkeeping keys such as the seed
/// sentinel); values are whole serialized JSON documents. A backend never
/// interprets the values it holds.
///
/// All methods take `&self`: the store is single-threaded and backends handle
/// their own interior mutability.
pub trait StorageBackend {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if the key was never written (or was removed).
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    /// MUST be all-or-nothing: a failed write leaves the previous value intact.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// List every key currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;
}
