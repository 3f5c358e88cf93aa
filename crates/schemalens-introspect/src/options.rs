use serde::{Deserialize, Serialize};

use schemalens_core::Exclusions;

/// Options that control how a schema read behaves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Name filters applied while enumerating a full schema.
    pub exclusions: Exclusions,
    /// Fetch view and procedure source text during `read_all` instead of on demand.
    pub load_sources: bool,
}
