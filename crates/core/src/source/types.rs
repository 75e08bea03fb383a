//! Types for the source module.

use serde::{Deserialize, Serialize};

use crate::record::VersionRecord;

/// Key used to look up supplementary sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementaryLookup {
    /// Project the item belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// External identifier of the item in the supplementary service.
    pub external_id: String,
}

impl SupplementaryLookup {
    /// Builds a lookup from a record, if it carries an external id.
    pub fn from_record(record: &VersionRecord) -> Option<Self> {
        record.external_id().map(|id| Self {
            project: record.project().map(str::to_string),
            external_id: id.to_string(),
        })
    }
}
