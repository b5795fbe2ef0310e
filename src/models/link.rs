//! Link-resolution results attached to search hits.

use serde::{Deserialize, Serialize};

use super::record::MetadataRecord;

/// Outcome of resolving one stored file name to a shareable link.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// A remote blob with this name exists and a link was returned.
    Found,
    /// No remote blob carries this name; the link is null.
    NotFound,
    /// The lookup itself failed; the name may or may not exist remotely.
    LookupFailed,
}

/// One resolved file name within a search hit.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    /// The stored file name that was looked up.
    pub file_name: String,

    /// Shareable view link, present only when `status` is `found`.
    pub file_link: Option<String>,

    /// How the lookup ended.
    pub status: LinkStatus,
}

/// A search result: the matching record with its relevance score, plus one
/// resolved link per stored file name.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(flatten)]
    pub record: MetadataRecord,

    /// Relevance score; results are ordered by this, descending.
    pub score: f64,

    /// Link resolution for each name in `file_names`, in stored order.
    pub links: Vec<ResolvedLink>,
}
