use crate::error::Result;
use crate::storage::rekor::{LogResponse, RekorEntryRequest};

/// A transparency log that accepts DSSE entries.
///
/// Implementations return `Ok` for any HTTP response, including non-2xx
/// statuses, so the caller can record the response body as evidence. Only
/// transport failures (timeout, connection) are errors.
///
/// # Examples
///
/// ```
/// use fcp_rekor::error::Result;
/// use fcp_rekor::storage::rekor::{LogResponse, RekorEntryRequest};
/// use fcp_rekor::storage::traits::TransparencyLog;
///
/// struct Offline;
///
/// impl TransparencyLog for Offline {
///     fn entries_url(&self) -> String {
///         "offline://entries".to_string()
///     }
///
///     fn submit_entry(&self, _request: &RekorEntryRequest) -> Result<LogResponse> {
///         Ok(LogResponse::from_body(503, "offline"))
///     }
/// }
///
/// assert_eq!(Offline.entries_url(), "offline://entries");
/// ```
pub trait TransparencyLog {
    /// Full URL entries are posted to.
    fn entries_url(&self) -> String;

    /// Submit one entry and return the log's response.
    fn submit_entry(&self, request: &RekorEntryRequest) -> Result<LogResponse>;
}
