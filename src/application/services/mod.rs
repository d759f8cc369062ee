pub mod citation_extractor;
pub mod operation_poller;
pub mod retry_policy;

pub use citation_extractor::{CitationConfig, CitationExtractor, ExtractedCitation};
pub use operation_poller::{OperationPoller, PollError, PollerConfig};
pub use retry_policy::{Backoff, RetryPolicies, RetryPolicy};
