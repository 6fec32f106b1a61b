// Transport-facing types consumed by the verifiers
//
// The HTTP agent lives outside this crate; it hands us captured responses
// and a map of sub-resource fetch results.

mod payload;
mod response;

pub use payload::{
    ConditionEntry, ConditionQuery, EntitySummary, GraphBucket, GraphData,
    GraphDetail, GraphQuery, TrendCondition, TrendEntry,
};
pub use response::{FetchError, FetchErrorKind, ObservedResponse, RequestLine, Resources};
