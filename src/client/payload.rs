use serde::{Deserialize, Serialize};

/// Query parameters of a condition list request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionQuery {
    /// Exclusive upper bound on returned timestamps
    pub end_time: i64,
    /// Comma-separated level letters, e.g. "i,w,c"
    pub condition_level: String,
    /// Inclusive lower bound on returned timestamps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ConditionQuery {
    pub fn new(end_time: i64, condition_level: impl Into<String>) -> Self {
        Self {
            end_time,
            condition_level: condition_level.into(),
            start_time: None,
            limit: None,
        }
    }

    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// URL query string for this request
    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }
}

/// Query parameters of a graph request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQuery {
    /// Start of the graph window (Unix seconds)
    pub date: i64,
}

/// One element of a condition list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    #[serde(rename = "jia_isu_uuid")]
    pub entity_uuid: String,
    #[serde(rename = "isu_name")]
    pub entity_name: String,
    pub timestamp: i64,
    pub is_sitting: bool,
    pub condition: String,
    pub condition_level: String,
    pub message: String,
}

/// One hourly bucket of a graph response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphBucket {
    pub start_at: i64,
    pub end_at: i64,
    /// Absent when the target had too little data to compute an aggregate
    #[serde(default)]
    pub data: Option<GraphData>,
    /// Timestamps of the conditions in the bucket, oldest first
    #[serde(default)]
    pub condition_timestamps: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub score: i64,
    pub sitting: i64,
    #[serde(default)]
    pub detail: GraphDetail,
}

/// Per-flag breakdown. Missing keys read as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDetail {
    pub is_dirty: bool,
    pub is_overweight: bool,
    pub is_broken: bool,
    pub missing_data: bool,
}

/// One category of a trend response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEntry {
    #[serde(rename = "character")]
    pub category: String,
    #[serde(default)]
    pub conditions: Vec<TrendCondition>,
}

/// Latest condition of one entity within a trend category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCondition {
    #[serde(rename = "isu_id")]
    pub entity_id: i64,
    pub timestamp: i64,
    pub condition_level: String,
}

/// One element of a user's entity list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: i64,
    #[serde(rename = "jia_isu_uuid")]
    pub uuid: String,
    pub name: String,
    #[serde(rename = "character")]
    pub category: String,
}
