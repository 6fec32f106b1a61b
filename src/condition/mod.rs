use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

#[cfg(test)]
mod tests;

/// Severity classes of a condition, combinable into a filter set.
///
/// A record always carries exactly one class; filters built from a query
/// (`"i,w"`) may carry several.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConditionLevel {
    bits: u8,
}

impl ConditionLevel {
    pub const NONE: Self = Self { bits: 0 };
    pub const INFO: Self = Self { bits: 1 };
    pub const WARNING: Self = Self { bits: 1 << 1 };
    pub const CRITICAL: Self = Self { bits: 1 << 2 };
    pub const ALL: Self = Self { bits: 0b111 };

    /// Level derived from the number of abnormal flags (0 → info, 1-2 →
    /// warning, 3 → critical).
    pub fn from_warning_count(count: usize) -> Self {
        match count {
            0 => Self::INFO,
            1 | 2 => Self::WARNING,
            _ => Self::CRITICAL,
        }
    }

    /// Parse a comma-separated level filter such as `"i,w,c"`.
    ///
    /// Only the first character of every item is significant; unknown letters
    /// and empty items contribute nothing.
    pub fn parse_filter(filter: &str) -> Self {
        filter
            .split(',')
            .filter_map(|item| item.trim().chars().next())
            .fold(Self::NONE, |acc, c| match c {
                'i' => acc | Self::INFO,
                'w' => acc | Self::WARNING,
                'c' => acc | Self::CRITICAL,
                _ => acc,
            })
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// True when every class in `other` is also in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    pub fn intersects(self, other: Self) -> bool {
        self.bits & other.bits != 0
    }

    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Wire label of a single-class level. Combined sets have no label.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::INFO => Some("info"),
            Self::WARNING => Some("warning"),
            Self::CRITICAL => Some("critical"),
            _ => None,
        }
    }

    /// Single-class level from its wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "info" => Some(Self::INFO),
            "warning" => Some(Self::WARNING),
            "critical" => Some(Self::CRITICAL),
            _ => None,
        }
    }
}

impl BitOr for ConditionLevel {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for ConditionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = self.label() {
            return write!(f, "{}", label);
        }
        let names: Vec<&str> = [Self::INFO, Self::WARNING, Self::CRITICAL]
            .into_iter()
            .filter(|level| self.contains(*level))
            .filter_map(|level| level.label())
            .collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

/// The three independent abnormal-state flags of one observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFlags {
    pub is_dirty: bool,
    pub is_overweight: bool,
    pub is_broken: bool,
}

impl ConditionFlags {
    pub fn new(is_dirty: bool, is_overweight: bool, is_broken: bool) -> Self {
        Self {
            is_dirty,
            is_overweight,
            is_broken,
        }
    }

    pub fn warning_count(&self) -> usize {
        [self.is_dirty, self.is_overweight, self.is_broken]
            .iter()
            .filter(|flag| **flag)
            .count()
    }

    pub fn level(&self) -> ConditionLevel {
        ConditionLevel::from_warning_count(self.warning_count())
    }

    /// Condition string exactly as the target renders it.
    pub fn condition_string(&self) -> String {
        format!(
            "is_dirty={},is_overweight={},is_broken={}",
            self.is_dirty, self.is_overweight, self.is_broken
        )
    }
}

/// One observed state of one entity at one point in time.
///
/// Records are immutable; the level is derived once from the flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionRecord {
    entity_id: i64,
    timestamp_unix: i64,
    flags: ConditionFlags,
    is_sitting: bool,
    message: String,
    level: ConditionLevel,
}

impl ConditionRecord {
    pub fn new(
        entity_id: i64,
        timestamp_unix: i64,
        flags: ConditionFlags,
        is_sitting: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            entity_id,
            timestamp_unix,
            flags,
            is_sitting,
            message: message.into(),
            level: flags.level(),
        }
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    pub fn timestamp_unix(&self) -> i64 {
        self.timestamp_unix
    }

    pub fn flags(&self) -> ConditionFlags {
        self.flags
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.is_dirty
    }

    pub fn is_overweight(&self) -> bool {
        self.flags.is_overweight
    }

    pub fn is_broken(&self) -> bool {
        self.flags.is_broken
    }

    pub fn is_sitting(&self) -> bool {
        self.is_sitting
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level(&self) -> ConditionLevel {
        self.level
    }

    pub fn condition_string(&self) -> String {
        self.flags.condition_string()
    }

    pub fn level_label(&self) -> &'static str {
        // A record's level is always a single class
        self.level.label().unwrap_or("info")
    }

    pub fn cursor_key(&self) -> CursorKey {
        CursorKey::new(self.timestamp_unix)
    }
}

/// Ordering key of the condition log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorKey {
    pub timestamp_unix: i64,
}

impl CursorKey {
    pub fn new(timestamp_unix: i64) -> Self {
        Self { timestamp_unix }
    }

    /// Strictly older than `other`.
    pub fn less(&self, other: &CursorKey) -> bool {
        self.timestamp_unix < other.timestamp_unix
    }
}
