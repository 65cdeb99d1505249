use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::token_count::TokenTotals;
use crate::error::CoreError;

/// One token-usage entry as returned by `/token-usage`.
///
/// Numeric fields that are missing or `null` deserialize as `0` so a
/// malformed record never poisons an aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub feature: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub output_tokens: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_tokens: u64,
    /// Opaque; ordered as text, never parsed.
    #[serde(default)]
    pub timestamp: String,
}

impl UsageRecord {
    pub fn tokens(&self) -> TokenTotals {
        TokenTotals {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            total_tokens: self.total_tokens,
        }
    }
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Field a usage table can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageField {
    Username,
    Feature,
    InputTokens,
    OutputTokens,
    TotalTokens,
    Timestamp,
}

impl UsageField {
    pub const ALL: [UsageField; 6] = [
        UsageField::Username,
        UsageField::Feature,
        UsageField::InputTokens,
        UsageField::OutputTokens,
        UsageField::TotalTokens,
        UsageField::Timestamp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UsageField::Username => "username",
            UsageField::Feature => "feature",
            UsageField::InputTokens => "input_tokens",
            UsageField::OutputTokens => "output_tokens",
            UsageField::TotalTokens => "total_tokens",
            UsageField::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for UsageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UsageField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CoreError::UnknownField(s.to_string()))
    }
}

/// Key a usage rollup groups records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    Feature,
    Username,
}

impl Grouping {
    /// The record field this grouping keys on.
    pub fn field(self) -> UsageField {
        match self {
            Grouping::Feature => UsageField::Feature,
            Grouping::Username => UsageField::Username,
        }
    }

    pub fn key_of(self, record: &UsageRecord) -> &str {
        match self {
            Grouping::Feature => &record.feature,
            Grouping::Username => &record.username,
        }
    }
}

/// Token sums over every record sharing one grouping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub grouping: Grouping,
    pub key: String,
    pub tokens: TokenTotals,
}

/// Serialized as a flat object with the key under the grouping's field name,
/// e.g. `{"feature": "pdf", "input_tokens": 11, ...}`.
impl Serialize for AggregateRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(self.grouping.field().as_str(), &self.key)?;
        map.serialize_entry("input_tokens", &self.tokens.input_tokens)?;
        map.serialize_entry("output_tokens", &self.tokens.output_tokens)?;
        map.serialize_entry("total_tokens", &self.tokens.total_tokens)?;
        map.end()
    }
}
