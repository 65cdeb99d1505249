use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Input, output and total token sums.
///
/// Used both for a single usage record's counts and for any sum of them.
/// `total_tokens` is carried as reported and never recomputed from the
/// other two fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Add for TokenTotals {
    type Output = TokenTotals;

    fn add(self, rhs: TokenTotals) -> TokenTotals {
        TokenTotals {
            input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
            output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

impl AddAssign for TokenTotals {
    fn add_assign(&mut self, rhs: TokenTotals) {
        *self = *self + rhs;
    }
}

impl Sum for TokenTotals {
    fn sum<I: Iterator<Item = TokenTotals>>(iter: I) -> TokenTotals {
        iter.fold(TokenTotals::default(), Add::add)
    }
}

/// Token counts the service reports next to a generated payload
/// (topic summaries, synthetic users).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub response_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl From<TokenCount> for TokenTotals {
    fn from(count: TokenCount) -> Self {
        TokenTotals {
            input_tokens: count.prompt_tokens,
            output_tokens: count.response_tokens,
            total_tokens: count.total_tokens,
        }
    }
}
