//! The admin usage dashboard: three independently sortable tables derived
//! from one fetched record set.

use serde::Serialize;

use crate::aggregate::{SortState, aggregate_by, sort_rows, total_usage};
use crate::models::token_count::TokenTotals;
use crate::models::usage::{AggregateRow, Grouping, UsageField, UsageRecord};

/// Which of the dashboard's tables a sort request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTable {
    Detailed,
    ByFeature,
    ByUser,
}

/// Records of the current activation plus one sort state per table.
///
/// Records are never mutated; every [`UsageDashboard::report`] recomputes
/// the rollups from scratch.
#[derive(Debug, Clone, Default)]
pub struct UsageDashboard {
    records: Vec<UsageRecord>,
    detailed: SortState,
    by_feature: SortState,
    by_user: SortState,
}

/// Everything the dashboard shows for one render.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub detailed: Vec<UsageRecord>,
    pub total: TokenTotals,
    pub by_feature: Vec<AggregateRow>,
    pub by_user: Vec<AggregateRow>,
}

impl UsageDashboard {
    pub fn new(records: Vec<UsageRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Replace the records with a fresh fetch. All sort states reset.
    pub fn load(&mut self, records: Vec<UsageRecord>) {
        *self = Self::new(records);
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn sort_state(&self, table: UsageTable) -> SortState {
        match table {
            UsageTable::Detailed => self.detailed,
            UsageTable::ByFeature => self.by_feature,
            UsageTable::ByUser => self.by_user,
        }
    }

    /// Apply a column-header click to one table only.
    pub fn toggle(&mut self, table: UsageTable, field: UsageField) {
        let state = self.state_mut(table);
        *state = state.toggle(field);
    }

    pub fn toggle_detailed(&mut self, field: UsageField) {
        self.toggle(UsageTable::Detailed, field);
    }

    pub fn toggle_feature(&mut self, field: UsageField) {
        self.toggle(UsageTable::ByFeature, field);
    }

    pub fn toggle_user(&mut self, field: UsageField) {
        self.toggle(UsageTable::ByUser, field);
    }

    /// Set a table's sort state outright.
    pub fn set_sort(&mut self, table: UsageTable, sort: SortState) {
        *self.state_mut(table) = sort;
    }

    pub fn report(&self) -> UsageReport {
        UsageReport {
            detailed: sort_rows(&self.records, self.detailed),
            total: total_usage(&self.records),
            by_feature: sort_rows(
                &aggregate_by(&self.records, Grouping::Feature),
                self.by_feature,
            ),
            by_user: sort_rows(
                &aggregate_by(&self.records, Grouping::Username),
                self.by_user,
            ),
        }
    }

    fn state_mut(&mut self, table: UsageTable) -> &mut SortState {
        match table {
            UsageTable::Detailed => &mut self.detailed,
            UsageTable::ByFeature => &mut self.by_feature,
            UsageTable::ByUser => &mut self.by_user,
        }
    }
}
