// ⚖️ Reconciliation Engine - assign scheme codes by name
//
// Per record:
//   1. trim the name
//   2. exact catalog name → code (always wins)
//   3. otherwise best similarity >= cutoff → code (first in catalog order on ties)
//   4. otherwise no code
//
// An unmatched name is a normal outcome, not an error.

use crate::catalog::SchemeCatalogEntry;
use crate::config::DEFAULT_CUTOFF;
use crate::record::FundMetadataRecord;
use crate::similarity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// MATCH OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Catalog has an entry with exactly this (trimmed) name
    Exact,

    /// Closest catalog name at or above the cutoff
    Approximate { matched_name: String, score: f64 },

    /// Nothing reached the cutoff
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub record: FundMetadataRecord,
    pub outcome: MatchOutcome,
}

impl ReconciledRecord {
    pub fn is_verified(&self) -> bool {
        self.record.is_verified()
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub records: Vec<ReconciledRecord>,
    pub exact_matches: usize,
    pub approximate_matches: usize,
    pub unmatched: usize,
}

impl ReconciliationReport {
    pub fn verified_count(&self) -> usize {
        self.exact_matches + self.approximate_matches
    }

    pub fn unverified_count(&self) -> usize {
        self.unmatched
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records: {} verified ({} exact, {} approximate), {} unverified",
            self.records.len(),
            self.verified_count(),
            self.exact_matches,
            self.approximate_matches,
            self.unverified_count()
        )
    }

    /// Drop the outcomes, keep the tagged records
    pub fn into_records(self) -> Vec<FundMetadataRecord> {
        self.records.into_iter().map(|r| r.record).collect()
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

pub struct Reconciler {
    /// Minimum similarity for an approximate match (default: 0.8)
    pub cutoff: f64,
}

impl Reconciler {
    pub fn new() -> Self {
        Reconciler {
            cutoff: DEFAULT_CUTOFF,
        }
    }

    pub fn with_cutoff(cutoff: f64) -> Self {
        Reconciler { cutoff }
    }

    /// Assign a scheme code (or none) to every record.
    ///
    /// Any code already on a record is replaced, so running this twice on the
    /// same input gives the same assignments.
    pub fn reconcile(
        &self,
        records: Vec<FundMetadataRecord>,
        catalog: &[SchemeCatalogEntry],
    ) -> ReconciliationReport {
        // first catalog entry wins for duplicate names
        let mut by_name: HashMap<&str, &str> = HashMap::with_capacity(catalog.len());
        for entry in catalog {
            by_name
                .entry(entry.scheme_name.as_str())
                .or_insert(entry.scheme_code.as_str());
        }

        let mut exact_matches = 0;
        let mut approximate_matches = 0;
        let mut unmatched = 0;
        let mut reconciled = Vec::with_capacity(records.len());

        for mut record in records {
            let name = record.scheme_name.trim();

            let (code, outcome) = if let Some(code) = by_name.get(name) {
                exact_matches += 1;
                (Some(code.to_string()), MatchOutcome::Exact)
            } else if let Some((entry, score)) = self.best_approximate(name, catalog) {
                approximate_matches += 1;
                debug!(
                    name,
                    matched = %entry.scheme_name,
                    score,
                    "approximate match"
                );
                (
                    Some(entry.scheme_code.clone()),
                    MatchOutcome::Approximate {
                        matched_name: entry.scheme_name.clone(),
                        score,
                    },
                )
            } else {
                unmatched += 1;
                debug!(name, "no catalog match");
                (None, MatchOutcome::Unmatched)
            };

            record.scheme_code = code;
            reconciled.push(ReconciledRecord { record, outcome });
        }

        let report = ReconciliationReport {
            records: reconciled,
            exact_matches,
            approximate_matches,
            unmatched,
        };

        info!(
            verified = report.verified_count(),
            exact = report.exact_matches,
            approximate = report.approximate_matches,
            "verified funds"
        );
        info!(unverified = report.unverified_count(), "unverified funds");

        report
    }

    /// Highest-scoring catalog entry at or above the cutoff.
    ///
    /// Cheap upper bounds skip entries that cannot beat the current best; a
    /// later entry only replaces the best on a strictly higher score.
    fn best_approximate<'a>(
        &self,
        name: &str,
        catalog: &'a [SchemeCatalogEntry],
    ) -> Option<(&'a SchemeCatalogEntry, f64)> {
        let name_len = name.chars().count();
        let mut best: Option<(&SchemeCatalogEntry, f64)> = None;

        for entry in catalog {
            let has_best = best.is_some();
            let floor = best.map(|(_, s)| s).unwrap_or(self.cutoff);
            let beats = |bound: f64| if has_best { bound > floor } else { bound >= floor };

            let candidate = entry.scheme_name.as_str();
            if !beats(similarity::length_bound(candidate.chars().count(), name_len)) {
                continue;
            }
            if !beats(similarity::quick_ratio(candidate, name)) {
                continue;
            }

            let score = similarity::ratio(candidate, name);
            if beats(score) {
                best = Some((entry, score));
            }
        }

        best
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<SchemeCatalogEntry> {
        vec![
            SchemeCatalogEntry::new("100001", "ABC Growth Fund"),
            SchemeCatalogEntry::new("100002", "XYZ Liquid Fund - Direct Plan"),
            SchemeCatalogEntry::new("100003", "Bluechip Equity Fund"),
        ]
    }

    fn codes(report: &ReconciliationReport) -> Vec<Option<String>> {
        report
            .records
            .iter()
            .map(|r| r.record.scheme_code.clone())
            .collect()
    }

    #[test]
    fn test_padded_name_matches_exactly() {
        let report = Reconciler::new().reconcile(
            vec![FundMetadataRecord::new(" ABC Growth Fund ")],
            &catalog(),
        );

        let rec = &report.records[0];
        assert_eq!(rec.record.scheme_code.as_deref(), Some("100001"));
        assert_eq!(rec.outcome, MatchOutcome::Exact);
        assert!(rec.is_verified());
        // name is kept as read
        assert_eq!(rec.record.scheme_name, " ABC Growth Fund ");
    }

    #[test]
    fn test_typo_matches_approximately() {
        let report = Reconciler::new().reconcile(
            vec![FundMetadataRecord::new("ABC Groth Fund")],
            &[SchemeCatalogEntry::new("100001", "ABC Growth Fund")],
        );

        let rec = &report.records[0];
        assert_eq!(rec.record.scheme_code.as_deref(), Some("100001"));
        match &rec.outcome {
            MatchOutcome::Approximate { matched_name, score } => {
                assert_eq!(matched_name, "ABC Growth Fund");
                assert!(*score >= 0.8);
            }
            other => panic!("expected approximate match, got {:?}", other),
        }
        assert_eq!(report.approximate_matches, 1);
    }

    #[test]
    fn test_unrelated_name_stays_unverified() {
        let report = Reconciler::new().reconcile(
            vec![FundMetadataRecord::new("Totally Unrelated Fund XYZ")],
            &catalog(),
        );

        assert_eq!(report.records[0].record.scheme_code, None);
        assert_eq!(report.records[0].outcome, MatchOutcome::Unmatched);
        assert_eq!(report.unverified_count(), 1);
        assert_eq!(report.verified_count(), 0);
    }

    #[test]
    fn test_exact_beats_higher_similarity_elsewhere() {
        // "ABC Fund" is exact for code B even though A comes first
        let catalog = vec![
            SchemeCatalogEntry::new("A", "ABC Fund "),
            SchemeCatalogEntry::new("B", "ABC Fund"),
        ];

        let report =
            Reconciler::new().reconcile(vec![FundMetadataRecord::new("ABC Fund")], &catalog);

        assert_eq!(report.records[0].record.scheme_code.as_deref(), Some("B"));
        assert_eq!(report.exact_matches, 1);
    }

    #[test]
    fn test_below_cutoff_never_assigned() {
        // ratio("abxy", "abcd") = 0.5
        let catalog = vec![SchemeCatalogEntry::new("1", "abxy")];
        let report = Reconciler::new().reconcile(vec![FundMetadataRecord::new("abcd")], &catalog);
        assert_eq!(report.records[0].record.scheme_code, None);

        // same pair clears a lower cutoff
        let report =
            Reconciler::with_cutoff(0.5).reconcile(vec![FundMetadataRecord::new("abcd")], &catalog);
        assert_eq!(report.records[0].record.scheme_code.as_deref(), Some("1"));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        // ratio("abcdx", "abcde") = 0.8 exactly
        let catalog = vec![SchemeCatalogEntry::new("1", "abcdx")];
        let report = Reconciler::new().reconcile(vec![FundMetadataRecord::new("abcde")], &catalog);
        assert_eq!(report.records[0].record.scheme_code.as_deref(), Some("1"));
    }

    #[test]
    fn test_tie_goes_to_first_catalog_entry() {
        // both score 0.8 against "abcde"
        let catalog = vec![
            SchemeCatalogEntry::new("first", "abcdx"),
            SchemeCatalogEntry::new("second", "abcdy"),
        ];
        let report = Reconciler::new().reconcile(vec![FundMetadataRecord::new("abcde")], &catalog);
        assert_eq!(report.records[0].record.scheme_code.as_deref(), Some("first"));
    }

    #[test]
    fn test_best_score_wins_over_earlier_candidate() {
        let catalog = vec![
            SchemeCatalogEntry::new("weaker", "Bluechip Equity Fnd Reg"),
            SchemeCatalogEntry::new("stronger", "Bluechip Equity Fnd"),
        ];
        let report = Reconciler::new()
            .reconcile(vec![FundMetadataRecord::new("Bluechip Equity Fund")], &catalog);
        assert_eq!(
            report.records[0].record.scheme_code.as_deref(),
            Some("stronger")
        );
    }

    #[test]
    fn test_duplicate_catalog_names_first_wins() {
        let catalog = vec![
            SchemeCatalogEntry::new("1", "Same Name Fund"),
            SchemeCatalogEntry::new("2", "Same Name Fund"),
        ];
        let report =
            Reconciler::new().reconcile(vec![FundMetadataRecord::new("Same Name Fund")], &catalog);
        assert_eq!(report.records[0].record.scheme_code.as_deref(), Some("1"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let input = vec![
            FundMetadataRecord::new("ABC Growth Fund"),
            FundMetadataRecord::new("ABC Groth Fund"),
            FundMetadataRecord::new("XYZ Liquid Fund Direct Plan"),
            FundMetadataRecord::new("Totally Unrelated Fund XYZ"),
        ];
        let engine = Reconciler::new();

        let first = engine.reconcile(input.clone(), &catalog());
        let second = engine.reconcile(first.clone().into_records(), &catalog());

        assert_eq!(codes(&first), codes(&second));
        assert_eq!(first.records.len(), 4);
    }

    #[test]
    fn test_every_record_reconciled_once() {
        let input: Vec<_> = (0..50)
            .map(|i| FundMetadataRecord::new(format!("Fund {}", i)))
            .collect();

        let report = Reconciler::new().reconcile(input, &catalog());

        assert_eq!(report.records.len(), 50);
        assert_eq!(
            report.exact_matches + report.approximate_matches + report.unmatched,
            50
        );
    }

    #[test]
    fn test_empty_catalog() {
        let report =
            Reconciler::new().reconcile(vec![FundMetadataRecord::new("ABC Growth Fund")], &[]);
        assert_eq!(report.unmatched, 1);
        println!("✅ {}", report.summary());
    }
}
