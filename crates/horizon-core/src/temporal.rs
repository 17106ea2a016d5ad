//! Two-level time axis: snapshots grouped into investment periods.
//!
//! ```text
//! period 2020 (years=10, objective=1.000)    period 2030 (years=10, objective=0.614)
//! ├── t0  w=4380h                            ├── t2  w=4380h
//! └── t1  w=4380h                            └── t3  w=4380h
//! ```
//!
//! Every snapshot carries an operational weight (hours it represents). Every
//! period carries two weights:
//!
//! - `years`: how many calendar years the period stands for; scales
//!   operating cost and globally constrained quantities.
//! - `objective`: discount factor applied to capital spent in that period.
//!
//! Snapshots must be grouped contiguously by period and periods must appear in
//! ascending start-year order. `period_of` is an array lookup.

use std::ops::Range;

use serde::Serialize;

use crate::error::{HorizonError, HorizonResult};

/// Start year used by [`TemporalIndex::uniform`] for its single implicit period.
pub const DEFAULT_PERIOD_YEAR: i32 = 0;

/// A single discrete time step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub label: String,
    /// Start year of the investment period this snapshot belongs to
    pub period: i32,
    /// Hours represented by this snapshot
    pub weight: f64,
}

/// A contiguous group of snapshots sharing one investment epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentPeriod {
    pub start_year: i32,
    pub years: f64,
    pub objective_weight: f64,
    #[serde(skip)]
    snapshots: Range<usize>,
}

impl InvestmentPeriod {
    pub fn snapshot_range(&self) -> Range<usize> {
        self.snapshots.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// `(years, objective discount)` pair returned by [`TemporalIndex::period_weight`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodWeighting {
    pub years: f64,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporalIndex {
    snapshots: Vec<Snapshot>,
    periods: Vec<InvestmentPeriod>,
    /// snapshot position -> period position
    period_of: Vec<usize>,
    discount_rate: Option<f64>,
}

impl TemporalIndex {
    pub fn builder() -> TemporalIndexBuilder {
        TemporalIndexBuilder::default()
    }

    /// `n` snapshots of equal weight in a single implicit period.
    pub fn uniform(n: usize, weight_hours: f64) -> Self {
        let snapshots: Vec<Snapshot> = (0..n)
            .map(|t| Snapshot {
                label: format!("t{}", t),
                period: DEFAULT_PERIOD_YEAR,
                weight: weight_hours,
            })
            .collect();
        Self {
            period_of: vec![0; n],
            periods: vec![InvestmentPeriod {
                start_year: DEFAULT_PERIOD_YEAR,
                years: 1.0,
                objective_weight: 1.0,
                snapshots: 0..n,
            }],
            snapshots,
            discount_rate: None,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn periods(&self) -> &[InvestmentPeriod] {
        &self.periods
    }

    pub fn num_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn discount_rate(&self) -> Option<f64> {
        self.discount_rate
    }

    /// Position of the period containing snapshot `t`.
    #[inline]
    pub fn period_index_of(&self, t: usize) -> usize {
        self.period_of[t]
    }

    /// Period containing snapshot `t`.
    #[inline]
    pub fn period_of(&self, t: usize) -> &InvestmentPeriod {
        &self.periods[self.period_of[t]]
    }

    /// Operational weighting (hours represented) of snapshot `t`.
    #[inline]
    pub fn weight(&self, t: usize) -> f64 {
        self.snapshots[t].weight
    }

    pub fn period_weight(&self, period: usize) -> PeriodWeighting {
        let p = &self.periods[period];
        PeriodWeighting {
            years: p.years,
            objective: p.objective_weight,
        }
    }

    /// Look up a period position by its start year.
    pub fn period_by_year(&self, start_year: i32) -> Option<usize> {
        self.periods
            .binary_search_by_key(&start_year, |p| p.start_year)
            .ok()
    }

    pub fn first_period_year(&self) -> i32 {
        self.periods
            .first()
            .map(|p| p.start_year)
            .unwrap_or(DEFAULT_PERIOD_YEAR)
    }

    /// Snapshot preceding `t` inside the same period, if any.
    pub fn previous_in_period(&self, t: usize) -> Option<usize> {
        let range = &self.period_of(t).snapshots;
        (t > range.start).then(|| t - 1)
    }

    /// Total hours covered by the index, unscaled by period years.
    pub fn total_hours(&self) -> f64 {
        self.snapshots.iter().map(|s| s.weight).sum()
    }
}

#[derive(Debug, Clone)]
struct PeriodSpec {
    start_year: i32,
    years: Option<f64>,
    objective_weight: Option<f64>,
}

/// Builder for [`TemporalIndex`]; all structural checks happen in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct TemporalIndexBuilder {
    periods: Vec<PeriodSpec>,
    snapshots: Vec<Snapshot>,
    discount_rate: Option<f64>,
}

impl TemporalIndexBuilder {
    /// Declare a period. `years` defaults to the gap to the next period (the
    /// last period repeats the previous gap, or 1 year when alone).
    pub fn period(mut self, start_year: i32) -> Self {
        self.periods.push(PeriodSpec {
            start_year,
            years: None,
            objective_weight: None,
        });
        self
    }

    pub fn period_with_years(mut self, start_year: i32, years: f64) -> Self {
        self.periods.push(PeriodSpec {
            start_year,
            years: Some(years),
            objective_weight: None,
        });
        self
    }

    /// Declare a period with an explicit objective weight; overrides discounting.
    pub fn period_weighted(mut self, start_year: i32, years: f64, objective_weight: f64) -> Self {
        self.periods.push(PeriodSpec {
            start_year,
            years: Some(years),
            objective_weight: Some(objective_weight),
        });
        self
    }

    pub fn snapshot(mut self, label: impl Into<String>, period: i32, weight: f64) -> Self {
        self.snapshots.push(Snapshot {
            label: label.into(),
            period,
            weight,
        });
        self
    }

    /// Append `count` snapshots to `period`, labelled `"{period}-{i}"`.
    pub fn snapshots_for(mut self, period: i32, count: usize, weight: f64) -> Self {
        for i in 0..count {
            self.snapshots.push(Snapshot {
                label: format!("{}-{}", period, i),
                period,
                weight,
            });
        }
        self
    }

    /// Objective weights become `1 / (1 + r)^(start - first_start)` for every
    /// period without an explicit weight.
    pub fn discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    pub fn build(self) -> HorizonResult<TemporalIndex> {
        if self.periods.is_empty() {
            return Err(HorizonError::config("no investment periods declared"));
        }
        if let Some(r) = self.discount_rate {
            if !r.is_finite() || r <= -1.0 {
                return Err(HorizonError::config(format!(
                    "discount rate {} must be finite and greater than -1",
                    r
                )));
            }
        }

        for pair in self.periods.windows(2) {
            if pair[1].start_year <= pair[0].start_year {
                return Err(HorizonError::config(format!(
                    "investment periods must be strictly increasing ({} follows {})",
                    pair[1].start_year, pair[0].start_year
                )));
            }
        }

        for snapshot in &self.snapshots {
            if !snapshot.weight.is_finite() || snapshot.weight < 0.0 {
                return Err(HorizonError::config(format!(
                    "snapshot '{}' has invalid weight {}",
                    snapshot.label, snapshot.weight
                )));
            }
        }

        let first_year = self.periods[0].start_year;
        let mut periods = Vec::with_capacity(self.periods.len());
        for (i, spec) in self.periods.iter().enumerate() {
            let years = match spec.years {
                Some(y) => y,
                None => default_years(&self.periods, i),
            };
            if !years.is_finite() || years < 0.0 {
                return Err(HorizonError::config(format!(
                    "period {} has invalid length {} years",
                    spec.start_year, years
                )));
            }
            let objective_weight = match (spec.objective_weight, self.discount_rate) {
                (Some(w), _) => w,
                (None, Some(r)) => (1.0 + r).powi(-(spec.start_year - first_year)),
                (None, None) => 1.0,
            };
            if !objective_weight.is_finite() || objective_weight < 0.0 {
                return Err(HorizonError::config(format!(
                    "period {} has invalid objective weight {}",
                    spec.start_year, objective_weight
                )));
            }
            periods.push(InvestmentPeriod {
                start_year: spec.start_year,
                years,
                objective_weight,
                snapshots: 0..0,
            });
        }

        // Group snapshots; a period may not reappear once another period has started.
        let mut period_of = Vec::with_capacity(self.snapshots.len());
        let mut current: Option<usize> = None;
        for (t, snapshot) in self.snapshots.iter().enumerate() {
            let p = periods
                .binary_search_by_key(&snapshot.period, |p: &InvestmentPeriod| p.start_year)
                .map_err(|_| {
                    HorizonError::config(format!(
                        "snapshot '{}' references undeclared period {}",
                        snapshot.label, snapshot.period
                    ))
                })?;
            match current {
                Some(c) if c == p => {}
                Some(c) if p < c => {
                    return Err(HorizonError::config(format!(
                        "snapshots are not grouped by period: '{}' returns to period {} after period {}",
                        snapshot.label, snapshot.period, periods[c].start_year
                    )));
                }
                _ => {
                    periods[p].snapshots = t..t;
                    current = Some(p);
                }
            }
            periods[p].snapshots.end = t + 1;
            period_of.push(p);
        }

        Ok(TemporalIndex {
            snapshots: self.snapshots,
            periods,
            period_of,
            discount_rate: self.discount_rate,
        })
    }
}

fn default_years(periods: &[PeriodSpec], i: usize) -> f64 {
    if let Some(next) = periods.get(i + 1) {
        return (next.start_year - periods[i].start_year) as f64;
    }
    if i > 0 {
        return (periods[i].start_year - periods[i - 1].start_year) as f64;
    }
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_periods() -> TemporalIndex {
        TemporalIndex::builder()
            .period(2020)
            .period(2030)
            .snapshots_for(2020, 2, 12.0)
            .snapshots_for(2030, 3, 8.0)
            .discount_rate(0.05)
            .build()
            .unwrap()
    }

    #[test]
    fn test_period_lookup_and_weights() {
        let index = two_periods();
        assert_eq!(index.len(), 5);
        assert_eq!(index.num_periods(), 2);
        assert_eq!(index.period_of(0).start_year, 2020);
        assert_eq!(index.period_of(4).start_year, 2030);
        assert_eq!(index.period_index_of(2), 1);
        assert_eq!(index.weight(3), 8.0);
        assert_eq!(index.periods()[1].snapshot_range(), 2..5);
        assert_eq!(index.period_by_year(2030), Some(1));
        assert_eq!(index.period_by_year(2025), None);
    }

    #[test]
    fn test_default_years_from_gaps() {
        let index = two_periods();
        let w0 = index.period_weight(0);
        let w1 = index.period_weight(1);
        assert_eq!(w0.years, 10.0);
        assert_eq!(w1.years, 10.0);
    }

    #[test]
    fn test_discounted_objective_weights() {
        let index = two_periods();
        assert!((index.period_weight(0).objective - 1.0).abs() < 1e-12);
        let expected = 1.0 / 1.05f64.powi(10);
        assert!((index.period_weight(1).objective - expected).abs() < 1e-12);
    }

    #[test]
    fn test_discount_monotonic_for_increasing_years() {
        let index = TemporalIndex::builder()
            .period(2025)
            .period(2030)
            .period(2040)
            .period(2041)
            .snapshots_for(2025, 1, 1.0)
            .snapshots_for(2030, 1, 1.0)
            .snapshots_for(2040, 1, 1.0)
            .snapshots_for(2041, 1, 1.0)
            .discount_rate(0.02)
            .build()
            .unwrap();
        for p in 1..index.num_periods() {
            assert!(index.period_weight(p - 1).objective > index.period_weight(p).objective);
        }
    }

    #[test]
    fn test_explicit_objective_weight_wins() {
        let index = TemporalIndex::builder()
            .period_weighted(2020, 5.0, 0.7)
            .snapshots_for(2020, 1, 1.0)
            .discount_rate(0.1)
            .build()
            .unwrap();
        assert_eq!(index.period_weight(0), PeriodWeighting { years: 5.0, objective: 0.7 });
    }

    #[test]
    fn test_interleaved_periods_rejected() {
        let err = TemporalIndex::builder()
            .period(2020)
            .period(2030)
            .snapshot("a", 2020, 1.0)
            .snapshot("b", 2030, 1.0)
            .snapshot("c", 2020, 1.0)
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not grouped"));
    }

    #[test]
    fn test_undeclared_period_rejected() {
        let err = TemporalIndex::builder()
            .period(2020)
            .snapshot("a", 2025, 1.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("undeclared period 2025"));
    }

    #[test]
    fn test_non_increasing_periods_rejected() {
        let result = TemporalIndex::builder().period(2030).period(2020).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_length_period_and_zero_weight_allowed() {
        let index = TemporalIndex::builder()
            .period_with_years(2020, 0.0)
            .period(2030)
            .snapshot("only", 2030, 0.0)
            .build()
            .unwrap();
        assert!(index.periods()[0].is_empty());
        assert_eq!(index.period_weight(0).years, 0.0);
        assert_eq!(index.weight(0), 0.0);
    }

    #[test]
    fn test_previous_in_period() {
        let index = two_periods();
        assert_eq!(index.previous_in_period(0), None);
        assert_eq!(index.previous_in_period(1), Some(0));
        assert_eq!(index.previous_in_period(2), None);
        assert_eq!(index.previous_in_period(4), Some(3));
    }

    #[test]
    fn test_uniform_index() {
        let index = TemporalIndex::uniform(24, 1.0);
        assert_eq!(index.len(), 24);
        assert_eq!(index.num_periods(), 1);
        assert_eq!(index.total_hours(), 24.0);
        assert_eq!(index.period_weight(0), PeriodWeighting { years: 1.0, objective: 1.0 });
    }
}
