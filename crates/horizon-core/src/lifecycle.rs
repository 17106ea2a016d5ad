//! Asset activity across investment periods.
//!
//! An asset built in `build_year` with lifetime `L` is active in a period
//! starting in `y` iff `build_year <= y < build_year + L`. The upper bound is
//! exclusive: a 30-year asset built in 2029 runs through a period starting in
//! 2058 and is gone from 2059 on.

use serde::{Deserialize, Serialize};

use crate::temporal::TemporalIndex;

/// Build year and lifetime of an asset. `None` means "first period" and
/// "unbounded" respectively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub build_year: Option<i32>,
    pub lifetime: Option<f64>,
}

impl Lifecycle {
    pub fn new(build_year: i32, lifetime: f64) -> Self {
        Self {
            build_year: Some(build_year),
            lifetime: Some(lifetime),
        }
    }

    /// Never retires, available from the first period.
    pub fn perpetual() -> Self {
        Self::default()
    }

    pub fn lifetime_or_inf(&self) -> f64 {
        self.lifetime.unwrap_or(f64::INFINITY)
    }

    /// First year in which the asset no longer exists, if it retires.
    pub fn retirement_year(&self, first_period: i32) -> Option<f64> {
        let build = self.build_year.unwrap_or(first_period) as f64;
        self.lifetime.map(|l| build + l)
    }
}

/// Pure activity test for a single `(asset, period start)` pair.
#[inline]
pub fn is_active(build_year: i32, lifetime: f64, period_start: i32) -> bool {
    build_year <= period_start && (period_start as f64) < build_year as f64 + lifetime
}

/// Resolves [`Lifecycle`]s against the periods of a [`TemporalIndex`].
///
/// With gating disabled every asset is active in every period; this is the
/// single-period mode where build years carry no meaning.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleResolver<'a> {
    index: &'a TemporalIndex,
    gating: bool,
}

impl<'a> LifecycleResolver<'a> {
    pub fn new(index: &'a TemporalIndex) -> Self {
        Self {
            index,
            gating: true,
        }
    }

    pub fn without_gating(index: &'a TemporalIndex) -> Self {
        Self {
            index,
            gating: false,
        }
    }

    pub fn is_gating(&self) -> bool {
        self.gating
    }

    pub fn is_active(&self, lifecycle: &Lifecycle, period: usize) -> bool {
        if !self.gating {
            return true;
        }
        let build_year = lifecycle
            .build_year
            .unwrap_or_else(|| self.index.first_period_year());
        let start = self.index.periods()[period].start_year;
        is_active(build_year, lifecycle.lifetime_or_inf(), start)
    }

    /// Activity flag for every period, in period order.
    pub fn activity(&self, lifecycle: &Lifecycle) -> Vec<bool> {
        (0..self.index.num_periods())
            .map(|p| self.is_active(lifecycle, p))
            .collect()
    }

    /// Position of the first period in which the asset is active.
    pub fn first_active_period(&self, lifecycle: &Lifecycle) -> Option<usize> {
        (0..self.index.num_periods()).find(|&p| self.is_active(lifecycle, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_inclusion_exclusion() {
        assert!(is_active(2029, 30.0, 2029));
        assert!(is_active(2029, 30.0, 2058));
        assert!(!is_active(2029, 30.0, 2059));
        assert!(!is_active(2029, 30.0, 2028));
    }

    #[test]
    fn test_boundary_law_over_range() {
        for build in [1990, 2000, 2025, 2050] {
            for lifetime in [1.0, 5.0, 25.0, 40.0] {
                assert!(is_active(build, lifetime, build));
                assert!(!is_active(build, lifetime, build + lifetime as i32));
            }
        }
    }

    #[test]
    fn test_unbounded_lifetime() {
        assert!(is_active(2020, f64::INFINITY, 3000));
    }

    #[test]
    fn test_resolver_defaults_build_year_to_first_period() {
        let index = TemporalIndex::builder()
            .period(2020)
            .period(2030)
            .period(2040)
            .snapshots_for(2020, 1, 1.0)
            .snapshots_for(2030, 1, 1.0)
            .snapshots_for(2040, 1, 1.0)
            .build()
            .unwrap();
        let resolver = LifecycleResolver::new(&index);

        let always = Lifecycle::perpetual();
        assert_eq!(resolver.activity(&always), vec![true, true, true]);

        let short = Lifecycle {
            build_year: None,
            lifetime: Some(15.0),
        };
        assert_eq!(resolver.activity(&short), vec![true, true, false]);

        let late = Lifecycle::new(2030, 10.0);
        assert_eq!(resolver.activity(&late), vec![false, true, false]);
        assert_eq!(resolver.first_active_period(&late), Some(1));

        let never = Lifecycle::new(2045, 10.0);
        assert_eq!(resolver.first_active_period(&never), None);
    }

    #[test]
    fn test_resolver_without_gating() {
        let index = TemporalIndex::uniform(3, 1.0);
        let resolver = LifecycleResolver::without_gating(&index);
        assert!(resolver.is_active(&Lifecycle::new(2100, 1.0), 0));
    }

    #[test]
    fn test_retirement_year() {
        assert_eq!(Lifecycle::new(2029, 30.0).retirement_year(2020), Some(2059.0));
        assert_eq!(Lifecycle::perpetual().retirement_year(2020), None);
    }
}
