//! Solver-independent linear program.
//!
//! Builders append variables and rows here; a backend turns the finished
//! program into whatever its solver wants. Keeping our own representation
//! lets the solver stay an opaque `solve(A, b, c)` and keeps row order
//! deterministic.

use std::fmt;

/// Position of a variable in [`LinearProgram::variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpVariable {
    pub name: String,
    /// `None` is unbounded below
    pub lower: Option<f64>,
    /// `None` is unbounded above
    pub upper: Option<f64>,
}

/// `Σ coef × var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    /// Zero coefficients are dropped.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// `self += factor × other`
    pub fn add_scaled(&mut self, other: &LinearExpr, factor: f64) {
        if factor == 0.0 {
            return;
        }
        for &(var, coef) in &other.terms {
            self.add_term(var, coef * factor);
        }
        self.constant += other.constant * factor;
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.0])
            .sum::<f64>()
            + self.constant
    }

    /// Merge repeated variables. Terms come out sorted by variable.
    pub fn compact(mut self) -> Self {
        self.terms.sort_by_key(|(var, _)| *var);
        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());
        for (var, coef) in self.terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == var => *acc += coef,
                _ => merged.push((var, coef)),
            }
        }
        merged.retain(|(_, coef)| *coef != 0.0);
        self.terms = merged;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "==",
        })
    }
}

/// `expr sense rhs`. Any constant inside `expr` is moved to the right-hand
/// side when the row is added.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Signed violation at `values`; `0.0` when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

/// `minimize objective` subject to `constraints` and variable bounds.
#[derive(Debug, Clone, Default)]
pub struct LinearProgram {
    pub variables: Vec<LpVariable>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: LinearExpr,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable. Infinite bounds are stored as `None`.
    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(LpVariable {
            name: name.into(),
            lower: lower.is_finite().then_some(lower),
            upper: upper.is_finite().then_some(upper),
        });
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) {
        self.constraints.push(normalize(name.into(), expr, sense, rhs));
    }

    pub fn extend_constraints(&mut self, rows: impl IntoIterator<Item = LinearConstraint>) {
        self.constraints.extend(rows);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Largest row or bound violation at `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let rows = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(var, &v)| {
                let below = var.lower.map(|l| (l - v).max(0.0)).unwrap_or(0.0);
                let above = var.upper.map(|u| (v - u).max(0.0)).unwrap_or(0.0);
                below.max(above)
            })
            .fold(0.0, f64::max);
        rows.max(bounds)
    }
}

/// Build a row with the expression constant folded into the right-hand side.
pub fn normalize(name: String, expr: LinearExpr, sense: Sense, rhs: f64) -> LinearConstraint {
    let mut expr = expr.compact();
    let rhs = rhs - expr.constant;
    expr.constant = 0.0;
    LinearConstraint {
        name,
        expr,
        sense,
        rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_merges_and_drops_zeros() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, f64::INFINITY);
        let y = lp.add_variable("y", f64::NEG_INFINITY, 5.0);

        let mut e = LinearExpr::new();
        e.add_term(y, 2.0);
        e.add_term(x, 1.0);
        e.add_term(y, -2.0);
        e.add_term(x, 0.5);
        let e = e.compact();
        assert_eq!(e.terms, vec![(x, 1.5)]);

        assert_eq!(lp.variables[0].upper, None);
        assert_eq!(lp.variables[1].lower, None);
        assert_eq!(lp.variables[1].upper, Some(5.0));
    }

    #[test]
    fn test_constant_moves_to_rhs() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 10.0);
        let mut e = LinearExpr::term(x, 1.0);
        e.add_constant(3.0);
        lp.add_constraint("row", e, Sense::Eq, 5.0);

        let row = &lp.constraints[0];
        assert_eq!(row.rhs, 2.0);
        assert_eq!(row.expr.constant, 0.0);
        assert_eq!(row.violation(&[2.0]), 0.0);
        assert_eq!(row.violation(&[3.0]), 1.0);
    }

    #[test]
    fn test_add_scaled_and_evaluate() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 1.0);
        let y = lp.add_variable("y", 0.0, 1.0);
        let mut base = LinearExpr::term(x, 2.0);
        base.add_constant(1.0);
        let mut total = LinearExpr::term(y, 1.0);
        total.add_scaled(&base, 3.0);
        assert_eq!(total.evaluate(&[1.0, 2.0]), 2.0 + 6.0 + 3.0);
    }

    #[test]
    fn test_max_violation_covers_bounds() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 1.0);
        lp.add_constraint("cap", LinearExpr::term(x, 1.0), Sense::Le, 0.5);
        assert_eq!(lp.max_violation(&[0.5]), 0.0);
        assert!((lp.max_violation(&[1.5]) - 1.0).abs() < 1e-12);
        assert!((lp.max_violation(&[-2.0]) - 2.0).abs() < 1e-12);
    }
}
