//! Multi-output conversion links.
//!
//! A link has one decision variable per active snapshot, the input flow
//! `p0`. Outputs are not variables: output `k` at `t` is the expression
//! `efficiency_k(t) × p0(t)`, so conservation holds by construction and
//! outputs carry no bounds of their own.

use horizon_core::{Asset, Link};

use crate::lp::{LinearExpr, LinearProgram, VarId};
use crate::variables::{capacity_term, dispatch_variable, LinkVars, ModelContext};

/// Input flow variables, bounded by `[p_min_pu, p_max_pu] × p_nom`.
pub fn add_link_variables(ctx: &ModelContext<'_>, lp: &mut LinearProgram) -> Vec<LinkVars> {
    let n = ctx.num_snapshots();
    ctx.network
        .links
        .iter()
        .zip(&ctx.activity.links)
        .map(|(link, activity)| {
            let label = link.label();
            let nom = capacity_term(lp, &label, link.capacity(), activity);
            let p0 = (0..n)
                .map(|t| {
                    ctx.active_at(activity, t).then(|| {
                        dispatch_variable(
                            lp,
                            format!("{} p0 {}", label, ctx.snapshot_label(t)),
                            nom,
                            link.p_min_pu.at(t),
                            link.p_max_pu.at(t),
                        )
                    })
                })
                .collect();
            LinkVars { nom, p0 }
        })
        .collect()
}

/// Efficiency of output `k` (1-based) at snapshot `t`.
pub fn efficiency(link: &Link, k: usize, t: usize) -> f64 {
    link.outputs[k - 1].efficiency.at(t)
}

/// `efficiency_k(t) × p0(t)` as an expression in the input variable.
pub fn output_flow(link: &Link, k: usize, t: usize, p0: VarId) -> LinearExpr {
    LinearExpr::term(p0, efficiency(link, k, t))
}

/// Every `(bus, coefficient on p0)` the link touches at `t`: `-1` at the
/// input bus, `efficiency_k(t)` at each output bus.
pub fn bus_coefficients(link: &Link, t: usize) -> impl Iterator<Item = (&str, f64)> + '_ {
    std::iter::once((link.bus0.as_str(), -1.0)).chain(
        link.outputs
            .iter()
            .map(move |out| (out.bus.as_str(), out.efficiency.at(t))),
    )
}

/// Realized output flows `p_out[k - 1][t]` from realized input flows.
pub fn realized_outputs(link: &Link, p0: &[f64]) -> Vec<Vec<f64>> {
    link.outputs
        .iter()
        .map(|out| {
            p0.iter()
                .enumerate()
                .map(|(t, &flow)| out.efficiency.at(t) * flow)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{Bus, Network, Series, TemporalIndex};

    use crate::options::SolveOptions;

    fn dac() -> Link {
        Link::new("dac", "elec")
            .with_output("co2 stored", 1.0)
            .with_output("co2 atmosphere", -1.0)
            .with_output("heat", Series::varying(vec![0.5, 0.25]))
    }

    #[test]
    fn test_bus_coefficients_include_negative_efficiency() {
        let link = dac();
        let coefs: Vec<_> = bus_coefficients(&link, 1).collect();
        assert_eq!(
            coefs,
            vec![
                ("elec", -1.0),
                ("co2 stored", 1.0),
                ("co2 atmosphere", -1.0),
                ("heat", 0.25)
            ]
        );
    }

    #[test]
    fn test_realized_outputs_follow_efficiencies() {
        let link = dac();
        let outputs = realized_outputs(&link, &[10.0, 4.0]);
        assert_eq!(outputs[0], vec![10.0, 4.0]);
        assert_eq!(outputs[1], vec![-10.0, -4.0]);
        assert_eq!(outputs[2], vec![5.0, 1.0]);
    }

    #[test]
    fn test_link_variables_and_output_expression() {
        let mut network = Network::new("links", TemporalIndex::uniform(2, 1.0));
        for bus in ["elec", "co2 stored", "co2 atmosphere", "heat"] {
            network.add_bus(Bus::new(bus)).unwrap();
        }
        network.extend_link_outputs(3);
        network.add_link(dac().with_p_nom(100.0)).unwrap();

        let options = SolveOptions::default();
        let ctx = ModelContext::new(&network, &options);
        let mut lp = LinearProgram::new();
        let vars = add_link_variables(&ctx, &mut lp);

        let p0 = vars[0].p0[1].unwrap();
        assert_eq!(lp.variables[p0.index()].upper, Some(100.0));
        assert_eq!(lp.variables[p0.index()].lower, Some(0.0));

        let heat = output_flow(&network.links[0], 3, 1, p0);
        assert_eq!(heat.terms, vec![(p0, 0.25)]);
    }
}
