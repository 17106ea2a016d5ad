//! Bus connectivity over lines and links.
//!
//! A sub-network is a connected component of the undirected graph whose nodes
//! are buses and whose edges are lines plus every `bus0 -> busK` leg of a link.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubNetwork {
    pub id: usize,
    /// Bus names in declaration order
    pub buses: Vec<String>,
}

/// Build the bus graph. Edges that reference unknown buses are skipped.
pub fn bus_graph(network: &Network) -> (UnGraph<String, ()>, HashMap<String, NodeIndex>) {
    let mut graph = UnGraph::new_undirected();
    let mut index = HashMap::with_capacity(network.buses.len());
    for bus in &network.buses {
        let node = graph.add_node(bus.name.clone());
        index.insert(bus.name.clone(), node);
    }

    let mut connect = |a: &str, b: &str| {
        if let (Some(&na), Some(&nb)) = (index.get(a), index.get(b)) {
            graph.add_edge(na, nb, ());
        }
    };
    for line in &network.lines {
        connect(&line.bus0, &line.bus1);
    }
    for link in &network.links {
        for output in &link.outputs {
            connect(&link.bus0, &output.bus);
        }
    }

    (graph, index)
}

/// Connected components of the bus graph, ordered by first bus.
pub fn sub_networks(network: &Network) -> Vec<SubNetwork> {
    let (graph, _) = bus_graph(network);
    let mut component = vec![usize::MAX; graph.node_count()];
    let mut result: Vec<SubNetwork> = Vec::new();

    for start in graph.node_indices() {
        if component[start.index()] != usize::MAX {
            continue;
        }
        let id = result.len();
        let mut members = Vec::new();
        let mut bfs = Bfs::new(&graph, start);
        while let Some(node) = bfs.next(&graph) {
            component[node.index()] = id;
            members.push(node.index());
        }
        members.sort_unstable();
        result.push(SubNetwork {
            id,
            buses: members.into_iter().map(|i| graph[NodeIndex::new(i)].clone()).collect(),
        });
    }

    result
}

/// Append topology warnings: isolated buses and sub-networks that carry load
/// but contain nothing able to supply it.
pub fn validate_into(network: &Network, diag: &mut Diagnostics) {
    let mut attached: HashMap<&str, usize> = HashMap::new();
    let mut supply: HashMap<&str, bool> = HashMap::new();
    for load in &network.loads {
        *attached.entry(load.bus.as_str()).or_default() += 1;
    }
    let supplying = network
        .generators
        .iter()
        .map(|g| g.bus.as_str())
        .chain(network.storage_units.iter().map(|s| s.bus.as_str()))
        .chain(network.stores.iter().map(|s| s.bus.as_str()));
    for bus in supplying {
        *attached.entry(bus).or_default() += 1;
        supply.insert(bus, true);
    }
    for link in &network.links {
        *attached.entry(link.bus0.as_str()).or_default() += 1;
        for output in &link.outputs {
            *attached.entry(output.bus.as_str()).or_default() += 1;
        }
    }
    for line in &network.lines {
        *attached.entry(line.bus0.as_str()).or_default() += 1;
        *attached.entry(line.bus1.as_str()).or_default() += 1;
    }

    for bus in &network.buses {
        if !attached.contains_key(bus.name.as_str()) {
            diag.add_warning_with_entity(
                "topology",
                "bus has nothing attached",
                &format!("bus '{}'", bus.name),
            );
        }
    }

    let n = network.snapshots().len();
    for sub in sub_networks(network) {
        let has_load = network.loads.iter().any(|l| {
            sub.buses.contains(&l.bus) && (0..n.max(1)).any(|t| l.p_set.at(t) > 0.0)
        });
        let has_supply = sub.buses.iter().any(|b| supply.contains_key(b.as_str()));
        if has_load && !has_supply {
            diag.add_warning(
                "topology",
                &format!(
                    "sub-network {} ({} bus{}) has load but no generator, storage or store",
                    sub.id,
                    sub.buses.len(),
                    if sub.buses.len() == 1 { "" } else { "es" }
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Bus, Generator, Line, Link, Load};
    use crate::temporal::TemporalIndex;

    fn network() -> Network {
        let mut network = Network::new("topo", TemporalIndex::uniform(2, 1.0));
        for name in ["a", "b", "c", "d"] {
            network.add_bus(Bus::new(name)).unwrap();
        }
        network.add_line(Line::new("ab", "a", "b")).unwrap();
        network.add_link(Link::new("bc", "b").with_output("c", 0.9)).unwrap();
        network
    }

    #[test]
    fn test_sub_networks_follow_lines_and_links() {
        let subs = sub_networks(&network());
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].buses, vec!["a", "b", "c"]);
        assert_eq!(subs[1].buses, vec!["d"]);
    }

    #[test]
    fn test_isolated_and_unsupplied_warnings() {
        let mut network = network();
        network.add_load(Load::new("l", "c", 10.0)).unwrap();

        let mut diag = Diagnostics::new();
        validate_into(&network, &mut diag);
        assert_eq!(diag.error_count(), 0);
        let messages: Vec<_> = diag.warnings().map(|i| i.message.clone()).collect();
        assert!(messages.iter().any(|m| m.contains("nothing attached")));
        assert!(messages.iter().any(|m| m.contains("has load but no generator")));

        network.add_generator(Generator::new("g", "a", "")).unwrap();
        let mut diag = Diagnostics::new();
        validate_into(&network, &mut diag);
        assert!(!diag.warnings().any(|i| i.message.contains("has load")));
    }
}
