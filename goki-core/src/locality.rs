//! Static region/zone assignment.
//!
//! Nodes 1-3 land in region 1, 4-6 in region 2, 7-9 in region 3, and zones
//! cycle 1, 2, 3 within each region. The values are labels only.

use crate::naming::NodeId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locality {
    pub region: u8,
    pub zone: u8,
}

impl Locality {
    /// Value of CockroachDB's `--locality` flag.
    pub fn flag(&self) -> String {
        format!("--locality={}", self)
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region=region-{},zone=zone-{}", self.region, self.zone)
    }
}

pub fn locality(node: NodeId) -> Locality {
    let n = node.get();
    let zone = match n % 3 {
        0 => 3,
        r => r,
    };
    Locality { region: n.div_ceil(3), zone }
}

/// Locality for `node` when assignment is enabled.
pub fn assign(node: NodeId, enabled: bool) -> Option<Locality> {
    enabled.then(|| locality(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(n: i64) -> Locality {
        locality(NodeId::new(n).unwrap())
    }

    #[test]
    fn known_assignments() {
        assert_eq!(at(1), Locality { region: 1, zone: 1 });
        assert_eq!(at(3), Locality { region: 1, zone: 3 });
        assert_eq!(at(4), Locality { region: 2, zone: 1 });
        assert_eq!(at(9), Locality { region: 3, zone: 3 });
    }

    #[test]
    fn matches_formula_for_every_node() {
        for node in NodeId::all() {
            let n = node.get();
            let loc = locality(node);
            assert_eq!(loc.region, (n + 2) / 3);
            assert_eq!(loc.zone, if n % 3 == 0 { 3 } else { n % 3 });
        }
    }

    #[test]
    fn disabled_assigns_nothing() {
        let node = NodeId::new(5).unwrap();
        assert_eq!(assign(node, false), None);
        assert_eq!(assign(node, true).unwrap().flag(), "--locality=region=region-2,zone=zone-2");
    }
}
