use super::overrides::EdgeKey;
use crate::core::models::hkl::HKL;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionType {
    CovalentBond,
    HydrogenBond,
    CloseContact,
    DontBond,
}

#[derive(Debug, Error)]
#[error("Invalid connection type string")]
pub struct ParseConnectionTypeError;

impl FromStr for ConnectionType {
    type Err = ParseConnectionTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "covalent" | "covalentbond" | "bond" => Ok(Self::CovalentBond),
            "hydrogen" | "hydrogenbond" | "hbond" => Ok(Self::HydrogenBond),
            "contact" | "closecontact" => Ok(Self::CloseContact),
            "none" | "dontbond" | "nobond" => Ok(Self::DontBond),
            _ => Err(ParseConnectionTypeError),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::CovalentBond => "CovalentBond",
                Self::HydrogenBond => "HydrogenBond",
                Self::CloseContact => "CloseContact",
                Self::DontBond => "DontBond",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodicVertex {
    pub uc_idx: usize,
}

/// A directed connection from a unit-cell atom to a periodic image of another.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicEdge {
    pub dist: f64,             // Cartesian separation in Angstroms
    pub source: usize,         // unit-cell atom index
    pub target: usize,         // unit-cell atom index
    pub source_asym_idx: usize,
    pub target_asym_idx: usize,
    pub hkl: HKL,              // cell of the target relative to the source
    pub connection_type: ConnectionType,
}

impl PeriodicEdge {
    /// The same connection seen from the target atom.
    pub fn reversed(&self) -> Self {
        Self {
            dist: self.dist,
            source: self.target,
            target: self.source,
            source_asym_idx: self.target_asym_idx,
            target_asym_idx: self.source_asym_idx,
            hkl: -self.hkl,
            connection_type: self.connection_type,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target, self.hkl)
    }

    /// True for exactly one edge of each forward/reverse pair.
    pub fn is_forward(&self) -> bool {
        self.source < self.target || (self.source == self.target && self.hkl.is_positive())
    }
}

/// Periodic connectivity of the atoms in a unit cell.
///
/// A directed multigraph: vertex `i` is unit-cell atom `i`, and every
/// connection is stored as a forward edge plus its HKL-negated reverse so the
/// graph can be walked symmetrically from either endpoint. A hydrogen bond is
/// stored in addition to the close contact that carries the same geometry.
#[derive(Debug, Clone, Default)]
pub struct PeriodicBondGraph {
    graph: DiGraph<PeriodicVertex, PeriodicEdge>,
}

impl PeriodicBondGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertices(num_atoms: usize) -> Self {
        let mut graph = Self::new();
        for uc_idx in 0..num_atoms {
            graph.add_vertex(uc_idx);
        }
        graph
    }

    fn add_vertex(&mut self, uc_idx: usize) -> NodeIndex {
        let idx = self.graph.add_node(PeriodicVertex { uc_idx });
        debug_assert_eq!(idx.index(), uc_idx);
        idx
    }

    /// Inserts `edge` and its reverse.
    pub fn add_edge_pair(&mut self, edge: PeriodicEdge) {
        let reverse = edge.reversed();
        let (s, t) = (NodeIndex::new(edge.source), NodeIndex::new(edge.target));
        self.graph.add_edge(s, t, edge);
        self.graph.add_edge(t, s, reverse);
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed edges (twice the number of connections).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &PeriodicVertex> + '_ {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &PeriodicEdge> + '_ {
        self.graph.edge_weights()
    }

    /// One edge per connection, i.e. the forward half of every pair.
    pub fn unique_edges(&self) -> impl Iterator<Item = &PeriodicEdge> + '_ {
        self.edges().filter(|e| e.is_forward())
    }

    pub fn edges_of_type(
        &self,
        connection_type: ConnectionType,
    ) -> impl Iterator<Item = &PeriodicEdge> + '_ {
        self.unique_edges()
            .filter(move |e| e.connection_type == connection_type)
    }

    /// Outgoing edges of a unit-cell atom; empty for an unknown index.
    pub fn edges_from(&self, uc_idx: usize) -> impl Iterator<Item = &PeriodicEdge> + '_ {
        let node = (uc_idx < self.graph.node_count()).then(|| NodeIndex::new(uc_idx));
        node.into_iter().flat_map(move |n| {
            self.graph
                .edges_directed(n, Direction::Outgoing)
                .map(|e| e.weight())
        })
    }

    pub fn count_of_type(&self, connection_type: ConnectionType) -> usize {
        self.edges_of_type(connection_type).count()
    }

    pub fn inner(&self) -> &DiGraph<PeriodicVertex, PeriodicEdge> {
        &self.graph
    }
}
