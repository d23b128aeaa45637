// Warehouse graph model
// Named locations mapped onto dense state indices with an undirected adjacency relation

use crate::error::{RouterError, RouterResult};
use std::collections::HashMap;

/// Locations of the reference warehouse, in state-index order
pub const REFERENCE_LOCATIONS: [&str; 12] =
    ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];

/// Corridors of the reference warehouse
pub const REFERENCE_EDGES: [(&str, &str); 12] = [
    ("A", "B"),
    ("B", "C"),
    ("B", "F"),
    ("C", "G"),
    ("F", "J"),
    ("G", "H"),
    ("H", "D"),
    ("H", "L"),
    ("J", "I"),
    ("J", "K"),
    ("K", "L"),
    ("I", "E"),
];

/// Fixed-topology warehouse graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseGraph {
    /// Location name for each state index
    locations: Vec<String>,
    /// Reverse lookup from location name to state index
    index: HashMap<String, usize>,
    /// Symmetric adjacency matrix
    adjacency: Vec<Vec<bool>>,
}

impl WarehouseGraph {
    /// Build a graph from location names and undirected edges
    pub fn new<S, E>(locations: &[S], edges: &[(E, E)]) -> RouterResult<Self>
    where
        S: AsRef<str>,
        E: AsRef<str>,
    {
        if locations.is_empty() {
            return Err(RouterError::invalid_topology("graph has no locations"));
        }

        let mut index = HashMap::with_capacity(locations.len());
        let mut names = Vec::with_capacity(locations.len());
        for (state, location) in locations.iter().enumerate() {
            let location = location.as_ref();
            if location.is_empty() {
                return Err(RouterError::invalid_topology("location name is empty"));
            }
            if index.insert(location.to_string(), state).is_some() {
                return Err(RouterError::invalid_topology(format!(
                    "duplicate location {}",
                    location
                )));
            }
            names.push(location.to_string());
        }

        let n = names.len();
        let mut adjacency = vec![vec![false; n]; n];
        for (from, to) in edges {
            let (from, to) = (from.as_ref(), to.as_ref());
            let i = *index.get(from).ok_or_else(|| {
                RouterError::invalid_topology(format!("edge references unknown location {}", from))
            })?;
            let j = *index.get(to).ok_or_else(|| {
                RouterError::invalid_topology(format!("edge references unknown location {}", to))
            })?;
            if i == j {
                return Err(RouterError::invalid_topology(format!(
                    "self-loop on location {}",
                    from
                )));
            }
            adjacency[i][j] = true;
            adjacency[j][i] = true;
        }

        Ok(Self {
            locations: names,
            index,
            adjacency,
        })
    }

    /// The twelve-location reference warehouse (A..L)
    pub fn reference() -> Self {
        let mut index = HashMap::with_capacity(REFERENCE_LOCATIONS.len());
        for (state, location) in REFERENCE_LOCATIONS.iter().enumerate() {
            index.insert(location.to_string(), state);
        }
        let n = REFERENCE_LOCATIONS.len();
        let mut adjacency = vec![vec![false; n]; n];
        for (from, to) in REFERENCE_EDGES {
            let (i, j) = (index[from], index[to]);
            adjacency[i][j] = true;
            adjacency[j][i] = true;
        }
        Self {
            locations: REFERENCE_LOCATIONS.iter().map(|l| l.to_string()).collect(),
            index,
            adjacency,
        }
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// All location names in state order
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Resolve a location name to its state index
    pub fn state_of(&self, location: &str) -> RouterResult<usize> {
        self.index
            .get(location)
            .copied()
            .ok_or_else(|| RouterError::unknown_location(location))
    }

    /// Location name for a state index
    pub fn location_of(&self, state: usize) -> &str {
        &self.locations[state]
    }

    pub fn contains(&self, location: &str) -> bool {
        self.index.contains_key(location)
    }

    /// Read-only view of the adjacency template
    pub fn adjacency(&self) -> &[Vec<bool>] {
        &self.adjacency
    }

    /// Whether two states share a corridor
    pub fn is_adjacent(&self, from: usize, to: usize) -> bool {
        self.adjacency[from][to]
    }

    /// Whether two locations share a corridor, false for unknown names
    pub fn are_adjacent(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&i), Some(&j)) => self.adjacency[i][j],
            _ => false,
        }
    }

    /// Neighbouring states in index order
    pub fn neighbours(&self, state: usize) -> Vec<usize> {
        self.adjacency[state]
            .iter()
            .enumerate()
            .filter(|&(_, &adjacent)| adjacent)
            .map(|(j, _)| j)
            .collect()
    }

    /// Undirected edges as location pairs, each listed once
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges = Vec::new();
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                if self.adjacency[i][j] {
                    edges.push((self.locations[i].clone(), self.locations[j].clone()));
                }
            }
        }
        edges
    }
}

impl Default for WarehouseGraph {
    fn default() -> Self {
        Self::reference()
    }
}
