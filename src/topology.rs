// eonsim: Discrete-event simulator for elastic optical networks with p-cycle protection
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module containing the physical topology: nodes, links, and the spectrum of every link.
//!
//! The physical topology exclusively owns the spectrum state of all links. Link weight, delay and
//! distance are static, only the reservation state changes while the simulation runs.

use std::collections::BTreeMap;

use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::{
    spectrum::{full_matrix, image_and, SpectrumGrid, SpectrumMatrix},
    types::{EonError, LinkId, NodeId, Slot},
};

/// Description of a single physical link, as it is read from the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Unique id of the link
    pub id: LinkId,
    /// One endpoint
    pub src: NodeId,
    /// The other endpoint
    pub dst: NodeId,
    /// Propagation delay
    #[serde(default = "default_one")]
    pub delay: f64,
    /// Routing weight
    #[serde(default = "default_one")]
    pub weight: f64,
    /// Physical length
    #[serde(default = "default_one")]
    pub distance: f64,
}

fn default_one() -> f64 {
    1.0
}

impl LinkSpec {
    /// Create a link with unit delay, weight and distance.
    pub fn new(id: LinkId, src: NodeId, dst: NodeId) -> Self {
        Self {
            id,
            src,
            dst,
            delay: 1.0,
            weight: 1.0,
            distance: 1.0,
        }
    }

    /// Set the routing weight.
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A physical link with its spectrum.
#[derive(Debug, Clone)]
pub struct Link {
    /// Id of the link
    pub id: LinkId,
    /// One endpoint
    pub src: NodeId,
    /// The other endpoint
    pub dst: NodeId,
    /// Propagation delay
    pub delay: f64,
    /// Routing weight
    pub weight: f64,
    /// Physical length
    pub distance: f64,
    grid: SpectrumGrid,
}

impl Link {
    /// Spectrum occupancy of the link
    pub fn grid(&self) -> &SpectrumGrid {
        &self.grid
    }
}

/// The physical network. Links are undirected, and there is at most one link between every pair
/// of nodes.
#[derive(Debug, Clone)]
pub struct PhysicalTopology {
    num_nodes: usize,
    cores: usize,
    slots: usize,
    slot_capacity: f64,
    graph: UnGraphMap<NodeId, LinkId>,
    links: BTreeMap<LinkId, Link>,
}

impl PhysicalTopology {
    /// Build the topology from its link descriptions. Every link gets `cores x slots` free slots.
    /// `slot_capacity` is the bandwidth carried by a single slot.
    pub fn new(
        num_nodes: usize,
        cores: usize,
        slots: usize,
        slot_capacity: f64,
        links: impl IntoIterator<Item = LinkSpec>,
    ) -> Result<Self, EonError> {
        if cores == 0 || slots == 0 {
            return Err(EonError::InvalidTopology(format!(
                "links need at least one core and one slot (got {cores} cores, {slots} slots)"
            )));
        }
        if slot_capacity.is_nan() || slot_capacity <= 0.0 {
            return Err(EonError::InvalidTopology(format!(
                "slot capacity must be positive (got {slot_capacity})"
            )));
        }

        let mut graph = UnGraphMap::new();
        for n in 0..num_nodes {
            graph.add_node(n);
        }
        let mut topo_links = BTreeMap::new();
        for desc in links {
            for n in [desc.src, desc.dst] {
                if n >= num_nodes {
                    return Err(EonError::NoSuchNode(n));
                }
            }
            if desc.src == desc.dst {
                return Err(EonError::InvalidTopology(format!(
                    "link {} is a self-loop on node {}",
                    desc.id, desc.src
                )));
            }
            if topo_links.contains_key(&desc.id) {
                return Err(EonError::InvalidTopology(format!(
                    "link id {} is used twice",
                    desc.id
                )));
            }
            if graph.contains_edge(desc.src, desc.dst) {
                return Err(EonError::InvalidTopology(format!(
                    "nodes {} and {} are connected twice",
                    desc.src, desc.dst
                )));
            }
            graph.add_edge(desc.src, desc.dst, desc.id);
            topo_links.insert(
                desc.id,
                Link {
                    id: desc.id,
                    src: desc.src,
                    dst: desc.dst,
                    delay: desc.delay,
                    weight: desc.weight,
                    distance: desc.distance,
                    grid: SpectrumGrid::new(desc.id, cores, slots),
                },
            );
        }

        Ok(Self {
            num_nodes,
            cores,
            slots,
            slot_capacity,
            graph,
            links: topo_links,
        })
    }

    /// Create a ring of `n` nodes, where link `i` connects node `i` with node `i + 1 (mod n)`.
    pub fn ring(n: usize, cores: usize, slots: usize, slot_capacity: f64) -> Result<Self, EonError> {
        Self::new(
            n,
            cores,
            slots,
            slot_capacity,
            (0..n).map(|i| LinkSpec::new(i, i, (i + 1) % n)),
        )
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of links
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Number of cores on each link
    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Number of slots on each core
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Bandwidth of a single slot
    pub fn slot_capacity(&self) -> f64 {
        self.slot_capacity
    }

    /// Number of contiguous slots needed to carry the given rate.
    pub fn demand_in_slots(&self, rate: f64) -> usize {
        (rate / self.slot_capacity).ceil() as usize
    }

    /// Iterate over all links, ordered by their id.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get a link by its id.
    pub fn link(&self, id: LinkId) -> Result<&Link, EonError> {
        self.links.get(&id).ok_or(EonError::NoSuchLink(id))
    }

    fn link_mut(&mut self, id: LinkId) -> Result<&mut Link, EonError> {
        self.links.get_mut(&id).ok_or(EonError::NoSuchLink(id))
    }

    /// Get the id of the link between `src` and `dst`.
    pub fn link_id(&self, src: NodeId, dst: NodeId) -> Result<LinkId, EonError> {
        self.graph
            .edge_weight(src, dst)
            .copied()
            .ok_or(EonError::NoSuchEdge(src, dst))
    }

    /// Get both endpoints of a link.
    pub fn link_endpoints(&self, id: LinkId) -> Result<(NodeId, NodeId), EonError> {
        self.link(id).map(|l| (l.src, l.dst))
    }

    /// Translate a node path into the sequence of links it traverses.
    pub fn path_to_links(&self, path: &[NodeId]) -> Result<Vec<LinkId>, EonError> {
        path.windows(2).map(|w| self.link_id(w[0], w[1])).collect()
    }

    /// All neighbors of a node together with the connecting link, ordered by the neighbor id.
    pub fn adjacent(&self, node: NodeId) -> Vec<(NodeId, LinkId)> {
        if !self.graph.contains_node(node) {
            return Vec::new();
        }
        let mut adj: Vec<(NodeId, LinkId)> =
            self.graph.edges(node).map(|(_, m, l)| (m, *l)).collect();
        adj.sort_unstable();
        adj
    }

    /// Check that none of the slots is reserved on the link between `src` and `dst`.
    pub fn are_slots_available(
        &self,
        src: NodeId,
        dst: NodeId,
        slots: &[Slot],
    ) -> Result<bool, EonError> {
        self.are_slots_available_on_link(self.link_id(src, dst)?, slots)
    }

    /// Reserve the slots on the link between `src` and `dst`.
    pub fn reserve_slots(&mut self, src: NodeId, dst: NodeId, slots: &[Slot]) -> Result<(), EonError> {
        let id = self.link_id(src, dst)?;
        self.link_mut(id)?.grid.reserve(slots)
    }

    /// Release the slots on the link between `src` and `dst`.
    pub fn release_slots(&mut self, src: NodeId, dst: NodeId, slots: &[Slot]) -> Result<(), EonError> {
        let id = self.link_id(src, dst)?;
        self.link_mut(id)?.grid.release(slots)
    }

    /// Check that none of the slots is reserved on the given link.
    pub fn are_slots_available_on_link(&self, id: LinkId, slots: &[Slot]) -> Result<bool, EonError> {
        self.link(id)?.grid.are_available(slots)
    }

    /// Check that none of the slots is reserved on any of the links.
    pub fn are_slots_available_on_links(
        &self,
        links: &[LinkId],
        slots: &[Slot],
    ) -> Result<bool, EonError> {
        for link in links {
            if !self.are_slots_available_on_link(*link, slots)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check that all slots are reserved on every one of the links.
    pub fn are_slots_reserved_on_links(
        &self,
        links: &[LinkId],
        slots: &[Slot],
    ) -> Result<bool, EonError> {
        for link in links {
            let grid = &self.link(*link)?.grid;
            for s in slots {
                if grid.are_available(&[*s])? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Reserve the slots on every one of the links. Either all links are reserved, or none.
    pub fn reserve_on_links(&mut self, links: &[LinkId], slots: &[Slot]) -> Result<(), EonError> {
        for (i, link) in links.iter().enumerate() {
            let result = self.link_mut(*link).and_then(|l| l.grid.reserve(slots));
            if let Err(e) = result {
                for done in &links[..i] {
                    self.link_mut(*done)?.grid.release(slots)?;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Release the slots on every one of the links.
    pub fn release_on_links(&mut self, links: &[LinkId], slots: &[Slot]) -> Result<(), EonError> {
        for link in links {
            self.link(*link)?.grid.are_available(slots)?;
        }
        for link in links {
            self.link_mut(*link)?.grid.release(slots)?;
        }
        Ok(())
    }

    /// Spectrum matrix of the link between `src` and `dst` (`true` = free).
    pub fn spectrum(&self, src: NodeId, dst: NodeId) -> Result<SpectrumMatrix, EonError> {
        self.spectrum_of(self.link_id(src, dst)?)
    }

    /// Spectrum matrix of the given link (`true` = free).
    pub fn spectrum_of(&self, id: LinkId) -> Result<SpectrumMatrix, EonError> {
        Ok(self.link(id)?.grid.spectrum_matrix())
    }

    /// Bitmap AND of the spectrum of all given links: a slot is free only if it is free on every
    /// link.
    pub fn path_spectrum(&self, links: &[LinkId]) -> Result<SpectrumMatrix, EonError> {
        let mut acc = full_matrix(self.cores, self.slots);
        for link in links {
            image_and(&mut acc, &self.spectrum_of(*link)?);
        }
        Ok(acc)
    }

    /// Graph with the routing weight as the only edge attribute.
    pub fn weighted_view(&self) -> UnGraphMap<NodeId, f64> {
        let mut g = UnGraphMap::new();
        for n in self.graph.nodes() {
            g.add_node(n);
        }
        for link in self.links.values() {
            g.add_edge(link.src, link.dst, link.weight);
        }
        g
    }

    /// Fragmentation of every link.
    pub fn fragmentation_per_link(&self) -> BTreeMap<LinkId, f64> {
        self.links
            .values()
            .map(|l| (l.id, l.grid.fragmentation()))
            .collect()
    }

    /// Mean fragmentation over all links.
    pub fn mean_fragmentation(&self) -> f64 {
        if self.links.is_empty() {
            return 0.0;
        }
        self.links.values().map(|l| l.grid.fragmentation()).sum::<f64>() / self.links.len() as f64
    }

    /// Number of free slots on every link.
    pub fn free_slots_per_link(&self) -> BTreeMap<LinkId, usize> {
        self.links
            .values()
            .map(|l| (l.id, l.grid.free_count()))
            .collect()
    }

    /// Number of free slots in the entire network.
    pub fn free_slot_count(&self) -> usize {
        self.links.values().map(|l| l.grid.free_count()).sum()
    }
}
