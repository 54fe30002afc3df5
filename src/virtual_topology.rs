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

//! The virtual topology: all established lightpaths and the p-cycles protecting them.
//!
//! Lightpaths are stored as edges of a multigraph over the physical nodes. Two lightpaths may
//! connect the same pair of nodes. Every structure created here holds its spectrum on the
//! [`PhysicalTopology`]: creating a lightpath or a p-cycle reserves its slots, and removing it
//! releases them again.

use std::collections::{BTreeMap, HashSet};

use log::{debug, trace};
use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex, StableUnGraph},
    visit::EdgeRef,
};

use crate::{
    flow::Flow,
    lightpath::LightPath,
    pcycle::{PCycle, ProtectingLightPath},
    topology::PhysicalTopology,
    types::{EonError, LightPathId, LinkId, NodeId, PCycleId, Slot},
};

/// Registry of lightpaths and p-cycles.
#[derive(Debug, Clone)]
pub struct VirtualTopology {
    graph: StableUnGraph<NodeId, LightPath>,
    nodes: Vec<NodeIndex>,
    index: BTreeMap<LightPathId, EdgeIndex>,
    p_cycles: BTreeMap<PCycleId, PCycle>,
    next_lightpath_id: LightPathId,
    next_p_cycle_id: PCycleId,
}

impl VirtualTopology {
    /// Create an empty virtual topology over the nodes of the physical topology.
    pub fn new(pt: &PhysicalTopology) -> Self {
        let mut graph = StableUnGraph::default();
        let nodes = (0..pt.num_nodes()).map(|n| graph.add_node(n)).collect();
        Self {
            graph,
            nodes,
            index: BTreeMap::new(),
            p_cycles: BTreeMap::new(),
            next_lightpath_id: 0,
            next_p_cycle_id: 0,
        }
    }

    fn node(&self, n: NodeId) -> Result<NodeIndex, EonError> {
        self.nodes.get(n).copied().ok_or(EonError::NoSuchNode(n))
    }

    /// Number of established lightpaths
    pub fn num_light_paths(&self) -> usize {
        self.index.len()
    }

    /// Iterate over all lightpaths, ordered by their id.
    pub fn light_paths(&self) -> impl Iterator<Item = &LightPath> {
        self.index.values().filter_map(|e| self.graph.edge_weight(*e))
    }

    /// All lightpaths connecting the two nodes (in any direction).
    pub fn light_paths_between(&self, a: NodeId, b: NodeId) -> Vec<&LightPath> {
        let (Ok(a), Ok(b)) = (self.node(a), self.node(b)) else {
            return Vec::new();
        };
        let mut lps: Vec<&LightPath> = self
            .graph
            .edges(a)
            .filter(|e| (e.source(), e.target()) == (a, b) || (e.source(), e.target()) == (b, a))
            .map(|e| e.weight())
            .collect();
        lps.sort_by_key(|lp| lp.id());
        lps
    }

    /// Get a lightpath by its id.
    pub fn get_light_path(&self, id: LightPathId) -> Option<&LightPath> {
        self.index.get(&id).and_then(|e| self.graph.edge_weight(*e))
    }

    fn light_path_mut(&mut self, id: LightPathId) -> Result<&mut LightPath, EonError> {
        let e = *self.index.get(&id).ok_or(EonError::UnknownLightPath(id))?;
        self.graph
            .edge_weight_mut(e)
            .ok_or(EonError::UnknownLightPath(id))
    }

    /// Check if all links have the slots available.
    pub fn can_create_light_path(
        &self,
        pt: &PhysicalTopology,
        links: &[LinkId],
        slots: &[Slot],
    ) -> Result<bool, EonError> {
        pt.are_slots_available_on_links(links, slots)
    }

    /// Establish a lightpath for the flow, reserving `slots` on every link.
    ///
    /// Returns `Ok(None)` if any link lacks the requested slots. In that case, nothing is
    /// changed, and the caller must treat the flow as blocked.
    pub fn create_light_path(
        &mut self,
        pt: &mut PhysicalTopology,
        flow: &Flow,
        links: &[LinkId],
        slots: &[Slot],
        modulation: usize,
        p_cycle: Option<PCycleId>,
    ) -> Result<Option<LightPathId>, EonError> {
        if links.is_empty() {
            return Err(EonError::InvalidLightPath(format!(
                "lightpath for flow {} has no links",
                flow.id()
            )));
        }
        if let Some(c) = p_cycle {
            if !self.p_cycles.contains_key(&c) {
                return Err(EonError::UnknownPCycle(c));
            }
        }
        let a = self.node(flow.source())?;
        let b = self.node(flow.destination())?;

        if !self.can_create_light_path(pt, links, slots)? {
            return Ok(None);
        }

        let id = self.next_lightpath_id;
        let lp = LightPath::new(
            id,
            flow.source(),
            flow.destination(),
            links.to_vec(),
            slots.to_vec(),
            modulation,
            p_cycle,
        )?;
        pt.reserve_on_links(links, slots)?;
        let e = self.graph.add_edge(a, b, lp);
        self.index.insert(id, e);
        self.next_lightpath_id += 1;
        trace!("created lightpath {id} for flow {} over {links:?}", flow.id());
        Ok(Some(id))
    }

    /// Remove a lightpath and release its slots. Returns `None` if the lightpath does not exist.
    ///
    /// The p-cycle bookkeeping is not touched, see [`VirtualTopology::remove_lp_p_cycle`].
    pub fn remove_light_path(
        &mut self,
        pt: &mut PhysicalTopology,
        id: LightPathId,
    ) -> Result<Option<LightPath>, EonError> {
        let Some(e) = self.index.get(&id).copied() else {
            return Ok(None);
        };
        let lp = self
            .graph
            .edge_weight(e)
            .ok_or_else(|| EonError::Inconsistent(format!("lightpath {id} is indexed but missing")))?;
        pt.release_on_links(lp.links(), lp.slots())?;
        self.index.remove(&id);
        let lp = self
            .graph
            .remove_edge(e)
            .ok_or_else(|| EonError::Inconsistent(format!("lightpath {id} is indexed but missing")))?;
        trace!("removed lightpath {id}");
        Ok(Some(lp))
    }

    /// Remove the lightpath from its p-cycle. If it is the last lightpath protected by the cycle,
    /// the band of the cycle is released and the cycle is discarded. The band is never shrunk.
    pub fn remove_lp_p_cycle(
        &mut self,
        pt: &mut PhysicalTopology,
        lightpath: &LightPath,
    ) -> Result<(), EonError> {
        for c in lightpath.be_protected_by() {
            if let Some(cycle) = self.p_cycles.get_mut(c) {
                cycle.remove_be_protected(lightpath.id());
            }
        }

        let Some(cid) = lightpath.p_cycle() else {
            return Ok(());
        };
        let cycle = self.p_cycles.get(&cid).ok_or(EonError::UnknownPCycle(cid))?;
        if !cycle.protects(lightpath.id()) {
            return Err(EonError::Inconsistent(format!(
                "lightpath {} refers to p-cycle {cid}, which does not protect it",
                lightpath.id()
            )));
        }

        if cycle.protected_lightpaths().len() == 1 {
            pt.release_on_links(cycle.cycle_links(), cycle.slots())?;
            if let Some(cycle) = self.p_cycles.remove(&cid) {
                for candidate in cycle.be_protection() {
                    if let Ok(lp) = self.light_path_mut(candidate.id()) {
                        lp.remove_be_protected_by(cid);
                    }
                }
            }
            debug!("p-cycle {cid} discarded");
        } else if let Some(cycle) = self.p_cycles.get_mut(&cid) {
            cycle.remove_protected_lightpath(lightpath.id());
        }
        Ok(())
    }

    /// Register a new p-cycle and reserve its band on every cycle link. Returns `Ok(None)` if any
    /// link lacks the band, without changing anything.
    pub fn add_p_cycle(
        &mut self,
        pt: &mut PhysicalTopology,
        mut cycle: PCycle,
    ) -> Result<Option<PCycleId>, EonError> {
        if cycle.cycle_links().is_empty() {
            return Err(EonError::InvalidLightPath("p-cycle without links".to_string()));
        }
        if !pt.are_slots_available_on_links(cycle.cycle_links(), cycle.slots())? {
            return Ok(None);
        }
        pt.reserve_on_links(cycle.cycle_links(), cycle.slots())?;
        let id = self.next_p_cycle_id;
        self.next_p_cycle_id += 1;
        cycle.set_id(id);
        debug!(
            "p-cycle {id} established over links {:?} with {} slots",
            cycle.cycle_links(),
            cycle.reserved_slots()
        );
        self.p_cycles.insert(id, cycle);
        Ok(Some(id))
    }

    /// Discard a p-cycle that does not protect any lightpath, releasing its band. Returns `None`
    /// if the cycle does not exist.
    pub fn remove_p_cycle(
        &mut self,
        pt: &mut PhysicalTopology,
        id: PCycleId,
    ) -> Result<Option<PCycle>, EonError> {
        let Some(cycle) = self.p_cycles.get(&id) else {
            return Ok(None);
        };
        if !cycle.protected_lightpaths().is_empty() {
            return Err(EonError::Inconsistent(format!(
                "p-cycle {id} still protects {} lightpaths",
                cycle.protected_lightpaths().len()
            )));
        }
        pt.release_on_links(cycle.cycle_links(), cycle.slots())?;
        let cycle = self.p_cycles.remove(&id);
        if let Some(c) = cycle.as_ref() {
            for candidate in c.be_protection() {
                if let Ok(lp) = self.light_path_mut(candidate.id()) {
                    lp.remove_be_protected_by(id);
                }
            }
        }
        debug!("p-cycle {id} discarded");
        Ok(cycle)
    }

    /// Iterate over all p-cycles, ordered by their id.
    pub fn p_cycles(&self) -> impl Iterator<Item = &PCycle> {
        self.p_cycles.values()
    }

    /// Ids of all p-cycles, in ascending order.
    pub fn p_cycle_ids(&self) -> Vec<PCycleId> {
        self.p_cycles.keys().copied().collect()
    }

    /// Get a p-cycle by its id.
    pub fn p_cycle(&self, id: PCycleId) -> Option<&PCycle> {
        self.p_cycles.get(&id)
    }

    /// Number of p-cycles
    pub fn num_p_cycles(&self) -> usize {
        self.p_cycles.len()
    }

    /// Move the band of a p-cycle to `band`. The old band is released first, such that the new
    /// band may overlap it. If the new band is not available on all cycle links, the old band is
    /// restored and `false` is returned. On an error, the old band is restored as well.
    pub fn resize_p_cycle(
        &mut self,
        pt: &mut PhysicalTopology,
        id: PCycleId,
        band: Vec<Slot>,
    ) -> Result<bool, EonError> {
        let cycle = self.p_cycles.get(&id).ok_or(EonError::UnknownPCycle(id))?;
        if cycle.slots() == band.as_slice() {
            return Ok(true);
        }
        let links = cycle.cycle_links().to_vec();
        let old = cycle.slots().to_vec();

        pt.release_on_links(&links, &old)?;
        let moved = move_reservation(pt, &links, &band);
        if !matches!(moved, Ok(true)) {
            pt.reserve_on_links(&links, &old)?;
            return moved;
        }
        if let Some(cycle) = self.p_cycles.get_mut(&id) {
            cycle.set_slots(band);
        }
        Ok(true)
    }

    /// Register the lightpath as protected by the p-cycle. A lightpath can only be protected by a
    /// single cycle. If its working path is disjoint from all lightpaths already protected by the
    /// cycle, it also becomes a backup candidate of the cycle.
    pub fn protect(
        &mut self,
        cycle: PCycleId,
        lightpath: LightPathId,
        backup_paths: Vec<Vec<LinkId>>,
    ) -> Result<(), EonError> {
        if !self.p_cycles.contains_key(&cycle) {
            return Err(EonError::UnknownPCycle(cycle));
        }
        let lp = self
            .get_light_path(lightpath)
            .ok_or(EonError::UnknownLightPath(lightpath))?;
        if let Some(owner) = self.p_cycles.values().find(|c| c.protects(lightpath)) {
            return Err(EonError::Inconsistent(format!(
                "lightpath {lightpath} is already protected by p-cycle {}",
                owner.id()
            )));
        }
        let record = ProtectingLightPath::new(
            lp.id(),
            lp.source(),
            lp.destination(),
            lp.links().to_vec(),
            lp.slots().len(),
            backup_paths,
        )?;

        let Some(c) = self.p_cycles.get_mut(&cycle) else {
            return Err(EonError::UnknownPCycle(cycle));
        };
        let disjoint = c.can_add_links_disjoint(record.links());
        c.add_protected_lightpath(record.clone());
        let evicted = if disjoint {
            c.add_lp_to_be_protected(record)
        } else {
            Vec::new()
        };

        for e in evicted {
            self.light_path_mut(e)?.remove_be_protected_by(cycle);
        }
        let lp = self.light_path_mut(lightpath)?;
        lp.set_p_cycle(Some(cycle));
        if disjoint {
            lp.add_be_protected_by(cycle);
        }
        Ok(())
    }

    /// Move a lightpath to a new route, keeping its id and its p-cycle. If the new slots are not
    /// available, the old route is restored and `false` is returned. An unknown link or an invalid
    /// slot in the new route restores the old route before the error is returned.
    pub fn reroute_light_path(
        &mut self,
        pt: &mut PhysicalTopology,
        id: LightPathId,
        links: &[LinkId],
        slots: &[Slot],
    ) -> Result<bool, EonError> {
        if links.is_empty() {
            return Err(EonError::InvalidLightPath(format!(
                "new route of lightpath {id} has no links"
            )));
        }
        let lp = self.get_light_path(id).ok_or(EonError::UnknownLightPath(id))?;
        let old_links = lp.links().to_vec();
        let old_slots = lp.slots().to_vec();
        let p_cycle = lp.p_cycle();
        let be_protected_by = lp.be_protected_by().to_vec();

        pt.release_on_links(&old_links, &old_slots)?;
        let moved = move_reservation(pt, links, slots);
        if !matches!(moved, Ok(true)) {
            pt.reserve_on_links(&old_links, &old_slots)?;
            return moved;
        }

        let lp = self.light_path_mut(id)?;
        lp.set_route(links.to_vec(), slots.to_vec());
        for c in &be_protected_by {
            lp.remove_be_protected_by(*c);
        }
        for c in be_protected_by {
            if let Some(cycle) = self.p_cycles.get_mut(&c) {
                cycle.remove_be_protected(id);
            }
        }
        if let Some(c) = p_cycle.and_then(|c| self.p_cycles.get_mut(&c)) {
            if let Some(old) = c.remove_protected_lightpath(id) {
                c.add_protected_lightpath(ProtectingLightPath::new(
                    id,
                    old.source(),
                    old.destination(),
                    links.to_vec(),
                    slots.len(),
                    old.backup_paths().to_vec(),
                )?);
            }
        }
        trace!("rerouted lightpath {id} over {links:?}");
        Ok(true)
    }

    /// Check that the physical reservations match exactly the slots held by all lightpaths and
    /// p-cycles, and that no slot is held twice on the same link.
    pub fn check_consistency(&self, pt: &PhysicalTopology) -> Result<(), EonError> {
        let mut held: HashSet<(LinkId, Slot)> = HashSet::new();
        let lightpaths = self.light_paths().map(|lp| (lp.links(), lp.slots()));
        let cycles = self.p_cycles().map(|c| (c.cycle_links(), c.slots()));
        for (links, slots) in lightpaths.chain(cycles) {
            for link in links {
                for slot in slots {
                    if !held.insert((*link, *slot)) {
                        return Err(EonError::SlotConflict {
                            link: *link,
                            slot: *slot,
                        });
                    }
                }
            }
        }
        for link in pt.links() {
            for slot in link.grid().reserved_slots() {
                if !held.remove(&(link.id, slot)) {
                    return Err(EonError::Inconsistent(format!(
                        "slot {slot} on link {} is reserved, but not held by anything",
                        link.id
                    )));
                }
            }
        }
        if let Some((link, slot)) = held.into_iter().next() {
            return Err(EonError::Inconsistent(format!(
                "slot {slot} on link {link} is held, but not reserved"
            )));
        }
        for cycle in self.p_cycles() {
            for p in cycle.protected_lightpaths() {
                let owner = self.get_light_path(p.id()).and_then(|lp| lp.p_cycle());
                if owner != Some(cycle.id()) {
                    return Err(EonError::Inconsistent(format!(
                        "p-cycle {} protects lightpath {}, which does not refer back to it",
                        cycle.id(),
                        p.id()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Reserve `slots` on `links` if they are free on all of them. Returns `Ok(false)` without
/// touching the spectrum if any slot is busy.
fn move_reservation(
    pt: &mut PhysicalTopology,
    links: &[LinkId],
    slots: &[Slot],
) -> Result<bool, EonError> {
    if !pt.are_slots_available_on_links(links, slots)? {
        return Ok(false);
    }
    pt.reserve_on_links(links, slots)?;
    Ok(true)
}
