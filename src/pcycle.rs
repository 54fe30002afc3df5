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

//! Protection cycles (p-cycles) and the protection records of the lightpaths they protect.
//!
//! A p-cycle reserves a contiguous band of slots on a single core, on every one of its links. The
//! band is shared by all lightpaths protected by the cycle. How wide the band must be is decided
//! by the [`SharingPolicy`].

use std::collections::{BTreeMap, BTreeSet};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    spectrum::band_range,
    types::{EonError, LightPathId, LinkId, NodeId, PCycleId, Slot},
};

/// How protected lightpaths share the band of a p-cycle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SharingPolicy {
    /// The band must be at least as wide as the sum of all protected demands.
    #[default]
    Additive,
    /// Only lightpaths that share a link can fail together. The band must be at least as wide as
    /// the largest sum of demands protected on any single link.
    Shared,
}

/// The protection-facing view of a lightpath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectingLightPath {
    id: LightPathId,
    src: NodeId,
    dst: NodeId,
    links: Vec<LinkId>,
    fss: usize,
    backup_paths: Vec<Vec<LinkId>>,
}

impl ProtectingLightPath {
    /// Create a new record. The lightpath must traverse at least one link.
    pub fn new(
        id: LightPathId,
        src: NodeId,
        dst: NodeId,
        links: Vec<LinkId>,
        fss: usize,
        backup_paths: Vec<Vec<LinkId>>,
    ) -> Result<Self, EonError> {
        if links.is_empty() {
            return Err(EonError::InvalidLightPath(format!(
                "protected lightpath {id} has no links"
            )));
        }
        Ok(Self {
            id,
            src,
            dst,
            links,
            fss,
            backup_paths,
        })
    }

    /// Id of the lightpath
    pub fn id(&self) -> LightPathId {
        self.id
    }

    /// Source node
    pub fn source(&self) -> NodeId {
        self.src
    }

    /// Destination node
    pub fn destination(&self) -> NodeId {
        self.dst
    }

    /// Links of the working path
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Number of slots required by the lightpath
    pub fn fss(&self) -> usize {
        self.fss
    }

    /// Alternative link sequences that can carry the traffic on a failure
    pub fn backup_paths(&self) -> &[Vec<LinkId>] {
        &self.backup_paths
    }

    /// Check if two working paths share a link.
    pub fn shares_link_with(&self, links: &[LinkId]) -> bool {
        self.links.iter().any(|l| links.contains(l))
    }
}

/// A protection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PCycle {
    id: PCycleId,
    cycle_links: Vec<LinkId>,
    nodes: BTreeSet<NodeId>,
    slots: Vec<Slot>,
    protected: Vec<ProtectingLightPath>,
    id_links: BTreeMap<LinkId, Vec<LightPathId>>,
    be_protection: Vec<ProtectingLightPath>,
}

impl PCycle {
    /// Create a new p-cycle over the given links and nodes, reserving the band `slots`. The id is
    /// assigned when the cycle is registered in the virtual topology.
    pub fn new(
        cycle_links: Vec<LinkId>,
        nodes: impl IntoIterator<Item = NodeId>,
        slots: Vec<Slot>,
    ) -> Self {
        Self {
            id: 0,
            cycle_links,
            nodes: nodes.into_iter().collect(),
            slots,
            protected: Vec::new(),
            id_links: BTreeMap::new(),
            be_protection: Vec::new(),
        }
    }

    /// Id of the p-cycle
    pub fn id(&self) -> PCycleId {
        self.id
    }

    /// Links of the cycle
    pub fn cycle_links(&self) -> &[LinkId] {
        &self.cycle_links
    }

    /// Nodes of the cycle
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    /// Band reserved on every cycle link
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Width of the reserved band
    pub fn reserved_slots(&self) -> usize {
        self.slots.len()
    }

    /// Core, first and last slot of the band.
    pub fn core_slot_range(&self) -> Option<(usize, usize, usize)> {
        band_range(&self.slots)
    }

    /// All protected lightpaths
    pub fn protected_lightpaths(&self) -> &[ProtectingLightPath] {
        &self.protected
    }

    /// Index from link id to the protected lightpaths using that link.
    pub fn id_links(&self) -> &BTreeMap<LinkId, Vec<LightPathId>> {
        &self.id_links
    }

    /// Mutually disjoint backup candidates.
    pub fn be_protection(&self) -> &[ProtectingLightPath] {
        &self.be_protection
    }

    /// Check if both endpoints of a flow are part of the cycle.
    pub fn contains_flow(&self, src: NodeId, dst: NodeId) -> bool {
        self.nodes.contains(&src) && self.nodes.contains(&dst)
    }

    /// A lightpath is on the cycle if it uses any of the cycle links.
    pub fn check_lp_on_cycle(&self, links: &[LinkId]) -> bool {
        links.iter().any(|l| self.cycle_links.contains(l))
    }

    /// Check if the lightpath is protected by this cycle.
    pub fn protects(&self, id: LightPathId) -> bool {
        self.protected.iter().any(|p| p.id == id)
    }

    /// Check if the band is at least `required` slots wide.
    pub fn has_sufficient_slots(&self, required: usize) -> bool {
        self.reserved_slots() >= required
    }

    /// Check if the working path is disjoint from all protected lightpaths.
    pub fn can_add_links_disjoint(&self, links: &[LinkId]) -> bool {
        self.protected.iter().all(|p| !p.shares_link_with(links))
    }

    /// Sum of all protected demands.
    pub fn protected_demand(&self) -> usize {
        self.protected.iter().map(|p| p.fss).sum()
    }

    /// Sum of the demands protected on a single link.
    pub fn link_load(&self, link: LinkId) -> usize {
        self.id_links
            .get(&link)
            .map(|ids| {
                self.protected
                    .iter()
                    .filter(|p| ids.contains(&p.id))
                    .map(|p| p.fss)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Largest sum of demands protected on any single link.
    pub fn max_link_load(&self) -> usize {
        self.id_links
            .keys()
            .map(|l| self.link_load(*l))
            .max()
            .unwrap_or(0)
    }

    /// Width of the band needed to additionally protect a lightpath with the given demand.
    pub fn required_band(&self, policy: SharingPolicy, demand: usize) -> usize {
        match policy {
            SharingPolicy::Additive => self.protected_demand() + demand,
            SharingPolicy::Shared => self.max_link_load().max(demand),
        }
    }

    /// Check if a new lightpath with the given demand may use `link`, assuming the band is
    /// `band` slots wide.
    pub fn admits(&self, policy: SharingPolicy, link: LinkId, demand: usize, band: usize) -> bool {
        match policy {
            SharingPolicy::Additive => true,
            SharingPolicy::Shared => self.link_load(link) + demand <= band,
        }
    }

    /// Check if the band is wide enough for all protected lightpaths.
    pub fn is_capacity_consistent(&self, policy: SharingPolicy) -> bool {
        self.reserved_slots() >= self.required_band(policy, 0)
    }

    pub(crate) fn set_id(&mut self, id: PCycleId) {
        self.id = id;
    }

    pub(crate) fn set_slots(&mut self, slots: Vec<Slot>) {
        self.slots = slots;
    }

    pub(crate) fn add_protected_lightpath(&mut self, lightpath: ProtectingLightPath) {
        for link in &lightpath.links {
            let ids = self.id_links.entry(*link).or_default();
            if !ids.contains(&lightpath.id) {
                ids.push(lightpath.id);
            }
        }
        self.protected.push(lightpath);
    }

    pub(crate) fn remove_protected_lightpath(&mut self, id: LightPathId) -> Option<ProtectingLightPath> {
        let pos = self.protected.iter().position(|p| p.id == id)?;
        let removed = self.protected.remove(pos);
        self.id_links.retain(|_, ids| {
            ids.retain(|x| *x != id);
            !ids.is_empty()
        });
        self.remove_be_protected(id);
        Some(removed)
    }

    /// Add a backup candidate, evicting all candidates that share a link with it. Returns the ids
    /// of the evicted lightpaths.
    pub(crate) fn add_lp_to_be_protected(&mut self, lightpath: ProtectingLightPath) -> Vec<LightPathId> {
        let mut evicted = Vec::new();
        self.be_protection.retain(|p| {
            if p.id == lightpath.id || p.shares_link_with(&lightpath.links) {
                evicted.push(p.id);
                false
            } else {
                true
            }
        });
        evicted.retain(|x| *x != lightpath.id);
        self.be_protection.push(lightpath);
        evicted
    }

    pub(crate) fn remove_be_protected(&mut self, id: LightPathId) {
        self.be_protection.retain(|p| p.id != id);
    }
}
