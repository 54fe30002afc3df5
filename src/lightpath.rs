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

//! Module defining an established lightpath.

use serde::{Deserialize, Serialize};

use crate::types::{EonError, LightPathId, LinkId, NodeId, PCycleId, Slot};

/// An established optical connection, realizing one accepted flow. Lightpaths are owned by the
/// [`crate::virtual_topology::VirtualTopology`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightPath {
    id: LightPathId,
    src: NodeId,
    dst: NodeId,
    links: Vec<LinkId>,
    slots: Vec<Slot>,
    modulation: usize,
    p_cycle: Option<PCycleId>,
    be_protected_by: Vec<PCycleId>,
}

impl LightPath {
    /// Create a new lightpath. It must traverse at least one link.
    pub fn new(
        id: LightPathId,
        src: NodeId,
        dst: NodeId,
        links: Vec<LinkId>,
        slots: Vec<Slot>,
        modulation: usize,
        p_cycle: Option<PCycleId>,
    ) -> Result<Self, EonError> {
        if links.is_empty() {
            return Err(EonError::InvalidLightPath(format!(
                "lightpath {id} from {src} to {dst} has no links"
            )));
        }
        Ok(Self {
            id,
            src,
            dst,
            links,
            slots,
            modulation,
            p_cycle,
            be_protected_by: Vec::new(),
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

    /// Ordered sequence of links
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Slots reserved on every link
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Modulation level
    pub fn modulation(&self) -> usize {
        self.modulation
    }

    /// The p-cycle protecting this lightpath
    pub fn p_cycle(&self) -> Option<PCycleId> {
        self.p_cycle
    }

    /// All p-cycles for which this lightpath is a backup candidate
    pub fn be_protected_by(&self) -> &[PCycleId] {
        &self.be_protected_by
    }

    pub(crate) fn set_p_cycle(&mut self, p_cycle: Option<PCycleId>) {
        self.p_cycle = p_cycle;
    }

    pub(crate) fn set_route(&mut self, links: Vec<LinkId>, slots: Vec<Slot>) {
        self.links = links;
        self.slots = slots;
    }

    pub(crate) fn add_be_protected_by(&mut self, p_cycle: PCycleId) {
        if !self.be_protected_by.contains(&p_cycle) {
            self.be_protected_by.push(p_cycle);
        }
    }

    pub(crate) fn remove_be_protected_by(&mut self, p_cycle: PCycleId) {
        self.be_protected_by.retain(|c| *c != p_cycle);
    }
}
