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

//! Module containing all type definitions shared by the simulator, together with the error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node identification (and index into the physical topology)
pub type NodeId = usize;
/// Identification of a physical link
pub type LinkId = usize;
/// Identification of a flow (connection request)
pub type FlowId = usize;
/// Identification of an established lightpath
pub type LightPathId = usize;
/// Identification of a protection cycle
pub type PCycleId = usize;
/// Simulated time in seconds
pub type SimTime = f64;

/// One frequency slot on one spatial core of a link.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Slot {
    /// Index of the core
    pub core: usize,
    /// Frequency index on that core
    pub slot: usize,
}

impl Slot {
    /// Create a new slot.
    pub const fn new(core: usize, slot: usize) -> Self {
        Self { core, slot }
    }

    /// Create the contiguous window `[start, start + len)` on a single core.
    pub fn window(core: usize, start: usize, len: usize) -> Vec<Slot> {
        (start..start + len).map(|slot| Slot { core, slot }).collect()
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.core, self.slot)
    }
}

impl From<(usize, usize)> for Slot {
    fn from((core, slot): (usize, usize)) -> Self {
        Self { core, slot }
    }
}

/// Errors of the simulator core.
///
/// Running out of capacity is never reported through this type. Capacity misses are returned as
/// `None` or `false` and drive the RSA strategy towards blocking the flow.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EonError {
    /// The two nodes are not connected by a physical link
    #[error("No link between node {0} and node {1}")]
    NoSuchEdge(NodeId, NodeId),
    /// The link id does not exist
    #[error("Link {0} does not exist")]
    NoSuchLink(LinkId),
    /// The node does not exist
    #[error("Node {0} does not exist")]
    NoSuchNode(NodeId),
    /// The topology description cannot be used to build a physical topology
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    /// A slot lies outside of the grid of a link
    #[error("Slot {slot} is out of range on link {link} ({cores} cores, {slots} slots)")]
    InvalidSlot {
        /// Link on which the slot was requested
        link: LinkId,
        /// Requested slot
        slot: Slot,
        /// Number of cores of the link
        cores: usize,
        /// Number of slots per core of the link
        slots: usize,
    },
    /// A slot was reserved twice
    #[error("Slot {slot} on link {link} is already reserved")]
    SlotConflict {
        /// Link on which the conflict happened
        link: LinkId,
        /// Slot that is already reserved
        slot: Slot,
    },
    /// The flow is not known to the control plane
    #[error("Unknown flow: {0}")]
    UnknownFlow(FlowId),
    /// The lightpath is not known to the virtual topology
    #[error("Unknown lightpath: {0}")]
    UnknownLightPath(LightPathId),
    /// The p-cycle is not known to the virtual topology
    #[error("Unknown p-cycle: {0}")]
    UnknownPCycle(PCycleId),
    /// The parameters of a flow are not valid
    #[error("Invalid flow parameters: {0}")]
    InvalidFlow(String),
    /// The parameters of a lightpath are not valid
    #[error("Invalid lightpath: {0}")]
    InvalidLightPath(String),
    /// An event was scheduled at a time that is not a number
    #[error("Invalid event time: {0}")]
    InvalidTime(SimTime),
    /// The physical and virtual state no longer agree
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),
}
