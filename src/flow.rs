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

//! Module defining a flow, i.e., a connection request between two nodes.

use serde::{Deserialize, Serialize};

use crate::types::{EonError, FlowId, LinkId, NodeId, SimTime, Slot};

/// A connection request. The assignment (links, slots and modulation) is only populated once the
/// flow is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    id: FlowId,
    src: NodeId,
    dst: NodeId,
    time: SimTime,
    rate: u32,
    duration: SimTime,
    cos: u32,
    deadline: SimTime,
    accepted: bool,
    modulation: usize,
    links: Vec<LinkId>,
    slots: Vec<Slot>,
    groomed: bool,
}

impl Flow {
    /// Create a new flow. The rate must be at least 1, the duration must be finite and not
    /// negative, the arrival time must be finite, and source and destination must differ.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FlowId,
        src: NodeId,
        dst: NodeId,
        time: SimTime,
        rate: u32,
        duration: SimTime,
        cos: u32,
        deadline: SimTime,
    ) -> Result<Self, EonError> {
        if rate < 1 {
            return Err(EonError::InvalidFlow(format!("flow {id}: rate must be at least 1")));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(EonError::InvalidFlow(format!(
                "flow {id}: invalid duration {duration}"
            )));
        }
        if !time.is_finite() {
            return Err(EonError::InvalidFlow(format!("flow {id}: invalid time {time}")));
        }
        if src == dst {
            return Err(EonError::InvalidFlow(format!(
                "flow {id}: source and destination are both {src}"
            )));
        }
        Ok(Self {
            id,
            src,
            dst,
            time,
            rate,
            duration,
            cos,
            deadline,
            accepted: false,
            modulation: 0,
            links: Vec::new(),
            slots: Vec::new(),
            groomed: false,
        })
    }

    /// Id of the flow
    pub fn id(&self) -> FlowId {
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

    /// Arrival time
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Requested bandwidth
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Holding duration
    pub fn duration(&self) -> SimTime {
        self.duration
    }

    /// Class of service
    pub fn cos(&self) -> u32 {
        self.cos
    }

    /// Deadline until which the flow must be established
    pub fn deadline(&self) -> SimTime {
        self.deadline
    }

    /// Time at which the flow departs.
    pub fn departure_time(&self) -> SimTime {
        self.time + self.duration
    }

    /// Whether the flow was accepted
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Assigned modulation level
    pub fn modulation(&self) -> usize {
        self.modulation
    }

    /// Assigned links
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Assigned slots
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Whether the flow was groomed into an existing lightpath
    pub fn is_groomed(&self) -> bool {
        self.groomed
    }

    /// Store the assignment and mark the flow as accepted.
    pub(crate) fn assign(&mut self, links: Vec<LinkId>, slots: Vec<Slot>, modulation: usize) {
        self.links = links;
        self.slots = slots;
        self.modulation = modulation;
        self.accepted = true;
    }
}
