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

//! The control plane orchestrates the lifecycle of flows.
//!
//! It is the single writer of the physical reservations and of the virtual topology. RSA
//! strategies receive a mutable reference to the control plane and change the network only
//! through its methods, which keeps the physical and the virtual state consistent.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    event::Event,
    flow::Flow,
    lightpath::LightPath,
    observer::{RunStats, SimulationObserver},
    pcycle::PCycle,
    rsa::Rsa,
    topology::PhysicalTopology,
    types::{EonError, FlowId, LightPathId, LinkId, PCycleId, Slot},
    virtual_topology::VirtualTopology,
};

/// Control plane of a single simulation run.
#[derive(Debug, Clone)]
pub struct ControlPlane<O = RunStats> {
    pt: PhysicalTopology,
    vt: VirtualTopology,
    active_flows: HashMap<FlowId, Flow>,
    mapped_flows: HashMap<FlowId, LightPathId>,
    observer: O,
    requests: usize,
    accepted_requests: usize,
    processed_departures: usize,
}

impl<O: SimulationObserver> ControlPlane<O> {
    /// Create a new control plane on an (empty) physical topology.
    pub fn new(pt: PhysicalTopology, observer: O) -> Self {
        let vt = VirtualTopology::new(&pt);
        Self {
            pt,
            vt,
            active_flows: HashMap::new(),
            mapped_flows: HashMap::new(),
            observer,
            requests: 0,
            accepted_requests: 0,
            processed_departures: 0,
        }
    }

    /// The physical topology
    pub fn pt(&self) -> &PhysicalTopology {
        &self.pt
    }

    /// The virtual topology
    pub fn vt(&self) -> &VirtualTopology {
        &self.vt
    }

    /// The observer
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Consume the control plane and return its observer.
    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Get an active flow.
    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.active_flows.get(&id)
    }

    /// All active flows, i.e., flows that arrived and neither departed nor were blocked.
    pub fn active_flows(&self) -> &HashMap<FlowId, Flow> {
        &self.active_flows
    }

    /// Mapping from accepted flows to the lightpath carrying them.
    pub fn mapped_flows(&self) -> &HashMap<FlowId, LightPathId> {
        &self.mapped_flows
    }

    /// The lightpath carrying an accepted flow.
    pub fn path(&self, id: FlowId) -> Option<&LightPath> {
        self.mapped_flows
            .get(&id)
            .and_then(|lp| self.vt.get_light_path(*lp))
    }

    /// Number of processed arrivals
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Number of accepted flows
    pub fn accepted_requests(&self) -> usize {
        self.accepted_requests
    }

    /// Number of processed departures
    pub fn processed_departures(&self) -> usize {
        self.processed_departures
    }

    /// Process a single event.
    ///
    /// On arrival, the flow is registered and handed to the RSA strategy, which either accepts or
    /// blocks it. On departure, all resources of the flow are released before the strategy is
    /// notified.
    pub fn new_event<R: Rsa>(&mut self, rsa: &mut R, event: Event) -> Result<(), EonError> {
        match &event {
            Event::Arrival { flow, .. } => {
                let id = flow.id();
                if self.active_flows.contains_key(&id) {
                    return Err(EonError::Inconsistent(format!("flow {id} arrived twice")));
                }
                self.observer.on_arrival(&event);
                self.active_flows.insert(id, flow.clone());
                rsa.flow_arrival(id, self)?;
                self.requests += 1;
            }
            Event::Departure { flow, .. } => {
                let removed = self.remove_flow(*flow)?;
                self.observer.on_departure(&event);
                rsa.flow_departure(removed.as_ref(), self)?;
                self.processed_departures += 1;
            }
        }
        Ok(())
    }

    /// Bind an active flow to an established lightpath.
    ///
    /// The slots are reserved when the lightpath is created. This function only checks that the
    /// lightpath still holds its slots on all links, and returns `false` otherwise (or if the flow
    /// is already mapped, or the lightpath carries another flow).
    pub fn accept_flow(
        &mut self,
        id: FlowId,
        lightpath: LightPathId,
        reused: bool,
    ) -> Result<bool, EonError> {
        if !self.active_flows.contains_key(&id) {
            return Err(EonError::UnknownFlow(id));
        }
        let lp = self
            .vt
            .get_light_path(lightpath)
            .ok_or(EonError::UnknownLightPath(lightpath))?;
        if self.mapped_flows.contains_key(&id) {
            warn!("flow {id} is already mapped");
            return Ok(false);
        }
        if self.mapped_flows.values().any(|x| *x == lightpath) {
            warn!("lightpath {lightpath} already carries another flow");
            return Ok(false);
        }
        if !self.pt.are_slots_reserved_on_links(lp.links(), lp.slots())? {
            warn!("lightpath {lightpath} does not hold its slots");
            return Ok(false);
        }

        let flow = self
            .active_flows
            .get_mut(&id)
            .ok_or(EonError::UnknownFlow(id))?;
        flow.assign(lp.links().to_vec(), lp.slots().to_vec(), lp.modulation());
        self.mapped_flows.insert(id, lightpath);
        self.observer.on_accept(flow, lp, reused);
        self.accepted_requests += 1;
        Ok(true)
    }

    /// Block an active flow. Returns `false` if the flow is already mapped, or if it is not
    /// active (anymore).
    pub fn block_flow(&mut self, id: FlowId) -> Result<bool, EonError> {
        if self.mapped_flows.contains_key(&id) {
            return Ok(false);
        }
        let Some(flow) = self.active_flows.remove(&id) else {
            return Ok(false);
        };
        self.observer.on_block(&flow);
        Ok(true)
    }

    /// Move a mapped flow to a new route. The old slots are released before the new ones are
    /// checked. If the new route cannot be established, the old one is restored and `false` is
    /// returned. Errors leave the old route in place as well.
    pub fn reroute_flow(
        &mut self,
        id: FlowId,
        links: &[LinkId],
        slots: &[Slot],
    ) -> Result<bool, EonError> {
        if !self.active_flows.contains_key(&id) {
            return Ok(false);
        }
        let Some(lp) = self.mapped_flows.get(&id).copied() else {
            return Ok(false);
        };
        if !self.vt.reroute_light_path(&mut self.pt, lp, links, slots)? {
            debug!("cannot reroute flow {id}");
            return Ok(false);
        }
        if let Some(flow) = self.active_flows.get_mut(&id) {
            let modulation = flow.modulation();
            flow.assign(links.to_vec(), slots.to_vec(), modulation);
        }
        Ok(true)
    }

    /// Remove a flow, releasing its lightpath and the p-cycle bookkeeping. Returns `None` if the
    /// flow is not active, e.g., because it was blocked.
    pub fn remove_flow(&mut self, id: FlowId) -> Result<Option<Flow>, EonError> {
        let Some(flow) = self.active_flows.remove(&id) else {
            return Ok(None);
        };
        if let Some(lp) = self.mapped_flows.remove(&id) {
            self.discard_light_path(lp)?;
        }
        Ok(Some(flow))
    }

    /// Establish a lightpath for an active flow. See [`VirtualTopology::create_light_path`].
    pub fn create_light_path(
        &mut self,
        flow: FlowId,
        links: &[LinkId],
        slots: &[Slot],
        modulation: usize,
        p_cycle: Option<PCycleId>,
    ) -> Result<Option<LightPathId>, EonError> {
        let flow = self
            .active_flows
            .get(&flow)
            .ok_or(EonError::UnknownFlow(flow))?;
        self.vt
            .create_light_path(&mut self.pt, flow, links, slots, modulation, p_cycle)
    }

    /// Remove a lightpath together with its p-cycle bookkeeping.
    pub fn discard_light_path(&mut self, id: LightPathId) -> Result<(), EonError> {
        let lp = self
            .vt
            .remove_light_path(&mut self.pt, id)?
            .ok_or(EonError::UnknownLightPath(id))?;
        self.vt.remove_lp_p_cycle(&mut self.pt, &lp)
    }

    /// Register a new p-cycle, reserving its band. See [`VirtualTopology::add_p_cycle`].
    pub fn establish_p_cycle(&mut self, cycle: PCycle) -> Result<Option<PCycleId>, EonError> {
        self.vt.add_p_cycle(&mut self.pt, cycle)
    }

    /// Discard a p-cycle that protects nothing.
    pub fn discard_p_cycle(&mut self, id: PCycleId) -> Result<(), EonError> {
        self.vt.remove_p_cycle(&mut self.pt, id).map(|_| ())
    }

    /// Move the band of a p-cycle. See [`VirtualTopology::resize_p_cycle`].
    pub fn resize_p_cycle(&mut self, id: PCycleId, band: Vec<Slot>) -> Result<bool, EonError> {
        self.vt.resize_p_cycle(&mut self.pt, id, band)
    }

    /// Register a lightpath as protected by a p-cycle. See [`VirtualTopology::protect`].
    pub fn protect(
        &mut self,
        cycle: PCycleId,
        lightpath: LightPathId,
        backup_paths: Vec<Vec<LinkId>>,
    ) -> Result<(), EonError> {
        self.vt.protect(cycle, lightpath, backup_paths)
    }

    /// Check that the physical and the virtual state agree, and that every mapped flow is
    /// carried by an existing lightpath.
    pub fn check_consistency(&self) -> Result<(), EonError> {
        self.vt.check_consistency(&self.pt)?;
        for (flow, lp) in &self.mapped_flows {
            if !self.active_flows.contains_key(flow) {
                return Err(EonError::Inconsistent(format!("mapped flow {flow} is not active")));
            }
            if self.vt.get_light_path(*lp).is_none() {
                return Err(EonError::Inconsistent(format!(
                    "flow {flow} is mapped to the missing lightpath {lp}"
                )));
            }
        }
        if self.mapped_flows.len() != self.vt.num_light_paths() {
            return Err(EonError::Inconsistent(format!(
                "{} mapped flows, but {} lightpaths",
                self.mapped_flows.len(),
                self.vt.num_light_paths()
            )));
        }
        Ok(())
    }
}
