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

//! Failure-independent path protection with p-cycles, and BFS working paths.
//!
//! For every arriving flow, the strategy first tries to reuse an existing p-cycle that contains
//! both endpoints. If the band of that cycle is too narrow, it is widened (or moved). Then a
//! working path is searched with per-window BFS. If no cycle can be reused, two edge-disjoint
//! paths form a new cycle. If that fails as well, the flow is blocked.
//!
//! A failed attempt never leaves any trace: a widened band is moved back before the next cycle is
//! tried.

use itertools::Itertools;
use log::{debug, trace};

use crate::{
    control_plane::ControlPlane,
    observer::SimulationObserver,
    pcycle::{PCycle, SharingPolicy},
    routing::edge_disjoint_pair,
    spectrum::{claim, extend_or_replace, first_fit, unclaim},
    types::{EonError, FlowId, LinkId, NodeId, PCycleId, Slot},
};

use super::{request, working_path, Rsa};

/// p-cycle protection with per-window BFS working paths.
#[derive(Debug, Clone, Default)]
pub struct FippBfs {
    sharing: SharingPolicy,
}

/// A freshly computed p-cycle together with the working path it protects.
struct NewCycle {
    cycle: PCycle,
    working: Vec<LinkId>,
    slots: Vec<Slot>,
    backup: Vec<LinkId>,
}

impl FippBfs {
    /// Create the strategy with the given sharing policy.
    pub fn new(sharing: SharingPolicy) -> Self {
        Self { sharing }
    }

    /// The sharing policy
    pub fn sharing(&self) -> SharingPolicy {
        self.sharing
    }

    /// Try to protect the flow with an existing p-cycle. Returns `true` if the flow was accepted.
    fn try_reuse<O: SimulationObserver>(
        &self,
        cp: &mut ControlPlane<O>,
        flow: FlowId,
        cycle_id: PCycleId,
        (src, dst, demand): (NodeId, NodeId, usize),
    ) -> Result<bool, EonError> {
        let cycle = cp
            .vt()
            .p_cycle(cycle_id)
            .ok_or(EonError::UnknownPCycle(cycle_id))?;
        let old_band = cycle.slots().to_vec();
        let target = cycle.required_band(self.sharing, demand);

        let band = if cycle.has_sufficient_slots(target) {
            old_band.clone()
        } else {
            let mut spectrum = cp.pt().path_spectrum(cycle.cycle_links())?;
            unclaim(&mut spectrum, &old_band);
            match extend_or_replace(&spectrum, &old_band, target) {
                Some(band) => band,
                None => {
                    trace!("p-cycle {cycle_id} cannot grow to {target} slots");
                    return Ok(false);
                }
            }
        };

        if !cp.resize_p_cycle(cycle_id, band.clone())? {
            return Err(EonError::Inconsistent(format!(
                "band of p-cycle {cycle_id} was computed as free, but cannot be reserved"
            )));
        }

        if self.bind(cp, flow, cycle_id, (src, dst, demand), band.len())? {
            return Ok(true);
        }

        if !cp.resize_p_cycle(cycle_id, old_band)? {
            return Err(EonError::Inconsistent(format!(
                "cannot restore the band of p-cycle {cycle_id}"
            )));
        }
        Ok(false)
    }

    /// Search a working path for a flow protected by the cycle, and accept the flow.
    fn bind<O: SimulationObserver>(
        &self,
        cp: &mut ControlPlane<O>,
        flow: FlowId,
        cycle_id: PCycleId,
        (src, dst, demand): (NodeId, NodeId, usize),
        width: usize,
    ) -> Result<bool, EonError> {
        let cycle = cp
            .vt()
            .p_cycle(cycle_id)
            .ok_or(EonError::UnknownPCycle(cycle_id))?;
        let sharing = self.sharing;
        let route = working_path(cp.pt(), src, dst, demand, |link| {
            cycle.admits(sharing, link, demand, width)
        })?;
        let Some((links, slots)) = route else {
            trace!("no working path for flow {flow} next to p-cycle {cycle_id}");
            return Ok(false);
        };

        let Some(lp) = cp.create_light_path(flow, &links, &slots, 0, Some(cycle_id))? else {
            return Ok(false);
        };
        cp.protect(cycle_id, lp, Vec::new())?;
        if cp.accept_flow(flow, lp, true)? {
            debug!("flow {flow} reuses p-cycle {cycle_id}");
            return Ok(true);
        }
        cp.discard_light_path(lp)?;
        Ok(false)
    }

    /// Compute a new p-cycle from two edge-disjoint paths, and the working window.
    fn initialize_fipp<O: SimulationObserver>(
        &self,
        cp: &ControlPlane<O>,
        (src, dst, demand): (NodeId, NodeId, usize),
    ) -> Result<Option<NewCycle>, EonError> {
        let pt = cp.pt();
        let Some((path1, path2)) = edge_disjoint_pair(pt, src, dst) else {
            return Ok(None);
        };
        let links1 = pt.path_to_links(&path1)?;
        let links2 = pt.path_to_links(&path2)?;
        let cycle_links: Vec<LinkId> = links1.iter().chain(links2.iter()).copied().collect();

        let Some(band) = first_fit(&pt.path_spectrum(&cycle_links)?, demand) else {
            return Ok(None);
        };

        for (working, backup) in [(&links1, &links2), (&links2, &links1)] {
            let mut spectrum = pt.path_spectrum(working)?;
            claim(&mut spectrum, &band);
            if let Some(slots) = first_fit(&spectrum, demand) {
                let nodes = path1.iter().chain(path2.iter()).copied().unique();
                return Ok(Some(NewCycle {
                    cycle: PCycle::new(cycle_links, nodes, band),
                    working: working.clone(),
                    slots,
                    backup: backup.clone(),
                }));
            }
        }
        Ok(None)
    }

    /// Establish a new p-cycle and accept the flow on its working path.
    fn try_new_cycle<O: SimulationObserver>(
        &self,
        cp: &mut ControlPlane<O>,
        flow: FlowId,
        req: (NodeId, NodeId, usize),
    ) -> Result<bool, EonError> {
        let Some(new) = self.initialize_fipp(cp, req)? else {
            return Ok(false);
        };
        let Some(cycle_id) = cp.establish_p_cycle(new.cycle)? else {
            return Ok(false);
        };
        let Some(lp) = cp.create_light_path(flow, &new.working, &new.slots, 0, Some(cycle_id))? else {
            cp.discard_p_cycle(cycle_id)?;
            return Ok(false);
        };
        cp.protect(cycle_id, lp, vec![new.backup])?;
        if cp.accept_flow(flow, lp, false)? {
            debug!("flow {flow} establishes p-cycle {cycle_id}");
            return Ok(true);
        }
        cp.discard_light_path(lp)?;
        Ok(false)
    }
}

impl Rsa for FippBfs {
    fn flow_arrival<O: SimulationObserver>(
        &mut self,
        flow: FlowId,
        cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError> {
        let req = request(cp, flow)?;
        let (src, dst, _) = req;

        for cycle_id in cp.vt().p_cycle_ids() {
            let contains = cp
                .vt()
                .p_cycle(cycle_id)
                .map(|c| c.contains_flow(src, dst))
                .unwrap_or(false);
            if contains && self.try_reuse(cp, flow, cycle_id, req)? {
                return Ok(());
            }
        }

        if self.try_new_cycle(cp, flow, req)? {
            return Ok(());
        }

        cp.block_flow(flow)?;
        Ok(())
    }
}
