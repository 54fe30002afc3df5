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

//! Unprotected RSA on the k shortest paths, fitting the demand into connected free regions.

use log::trace;

use crate::{
    connected_component::{first_fitting_window, list_of_regions},
    control_plane::ControlPlane,
    observer::SimulationObserver,
    routing::{k_shortest_paths, WeightedGraph},
    types::{EonError, FlowId},
};

use super::{request, Rsa};

/// For each of the `k` shortest paths (in order), the spectra of all links are combined, and the
/// free regions are labeled. The flow gets the lowest window of the first region that can hold the
/// demand on a single core. The flow is blocked if no path has such a region.
#[derive(Debug, Clone)]
pub struct ImageRcsa {
    k: usize,
    graph: Option<WeightedGraph>,
}

impl ImageRcsa {
    /// Create the strategy, considering `k` candidate paths.
    pub fn new(k: usize) -> Self {
        Self { k, graph: None }
    }
}

impl Default for ImageRcsa {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Rsa for ImageRcsa {
    fn simulation_interface<O: SimulationObserver>(
        &mut self,
        cp: &ControlPlane<O>,
    ) -> Result<(), EonError> {
        self.graph = Some(cp.pt().weighted_view());
        Ok(())
    }

    fn flow_arrival<O: SimulationObserver>(
        &mut self,
        flow: FlowId,
        cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError> {
        let (src, dst, demand) = request(cp, flow)?;
        let graph = self.graph.get_or_insert_with(|| cp.pt().weighted_view());

        for path in k_shortest_paths(graph, src, dst, self.k) {
            let links = cp.pt().path_to_links(&path)?;
            let regions = list_of_regions(&cp.pt().path_spectrum(&links)?);
            let Some(slots) = first_fitting_window(&regions, demand) else {
                trace!("path {path:?} has no region for flow {flow}");
                continue;
            };
            if let Some(lp) = cp.create_light_path(flow, &links, &slots, 0, None)? {
                if cp.accept_flow(flow, lp, false)? {
                    return Ok(());
                }
                cp.discard_light_path(lp)?;
            }
        }

        cp.block_flow(flow)?;
        Ok(())
    }
}
