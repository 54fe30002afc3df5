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

//! Unprotected RSA: the working path with the fewest hops over all slot windows.

use crate::{
    control_plane::ControlPlane,
    observer::SimulationObserver,
    types::{EonError, FlowId},
};

use super::{request, working_path, Rsa};

/// Route every flow on the path found by [`working_path`], without any protection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestWindow;

impl Rsa for ShortestWindow {
    fn flow_arrival<O: SimulationObserver>(
        &mut self,
        flow: FlowId,
        cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError> {
        let (src, dst, demand) = request(cp, flow)?;
        if let Some((links, slots)) = working_path(cp.pt(), src, dst, demand, |_| true)? {
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
