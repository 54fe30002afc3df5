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

//! Test the simulator core and the RSA strategies on small networks.

use crate::{
    event::{Event, EventScheduler},
    flow::Flow,
    rsa::{RsaConfig, RsaKind},
    simulator::Simulation,
    topology::PhysicalTopology,
    types::{FlowId, NodeId, SimTime},
};

mod scenarios;
mod scheduler;
mod spectrum_grid;
mod virtual_topology;

/// Create a flow with the given parameters. The deadline is the arrival time.
pub(crate) fn flow(
    id: FlowId,
    src: NodeId,
    dst: NodeId,
    time: SimTime,
    rate: u32,
    duration: SimTime,
) -> Flow {
    Flow::new(id, src, dst, time, rate, duration, 0, time).unwrap()
}

/// Schedule the arrival and departure of all flows.
pub(crate) fn schedule(flows: impl IntoIterator<Item = Flow>) -> EventScheduler {
    let mut events = EventScheduler::new();
    for f in flows {
        let departure = Event::departure(&f);
        events.add_event(Event::arrival(f)).unwrap();
        events.add_event(departure).unwrap();
    }
    events
}

/// Build a simulation with the given strategy.
pub(crate) fn simulation(
    pt: PhysicalTopology,
    kind: RsaKind,
    flows: impl IntoIterator<Item = Flow>,
) -> Simulation {
    let config = RsaConfig {
        kind,
        ..Default::default()
    };
    Simulation::from_parts(pt, config, schedule(flows)).unwrap()
}
