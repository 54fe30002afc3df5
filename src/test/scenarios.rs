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

//! End-to-end scenarios of the RSA strategies on small networks.

use maplit::btreemap;
use pretty_assertions::assert_eq;
use test_log::test;

use super::{flow, schedule, simulation};
use crate::{
    observer::{BlockingCounters, RunStats},
    pcycle::SharingPolicy,
    rsa::{RsaConfig, RsaKind},
    simulator::Simulation,
    topology::{LinkSpec, PhysicalTopology},
    types::Slot,
};

fn run_to_end(sim: &mut Simulation) {
    while sim.step().unwrap().is_some() {
        sim.control_plane().check_consistency().unwrap();
    }
    let pt = sim.control_plane().pt();
    assert_eq!(pt.free_slot_count(), pt.num_links() * pt.cores() * pt.slots());
    assert_eq!(sim.control_plane().vt().num_light_paths(), 0);
    assert_eq!(sim.control_plane().vt().num_p_cycles(), 0);
}

#[test]
fn blocked_until_departure() {
    let pt = PhysicalTopology::new(2, 1, 4, 1.0, [LinkSpec::new(0, 0, 1)]).unwrap();
    let mut sim = simulation(
        pt,
        RsaKind::ShortestWindow,
        [
            flow(0, 0, 1, 0.0, 3, 10.0),
            flow(1, 0, 1, 1.0, 2, 1.0),
            flow(2, 1, 0, 11.0, 2, 1.0),
        ],
    );

    assert_eq!(sim.step().unwrap(), Some(0.0));
    assert_eq!(
        sim.control_plane().path(0).unwrap().slots(),
        Slot::window(0, 0, 3).as_slice()
    );

    assert_eq!(sim.step().unwrap(), Some(1.0));
    assert!(sim.control_plane().flow(1).is_none());
    assert_eq!(sim.stats().blocked, 1);
    assert_eq!(sim.control_plane().pt().free_slot_count(), 1);

    // departure of the blocked flow, then of flow 0
    assert_eq!(sim.step().unwrap(), Some(2.0));
    assert_eq!(sim.step().unwrap(), Some(10.0));
    assert_eq!(sim.control_plane().pt().free_slot_count(), 4);

    assert_eq!(sim.step().unwrap(), Some(11.0));
    assert_eq!(
        sim.control_plane().path(2).unwrap().slots(),
        Slot::window(0, 0, 2).as_slice()
    );

    run_to_end(&mut sim);
    assert_eq!(
        sim.stats(),
        &RunStats {
            arrivals: 3,
            departures: 3,
            accepted: 2,
            blocked: 1,
            required_bandwidth: 7,
            blocked_bandwidth: 2,
            hops: 2,
            per_cos: btreemap! {
                0 => BlockingCounters {
                    arrivals: 3,
                    blocked: 1,
                    required_bandwidth: 7,
                    blocked_bandwidth: 2,
                },
            },
            per_pair: btreemap! {
                0 => btreemap! {
                    1 => BlockingCounters {
                        arrivals: 2,
                        blocked: 1,
                        required_bandwidth: 5,
                        blocked_bandwidth: 2,
                    },
                },
                1 => btreemap! {
                    0 => BlockingCounters {
                        arrivals: 1,
                        required_bandwidth: 2,
                        ..Default::default()
                    },
                },
            },
            seen_arrivals: 3,
            ..Default::default()
        }
    );
}

#[test]
fn p_cycle_is_reused_on_a_ring() {
    let pt = PhysicalTopology::ring(5, 1, 16, 1.0).unwrap();
    let mut sim = simulation(
        pt,
        RsaKind::FippBfs,
        [flow(0, 0, 1, 0.0, 2, 10.0), flow(1, 2, 3, 1.0, 2, 10.0)],
    );

    sim.step().unwrap();
    {
        let cp = sim.control_plane();
        assert_eq!(cp.vt().num_p_cycles(), 1);
        let cycle = cp.vt().p_cycles().next().unwrap();
        assert_eq!(cycle.cycle_links().len(), 5);
        assert_eq!(cycle.slots(), Slot::window(0, 0, 2).as_slice());
        let lp = cp.path(0).unwrap();
        assert_eq!(lp.links(), &[0]);
        assert_eq!(lp.slots(), Slot::window(0, 2, 2).as_slice());
        assert_eq!(lp.p_cycle(), Some(cycle.id()));
        assert_eq!(cycle.protected_lightpaths()[0].backup_paths(), &[vec![4, 3, 2, 1]]);
    }

    sim.step().unwrap();
    {
        let cp = sim.control_plane();
        assert_eq!(cp.vt().num_p_cycles(), 1);
        let cycle = cp.vt().p_cycles().next().unwrap();
        // additive sharing: the band grows to 2 + 2 slots, and moves behind lightpath 0
        assert_eq!(cycle.slots(), Slot::window(0, 4, 4).as_slice());
        assert_eq!(cycle.protected_lightpaths().len(), 2);
        let lp = cp.path(1).unwrap();
        assert_eq!(lp.links(), &[2]);
        assert_eq!(lp.slots(), Slot::window(0, 0, 2).as_slice());
        assert_eq!(lp.p_cycle(), Some(cycle.id()));
        cp.check_consistency().unwrap();
    }
    assert_eq!(sim.stats().p_cycles_created, 1);
    assert_eq!(sim.stats().p_cycles_reused, 1);

    // flow 0 departs, the cycle keeps its band for flow 1
    sim.step().unwrap();
    {
        let cp = sim.control_plane();
        assert_eq!(cp.vt().num_p_cycles(), 1);
        let cycle = cp.vt().p_cycles().next().unwrap();
        assert_eq!(cycle.reserved_slots(), 4);
        assert_eq!(cycle.protected_demand(), 2);
    }

    run_to_end(&mut sim);
}

#[test]
fn shared_band_is_not_widened() {
    let pt = PhysicalTopology::ring(5, 1, 16, 1.0).unwrap();
    let config = RsaConfig {
        kind: RsaKind::FippBfs,
        sharing: SharingPolicy::Shared,
        ..Default::default()
    };
    let mut sim = Simulation::from_parts(
        pt,
        config,
        schedule([flow(0, 0, 1, 0.0, 2, 10.0), flow(1, 2, 3, 1.0, 2, 10.0)]),
    )
    .unwrap();

    sim.step().unwrap();
    sim.step().unwrap();
    let cp = sim.control_plane();
    assert_eq!(cp.vt().num_p_cycles(), 1);
    let cycle = cp.vt().p_cycles().next().unwrap();
    // both lightpaths are on different links, so they never fail together
    assert_eq!(cycle.slots(), Slot::window(0, 0, 2).as_slice());
    let lp = cp.path(1).unwrap();
    assert_eq!(lp.links(), &[2]);
    assert_eq!(lp.slots(), Slot::window(0, 2, 2).as_slice());
    assert!(cycle.is_capacity_consistent(SharingPolicy::Shared));
    assert_eq!(sim.stats().p_cycles_reused, 1);

    run_to_end(&mut sim);
}

#[test]
fn band_cannot_grow() {
    let pt = PhysicalTopology::ring(3, 1, 8, 1.0).unwrap();
    let mut sim = simulation(
        pt,
        RsaKind::FippBfs,
        [flow(0, 0, 1, 0.0, 4, 10.0), flow(1, 1, 2, 1.0, 1, 1.0)],
    );

    sim.step().unwrap();
    // link 0 is now completely used by the band and the working path
    assert_eq!(
        sim.control_plane().pt().link(0).unwrap().grid().free_count(),
        0
    );

    sim.step().unwrap();
    let cp = sim.control_plane();
    assert!(cp.flow(1).is_none());
    assert_eq!(sim.stats().blocked, 1);
    assert_eq!(cp.vt().num_p_cycles(), 1);
    let cycle = cp.vt().p_cycles().next().unwrap();
    assert_eq!(cycle.slots(), Slot::window(0, 0, 4).as_slice());
    assert_eq!(cycle.protected_lightpaths().len(), 1);
    cp.check_consistency().unwrap();

    run_to_end(&mut sim);
}

#[test]
fn no_disjoint_paths_on_a_line() {
    let pt = PhysicalTopology::new(
        3,
        1,
        8,
        1.0,
        [LinkSpec::new(0, 0, 1), LinkSpec::new(1, 1, 2)],
    )
    .unwrap();
    let mut sim = simulation(pt, RsaKind::FippBfs, [flow(0, 0, 2, 0.0, 1, 1.0)]);
    run_to_end(&mut sim);
    assert_eq!(sim.stats().blocked, 1);
    assert_eq!(sim.stats().accepted, 0);
}

#[test]
fn image_rcsa_fills_the_shortest_path() {
    let pt = PhysicalTopology::ring(5, 1, 8, 1.0).unwrap();
    let config = RsaConfig {
        kind: RsaKind::ImageRcsa,
        k_paths: 3,
        ..Default::default()
    };
    let mut sim = Simulation::from_parts(
        pt,
        config,
        schedule([
            flow(0, 0, 2, 0.0, 2, 10.0),
            flow(1, 0, 2, 1.0, 2, 10.0),
            flow(2, 0, 2, 2.0, 5, 10.0),
        ]),
    )
    .unwrap();

    sim.step().unwrap();
    sim.step().unwrap();
    sim.step().unwrap();
    let cp = sim.control_plane();
    assert_eq!(cp.path(0).unwrap().links(), &[0, 1]);
    assert_eq!(cp.path(0).unwrap().slots(), Slot::window(0, 0, 2).as_slice());
    assert_eq!(cp.path(1).unwrap().links(), &[0, 1]);
    assert_eq!(cp.path(1).unwrap().slots(), Slot::window(0, 2, 2).as_slice());
    // only 4 slots are left on the shortest path
    assert_eq!(cp.path(2).unwrap().links(), &[4, 3, 2]);
    assert_eq!(cp.path(2).unwrap().slots(), Slot::window(0, 0, 5).as_slice());
    assert_eq!(cp.vt().num_p_cycles(), 0);
    assert!(cp.vt().light_paths().all(|lp| lp.p_cycle().is_none()));

    run_to_end(&mut sim);
}

#[test]
fn image_rcsa_uses_all_cores() {
    let pt = PhysicalTopology::new(2, 2, 4, 1.0, [LinkSpec::new(0, 0, 1)]).unwrap();
    let mut sim = simulation(
        pt,
        RsaKind::ImageRcsa,
        [flow(0, 0, 1, 0.0, 3, 10.0), flow(1, 0, 1, 1.0, 2, 10.0)],
    );
    sim.step().unwrap();
    sim.step().unwrap();
    let cp = sim.control_plane();
    assert_eq!(cp.path(0).unwrap().slots(), Slot::window(0, 0, 3).as_slice());
    assert_eq!(cp.path(1).unwrap().slots(), Slot::window(1, 0, 2).as_slice());
    run_to_end(&mut sim);
}
