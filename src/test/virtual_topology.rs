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

//! Lightpaths and p-cycles in the virtual topology.

use maplit::btreemap;
use pretty_assertions::assert_eq;
use test_log::test;

use super::flow;
use crate::{
    pcycle::PCycle,
    topology::PhysicalTopology,
    types::{EonError, Slot},
    virtual_topology::VirtualTopology,
};

fn setup() -> (PhysicalTopology, VirtualTopology) {
    let pt = PhysicalTopology::ring(4, 1, 8, 1.0).unwrap();
    let vt = VirtualTopology::new(&pt);
    (pt, vt)
}

#[test]
fn lightpath_holds_its_slots() {
    let (mut pt, mut vt) = setup();
    let f = flow(0, 0, 2, 0.0, 2, 1.0);
    let lp = vt
        .create_light_path(&mut pt, &f, &[0, 1], &Slot::window(0, 0, 2), 0, None)
        .unwrap()
        .unwrap();
    assert_eq!(vt.num_light_paths(), 1);
    assert_eq!(vt.light_paths_between(2, 0).len(), 1);
    assert!(vt.light_paths_between(0, 1).is_empty());
    assert_eq!(
        pt.free_slots_per_link(),
        btreemap! {0 => 6, 1 => 6, 2 => 8, 3 => 8}
    );
    vt.check_consistency(&pt).unwrap();

    // the same slots cannot be taken twice
    let g = flow(1, 1, 2, 0.0, 1, 1.0);
    assert_eq!(
        vt.create_light_path(&mut pt, &g, &[1], &[Slot::new(0, 1)], 0, None),
        Ok(None)
    );
    assert_eq!(vt.num_light_paths(), 1);

    let removed = vt.remove_light_path(&mut pt, lp).unwrap().unwrap();
    assert_eq!(removed.links(), &[0, 1]);
    assert_eq!(vt.remove_light_path(&mut pt, lp), Ok(None));
    assert_eq!(pt.free_slot_count(), 32);
    vt.check_consistency(&pt).unwrap();
}

#[test]
fn lightpaths_between_the_same_nodes() {
    let (mut pt, mut vt) = setup();
    let a = vt
        .create_light_path(&mut pt, &flow(0, 0, 1, 0.0, 1, 1.0), &[0], &[Slot::new(0, 0)], 0, None)
        .unwrap()
        .unwrap();
    let b = vt
        .create_light_path(
            &mut pt,
            &flow(1, 1, 0, 0.0, 1, 1.0),
            &[1, 2, 3],
            &[Slot::new(0, 0)],
            0,
            None,
        )
        .unwrap()
        .unwrap();
    let ids: Vec<_> = vt.light_paths_between(0, 1).iter().map(|lp| lp.id()).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn p_cycle_lifecycle() {
    let (mut pt, mut vt) = setup();
    let cycle = PCycle::new(vec![0, 1, 2, 3], [0, 1, 2, 3], Slot::window(0, 0, 2));
    let c = vt.add_p_cycle(&mut pt, cycle).unwrap().unwrap();
    assert_eq!(pt.free_slot_count(), 24);

    // an overlapping band is refused without reserving anything
    let other = PCycle::new(vec![0, 1, 2, 3], [0, 1, 2, 3], Slot::window(0, 1, 2));
    assert_eq!(vt.add_p_cycle(&mut pt, other), Ok(None));
    assert_eq!(pt.free_slot_count(), 24);

    let f = flow(0, 0, 1, 0.0, 3, 1.0);
    let lp = vt
        .create_light_path(&mut pt, &f, &[0], &Slot::window(0, 2, 3), 0, Some(c))
        .unwrap()
        .unwrap();
    vt.protect(c, lp, vec![vec![3, 2, 1]]).unwrap();
    assert!(vt.p_cycle(c).unwrap().protects(lp));
    assert_eq!(vt.p_cycle(c).unwrap().protected_demand(), 3);
    assert_eq!(vt.get_light_path(lp).unwrap().p_cycle(), Some(c));
    assert_eq!(vt.get_light_path(lp).unwrap().be_protected_by(), &[c]);
    vt.check_consistency(&pt).unwrap();

    // a cycle that still protects something cannot be discarded
    assert!(vt.remove_p_cycle(&mut pt, c).is_err());

    // widen the band: the old band may overlap the new one
    assert!(vt.resize_p_cycle(&mut pt, c, Slot::window(0, 0, 2)).unwrap());
    assert!(!vt.resize_p_cycle(&mut pt, c, Slot::window(0, 1, 3)).unwrap());
    assert_eq!(vt.p_cycle(c).unwrap().slots(), Slot::window(0, 0, 2).as_slice());
    vt.check_consistency(&pt).unwrap();

    // removing the last protected lightpath discards the cycle
    let lp = vt.remove_light_path(&mut pt, lp).unwrap().unwrap();
    vt.remove_lp_p_cycle(&mut pt, &lp).unwrap();
    assert_eq!(vt.num_p_cycles(), 0);
    assert_eq!(pt.free_slot_count(), 32);
    vt.check_consistency(&pt).unwrap();
}

#[test]
fn single_owner() {
    let (mut pt, mut vt) = setup();
    let a = vt
        .add_p_cycle(
            &mut pt,
            PCycle::new(vec![0, 1, 2, 3], [0, 1, 2, 3], Slot::window(0, 0, 1)),
        )
        .unwrap()
        .unwrap();
    let b = vt
        .add_p_cycle(
            &mut pt,
            PCycle::new(vec![0, 1, 2, 3], [0, 1, 2, 3], Slot::window(0, 1, 1)),
        )
        .unwrap()
        .unwrap();
    let lp = vt
        .create_light_path(&mut pt, &flow(0, 0, 1, 0.0, 1, 1.0), &[0], &[Slot::new(0, 5)], 0, Some(a))
        .unwrap()
        .unwrap();
    vt.protect(a, lp, Vec::new()).unwrap();
    assert!(matches!(vt.protect(b, lp, Vec::new()), Err(EonError::Inconsistent(_))));
    assert!(!vt.p_cycle(b).unwrap().protects(lp));
    assert_eq!(vt.protect(7, lp, Vec::new()), Err(EonError::UnknownPCycle(7)));
}

#[test]
fn disjoint_lightpaths_become_backup_candidates() {
    let (mut pt, mut vt) = setup();
    let c = vt
        .add_p_cycle(
            &mut pt,
            PCycle::new(vec![0, 1, 2, 3], [0, 1, 2, 3], Slot::window(0, 0, 2)),
        )
        .unwrap()
        .unwrap();
    let a = vt
        .create_light_path(&mut pt, &flow(0, 0, 1, 0.0, 1, 1.0), &[0], &[Slot::new(0, 2)], 0, Some(c))
        .unwrap()
        .unwrap();
    vt.protect(c, a, Vec::new()).unwrap();
    let b = vt
        .create_light_path(&mut pt, &flow(1, 2, 3, 0.0, 1, 1.0), &[2], &[Slot::new(0, 2)], 0, Some(c))
        .unwrap()
        .unwrap();
    vt.protect(c, b, Vec::new()).unwrap();
    let d = vt
        .create_light_path(&mut pt, &flow(2, 0, 2, 0.0, 1, 1.0), &[0, 1], &[Slot::new(0, 3)], 0, Some(c))
        .unwrap()
        .unwrap();
    vt.protect(c, d, Vec::new()).unwrap();

    let cycle = vt.p_cycle(c).unwrap();
    assert_eq!(cycle.protected_lightpaths().len(), 3);
    assert_eq!(cycle.id_links().get(&0), Some(&vec![a, d]));
    assert_eq!(cycle.link_load(0), 2);
    assert_eq!(cycle.max_link_load(), 2);
    // the candidates stay mutually disjoint
    for (i, x) in cycle.be_protection().iter().enumerate() {
        for y in cycle.be_protection().iter().skip(i + 1) {
            assert!(!x.shares_link_with(y.links()));
        }
    }
    vt.check_consistency(&pt).unwrap();
}

#[test]
fn reroute_keeps_the_id() {
    let (mut pt, mut vt) = setup();
    let c = vt
        .add_p_cycle(
            &mut pt,
            PCycle::new(vec![0, 1, 2, 3], [0, 1, 2, 3], Slot::window(0, 0, 2)),
        )
        .unwrap()
        .unwrap();
    let lp = vt
        .create_light_path(&mut pt, &flow(0, 0, 2, 0.0, 2, 1.0), &[0, 1], &Slot::window(0, 2, 2), 0, Some(c))
        .unwrap()
        .unwrap();
    vt.protect(c, lp, Vec::new()).unwrap();

    assert!(vt
        .reroute_light_path(&mut pt, lp, &[3, 2], &Slot::window(0, 4, 2))
        .unwrap());
    let moved = vt.get_light_path(lp).unwrap();
    assert_eq!(moved.links(), &[3, 2]);
    assert_eq!(moved.p_cycle(), Some(c));
    assert_eq!(vt.p_cycle(c).unwrap().protected_lightpaths()[0].links(), &[3, 2]);
    assert_eq!(
        pt.free_slots_per_link(),
        btreemap! {0 => 6, 1 => 6, 2 => 4, 3 => 4}
    );
    vt.check_consistency(&pt).unwrap();
}

#[test]
fn failed_reroute_restores_the_route() {
    let (mut pt, mut vt) = setup();
    let a = vt
        .create_light_path(&mut pt, &flow(0, 0, 2, 0.0, 2, 1.0), &[0, 1], &Slot::window(0, 0, 2), 0, None)
        .unwrap()
        .unwrap();
    vt.create_light_path(&mut pt, &flow(1, 2, 3, 0.0, 1, 1.0), &[2], &[Slot::new(0, 1)], 0, None)
        .unwrap()
        .unwrap();
    let before = pt.free_slots_per_link();

    assert!(!vt
        .reroute_light_path(&mut pt, a, &[3, 2], &Slot::window(0, 0, 2))
        .unwrap());
    assert_eq!(vt.get_light_path(a).unwrap().links(), &[0, 1]);
    assert_eq!(pt.free_slots_per_link(), before);
    assert!(!pt
        .are_slots_available_on_links(&[0, 1], &Slot::window(0, 0, 2))
        .unwrap());
    vt.check_consistency(&pt).unwrap();
}
