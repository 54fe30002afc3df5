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

//! Slot reservations on a single link and on the physical topology.

use pretty_assertions::assert_eq;
use test_log::test;

use crate::{
    spectrum::SpectrumGrid,
    topology::{LinkSpec, PhysicalTopology},
    types::{EonError, Slot},
};

#[test]
fn reserve_release_round_trip() {
    let mut grid = SpectrumGrid::new(0, 2, 8);
    let slots = Slot::window(1, 3, 4);
    assert!(grid.are_available(&slots).unwrap());
    grid.reserve(&slots).unwrap();
    assert!(!grid.are_available(&slots).unwrap());
    assert_eq!(grid.reserved_count(), 4);
    assert_eq!(grid.free_count(), 12);
    assert_eq!(grid.reserved_slots().collect::<Vec<_>>(), slots);

    grid.release(&slots).unwrap();
    assert_eq!(grid, SpectrumGrid::new(0, 2, 8));
}

#[test]
fn conflicting_reservation_changes_nothing() {
    let mut grid = SpectrumGrid::new(7, 1, 8);
    grid.reserve(&[Slot::new(0, 4)]).unwrap();
    let before = grid.clone();

    assert_eq!(
        grid.reserve(&Slot::window(0, 2, 4)),
        Err(EonError::SlotConflict {
            link: 7,
            slot: Slot::new(0, 4)
        })
    );
    assert_eq!(grid, before);
    assert!(grid.available(0, 2));
    assert!(grid.available(0, 3));
}

#[test]
fn release_is_idempotent() {
    let mut grid = SpectrumGrid::new(0, 1, 4);
    grid.reserve(&Slot::window(0, 0, 2)).unwrap();
    grid.release(&Slot::window(0, 0, 2)).unwrap();
    grid.release(&Slot::window(0, 0, 2)).unwrap();
    assert_eq!(grid.free_count(), 4);
    assert_eq!(grid.reserved_count(), 0);
}

#[test]
fn out_of_range_slots() {
    let mut grid = SpectrumGrid::new(3, 2, 4);
    let err = grid.reserve(&[Slot::new(2, 0)]).unwrap_err();
    assert!(matches!(err, EonError::InvalidSlot { link: 3, .. }));
    assert!(grid.release(&[Slot::new(0, 4)]).is_err());
    assert!(!grid.available(0, 4));
    assert_eq!(grid.free_count(), 8);
}

#[test]
fn reservation_on_links_is_atomic() {
    let mut pt = PhysicalTopology::ring(4, 1, 8, 12.5).unwrap();
    pt.reserve_on_links(&[2], &[Slot::new(0, 1)]).unwrap();
    let before = pt.free_slots_per_link();

    assert!(pt
        .reserve_on_links(&[0, 1, 2, 3], &Slot::window(0, 0, 2))
        .is_err());
    assert_eq!(pt.free_slots_per_link(), before);
    assert!(!pt
        .are_slots_available_on_links(&[0, 1, 2], &Slot::window(0, 0, 2))
        .unwrap());
    assert!(pt
        .are_slots_available_on_links(&[0, 1, 3], &Slot::window(0, 0, 2))
        .unwrap());
}

#[test]
fn topology_by_node_pair() {
    let mut pt = PhysicalTopology::new(
        3,
        1,
        4,
        10.0,
        [LinkSpec::new(0, 0, 1), LinkSpec::new(1, 1, 2)],
    )
    .unwrap();
    assert_eq!(pt.link_id(1, 0), Ok(0));
    assert_eq!(pt.link_id(0, 2), Err(EonError::NoSuchEdge(0, 2)));
    assert_eq!(pt.demand_in_slots(25.0), 3);
    assert_eq!(pt.demand_in_slots(10.0), 1);

    pt.reserve_slots(2, 1, &Slot::window(0, 0, 3)).unwrap();
    assert!(!pt.are_slots_available(1, 2, &[Slot::new(0, 2)]).unwrap());
    assert_eq!(pt.free_slot_count(), 5);
    assert_eq!(pt.spectrum(1, 2).unwrap(), vec![vec![false, false, false, true]]);
    pt.release_slots(1, 2, &Slot::window(0, 0, 3)).unwrap();
    assert_eq!(pt.free_slot_count(), 8);
}

#[test]
fn invalid_topologies() {
    assert!(PhysicalTopology::new(2, 1, 4, 1.0, [LinkSpec::new(0, 0, 2)]).is_err());
    assert!(PhysicalTopology::new(2, 1, 4, 1.0, [LinkSpec::new(0, 1, 1)]).is_err());
    assert!(PhysicalTopology::new(2, 0, 4, 1.0, [LinkSpec::new(0, 0, 1)]).is_err());
    assert!(PhysicalTopology::new(2, 1, 4, 0.0, [LinkSpec::new(0, 0, 1)]).is_err());
    assert!(PhysicalTopology::new(
        2,
        1,
        4,
        1.0,
        [LinkSpec::new(0, 0, 1), LinkSpec::new(0, 1, 0)]
    )
    .is_err());
}
