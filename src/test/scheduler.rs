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

//! Ordering of the event queue.

use test_log::test;

use super::flow;
use crate::{
    event::{Event, EventScheduler},
    types::EonError,
};

#[test]
fn events_in_time_order() {
    let mut queue = EventScheduler::new();
    assert!(queue.is_empty());
    assert_eq!(queue.pop_event(), None);

    let a = flow(0, 0, 1, 3.0, 1, 1.0);
    let b = flow(1, 0, 1, 1.0, 1, 5.0);
    let c = flow(2, 0, 1, 2.0, 1, 0.5);
    for f in [&a, &b, &c] {
        queue.add_event(Event::arrival(f.clone())).unwrap();
        queue.add_event(Event::departure(f)).unwrap();
    }
    assert_eq!(queue.len(), 6);
    assert_eq!(queue.peek_time(), Some(1.0));

    let order: Vec<(f64, usize, bool)> = std::iter::from_fn(|| queue.pop_event())
        .map(|e| (e.time(), e.flow_id(), matches!(e, Event::Arrival { .. })))
        .collect();
    assert_eq!(
        order,
        vec![
            (1.0, 1, true),
            (2.0, 2, true),
            (2.5, 2, false),
            (3.0, 0, true),
            (4.0, 0, false),
            (6.0, 1, false),
        ]
    );
}

#[test]
fn ties_are_fifo() {
    let mut queue = EventScheduler::new();
    let flows: Vec<_> = (0..5).map(|i| flow(i, 0, 1, 1.0, 1, 0.0)).collect();
    for f in &flows {
        queue.add_event(Event::arrival(f.clone())).unwrap();
    }
    // a departure at the same time as its own arrival comes after it
    queue.add_event(Event::departure(&flows[0])).unwrap();

    let ids: Vec<usize> = std::iter::from_fn(|| queue.pop_event())
        .map(|e| e.flow_id())
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 0]);
}

#[test]
fn nan_time_is_rejected() {
    let mut queue = EventScheduler::new();
    let event = Event::Departure {
        time: f64::NAN,
        flow: 3,
    };
    assert!(matches!(
        queue.add_event(event),
        Err(EonError::InvalidTime(t)) if t.is_nan()
    ));
    assert!(queue.is_empty());
}
