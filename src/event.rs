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

//! Module for defining events and the scheduler that orders them in time.
//!
//! Events are processed strictly sequentially. The scheduler pops events in non-decreasing order
//! of their time. Events with the same time are popped in the order in which they were added.

use std::{cmp::Reverse, collections::HashMap};

use ordered_float::NotNan;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::{
    flow::Flow,
    types::{EonError, FlowId, SimTime},
};

/// Event to handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new flow arrives.
    Arrival {
        /// Time of the event
        time: SimTime,
        /// The flow requesting a connection
        flow: Flow,
    },
    /// A flow departs and its resources are freed.
    Departure {
        /// Time of the event
        time: SimTime,
        /// The departing flow
        flow: FlowId,
    },
}

impl Event {
    /// Arrival event of a flow, scheduled at its arrival time.
    pub fn arrival(flow: Flow) -> Self {
        Self::Arrival {
            time: flow.time(),
            flow,
        }
    }

    /// Departure event of a flow, scheduled at its departure time.
    pub fn departure(flow: &Flow) -> Self {
        Self::Departure {
            time: flow.departure_time(),
            flow: flow.id(),
        }
    }

    /// Time at which the event happens
    pub fn time(&self) -> SimTime {
        match self {
            Event::Arrival { time, .. } | Event::Departure { time, .. } => *time,
        }
    }

    /// Id of the flow this event talks about.
    pub fn flow_id(&self) -> FlowId {
        match self {
            Event::Arrival { flow, .. } => flow.id(),
            Event::Departure { flow, .. } => *flow,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Arrival { time, flow } => write!(
                f,
                "[{time:.4}] arrival of flow {} ({} -> {}, rate {})",
                flow.id(),
                flow.source(),
                flow.destination(),
                flow.rate()
            ),
            Event::Departure { time, flow } => write!(f, "[{time:.4}] departure of flow {flow}"),
        }
    }
}

/// Time-ordered queue of events, with insertion order as the tie break.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    queue: PriorityQueue<u64, Reverse<(NotNan<SimTime>, u64)>>,
    events: HashMap<u64, Event>,
    next_seq: u64,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            events: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Enqueue an event. Fails if the time of the event is not a number.
    pub fn add_event(&mut self, event: Event) -> Result<(), EonError> {
        let time = NotNan::new(event.time()).map_err(|_| EonError::InvalidTime(event.time()))?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(seq, Reverse((time, seq)));
        self.events.insert(seq, event);
        Ok(())
    }

    /// Remove and return the earliest event, or `None` if the scheduler is empty.
    pub fn pop_event(&mut self) -> Option<Event> {
        let (seq, _) = self.queue.pop()?;
        self.events.remove(&seq)
    }

    /// Time of the next event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|(_, Reverse((t, _)))| t.into_inner())
    }

    /// Number of enqueued events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no event is enqueued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
