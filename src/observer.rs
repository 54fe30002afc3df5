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

//! Observers that are notified about the decisions of the control plane.
//!
//! Observers are fire-and-forget sinks: the control plane never reads anything back from them.
//! Every run owns its own observer, so runs never share statistics.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{event::Event, flow::Flow, lightpath::LightPath, types::NodeId};

/// Receives notifications from the control plane.
pub trait SimulationObserver {
    /// A flow arrived.
    fn on_arrival(&mut self, _event: &Event) {}
    /// A flow was accepted and is carried by the lightpath. `reused` is set if the lightpath is
    /// protected by an existing p-cycle.
    fn on_accept(&mut self, _flow: &Flow, _lightpath: &LightPath, _reused: bool) {}
    /// A flow was blocked.
    fn on_block(&mut self, _flow: &Flow) {}
    /// A flow departed.
    fn on_departure(&mut self, _event: &Event) {}
}

/// Observer that ignores everything.
impl SimulationObserver for () {}

impl<A: SimulationObserver, B: SimulationObserver> SimulationObserver for (A, B) {
    fn on_arrival(&mut self, event: &Event) {
        self.0.on_arrival(event);
        self.1.on_arrival(event);
    }

    fn on_accept(&mut self, flow: &Flow, lightpath: &LightPath, reused: bool) {
        self.0.on_accept(flow, lightpath, reused);
        self.1.on_accept(flow, lightpath, reused);
    }

    fn on_block(&mut self, flow: &Flow) {
        self.0.on_block(flow);
        self.1.on_block(flow);
    }

    fn on_departure(&mut self, event: &Event) {
        self.0.on_departure(event);
        self.1.on_departure(event);
    }
}

/// Blocking counters of a single class of service or of a single node pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingCounters {
    /// Number of arrived flows
    pub arrivals: usize,
    /// Number of blocked flows
    pub blocked: usize,
    /// Sum of the rates of all arrived flows
    pub required_bandwidth: u64,
    /// Sum of the rates of all blocked flows
    pub blocked_bandwidth: u64,
}

impl BlockingCounters {
    /// Fraction of arrived flows that were blocked.
    pub fn blocking_probability(&self) -> f64 {
        ratio(self.blocked as f64, self.arrivals as f64)
    }

    /// Fraction of the requested bandwidth that was blocked.
    pub fn bandwidth_blocking_ratio(&self) -> f64 {
        ratio(self.blocked_bandwidth as f64, self.required_bandwidth as f64)
    }
}

/// Counters collected during a single run.
///
/// The first `warmup` arrivals are not counted. Accepts, blocks and departures are counted once
/// the warm-up is over, even if they belong to a flow that arrived during the warm-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of arrived flows
    pub arrivals: usize,
    /// Number of processed departures
    pub departures: usize,
    /// Number of accepted flows
    pub accepted: usize,
    /// Number of blocked flows
    pub blocked: usize,
    /// Sum of the rates of all arrived flows
    pub required_bandwidth: u64,
    /// Sum of the rates of all blocked flows
    pub blocked_bandwidth: u64,
    /// Number of flows that caused a new p-cycle to be established
    pub p_cycles_created: usize,
    /// Number of flows protected by an already existing p-cycle
    pub p_cycles_reused: usize,
    /// Sum of the number of links of all accepted flows
    pub hops: usize,
    /// Counters per class of service
    pub per_cos: BTreeMap<u32, BlockingCounters>,
    /// Counters per source and destination
    pub per_pair: BTreeMap<NodeId, BTreeMap<NodeId, BlockingCounters>>,
    /// Number of arrivals that are ignored at the start of the run
    #[serde(default)]
    pub warmup: usize,
    /// Number of arrivals seen so far, including the warm-up
    #[serde(default)]
    pub seen_arrivals: usize,
}

impl RunStats {
    /// Empty statistics that ignore the first `warmup` arrivals.
    pub fn with_warmup(warmup: usize) -> Self {
        Self {
            warmup,
            ..Default::default()
        }
    }

    /// Whether the warm-up is over.
    pub fn is_counting(&self) -> bool {
        self.warmup == 0 || self.seen_arrivals > self.warmup
    }

    /// Fraction of arrived flows that were blocked.
    pub fn blocking_probability(&self) -> f64 {
        ratio(self.blocked as f64, self.arrivals as f64)
    }

    /// Fraction of the requested bandwidth that was blocked.
    pub fn bandwidth_blocking_ratio(&self) -> f64 {
        ratio(self.blocked_bandwidth as f64, self.required_bandwidth as f64)
    }

    /// Fraction of arrived flows that were accepted.
    pub fn acceptance_ratio(&self) -> f64 {
        ratio(self.accepted as f64, self.arrivals as f64)
    }

    /// Mean number of links of the accepted flows.
    pub fn mean_hops(&self) -> f64 {
        ratio(self.hops as f64, self.accepted as f64)
    }

    /// Counters of the flows from `src` to `dst`.
    pub fn pair(&self, src: NodeId, dst: NodeId) -> BlockingCounters {
        self.per_pair
            .get(&src)
            .and_then(|m| m.get(&dst))
            .copied()
            .unwrap_or_default()
    }

    /// Jain's fairness index of the bandwidth blocking ratio over all ordered pairs of distinct
    /// nodes out of `num_nodes`. Pairs without any blocked flow count as zero. Without any
    /// blocking, all pairs are treated equally and the index is 1.
    pub fn jain_fairness_index(&self, num_nodes: usize) -> f64 {
        let (count, sum, sum_sq) = (0..num_nodes)
            .flat_map(|src| (0..num_nodes).map(move |dst| (src, dst)))
            .filter(|(src, dst)| src != dst)
            .map(|(src, dst)| self.pair(src, dst).bandwidth_blocking_ratio())
            .fold((0usize, 0.0, 0.0), |(n, s, q), x| (n + 1, s + x, q + x * x));
        if sum_sq == 0.0 {
            1.0
        } else {
            sum * sum / (count as f64 * sum_sq)
        }
    }

    /// Counters of the class and of the node pair of the flow.
    fn counters_mut(&mut self, flow: &Flow) -> [&mut BlockingCounters; 2] {
        let cos = self.per_cos.entry(flow.cos()).or_default();
        let pair = self
            .per_pair
            .entry(flow.source())
            .or_default()
            .entry(flow.destination())
            .or_default();
        [cos, pair]
    }
}

fn ratio(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

impl SimulationObserver for RunStats {
    fn on_arrival(&mut self, event: &Event) {
        let Event::Arrival { flow, .. } = event else {
            return;
        };
        self.seen_arrivals += 1;
        if !self.is_counting() {
            return;
        }
        let rate = flow.rate() as u64;
        self.arrivals += 1;
        self.required_bandwidth += rate;
        for c in self.counters_mut(flow) {
            c.arrivals += 1;
            c.required_bandwidth += rate;
        }
    }

    fn on_accept(&mut self, _flow: &Flow, lightpath: &LightPath, reused: bool) {
        if !self.is_counting() {
            return;
        }
        self.accepted += 1;
        self.hops += lightpath.links().len();
        if reused {
            self.p_cycles_reused += 1;
        } else if lightpath.p_cycle().is_some() {
            self.p_cycles_created += 1;
        }
    }

    fn on_block(&mut self, flow: &Flow) {
        if !self.is_counting() {
            return;
        }
        let rate = flow.rate() as u64;
        self.blocked += 1;
        self.blocked_bandwidth += rate;
        for c in self.counters_mut(flow) {
            c.blocked += 1;
            c.blocked_bandwidth += rate;
        }
    }

    fn on_departure(&mut self, _event: &Event) {
        if self.is_counting() {
            self.departures += 1;
        }
    }
}

/// Observer writing every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl SimulationObserver for LogTracer {
    fn on_arrival(&mut self, event: &Event) {
        trace!("{event}");
    }

    fn on_accept(&mut self, flow: &Flow, lightpath: &LightPath, reused: bool) {
        debug!(
            "accept flow {} on lightpath {} (links {:?}, slots {}..{}, p-cycle {:?}{})",
            flow.id(),
            lightpath.id(),
            lightpath.links(),
            lightpath.slots().first().map(|s| s.slot).unwrap_or_default(),
            lightpath.slots().last().map(|s| s.slot + 1).unwrap_or_default(),
            lightpath.p_cycle(),
            if reused { ", reused" } else { "" },
        );
    }

    fn on_block(&mut self, flow: &Flow) {
        debug!(
            "block flow {} ({} -> {}, rate {})",
            flow.id(),
            flow.source(),
            flow.destination(),
            flow.rate()
        );
    }

    fn on_departure(&mut self, event: &Event) {
        trace!("{event}");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Slot;
    use approx::assert_relative_eq;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    fn flow(id: usize, src: NodeId, dst: NodeId, rate: u32, cos: u32) -> Flow {
        Flow::new(id, src, dst, id as f64, rate, 1.0, cos, id as f64).unwrap()
    }

    fn lightpath(links: Vec<usize>) -> LightPath {
        LightPath::new(0, 0, 1, links, vec![Slot::new(0, 0)], 0, Some(0)).unwrap()
    }

    #[test]
    fn ratios() {
        let stats = RunStats::default();
        assert_relative_eq!(stats.blocking_probability(), 0.0);
        assert_relative_eq!(stats.mean_hops(), 0.0);
        let stats = RunStats {
            arrivals: 4,
            accepted: 3,
            blocked: 1,
            required_bandwidth: 100,
            blocked_bandwidth: 40,
            hops: 7,
            ..Default::default()
        };
        assert_relative_eq!(stats.blocking_probability(), 0.25);
        assert_relative_eq!(stats.acceptance_ratio(), 0.75);
        assert_relative_eq!(stats.bandwidth_blocking_ratio(), 0.4);
        assert_relative_eq!(stats.mean_hops(), 7.0 / 3.0);
    }

    #[test]
    fn counters_per_class_and_pair() {
        let (a, b, c) = (flow(0, 0, 1, 10, 0), flow(1, 0, 1, 30, 1), flow(2, 1, 2, 20, 0));
        let mut stats = RunStats::default();
        stats.on_arrival(&Event::arrival(a.clone()));
        stats.on_accept(&a, &lightpath(vec![0]), false);
        stats.on_arrival(&Event::arrival(b.clone()));
        stats.on_block(&b);
        stats.on_arrival(&Event::arrival(c.clone()));
        stats.on_accept(&c, &lightpath(vec![1, 2]), true);
        stats.on_departure(&Event::departure(&a));

        assert_eq!(
            (stats.arrivals, stats.accepted, stats.blocked, stats.departures),
            (3, 2, 1, 1)
        );
        assert_eq!((stats.required_bandwidth, stats.blocked_bandwidth), (60, 30));
        assert_eq!((stats.p_cycles_created, stats.p_cycles_reused), (1, 1));
        assert_relative_eq!(stats.mean_hops(), 1.5);
        assert_eq!(
            stats.per_cos,
            btreemap! {
                0 => BlockingCounters { arrivals: 2, required_bandwidth: 30, ..Default::default() },
                1 => BlockingCounters {
                    arrivals: 1,
                    blocked: 1,
                    required_bandwidth: 30,
                    blocked_bandwidth: 30,
                },
            }
        );
        assert_relative_eq!(stats.per_cos[&1].blocking_probability(), 1.0);

        let pair = stats.pair(0, 1);
        assert_eq!((pair.arrivals, pair.blocked), (2, 1));
        assert_relative_eq!(pair.blocking_probability(), 0.5);
        assert_relative_eq!(pair.bandwidth_blocking_ratio(), 0.75);
        assert_eq!(stats.pair(1, 2).blocked, 0);
        assert_eq!(stats.pair(2, 0), BlockingCounters::default());

        // only one of the six pairs of three nodes sees any blocking
        assert_relative_eq!(stats.jain_fairness_index(3), 1.0 / 6.0);

        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(serde_json::from_str::<RunStats>(&json).unwrap(), stats);
    }

    #[test]
    fn fairness_index() {
        assert_relative_eq!(RunStats::default().jain_fairness_index(4), 1.0);

        let mut stats = RunStats::default();
        for (i, (src, dst)) in [(0, 1), (1, 0)].into_iter().enumerate() {
            let f = flow(i, src, dst, 10, 0);
            stats.on_arrival(&Event::arrival(f.clone()));
            stats.on_block(&f);
        }
        assert_relative_eq!(stats.jain_fairness_index(2), 1.0);
        assert_relative_eq!(stats.jain_fairness_index(3), 2.0 / 6.0);
    }

    #[test]
    fn warmup_is_not_counted() {
        let (a, b, c) = (flow(0, 0, 1, 10, 0), flow(1, 0, 1, 30, 1), flow(2, 1, 2, 20, 2));
        let mut stats = RunStats::with_warmup(2);
        stats.on_arrival(&Event::arrival(a.clone()));
        stats.on_accept(&a, &lightpath(vec![0]), false);
        stats.on_arrival(&Event::arrival(b.clone()));
        stats.on_block(&b);
        stats.on_departure(&Event::departure(&b));
        assert!(!stats.is_counting());
        assert_eq!(
            stats,
            RunStats {
                warmup: 2,
                seen_arrivals: 2,
                ..Default::default()
            }
        );

        stats.on_arrival(&Event::arrival(c.clone()));
        stats.on_block(&c);
        // flow a arrived during the warm-up, but departs after it
        stats.on_departure(&Event::departure(&a));
        assert!(stats.is_counting());
        assert_eq!(
            (stats.arrivals, stats.accepted, stats.blocked, stats.departures),
            (1, 0, 1, 1)
        );
        assert_eq!(stats.per_cos.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(stats.pair(0, 1), BlockingCounters::default());
        assert_relative_eq!(stats.bandwidth_blocking_ratio(), 1.0);
    }
}
