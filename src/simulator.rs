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

//! Running a scenario: a single simulation, or a sweep over all configured loads.

use log::{error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{ConfigError, ScenarioConfig},
    control_plane::ControlPlane,
    event::{Event, EventScheduler},
    observer::{LogTracer, RunStats},
    rsa::{Rsa, RsaConfig, RsaStrategy},
    topology::PhysicalTopology,
    traffic::TrafficGenerator,
    types::{EonError, FlowId, SimTime},
};

/// Errors that abort a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    /// The scenario is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The simulation could not be set up
    #[error("{0}")]
    Eon(#[from] EonError),
    /// Processing an event failed
    #[error("Error at time {time} while processing flow {flow}: {source}")]
    Event {
        /// Time of the failed event
        time: SimTime,
        /// Flow of the failed event
        flow: FlowId,
        /// The underlying error
        #[source]
        source: EonError,
    },
}

/// Summary of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Offered load
    pub load: f64,
    /// Seed of the traffic generator
    pub seed: u64,
    /// The strategy used
    pub rsa: RsaConfig,
    /// Counters
    pub stats: RunStats,
    /// Fraction of blocked flows
    pub blocking_probability: f64,
    /// Fraction of blocked bandwidth
    pub bandwidth_blocking_ratio: f64,
    /// Jain's fairness index of the bandwidth blocking ratio over all node pairs
    pub jain_fairness_index: f64,
    /// Mean number of links of the accepted flows
    pub mean_hops: f64,
    /// Mean link fragmentation, averaged over all arrivals
    pub mean_fragmentation: f64,
    /// Number of free slots in the network, averaged over all arrivals
    pub mean_free_slots: f64,
    /// Largest number of p-cycles alive at the same time
    pub peak_p_cycles: usize,
    /// Largest number of lightpaths alive at the same time
    pub peak_light_paths: usize,
}

/// A single, isolated simulation run.
#[derive(Debug)]
pub struct Simulation {
    cp: ControlPlane<(RunStats, LogTracer)>,
    rsa: RsaStrategy,
    rsa_config: RsaConfig,
    events: EventScheduler,
    load: f64,
    seed: u64,
    fragmentation_sum: f64,
    free_slots_sum: f64,
    samples: usize,
    peak_p_cycles: usize,
    peak_light_paths: usize,
}

impl Simulation {
    /// Build the topology and the traffic of the scenario for the given load.
    pub fn new(config: &ScenarioConfig, load: f64, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let pt = config.build_topology()?;
        let generator = TrafficGenerator::new(&config.traffic, load)?;
        let mut events = EventScheduler::new();
        generator.generate_traffic(pt.num_nodes(), &mut events, seed)?;
        let stats = RunStats::with_warmup(config.traffic.warmup_arrivals);
        let mut sim = Self::with_stats(pt, config.rsa, events, stats)?;
        sim.load = load;
        sim.seed = seed;
        Ok(sim)
    }

    /// Build a simulation from an existing topology and a prepared event queue.
    pub fn from_parts(
        pt: PhysicalTopology,
        rsa_config: RsaConfig,
        events: EventScheduler,
    ) -> Result<Self, SimError> {
        Self::with_stats(pt, rsa_config, events, RunStats::default())
    }

    fn with_stats(
        pt: PhysicalTopology,
        rsa_config: RsaConfig,
        events: EventScheduler,
        stats: RunStats,
    ) -> Result<Self, SimError> {
        let cp = ControlPlane::new(pt, (stats, LogTracer));
        let mut rsa = RsaStrategy::from_config(&rsa_config);
        rsa.simulation_interface(&cp)?;
        Ok(Self {
            cp,
            rsa,
            rsa_config,
            events,
            load: 0.0,
            seed: 0,
            fragmentation_sum: 0.0,
            free_slots_sum: 0.0,
            samples: 0,
            peak_p_cycles: 0,
            peak_light_paths: 0,
        })
    }

    /// The control plane of the simulation
    pub fn control_plane(&self) -> &ControlPlane<(RunStats, LogTracer)> {
        &self.cp
    }

    /// Counters collected so far
    pub fn stats(&self) -> &RunStats {
        &self.cp.observer().0
    }

    /// Number of events still waiting
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Process the next event. Returns its time, or `None` if no event is left.
    pub fn step(&mut self) -> Result<Option<SimTime>, SimError> {
        let Some(event) = self.events.pop_event() else {
            return Ok(None);
        };
        let time = event.time();
        let flow = event.flow_id();
        let is_arrival = matches!(event, Event::Arrival { .. });

        self.cp
            .new_event(&mut self.rsa, event)
            .map_err(|source| SimError::Event { time, flow, source })?;

        if is_arrival {
            let pt = self.cp.pt();
            self.fragmentation_sum += pt.mean_fragmentation();
            self.free_slots_sum += pt.free_slot_count() as f64;
            self.samples += 1;
            self.peak_p_cycles = self.peak_p_cycles.max(self.cp.vt().num_p_cycles());
            self.peak_light_paths = self.peak_light_paths.max(self.cp.vt().num_light_paths());
        }
        Ok(Some(time))
    }

    /// Process all events and summarize the run.
    pub fn run(mut self) -> Result<RunReport, SimError> {
        info!(
            "Start run with {:?} at load {} (seed {}, {} events)",
            self.rsa_config.kind,
            self.load,
            self.seed,
            self.events.len()
        );
        while self.step()?.is_some() {}

        let pt = self.cp.pt();
        let capacity = pt.num_links() * pt.cores() * pt.slots();
        if pt.free_slot_count() != capacity || self.cp.vt().num_p_cycles() > 0 {
            warn!(
                "Run at load {} ended with {} of {} slots still reserved and {} p-cycles alive",
                self.load,
                capacity - pt.free_slot_count(),
                capacity,
                self.cp.vt().num_p_cycles()
            );
        }

        let samples = self.samples.max(1) as f64;
        let num_nodes = pt.num_nodes();
        let stats = self.cp.into_observer().0;
        info!(
            "Finished run at load {}: {} of {} flows blocked",
            self.load, stats.blocked, stats.arrivals
        );
        Ok(RunReport {
            load: self.load,
            seed: self.seed,
            rsa: self.rsa_config,
            blocking_probability: stats.blocking_probability(),
            bandwidth_blocking_ratio: stats.bandwidth_blocking_ratio(),
            jain_fairness_index: stats.jain_fairness_index(num_nodes),
            mean_hops: stats.mean_hops(),
            stats,
            mean_fragmentation: self.fragmentation_sum / samples,
            mean_free_slots: self.free_slots_sum / samples,
            peak_p_cycles: self.peak_p_cycles,
            peak_light_paths: self.peak_light_paths,
        })
    }
}

/// Run the scenario for every configured load, in parallel on the global rayon pool. Failed
/// runs are logged and left out of the result.
pub fn sweep(config: &ScenarioConfig) -> Vec<RunReport> {
    config
        .loads
        .values()
        .into_par_iter()
        .filter_map(|load| {
            match Simulation::new(config, load, config.seed).and_then(Simulation::run) {
                Ok(report) => Some(report),
                Err(e) => {
                    error!("Run at load {load} failed: {e}");
                    None
                }
            }
        })
        .collect()
}
