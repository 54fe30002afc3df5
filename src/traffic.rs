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

//! Poisson traffic generator.

use log::debug;
use rand::{distributions::WeightedIndex, prelude::*};
use rand_distr::Exp;

use crate::{
    config::{ConfigError, TrafficConfig},
    event::{Event, EventScheduler},
    flow::Flow,
    types::{EonError, SimTime},
};

/// Generates the arrivals and departures of a single run.
///
/// Calls are drawn by weight from the traffic mix. Inter-arrival and holding times are
/// exponentially distributed. The load scales the arrival rate: the mean inter-arrival time is
/// `(mean_holding_time * mean_rate / max_rate) / load`.
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    config: TrafficConfig,
    pick: WeightedIndex<u32>,
    holding: Vec<Exp<f64>>,
    arrival: Exp<f64>,
    mean_rate: f64,
    mean_holding_time: f64,
    max_rate: f64,
    load: f64,
}

impl TrafficGenerator {
    /// Prepare the distributions for the given load.
    pub fn new(config: &TrafficConfig, load: f64) -> Result<Self, ConfigError> {
        if !load.is_finite() || load <= 0.0 {
            return Err(ConfigError::Validation(format!("invalid load {load}")));
        }
        let pick = WeightedIndex::new(config.call_types.iter().map(|c| c.weight))
            .map_err(|e| ConfigError::Validation(format!("invalid call weights: {e}")))?;

        let total_weight: f64 = config.call_types.iter().map(|c| c.weight as f64).sum();
        let mean_rate = config
            .call_types
            .iter()
            .map(|c| c.rate as f64 * c.weight as f64)
            .sum::<f64>()
            / total_weight;
        let mean_holding_time = config
            .call_types
            .iter()
            .map(|c| c.holding_time * c.weight as f64)
            .sum::<f64>()
            / total_weight;
        let max_rate = config
            .max_rate
            .or_else(|| config.call_types.iter().map(|c| c.rate).max())
            .unwrap_or(1) as f64;

        let holding = config
            .call_types
            .iter()
            .map(|c| exp_with_mean(c.holding_time))
            .collect::<Result<Vec<_>, _>>()?;
        let arrival = exp_with_mean((mean_holding_time * mean_rate / max_rate) / load)?;

        Ok(Self {
            config: config.clone(),
            pick,
            holding,
            arrival,
            mean_rate,
            mean_holding_time,
            max_rate,
            load,
        })
    }

    /// Weighted mean rate of the traffic mix.
    pub fn mean_rate(&self) -> f64 {
        self.mean_rate
    }

    /// Weighted mean holding time of the traffic mix.
    pub fn mean_holding_time(&self) -> f64 {
        self.mean_holding_time
    }

    /// Mean time between two arrivals.
    pub fn mean_arrival_time(&self) -> f64 {
        (self.mean_holding_time * self.mean_rate / self.max_rate) / self.load
    }

    /// Generate all flows, ordered by arrival time. The same seed yields the same flows.
    pub fn generate(&self, num_nodes: usize, seed: u64) -> Result<Vec<Flow>, EonError> {
        if num_nodes < 2 {
            return Err(EonError::InvalidTopology(format!(
                "cannot generate traffic on {num_nodes} nodes"
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut time: SimTime = 0.0;
        let mut flows = Vec::with_capacity(self.config.calls);

        for id in 0..self.config.calls {
            let kind = self.pick.sample(&mut rng);
            let call = &self.config.call_types[kind];
            let holding = self.holding[kind].sample(&mut rng);
            let src = rng.gen_range(0..num_nodes);
            let mut dst = rng.gen_range(0..num_nodes - 1);
            if dst >= src {
                dst += 1;
            }
            flows.push(Flow::new(
                id,
                src,
                dst,
                time,
                call.rate,
                holding,
                call.cos,
                time + 0.5 * holding,
            )?);
            time += self.arrival.sample(&mut rng);
        }
        Ok(flows)
    }

    /// Generate all flows and schedule their arrival and departure events.
    pub fn generate_traffic(
        &self,
        num_nodes: usize,
        events: &mut EventScheduler,
        seed: u64,
    ) -> Result<(), EonError> {
        let flows = self.generate(num_nodes, seed)?;
        debug!(
            "generated {} flows at load {} (mean inter-arrival time {:.4})",
            flows.len(),
            self.load,
            self.mean_arrival_time()
        );
        for flow in flows {
            let departure = Event::departure(&flow);
            events.add_event(Event::arrival(flow))?;
            events.add_event(departure)?;
        }
        Ok(())
    }
}

fn exp_with_mean(mean: f64) -> Result<Exp<f64>, ConfigError> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "exponential distribution needs a positive mean (got {mean})"
        )));
    }
    Exp::new(1.0 / mean).map_err(|e| ConfigError::Validation(format!("{e:?}")))
}
