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

//! Scenario configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "topology": {
//!     "nodes": 3, "cores": 1, "slots": 64, "slot_capacity": 12.5,
//!     "links": [
//!       { "id": 0, "src": 0, "dst": 1, "weight": 1.0 },
//!       { "id": 1, "src": 1, "dst": 2, "weight": 1.0 },
//!       { "id": 2, "src": 2, "dst": 0, "weight": 1.0 }
//!     ]
//!   },
//!   "traffic": {
//!     "calls": 1000,
//!     "call_types": [ { "rate": 25, "weight": 1, "holding_time": 1.0 } ],
//!     "warmup_arrivals": 100
//!   },
//!   "rsa": { "kind": "fipp-bfs", "sharing": "additive" },
//!   "loads": { "min": 10, "max": 200, "step": 20 },
//!   "seed": 42
//! }
//! ```

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    rsa::RsaConfig,
    topology::{LinkSpec, PhysicalTopology},
    types::EonError,
};

/// Errors that can occur while loading a scenario.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file cannot be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON, or does not describe a scenario
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    /// The scenario is inconsistent
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Physical network description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Number of nodes, named `0..nodes`
    pub nodes: usize,
    /// Number of cores on every link
    #[serde(default = "default_cores")]
    pub cores: usize,
    /// Number of slots on every core
    pub slots: usize,
    /// Bandwidth of a single slot
    #[serde(default = "default_slot_capacity")]
    pub slot_capacity: f64,
    /// All links
    pub links: Vec<LinkSpec>,
}

fn default_cores() -> usize {
    1
}

fn default_slot_capacity() -> f64 {
    12.5
}

/// One class of calls of the traffic mix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallType {
    /// Requested bandwidth
    pub rate: u32,
    /// Class of service
    #[serde(default)]
    pub cos: u32,
    /// Relative frequency of this call type
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Mean holding time
    #[serde(default = "default_holding_time")]
    pub holding_time: f64,
}

fn default_weight() -> u32 {
    1
}

fn default_holding_time() -> f64 {
    1.0
}

/// Traffic description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Number of flows to generate
    pub calls: usize,
    /// Rate used to normalize the load. Defaults to the largest rate of all call types.
    #[serde(default)]
    pub max_rate: Option<u32>,
    /// The traffic mix
    pub call_types: Vec<CallType>,
    /// Number of arrivals at the start of every run that are not counted in the statistics
    #[serde(default)]
    pub warmup_arrivals: usize,
}

/// Offered loads of the sweep: `min, min + step, ...` up to (and including) `max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSweep {
    /// Smallest load
    pub min: u32,
    /// Largest load
    pub max: u32,
    /// Increment
    pub step: u32,
}

impl Default for LoadSweep {
    fn default() -> Self {
        Self {
            min: 10,
            max: 200,
            step: 20,
        }
    }
}

impl LoadSweep {
    /// All loads of the sweep.
    pub fn values(&self) -> Vec<f64> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.min..=self.max)
            .step_by(self.step as usize)
            .map(f64::from)
            .collect()
    }
}

fn default_seed() -> u64 {
    1
}

/// A complete scenario: network, traffic, strategy and the loads to simulate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// The physical network
    pub topology: TopologyConfig,
    /// The traffic mix
    pub traffic: TrafficConfig,
    /// The RSA strategy
    #[serde(default)]
    pub rsa: RsaConfig,
    /// Loads to sweep
    #[serde(default)]
    pub loads: LoadSweep,
    /// Seed of the traffic generator
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl ScenarioConfig {
    /// Load and validate a scenario from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a scenario from a JSON string.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the scenario is consistent.
    pub fn validate(&self) -> ConfigResult<()> {
        let t = &self.topology;
        if t.nodes < 2 {
            return Err(ConfigError::Validation(format!(
                "at least two nodes are required (got {})",
                t.nodes
            )));
        }
        if t.cores == 0 || t.slots == 0 {
            return Err(ConfigError::Validation(
                "links need at least one core and one slot".to_string(),
            ));
        }
        if t.slot_capacity.is_nan() || t.slot_capacity <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "slot capacity must be positive (got {})",
                t.slot_capacity
            )));
        }

        let mut ids = HashSet::new();
        let mut pairs = HashSet::new();
        for link in &t.links {
            if !ids.insert(link.id) {
                return Err(ConfigError::Validation(format!("duplicate link id {}", link.id)));
            }
            if link.src >= t.nodes || link.dst >= t.nodes {
                return Err(ConfigError::Validation(format!(
                    "link {} connects unknown nodes {} and {}",
                    link.id, link.src, link.dst
                )));
            }
            if link.src == link.dst {
                return Err(ConfigError::Validation(format!("link {} is a self-loop", link.id)));
            }
            if !pairs.insert((link.src.min(link.dst), link.src.max(link.dst))) {
                return Err(ConfigError::Validation(format!(
                    "nodes {} and {} are connected twice",
                    link.src, link.dst
                )));
            }
            for (name, value) in [
                ("delay", link.delay),
                ("weight", link.weight),
                ("distance", link.distance),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "link {} has an invalid {name}: {value}",
                        link.id
                    )));
                }
            }
        }

        let traffic = &self.traffic;
        if traffic.call_types.is_empty() {
            return Err(ConfigError::Validation("no call types".to_string()));
        }
        if traffic.call_types.iter().all(|c| c.weight == 0) {
            return Err(ConfigError::Validation(
                "all call types have zero weight".to_string(),
            ));
        }
        for c in &traffic.call_types {
            if c.rate < 1 {
                return Err(ConfigError::Validation("call rate must be at least 1".to_string()));
            }
            if !c.holding_time.is_finite() || c.holding_time <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "invalid holding time {}",
                    c.holding_time
                )));
            }
        }
        if traffic.max_rate == Some(0) {
            return Err(ConfigError::Validation("max rate must be positive".to_string()));
        }
        if traffic.warmup_arrivals > 0 && traffic.warmup_arrivals >= traffic.calls {
            return Err(ConfigError::Validation(format!(
                "warm-up of {} arrivals leaves nothing to measure out of {} calls",
                traffic.warmup_arrivals, traffic.calls
            )));
        }

        if self.loads.step == 0 || self.loads.min == 0 || self.loads.min > self.loads.max {
            return Err(ConfigError::Validation(format!(
                "invalid load sweep {:?}",
                self.loads
            )));
        }
        if self.rsa.k_paths == 0 {
            return Err(ConfigError::Validation("k_paths must be positive".to_string()));
        }
        Ok(())
    }

    /// Build the (empty) physical topology.
    pub fn build_topology(&self) -> Result<PhysicalTopology, EonError> {
        let t = &self.topology;
        PhysicalTopology::new(
            t.nodes,
            t.cores,
            t.slots,
            t.slot_capacity,
            t.links.iter().cloned(),
        )
    }
}
