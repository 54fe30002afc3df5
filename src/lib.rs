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

//! # eonsim: Discrete-event simulator for elastic optical networks
//!
//! This crate simulates an elastic optical network (EON) with multi-core fibers under dynamic
//! traffic. Flows arrive and depart over time. For every arrival, a Routing and Spectrum
//! Assignment (RSA) strategy chooses a route and a contiguous window of frequency slots, and
//! protects the resulting lightpath with a pre-provisioned p-cycle following Failure-Independent
//! Path Protection (FIPP). Blocking and fragmentation are collected over a sweep of offered loads.
//!
//! ## Structure
//! - [`spectrum`] holds the per-link slot grid ([`spectrum::SpectrumGrid`]) and helpers on
//!   boolean spectrum matrices. [`connected_component`] labels the free regions of such a matrix.
//! - [`topology`] is the physical network ([`PhysicalTopology`]), and [`routing`] contains the
//!   path searches on it.
//! - [`virtual_topology`] keeps the established lightpaths and p-cycles ([`VirtualTopology`]).
//! - [`control_plane`] ([`ControlPlane`]) processes events and is the only component that mutates
//!   the network. The strategies in [`rsa`] act through it.
//! - [`event`] contains the event queue, [`traffic`] the Poisson traffic generator, and
//!   [`observer`] the statistics.
//! - [`config`] loads a JSON scenario, and [`simulator`] runs it ([`Simulation`], [`sweep`]).
//! - The module `experiment` (feature `experiment`) exports the results to JSON files.

#![deny(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::result_large_err)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod connected_component;
pub mod control_plane;
pub mod event;
pub mod flow;
pub mod lightpath;
pub mod observer;
pub mod pcycle;
pub mod routing;
pub mod rsa;
pub mod simulator;
pub mod spectrum;
#[cfg(test)]
mod test;
pub mod topology;
pub mod traffic;
pub mod types;
pub mod virtual_topology;

pub use config::ScenarioConfig;
pub use control_plane::ControlPlane;
pub use simulator::{sweep, RunReport, SimError, Simulation};
pub use topology::PhysicalTopology;
pub use types::{EonError, Slot};
pub use virtual_topology::VirtualTopology;

#[cfg(feature = "experiment")]
#[cfg_attr(docsrs, doc(cfg(feature = "experiment")))]
/// Export an experiment result to a json file, including the scenario.
pub mod experiment {
    use std::{
        ffi::OsStr,
        fs::{remove_file, OpenOptions},
        io::{self, Write},
        path::{Path, PathBuf},
    };

    use serde::Serialize;
    use time::{format_description, OffsetDateTime};

    use crate::config::ScenarioConfig;

    /// Structure that contains all information of an experiment.
    #[derive(Debug, Serialize)]
    pub struct Experiment<'a, T> {
        /// The simulated scenario
        pub config: &'a ScenarioConfig,
        /// Data obtained during the experiment.
        pub data: T,
    }

    impl<'a, T> Experiment<'a, T>
    where
        T: Serialize,
    {
        /// Write the json file adding to the filename `_DATE.json`. If the file already exists,
        /// append an increasing number to the filename. Returns the path of the written file.
        pub fn write_json_with_timestamp(&self, file: impl AsRef<str>) -> io::Result<PathBuf> {
            let format = format_description::parse("[year]-[month]-[day]_[hour]-[minute]-[second]")
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            let cur_time = OffsetDateTime::now_local()
                .unwrap_or_else(|_| OffsetDateTime::now_utc())
                .format(&format)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            let mut offset: Option<usize> = None;
            let file = loop {
                let filename = if let Some(offset) = offset {
                    format!("{}_{cur_time}_{}.json", file.as_ref(), offset)
                } else {
                    format!("{}_{cur_time}.json", file.as_ref())
                };
                let file = PathBuf::from(filename);
                if !file.exists() {
                    break file;
                }
                offset = Some(offset.unwrap_or_default() + 1);
            };

            self.write_json(&file)?;
            Ok(file)
        }

        /// Write the content of the experiment to a json file.
        ///
        /// This function will overwrite any existing file.
        pub fn write_json(&self, file: impl AsRef<OsStr>) -> io::Result<()> {
            let exp_str = serde_json::to_string_pretty(self)?;

            let file = Path::new(file.as_ref());
            if file.exists() {
                remove_file(file)?;
            }
            let mut file = OpenOptions::new().create(true).write(true).open(file)?;
            writeln!(file, "{exp_str}")?;
            Ok(())
        }
    }
}
