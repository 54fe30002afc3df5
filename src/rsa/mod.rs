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

//! Routing and Spectrum Assignment (RSA) strategies.
//!
//! A strategy decides for every arriving flow which route and which slots it gets, and how it is
//! protected. It acts only through the [`ControlPlane`]: it either creates a lightpath and accepts
//! the flow, or blocks it. The canonical strategy is [`FippBfs`]. [`ImageRcsa`] and
//! [`ShortestWindow`] are unprotected alternatives.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    control_plane::ControlPlane,
    flow::Flow,
    observer::SimulationObserver,
    pcycle::SharingPolicy,
    routing::bfs_path,
    spectrum::{window_free, SpectrumMatrix},
    topology::PhysicalTopology,
    types::{EonError, FlowId, LinkId, NodeId, Slot},
};

mod fipp_bfs;
mod image_rcsa;
mod shortest_window;

pub use fipp_bfs::FippBfs;
pub use image_rcsa::ImageRcsa;
pub use shortest_window::ShortestWindow;

/// Interface of an RSA strategy.
pub trait Rsa {
    /// Called once before the first event is processed.
    fn simulation_interface<O: SimulationObserver>(
        &mut self,
        _cp: &ControlPlane<O>,
    ) -> Result<(), EonError> {
        Ok(())
    }

    /// Handle the arrival of an (active) flow. The strategy must either accept or block it.
    fn flow_arrival<O: SimulationObserver>(
        &mut self,
        flow: FlowId,
        cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError>;

    /// Handle the departure of a flow. Its resources are already released. `flow` is `None` if
    /// the flow was blocked before.
    fn flow_departure<O: SimulationObserver>(
        &mut self,
        _flow: Option<&Flow>,
        _cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError> {
        Ok(())
    }
}

/// The available RSA strategies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RsaKind {
    /// p-cycle protection with per-window BFS working paths.
    #[default]
    FippBfs,
    /// Unprotected, k shortest paths with connected-component spectrum fitting.
    ImageRcsa,
    /// Unprotected, per-window BFS.
    ShortestWindow,
}

/// Parameters for building an RSA strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsaConfig {
    /// Which strategy to use
    pub kind: RsaKind,
    /// How p-cycles share their band
    pub sharing: SharingPolicy,
    /// Number of candidate paths of the image based strategy
    pub k_paths: usize,
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self {
            kind: RsaKind::default(),
            sharing: SharingPolicy::default(),
            k_paths: 10,
        }
    }
}

/// One of the available strategies, selected at runtime.
#[derive(Debug, Clone)]
pub enum RsaStrategy {
    /// See [`FippBfs`]
    FippBfs(FippBfs),
    /// See [`ImageRcsa`]
    ImageRcsa(ImageRcsa),
    /// See [`ShortestWindow`]
    ShortestWindow(ShortestWindow),
}

impl RsaStrategy {
    /// Build the strategy described by the config.
    pub fn from_config(config: &RsaConfig) -> Self {
        match config.kind {
            RsaKind::FippBfs => Self::FippBfs(FippBfs::new(config.sharing)),
            RsaKind::ImageRcsa => Self::ImageRcsa(ImageRcsa::new(config.k_paths)),
            RsaKind::ShortestWindow => Self::ShortestWindow(ShortestWindow),
        }
    }
}

impl Rsa for RsaStrategy {
    fn simulation_interface<O: SimulationObserver>(
        &mut self,
        cp: &ControlPlane<O>,
    ) -> Result<(), EonError> {
        match self {
            Self::FippBfs(r) => r.simulation_interface(cp),
            Self::ImageRcsa(r) => r.simulation_interface(cp),
            Self::ShortestWindow(r) => r.simulation_interface(cp),
        }
    }

    fn flow_arrival<O: SimulationObserver>(
        &mut self,
        flow: FlowId,
        cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError> {
        match self {
            Self::FippBfs(r) => r.flow_arrival(flow, cp),
            Self::ImageRcsa(r) => r.flow_arrival(flow, cp),
            Self::ShortestWindow(r) => r.flow_arrival(flow, cp),
        }
    }

    fn flow_departure<O: SimulationObserver>(
        &mut self,
        flow: Option<&Flow>,
        cp: &mut ControlPlane<O>,
    ) -> Result<(), EonError> {
        match self {
            Self::FippBfs(r) => r.flow_departure(flow, cp),
            Self::ImageRcsa(r) => r.flow_departure(flow, cp),
            Self::ShortestWindow(r) => r.flow_departure(flow, cp),
        }
    }
}

/// Endpoints and demand (in slots) of an active flow.
pub(crate) fn request<O: SimulationObserver>(
    cp: &ControlPlane<O>,
    flow: FlowId,
) -> Result<(NodeId, NodeId, usize), EonError> {
    let f = cp.flow(flow).ok_or(EonError::UnknownFlow(flow))?;
    Ok((
        f.source(),
        f.destination(),
        cp.pt().demand_in_slots(f.rate() as f64),
    ))
}

/// Search a working path with per-window BFS.
///
/// For every start offset (ascending), and every core (ascending), the links that have the window
/// `[offset, offset + demand)` free and that are accepted by `admit` form a subgraph, on which the
/// path with the fewest hops is searched. A path found later only replaces the best one if it has
/// strictly fewer hops, so the lowest offset wins ties.
pub fn working_path<F>(
    pt: &PhysicalTopology,
    src: NodeId,
    dst: NodeId,
    demand: usize,
    admit: F,
) -> Result<Option<(Vec<LinkId>, Vec<Slot>)>, EonError>
where
    F: Fn(LinkId) -> bool,
{
    if demand == 0 || demand > pt.slots() {
        return Ok(None);
    }
    let spectra: BTreeMap<LinkId, SpectrumMatrix> = pt
        .links()
        .map(|l| (l.id, l.grid().spectrum_matrix()))
        .collect();

    let mut best: Option<(Vec<NodeId>, usize, usize)> = None;
    'search: for offset in 0..=pt.slots() - demand {
        for core in 0..pt.cores() {
            let usable = |link: LinkId| {
                admit(link)
                    && spectra
                        .get(&link)
                        .map(|m| window_free(&m[core], offset, demand))
                        .unwrap_or(false)
            };
            let Some(path) = bfs_path(pt, src, dst, usable) else {
                continue;
            };
            if best.as_ref().map(|(p, _, _)| path.len() < p.len()).unwrap_or(true) {
                best = Some((path, core, offset));
            }
            // a direct link cannot be beaten
            if best.as_ref().map(|(p, _, _)| p.len() <= 2).unwrap_or(false) {
                break 'search;
            }
        }
    }

    match best {
        Some((path, core, offset)) => Ok(Some((
            pt.path_to_links(&path)?,
            Slot::window(core, offset, demand),
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ring() -> PhysicalTopology {
        let mut pt = PhysicalTopology::ring(4, 1, 8, 1.0).unwrap();
        pt.reserve_on_links(&[0], &Slot::window(0, 0, 2)).unwrap();
        pt
    }

    #[test]
    fn fewer_hops_beat_a_lower_offset() {
        let pt = ring();
        assert_eq!(
            working_path(&pt, 0, 1, 2, |_| true).unwrap(),
            Some((vec![0], Slot::window(0, 2, 2)))
        );
    }

    #[test]
    fn lower_offset_wins_among_equal_hops() {
        let pt = ring();
        // 0 -> 3 -> 2 at offset 0 and 0 -> 1 -> 2 at offset 2 both have two hops
        assert_eq!(
            working_path(&pt, 0, 2, 2, |_| true).unwrap(),
            Some((vec![3, 2], Slot::window(0, 0, 2)))
        );
    }

    #[test]
    fn admit_filters_links() {
        let pt = ring();
        assert_eq!(
            working_path(&pt, 0, 1, 2, |l| l != 0).unwrap(),
            Some((vec![3, 2, 1], Slot::window(0, 0, 2)))
        );
        assert_eq!(working_path(&pt, 0, 1, 9, |_| true).unwrap(), None);
        assert_eq!(working_path(&pt, 0, 1, 0, |_| true).unwrap(), None);
    }
}
