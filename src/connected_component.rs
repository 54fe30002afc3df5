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

//! Connected-component labeling of free spectrum.
//!
//! A region is a maximal set of free cells that are connected through their row or column
//! neighbors (no diagonals). Labeling is a classic two-pass raster scan. The first pass assigns
//! provisional labels and records equivalences in a union-find structure sized by the matrix. The
//! second pass resolves each provisional label to its root and compacts the roots to `1..=K` in
//! the order in which they are first seen.
//!
//! The result is fully deterministic: regions found earlier in row-major order get lower labels,
//! and the slots of a region are listed in row-major order.

use std::collections::{BTreeMap, HashMap};

use union_find::{QuickUnionUf, UnionBySize, UnionFind};

use crate::{spectrum::SpectrumMatrix, types::Slot};

/// Free regions of a spectrum matrix, indexed by their compacted label (starting at 1).
pub type Regions = BTreeMap<usize, Vec<Slot>>;

/// Label all 4-connected regions of free cells in the matrix (`true` = free).
pub fn list_of_regions(matrix: &SpectrumMatrix) -> Regions {
    let rows = matrix.len();
    let cols = matrix.iter().map(|r| r.len()).max().unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Regions::new();
    }
    let free = |r: usize, c: usize| matrix[r].get(c).copied().unwrap_or(false);
    let idx = |r: usize, c: usize| r * cols + c;

    // label 0 is the background
    let mut provisional = vec![0usize; rows * cols];
    let mut uf = QuickUnionUf::<UnionBySize>::new(rows * cols + 1);
    let mut next_label = 1;

    for r in 0..rows {
        for c in 0..cols {
            if !free(r, c) {
                continue;
            }
            let left = if c > 0 { provisional[idx(r, c - 1)] } else { 0 };
            let up = if r > 0 { provisional[idx(r - 1, c)] } else { 0 };
            provisional[idx(r, c)] = match (left, up) {
                (0, 0) => {
                    next_label += 1;
                    next_label - 1
                }
                (l, 0) | (0, l) => l,
                (l, u) => {
                    if l != u {
                        uf.union(l, u);
                    }
                    l.min(u)
                }
            };
        }
    }

    let mut compact: HashMap<usize, usize> = HashMap::new();
    let mut regions = Regions::new();
    for r in 0..rows {
        for c in 0..cols {
            let label = provisional[idx(r, c)];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            let next = compact.len() + 1;
            let label = *compact.entry(root).or_insert(next);
            regions.entry(label).or_default().push(Slot::new(r, c));
        }
    }
    regions
}

/// Pick the first region (in label order) that contains `demand` contiguous slots on one core,
/// and return the lowest such window of that region.
pub fn first_fitting_window(regions: &Regions, demand: usize) -> Option<Vec<Slot>> {
    if demand == 0 {
        return None;
    }
    regions.values().find_map(|slots| {
        let mut run_start = 0;
        for i in 0..slots.len() {
            if i > 0 && !(slots[i].core == slots[i - 1].core && slots[i].slot == slots[i - 1].slot + 1)
            {
                run_start = i;
            }
            if i + 1 - run_start == demand {
                return Some(slots[run_start..=i].to_vec());
            }
        }
        None
    })
}
