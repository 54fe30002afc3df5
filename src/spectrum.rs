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

//! Spectrum occupancy of a single physical link, and the helpers operating on spectrum matrices.
//!
//! A [`SpectrumMatrix`] is a `cores x slots` matrix of booleans, where `true` means the slot is
//! free. All search functions in this module scan core-major, and then by ascending slot index.
//! A window never spans multiple cores.

use crate::types::{EonError, LinkId, Slot};

/// Matrix of `cores x slots`, where `true` marks a free slot.
pub type SpectrumMatrix = Vec<Vec<bool>>;

/// Occupancy of all slots on all cores of a single link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumGrid {
    link: LinkId,
    cores: usize,
    slots: usize,
    occupied: Vec<bool>,
    num_reserved: usize,
}

impl SpectrumGrid {
    /// Create an empty grid for the given link.
    pub fn new(link: LinkId, cores: usize, slots: usize) -> Self {
        Self {
            link,
            cores,
            slots,
            occupied: vec![false; cores * slots],
            num_reserved: 0,
        }
    }

    /// Number of cores
    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Number of slots on each core
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Total number of slots on all cores.
    pub fn capacity(&self) -> usize {
        self.cores * self.slots
    }

    fn index(&self, slot: Slot) -> Result<usize, EonError> {
        if slot.core < self.cores && slot.slot < self.slots {
            Ok(slot.core * self.slots + slot.slot)
        } else {
            Err(EonError::InvalidSlot {
                link: self.link,
                slot,
                cores: self.cores,
                slots: self.slots,
            })
        }
    }

    fn indices(&self, slots: &[Slot]) -> Result<Vec<usize>, EonError> {
        slots.iter().map(|s| self.index(*s)).collect()
    }

    /// Check if a single position is free. Positions outside of the grid are never available.
    pub fn available(&self, core: usize, slot: usize) -> bool {
        self.index(Slot::new(core, slot))
            .map(|i| !self.occupied[i])
            .unwrap_or(false)
    }

    /// Check that none of the given slots is reserved.
    pub fn are_available(&self, slots: &[Slot]) -> Result<bool, EonError> {
        Ok(self.indices(slots)?.into_iter().all(|i| !self.occupied[i]))
    }

    /// Reserve all given slots.
    ///
    /// The operation is atomic. If any slot is outside of the grid, or already reserved, an error
    /// is returned and the grid remains unchanged.
    pub fn reserve(&mut self, slots: &[Slot]) -> Result<(), EonError> {
        let idx = self.indices(slots)?;
        if let Some((slot, _)) = slots.iter().zip(idx.iter()).find(|(_, i)| self.occupied[**i]) {
            return Err(EonError::SlotConflict {
                link: self.link,
                slot: *slot,
            });
        }
        for i in idx {
            if !self.occupied[i] {
                self.occupied[i] = true;
                self.num_reserved += 1;
            }
        }
        Ok(())
    }

    /// Release all given slots. Releasing a free slot does nothing. Slots outside of the grid are
    /// rejected before anything is changed.
    pub fn release(&mut self, slots: &[Slot]) -> Result<(), EonError> {
        for i in self.indices(slots)? {
            if self.occupied[i] {
                self.occupied[i] = false;
                self.num_reserved -= 1;
            }
        }
        Ok(())
    }

    /// Number of free slots
    pub fn free_count(&self) -> usize {
        self.capacity() - self.num_reserved
    }

    /// Number of reserved slots
    pub fn reserved_count(&self) -> usize {
        self.num_reserved
    }

    /// Iterate over all reserved slots in row-major order.
    pub fn reserved_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        let slots = self.slots;
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, o)| **o)
            .map(move |(i, _)| Slot::new(i / slots, i % slots))
    }

    /// Get the spectrum matrix of this link (`true` = free).
    pub fn spectrum_matrix(&self) -> SpectrumMatrix {
        (0..self.cores)
            .map(|core| {
                self.occupied[core * self.slots..(core + 1) * self.slots]
                    .iter()
                    .map(|o| !o)
                    .collect()
            })
            .collect()
    }

    /// Fragmentation of this link, averaged over all cores. See [`row_fragmentation`].
    pub fn fragmentation(&self) -> f64 {
        if self.cores == 0 {
            return 0.0;
        }
        self.spectrum_matrix()
            .iter()
            .map(|row| row_fragmentation(row))
            .sum::<f64>()
            / self.cores as f64
    }
}

/// Create a matrix where all slots are free.
pub fn full_matrix(cores: usize, slots: usize) -> SpectrumMatrix {
    vec![vec![true; slots]; cores]
}

/// Bitmap AND, storing the result in `acc`.
pub fn image_and(acc: &mut SpectrumMatrix, other: &SpectrumMatrix) {
    for (acc_row, other_row) in acc.iter_mut().zip(other) {
        for (a, o) in acc_row.iter_mut().zip(other_row) {
            *a = *a && *o;
        }
    }
}

/// Mark the given slots as used. Slots outside of the matrix are ignored.
pub fn claim(matrix: &mut SpectrumMatrix, slots: &[Slot]) {
    set_cells(matrix, slots, false)
}

/// Mark the given slots as free. Slots outside of the matrix are ignored.
pub fn unclaim(matrix: &mut SpectrumMatrix, slots: &[Slot]) {
    set_cells(matrix, slots, true)
}

fn set_cells(matrix: &mut SpectrumMatrix, slots: &[Slot], value: bool) {
    for s in slots {
        if let Some(cell) = matrix.get_mut(s.core).and_then(|r| r.get_mut(s.slot)) {
            *cell = value;
        }
    }
}

/// Check if the window `[start, start + len)` of a row is free.
pub fn window_free(row: &[bool], start: usize, len: usize) -> bool {
    start + len <= row.len() && row[start..start + len].iter().all(|free| *free)
}

/// Lowest start index of `demand` contiguous free slots in the row.
pub fn first_fit_row(row: &[bool], demand: usize) -> Option<usize> {
    if demand == 0 {
        return None;
    }
    let mut run = 0;
    for (i, free) in row.iter().enumerate() {
        if *free {
            run += 1;
            if run == demand {
                return Some(i + 1 - demand);
            }
        } else {
            run = 0;
        }
    }
    None
}

/// First-fit search: the first window of `demand` contiguous free slots, scanning core-major.
/// Returns `None` for a demand of zero.
pub fn first_fit(matrix: &SpectrumMatrix, demand: usize) -> Option<Vec<Slot>> {
    matrix.iter().enumerate().find_map(|(core, row)| {
        first_fit_row(row, demand).map(|start| Slot::window(core, start, demand))
    })
}

/// Core, lowest and highest slot index of a band. The band is assumed to lie on a single core.
pub fn band_range(band: &[Slot]) -> Option<(usize, usize, usize)> {
    let core = band.first()?.core;
    let min = band.iter().map(|s| s.slot).min()?;
    let max = band.iter().map(|s| s.slot).max()?;
    Some((core, min, max))
}

/// Grow a band until it spans `demand` slots, or find a new window elsewhere.
///
/// The band `[start, end]` is widened one slot at a time, alternating between the left and the
/// right side (starting on the left). If one side is blocked, the other side is taken. If the
/// span cannot reach `demand`, a fresh [`first_fit`] over the whole matrix is done instead. The
/// cells of the current band must already be marked free in `matrix`.
///
/// The returned window is sorted by slot index. The matrix is not modified.
pub fn extend_or_replace(matrix: &SpectrumMatrix, band: &[Slot], demand: usize) -> Option<Vec<Slot>> {
    if let Some((core, start, end)) = band_range(band) {
        if let Some(row) = matrix.get(core) {
            let (mut lo, mut hi) = (start, end);
            let mut prefer_left = true;
            while hi + 1 - lo < demand {
                let left = lo > 0 && row[lo - 1];
                let right = hi + 1 < row.len() && row[hi + 1];
                let go_left = match (left, right) {
                    (true, true) => prefer_left,
                    (true, false) => true,
                    (false, true) => false,
                    (false, false) => break,
                };
                if go_left {
                    lo -= 1;
                } else {
                    hi += 1;
                }
                prefer_left = !go_left;
            }
            if hi + 1 - lo >= demand {
                return Some(Slot::window(core, lo, hi + 1 - lo));
            }
        }
    }
    first_fit(matrix, demand)
}

/// Fragmentation of a single row: `1 - longest free run / free slots`. A row without any free
/// slot has a fragmentation of zero.
pub fn row_fragmentation(row: &[bool]) -> f64 {
    let free = row.iter().filter(|x| **x).count();
    if free == 0 {
        return 0.0;
    }
    let longest = row.split(|x| !*x).map(|run| run.len()).max().unwrap_or(0);
    1.0 - longest as f64 / free as f64
}
