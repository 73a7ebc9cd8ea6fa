/*
Copyright 2021 Jakub Lewandowski

This file is part of MONET Geospatial Accessors (monet-rs).

MONET Geospatial Accessors (monet-rs) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

MONET Geospatial Accessors (monet-rs) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with MONET Geospatial Accessors (monet-rs). If not, see https://www.gnu.org/licenses/.
*/

//! Windowing of grids to a region between lower-left
//! and upper-right corners.

use super::select::nearest_ij_normalised;
use crate::coords::{wrap_longitude, NormalizeOptions};
use crate::data::{DataArray, Dataset};
use crate::errors::RemapError;
use crate::Float;
use log::debug;

/// Index range from `start` to `end` inclusive, wrapping
/// around the axis end when `end < start`.
///
/// The grid point nearest to the upper-right corner is part of the
/// window whether or not the range wraps.
fn wrapping_range(start: usize, end: usize, len: usize) -> Vec<usize> {
    if end < start {
        (start..len).chain(0..=end).collect()
    } else {
        (start..=end).collect()
    }
}

fn within(value: Float, a: Float, b: Float) -> bool {
    value >= a.min(b) && value <= a.max(b)
}

impl Dataset {
    /// Selects the region between corners `(lat_min, lon_min)`
    /// and `(lat_max, lon_max)`.
    ///
    /// Rectilinear grids are selected by coordinate values, which works
    /// for both ascending and descending latitude axes. Other grids are
    /// selected by index ranges between the grid points nearest to the
    /// corners, the ranges wrap around the grid when the upper-right
    /// index is lower than the lower-left one.
    pub fn window(
        &self,
        lat_min: Float,
        lon_min: Float,
        lat_max: Float,
        lon_max: Float,
        rectilinear: bool,
    ) -> Result<Dataset, RemapError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;

        let (xs, ys) = if rectilinear {
            let (lat, lon) = ds.rectilinear_axes()?;
            let (lon_min, lon_max) = (wrap_longitude(lon_min), wrap_longitude(lon_max));

            let ys: Vec<usize> = (0..lat.len()).filter(|j| within(lat[*j], lat_min, lat_max)).collect();
            let xs: Vec<usize> = (0..lon.len())
                .filter(|i| {
                    if lon_min <= lon_max {
                        within(lon[*i], lon_min, lon_max)
                    } else {
                        // window crossing the dateline
                        lon[*i] >= lon_min || lon[*i] <= lon_max
                    }
                })
                .collect();
            (xs, ys)
        } else {
            let nx = ds.dim_len("x").unwrap_or(1);
            let ny = ds.dim_len("y").unwrap_or(1);

            let (x_ll, y_ll) = nearest_ij_normalised(&ds, lat_min, lon_min)?;
            let (x_ur, y_ur) = nearest_ij_normalised(&ds, lat_max, lon_max)?;

            (wrapping_range(x_ll, x_ur, nx), wrapping_range(y_ll, y_ur, ny))
        };

        debug!("Window spans {} columns and {} rows", xs.len(), ys.len());

        Ok(ds.isel("x", &xs)?.isel("y", &ys)?)
    }
}

impl DataArray {
    pub fn window(
        &self,
        lat_min: Float,
        lon_min: Float,
        lat_max: Float,
        lon_max: Float,
        rectilinear: bool,
    ) -> Result<DataArray, RemapError> {
        let ds = self
            .to_dataset()?
            .window(lat_min, lon_min, lat_max, lon_max, rectilinear)?;
        Ok(ds.data_array(self.name())?)
    }
}
