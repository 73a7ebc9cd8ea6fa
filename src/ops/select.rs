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

//! Selection of grid points nearest to a location.

use crate::constants::DEFAULT_RADIUS_OF_INFLUENCE;
use crate::coords::NormalizeOptions;
use crate::data::{DataArray, Dataset};
use crate::errors::RemapError;
use crate::remap::{CoordinateDefinition, NearestResampler};
use crate::Float;
use log::debug;

impl Dataset {
    /// Finds `(x, y)` indices of the grid point nearest to the location,
    /// searching within 1000 km.
    pub fn nearest_ij(&self, lat: Float, lon: Float) -> Result<(usize, usize), RemapError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        nearest_ij_normalised(&ds, lat, lon)
    }

    /// Selects the grid point nearest to the location,
    /// dropping the `x` and `y` dimensions.
    pub fn nearest_latlon(&self, lat: Float, lon: Float) -> Result<Dataset, RemapError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        let (x, y) = nearest_ij_normalised(&ds, lat, lon)?;

        let mut point = ds.index_dim("x", x)?.index_dim("y", y)?;
        point.remove("x");
        point.remove("y");

        Ok(point)
    }
}

impl DataArray {
    pub fn nearest_ij(&self, lat: Float, lon: Float) -> Result<(usize, usize), RemapError> {
        self.to_dataset()?.nearest_ij(lat, lon)
    }

    pub fn nearest_latlon(&self, lat: Float, lon: Float) -> Result<DataArray, RemapError> {
        let point = self.to_dataset()?.nearest_latlon(lat, lon)?;
        Ok(point.data_array(self.name())?)
    }
}

pub(crate) fn nearest_ij_normalised(ds: &Dataset, lat: Float, lon: Float) -> Result<(usize, usize), RemapError> {
    let source = CoordinateDefinition::from_dataset(ds)?;
    let nx = source.shape().last().copied().unwrap_or(1);

    let mut resampler = NearestResampler::new(
        source,
        CoordinateDefinition::from_points(&[lon], &[lat])?,
        DEFAULT_RADIUS_OF_INFLUENCE,
    )?;

    let index = resampler
        .get_neighbour_info()?
        .first()
        .copied()
        .flatten()
        .ok_or(RemapError::OutsideRadius(DEFAULT_RADIUS_OF_INFLUENCE))?;

    let (x, y) = (index % nx, index / nx);
    debug!("Nearest grid point of ({}, {}) is x={}, y={}", lat, lon, x, y);

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use crate::constants::{LATITUDE, LONGITUDE};
    use crate::data::{Dataset, Variable};
    use ndarray::Array2;

    fn grid() -> Dataset {
        Dataset::new()
            .with_coord("lat", Variable::from_vec("lat", vec![30.0, 35.0, 40.0]))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", vec![250.0, 255.0, 260.0, 265.0]))
            .unwrap()
            .with_data_var(
                "t2m",
                Variable::from_array2(["lat", "lon"], Array2::from_shape_fn((3, 4), |(j, i)| (10 * j + i) as f64)),
            )
            .unwrap()
    }

    #[test]
    fn nearest_indices() {
        assert_eq!(grid().nearest_ij(36.0, -99.0).unwrap(), (2, 1));
        assert_eq!(grid().nearest_ij(29.0, -111.0).unwrap(), (0, 0));
        assert!(grid().nearest_ij(-60.0, 40.0).is_err());
    }

    #[test]
    fn nearest_point_drops_xy() {
        let point = grid().nearest_latlon(39.0, -104.0).unwrap();

        assert_eq!(point.data_var("t2m").unwrap().values().first(), Some(&21.0));
        assert_eq!(point.data_var("t2m").unwrap().ndim(), 0);
        assert!(!point.contains("x"));
        assert!(!point.contains("y"));
        assert_eq!(point.coord(LATITUDE).unwrap().values().first(), Some(&40.0));
        assert_eq!(point.coord(LONGITUDE).unwrap().values().first(), Some(&-105.0));
    }
}
