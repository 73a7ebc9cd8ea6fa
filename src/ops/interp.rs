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

//! Transects of grids at constant latitude or longitude.

use crate::constants::{DEFAULT_RADIUS_OF_INFLUENCE, LATITUDE, LONGITUDE};
use crate::coords::NormalizeOptions;
use crate::data::{DataArray, Dataset, Variable};
use crate::errors::{CoordError, RemapError};
use crate::Float;
use ndarray::Array1;

fn linspace(start: Float, end: Float, n: usize) -> Vec<Float> {
    Array1::linspace(start, end, n).to_vec()
}

fn transect(lats: Vec<Float>, lons: Vec<Float>) -> Result<Dataset, RemapError> {
    Ok(Dataset::new()
        .with_coord("lat", Variable::from_vec("lat", lats))?
        .with_coord("lon", Variable::from_vec("lon", lons))?)
}

impl Dataset {
    /// Nearest-neighbour transect along the latitude, with as many evenly
    /// spaced longitudes between grid extremes as the grid has columns.
    pub fn interp_constant_lat(&self, lat: Float) -> Result<Dataset, RemapError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        let (lon_min, lon_max) = ds.try_get(LONGITUDE)?.min_max().ok_or(CoordError::EmptyAxis)?;
        let nx = ds.dim_len("x").ok_or(CoordError::EmptyAxis)?;

        let target = transect(vec![lat], linspace(lon_min, lon_max, nx))?;
        let remapped = target.remap_nearest(&ds, DEFAULT_RADIUS_OF_INFLUENCE)?;

        Ok(remapped.index_dim("y", 0)?)
    }

    /// Nearest-neighbour transect along the longitude, with as many evenly
    /// spaced latitudes between grid extremes as the grid has rows.
    pub fn interp_constant_lon(&self, lon: Float) -> Result<Dataset, RemapError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        let (lat_min, lat_max) = ds.try_get(LATITUDE)?.min_max().ok_or(CoordError::EmptyAxis)?;
        let ny = ds.dim_len("y").ok_or(CoordError::EmptyAxis)?;

        let target = transect(linspace(lat_min, lat_max, ny), vec![lon])?;
        let remapped = target.remap_nearest(&ds, DEFAULT_RADIUS_OF_INFLUENCE)?;

        Ok(remapped.index_dim("x", 0)?)
    }
}

impl DataArray {
    pub fn interp_constant_lat(&self, lat: Float) -> Result<DataArray, RemapError> {
        let ds = self.to_dataset()?.interp_constant_lat(lat)?;
        Ok(ds.data_array(self.name())?)
    }

    pub fn interp_constant_lon(&self, lon: Float) -> Result<DataArray, RemapError> {
        let ds = self.to_dataset()?.interp_constant_lon(lon)?;
        Ok(ds.data_array(self.name())?)
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{LATITUDE, LONGITUDE};
    use crate::data::{DataArray, Variable};
    use float_cmp::approx_eq;
    use ndarray::Array2;

    fn field() -> DataArray {
        DataArray::new(
            "t",
            Variable::from_array2(["lat", "lon"], Array2::from_shape_fn((3, 5), |(j, i)| (10 * j + i) as f64)),
        )
        .with_coord("lat", Variable::from_vec("lat", vec![0.0, 1.0, 2.0]))
        .unwrap()
        .with_coord("lon", Variable::from_vec("lon", vec![10.0, 11.0, 12.0, 13.0, 14.0]))
        .unwrap()
    }

    #[test]
    fn constant_latitude_transect() {
        let out = field().interp_constant_lat(1.1).unwrap();

        assert_eq!(out.dims(), &["x".to_string()]);
        assert_eq!(out.variable().values().iter().copied().collect::<Vec<_>>(), vec![10.0, 11.0, 12.0, 13.0, 14.0]);

        let lat = out.coords().coord(LATITUDE).unwrap();
        assert!(lat.values().iter().all(|v| approx_eq!(f64, *v, 1.1)));
    }

    #[test]
    fn constant_longitude_transect() {
        let out = field().interp_constant_lon(13.2).unwrap();

        assert_eq!(out.dims(), &["y".to_string()]);
        assert_eq!(out.variable().values().iter().copied().collect::<Vec<_>>(), vec![3.0, 13.0, 23.0]);
        assert_eq!(out.coords().coord(LONGITUDE).unwrap().len(), 3);
    }
}
