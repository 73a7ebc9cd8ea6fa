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

//! Module with longitude wrapping and latitude checks.

use crate::constants::LONGITUDE;
use crate::data::{DataArray, Dataset};
use crate::{errors::CoordError, Float};
use log::debug;
use ndarray::{Array, ArrayView, Dimension};

/// Maps longitude from `[0, 360)` (or any other range) into `[-180, 180)`.
pub fn wrap_longitude(lon: Float) -> Float {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Wraps every longitude of an array, see [`wrap_longitude`].
pub fn wrap_array<D: Dimension>(lons: ArrayView<Float, D>) -> Array<Float, D> {
    lons.mapv(wrap_longitude)
}

/// Wraps longitudes and checks that latitudes are valid,
/// both arrays must have the same shape. NaNs are passed through.
pub fn check_and_wrap<D: Dimension>(
    lons: ArrayView<Float, D>,
    lats: ArrayView<Float, D>,
) -> Result<(Array<Float, D>, Array<Float, D>), CoordError> {
    if lons.shape() != lats.shape() {
        return Err(CoordError::ShapeMismatch);
    }

    if let Some(bad) = lats.iter().find(|lat| lat.abs() > 90.0) {
        return Err(CoordError::InvalidLatitude(*bad));
    }

    Ok((wrap_array(lons), lats.to_owned()))
}

impl Dataset {
    /// Ensures longitudes of the named variable are in `[-180, 180)`.
    pub fn wrap_longitudes(&mut self, lon_name: &str) -> Result<(), CoordError> {
        let lon = self
            .get_mut(lon_name)
            .ok_or(CoordError::MissingLatLon)?;

        lon.values_mut().mapv_inplace(wrap_longitude);
        debug!("Wrapped longitudes of {}", lon_name);

        Ok(())
    }

    /// Wraps longitudes and sorts the dataset along the longitude axis.
    ///
    /// For 1-D longitude the sorting follows its dimension,
    /// for 2-D longitude the last dimension is sorted by the first row.
    pub fn tidy(&self, lon_name: &str) -> Result<Dataset, CoordError> {
        let mut wrapped = self.clone();
        wrapped.wrap_longitudes(lon_name)?;

        let lon = wrapped.try_get(lon_name)?;
        let (dim, keys) = match lon.ndim() {
            1 => (lon.dims()[0].clone(), lon.as_1d()?.to_vec()),
            2 => (lon.dims()[1].clone(), lon.as_2d()?.row(0).to_vec()),
            _ => return Err(CoordError::NotRectilinear("longitude must be 1-D or 2-D")),
        };

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));

        Ok(wrapped.isel(&dim, &order)?)
    }
}

impl DataArray {
    /// Ensures longitudes are in `[-180, 180)`.
    pub fn wrap_longitudes(&self) -> Result<DataArray, CoordError> {
        let mut ds = self.to_dataset()?;
        ds.wrap_longitudes(LONGITUDE)?;
        Ok(ds.data_array(self.name())?)
    }

    /// Wraps longitudes and sorts along the longitude axis.
    pub fn tidy(&self) -> Result<DataArray, CoordError> {
        let ds = self.to_dataset()?.tidy(LONGITUDE)?;
        Ok(ds.data_array(self.name())?)
    }
}

#[cfg(test)]
mod tests {
    use super::{check_and_wrap, wrap_longitude};
    use crate::data::{Dataset, Variable};
    use float_cmp::approx_eq;
    use ndarray::arr1;

    #[test]
    fn wrapping() {
        assert!(approx_eq!(f64, wrap_longitude(0.0), 0.0));
        assert!(approx_eq!(f64, wrap_longitude(180.0), -180.0));
        assert!(approx_eq!(f64, wrap_longitude(359.5), -0.5));
        assert!(approx_eq!(f64, wrap_longitude(-190.0), 170.0));
        assert!(approx_eq!(f64, wrap_longitude(720.0 + 45.0), 45.0));
    }

    #[test]
    fn latitudes_are_checked() {
        let lons = arr1(&[0.0, 350.0]);
        let lats = arr1(&[10.0, 95.0]);
        assert!(check_and_wrap(lons.view(), lats.view()).is_err());

        let lats = arr1(&[10.0, -20.0]);
        let (wrapped, _) = check_and_wrap(lons.view(), lats.view()).unwrap();
        assert!(approx_eq!(f64, wrapped[1], -10.0));
    }

    #[test]
    fn tidy_sorts_by_longitude() {
        let ds = Dataset::new()
            .with_coord("longitude", Variable::from_vec("x", vec![0.0, 90.0, 180.0, 270.0]))
            .unwrap()
            .with_data_var("v", Variable::from_vec("x", vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();

        let tidy = ds.tidy("longitude").unwrap();
        assert_eq!(
            tidy.coord("longitude").unwrap().as_1d().unwrap().to_vec(),
            vec![-180.0, -90.0, 0.0, 90.0]
        );
        assert_eq!(
            tidy.data_var("v").unwrap().as_1d().unwrap().to_vec(),
            vec![3.0, 4.0, 1.0, 2.0]
        );
    }
}
