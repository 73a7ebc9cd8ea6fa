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

//! Land/ocean classification of grid points.
//!
//! The mask comes from a rectilinear grid of land fraction (or any
//! land indicator), points with values above 0.5 are land. Grid points
//! are classified by the nearest mask cell.

use crate::coords::bisection::find_nearest;
use crate::coords::{wrap_longitude, NormalizeOptions};
use crate::data::{DataArray, Dataset};
use crate::errors::{CoordError, DataError};
use crate::Float;
use log::debug;
use ndarray::{Array2, IxDyn};

/// Threshold above which mask values mean land.
const LAND_THRESHOLD: Float = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct LandMask {
    lats: Vec<Float>,
    lons: Vec<Float>,
    land: Array2<bool>,
}

impl LandMask {
    /// Builds the mask from variable `var` of a rectilinear dataset.
    pub fn from_dataset(ds: &Dataset, var: &str) -> Result<Self, CoordError> {
        let ds = ds.structure_for_monet(&NormalizeOptions::default())?;
        let (lat, lon) = ds.rectilinear_axes()?;

        let values = ds.try_get(var)?.transpose(&["y", "x"])?;
        let values = values.as_2d()?;

        // longitudes sorted so that they can be bisected
        let mut order: Vec<usize> = (0..lon.len()).collect();
        order.sort_by(|a, b| lon[*a].total_cmp(&lon[*b]));

        let land = Array2::from_shape_fn((lat.len(), lon.len()), |(j, i)| values[[j, order[i]]] > LAND_THRESHOLD);

        debug!(
            "Built land mask of {}x{} cells, {} land",
            lat.len(),
            lon.len(),
            land.iter().filter(|l| **l).count()
        );

        Ok(LandMask {
            lats: lat.to_vec(),
            lons: order.iter().map(|i| lon[*i]).collect(),
            land,
        })
    }

    pub fn is_land_at(&self, lat: Float, lon: Float) -> Result<bool, CoordError> {
        let j = find_nearest(&self.lats, lat)?;
        let i = find_nearest(&self.lons, wrap_longitude(lon))?;
        Ok(self.land[[j, i]])
    }

    /// Land flags of all points of a normalised dataset, on `(y, x)`.
    fn classify(&self, ds: &Dataset) -> Result<Array2<bool>, CoordError> {
        let (lats, lons) = ds.latlon_2d()?;

        let mut land = Array2::from_elem(lats.dim(), false);
        for ((flag, lat), lon) in land.iter_mut().zip(lats.iter()).zip(lons.iter()) {
            *flag = self.is_land_at(*lat, *lon)?;
        }

        Ok(land)
    }
}

/// Sets values where `keep` is false to NaN in every variable spanning `(y, x)`.
fn mask_dataset(ds: &Dataset, keep: &Array2<bool>) -> Result<Dataset, DataError> {
    let mut masked = ds.clone();

    for name in ds.data_var_names() {
        let var = ds.try_get(&name)?;
        let (y_ax, x_ax) = match (var.axis_of("y"), var.axis_of("x")) {
            (Some(y), Some(x)) => (y, x),
            _ => continue,
        };

        let factor2 = keep.mapv(|k| if k { 1.0 } else { Float::NAN });
        let factor2 = if y_ax < x_ax { factor2 } else { factor2.reversed_axes() };

        let mut shape = vec![1; var.ndim()];
        shape[y_ax] = keep.nrows();
        shape[x_ax] = keep.ncols();
        let factor = factor2
            .as_standard_layout()
            .into_owned()
            .into_shape(IxDyn(&shape))?;

        let mut var = var.clone();
        *var.values_mut() *= &factor;
        masked.insert_data_var(&name, var)?;
    }

    Ok(masked)
}

impl Dataset {
    /// Boolean grid of land points, on `(y, x)`.
    pub fn is_land(&self, mask: &LandMask) -> Result<Array2<bool>, CoordError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        mask.classify(&ds)
    }

    /// Boolean grid of ocean points, on `(y, x)`.
    pub fn is_ocean(&self, mask: &LandMask) -> Result<Array2<bool>, CoordError> {
        Ok(self.is_land(mask)?.mapv(|land| !land))
    }

    /// Normalised dataset with ocean values set to NaN.
    pub fn where_land(&self, mask: &LandMask) -> Result<Dataset, CoordError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        let land = mask.classify(&ds)?;
        Ok(mask_dataset(&ds, &land)?)
    }

    /// Normalised dataset with land values set to NaN.
    pub fn where_ocean(&self, mask: &LandMask) -> Result<Dataset, CoordError> {
        let ds = self.structure_for_monet(&NormalizeOptions::default())?;
        let ocean = mask.classify(&ds)?.mapv(|land| !land);
        Ok(mask_dataset(&ds, &ocean)?)
    }
}

impl DataArray {
    pub fn is_land(&self, mask: &LandMask) -> Result<Array2<bool>, CoordError> {
        self.to_dataset()?.is_land(mask)
    }

    pub fn is_ocean(&self, mask: &LandMask) -> Result<Array2<bool>, CoordError> {
        self.to_dataset()?.is_ocean(mask)
    }

    pub fn where_land(&self, mask: &LandMask) -> Result<DataArray, CoordError> {
        Ok(self.to_dataset()?.where_land(mask)?.data_array(self.name())?)
    }

    pub fn where_ocean(&self, mask: &LandMask) -> Result<DataArray, CoordError> {
        Ok(self.to_dataset()?.where_ocean(mask)?.data_array(self.name())?)
    }
}

#[cfg(test)]
mod tests {
    use super::LandMask;
    use crate::data::{DataArray, Dataset, Variable};
    use ndarray::{arr2, Array2, Array3};

    /// Land west of 0 deg, ocean east of it.
    fn mask() -> LandMask {
        let ds = Dataset::new()
            .with_coord("lat", Variable::from_vec("lat", vec![-10.0, 0.0, 10.0]))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", vec![0.0, 10.0, 350.0]))
            .unwrap()
            .with_data_var(
                "landfrac",
                Variable::from_array2(["lat", "lon"], Array2::from_shape_fn((3, 3), |(_, i)| if i == 2 { 1.0 } else { 0.0 })),
            )
            .unwrap();

        LandMask::from_dataset(&ds, "landfrac").unwrap()
    }

    #[test]
    fn points_are_classified() {
        let mask = mask();
        assert!(mask.is_land_at(1.0, -9.0).unwrap());
        assert!(mask.is_land_at(1.0, 351.0).unwrap());
        assert!(!mask.is_land_at(1.0, 9.0).unwrap());
    }

    #[test]
    fn grids_are_masked() {
        let da = DataArray::new(
            "sst",
            Variable::new(&["time", "lat", "lon"], Array3::from_elem((2, 1, 2), 300.0).into_dyn()).unwrap(),
        )
        .with_coord("lat", Variable::from_vec("lat", vec![0.0]))
        .unwrap()
        .with_coord("lon", Variable::from_vec("lon", vec![-10.0, 10.0]))
        .unwrap();

        assert_eq!(da.is_land(&mask()).unwrap(), arr2(&[[true, false]]));
        assert_eq!(da.is_ocean(&mask()).unwrap(), arr2(&[[false, true]]));

        let ocean = da.where_ocean(&mask()).unwrap();
        let values = ocean.variable().values();
        assert!(values[[1, 0, 0]].is_nan());
        assert_eq!(values[[1, 0, 1]], 300.0);
    }
}
