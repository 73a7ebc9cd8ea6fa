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

//! Nearest cell lookup of observation sites on unstructured model grids.

use crate::constants::{LATITUDE, LONGITUDE};
use crate::data::{Dataset, Variable, TIME};
use crate::errors::{CoordError, DataError, RemapError};
use crate::Float;
use log::{debug, warn};
use ndarray::{Array2, Array4, Axis};

impl Dataset {
    /// Finds for each observation site (this dataset, with `latitude`
    /// and `longitude` on `(y, x)` of shape `(1, nsite)`) the model cell
    /// of `data` minimising `|dlat| + |dlon|`.
    ///
    /// Model variables on `(time, level, cell)` are sampled at the first
    /// level, giving `(time, z, y, x)` arrays of shape `(ntime, 1, 1, nsite)`.
    /// Variables on `(time, cell)` are sampled directly.
    pub fn remap_nearest_unstructured(&self, data: &Dataset) -> Result<Dataset, RemapError> {
        let site_lat = self.try_get(LATITUDE)?.values();
        let site_lon = self.try_get(LONGITUDE)?.values();

        // sites are laid along the last axis of the first row
        let site_lat: Vec<Float> = site_lat.iter().copied().collect();
        let site_lon: Vec<Float> = site_lon.iter().copied().collect();
        if site_lat.len() != site_lon.len() {
            return Err(CoordError::ShapeMismatch.into());
        }

        let model_lat = data.try_get(LATITUDE)?.as_1d()?.to_owned();
        let model_lon = data.try_get(LONGITUDE)?.as_1d()?.to_owned();
        if model_lat.is_empty() {
            return Err(RemapError::EmptySource);
        }

        let cell_dim = data.try_get(LATITUDE)?.dims()[0].clone();

        // sites without any finite distance stay unmatched
        let site_indices: Vec<Option<usize>> = site_lat
            .iter()
            .zip(site_lon.iter())
            .map(|(slat, slon)| {
                model_lat
                    .iter()
                    .zip(model_lon.iter())
                    .map(|(mlat, mlon)| (slat - mlat).abs() + (slon - mlon).abs())
                    .enumerate()
                    .filter(|(_, d)| !d.is_nan())
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i)
            })
            .collect();

        let nsite = site_indices.len();
        let unmatched = site_indices.iter().filter(|i| i.is_none()).count();
        if unmatched > 0 {
            warn!("{} of {} sites have no finite distance to grid cells, their values are NaN", unmatched, nsite);
        }
        debug!("Matched {} sites to unstructured grid cells", nsite - unmatched);

        let pick = |values: &[Float], site: usize| site_indices[site].map_or(Float::NAN, |c| values[c]);

        let mut result = Dataset::new();

        for (name, var) in data.data_vars() {
            if name == LATITUDE || name == LONGITUDE {
                continue;
            }

            let laid_out = var.axis_of(&cell_dim) == Some(var.ndim().saturating_sub(1))
                && (2..=3).contains(&var.ndim());
            if !laid_out {
                warn!("Variable {} is not laid out as (time, [level,] cell), skipping", name);
                continue;
            }

            let values = var.values();
            let surface = if var.ndim() == 3 {
                values.index_axis(Axis(1), 0).to_owned()
            } else {
                values.to_owned()
            };

            let surface = surface
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(DataError::from)?;
            let ntime = surface.nrows();
            let picked = Array4::from_shape_fn((ntime, 1, 1, nsite), |(t, _, _, site)| {
                site_indices[site].map_or(Float::NAN, |c| surface[[t, c]])
            });

            result.insert_data_var(
                name,
                Variable::from_parts(
                    vec![TIME.into(), "z".into(), "y".into(), "x".into()],
                    picked.into_dyn(),
                    var.attrs.clone(),
                ),
            )?;
        }

        if let Some(time) = data.coord(TIME) {
            result.insert_coord(TIME, time.clone())?;
        }
        if let Some(time) = data.time() {
            result.set_time(time.to_vec())?;
        }

        result.insert_coord(
            "x",
            Variable::from_vec("x", (0..nsite).map(|i| i as Float).collect()),
        )?;

        let (model_lat, model_lon) = (model_lat.to_vec(), model_lon.to_vec());
        let lats = Array2::from_shape_fn((1, nsite), |(_, i)| pick(&model_lat, i));
        let lons = Array2::from_shape_fn((1, nsite), |(_, i)| pick(&model_lon, i));
        result.insert_coord(LATITUDE, Variable::from_array2(["y", "x"], lats))?;
        result.insert_coord(LONGITUDE, Variable::from_array2(["y", "x"], lons))?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{LATITUDE, LONGITUDE};
    use crate::data::{Dataset, Variable, TIME};
    use ndarray::{arr2, Array3};

    #[test]
    fn sites_pick_closest_cells() {
        let model = Dataset::new()
            .with_data_var(LATITUDE, Variable::from_vec("ncol", vec![10.0, 20.0, 30.0]))
            .unwrap()
            .with_data_var(LONGITUDE, Variable::from_vec("ncol", vec![-100.0, -90.0, -80.0]))
            .unwrap()
            .with_data_var(
                "pm25",
                Variable::new(
                    &[TIME, "lev", "ncol"],
                    Array3::from_shape_fn((2, 2, 3), |(t, l, c)| (100 * t + 10 * l + c) as f64)
                        .into_dyn(),
                )
                .unwrap(),
            )
            .unwrap();

        let obs = Dataset::new()
            .with_coord(LATITUDE, Variable::from_array2(["y", "x"], arr2(&[[29.0, 11.0]])))
            .unwrap()
            .with_coord(LONGITUDE, Variable::from_array2(["y", "x"], arr2(&[[-81.0, -99.0]])))
            .unwrap();

        let out = obs.remap_nearest_unstructured(&model).unwrap();
        let pm25 = out.data_var("pm25").unwrap();

        assert_eq!(pm25.shape(), &[2, 1, 1, 2]);
        assert_eq!(pm25.values()[[0, 0, 0, 0]], 2.0);
        assert_eq!(pm25.values()[[1, 0, 0, 1]], 100.0);

        let lat = out.coord(LATITUDE).unwrap().as_2d().unwrap().to_owned();
        assert_eq!(lat, arr2(&[[30.0, 10.0]]));
        assert_eq!(out.coord("x").unwrap().as_1d().unwrap().to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn sites_without_finite_distance_are_missing() {
        let model = Dataset::new()
            .with_data_var(LATITUDE, Variable::from_vec("ncol", vec![10.0, 20.0]))
            .unwrap()
            .with_data_var(LONGITUDE, Variable::from_vec("ncol", vec![-100.0, -90.0]))
            .unwrap()
            .with_data_var(
                "o3",
                Variable::new(&[TIME, "ncol"], arr2(&[[1.0, 2.0]]).into_dyn()).unwrap(),
            )
            .unwrap();

        let obs = Dataset::new()
            .with_coord(LATITUDE, Variable::from_array2(["y", "x"], arr2(&[[f64::NAN, 19.0]])))
            .unwrap()
            .with_coord(LONGITUDE, Variable::from_array2(["y", "x"], arr2(&[[-100.0, -91.0]])))
            .unwrap();

        let out = obs.remap_nearest_unstructured(&model).unwrap();
        let o3 = out.data_var("o3").unwrap();

        assert_eq!(o3.shape(), &[1, 1, 1, 2]);
        assert!(o3.values()[[0, 0, 0, 0]].is_nan());
        assert_eq!(o3.values()[[0, 0, 0, 1]], 2.0);
        assert!(out.coord(LATITUDE).unwrap().values()[[0, 0]].is_nan());
    }
}
