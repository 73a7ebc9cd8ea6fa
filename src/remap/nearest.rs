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

//! Module with the KD-tree nearest-neighbour resampler.
//!
//! Source points are placed in a KD-tree in Earth-centred cartesian
//! coordinates, so that the search does not suffer from the dateline
//! and polar singularities of geographic coordinates. The radius of
//! influence is compared with the straight-line (chord) distance.

use super::geometry::CoordinateDefinition;
use crate::constants::{LATITUDE, LONGITUDE};
use crate::coords::NormalizeOptions;
use crate::data::{DataArray, Dataset, Variable, TIME};
use crate::errors::RemapError;
use crate::Float;
use kd_tree::KdTree3;
use log::{debug, warn};
use ndarray::{Array2, Axis};
use ordered_float::OrderedFloat;
use rayon::prelude::*;

/// Nearest-neighbour resampler between two coordinate definitions.
#[derive(Clone, Debug)]
pub struct NearestResampler {
    source: CoordinateDefinition,
    target: CoordinateDefinition,
    radius_of_influence: Float,
    neighbours: Option<Vec<Option<usize>>>,
}

impl NearestResampler {
    pub fn new(
        source: CoordinateDefinition,
        target: CoordinateDefinition,
        radius_of_influence: Float,
    ) -> Result<Self, RemapError> {
        if source.is_empty() {
            return Err(RemapError::EmptySource);
        }

        if !radius_of_influence.is_finite() || radius_of_influence <= 0.0 {
            return Err(RemapError::OutsideRadius(radius_of_influence));
        }

        Ok(NearestResampler {
            source,
            target,
            radius_of_influence,
            neighbours: None,
        })
    }

    pub fn source(&self) -> &CoordinateDefinition {
        &self.source
    }

    pub fn target(&self) -> &CoordinateDefinition {
        &self.target
    }

    /// Computes for each target point the index of the nearest source
    /// point within the radius of influence (`None` when there is none).
    pub fn get_neighbour_info(&mut self) -> Result<&[Option<usize>], RemapError> {
        if self.neighbours.is_none() {
            let source_points: Vec<(usize, [Float; 3])> = self
                .source
                .cartesian()
                .into_iter()
                .enumerate()
                .filter(|(_, p)| p.iter().all(|c| c.is_finite()))
                .collect();

            if source_points.is_empty() {
                return Err(RemapError::EmptySource);
            }

            debug!(
                "Building KD-tree of {} source points for {} targets",
                source_points.len(),
                self.target.len()
            );

            let tree = KdTree3::build_by_key(source_points, |item, k| OrderedFloat(item.1[k]));
            let max_sq = self.radius_of_influence.powi(2);

            let neighbours: Vec<Option<usize>> = self
                .target
                .cartesian()
                .par_iter()
                .map(|p| {
                    if !p.iter().all(|c| c.is_finite()) {
                        return None;
                    }
                    tree.nearest_by(p, |item, k| item.1[k])
                        .filter(|found| found.squared_distance <= max_sq)
                        .map(|found| found.item.0)
                })
                .collect();

            let missing = neighbours.iter().filter(|n| n.is_none()).count();
            if missing > 0 {
                debug!(
                    "{} target points have no source point within {} m",
                    missing, self.radius_of_influence
                );
            }

            self.neighbours = Some(neighbours);
        }

        Ok(self.neighbours.as_deref().unwrap_or_default())
    }

    /// Resamples a variable using previously computed neighbour info.
    ///
    /// Spatial dimensions of the source are replaced by spatial dimensions
    /// of the target (placed last), other dimensions are kept in order.
    pub fn get_sample_from_neighbour_info(&self, var: &Variable) -> Result<Variable, RemapError> {
        let neighbours = self
            .neighbours
            .as_deref()
            .ok_or(RemapError::NothingToRemap("neighbour info was not computed"))?;

        let flat = self.source.flatten(var)?;

        let mut out = Array2::from_elem((flat.values.nrows(), self.target.len()), Float::NAN);
        for (mut out_row, in_row) in out.axis_iter_mut(Axis(0)).zip(flat.values.axis_iter(Axis(0))) {
            for (t, neighbour) in neighbours.iter().enumerate() {
                if let Some(s) = neighbour {
                    out_row[t] = in_row[*s];
                }
            }
        }

        self.target
            .unflatten(&flat.other_dims, &flat.other_shape, out, var.attrs.clone())
    }
}

impl Dataset {
    /// Remaps all data variables of `data` onto the grid of this dataset
    /// with nearest-neighbour search.
    pub fn remap_nearest(&self, data: &Dataset, radius_of_influence: Float) -> Result<Dataset, RemapError> {
        let opts = NormalizeOptions::default();
        let source_data = data.structure_for_monet(&opts)?;
        let target_data = self.structure_for_monet(&opts)?;

        let mut resampler = NearestResampler::new(
            CoordinateDefinition::from_dataset(&source_data)?,
            CoordinateDefinition::from_dataset(&target_data)?,
            radius_of_influence,
        )?;
        resampler.get_neighbour_info()?;

        let mut result = Dataset::new();
        for (name, var) in source_data.data_vars() {
            if !resampler.source().spans(var) {
                warn!("Variable {} has no spatial dimensions, skipping", name);
                continue;
            }
            result.insert_data_var(name, resampler.get_sample_from_neighbour_info(var)?)?;
        }

        attach_target_coords(&mut result, &source_data, &target_data)?;
        result.attrs = source_data.attrs.clone();

        Ok(result)
    }
}

impl DataArray {
    /// Remaps `data` onto the grid of this array with nearest-neighbour
    /// search, the result keeps the name of `data`.
    pub fn remap_nearest(&self, data: &DataArray, radius_of_influence: Float) -> Result<DataArray, RemapError> {
        let opts = NormalizeOptions::default();
        let source_data = data.structure_for_monet(&opts)?;
        let target_data = self.structure_for_monet(&opts)?;

        let mut resampler = NearestResampler::new(
            CoordinateDefinition::from_dataset(source_data.coords())?,
            CoordinateDefinition::from_dataset(target_data.coords())?,
            radius_of_influence,
        )?;
        resampler.get_neighbour_info()?;

        let var = resampler.get_sample_from_neighbour_info(source_data.variable())?;

        let mut result = Dataset::new();
        result.insert_data_var(source_data.name(), var)?;
        attach_target_coords(&mut result, source_data.coords(), target_data.coords())?;

        Ok(result.data_array(source_data.name())?)
    }
}

/// Attaches target latitude and longitude, and source time
/// when the remapped variables keep the time dimension.
pub(super) fn attach_target_coords(
    result: &mut Dataset,
    source: &Dataset,
    target: &Dataset,
) -> Result<(), RemapError> {
    for name in [LATITUDE, LONGITUDE] {
        let coord = target.try_get(name)?.clone();
        result.insert_coord(name, coord)?;
    }

    if result.has_dim(TIME) {
        if let Some(time_coord) = source.coord(TIME) {
            result.insert_coord(TIME, time_coord.clone())?;
        }
        if let Some(time) = source.time() {
            result.set_time(time.to_vec())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::NearestResampler;
    use crate::constants::{LATITUDE, LONGITUDE};
    use crate::data::{Dataset, Variable};
    use crate::remap::geometry::CoordinateDefinition;
    use ndarray::{Array2, Array3};

    fn grid(lats: Vec<f64>, lons: Vec<f64>) -> Dataset {
        Dataset::new()
            .with_coord("lat", Variable::from_vec("lat", lats))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", lons))
            .unwrap()
    }

    #[test]
    fn resampler_finds_nearest() {
        let source = CoordinateDefinition::from_points(&[0.0, 10.0, 20.0], &[0.0, 0.0, 0.0]).unwrap();
        let target = CoordinateDefinition::from_points(&[9.0, 19.5, 100.0], &[0.5, 0.0, 0.0]).unwrap();

        let mut resampler = NearestResampler::new(source, target, 5e5).unwrap();
        let info = resampler.get_neighbour_info().unwrap().to_vec();
        assert_eq!(info, vec![Some(1), Some(2), None]);

        let values = Array3::from_shape_vec((2, 1, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let var = Variable::new(&["time", "y", "x"], values.into_dyn())
            .unwrap()
            .with_attr("units", "ppb");

        let out = resampler.get_sample_from_neighbour_info(&var).unwrap();
        assert_eq!(out.shape(), &[2, 1, 3]);
        let values = out.values();
        assert_eq!(values[[0, 0, 0]], 2.0);
        assert_eq!(values[[1, 0, 1]], 6.0);
        assert!(values[[1, 0, 2]].is_nan());
        assert!(out.attrs.contains_key("units"));
    }

    #[test]
    fn sample_requires_neighbour_info() {
        let source = CoordinateDefinition::from_points(&[0.0], &[0.0]).unwrap();
        let target = CoordinateDefinition::from_points(&[0.0], &[0.0]).unwrap();
        let resampler = NearestResampler::new(source, target, 1e3).unwrap();

        let var = Variable::new(&["y", "x"], ndarray::ArrayD::zeros(ndarray::IxDyn(&[1, 1]))).unwrap();
        assert!(resampler.get_sample_from_neighbour_info(&var).is_err());
        assert!(NearestResampler::new(
            CoordinateDefinition::from_points(&[], &[]).unwrap(),
            CoordinateDefinition::from_points(&[0.0], &[0.0]).unwrap(),
            1e3
        )
        .is_err());
    }

    #[test]
    fn dataset_remap_keeps_other_dims() {
        let source = grid(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0, 3.0])
            .with_data_var(
                "no2",
                Variable::new(
                    &["time", "lat", "lon"],
                    Array3::from_shape_fn((2, 3, 4), |(t, j, i)| (100 * t + 10 * j + i) as f64)
                        .into_dyn(),
                )
                .unwrap(),
            )
            .unwrap()
            .with_attr("source", "model");

        let target = grid(vec![0.9, 2.1], vec![2.9, 0.1, 1.2]);

        let out = target.remap_nearest(&source, 1e6).unwrap();
        let no2 = out.data_var("no2").unwrap();

        assert_eq!(
            no2.dims(),
            &["time".to_string(), "y".to_string(), "x".to_string()]
        );
        assert_eq!(no2.shape(), &[2, 2, 3]);
        assert_eq!(no2.values()[[0, 0, 0]], 13.0);
        assert_eq!(no2.values()[[1, 1, 2]], 121.0);

        assert_eq!(out.coord(LATITUDE).unwrap().shape(), &[2, 3]);
        assert!(out.coord(LONGITUDE).is_some());
        assert!(out.attrs.contains_key("source"));
    }

    #[test]
    fn far_targets_are_nan() {
        let source = grid(vec![0.0, 1.0], vec![0.0, 1.0])
            .with_data_var("v", Variable::from_array2(["lat", "lon"], Array2::ones((2, 2))))
            .unwrap();
        let target = grid(vec![45.0], vec![90.0]);

        let out = target.remap_nearest(&source, 1e5).unwrap();
        assert!(out.data_var("v").unwrap().values().iter().all(|v| v.is_nan()));
    }
}
