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

//! Module with the weight-based regridder.
//!
//! Regridding is a sparse linear map from the flattened source grid to
//! the flattened target grid. Weights are computed once per pair of
//! grids, written to a CSV cache and optionally read back from it
//! (see [`super::weights`]).
//!
//! - `bilinear` interpolates within the source cell containing each target
//!   point and requires a rectilinear source grid,
//! - `conservative` uses fractions of target cell area covered by source
//!   cells and requires rectilinear source and target grids,
//! - `nearest_s2d` assigns each target the nearest source point,
//! - `nearest_d2s` assigns each source point to its nearest target and
//!   averages all sources mapped to the same target.

use super::geometry::CoordinateDefinition;
use super::nearest::{attach_target_coords, NearestResampler};
use super::weights::RegridWeights;
use crate::constants::{DEFAULT_WEIGHTS_FILE, EARTH_RADIUS, REGRID_SKIP_VARS};
use crate::coords::bisection::find_cell;
use crate::coords::NormalizeOptions;
use crate::data::{DataArray, Dataset, Variable};
use crate::errors::{CoordError, RemapError};
use crate::Float;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegridMethod {
    #[serde(rename = "bilinear")]
    Bilinear,
    #[serde(rename = "conservative")]
    Conservative,
    #[serde(rename = "nearest_s2d")]
    NearestS2D,
    #[serde(rename = "nearest_d2s")]
    NearestD2S,
}

impl Default for RegridMethod {
    fn default() -> Self {
        RegridMethod::Bilinear
    }
}

impl RegridMethod {
    pub fn name(&self) -> &'static str {
        match self {
            RegridMethod::Bilinear => "bilinear",
            RegridMethod::Conservative => "conservative",
            RegridMethod::NearestS2D => "nearest_s2d",
            RegridMethod::NearestD2S => "nearest_d2s",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegridOptions {
    #[serde(default)]
    pub method: RegridMethod,
    #[serde(default)]
    pub periodic: bool,
    #[serde(default)]
    pub reuse_weights: bool,
    #[serde(default = "RegridOptions::default_filename")]
    pub filename: PathBuf,
}

impl RegridOptions {
    fn default_filename() -> PathBuf {
        PathBuf::from(DEFAULT_WEIGHTS_FILE)
    }

    pub fn with_method(mut self, method: RegridMethod) -> Self {
        self.method = method;
        self
    }
}

impl Default for RegridOptions {
    fn default() -> Self {
        RegridOptions {
            method: RegridMethod::default(),
            periodic: false,
            reuse_weights: false,
            filename: RegridOptions::default_filename(),
        }
    }
}

/// Regridder between two normalised grids.
#[derive(Clone, Debug)]
pub struct Regridder {
    method: RegridMethod,
    source: CoordinateDefinition,
    target: CoordinateDefinition,
    weights: RegridWeights,
}

impl Regridder {
    /// Prepares regridding weights between grids of normalised datasets.
    pub fn new(source: &Dataset, target: &Dataset, opts: &RegridOptions) -> Result<Self, RemapError> {
        let source_def = CoordinateDefinition::from_dataset(source)?;
        let target_def = CoordinateDefinition::from_dataset(target)?;

        if source_def.is_empty() {
            return Err(RemapError::EmptySource);
        }

        let weights = if opts.reuse_weights && opts.filename.exists() {
            debug!("Reusing regridding weights from {}", opts.filename.display());
            RegridWeights::read_csv(&opts.filename, target_def.len(), source_def.len())?
        } else {
            let entries = match opts.method {
                RegridMethod::Bilinear => bilinear_weights(source, &target_def, opts.periodic)?,
                RegridMethod::Conservative => conservative_weights(source, target, opts.periodic)?,
                RegridMethod::NearestS2D => nearest_s2d_weights(&source_def, &target_def)?,
                RegridMethod::NearestD2S => nearest_d2s_weights(&source_def, &target_def)?,
            };

            let weights = RegridWeights::new(target_def.len(), source_def.len(), entries);
            weights.write_csv(&opts.filename)?;
            info!(
                "Computed {} {} weights, saved to {}",
                weights.entries().len(),
                opts.method.name(),
                opts.filename.display()
            );
            weights
        };

        Ok(Regridder {
            method: opts.method,
            source: source_def,
            target: target_def,
            weights,
        })
    }

    pub fn method(&self) -> RegridMethod {
        self.method
    }

    pub fn source(&self) -> &CoordinateDefinition {
        &self.source
    }

    pub fn weights(&self) -> &RegridWeights {
        &self.weights
    }

    /// Regrids a variable, the spatial dimensions of the source
    /// are replaced by the target ones (placed last).
    pub fn regrid(&self, var: &Variable) -> Result<Variable, RemapError> {
        let flat = self.source.flatten(var)?;
        // area weights of partly covered targets must not be rescaled
        let renormalize = self.method != RegridMethod::Conservative;
        let out = self.weights.apply(flat.values.view(), renormalize);

        self.target
            .unflatten(&flat.other_dims, &flat.other_shape, out, var.attrs.clone())
    }
}

/// Indices sorting the axis ascendingly.
fn argsort(axis: &[Float]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..axis.len()).collect();
    order.sort_by(|a, b| axis[*a].total_cmp(&axis[*b]));
    order
}

fn rectilinear_source(source: &Dataset, method: &'static str) -> Result<(Vec<Float>, Vec<Float>), RemapError> {
    let (lat, lon) = source.rectilinear_axes().map_err(|err| match err {
        CoordError::NotRectilinear(_) => RemapError::UnsupportedMethod(method, "grid is not rectilinear"),
        other => other.into(),
    })?;

    if lat.len() < 2 || lon.len() < 2 {
        return Err(RemapError::UnsupportedMethod(
            method,
            "grid needs at least two points along each axis",
        ));
    }

    Ok((lat.to_vec(), lon.to_vec()))
}

fn bilinear_weights(
    source: &Dataset,
    target: &CoordinateDefinition,
    periodic: bool,
) -> Result<Vec<(usize, usize, Float)>, RemapError> {
    let (lat, lon) = rectilinear_source(source, "bilinear")?;

    let nx = lon.len();
    let order = argsort(&lon);
    let sorted: Vec<Float> = order.iter().map(|i| lon[*i]).collect();
    let (first, last) = (sorted[0], sorted[nx - 1]);

    let entries: Vec<Vec<(usize, usize, Float)>> = target
        .lons()
        .par_iter()
        .zip(target.lats().par_iter())
        .enumerate()
        .map(|(t, (x, y))| {
            let j = match find_cell(&lat, *y) {
                Ok(j) => j,
                Err(_) => return vec![],
            };
            let dy = (y - lat[j]) / (lat[j + 1] - lat[j]);

            let (i_0, i_1, dx) = if *x >= first && *x <= last {
                match find_cell(&sorted, *x) {
                    Ok(k) => (k, k + 1, (x - sorted[k]) / (sorted[k + 1] - sorted[k])),
                    Err(_) => return vec![],
                }
            } else if periodic {
                // cell between the last point and the first one shifted by 360
                let span = first + 360.0 - last;
                let offset = if *x > last { x - last } else { x + 360.0 - last };
                (nx - 1, 0, offset / span)
            } else {
                return vec![];
            };

            let mut found = Vec::with_capacity(4);
            for (row, wy) in [(j, 1.0 - dy), (j + 1, dy)] {
                for (col, wx) in [(order[i_0], 1.0 - dx), (order[i_1], dx)] {
                    let w = wy * wx;
                    if w > 0.0 {
                        found.push((t, row * nx + col, w));
                    }
                }
            }
            found
        })
        .collect();

    Ok(entries.into_iter().flatten().collect())
}

/// Cell edges placed halfway between axis points,
/// the outer edges mirror the neighbouring half-widths.
pub(crate) fn cell_edges(axis: &[Float]) -> Vec<Float> {
    let n = axis.len();
    let mut edges = Vec::with_capacity(n + 1);

    edges.push(axis[0] - (axis[1] - axis[0]) / 2.0);
    for pair in axis.windows(2) {
        edges.push((pair[0] + pair[1]) / 2.0);
    }
    edges.push(axis[n - 1] + (axis[n - 1] - axis[n - 2]) / 2.0);

    edges
}

fn cell_bounds(edges: &[Float]) -> Vec<(Float, Float)> {
    edges
        .windows(2)
        .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
        .collect()
}

/// For every target interval, source intervals overlapping it together
/// with the overlap measured by `measure`.
fn overlaps(
    target: &[(Float, Float)],
    source: &[(Float, Float)],
    shifts: &[Float],
    measure: impl Fn(Float, Float) -> Float,
) -> Vec<Vec<(usize, Float)>> {
    target
        .iter()
        .map(|(t_lo, t_hi)| {
            let mut found = vec![];
            for (s, (s_lo, s_hi)) in source.iter().enumerate() {
                let overlap: Float = shifts
                    .iter()
                    .map(|shift| {
                        let lo = t_lo.max(s_lo + shift);
                        let hi = t_hi.min(s_hi + shift);
                        if hi > lo {
                            measure(lo, hi)
                        } else {
                            0.0
                        }
                    })
                    .sum();
                if overlap > 0.0 {
                    found.push((s, overlap));
                }
            }
            found
        })
        .collect()
}

fn conservative_weights(
    source: &Dataset,
    target: &Dataset,
    periodic: bool,
) -> Result<Vec<(usize, usize, Float)>, RemapError> {
    let (s_lat, s_lon) = rectilinear_source(source, "conservative")?;
    let (t_lat, t_lon) = rectilinear_source(target, "conservative")?;

    let clamp = |edges: Vec<Float>| -> Vec<Float> { edges.into_iter().map(|e| e.clamp(-90.0, 90.0)).collect() };
    let s_lat_bounds = cell_bounds(&clamp(cell_edges(&s_lat)));
    let t_lat_bounds = cell_bounds(&clamp(cell_edges(&t_lat)));

    let s_order = argsort(&s_lon);
    let t_order = argsort(&t_lon);
    let s_sorted: Vec<Float> = s_order.iter().map(|i| s_lon[*i]).collect();
    let t_sorted: Vec<Float> = t_order.iter().map(|i| t_lon[*i]).collect();
    let s_lon_bounds = cell_bounds(&cell_edges(&s_sorted));
    let t_lon_bounds = cell_bounds(&cell_edges(&t_sorted));

    let sin_measure = |lo: Float, hi: Float| hi.to_radians().sin() - lo.to_radians().sin();
    let shifts: &[Float] = if periodic { &[-360.0, 0.0, 360.0] } else { &[0.0] };

    let lat_overlaps = overlaps(&t_lat_bounds, &s_lat_bounds, &[0.0], sin_measure);
    let lon_overlaps = overlaps(&t_lon_bounds, &s_lon_bounds, shifts, |lo, hi| hi - lo);

    let (s_nx, t_nx) = (s_lon.len(), t_lon.len());
    let mut entries = vec![];

    for (j, lat_list) in lat_overlaps.iter().enumerate() {
        let (lo, hi) = t_lat_bounds[j];
        let lat_extent = sin_measure(lo, hi);

        for (k, lon_list) in lon_overlaps.iter().enumerate() {
            let (lo, hi) = t_lon_bounds[k];
            let area = lat_extent * (hi - lo);
            if area <= 0.0 {
                continue;
            }

            let row = j * t_nx + t_order[k];
            for (s_j, lat_part) in lat_list {
                for (s_k, lon_part) in lon_list {
                    let col = s_j * s_nx + s_order[*s_k];
                    entries.push((row, col, lat_part * lon_part / area));
                }
            }
        }
    }

    Ok(entries)
}

/// Chord distance covering the whole sphere.
fn whole_sphere() -> Float {
    2.0 * EARTH_RADIUS + 1.0
}

fn nearest_s2d_weights(
    source: &CoordinateDefinition,
    target: &CoordinateDefinition,
) -> Result<Vec<(usize, usize, Float)>, RemapError> {
    let mut resampler = NearestResampler::new(source.clone(), target.clone(), whole_sphere())?;

    Ok(resampler
        .get_neighbour_info()?
        .iter()
        .enumerate()
        .filter_map(|(t, s)| s.map(|s| (t, s, 1.0)))
        .collect())
}

fn nearest_d2s_weights(
    source: &CoordinateDefinition,
    target: &CoordinateDefinition,
) -> Result<Vec<(usize, usize, Float)>, RemapError> {
    if target.is_empty() {
        return Ok(vec![]);
    }

    // reversed search: every source point looks for its target
    let mut resampler = NearestResampler::new(target.clone(), source.clone(), whole_sphere())?;
    let assigned = resampler.get_neighbour_info()?;

    let mut counts = vec![0usize; target.len()];
    for t in assigned.iter().flatten() {
        counts[*t] += 1;
    }

    Ok(assigned
        .iter()
        .enumerate()
        .filter_map(|(s, t)| t.map(|t| (t, s, 1.0 / counts[t] as Float)))
        .collect())
}

impl Dataset {
    /// Regrids a data array onto the grid of this dataset and inserts
    /// the result into it (this dataset is normalised in the process).
    ///
    /// When a variable of the same name exists the result is named with
    /// a `_y` suffix.
    pub fn remap_regrid_dataarray(&mut self, data: &DataArray, opts: &RegridOptions) -> Result<DataArray, RemapError> {
        let norm = NormalizeOptions::default();
        let source = data.structure_for_monet(&norm)?;
        *self = self.structure_for_monet(&norm)?;

        let regridder = Regridder::new(source.coords(), self, opts)?;
        let var = regridder.regrid(source.variable())?;

        let name = self.insert_regridded(source.name(), var, source.coords())?;

        Ok(self.data_array(&name)?)
    }

    /// Regrids all data variables of `data` onto the grid of this dataset,
    /// inserting them into it and returning them as a new dataset.
    ///
    /// Coordinate-like variables (`lat`, `lon`, `time`, ...) are skipped.
    pub fn remap_regrid_dataset(&mut self, data: &Dataset, opts: &RegridOptions) -> Result<Dataset, RemapError> {
        let norm = NormalizeOptions::default();
        let source = data.structure_for_monet(&norm)?;
        *self = self.structure_for_monet(&norm)?;

        let names: Vec<String> = source
            .data_var_names()
            .into_iter()
            .filter(|n| !REGRID_SKIP_VARS.contains(&n.as_str()))
            .collect();

        if names.is_empty() {
            return Err(RemapError::NothingToRemap("dataset has no data variables"));
        }

        let regridder = Regridder::new(&source, self, opts)?;
        let mut result = Dataset::new();

        for name in names {
            let var = source.try_get(&name)?;
            if !regridder.source().spans(var) {
                warn!("Variable {} has no spatial dimensions, skipping", name);
                continue;
            }

            let regridded = regridder.regrid(var)?;
            let inserted = self.insert_regridded(&name, regridded, &source)?;
            result.insert_data_var(&inserted, self.try_get(&inserted)?.clone())?;
        }

        attach_target_coords(&mut result, &source, self)?;
        result.attrs = source.attrs.clone();

        Ok(result)
    }

    fn insert_regridded(&mut self, name: &str, var: Variable, source: &Dataset) -> Result<String, RemapError> {
        let name = if self.contains(name) {
            format!("{}_y", name)
        } else {
            name.to_string()
        };

        let mut regridded = Dataset::new();
        regridded.insert_data_var(&name, var)?;
        attach_target_coords(&mut regridded, source, self)?;

        self.merge_coords(&regridded)?;
        self.insert_data_var(&name, regridded.try_get(&name)?.clone())?;

        Ok(name)
    }
}

impl DataArray {
    /// Regrids `data` onto the grid of this array, keeping its name.
    pub fn remap_regrid(&self, data: &DataArray, opts: &RegridOptions) -> Result<DataArray, RemapError> {
        let norm = NormalizeOptions::default();
        let source = data.structure_for_monet(&norm)?;
        let target = self.structure_for_monet(&norm)?;

        let regridder = Regridder::new(source.coords(), target.coords(), opts)?;
        let var = regridder.regrid(source.variable())?;

        let mut result = Dataset::new();
        result.insert_data_var(source.name(), var)?;
        attach_target_coords(&mut result, source.coords(), target.coords())?;

        Ok(result.data_array(source.name())?)
    }
}

#[cfg(test)]
mod tests {
    use super::{RegridMethod, RegridOptions, Regridder};
    use crate::constants::LATITUDE;
    use crate::coords::NormalizeOptions;
    use crate::data::{DataArray, Dataset, Variable};
    use float_cmp::approx_eq;
    use ndarray::Array2;
    use std::path::Path;

    fn grid(lats: Vec<f64>, lons: Vec<f64>) -> Dataset {
        Dataset::new()
            .with_coord("lat", Variable::from_vec("lat", lats))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", lons))
            .unwrap()
    }

    fn options(dir: &Path, method: RegridMethod) -> RegridOptions {
        RegridOptions {
            filename: dir.join("weights.csv"),
            ..RegridOptions::default().with_method(method)
        }
    }

    fn normalised(ds: &Dataset) -> Dataset {
        ds.structure_for_monet(&NormalizeOptions::default()).unwrap()
    }

    #[test]
    fn default_options() {
        let opts = RegridOptions::default();
        assert_eq!(opts.method, RegridMethod::Bilinear);
        assert!(!opts.periodic);
        assert!(!opts.reuse_weights);
        assert_eq!(opts.filename.to_str().unwrap(), "monet_regrid_weights.csv");

        let parsed: RegridOptions = serde_yaml::from_str("method: nearest_d2s").unwrap();
        assert_eq!(parsed.method, RegridMethod::NearestD2S);
    }

    #[test]
    fn bilinear_reproduces_linear_field() {
        let dir = tempfile::tempdir().unwrap();
        let source = grid(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0])
            .with_data_var(
                "v",
                Variable::from_array2(
                    ["lat", "lon"],
                    Array2::from_shape_fn((3, 3), |(j, i)| 10.0 * j as f64 + i as f64),
                ),
            )
            .unwrap();
        let target = grid(vec![0.5, 1.5, 5.0], vec![0.25, 1.75]);

        let regridder = Regridder::new(
            &normalised(&source),
            &normalised(&target),
            &options(dir.path(), RegridMethod::Bilinear),
        )
        .unwrap();
        let out = regridder
            .regrid(normalised(&source).data_var("v").unwrap())
            .unwrap();

        assert_eq!(out.shape(), &[3, 2]);
        let values = out.values();
        assert!(approx_eq!(f64, values[[0, 0]], 5.25, epsilon = 1e-9));
        assert!(approx_eq!(f64, values[[1, 1]], 16.75, epsilon = 1e-9));
        assert!(values[[2, 0]].is_nan());
    }

    #[test]
    fn periodic_bilinear_crosses_dateline() {
        let dir = tempfile::tempdir().unwrap();
        let source = grid(vec![-1.0, 1.0], vec![0.0, 90.0, 180.0, 270.0])
            .with_data_var(
                "v",
                Variable::from_array2(["lat", "lon"], Array2::from_shape_fn((2, 4), |(_, i)| i as f64)),
            )
            .unwrap();
        let target = grid(vec![0.0], vec![135.0]);
        let (source, target) = (normalised(&source), normalised(&target));

        let mut opts = options(dir.path(), RegridMethod::Bilinear);
        let closed = Regridder::new(&source, &target, &opts).unwrap();
        let out = closed.regrid(source.data_var("v").unwrap()).unwrap();
        assert!(out.values()[[0, 0]].is_nan());

        opts.periodic = true;
        let open = Regridder::new(&source, &target, &opts).unwrap();
        let out = open.regrid(source.data_var("v").unwrap()).unwrap();
        assert!(approx_eq!(f64, out.values()[[0, 0]], 1.5, epsilon = 1e-9));
    }

    #[test]
    fn conservative_averages_cells() {
        let dir = tempfile::tempdir().unwrap();
        let axis = vec![0.5, 1.5, 2.5, 3.5];
        let source = grid(axis.clone(), axis)
            .with_data_var(
                "v",
                Variable::from_array2(["lat", "lon"], Array2::from_shape_fn((4, 4), |(_, i)| i as f64)),
            )
            .unwrap();
        let target = grid(vec![1.0, 3.0], vec![1.0, 3.0]);
        let (source, target) = (normalised(&source), normalised(&target));

        let regridder = Regridder::new(&source, &target, &options(dir.path(), RegridMethod::Conservative)).unwrap();
        let out = regridder.regrid(source.data_var("v").unwrap()).unwrap();

        let values = out.values();
        assert!(approx_eq!(f64, values[[0, 0]], 0.5, epsilon = 1e-9));
        assert!(approx_eq!(f64, values[[1, 1]], 2.5, epsilon = 1e-9));
    }

    #[test]
    fn conservative_keeps_covered_share_of_partial_cells() {
        let dir = tempfile::tempdir().unwrap();
        let axis = vec![0.5, 1.5];
        let source = grid(axis.clone(), axis)
            .with_data_var("v", Variable::from_array2(["lat", "lon"], Array2::ones((2, 2))))
            .unwrap();
        let target = grid(vec![1.5, 3.5], vec![1.5, 3.5]);
        let (source, target) = (normalised(&source), normalised(&target));

        let regridder = Regridder::new(&source, &target, &options(dir.path(), RegridMethod::Conservative)).unwrap();
        let out = regridder.regrid(source.data_var("v").unwrap()).unwrap();

        // target cell [0.5, 2.5] x [0.5, 2.5] overlaps source cells on [0.5, 2] x [0.5, 2]
        let sin = |deg: f64| deg.to_radians().sin();
        let covered = (sin(2.0) - sin(0.5)) / (sin(2.5) - sin(0.5)) * (1.5 / 2.0);

        let values = out.values();
        assert!(approx_eq!(f64, values[[0, 0]], covered, epsilon = 1e-9));
        assert!(values[[0, 0]] < 1.0);
        assert!(values[[1, 1]].is_nan());
    }

    #[test]
    fn nearest_methods() {
        let dir = tempfile::tempdir().unwrap();
        let source = grid(vec![0.0, 0.1], vec![0.0, 0.1, 18.0])
            .with_data_var(
                "v",
                Variable::from_array2(["lat", "lon"], Array2::from_shape_fn((2, 3), |(j, i)| (3 * j + i) as f64)),
            )
            .unwrap();
        let target = grid(vec![0.0], vec![0.0, 20.0]);
        let (source, target) = (normalised(&source), normalised(&target));

        let s2d = Regridder::new(&source, &target, &options(dir.path(), RegridMethod::NearestS2D)).unwrap();
        let out = s2d.regrid(source.data_var("v").unwrap()).unwrap();
        assert_eq!(out.values()[[0, 0]], 0.0);
        assert_eq!(out.values()[[0, 1]], 2.0);

        let d2s = Regridder::new(&source, &target, &options(dir.path(), RegridMethod::NearestD2S)).unwrap();
        let out = d2s.regrid(source.data_var("v").unwrap()).unwrap();
        // points at lon 0 and 0.1 fall to the first target, at lon 18 to the second
        assert!(approx_eq!(f64, out.values()[[0, 0]], 2.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, out.values()[[0, 1]], 3.5, epsilon = 1e-9));
    }

    #[test]
    fn weights_are_reused_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = normalised(&grid(vec![0.0, 1.0], vec![0.0, 1.0]));
        let target = normalised(&grid(vec![0.5], vec![0.5]));

        let mut opts = options(dir.path(), RegridMethod::Bilinear);
        let first = Regridder::new(&source, &target, &opts).unwrap();
        assert!(opts.filename.exists());

        opts.reuse_weights = true;
        opts.method = RegridMethod::Conservative;
        let second = Regridder::new(&source, &target, &opts).unwrap();
        assert_eq!(first.weights(), second.weights());

        let other = normalised(&grid(vec![0.5], vec![0.5, 0.7]));
        assert!(Regridder::new(&other, &target, &opts).is_err());
    }

    #[test]
    fn regridded_arrays_are_inserted() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), RegridMethod::Bilinear);

        let data = DataArray::new(
            "o3",
            Variable::from_array2(["lat", "lon"], Array2::from_elem((2, 2), 40.0)),
        )
        .with_coord("lat", Variable::from_vec("lat", vec![0.0, 1.0]))
        .unwrap()
        .with_coord("lon", Variable::from_vec("lon", vec![0.0, 1.0]))
        .unwrap();

        let mut target = grid(vec![0.5], vec![0.25, 0.75])
            .with_data_var("o3", Variable::from_array2(["lat", "lon"], Array2::zeros((1, 2))))
            .unwrap();

        let out = target.remap_regrid_dataarray(&data, &opts).unwrap();
        assert_eq!(out.name(), "o3_y");
        assert!(target.contains("o3_y"));
        assert!(target.contains(LATITUDE));
        assert!(out.variable().values().iter().all(|v| approx_eq!(f64, *v, 40.0)));
    }

    #[test]
    fn datasets_skip_coordinate_variables() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), RegridMethod::Bilinear);

        let data = grid(vec![0.0, 1.0], vec![0.0, 1.0])
            .with_data_var("no2", Variable::from_array2(["lat", "lon"], Array2::from_elem((2, 2), 3.0)))
            .unwrap()
            .with_data_var("TFLAG", Variable::from_vec("tstep", vec![1.0]))
            .unwrap();
        let mut target = grid(vec![0.5], vec![0.5]);

        let out = target.remap_regrid_dataset(&data, &opts).unwrap();
        assert_eq!(out.data_var_names(), vec!["no2".to_string()]);
        assert!(approx_eq!(f64, out.data_var("no2").unwrap().values()[[0, 0]], 3.0));
        assert!(target.contains("no2"));
    }
}
