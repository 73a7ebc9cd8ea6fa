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

//! Module combining gridded fields with point observations.
//!
//! Every row of an observation table is located on the grid, either
//! by nearest-neighbour search or with regridding weights computed
//! for the observation points, and grid values are appended to the
//! table as new columns.

use super::geometry::CoordinateDefinition;
use super::nearest::NearestResampler;
use super::regrid::{RegridOptions, Regridder};
use crate::constants::{DEFAULT_COMBINE_RADIUS, LATITUDE, LONGITUDE};
use crate::coords::NormalizeOptions;
use crate::data::{Column, Dataset, Table, Variable, TIME};
use crate::errors::{DataError, RemapError};
use crate::Float;
use chrono::NaiveDateTime;
use log::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum CombineMethod {
    Nearest,
    Regrid(RegridOptions),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CombineOptions {
    pub method: CombineMethod,
    pub radius_of_influence: Float,
    pub suffix: Option<String>,
}

impl Default for CombineOptions {
    fn default() -> Self {
        CombineOptions {
            method: CombineMethod::Nearest,
            radius_of_influence: DEFAULT_COMBINE_RADIUS,
            suffix: None,
        }
    }
}

enum Sampler {
    Nearest(NearestResampler),
    Regrid(Regridder),
}

impl Sampler {
    fn sample(&self, var: &Variable) -> Result<Variable, RemapError> {
        match self {
            Sampler::Nearest(resampler) => resampler.get_sample_from_neighbour_info(var),
            Sampler::Regrid(regridder) => regridder.regrid(var),
        }
    }

    fn spatial_dims(&self) -> &[String] {
        match self {
            Sampler::Nearest(resampler) => resampler.source().dims(),
            Sampler::Regrid(regridder) => regridder.source().dims(),
        }
    }
}

fn nearest_time(times: &[NaiveDateTime], t: NaiveDateTime) -> Option<usize> {
    times
        .iter()
        .enumerate()
        .min_by_key(|(_, grid_t)| (**grid_t - t).num_seconds().abs())
        .map(|(i, _)| i)
}

/// Index of grid time matched to every table row.
fn row_times(grid: &Dataset, table: &Table) -> Vec<Option<usize>> {
    let n = table.len();

    let grid_times = match grid.time() {
        Some(times) if !times.is_empty() => times,
        _ => return vec![Some(0); n],
    };

    match table.column(TIME) {
        Some(Column::Time(times)) => times
            .iter()
            .map(|t| t.and_then(|t| nearest_time(grid_times, t)))
            .collect(),
        _ => {
            warn!("Table has no time column, using the first grid time");
            vec![Some(0); n]
        }
    }
}

/// Regridder from a normalised grid onto the rows of a renamed table.
fn point_regridder(grid: &Dataset, table: &Table, opts: &RegridOptions) -> Result<Regridder, RemapError> {
    let points = table.select(&[LATITUDE, LONGITUDE])?.to_dataset()?;
    Regridder::new(grid, &points, opts)
}

/// Computes the regridding weights of the combination once and returns
/// options that reuse them from the weight file.
///
/// Combinations of several variables of the same grid running at the
/// same time must share one complete weight file instead of each
/// rewriting it. Nearest combination needs no weights and its options
/// are returned unchanged.
pub fn prepare_combine_weights(grid: &Dataset, table: &Table, opts: &CombineOptions) -> Result<CombineOptions, RemapError> {
    let regrid_opts = match &opts.method {
        CombineMethod::Nearest => return Ok(opts.clone()),
        CombineMethod::Regrid(regrid_opts) => regrid_opts,
    };

    let grid = grid.structure_for_monet(&NormalizeOptions::default())?;
    let regridder = point_regridder(&grid, &table.rename_for_monet(), regrid_opts)?;
    debug!(
        "Prepared {} shared weights in {}",
        regridder.weights().entries().len(),
        regrid_opts.filename.display()
    );

    Ok(CombineOptions {
        method: CombineMethod::Regrid(RegridOptions {
            reuse_weights: true,
            ..regrid_opts.clone()
        }),
        ..opts.clone()
    })
}

/// Samples all data variables of the grid at the table points and
/// appends them to the table.
///
/// Grid variables are matched to rows by the nearest grid time (when
/// both carry time), dimensions other than time and space are taken at
/// index 0. Columns are named after variables with optional suffix,
/// colliding names get an additional `_new` suffix.
pub fn combine_point(grid: &Dataset, table: &Table, opts: &CombineOptions) -> Result<Table, RemapError> {
    let grid = grid.structure_for_monet(&NormalizeOptions::default())?;
    let mut result = table.rename_for_monet();

    let n = result.len();

    let sampler = match &opts.method {
        CombineMethod::Nearest => {
            let mut resampler = NearestResampler::new(
                CoordinateDefinition::from_dataset(&grid)?,
                result.sparse_swath()?,
                opts.radius_of_influence,
            )?;
            resampler.get_neighbour_info()?;
            Sampler::Nearest(resampler)
        }
        CombineMethod::Regrid(regrid_opts) => Sampler::Regrid(point_regridder(&grid, &result, regrid_opts)?),
    };

    let rows = row_times(&grid, &result);

    for (name, var) in grid.data_vars() {
        if !sampler.spatial_dims().iter().all(|d| var.has_dim(d)) {
            debug!("Variable {} has no spatial dimensions, skipping", name);
            continue;
        }

        let mut reduced = var.clone();
        let extra: Vec<String> = var
            .dims()
            .iter()
            .filter(|d| *d != TIME && !sampler.spatial_dims().contains(*d))
            .cloned()
            .collect();
        for dim in extra {
            debug!("Taking first {} of {}", dim, name);
            reduced = reduced.index_dim(&dim, 0)?;
        }

        let sampled = sampler.sample(&reduced)?;
        let timed = sampled.has_dim(TIME);
        let ntime = sampled.dim_len(TIME).unwrap_or(1);
        let values = sampled
            .into_values()
            .as_standard_layout()
            .into_owned()
            .into_shape((ntime, n))
            .map_err(DataError::from)?;

        let column: Vec<Float> = rows
            .iter()
            .enumerate()
            .map(|(r, t)| match (timed, t) {
                (false, _) => values[[0, r]],
                (true, Some(t)) if *t < ntime => values[[*t, r]],
                _ => Float::NAN,
            })
            .collect();

        let mut column_name = format!("{}{}", name, opts.suffix.as_deref().unwrap_or(""));
        if result.contains(&column_name) {
            column_name.push_str("_new");
        }

        result.set_column(&column_name, Column::Float(column))?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{combine_point, prepare_combine_weights, CombineMethod, CombineOptions};
    use crate::data::{Column, Dataset, Table, Variable, TIME};
    use crate::remap::regrid::RegridOptions;
    use chrono::NaiveDate;
    use float_cmp::approx_eq;
    use ndarray::{Array2, Array4};

    fn model() -> Dataset {
        let hour = |h| NaiveDate::from_ymd(2021, 6, 1).and_hms(h, 0, 0);

        Dataset::new()
            .with_coord("lat", Variable::from_vec("lat", vec![40.0, 41.0]))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", vec![-106.0, -105.0]))
            .unwrap()
            .with_data_var(
                "o3",
                Variable::new(
                    &[TIME, "z", "lat", "lon"],
                    Array4::from_shape_fn((2, 3, 2, 2), |(t, z, j, i)| (1000 * t + 100 * z + 10 * j + i) as f64)
                        .into_dyn(),
                )
                .unwrap(),
            )
            .unwrap()
            .with_data_var("terrain", Variable::from_array2(["lat", "lon"], Array2::from_elem((2, 2), 5.0)))
            .unwrap()
            .with_time(vec![hour(0), hour(1)])
            .unwrap()
    }

    fn obs() -> Table {
        let time = |h, m| Some(NaiveDate::from_ymd(2021, 6, 1).and_hms(h, m, 0));

        Table::new()
            .with_column("latitude", Column::Float(vec![41.0, 40.0, 10.0]))
            .unwrap()
            .with_column("longitude", Column::Float(vec![-105.0, -106.0, -105.0]))
            .unwrap()
            .with_column(TIME, Column::Time(vec![time(0, 50), time(0, 10), time(0, 0)]))
            .unwrap()
            .with_column("o3", Column::Float(vec![30.0, 40.0, 50.0]))
            .unwrap()
    }

    #[test]
    fn nearest_combination() {
        let out = combine_point(&model(), &obs(), &CombineOptions::default()).unwrap();

        let o3 = out.float("o3_new").unwrap();
        assert_eq!(o3[0], 1011.0);
        assert_eq!(o3[1], 0.0);
        assert!(o3[2].is_nan());

        assert_eq!(out.float("terrain").unwrap()[0], 5.0);
        assert_eq!(out.float("o3").unwrap(), &[30.0, 40.0, 50.0]);
    }

    #[test]
    fn suffix_and_regrid() {
        let dir = tempfile::tempdir().unwrap();
        let opts = CombineOptions {
            method: CombineMethod::Regrid(RegridOptions {
                filename: dir.path().join("weights.csv"),
                ..RegridOptions::default()
            }),
            suffix: Some("_model".into()),
            ..CombineOptions::default()
        };

        let out = combine_point(&model(), &obs(), &opts).unwrap();
        let o3 = out.float("o3_model").unwrap();

        assert!(approx_eq!(f64, o3[0], 1011.0, epsilon = 1e-9));
        assert!(o3[2].is_nan());
    }

    #[test]
    fn shared_weights_are_prepared_once() {
        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("weights.csv");
        let opts = CombineOptions {
            method: CombineMethod::Regrid(RegridOptions {
                filename: filename.clone(),
                ..RegridOptions::default()
            }),
            ..CombineOptions::default()
        };

        let shared = prepare_combine_weights(&model(), &obs(), &opts).unwrap();
        assert!(filename.exists());
        match &shared.method {
            CombineMethod::Regrid(regrid_opts) => assert!(regrid_opts.reuse_weights),
            CombineMethod::Nearest => panic!("expected regridding"),
        }

        let written = std::fs::read_to_string(&filename).unwrap();
        let out = combine_point(&model(), &obs(), &shared).unwrap();
        assert_eq!(std::fs::read_to_string(&filename).unwrap(), written);
        assert!(approx_eq!(f64, out.float("o3_new").unwrap()[0], 1011.0, epsilon = 1e-9));

        let nearest = CombineOptions::default();
        assert_eq!(prepare_combine_weights(&model(), &obs(), &nearest).unwrap(), nearest);
    }
}
