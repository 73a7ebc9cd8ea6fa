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

//! Vertical interpolation of columns onto new levels.

use crate::coords::bisection::find_cell;
use crate::data::{DataArray, Dataset, Variable};
use crate::errors::DataError;
use crate::Float;
use log::debug;
use ndarray::{ArrayD, Axis, IxDyn};

/// Linearly interpolates a column given at vertical coordinates `z`
/// (ascending or descending) onto `levels`. Levels outside
/// the column are NaN.
pub fn interpolate_column(levels: &[Float], z: &[Float], values: &[Float]) -> Vec<Float> {
    levels
        .iter()
        .map(|level| match find_cell(z, *level) {
            Ok(k) => {
                let (z_0, z_1) = (z[k], z[k + 1]);
                if z_1 == z_0 {
                    values[k]
                } else {
                    let w = (level - z_0) / (z_1 - z_0);
                    values[k] + w * (values[k + 1] - values[k])
                }
            }
            Err(_) => Float::NAN,
        })
        .collect()
}

impl DataArray {
    /// Interpolates values along `axis` onto new vertical `levels`.
    ///
    /// `vertical` holds the vertical coordinate, either with the shape
    /// of the array (per-column coordinate) or as a 1-D axis.
    /// Coordinates spanning the vertical dimension are replaced with the levels.
    pub fn stratify(&self, levels: &[Float], vertical: &Variable, axis: usize) -> Result<DataArray, DataError> {
        let values = self.variable().values();
        let ndim = values.ndim();
        if axis >= ndim {
            return Err(DataError::IndexOutOfRange {
                dim: "axis".to_string(),
                index: axis,
                len: ndim,
            });
        }

        let dim = self.dims()[axis].clone();
        let nz = values.shape()[axis];

        let per_column = vertical.shape() == values.shape();
        if !per_column && !(vertical.ndim() == 1 && vertical.len() == nz) {
            return Err(DataError::DimensionMismatch {
                dim,
                expected: nz,
                found: vertical.len(),
            });
        }

        let mut shape = values.shape().to_vec();
        shape[axis] = levels.len();
        let mut out = ArrayD::from_elem(IxDyn(&shape), Float::NAN);

        let shared: Vec<Float> = if per_column {
            vec![]
        } else {
            vertical.values().iter().copied().collect()
        };
        let mut columns = if per_column {
            Some(vertical.values().lanes(Axis(axis)).into_iter())
        } else {
            None
        };

        for (mut out_lane, in_lane) in out
            .lanes_mut(Axis(axis))
            .into_iter()
            .zip(values.lanes(Axis(axis)))
        {
            let z = match columns.as_mut().and_then(|c| c.next()) {
                Some(column) => column.to_vec(),
                None => shared.clone(),
            };

            let interpolated = interpolate_column(levels, &z, &in_lane.to_vec());
            for (o, v) in out_lane.iter_mut().zip(interpolated) {
                *o = v;
            }
        }

        let mut coords = self.coords().clone();
        for name in coords.coord_names() {
            if coords.try_get(&name)?.has_dim(&dim) {
                coords.remove(&name);
            }
        }
        coords.insert_coord(&dim, Variable::from_vec(&dim, levels.to_vec()))?;

        debug!("Stratified {} onto {} levels along {}", self.name(), levels.len(), dim);

        let var = Variable::from_parts(self.dims().to_vec(), out, self.variable().attrs.clone());
        Ok(DataArray::from_parts(self.name(), var, coords))
    }
}

impl Dataset {
    /// Stratifies every data variable on the `z` dimension whose trailing
    /// shape matches the vertical coordinate variable (or which spans
    /// a 1-D vertical coordinate).
    pub fn stratify(&self, levels: &[Float], vertical: &str, axis: usize) -> Result<Dataset, DataError> {
        let vertical_var = self.try_get(vertical)?.clone();
        let vertical_shape = vertical_var.shape();

        let names: Vec<String> = self
            .data_vars()
            .filter(|(name, var)| {
                let trailing = var.ndim() >= vertical_shape.len()
                    && var.shape()[var.ndim() - vertical_shape.len()..] == *vertical_shape;
                let spans_axis = vertical_var.ndim() == 1
                    && var.dim_len(&vertical_var.dims()[0]) == Some(vertical_var.len());

                var.has_dim("z") && name.as_str() != vertical && (trailing || spans_axis)
            })
            .map(|(name, _)| name.clone())
            .collect();

        let mut result: Option<Dataset> = None;
        for name in names {
            let da = self.data_array(&name)?.stratify(levels, &vertical_var, axis)?;

            match result.as_mut() {
                None => {
                    let mut ds = da.to_dataset()?;
                    ds.attrs = self.attrs.clone();
                    result = Some(ds);
                }
                Some(ds) => {
                    ds.merge_coords(da.coords())?;
                    ds.insert_data_var(&name, da.variable().clone())?;
                }
            }
        }

        result.ok_or_else(|| DataError::MissingDimension("z".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::interpolate_column;
    use crate::data::{DataArray, Dataset, Variable};
    use float_cmp::approx_eq;
    use ndarray::Array3;

    #[test]
    fn columns_interpolate_both_orders() {
        let ascending = interpolate_column(&[1.5, 5.0], &[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]);
        assert!(approx_eq!(f64, ascending[0], 15.0));
        assert!(ascending[1].is_nan());

        let descending = interpolate_column(&[900.0, 1000.0], &[1000.0, 850.0, 700.0], &[0.0, 15.0, 30.0]);
        assert!(approx_eq!(f64, descending[0], 10.0));
        assert!(approx_eq!(f64, descending[1], 0.0));
    }

    fn column_data() -> (Variable, Variable) {
        let pressure = Variable::new(
            &["time", "z", "x"],
            Array3::from_shape_fn((1, 3, 2), |(_, k, i)| 1000.0 - 150.0 * k as f64 - 10.0 * i as f64).into_dyn(),
        )
        .unwrap();
        let temperature = Variable::new(
            &["time", "z", "x"],
            Array3::from_shape_fn((1, 3, 2), |(_, k, _)| 290.0 - 10.0 * k as f64).into_dyn(),
        )
        .unwrap();
        (pressure, temperature)
    }

    #[test]
    fn array_onto_pressure_levels() {
        let (pressure, temperature) = column_data();
        let da = DataArray::new("t", temperature)
            .with_coord("z", Variable::from_vec("z", vec![0.0, 1.0, 2.0]))
            .unwrap();

        let out = da.stratify(&[925.0, 500.0], &pressure, 1).unwrap();

        assert_eq!(out.variable().shape(), &[1, 2, 2]);
        let values = out.variable().values();
        assert!(approx_eq!(f64, values[[0, 0, 0]], 285.0));
        assert!(approx_eq!(f64, values[[0, 0, 1]], 290.0 - 10.0 * 65.0 / 150.0, epsilon = 1e-9));
        assert!(values[[0, 1, 0]].is_nan());
        assert_eq!(out.coords().coord("z").unwrap().as_1d().unwrap().to_vec(), vec![925.0, 500.0]);
    }

    #[test]
    fn dataset_stratifies_vertical_variables() {
        let (pressure, temperature) = column_data();
        let ds = Dataset::new()
            .with_data_var("pres", pressure)
            .unwrap()
            .with_data_var("t", temperature.clone())
            .unwrap()
            .with_data_var("q", temperature.mapv(|v| v / 1000.0))
            .unwrap()
            .with_data_var("sfc", Variable::from_vec("x", vec![1.0, 2.0]))
            .unwrap()
            .with_attr("model", "rrfs");

        let out = ds.stratify(&[925.0], "pres", 1).unwrap();

        assert_eq!(out.data_var_names(), vec!["q".to_string(), "t".to_string()]);
        assert!(out.attrs.contains_key("model"));
        assert!(Dataset::new().with_data_var("sfc", Variable::from_vec("x", vec![1.0])).unwrap().stratify(&[1.0], "sfc", 0).is_err());
    }
}
