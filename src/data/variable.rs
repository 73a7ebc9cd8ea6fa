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

//! Sub-module with the n-dimensional variable type.

use super::{AttrValue, Attrs};
use crate::{errors::DataError, Float};
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis, Ix1, Ix2};

const CF_FILL_ATTRS: [&str; 2] = ["_FillValue", "missing_value"];

/// N-dimensional array of values with named dimensions
/// and attributes, the building block of [`Dataset`](super::Dataset).
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    values: ArrayD<Float>,
    pub attrs: Attrs,
}

impl Variable {
    /// Creates a variable checking that the number
    /// of dimension names matches the array rank.
    pub fn new(dims: &[&str], values: ArrayD<Float>) -> Result<Self, DataError> {
        if dims.len() != values.ndim() {
            return Err(DataError::RankMismatch {
                expected: dims.len(),
                found: values.ndim(),
            });
        }

        Ok(Variable {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
            attrs: Attrs::new(),
        })
    }

    pub(crate) fn from_parts(dims: Vec<String>, values: ArrayD<Float>, attrs: Attrs) -> Self {
        debug_assert_eq!(dims.len(), values.ndim());
        Variable {
            dims,
            values,
            attrs,
        }
    }

    pub fn from_vec(dim: &str, values: Vec<Float>) -> Self {
        Variable {
            dims: vec![dim.to_string()],
            values: Array1::from_vec(values).into_dyn(),
            attrs: Attrs::new(),
        }
    }

    pub fn from_array2(dims: [&str; 2], values: Array2<Float>) -> Self {
        Variable {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values: values.into_dyn(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn values(&self) -> &ArrayD<Float> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ArrayD<Float> {
        &mut self.values
    }

    pub fn into_values(self) -> ArrayD<Float> {
        self.values
    }

    pub fn ndim(&self) -> usize {
        self.values.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis_of(dim).is_some()
    }

    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|ax| self.values.shape()[ax])
    }

    /// Numeric attribute value, integers are widened.
    pub fn numeric_attr(&self, key: &str) -> Option<Float> {
        match self.attrs.get(key)? {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as Float),
            _ => None,
        }
    }

    /// Decodes values packed the NetCDF way: `_FillValue` and `missing_value`
    /// become NaN, the rest is scaled by `scale_factor` and shifted by
    /// `add_offset`. The packing attributes are dropped afterwards.
    pub fn decode_cf(&mut self) {
        let fill: Vec<Float> = CF_FILL_ATTRS
            .iter()
            .filter_map(|key| self.numeric_attr(key))
            .collect();
        let scale = self.numeric_attr("scale_factor").unwrap_or(1.0);
        let offset = self.numeric_attr("add_offset").unwrap_or(0.0);

        self.values.mapv_inplace(|v| {
            if fill.contains(&v) {
                Float::NAN
            } else {
                v * scale + offset
            }
        });

        for key in CF_FILL_ATTRS.iter().chain(["scale_factor", "add_offset"].iter()) {
            self.attrs.remove(*key);
        }
    }

    /// Removes all dimensions of length one.
    pub fn squeeze(&self) -> Variable {
        let mut values = self.values.clone();
        let mut dims = self.dims.clone();

        // going backwards keeps the remaining axis indices valid
        for ax in (0..dims.len()).rev() {
            if values.shape()[ax] == 1 {
                values = values.index_axis_move(Axis(ax), 0);
                dims.remove(ax);
            }
        }

        Variable {
            dims,
            values,
            attrs: self.attrs.clone(),
        }
    }

    /// Selects given indices along the dimension.
    /// Variables without that dimension are returned unchanged.
    pub fn isel(&self, dim: &str, indices: &[usize]) -> Result<Variable, DataError> {
        let ax = match self.axis_of(dim) {
            Some(ax) => ax,
            None => return Ok(self.clone()),
        };

        let len = self.values.shape()[ax];
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(DataError::IndexOutOfRange {
                dim: dim.to_string(),
                index: bad,
                len,
            });
        }

        Ok(Variable {
            dims: self.dims.clone(),
            values: self.values.select(Axis(ax), indices),
            attrs: self.attrs.clone(),
        })
    }

    /// Takes a single index along the dimension and drops it.
    pub fn index_dim(&self, dim: &str, index: usize) -> Result<Variable, DataError> {
        let ax = match self.axis_of(dim) {
            Some(ax) => ax,
            None => return Ok(self.clone()),
        };

        let len = self.values.shape()[ax];
        if index >= len {
            return Err(DataError::IndexOutOfRange {
                dim: dim.to_string(),
                index,
                len,
            });
        }

        let mut dims = self.dims.clone();
        dims.remove(ax);

        Ok(Variable {
            dims,
            values: self.values.index_axis(Axis(ax), index).to_owned(),
            attrs: self.attrs.clone(),
        })
    }

    pub fn rename_dim(&mut self, old: &str, new: &str) {
        for d in self.dims.iter_mut() {
            if d == old {
                *d = new.to_string();
            }
        }
    }

    /// Rolls values along the dimension by `shift` positions
    /// (element `i` moves to `i + shift`), wrapping at the end.
    pub fn roll(&self, dim: &str, shift: usize) -> Variable {
        let ax = match self.axis_of(dim) {
            Some(ax) => ax,
            None => return self.clone(),
        };

        let len = self.values.shape()[ax];
        if len == 0 || shift % len == 0 {
            return self.clone();
        }

        let order: Vec<usize> = (0..len).map(|i| (i + len - shift % len) % len).collect();

        Variable {
            dims: self.dims.clone(),
            values: self.values.select(Axis(ax), &order),
            attrs: self.attrs.clone(),
        }
    }

    /// Reorders dimensions to the given order. All dimensions
    /// of the variable must be listed.
    pub fn transpose(&self, order: &[&str]) -> Result<Variable, DataError> {
        if order.len() != self.dims.len() {
            return Err(DataError::RankMismatch {
                expected: order.len(),
                found: self.dims.len(),
            });
        }

        let mut axes = Vec::with_capacity(order.len());
        for dim in order {
            let ax = self
                .axis_of(dim)
                .ok_or_else(|| DataError::MissingDimension(dim.to_string()))?;
            axes.push(ax);
        }

        Ok(Variable {
            dims: order.iter().map(|d| d.to_string()).collect(),
            values: self.values.clone().permuted_axes(axes.as_slice()),
            attrs: self.attrs.clone(),
        })
    }

    pub fn mapv(&self, f: impl Fn(Float) -> Float) -> Variable {
        Variable {
            dims: self.dims.clone(),
            values: self.values.mapv(f),
            attrs: self.attrs.clone(),
        }
    }

    pub fn as_1d(&self) -> Result<ArrayView1<Float>, DataError> {
        Ok(self.values.view().into_dimensionality::<Ix1>()?)
    }

    pub fn as_2d(&self) -> Result<ArrayView2<Float>, DataError> {
        Ok(self.values.view().into_dimensionality::<Ix2>()?)
    }

    /// Minimum and maximum of non-NaN values.
    pub fn min_max(&self) -> Option<(Float, Float)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Variable;
    use crate::data::AttrValue;
    use float_cmp::approx_eq;
    use ndarray::{arr2, Array3};

    #[test]
    fn rank_is_checked() {
        let values = Array3::<f64>::zeros((1, 2, 3)).into_dyn();
        assert!(Variable::new(&["y", "x"], values.clone()).is_err());
        assert!(Variable::new(&["t", "y", "x"], values).is_ok());
    }

    #[test]
    fn packed_values_are_decoded() {
        let mut var = Variable::from_vec("x", vec![-999.0, 10.0, 20.0, -1.0])
            .with_attr("_FillValue", -999.0)
            .with_attr("missing_value", -1_i64)
            .with_attr("scale_factor", 0.5)
            .with_attr("add_offset", 100.0)
            .with_attr("units", "ppbv");

        var.decode_cf();

        let values = var.values();
        assert!(values[0].is_nan());
        assert!(approx_eq!(f64, values[1], 105.0, ulps = 2));
        assert!(approx_eq!(f64, values[2], 110.0, ulps = 2));
        assert!(values[3].is_nan());

        assert!(var.numeric_attr("scale_factor").is_none());
        assert!(var.attrs.get("_FillValue").is_none());
        assert_eq!(var.attrs.get("units").and_then(AttrValue::as_text), Some("ppbv"));

        // decoding again is a no-op
        let decoded = var.clone();
        var.decode_cf();
        assert_eq!(var.values()[1], decoded.values()[1]);
    }

    #[test]
    fn unpacked_values_are_kept() {
        let mut var = Variable::from_vec("x", vec![1.0, 2.0]);
        var.decode_cf();
        assert_eq!(var.values().as_slice().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn squeeze_drops_unit_dims() {
        let values = Array3::<f64>::zeros((1, 2, 1)).into_dyn();
        let var = Variable::new(&["Time", "south_north", "west_east"], values).unwrap();
        let squeezed = var.squeeze();

        assert_eq!(squeezed.dims(), &["south_north".to_string()]);
        assert_eq!(squeezed.shape(), &[2]);
    }

    #[test]
    fn roll_and_select() {
        let var = Variable::from_array2(["y", "x"], arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));

        let rolled = var.roll("x", 1);
        assert_eq!(rolled.as_2d().unwrap(), arr2(&[[3.0, 1.0, 2.0], [6.0, 4.0, 5.0]]));

        let picked = var.isel("x", &[2, 0]).unwrap();
        assert_eq!(picked.as_2d().unwrap(), arr2(&[[3.0, 1.0], [6.0, 4.0]]));

        assert!(var.isel("x", &[3]).is_err());

        let row = var.index_dim("y", 1).unwrap();
        assert_eq!(row.as_1d().unwrap().to_vec(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn transpose_reorders_dims() {
        let var = Variable::from_array2(["y", "x"], arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        let t = var.transpose(&["x", "y"]).unwrap();

        assert_eq!(t.dims(), &["x".to_string(), "y".to_string()]);
        assert_eq!(t.as_2d().unwrap(), arr2(&[[1.0, 3.0], [2.0, 4.0]]));
    }
}
