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

//! Sub-module with the multi-variable labelled container.

use super::{AttrValue, Attrs, DataArray, Variable};
use crate::{errors::DataError, Float};
use chrono::NaiveDateTime;
use log::debug;
use std::collections::BTreeMap;

/// Name of the time dimension. When a dataset carries
/// decoded timestamps they label this dimension.
pub const TIME: &str = "time";

/// Collection of coordinate and data variables sharing dimensions.
///
/// Dimension lengths are not stored but derived from variables,
/// and every insertion checks that the new variable agrees with
/// the lengths already present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    coords: BTreeMap<String, Variable>,
    data_vars: BTreeMap<String, Variable>,
    pub attrs: Attrs,
    time: Option<Vec<NaiveDateTime>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coord(mut self, name: &str, var: Variable) -> Result<Self, DataError> {
        self.insert_coord(name, var)?;
        Ok(self)
    }

    pub fn with_data_var(mut self, name: &str, var: Variable) -> Result<Self, DataError> {
        self.insert_data_var(name, var)?;
        Ok(self)
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_time(mut self, time: Vec<NaiveDateTime>) -> Result<Self, DataError> {
        self.set_time(time)?;
        Ok(self)
    }

    fn all_vars(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.coords.iter().chain(self.data_vars.iter())
    }

    /// Lengths of all dimensions present in the dataset.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();

        for (_, var) in self.all_vars() {
            for (dim, len) in var.dims().iter().zip(var.shape()) {
                dims.entry(dim.clone()).or_insert(*len);
            }
        }

        if let Some(time) = &self.time {
            dims.entry(TIME.to_string()).or_insert(time.len());
        }

        dims
    }

    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.dims().get(dim).copied()
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dim_len(dim).is_some()
    }

    fn check_dims(&self, name: &str, var: &Variable) -> Result<(), DataError> {
        let mut existing = BTreeMap::new();
        for (other, other_var) in self.all_vars() {
            if other == name {
                continue;
            }
            for (dim, len) in other_var.dims().iter().zip(other_var.shape()) {
                existing.entry(dim.as_str()).or_insert(*len);
            }
        }

        if let Some(time) = &self.time {
            existing.entry(TIME).or_insert(time.len());
        }

        for (dim, len) in var.dims().iter().zip(var.shape()) {
            if let Some(&expected) = existing.get(dim.as_str()) {
                if expected != *len {
                    return Err(DataError::DimensionMismatch {
                        dim: dim.clone(),
                        expected,
                        found: *len,
                    });
                }
            }
        }

        Ok(())
    }

    /// Inserts (or replaces) a coordinate variable.
    pub fn insert_coord(&mut self, name: &str, var: Variable) -> Result<(), DataError> {
        self.check_dims(name, &var)?;
        self.data_vars.remove(name);
        self.coords.insert(name.to_string(), var);
        Ok(())
    }

    /// Inserts (or replaces) a data variable.
    pub fn insert_data_var(&mut self, name: &str, var: Variable) -> Result<(), DataError> {
        self.check_dims(name, &var)?;
        self.coords.remove(name);
        self.data_vars.insert(name.to_string(), var);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.coords
            .remove(name)
            .or_else(|| self.data_vars.remove(name))
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    /// Looks up a variable among coordinates first, then data variables.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.coord(name).or_else(|| self.data_var(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        match self.coords.get_mut(name) {
            Some(v) => Some(v),
            None => self.data_vars.get_mut(name),
        }
    }

    pub fn try_get(&self, name: &str) -> Result<&Variable, DataError> {
        self.get(name)
            .ok_or_else(|| DataError::MissingVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_coord(&self, name: &str) -> bool {
        self.coords.contains_key(name)
    }

    pub fn coords(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.coords.iter()
    }

    pub fn data_vars(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.data_vars.iter()
    }

    pub fn coord_names(&self) -> Vec<String> {
        self.coords.keys().cloned().collect()
    }

    pub fn data_var_names(&self) -> Vec<String> {
        self.data_vars.keys().cloned().collect()
    }

    pub fn time(&self) -> Option<&[NaiveDateTime]> {
        self.time.as_deref()
    }

    /// Sets decoded timestamps labelling the time dimension.
    pub fn set_time(&mut self, time: Vec<NaiveDateTime>) -> Result<(), DataError> {
        let current = self
            .all_vars()
            .find_map(|(_, v)| v.dim_len(TIME));

        if let Some(expected) = current {
            if expected != time.len() {
                return Err(DataError::DimensionMismatch {
                    dim: TIME.to_string(),
                    expected,
                    found: time.len(),
                });
            }
        }

        self.time = Some(time);
        Ok(())
    }

    pub fn clear_time(&mut self) {
        self.time = None;
    }

    /// Attribute value as a truthy flag, absent attributes are false.
    pub fn attr_flag(&self, key: &str) -> bool {
        self.attrs.get(key).map_or(false, AttrValue::is_truthy)
    }

    /// Moves data variables to coordinates.
    pub fn set_coords(&mut self, names: &[&str]) -> Result<(), DataError> {
        for name in names {
            if self.coords.contains_key(*name) {
                continue;
            }
            let var = self
                .data_vars
                .remove(*name)
                .ok_or_else(|| DataError::MissingVariable(name.to_string()))?;
            self.coords.insert(name.to_string(), var);
        }
        Ok(())
    }

    /// Renames a variable and the dimension with the same name.
    /// Missing names are ignored.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }

        if let Some(var) = self.coords.remove(old) {
            self.coords.insert(new.to_string(), var);
        } else if let Some(var) = self.data_vars.remove(old) {
            self.data_vars.insert(new.to_string(), var);
        }

        self.rename_dim(old, new);
    }

    /// Renames a dimension in every variable, keeping variable names.
    pub fn rename_dim(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }

        debug!("Renaming dimension {} to {}", old, new);

        for var in self.coords.values_mut().chain(self.data_vars.values_mut()) {
            var.rename_dim(old, new);
        }

        if old == TIME {
            self.time = None;
        }
    }

    /// Makes the 1-D variable `new`, laid along `old`, the dimension
    /// coordinate in place of `old`.
    pub fn swap_dims(&mut self, old: &str, new: &str) -> Result<(), DataError> {
        let var = self.try_get(new)?;
        if var.dims().len() != 1 || var.dims()[0] != old {
            return Err(DataError::MissingDimension(old.to_string()));
        }

        self.rename_dim(old, new);
        if !self.is_coord(new) {
            self.set_coords(&[new])?;
        }

        Ok(())
    }

    fn map_vars(
        &self,
        f: impl Fn(&Variable) -> Result<Variable, DataError>,
    ) -> Result<Dataset, DataError> {
        let mut coords = BTreeMap::new();
        for (name, var) in self.coords.iter() {
            coords.insert(name.clone(), f(var)?);
        }

        let mut data_vars = BTreeMap::new();
        for (name, var) in self.data_vars.iter() {
            data_vars.insert(name.clone(), f(var)?);
        }

        Ok(Dataset {
            coords,
            data_vars,
            attrs: self.attrs.clone(),
            time: self.time.clone(),
        })
    }

    /// Selects indices along a dimension in every variable.
    pub fn isel(&self, dim: &str, indices: &[usize]) -> Result<Dataset, DataError> {
        let mut selected = self.map_vars(|v| v.isel(dim, indices))?;

        if dim == TIME {
            if let Some(time) = &self.time {
                let mut picked = Vec::with_capacity(indices.len());
                for &i in indices {
                    let t = time.get(i).ok_or_else(|| DataError::IndexOutOfRange {
                        dim: TIME.to_string(),
                        index: i,
                        len: time.len(),
                    })?;
                    picked.push(*t);
                }
                selected.time = Some(picked);
            }
        }

        Ok(selected)
    }

    /// Takes one index along a dimension, dropping the dimension.
    pub fn index_dim(&self, dim: &str, index: usize) -> Result<Dataset, DataError> {
        let mut selected = self.map_vars(|v| v.index_dim(dim, index))?;

        if dim == TIME {
            selected.time = None;
        }

        Ok(selected)
    }

    /// Rolls every variable (coordinates included) along a dimension.
    pub fn roll(&self, dim: &str, shift: usize) -> Dataset {
        let mut rolled = self.clone();
        for var in rolled
            .coords
            .values_mut()
            .chain(rolled.data_vars.values_mut())
        {
            *var = var.roll(dim, shift);
        }

        if dim == TIME {
            if let Some(time) = rolled.time.as_mut() {
                let len = time.len();
                if len > 0 {
                    time.rotate_right(shift % len);
                }
            }
        }

        rolled
    }

    /// Extracts a data variable together with the coordinates
    /// that are defined on its dimensions.
    pub fn data_array(&self, name: &str) -> Result<DataArray, DataError> {
        let var = self
            .data_vars
            .get(name)
            .or_else(|| self.coords.get(name))
            .ok_or_else(|| DataError::MissingVariable(name.to_string()))?;

        let mut coords = Dataset::new();
        for (cname, cvar) in self.coords.iter() {
            if cname != name && cvar.dims().iter().all(|d| var.has_dim(d)) {
                coords.coords.insert(cname.clone(), cvar.clone());
            }
        }

        if var.has_dim(TIME) {
            coords.time = self.time.clone();
        }
        coords.attrs = self.attrs.clone();

        Ok(DataArray::from_parts(name, var.clone(), coords))
    }

    /// Copies coordinates (and time index) of another dataset into this one.
    pub fn merge_coords(&mut self, other: &Dataset) -> Result<(), DataError> {
        for (name, var) in other.coords.iter() {
            self.insert_coord(name, var.clone())?;
        }
        if self.time.is_none() {
            if let Some(time) = &other.time {
                self.set_time(time.clone())?;
            }
        }
        Ok(())
    }

    /// Mean of all non-NaN values of a variable.
    pub fn nanmean(&self, name: &str) -> Result<Float, DataError> {
        let var = self.try_get(name)?;
        let (sum, count) = var
            .values()
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

        Ok(if count == 0 {
            Float::NAN
        } else {
            sum / count as Float
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Dataset, TIME};
    use crate::data::Variable;
    use chrono::NaiveDate;
    use ndarray::{arr2, Array3};

    fn sample() -> Dataset {
        Dataset::new()
            .with_coord("lat", Variable::from_vec("lat", vec![10.0, 20.0]))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", vec![0.0, 90.0, 180.0]))
            .unwrap()
            .with_data_var(
                "t2m",
                Variable::from_array2(["lat", "lon"], arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])),
            )
            .unwrap()
    }

    #[test]
    fn dims_are_consistent() {
        let mut ds = sample();
        assert_eq!(ds.dim_len("lat"), Some(2));
        assert_eq!(ds.dim_len("lon"), Some(3));

        let bad = Variable::from_vec("lon", vec![1.0, 2.0]);
        assert!(ds.insert_data_var("bad", bad).is_err());

        // replacing a variable may change the length it alone defines
        let mut single = Dataset::new()
            .with_data_var("a", Variable::from_vec("n", vec![1.0]))
            .unwrap();
        assert!(single
            .insert_data_var("a", Variable::from_vec("n", vec![1.0, 2.0]))
            .is_ok());
    }

    #[test]
    fn swapped_dimension_takes_coordinate_name() {
        let mut ds = sample()
            .with_data_var("station", Variable::from_vec("lon", vec![7.0, 8.0, 9.0]))
            .unwrap();

        ds.swap_dims("lon", "station").unwrap();

        assert!(ds.is_coord("station"));
        assert_eq!(ds.dim_len("station"), Some(3));
        assert!(!ds.has_dim("lon"));
        assert!(ds.swap_dims("lat", "t2m").is_err());
    }

    #[test]
    fn rename_follows_dimensions() {
        let mut ds = sample();
        ds.rename("lat", "latitude");

        assert!(ds.coord("latitude").is_some());
        assert!(ds.coord("lat").is_none());
        assert_eq!(ds.data_var("t2m").unwrap().dims()[0], "latitude");
    }

    #[test]
    fn data_array_keeps_matching_coords() {
        let ds = sample()
            .with_coord("station", Variable::from_vec("station", vec![1.0]))
            .unwrap();
        let da = ds.data_array("t2m").unwrap();

        assert!(da.coords().coord("lat").is_some());
        assert!(da.coords().coord("station").is_none());
        assert_eq!(da.name(), "t2m");
    }

    #[test]
    fn time_follows_selection() {
        let t0 = NaiveDate::from_ymd(2020, 1, 1).and_hms(0, 0, 0);
        let t1 = NaiveDate::from_ymd(2020, 1, 1).and_hms(1, 0, 0);

        let ds = Dataset::new()
            .with_data_var(
                "o3",
                Variable::new(&[TIME, "y", "x"], Array3::zeros((2, 1, 1)).into_dyn()).unwrap(),
            )
            .unwrap()
            .with_time(vec![t0, t1])
            .unwrap();

        let second = ds.isel(TIME, &[1]).unwrap();
        assert_eq!(second.time().unwrap(), &[t1]);

        let dropped = ds.index_dim(TIME, 0).unwrap();
        assert!(dropped.time().is_none());
        assert!(!dropped.has_dim(TIME));

        assert!(ds.clone().with_time(vec![t0]).is_err());
    }
}
