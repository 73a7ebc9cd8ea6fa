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

//! Sub-module with the single-variable labelled array.

use super::{Dataset, Variable};
use crate::errors::DataError;

/// A named data variable together with its coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: String,
    variable: Variable,
    coords: Dataset,
}

impl DataArray {
    pub fn new(name: &str, variable: Variable) -> Self {
        DataArray {
            name: name.to_string(),
            variable,
            coords: Dataset::new(),
        }
    }

    pub(crate) fn from_parts(name: &str, variable: Variable, coords: Dataset) -> Self {
        DataArray {
            name: name.to_string(),
            variable,
            coords,
        }
    }

    pub fn with_coord(mut self, name: &str, var: Variable) -> Result<Self, DataError> {
        self.check_coord(&var)?;
        self.coords.insert_coord(name, var)?;
        Ok(self)
    }

    fn check_coord(&self, var: &Variable) -> Result<(), DataError> {
        for (dim, len) in var.dims().iter().zip(var.shape()) {
            if let Some(expected) = self.variable.dim_len(dim) {
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

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn coords(&self) -> &Dataset {
        &self.coords
    }

    pub fn dims(&self) -> &[String] {
        self.variable.dims()
    }

    /// Builds a dataset containing the coordinates and this variable.
    pub fn to_dataset(&self) -> Result<Dataset, DataError> {
        let mut ds = self.coords.clone();
        ds.insert_data_var(&self.name, self.variable.clone())?;
        Ok(ds)
    }

    /// Extracts the named variable of a dataset.
    pub fn from_dataset(ds: &Dataset, name: &str) -> Result<Self, DataError> {
        ds.data_array(name)
    }
}

#[cfg(test)]
mod tests {
    use super::DataArray;
    use crate::data::Variable;
    use ndarray::arr2;

    #[test]
    fn round_trip_through_dataset() {
        let da = DataArray::new(
            "pm25",
            Variable::from_array2(["y", "x"], arr2(&[[1.0, 2.0], [3.0, 4.0]])),
        )
        .with_coord("x", Variable::from_vec("x", vec![0.0, 1.0]))
        .unwrap();

        assert!(da
            .clone()
            .with_coord("y", Variable::from_vec("y", vec![0.0, 1.0, 2.0]))
            .is_err());

        let ds = da.to_dataset().unwrap();
        assert!(ds.data_var("pm25").is_some());
        assert!(ds.coord("x").is_some());

        let back = DataArray::from_dataset(&ds, "pm25").unwrap();
        assert_eq!(back, da);
    }
}
