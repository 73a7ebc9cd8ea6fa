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

//! Module with the labelled data structures the accessors operate on.
//!
//! Two families of types are provided. The gridded ones ([`Variable`],
//! [`Dataset`], [`DataArray`]) carry n-dimensional arrays with named
//! dimensions, coordinates and attributes, in the spirit of NetCDF files.
//! The tabular one ([`Table`]) stores point observations as named columns.
//!
//! Only the features needed by the geospatial accessors are implemented.

mod dataarray;
mod dataset;
mod table;
mod time;
mod variable;

pub use dataarray::DataArray;
pub use dataset::{Dataset, TIME};
pub use table::{Column, Table};
pub use time::decode_cf_time;
pub use variable::Variable;

use crate::Float;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes attached to variables and datasets.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Value of a single attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(Float),
    Text(String),
}

impl AttrValue {
    /// Truthiness of the attribute, following the rules
    /// of NetCDF attributes stored as numbers or strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::Int(i) => *i != 0,
            AttrValue::Float(f) => *f != 0.0 && !f.is_nan(),
            AttrValue::Text(s) => !s.is_empty() && s != "False" && s != "false" && s != "0",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<Float> for AttrValue {
    fn from(v: Float) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::AttrValue;

    #[test]
    fn attribute_truthiness() {
        assert!(AttrValue::from(true).is_truthy());
        assert!(AttrValue::from(1_i64).is_truthy());
        assert!(AttrValue::from("True").is_truthy());
        assert!(!AttrValue::from("False").is_truthy());
        assert!(!AttrValue::from(0.0).is_truthy());
        assert!(!AttrValue::from(f64::NAN).is_truthy());
    }
}
