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

//! Reading NetCDF files into datasets.

use crate::data::{decode_cf_time, AttrValue, Attrs, Dataset, Variable, TIME};
use crate::errors::DataError;
use crate::Float;
use log::{debug, warn};
use ndarray::{ArrayD, IxDyn};
use netcdf::AttributeValue;
use std::path::Path;

fn convert_attribute(value: AttributeValue) -> Option<AttrValue> {
    let converted = match value {
        AttributeValue::Uchar(v) => AttrValue::Int(v as i64),
        AttributeValue::Schar(v) => AttrValue::Int(v as i64),
        AttributeValue::Ushort(v) => AttrValue::Int(v as i64),
        AttributeValue::Short(v) => AttrValue::Int(v as i64),
        AttributeValue::Uint(v) => AttrValue::Int(v as i64),
        AttributeValue::Int(v) => AttrValue::Int(v as i64),
        AttributeValue::Ulonglong(v) => AttrValue::Int(v as i64),
        AttributeValue::Longlong(v) => AttrValue::Int(v),
        AttributeValue::Float(v) => AttrValue::Float(v as Float),
        AttributeValue::Double(v) => AttrValue::Float(v),
        AttributeValue::Str(v) => AttrValue::Text(v),
        AttributeValue::Floats(v) => AttrValue::Float(*v.first()? as Float),
        AttributeValue::Doubles(v) => AttrValue::Float(*v.first()?),
        AttributeValue::Ints(v) => AttrValue::Int(*v.first()? as i64),
        AttributeValue::Shorts(v) => AttrValue::Int(*v.first()? as i64),
        AttributeValue::Strs(v) => AttrValue::Text(v.join(" ")),
        _ => return None,
    };

    Some(converted)
}

fn read_attributes<'a>(attributes: impl Iterator<Item = netcdf::Attribute<'a>>) -> Attrs {
    let mut attrs = Attrs::new();

    for attr in attributes {
        match attr.value().ok().and_then(convert_attribute) {
            Some(value) => {
                attrs.insert(attr.name().to_string(), value);
            }
            None => debug!("Skipping attribute {} of unsupported type", attr.name()),
        }
    }

    attrs
}

/// Reads all numeric variables of a NetCDF file together with their
/// attributes. 1-D variables named after their dimension become
/// coordinates, a `time` variable with CF units is decoded.
pub fn open_dataset(path: impl AsRef<Path>) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;

    let mut ds = Dataset::new();
    ds.attrs = read_attributes(file.attributes());

    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let attrs = read_attributes(var.attributes());

        let raw: Vec<Float> = match var.get_values::<Float, _>(..) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Skipping non-numeric variable {}: {}", name, err);
                continue;
            }
        };

        let values = ArrayD::from_shape_vec(IxDyn(&shape), raw)?;
        let mut variable = Variable::from_parts(dims.clone(), values, attrs);
        variable.decode_cf();

        if dims.len() == 1 && dims[0] == name {
            ds.insert_coord(&name, variable)?;
        } else {
            ds.insert_data_var(&name, variable)?;
        }
    }

    if let Some(time) = ds.get(TIME) {
        let units = time.attrs.get("units").and_then(AttrValue::as_text);
        if let (1, Some(units)) = (time.ndim(), units) {
            let values: Vec<Float> = time.values().iter().copied().collect();
            let decoded = decode_cf_time(&values, units)?;
            ds.set_time(decoded)?;
        }
    }

    debug!(
        "Opened {} with {} coordinates and {} variables",
        path.display(),
        ds.coord_names().len(),
        ds.data_var_names().len()
    );

    Ok(ds)
}
