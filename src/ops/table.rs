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

//! Accessors of observation tables.

use crate::constants::{LATITUDE, LATLON_ALIASES, LONGITUDE, TABLE_LATLON_ALIAS};
use crate::data::{Column, Dataset, Table, Variable};
use crate::errors::DataError;
use crate::Float;
use log::debug;
use ndarray::Array2;

fn nanmean(values: &[Float]) -> Float {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        Float::NAN
    } else {
        sum / count as Float
    }
}

impl Table {
    /// Renames the first latitude/longitude alias pair found
    /// in columns to `latitude`/`longitude`.
    pub fn rename_for_monet(&self) -> Table {
        let mut table = self.clone();
        if table.contains(LATITUDE) {
            return table;
        }

        let aliases = LATLON_ALIASES[..3].iter().chain(std::iter::once(&TABLE_LATLON_ALIAS));
        for (lat, lon) in aliases {
            if table.contains(lat) {
                table.rename(lat, LATITUDE);
                table.rename(lon, LONGITUDE);
                debug!("Renamed table columns {}/{}", lat, lon);
                break;
            }
        }

        table
    }

    /// Mean longitude and mean latitude of rows, `(lon, lat)`.
    ///
    /// This is not necessarily the geographic center of the points.
    pub fn center(&self) -> Result<(Float, Float), DataError> {
        let table = self.rename_for_monet();
        Ok((nanmean(table.float(LONGITUDE)?), nanmean(table.float(LATITUDE)?)))
    }

    /// Converts numeric columns into variables on `(y, x)`
    /// of shape `(1, rows)`, latitude and longitude become coordinates.
    pub fn to_dataset(&self) -> Result<Dataset, DataError> {
        let table = self.rename_for_monet();
        let n = table.len();

        let mut ds = Dataset::new();
        ds.insert_coord("x", Variable::from_vec("x", (0..n).map(|i| i as Float).collect()))?;

        for name in table.column_names() {
            let values = match table.try_column(&name)? {
                Column::Float(v) => v,
                other => {
                    debug!("Column {} of type {} not converted", name, other.kind());
                    continue;
                }
            };

            let var = Variable::from_array2(["y", "x"], Array2::from_shape_fn((1, n), |(_, i)| values[i]));
            if name == LATITUDE || name == LONGITUDE {
                ds.insert_coord(&name, var)?;
            } else {
                ds.insert_data_var(&name, var)?;
            }
        }

        Ok(ds)
    }
}
