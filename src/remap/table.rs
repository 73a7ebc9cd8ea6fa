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

//! Nearest-neighbour remapping between observation tables.

use super::geometry::CoordinateDefinition;
use super::nearest::NearestResampler;
use crate::constants::{FAKE_INDEX, LATITUDE, LONGITUDE};
use crate::data::{Column, Table, Variable};
use crate::errors::RemapError;
use crate::Float;
use log::debug;
use ndarray::Array2;

impl Table {
    /// Point definition of table rows.
    pub fn sparse_swath(&self) -> Result<CoordinateDefinition, RemapError> {
        let table = self.rename_for_monet();
        CoordinateDefinition::from_points(table.float(LONGITUDE)?, table.float(LATITUDE)?)
    }

    /// Finds for every row of this table the nearest row of `source`
    /// within the radius of influence.
    ///
    /// Without `combine` the result holds source columns located at
    /// the points of this table. With `combine` the columns of this table
    /// come first and source columns it does not have are appended.
    pub fn remap_nearest(&self, source: &Table, radius_of_influence: Float, combine: bool) -> Result<Table, RemapError> {
        let source = source.rename_for_monet();
        let target = self.rename_for_monet();

        let source_def = source.sparse_swath()?;
        let target_def = target.sparse_swath()?;

        let fake_index = Variable::from_array2(
            ["y", "x"],
            Array2::from_shape_fn((1, source.len()), |(_, i)| i as Float),
        );

        let mut resampler = NearestResampler::new(source_def, target_def, radius_of_influence)?;
        resampler.get_neighbour_info()?;
        let sampled = resampler.get_sample_from_neighbour_info(&fake_index)?;

        let rows: Vec<Option<usize>> = sampled
            .values()
            .iter()
            .map(|i| if i.is_nan() { None } else { Some(*i as usize) })
            .collect();

        debug!(
            "Matched {} of {} rows through {}",
            rows.iter().flatten().count(),
            rows.len(),
            FAKE_INDEX
        );

        let taken = source.take(&rows)?;

        if combine {
            let mut result = target;
            for name in taken.column_names() {
                if !result.contains(&name) {
                    result.set_column(&name, taken.try_column(&name)?.clone())?;
                }
            }
            Ok(result)
        } else {
            let mut result = taken;
            result.set_column(LATITUDE, Column::Float(target.float(LATITUDE)?.to_vec()))?;
            result.set_column(LONGITUDE, Column::Float(target.float(LONGITUDE)?.to_vec()))?;
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{LATITUDE, LONGITUDE};
    use crate::data::{Column, Table};

    fn sites() -> Table {
        Table::new()
            .with_column("lat", Column::Float(vec![40.0, 41.0, 60.0]))
            .unwrap()
            .with_column("lon", Column::Float(vec![-105.0, -100.0, 10.0]))
            .unwrap()
            .with_column("siteid", Column::Text(vec![Some("a".into()), Some("b".into()), Some("c".into())]))
            .unwrap()
    }

    fn obs() -> Table {
        Table::new()
            .with_column(LATITUDE, Column::Float(vec![41.01, 40.02]))
            .unwrap()
            .with_column(LONGITUDE, Column::Float(vec![-100.01, -105.02]))
            .unwrap()
            .with_column("pm25", Column::Float(vec![7.0, 3.0]))
            .unwrap()
    }

    #[test]
    fn rows_are_matched_within_radius() {
        let out = sites().remap_nearest(&obs(), 1e5, false).unwrap();

        assert_eq!(out.float("pm25").unwrap()[..2], [3.0, 7.0]);
        assert!(out.float("pm25").unwrap()[2].is_nan());
        assert_eq!(out.float(LATITUDE).unwrap(), &[40.0, 41.0, 60.0]);
        assert!(!out.contains("siteid"));
    }

    #[test]
    fn combined_rows_keep_target_columns() {
        let out = sites().remap_nearest(&obs(), 1e5, true).unwrap();

        assert_eq!(
            out.column_names(),
            vec![LATITUDE.to_string(), LONGITUDE.to_string(), "siteid".to_string(), "pm25".to_string()]
        );
        assert_eq!(out.float("pm25").unwrap()[1], 7.0);
    }

    #[test]
    fn swath_uses_aliases() {
        let swath = sites().sparse_swath().unwrap();
        assert_eq!(swath.len(), 3);
        assert_eq!(swath.shape(), &[1, 3]);
    }
}
