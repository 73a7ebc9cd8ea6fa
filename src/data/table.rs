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

//! Sub-module with the tabular container for point observations.
//!
//! Tables are read from and written to CSV files. When reading,
//! each column is typed by trying numbers first, then timestamps,
//! and falling back to text. Empty cells become missing values.

use super::time::parse_datetime;
use crate::{errors::DataError, Float};
use chrono::NaiveDateTime;
use log::debug;
use std::path::Path;

/// Output layout of timestamps in CSV files.
pub(crate) const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Single table column. Missing values are NaN for
/// floats and `None` for the other kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Float(Vec<Float>),
    Text(Vec<Option<String>>),
    Time(Vec<Option<NaiveDateTime>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Text(_) => "text",
            Column::Time(_) => "time",
        }
    }

    /// Gathers rows, `None` produces a missing value.
    pub fn take(&self, rows: &[Option<usize>]) -> Column {
        match self {
            Column::Float(v) => Column::Float(
                rows.iter()
                    .map(|r| r.map_or(Float::NAN, |i| v[i]))
                    .collect(),
            ),
            Column::Text(v) => {
                Column::Text(rows.iter().map(|r| r.and_then(|i| v[i].clone())).collect())
            }
            Column::Time(v) => Column::Time(rows.iter().map(|r| r.and_then(|i| v[i])).collect()),
        }
    }

    fn filter(&self, mask: &[bool]) -> Column {
        let rows: Vec<Option<usize>> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| Some(i))
            .collect();
        self.take(&rows)
    }

    pub(crate) fn cell(&self, row: usize) -> String {
        match self {
            Column::Float(v) if v[row].is_nan() => String::new(),
            Column::Float(v) => v[row].to_string(),
            Column::Text(v) => v[row].clone().unwrap_or_default(),
            Column::Time(v) => v[row]
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    fn infer(cells: Vec<String>) -> Column {
        let present = || cells.iter().filter(|c| !c.trim().is_empty());

        if present().all(|c| c.trim().parse::<Float>().is_ok()) {
            return Column::Float(
                cells
                    .iter()
                    .map(|c| c.trim().parse::<Float>().unwrap_or(Float::NAN))
                    .collect(),
            );
        }

        if present().all(|c| parse_datetime(c).is_some()) {
            return Column::Time(cells.iter().map(|c| parse_datetime(c)).collect());
        }

        Column::Text(
            cells
                .into_iter()
                .map(|c| if c.is_empty() { None } else { Some(c) })
                .collect(),
        )
    }
}

/// Ordered set of equally long named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self, DataError> {
        self.set_column(name, column)?;
        Ok(self)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i].1)
    }

    pub fn try_column(&self, name: &str) -> Result<&Column, DataError> {
        self.column(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn float(&self, name: &str) -> Result<&[Float], DataError> {
        match self.try_column(name)? {
            Column::Float(v) => Ok(v),
            _ => Err(DataError::ColumnType(name.to_string(), "float")),
        }
    }

    pub fn text(&self, name: &str) -> Result<&[Option<String>], DataError> {
        match self.try_column(name)? {
            Column::Text(v) => Ok(v),
            _ => Err(DataError::ColumnType(name.to_string(), "text")),
        }
    }

    pub fn times(&self, name: &str) -> Result<&[Option<NaiveDateTime>], DataError> {
        match self.try_column(name)? {
            Column::Time(v) => Ok(v),
            _ => Err(DataError::ColumnType(name.to_string(), "time")),
        }
    }

    /// Replaces a column in place or appends it at the end.
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<(), DataError> {
        let replaces_only = self.ncols() == 1 && self.contains(name);
        if !self.columns.is_empty() && !replaces_only && column.len() != self.len() {
            return Err(DataError::LengthMismatch {
                name: name.to_string(),
                expected: self.len(),
                found: column.len(),
            });
        }

        match self.position(name) {
            Some(i) => self.columns[i].1 = column,
            None => self.columns.push((name.to_string(), column)),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        self.position(name).map(|i| self.columns.remove(i).1)
    }

    /// Renames a column, missing names are ignored.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(i) = self.position(old) {
            self.remove(new);
            // removal may have shifted the column
            let i = self.position(old).unwrap_or(i);
            self.columns[i].0 = new.to_string();
        }
    }

    pub fn select(&self, names: &[&str]) -> Result<Table, DataError> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push((name.to_string(), self.try_column(name)?.clone()));
        }
        Ok(Table { columns })
    }

    /// Gathers rows by index, `None` produces a row of missing values.
    pub fn take(&self, rows: &[Option<usize>]) -> Result<Table, DataError> {
        let len = self.len();
        if let Some(bad) = rows.iter().flatten().find(|&&r| r >= len) {
            return Err(DataError::IndexOutOfRange {
                dim: "row".to_string(),
                index: *bad,
                len,
            });
        }

        Ok(Table {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(rows)))
                .collect(),
        })
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Table, DataError> {
        if mask.len() != self.len() {
            return Err(DataError::LengthMismatch {
                name: "mask".to_string(),
                expected: self.len(),
                found: mask.len(),
            });
        }

        Ok(Table {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.filter(mask)))
                .collect(),
        })
    }

    /// Converts a text column holding timestamps into a time column.
    pub fn parse_time_column(&mut self, name: &str) -> Result<(), DataError> {
        let parsed = match self.try_column(name)? {
            Column::Time(_) => return Ok(()),
            Column::Text(v) => v
                .iter()
                .map(|cell| match cell {
                    None => Ok(None),
                    Some(s) => parse_datetime(s)
                        .map(Some)
                        .ok_or_else(|| DataError::Time(format!("cannot parse '{}'", s))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Column::Float(_) => return Err(DataError::ColumnType(name.to_string(), "text")),
        };

        self.set_column(name, Column::Time(parsed))
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Table, DataError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (i, column) in cells.iter_mut().enumerate() {
                column.push(record.get(i).unwrap_or("").to_string());
            }
        }

        let mut table = Table::new();
        for (name, column) in headers.into_iter().zip(cells) {
            let column = Column::infer(column);
            debug!("Read column {} of type {}", name, column.kind());
            table.columns.push((name, column));
        }

        Ok(table)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), DataError> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(self.columns.iter().map(|(n, _)| n.as_str()))?;

        for row in 0..self.len() {
            writer.write_record(self.columns.iter().map(|(_, c)| c.cell(row)))?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, Table};
    use chrono::NaiveDate;
    use std::io::Write;

    fn sample() -> Table {
        Table::new()
            .with_column("siteid", Column::Text(vec![Some("A".into()), Some("B".into())]))
            .unwrap()
            .with_column("obs", Column::Float(vec![1.0, f64::NAN]))
            .unwrap()
    }

    #[test]
    fn columns_have_equal_length() {
        let mut table = sample();
        assert!(table
            .set_column("bad", Column::Float(vec![1.0, 2.0, 3.0]))
            .is_err());
        assert!(table.set_column("obs", Column::Float(vec![2.0, 3.0])).is_ok());
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), vec!["siteid", "obs"]);
    }

    #[test]
    fn take_with_missing_rows() {
        let table = sample();
        let taken = table.take(&[Some(1), None, Some(0)]).unwrap();

        assert_eq!(taken.len(), 3);
        assert_eq!(
            taken.text("siteid").unwrap(),
            &[Some("B".to_string()), None, Some("A".to_string())]
        );
        assert!(taken.float("obs").unwrap()[1].is_nan());
        assert!(table.take(&[Some(2)]).is_err());
    }

    #[test]
    fn rename_replaces_existing() {
        let mut table = sample();
        table.rename("obs", "siteid");
        assert_eq!(table.column_names(), vec!["siteid"]);
        assert!(table.float("siteid").is_ok());
    }

    #[test]
    fn csv_types_are_inferred() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,siteid,latitude,longitude,obs").unwrap();
        writeln!(file, "2020-01-01 00:00:00,A,40.0,-100.0,3.5").unwrap();
        writeln!(file, "2020-01-01 01:00:00,B,41.0,-101.0,").unwrap();
        file.flush().unwrap();

        let table = Table::read_csv(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.try_column("time").unwrap().kind(), "time");
        assert_eq!(table.try_column("siteid").unwrap().kind(), "text");
        assert!(table.float("obs").unwrap()[1].is_nan());
        assert_eq!(
            table.times("time").unwrap()[1],
            Some(NaiveDate::from_ymd(2020, 1, 1).and_hms(1, 0, 0))
        );

        let out = tempfile::NamedTempFile::new().unwrap();
        table.write_csv(out.path()).unwrap();
        let again = Table::read_csv(out.path()).unwrap();
        assert_eq!(again.column_names(), table.column_names());
        assert_eq!(again.text("siteid").unwrap(), table.text("siteid").unwrap());
    }
}
