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

//! Export of point observations in the 11-column ASCII layout
//! read by the MET `ascii2nc` tool.
//!
//! Each row holds `typ sid vld lat lon elv var lvl hgt qc obs`:
//! message type, station id, valid time (`%Y%m%d_%H%M%S`), location,
//! elevation, GRIB code, pressure level, height above ground,
//! quality flag and observed value.

use crate::constants::{LATITUDE, LONGITUDE};
use crate::data::{Column, Table, TIME};
use crate::errors::DataError;
use crate::Float;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

const VALID_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Constant value or name of a column holding per-row values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSource {
    Value(Float),
    Column(String),
}

impl FieldSource {
    fn resolve(&self, table: &Table) -> Result<Vec<Float>, DataError> {
        match self {
            FieldSource::Value(v) => Ok(vec![*v; table.len()]),
            FieldSource::Column(name) => Ok(table.float(name)?.to_vec()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ascii2ncOptions {
    #[serde(default = "Ascii2ncOptions::default_grib_code")]
    pub grib_code: u32,
    #[serde(default = "Ascii2ncOptions::default_height_msl")]
    pub height_msl: FieldSource,
    #[serde(default = "Ascii2ncOptions::default_column")]
    pub column: String,
    #[serde(default = "Ascii2ncOptions::default_message_type")]
    pub message_type: String,
    #[serde(default = "Ascii2ncOptions::default_pressure")]
    pub pressure: FieldSource,
    #[serde(default)]
    pub qc: Option<String>,
    #[serde(default)]
    pub height_agl: Option<FieldSource>,
}

impl Ascii2ncOptions {
    fn default_grib_code() -> u32 {
        126
    }
    fn default_height_msl() -> FieldSource {
        FieldSource::Value(0.0)
    }
    fn default_column() -> String {
        "aod_550nm".to_string()
    }
    fn default_message_type() -> String {
        "ADPUPA".to_string()
    }
    fn default_pressure() -> FieldSource {
        FieldSource::Value(1000.0)
    }
}

impl Default for Ascii2ncOptions {
    fn default() -> Self {
        Ascii2ncOptions {
            grib_code: Self::default_grib_code(),
            height_msl: Self::default_height_msl(),
            column: Self::default_column(),
            message_type: Self::default_message_type(),
            pressure: Self::default_pressure(),
            qc: None,
            height_agl: None,
        }
    }
}

/// Single `ascii2nc` observation line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ascii2ncRecord {
    pub typ: String,
    pub sid: String,
    pub vld: String,
    pub lat: Float,
    pub lon: Float,
    pub elv: Float,
    pub var: String,
    pub lvl: Float,
    pub hgt: Float,
    pub qc: String,
    pub obs: Float,
}

impl Table {
    /// Observations as `ascii2nc` records, requires `siteid` and `time`
    /// columns together with latitude and longitude.
    ///
    /// Without a QC column rows with missing values are flagged `"1"`,
    /// other rows `"0"`.
    pub fn to_ascii2nc_list(&self, opts: &Ascii2ncOptions) -> Result<Vec<Ascii2ncRecord>, DataError> {
        let table = self.rename_for_monet();
        let n = table.len();

        let sites = table.try_column("siteid")?;
        let times = table.times(TIME)?;
        let lats = table.float(LATITUDE)?;
        let lons = table.float(LONGITUDE)?;
        let values = table.float(&opts.column)?;

        let elevation = opts.height_msl.resolve(&table)?;
        let pressure = opts.pressure.resolve(&table)?;
        let height = match &opts.height_agl {
            Some(source) => source.resolve(&table)?,
            None => elevation.clone(),
        };
        let qc: Option<&Column> = match &opts.qc {
            Some(name) => Some(table.try_column(name)?),
            None => None,
        };

        let records: Vec<Ascii2ncRecord> = (0..n)
            .map(|row| Ascii2ncRecord {
                typ: opts.message_type.clone(),
                sid: sites.cell(row),
                vld: times[row]
                    .map(|t| t.format(VALID_TIME_FORMAT).to_string())
                    .unwrap_or_default(),
                lat: lats[row],
                lon: lons[row],
                elv: elevation[row],
                var: opts.grib_code.to_string(),
                lvl: pressure[row],
                hgt: height[row],
                qc: match qc {
                    Some(column) => column.cell(row),
                    None if values[row].is_nan() => "1".to_string(),
                    None => "0".to_string(),
                },
                obs: values[row],
            })
            .collect();

        debug!("Prepared {} ascii2nc records of {}", records.len(), opts.column);

        Ok(records)
    }

    /// Observations in the `ascii2nc` column layout.
    pub fn to_ascii2nc_table(&self, opts: &Ascii2ncOptions) -> Result<Table, DataError> {
        let records = self.to_ascii2nc_list(opts)?;

        let text = |f: fn(&Ascii2ncRecord) -> &String| -> Column {
            Column::Text(records.iter().map(|r| Some(f(r).clone())).collect())
        };
        let float = |f: fn(&Ascii2ncRecord) -> Float| -> Column { Column::Float(records.iter().map(f).collect()) };

        Table::new()
            .with_column("typ", text(|r| &r.typ))?
            .with_column("sid", text(|r| &r.sid))?
            .with_column("vld", text(|r| &r.vld))?
            .with_column("lat", float(|r| r.lat))?
            .with_column("lon", float(|r| r.lon))?
            .with_column("elv", float(|r| r.elv))?
            .with_column("var", text(|r| &r.var))?
            .with_column("lvl", float(|r| r.lvl))?
            .with_column("hgt", float(|r| r.hgt))?
            .with_column("qc", text(|r| &r.qc))?
            .with_column("obs", float(|r| r.obs))
    }

    /// Writes the `ascii2nc` records space separated, without header.
    pub fn write_ascii2nc(&self, path: &Path, opts: &Ascii2ncOptions) -> Result<(), DataError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_path(path)?;

        for record in self.to_ascii2nc_list(opts)? {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Ascii2ncOptions, FieldSource};
    use crate::data::{Column, Table, TIME};
    use chrono::NaiveDate;

    fn aeronet() -> Table {
        let t = |h| Some(NaiveDate::from_ymd(2020, 7, 4).and_hms(h, 30, 0));

        Table::new()
            .with_column("siteid", Column::Text(vec![Some("GSFC".into()), Some("Tucson".into())]))
            .unwrap()
            .with_column(TIME, Column::Time(vec![t(12), t(18)]))
            .unwrap()
            .with_column("latitude", Column::Float(vec![38.99, 32.23]))
            .unwrap()
            .with_column("longitude", Column::Float(vec![-76.84, -110.95]))
            .unwrap()
            .with_column("elevation", Column::Float(vec![87.0, 779.0]))
            .unwrap()
            .with_column("aod_550nm", Column::Float(vec![0.21, f64::NAN]))
            .unwrap()
    }

    #[test]
    fn default_layout() {
        let out = aeronet().to_ascii2nc_table(&Ascii2ncOptions::default()).unwrap();

        assert_eq!(
            out.column_names(),
            vec!["typ", "sid", "vld", "lat", "lon", "elv", "var", "lvl", "hgt", "qc", "obs"]
        );
        assert_eq!(out.text("vld").unwrap()[0].as_deref(), Some("20200704_123000"));
        assert_eq!(out.text("var").unwrap()[0].as_deref(), Some("126"));
        assert_eq!(out.text("typ").unwrap()[1].as_deref(), Some("ADPUPA"));
        assert_eq!(out.text("qc").unwrap()[0].as_deref(), Some("0"));
        assert_eq!(out.text("qc").unwrap()[1].as_deref(), Some("1"));
        assert_eq!(out.float("lvl").unwrap(), &[1000.0, 1000.0]);
    }

    #[test]
    fn columns_as_sources() {
        let opts = Ascii2ncOptions {
            height_msl: FieldSource::Column("elevation".into()),
            height_agl: Some(FieldSource::Value(2.0)),
            ..Ascii2ncOptions::default()
        };
        let records = aeronet().to_ascii2nc_list(&opts).unwrap();

        assert_eq!(records[1].elv, 779.0);
        assert_eq!(records[1].hgt, 2.0);
        assert_eq!(records[1].sid, "Tucson");
    }

    #[test]
    fn lines_are_space_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aod.txt");

        aeronet().write_ascii2nc(&path, &Ascii2ncOptions::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let first = text.lines().next().unwrap();

        assert_eq!(first.split(' ').count(), 11);
        assert!(first.starts_with("ADPUPA GSFC 20200704_123000 38.99 -76.84 0"));
    }
}
