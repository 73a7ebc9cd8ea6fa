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

//! Sparse regridding weights and their on-disk cache.
//!
//! Weights are stored as a CSV file with `row,col,S` columns, where
//! `row` indexes the flattened target grid, `col` the flattened source
//! grid and `S` is the weight. The first line is a `#` comment holding
//! the grid sizes and the entry count, so that a truncated file is
//! rejected on load.

use crate::errors::RemapError;
use crate::Float;
use log::debug;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

const HEADER_PREFIX: &str = "# monet regrid weights";

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WeightRecord {
    row: usize,
    col: usize,
    #[serde(rename = "S")]
    s: Float,
}

/// Sparse matrix of weights mapping source values onto target points.
#[derive(Clone, Debug, PartialEq)]
pub struct RegridWeights {
    n_target: usize,
    n_source: usize,
    entries: Vec<(usize, usize, Float)>,
}

impl RegridWeights {
    pub fn new(n_target: usize, n_source: usize, entries: Vec<(usize, usize, Float)>) -> Self {
        RegridWeights {
            n_target,
            n_source,
            entries,
        }
    }

    pub fn entries(&self) -> &[(usize, usize, Float)] {
        &self.entries
    }

    pub fn n_target(&self) -> usize {
        self.n_target
    }

    pub fn n_source(&self) -> usize {
        self.n_source
    }

    fn header(&self) -> String {
        format!(
            "{} targets={} sources={} entries={}",
            HEADER_PREFIX,
            self.n_target,
            self.n_source,
            self.entries.len()
        )
    }

    /// Writes weights into a temporary file next to `path` and moves it
    /// into place, so readers never see a partly written cache.
    pub fn write_csv(&self, path: &Path) -> Result<(), RemapError> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        writeln!(file, "{}", self.header())?;

        {
            let mut writer = csv::Writer::from_writer(file.as_file_mut());
            for &(row, col, s) in &self.entries {
                writer.serialize(WeightRecord { row, col, s })?;
            }
            writer.flush()?;
        }

        file.persist(path).map_err(|err| err.error)?;
        debug!("Wrote {} weights to {}", self.entries.len(), path.display());

        Ok(())
    }

    /// Reads weights from file checking that they fit grids of given sizes
    /// and that no entries are missing.
    pub fn read_csv(path: &Path, n_target: usize, n_source: usize) -> Result<Self, RemapError> {
        let mismatch = |reason| RemapError::WeightsMismatch {
            path: path.display().to_string(),
            reason,
        };

        let mut input = BufReader::new(fs::File::open(path)?);
        let mut first = String::new();
        input.read_line(&mut first)?;

        let sizes = parse_header(&first).ok_or_else(|| mismatch("missing or malformed header"))?;
        if sizes.0 != n_target {
            return Err(mismatch("target grid size differs"));
        }
        if sizes.1 != n_source {
            return Err(mismatch("source grid size differs"));
        }

        let mut reader = csv::Reader::from_reader(input);
        let mut entries = Vec::with_capacity(sizes.2);

        for record in reader.deserialize() {
            let record: WeightRecord = record?;

            if record.row >= n_target {
                return Err(mismatch("target index out of grid"));
            }
            if record.col >= n_source {
                return Err(mismatch("source index out of grid"));
            }
            if !record.s.is_finite() {
                return Err(mismatch("weight is not finite"));
            }

            entries.push((record.row, record.col, record.s));
        }

        if entries.len() != sizes.2 {
            return Err(mismatch("entry count differs, file is incomplete"));
        }

        debug!("Read {} weights from {}", entries.len(), path.display());

        Ok(RegridWeights {
            n_target,
            n_source,
            entries,
        })
    }

    /// Applies weights to source values laid out as `(other, source)`.
    ///
    /// NaN source values are skipped. With `renormalize` the weighted sum
    /// is divided by the sum of weights of valid sources, otherwise
    /// the weighted sum is returned as is, which keeps area-weighted
    /// (conservative) weights conservative. Targets without any valid
    /// contribution are NaN.
    pub fn apply(&self, values: ArrayView2<Float>, renormalize: bool) -> Array2<Float> {
        let n_other = values.nrows();
        let mut numerator = Array2::<Float>::zeros((n_other, self.n_target));
        let mut denominator = Array2::<Float>::zeros((n_other, self.n_target));

        for &(row, col, s) in &self.entries {
            for k in 0..n_other {
                let v = values[[k, col]];
                if !v.is_nan() {
                    numerator[[k, row]] += s * v;
                    denominator[[k, row]] += s;
                }
            }
        }

        numerator.zip_mut_with(&denominator, |n, d| {
            *n = match (*d > 0.0, renormalize) {
                (false, _) => Float::NAN,
                (true, true) => *n / *d,
                (true, false) => *n,
            };
        });

        numerator
    }
}

/// Grid sizes and entry count stored in the first line of the cache.
fn parse_header(line: &str) -> Option<(usize, usize, usize)> {
    let mut fields = line.trim().strip_prefix(HEADER_PREFIX)?.split_whitespace();

    let mut value = |key: &str| -> Option<usize> {
        fields.next()?.strip_prefix(key)?.strip_prefix('=')?.parse().ok()
    };

    Some((value("targets")?, value("sources")?, value("entries")?))
}

#[cfg(test)]
mod tests {
    use super::RegridWeights;
    use ndarray::arr2;

    #[test]
    fn weights_are_applied() {
        let weights = RegridWeights::new(3, 2, vec![(0, 0, 0.25), (0, 1, 0.75), (1, 1, 1.0)]);
        let out = weights.apply(arr2(&[[4.0, 8.0], [f64::NAN, 2.0]]).view(), true);

        assert_eq!(out[[0, 0]], 7.0);
        assert_eq!(out[[0, 1]], 8.0);
        assert!(out[[0, 2]].is_nan());
        assert_eq!(out[[1, 0]], 2.0);
    }

    #[test]
    fn partial_coverage_is_kept_without_renormalizing() {
        // target 0 is covered by a quarter of source 0 only
        let weights = RegridWeights::new(2, 1, vec![(0, 0, 0.25)]);
        let out = weights.apply(arr2(&[[4.0]]).view(), false);

        assert_eq!(out[[0, 0]], 1.0);
        assert!(out[[0, 1]].is_nan());
    }

    #[test]
    fn cache_round_trip_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");

        let weights = RegridWeights::new(2, 2, vec![(0, 1, 0.5), (1, 0, 1.0)]);
        weights.write_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("# monet regrid weights targets=2 sources=2 entries=2"));
        assert_eq!(lines.next(), Some("row,col,S"));

        assert_eq!(RegridWeights::read_csv(&path, 2, 2).unwrap(), weights);
        assert!(RegridWeights::read_csv(&path, 1, 2).is_err());
        assert!(RegridWeights::read_csv(&path, 2, 1).is_err());
    }

    #[test]
    fn truncated_cache_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");

        let weights = RegridWeights::new(2, 2, vec![(0, 0, 0.5), (0, 1, 0.5), (1, 1, 1.0)]);
        weights.write_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let kept: Vec<&str> = content.lines().take(4).collect();
        std::fs::write(&path, kept.join("\n") + "\n").unwrap();
        assert!(RegridWeights::read_csv(&path, 2, 2).is_err());

        std::fs::write(&path, "row,col,S\n0,0,1.0\n").unwrap();
        assert!(RegridWeights::read_csv(&path, 2, 2).is_err());
    }
}
