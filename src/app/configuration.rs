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

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use monet::constants::DEFAULT_COMBINE_RADIUS;
use monet::errors::ConfigError;
use monet::export::Ascii2ncOptions;
use monet::plots::{QuickMapOptions, TimeseriesOptions};
use monet::remap::{CombineMethod, CombineOptions, RegridMethod, RegridOptions};
use monet::Float;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fields with information about input data.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Input {
    /// CSV file with point observations. Must contain latitude
    /// and longitude columns under any of the recognised names.
    pub observations: PathBuf,

    /// _(Optional)_ NetCDF file with the model grid the
    /// observations are paired with. Requires the `netcdf` feature.
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// _(Optional)_ CSV file with target points onto which
    /// observations are remapped.
    ///
    /// Exactly one of `model` and `target` must be set.
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// _(Optional)_ Model variables to pair. All variables
    /// with spatial dimensions are used when empty.
    #[serde(default)]
    pub variables: Vec<String>,

    /// _(Optional)_ Name of the timestamp column of the tables.
    ///
    /// Defaults to `time`.
    #[serde(default = "Input::default_time_column")]
    pub time_column: String,

    /// _(Optional)_ Names of the latitude and longitude
    /// variables of the model grid, when not detected automatically.
    #[serde(default)]
    pub latlon_names: Option<(String, String)>,
}

impl Input {
    fn default_time_column() -> String {
        "time".to_string()
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.model.is_some() == self.target.is_some() {
            return Err(ConfigError::OutOfBounds(
                "Exactly one of model and target input must be given",
            ));
        }

        if self.variables.iter().any(|v| v.trim().is_empty()) {
            return Err(ConfigError::OutOfBounds("Variable names cannot be empty"));
        }

        Ok(())
    }
}

/// Method of pairing observations with model data.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemapKind {
    Nearest,
    Bilinear,
    Conservative,
    NearestS2d,
    NearestD2s,
}

/// _(Optional)_ Fields with remapping settings.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Remap {
    /// _(Optional)_ Remapping method. Defaults to `nearest`.
    #[serde(default = "Remap::default_method")]
    pub method: RemapKind,

    /// _(Optional)_ Radius of influence (in meters) of nearest
    /// neighbour search.
    ///
    /// Defaults to `12000`. Must be positive.
    #[serde(default = "Remap::default_radius")]
    pub radius_of_influence: Float,

    /// _(Optional)_ Suffix appended to names of paired columns.
    #[serde(default)]
    pub suffix: Option<String>,

    /// _(Optional)_ Whether the model grid is periodic in longitude.
    /// Used only by regridding methods.
    #[serde(default)]
    pub periodic: bool,

    /// _(Optional)_ Reuse regridding weights from `weights_file`
    /// when it exists.
    #[serde(default)]
    pub reuse_weights: bool,

    /// _(Optional)_ Cache file of regridding weights.
    #[serde(default)]
    pub weights_file: Option<PathBuf>,
}

impl Remap {
    fn default_method() -> RemapKind {
        RemapKind::Nearest
    }

    fn default_radius() -> Float {
        DEFAULT_COMBINE_RADIUS
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(self.radius_of_influence > 0.0) {
            return Err(ConfigError::OutOfBounds(
                "Radius of influence must be positive",
            ));
        }

        Ok(())
    }

    /// Options of combining grids with observation tables.
    pub fn combine_options(&self) -> CombineOptions {
        let regrid = |method: RegridMethod| {
            let mut opts = RegridOptions::default().with_method(method);
            opts.periodic = self.periodic;
            opts.reuse_weights = self.reuse_weights;
            if let Some(file) = &self.weights_file {
                opts.filename = file.clone();
            }
            CombineMethod::Regrid(opts)
        };

        let method = match self.method {
            RemapKind::Nearest => CombineMethod::Nearest,
            RemapKind::Bilinear => regrid(RegridMethod::Bilinear),
            RemapKind::Conservative => regrid(RegridMethod::Conservative),
            RemapKind::NearestS2d => regrid(RegridMethod::NearestS2D),
            RemapKind::NearestD2s => regrid(RegridMethod::NearestD2S),
        };

        CombineOptions {
            method,
            radius_of_influence: self.radius_of_influence,
            suffix: self.suffix.clone(),
        }
    }
}

impl Default for Remap {
    fn default() -> Self {
        Remap {
            method: Remap::default_method(),
            radius_of_influence: Remap::default_radius(),
            suffix: None,
            periodic: false,
            reuse_weights: false,
            weights_file: None,
        }
    }
}

/// Export of paired observations for the MET `ascii2nc` tool.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Ascii2nc {
    /// Output file name, relative to the output directory.
    #[serde(default = "Ascii2nc::default_file")]
    pub file: PathBuf,

    #[serde(default)]
    pub options: Ascii2ncOptions,
}

impl Ascii2nc {
    fn default_file() -> PathBuf {
        PathBuf::from("ascii2nc.txt")
    }
}

/// _(Optional)_ Figures drawn after pairing.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Plots {
    /// _(Optional)_ Quick maps of paired model variables,
    /// saved as `<variable>_map.png`.
    #[serde(default)]
    pub maps: Option<QuickMapOptions>,

    /// _(Optional)_ Time series of paired observations,
    /// saved under the `timeseries` name in the output directory.
    #[serde(default)]
    pub timeseries: Option<TimeseriesOptions>,
}

/// _(Optional)_ Fields with information about output.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// _(Optional)_ Output directory, must be empty or not exist.
    ///
    /// Defaults to `./output/`.
    #[serde(default = "Output::default_directory")]
    pub directory: PathBuf,

    /// _(Optional)_ Name of the CSV file with paired data.
    ///
    /// Defaults to `paired.csv`.
    #[serde(default = "Output::default_csv")]
    pub csv: PathBuf,

    #[serde(default)]
    pub ascii2nc: Option<Ascii2nc>,

    #[serde(default)]
    pub plots: Option<Plots>,
}

impl Output {
    fn default_directory() -> PathBuf {
        PathBuf::from("./output/")
    }

    fn default_csv() -> PathBuf {
        PathBuf::from("paired.csv")
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.csv.as_os_str().is_empty() || self.csv.is_absolute() {
            return Err(ConfigError::OutOfBounds(
                "Output CSV must be a file name relative to the output directory",
            ));
        }

        if let Some(ascii2nc) = &self.ascii2nc {
            if ascii2nc.file.as_os_str().is_empty() || ascii2nc.file.is_absolute() {
                return Err(ConfigError::OutOfBounds(
                    "ascii2nc output must be a file name relative to the output directory",
                ));
            }
        }

        if let Some(maps) = self.plots.as_ref().and_then(|p| p.maps.as_ref()) {
            if !(maps.graticule > 0.0) {
                return Err(ConfigError::OutOfBounds(
                    "Graticule step must be positive",
                ));
            }
        }

        Ok(())
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            directory: Output::default_directory(),
            csv: Output::default_csv(),
            ascii2nc: None,
            plots: None,
        }
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the tool.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used by the tool.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit in MB.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    /// When the limit is reached the allocator aborts with
    /// an out-of-memory message instead of the process being
    /// killed by the system.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub input: Input,

    #[serde(default)]
    pub remap: Remap,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.input.check_bounds()?;
        config.remap.check_bounds()?;
        config.output.check_bounds()?;
        config.resources.check_bounds()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, RemapKind};
    use monet::remap::{CombineMethod, RegridMethod};
    use std::path::PathBuf;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::new_from_slice(
            b"input:\n  observations: aqs.csv\n  model: cmaq.nc\n",
        )
        .unwrap();

        assert_eq!(config.input.time_column, "time");
        assert_eq!(config.remap.method, RemapKind::Nearest);
        assert_eq!(config.remap.radius_of_influence, 12e3);
        assert_eq!(config.output.directory, PathBuf::from("./output/"));
        assert_eq!(config.resources.threads, 1);
        assert!(config.output.plots.is_none());
    }

    #[test]
    fn regrid_methods_carry_options() {
        let config = Config::new_from_slice(
            b"input:
  observations: aqs.csv
  model: cmaq.nc
remap:
  method: conservative
  periodic: true
  weights_file: w.csv
output:
  ascii2nc:
    options:
      column: pm25
  plots:
    timeseries:
      domain_average: false
",
        )
        .unwrap();

        match config.remap.combine_options().method {
            CombineMethod::Regrid(opts) => {
                assert_eq!(opts.method, RegridMethod::Conservative);
                assert!(opts.periodic);
                assert_eq!(opts.filename, PathBuf::from("w.csv"));
            }
            CombineMethod::Nearest => panic!("expected regridding"),
        }

        let ascii2nc = config.output.ascii2nc.unwrap();
        assert_eq!(ascii2nc.file, PathBuf::from("ascii2nc.txt"));
        assert_eq!(ascii2nc.options.column, "pm25");
        assert!(!config.output.plots.unwrap().timeseries.unwrap().domain_average);
    }

    #[test]
    fn bounds_are_checked() {
        let both = b"input:\n  observations: a.csv\n  model: m.nc\n  target: t.csv\n";
        assert!(Config::new_from_slice(both).is_err());

        let neither = b"input:\n  observations: a.csv\n";
        assert!(Config::new_from_slice(neither).is_err());

        let radius = b"input:\n  observations: a.csv\n  target: t.csv\nremap:\n  radius_of_influence: -1.0\n";
        assert!(Config::new_from_slice(radius).is_err());

        let threads = b"input:\n  observations: a.csv\n  target: t.csv\nresources:\n  threads: 0\n";
        assert!(Config::new_from_slice(threads).is_err());
    }
}
