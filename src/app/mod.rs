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

//! Module containing the pairing pipeline of the command-line tool.
//!
//! Observations are read from CSV and paired either with a model grid
//! (each variable is combined with the observations on the threadpool)
//! or with a table of target points. Paired data is written to the output
//! directory together with the optional `ascii2nc` export and figures.

mod configuration;

use crate::ALLOCATOR;
use configuration::{Config, Plots};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use monet::data::{Dataset, Table, TIME};
use monet::errors::{DataError, MonetError, RemapError};
use monet::plots::{plot_allsites_timeseries, quick_map};
use monet::remap::prepare_combine_weights;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    sync::{mpsc, Arc},
};

/// Main pipeline function, responsible for all pairing steps.
///
/// It reads the provided configuration and observations, pairs them
/// with the model grid or target points, and writes the output.
pub fn main() -> Result<(), MonetError> {
    info!("Preparing the pairing core");

    let core = Core::new()?;
    prepare_output_dir(&core.config.output.directory)?;

    let observations = read_observations(&core.config)?;
    info!("Read {} observations", observations.len());

    let grid = match &core.config.input.model {
        Some(path) => Some(read_model(path, &core.config)?),
        None => None,
    };

    let paired = match (&grid, &core.config.input.target) {
        (Some(grid), _) => pair_with_grid(&core, grid, &observations)?,
        (None, Some(target)) => {
            info!("Pairing observations with target points");
            let mut target = Table::read_csv(target)?;
            if target.contains(&core.config.input.time_column) {
                target.parse_time_column(&core.config.input.time_column)?;
            }
            target.remap_nearest(
                &observations,
                core.config.remap.radius_of_influence,
                true,
            )?
        }
        (None, None) => {
            return Err(MonetError::FaultyOutput("No model or target input to pair with"))
        }
    };

    info!("Writing output");
    write_output(&core.config, &paired, grid.as_ref())?;

    Ok(())
}

/// Structure containing the configuration and the threadpool
/// the pairing runs on.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
}

impl Core {
    /// Pairing [`Core`] constructor.
    ///
    /// Configuration is loaded and checked, then the memory limit
    /// and the threadpool are set up.
    pub fn new() -> Result<Self, MonetError> {
        debug!("Reading configuration from config.yaml");
        let config = Config::new_from_file(Path::new("config.yaml"))?;

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory.saturating_mul(1024 * 1024))
            .map_err(|_| MonetError::MemoryLimit)?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .stack_size(2 * 1024 * 1024)
            .build()?;

        Ok(Core { config, threadpool })
    }
}

/// Output directory must be empty or not exist,
/// so that no previous results are overwritten.
fn prepare_output_dir(out_path: &Path) -> Result<(), MonetError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        if out_path.read_dir()?.next().is_none() {
            debug!("Output directory exists but is empty so continuing");
        } else {
            return Err(MonetError::FaultyOutput(
                "Output directory exists and is not empty",
            ));
        }
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}

/// Reads observations and moves their timestamps to the `time` column.
fn read_observations(config: &Config) -> Result<Table, MonetError> {
    debug!("Reading observations from {}", config.input.observations.display());
    let mut table = Table::read_csv(&config.input.observations)?;

    let time_column = config.input.time_column.as_str();
    if table.contains(time_column) {
        table.parse_time_column(time_column)?;
        if time_column != TIME {
            table.rename(time_column, TIME);
        }
    } else {
        warn!("Observations have no {} column", time_column);
    }

    Ok(table.rename_for_monet())
}

#[cfg(feature = "netcdf")]
fn read_model(path: &Path, config: &Config) -> Result<Dataset, MonetError> {
    use monet::coords::NormalizeOptions;

    debug!("Reading model data from {}", path.display());
    let ds = monet::io::open_dataset(path)?;

    let opts = match &config.input.latlon_names {
        Some((lat, lon)) => NormalizeOptions::with_names(lat, lon),
        None => NormalizeOptions::default(),
    };

    Ok(ds.structure_for_monet(&opts)?)
}

#[cfg(not(feature = "netcdf"))]
fn read_model(_path: &Path, _config: &Config) -> Result<Dataset, MonetError> {
    Err(MonetError::MissingFeature("netcdf"))
}

/// Grid restricted to a single data variable.
fn single_variable(grid: &Dataset, name: &str) -> Dataset {
    let mut ds = grid.clone();
    for other in grid.data_var_names() {
        if other != name {
            ds.remove(&other);
        }
    }
    ds
}

/// Deploys combining of every model variable onto the threadpool
/// and merges the paired columns.
///
/// Variables that fail to combine are reported and left out.
fn pair_with_grid(core: &Core, grid: &Dataset, observations: &Table) -> Result<Table, MonetError> {
    let variables: Vec<String> = if core.config.input.variables.is_empty() {
        grid.data_var_names()
    } else {
        core.config.input.variables.clone()
    };
    let variables_count = variables.len();

    info!("Pairing {} model variables with observations", variables_count);

    // set progress bar for paired variables
    let variables_bar = ProgressBar::new(variables_count as u64);
    variables_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    variables_bar.set_prefix("Paired variables");

    // regridding weights are computed once and only read by the tasks
    let opts = prepare_combine_weights(grid, observations, &core.config.remap.combine_options())?;

    let observations = Arc::new(observations.clone());
    let opts = Arc::new(opts);

    let (tx, rx) = mpsc::channel();

    for (index, name) in variables.iter().enumerate() {
        let tx = tx.clone();
        let observations = Arc::clone(&observations);
        let opts = Arc::clone(&opts);
        let subset = single_variable(grid, name);
        let name = name.clone();

        core.threadpool.spawn(move || {
            let result = if subset.data_var(&name).is_some() {
                monet::remap::combine_point(&subset, &observations, &opts)
            } else {
                Err(RemapError::Data(DataError::MissingVariable(name.clone())))
            };

            if tx.send((index, name, result)).is_err() {
                error!("Pairing result could not be delivered");
            }
        });
    }
    drop(tx);

    // receive paired tables in order of variables
    let mut paired_vars = BTreeMap::new();
    for (index, name, result) in rx.iter().take(variables_count) {
        match result {
            Ok(table) => {
                paired_vars.insert(index, table);
            }
            Err(err) => {
                error!("Pairing of variable {} failed, check the details and rerun: {}", name, err);
                // keep error messages apart from the progress bar
                println!();
            }
        }
        variables_bar.inc(1);
    }

    variables_bar.finish_with_message("All variables paired");

    let mut paired = observations.as_ref().clone();
    for table in paired_vars.into_values() {
        for column in table.column_names() {
            if !paired.contains(&column) {
                paired.set_column(&column, table.try_column(&column)?.clone())?;
            }
        }
    }

    Ok(paired)
}

/// Writes paired data, its `ascii2nc` export and figures.
fn write_output(config: &Config, paired: &Table, grid: Option<&Dataset>) -> Result<(), MonetError> {
    let out_dir = &config.output.directory;

    let csv_path = out_dir.join(&config.output.csv);
    paired.write_csv(&csv_path)?;
    info!("Paired data written to {}", csv_path.display());

    if let Some(ascii2nc) = &config.output.ascii2nc {
        let path = out_dir.join(&ascii2nc.file);
        paired.write_ascii2nc(&path, &ascii2nc.options)?;
        info!("ascii2nc observations written to {}", path.display());
    }

    if let Some(plots) = &config.output.plots {
        draw_plots(plots, out_dir, paired, grid)?;
    }

    Ok(())
}

/// Draws the configured figures. A variable that cannot be drawn
/// is reported and skipped.
fn draw_plots(plots: &Plots, out_dir: &Path, paired: &Table, grid: Option<&Dataset>) -> Result<(), MonetError> {
    if let (Some(maps), Some(grid)) = (&plots.maps, grid) {
        for name in grid.data_var_names() {
            let mut field = grid.data_array(&name)?;
            if field.dims().iter().any(|d| d == TIME) {
                field = single_time(&field.to_dataset()?, &name)?;
            }

            match quick_map(&field, maps) {
                Ok(canvas) => {
                    let path = out_dir.join(format!("{}_map.png", name));
                    canvas.save(&path)?;
                    info!("Map of {} saved to {}", name, path.display());
                }
                Err(err) => warn!("Cannot draw map of {}: {}", name, err),
            }
        }
    } else if plots.maps.is_some() {
        warn!("Maps require model input, skipping");
    }

    if let Some(timeseries) = &plots.timeseries {
        let mut opts = timeseries.clone();
        let savename = opts.savename.take().unwrap_or_else(|| "timeseries_".to_string());
        opts.savename = Some(out_dir.join(savename).to_string_lossy().to_string());

        let charts = plot_allsites_timeseries(paired, &opts)?;
        info!("Saved {} time series charts", charts.len());
    }

    Ok(())
}

/// First time step of the variable.
fn single_time(ds: &Dataset, name: &str) -> Result<monet::data::DataArray, MonetError> {
    debug!("Drawing first time step of {}", name);
    Ok(ds.index_dim(TIME, 0)?.data_array(name)?)
}

#[cfg(test)]
mod tests {
    use super::{prepare_output_dir, single_variable};
    use monet::data::{Dataset, Variable};

    #[test]
    fn output_dir_must_be_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");

        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());
        prepare_output_dir(&out).unwrap();

        std::fs::write(out.join("paired.csv"), "a\n").unwrap();
        assert!(prepare_output_dir(&out).is_err());
    }

    #[test]
    fn subset_keeps_coordinates() {
        let grid = Dataset::new()
            .with_coord("x", Variable::from_vec("x", vec![0.0, 1.0]))
            .unwrap()
            .with_data_var("o3", Variable::from_vec("x", vec![1.0, 2.0]))
            .unwrap()
            .with_data_var("pm25", Variable::from_vec("x", vec![3.0, 4.0]))
            .unwrap();

        let subset = single_variable(&grid, "pm25");
        assert_eq!(subset.data_var_names(), vec!["pm25".to_string()]);
        assert!(subset.coord("x").is_some());
    }
}
