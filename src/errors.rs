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

//! Error types returned by the crate.
//!
//! Each concern has its own enum, so that the accessors can report
//! precisely what went wrong, and [`MonetError`] gathers them for the
//! command-line tool.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonetError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Error in input data: {0}")]
    Data(#[from] DataError),

    #[error("Error while normalising coordinates: {0}")]
    Coords(#[from] CoordError),

    #[error("Error while remapping: {0}")]
    Remap(#[from] RemapError),

    #[error("Error while plotting: {0}")]
    Plot(#[from] PlotError),

    #[error("Error while handling output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Output is faulty: {0}")]
    FaultyOutput(&'static str),

    #[error("Cannot set memory limit")]
    MemoryLimit,

    #[error("Feature not available in this build: {0}")]
    MissingFeature(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Variable {0} not found")]
    MissingVariable(String),

    #[error("Column {0} not found")]
    MissingColumn(String),

    #[error("Column {0} has unexpected type, expected {1}")]
    ColumnType(String, &'static str),

    #[error("Dimension {0} not found")]
    MissingDimension(String),

    #[error("Dimension {dim} has length {found} but {expected} was expected")]
    DimensionMismatch {
        dim: String,
        expected: usize,
        found: usize,
    },

    #[error("Index {index} is out of range for dimension {dim} of length {len}")]
    IndexOutOfRange { dim: String, index: usize, len: usize },

    #[error("Variable has {found} dimensions but {expected} dimension names were given")]
    RankMismatch { expected: usize, found: usize },

    #[error("Column {name} has {found} rows but table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Cannot reshape array: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Cannot decode time: {0}")]
    Time(String),

    #[error("Error while reading or writing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "netcdf")]
    #[error("Error while reading NetCDF: {0}")]
    NetCdf(#[from] netcdf::Error),
}

#[derive(Error, Debug)]
pub enum CoordError {
    #[error("Cannot find latitude/longitude coordinates")]
    MissingLatLon,

    #[error("Latitude and longitude have different shapes")]
    ShapeMismatch,

    #[error("Latitude {0} is out of [-90, 90] range")]
    InvalidLatitude(f64),

    #[error("Grid is not rectilinear: {0}")]
    NotRectilinear(&'static str),

    #[error("Searched value is out of the axis bounds")]
    OutOfBounds,

    #[error("Searched axis is empty")]
    EmptyAxis,

    #[error("Projection parameters are incorrect: {0}")]
    IncorrectProjection(&'static str),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Error, Debug)]
pub enum RemapError {
    #[error("Source grid has no points")]
    EmptySource,

    #[error("No grid point found within {0} m of the requested location")]
    OutsideRadius(f64),

    #[error("Regridding method {0} is not available for this grid: {1}")]
    UnsupportedMethod(&'static str, &'static str),

    #[error("Weight file {path} does not match grids: {reason}")]
    WeightsMismatch { path: String, reason: &'static str },

    #[error("Nothing to remap: {0}")]
    NothingToRemap(&'static str),

    #[error("Error while reading or writing weight file: {0}")]
    WeightFile(#[from] csv::Error),

    #[error("Cannot access weight file: {0}")]
    WeightIo(#[from] std::io::Error),

    #[error(transparent)]
    Coords(#[from] CoordError),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Field to plot must be 2-dimensional but has {0} dimensions")]
    NotTwoDimensional(usize),

    #[error("Nothing to plot: {0}")]
    NothingToPlot(&'static str),

    #[error("Unknown colormap {0}")]
    UnknownColormap(String),

    #[error("Incorrect plot parameters: {0}")]
    IncorrectParams(&'static str),

    #[error("Cannot save image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Coords(#[from] CoordError),

    #[error(transparent)]
    Data(#[from] DataError),
}
