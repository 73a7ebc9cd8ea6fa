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

//! Module restructuring grids of various meteorological formats
//! into the canonical layout used by all accessors.
//!
//! After normalisation a gridded dataset has `latitude` and `longitude`
//! coordinates with longitudes in `[-180, 180)`. Structured grids get
//! 2-D coordinates on `(y, x)` dimensions, while unstructured grids keep
//! their per-cell coordinates.
//!
//! Detected conventions:
//!
//! - GFS FV3 files, marked by `grid_xt` dimension, with 1-D `grid_yt`/`grid_xt` axes,
//! - WRF and WPS files, marked by `south_north` dimension, with 2-D `XLAT(_M)`/`XLONG(_M)`,
//! - unstructured grids, marked by truthy `mio_has_unstructured_grid` attribute,
//! - COARDS grids with 1-D latitude and longitude axes,
//! - curvilinear grids with 2-D latitude and longitude.

use super::longitude::wrap_longitude;
use crate::constants::{LATITUDE, LATLON_ALIASES, LONGITUDE, UNSTRUCTURED_GRID_ATTR};
use crate::data::{DataArray, Dataset, Variable};
use crate::{errors::CoordError, Float};
use log::debug;
use ndarray::{Array1, Array2};

/// Grid conventions recognised by the normaliser.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GridConvention {
    GfsFv3,
    Wrf,
    Unstructured,
    Rectilinear,
    Curvilinear,
}

/// Overrides of latitude and longitude names for
/// files that use non-standard ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub lat_name: Option<String>,
    pub lon_name: Option<String>,
}

impl NormalizeOptions {
    pub fn with_names(lat_name: &str, lon_name: &str) -> Self {
        NormalizeOptions {
            lat_name: Some(lat_name.to_string()),
            lon_name: Some(lon_name.to_string()),
        }
    }
}

fn is_unstructured(ds: &Dataset) -> bool {
    ds.attr_flag(UNSTRUCTURED_GRID_ATTR)
}

/// Finds the latitude variable under canonical name or any alias.
fn find_latitude<'a>(ds: &'a Dataset) -> Option<&'a Variable> {
    ds.get(LATITUDE).or_else(|| {
        LATLON_ALIASES
            .iter()
            .find_map(|(lat, _)| ds.get(lat))
    })
}

/// Detects the grid convention of a dataset.
pub fn detect_convention(ds: &Dataset) -> Result<GridConvention, CoordError> {
    if ds.has_dim("grid_xt") {
        return Ok(GridConvention::GfsFv3);
    }

    if ds.has_dim("south_north") {
        return Ok(GridConvention::Wrf);
    }

    if is_unstructured(ds) {
        return Ok(GridConvention::Unstructured);
    }

    match find_latitude(ds) {
        Some(lat) if lat.ndim() < 2 => Ok(GridConvention::Rectilinear),
        Some(_) => Ok(GridConvention::Curvilinear),
        None => Err(CoordError::MissingLatLon),
    }
}

/// Renames the first matching alias pair to canonical names.
/// For unstructured grids data variables are searched,
/// otherwise coordinates.
fn rename_to_canonical(ds: &mut Dataset) {
    if ds.contains(LATITUDE) {
        return;
    }

    let unstructured = is_unstructured(ds);

    for (lat, lon) in LATLON_ALIASES.iter() {
        let present = if unstructured {
            ds.data_var(lat).is_some()
        } else {
            ds.coord(lat).is_some()
        };

        if present {
            debug!("Renaming {}/{} to canonical latitude/longitude", lat, lon);
            ds.rename(lat, LATITUDE);
            ds.rename(lon, LONGITUDE);
            return;
        }
    }
}

/// Converts 1-D latitude and longitude axes into 2-D coordinates
/// on `(y, x)` dimensions, with integer `y` and `x` index coordinates.
pub fn coards_to_2d(ds: &mut Dataset, lat_axis: &str, lon_axis: &str) -> Result<(), CoordError> {
    let lat = ds.try_get(lat_axis)?.as_1d()?.to_owned();
    let lon = ds.try_get(lon_axis)?.as_1d()?.mapv(wrap_longitude);

    let lat_dim = ds.try_get(lat_axis)?.dims()[0].clone();
    let lon_dim = ds.try_get(lon_axis)?.dims()[0].clone();

    let (ny, nx) = (lat.len(), lon.len());
    let lats = Array2::from_shape_fn((ny, nx), |(j, _)| lat[j]);
    let lons = Array2::from_shape_fn((ny, nx), |(_, i)| lon[i]);

    debug!(
        "Converting COARDS axes {}/{} to 2-D coordinates of shape {:?}",
        lat_axis,
        lon_axis,
        (ny, nx)
    );

    ds.rename_dim(&lat_dim, "y");
    ds.rename_dim(&lon_dim, "x");

    ds.insert_coord(LATITUDE, Variable::from_array2(["y", "x"], lats))?;
    ds.insert_coord(LONGITUDE, Variable::from_array2(["y", "x"], lons))?;
    ds.insert_coord("x", index_coord("x", nx))?;
    ds.insert_coord("y", index_coord("y", ny))?;

    Ok(())
}

fn index_coord(dim: &str, len: usize) -> Variable {
    Variable::from_vec(dim, (0..len).map(|i| i as Float).collect())
}

/// Squeezes WRF coordinate variables and moves them to coordinates.
fn restructure_wrf(ds: &mut Dataset) -> Result<(), CoordError> {
    ds.rename_dim("south_north", "y");
    ds.rename_dim("west_east", "x");

    for (lat, lon) in [("XLAT_M", "XLONG_M"), ("XLAT", "XLONG")] {
        if let (Some(lat_var), Some(lon_var)) = (ds.get(lat), ds.get(lon)) {
            let lat_var = lat_var.squeeze();
            let lon_var = lon_var.squeeze();

            ds.insert_coord(lat, lat_var)?;
            ds.insert_coord(lon, lon_var)?;

            debug!("Squeezed WRF coordinates {}/{}", lat, lon);
            break;
        }
    }

    Ok(())
}

impl Dataset {
    /// Restructures the dataset into canonical layout, see module docs.
    pub fn structure_for_monet(&self, opts: &NormalizeOptions) -> Result<Dataset, CoordError> {
        let mut ds = self.clone();

        if let Some(lat_name) = &opts.lat_name {
            if ds.contains(lat_name) {
                ds.rename(lat_name, LATITUDE);
            }
        }
        if let Some(lon_name) = &opts.lon_name {
            if ds.contains(lon_name) {
                ds.rename(lon_name, LONGITUDE);
            }
        }

        let convention = detect_convention(&ds)?;
        debug!("Detected grid convention: {:?}", convention);

        match convention {
            GridConvention::GfsFv3 => coards_to_2d(&mut ds, "grid_yt", "grid_xt")?,
            GridConvention::Wrf => restructure_wrf(&mut ds)?,
            _ => (),
        }

        rename_to_canonical(&mut ds);

        if is_unstructured(&ds) {
            if !ds.contains(LATITUDE) || !ds.contains(LONGITUDE) {
                return Err(CoordError::MissingLatLon);
            }
            ds.wrap_longitudes(LONGITUDE)?;
            return Ok(ds);
        }

        let lat_ndim = ds.get(LATITUDE).ok_or(CoordError::MissingLatLon)?.ndim();
        let lon_ndim = ds.get(LONGITUDE).ok_or(CoordError::MissingLatLon)?.ndim();

        if lat_ndim < 2 {
            if lon_ndim >= 2 {
                return Err(CoordError::ShapeMismatch);
            }
            coards_to_2d(&mut ds, LATITUDE, LONGITUDE)?;
        } else {
            ds.set_coords(&[LATITUDE, LONGITUDE])?;
        }

        ds.wrap_longitudes(LONGITUDE)?;

        Ok(ds)
    }

    /// Renames canonical (or capitalised) coordinate names to short `lat`/`lon`.
    pub fn rename_latlon(&self) -> Dataset {
        let mut ds = self.clone();

        for (lat, lon) in [(LATITUDE, LONGITUDE), ("Latitude", "Longitude"), ("Lat", "Lon")] {
            if ds.coord(lat).is_some() {
                ds.rename(lat, "lat");
                ds.rename(lon, "lon");
                break;
            }
        }

        ds
    }

    /// Converts a normalised rectilinear grid back into 1-D
    /// `lat`/`lon` axes, removing 2-D coordinates.
    pub fn to_rectilinear_latlon(&self) -> Result<Dataset, CoordError> {
        let (lat, lon) = self.rectilinear_axes()?;

        let mut ds = self.clone();
        ds.remove(LATITUDE);
        ds.remove(LONGITUDE);
        ds.remove("x");
        ds.remove("y");

        ds.rename_dim("y", "lat");
        ds.rename_dim("x", "lon");
        ds.insert_coord("lat", Variable::from_vec("lat", lat.to_vec()))?;
        ds.insert_coord("lon", Variable::from_vec("lon", lon.to_vec()))?;

        Ok(ds)
    }

    /// 2-D canonical latitude and longitude of a normalised grid.
    pub fn latlon_2d(&self) -> Result<(Array2<Float>, Array2<Float>), CoordError> {
        let lat = self.get(LATITUDE).ok_or(CoordError::MissingLatLon)?;
        let lon = self.get(LONGITUDE).ok_or(CoordError::MissingLatLon)?;

        if lat.shape() != lon.shape() {
            return Err(CoordError::ShapeMismatch);
        }

        Ok((lat.as_2d()?.to_owned(), lon.as_2d()?.to_owned()))
    }

    /// 1-D axes of a normalised grid, failing when
    /// the grid is not rectilinear.
    pub fn rectilinear_axes(&self) -> Result<(Array1<Float>, Array1<Float>), CoordError> {
        let (lats, lons) = self.latlon_2d()?;

        let lat = lats.column(0).to_owned();
        let lon = lons.row(0).to_owned();

        let tolerance = 1e-6;
        let lat_ok = lats
            .columns()
            .into_iter()
            .all(|col| col.iter().zip(lat.iter()).all(|(a, b)| (a - b).abs() < tolerance));
        let lon_ok = lons
            .rows()
            .into_iter()
            .all(|row| row.iter().zip(lon.iter()).all(|(a, b)| (a - b).abs() < tolerance));

        if !lat_ok {
            return Err(CoordError::NotRectilinear("latitude varies along x"));
        }
        if !lon_ok {
            return Err(CoordError::NotRectilinear("longitude varies along y"));
        }

        Ok((lat, lon))
    }
}

impl DataArray {
    /// Restructures coordinates into canonical layout,
    /// see [`Dataset::structure_for_monet`].
    pub fn structure_for_monet(&self, opts: &NormalizeOptions) -> Result<DataArray, CoordError> {
        let ds = self.to_dataset()?.structure_for_monet(opts)?;
        Ok(ds.data_array(self.name())?)
    }

    pub fn rename_latlon(&self) -> Result<DataArray, CoordError> {
        let ds = self.to_dataset()?.rename_latlon();
        Ok(ds.data_array(self.name())?)
    }

    pub fn to_rectilinear_latlon(&self) -> Result<DataArray, CoordError> {
        let ds = self.to_dataset()?.to_rectilinear_latlon()?;
        Ok(ds.data_array(self.name())?)
    }
}
