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

//! MONET geospatial accessors: labelled grids and point tables with the
//! operations needed to pair atmospheric model output with observations.
//!
//! Grids are normalised into a canonical layout (2-D `latitude` and
//! `longitude` on `(y, x)`, longitudes in `[-180, 180)`), after which they
//! can be remapped onto other grids or point sets, windowed, sliced along
//! transects, interpolated vertically and masked. Point observations live
//! in tables that can be combined with grids and exported for verification
//! tools. Figures are rendered to raster images.

pub mod constants;
pub mod coords;
pub mod data;
pub mod errors;
pub mod export;
#[cfg(feature = "netcdf")]
pub mod io;
pub mod ops;
pub mod plots;
pub mod remap;

pub type Float = f64;
