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

//! Module handling geographical coordinates of grids.
//!
//! Files produced by different models name and structure their
//! latitude and longitude in different ways. Functions of this module
//! normalise them (see [`normalize`]), wrap longitudes, search
//! monotonic axes and project coordinates for figures.

pub mod bisection;
mod longitude;
pub mod normalize;
pub mod projection;

pub use longitude::{check_and_wrap, wrap_array, wrap_longitude};
pub use normalize::{coards_to_2d, detect_convention, GridConvention, NormalizeOptions};
pub use projection::{LambertConformal, MapProjection};
