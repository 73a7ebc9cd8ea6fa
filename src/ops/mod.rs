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

//! Accessor operations on normalised datasets, data arrays and tables.
//!
//! Each operation normalises its input first (see [`crate::coords::normalize`]),
//! so it can be called on datasets in any supported grid convention.

mod interp;
mod landmask;
mod select;
mod stratify;
mod table;
mod window;

pub use landmask::LandMask;
pub use stratify::interpolate_column;
