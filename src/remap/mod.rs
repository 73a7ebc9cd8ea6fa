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

//! Module with the resamplers moving values between grids,
//! point sets and observation tables.
//!
//! All resamplers work on normalised datasets (see [`crate::coords::normalize`])
//! and replace the spatial dimensions of resampled variables with the
//! spatial dimensions of the target, keeping the other dimensions in order.

pub mod combine;
pub mod geometry;
pub mod nearest;
pub mod regrid;
mod table;
mod unstructured;
pub mod weights;

pub use combine::{combine_point, prepare_combine_weights, CombineMethod, CombineOptions};
pub use geometry::{haversine, lonlat_to_cartesian, CoordinateDefinition};
pub use nearest::NearestResampler;
pub use regrid::{RegridMethod, RegridOptions, Regridder};
pub use weights::RegridWeights;
