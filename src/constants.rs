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

//! Module containing constants used by the accessors.

use crate::Float;

///WGS84 ellipsoid semi-major axis
pub const WGS84_A: Float = 6_378_137.0;

///WGS84 ellipsoid eccentricity
#[allow(clippy::excessive_precision)]
pub const WGS84_E: Float =
    0.081_819_190_842_965_558_441_157_725_155_790_103_599_429_130_554_199_218_75;

///Radius of the spherical Earth used for nearest-neighbour searches,
///identical to the one used by the KD-tree resamplers of the Python ecosystem.
pub const EARTH_RADIUS: Float = 6_370_997.0;

///Canonical name of the latitude coordinate.
pub const LATITUDE: &str = "latitude";

///Canonical name of the longitude coordinate.
pub const LONGITUDE: &str = "longitude";

///Pairs of latitude/longitude names renamed to canonical ones,
///checked in this order.
pub const LATLON_ALIASES: [(&str, &str); 5] = [
    ("lat", "lon"),
    ("Latitude", "Longitude"),
    ("Lat", "Lon"),
    ("XLAT_M", "XLONG_M"),
    ("XLAT", "XLONG"),
];

///Additional alias pair accepted in observation tables.
pub const TABLE_LATLON_ALIAS: (&str, &str) = ("LAT", "LON");

///Dataset attribute marking unstructured grids.
pub const UNSTRUCTURED_GRID_ATTR: &str = "mio_has_unstructured_grid";

///Default radius of influence (in meters) for grid-to-grid nearest remapping.
pub const DEFAULT_RADIUS_OF_INFLUENCE: Float = 1e6;

///Default radius of influence (in meters) for point/grid combination.
pub const DEFAULT_COMBINE_RADIUS: Float = 12e3;

///Default radius of influence (in meters) for table-to-table remapping.
pub const DEFAULT_TABLE_RADIUS: Float = 1e5;

///Default name of the regridding weight file.
pub const DEFAULT_WEIGHTS_FILE: &str = "monet_regrid_weights.csv";

///Name of the temporary index column used when remapping tables.
pub const FAKE_INDEX: &str = "monet_fake_index";

///Variables never regridded when remapping whole datasets.
pub const REGRID_SKIP_VARS: [&str; 6] = ["lat", "lon", "time", "TFLAG", LATITUDE, LONGITUDE];
