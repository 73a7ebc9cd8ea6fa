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

//! Raster figures of grids and observations.
//!
//! Figures are drawn into `image` buffers with `imageproc` primitives:
//! filled cells, markers, a graticule, the frame and a colorbar. No text
//! is rendered. Maps use PlateCarree or a Lambert conformal projection
//! fitted to the data extent.

mod canvas;
mod colormap;
mod quick;
mod spatial;
mod timeseries;

pub use canvas::{Extent, MapCanvas, Projection};
pub use colormap::{normval, BoundaryNorm, ColorNorm, ColorScale, Colormap, Normalize};
pub use quick::{dynamic_fig_size, quick_contourf, quick_imshow, quick_map, roll_dateline, QuickMapOptions};
pub use spatial::{aqs_spatial_scatter, improve_spatial_scatter, make_spatial_plot, AQS_VALUE_COLUMN};
pub use timeseries::{plot_allsites_timeseries, plot_timeseries, SeriesChart, TimeseriesOptions};
