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

//! Quick-look maps of gridded fields.

use super::canvas::{Extent, MapCanvas, Projection};
use super::colormap::{finite_range, BoundaryNorm, ColorScale, Colormap, Normalize};
use crate::coords::NormalizeOptions;
use crate::data::{DataArray, Dataset};
use crate::errors::PlotError;
use crate::remap::regrid::cell_edges;
use crate::Float;
use log::debug;
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

/// Sub-cells per cell side used when filling levels.
const CONTOUR_SUBDIVISION: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickMapOptions {
    #[serde(default)]
    pub projection: Projection,
    #[serde(default)]
    pub cmap: Colormap,
    #[serde(default)]
    pub vmin: Option<Float>,
    #[serde(default)]
    pub vmax: Option<Float>,
    /// Number of filled levels in contour maps.
    #[serde(default = "QuickMapOptions::default_levels")]
    pub levels: usize,
    /// Figure size in pixels, derived from the grid shape when missing.
    #[serde(default)]
    pub size: Option<(u32, u32)>,
    #[serde(default)]
    pub roll_dateline: bool,
    #[serde(default = "QuickMapOptions::default_graticule")]
    pub graticule: Float,
}

impl QuickMapOptions {
    fn default_levels() -> usize {
        10
    }
    fn default_graticule() -> Float {
        10.0
    }

    fn scale(&self, values: &Array2<Float>) -> Result<Normalize, PlotError> {
        let (lo, hi) = finite_range(values.iter()).ok_or(PlotError::NothingToPlot("all values are missing"))?;
        Normalize::new(self.vmin.unwrap_or(lo), self.vmax.unwrap_or(hi))
    }
}

impl Default for QuickMapOptions {
    fn default() -> Self {
        QuickMapOptions {
            projection: Projection::default(),
            cmap: Colormap::default(),
            vmin: None,
            vmax: None,
            levels: Self::default_levels(),
            size: None,
            roll_dateline: false,
            graticule: Self::default_graticule(),
        }
    }
}

/// Figure size in pixels following the aspect ratio of the grid,
/// 1000 pixels wide.
pub fn dynamic_fig_size(ds: &Dataset) -> (u32, u32) {
    const WIDTH: Float = 1000.0;

    let scale = match (ds.dim_len("x"), ds.dim_len("y")) {
        (Some(nx), Some(ny)) if nx > 0 => (ny as Float / nx as Float).clamp(0.3, 1.5),
        _ => 0.6,
    };

    (WIDTH as u32, (WIDTH * scale).round() as u32)
}

/// Rolls the grid by half of its columns so that global
/// grids on `[0, 360)` are drawn without a seam at 0 degrees.
pub fn roll_dateline(ds: &Dataset) -> Dataset {
    match ds.dim_len("x") {
        Some(nx) => ds.roll("x", nx / 2),
        None => ds.clone(),
    }
}

/// Field on `(y, x)` with its coordinates.
pub(crate) struct Field {
    pub values: Array2<Float>,
    pub lats: Array2<Float>,
    pub lons: Array2<Float>,
}

/// Extracts variable `name` of a normalised dataset as a 2-D field,
/// dimensions other than `y` and `x` must have length one.
pub(crate) fn field_2d(ds: &Dataset, name: &str) -> Result<Field, PlotError> {
    let mut var = ds.try_get(name)?.clone();

    for dim in var.dims().to_vec() {
        if dim == "y" || dim == "x" {
            continue;
        }
        match var.dim_len(&dim) {
            Some(1) => var = var.index_dim(&dim, 0)?,
            _ => return Err(PlotError::NotTwoDimensional(var.ndim())),
        }
    }
    if var.ndim() != 2 {
        return Err(PlotError::NotTwoDimensional(var.ndim()));
    }

    let values = var.transpose(&["y", "x"])?.as_2d()?.to_owned();
    let (lats, lons) = ds.latlon_2d()?;
    if lats.dim() != values.dim() {
        return Err(PlotError::IncorrectParams("coordinates do not match the field"));
    }

    Ok(Field { values, lats, lons })
}

fn prepare(da: &DataArray, roll: bool) -> Result<Dataset, PlotError> {
    let ds = da.to_dataset()?.structure_for_monet(&NormalizeOptions::default())?;
    Ok(if roll { roll_dateline(&ds) } else { ds })
}

fn finish(canvas: &mut MapCanvas, scale: &ColorScale, opts: &QuickMapOptions) -> Result<(), PlotError> {
    canvas.draw_graticule(opts.graticule)?;
    canvas.draw_frame();
    canvas.draw_colorbar(scale);
    Ok(())
}

/// Corners of grid cells, halfway between neighbouring centres
/// and extrapolated at the edges. Result has shape `(ny + 1, nx + 1)`.
pub(crate) fn cell_corners(centres: &Array2<Float>) -> Result<Array2<Float>, PlotError> {
    let (ny, nx) = centres.dim();
    if ny < 2 || nx < 2 {
        return Err(PlotError::IncorrectParams("grid needs at least two points along each axis"));
    }

    // centres padded by linear extrapolation, rows first
    let mut padded = Array2::<Float>::zeros((ny + 2, nx + 2));
    padded.slice_mut(s![1..=ny, 1..=nx]).assign(centres);
    for i in 1..=nx {
        padded[[0, i]] = 2.0 * padded[[1, i]] - padded[[2, i]];
        padded[[ny + 1, i]] = 2.0 * padded[[ny, i]] - padded[[ny - 1, i]];
    }
    for j in 0..ny + 2 {
        padded[[j, 0]] = 2.0 * padded[[j, 1]] - padded[[j, 2]];
        padded[[j, nx + 1]] = 2.0 * padded[[j, nx]] - padded[[j, nx - 1]];
    }

    Ok(Array2::from_shape_fn((ny + 1, nx + 1), |(j, i)| {
        0.25 * (padded[[j, i]] + padded[[j + 1, i]] + padded[[j, i + 1]] + padded[[j + 1, i + 1]])
    }))
}

/// Pseudocolour map, each grid cell filled as a quadrilateral.
pub fn quick_map(da: &DataArray, opts: &QuickMapOptions) -> Result<MapCanvas, PlotError> {
    let ds = prepare(da, opts.roll_dateline)?;
    let field = field_2d(&ds, da.name())?;
    let scale = ColorScale::linear(opts.cmap, opts.scale(&field.values)?);

    let lat_corners = cell_corners(&field.lats)?;
    let lon_corners = cell_corners(&field.lons)?;

    let extent = Extent::from_points(lat_corners.iter(), lon_corners.iter())?;
    let size = opts.size.unwrap_or_else(|| dynamic_fig_size(&ds));
    let mut canvas = MapCanvas::new(size, opts.projection, extent)?;

    let (ny, nx) = field.values.dim();
    for j in 0..ny {
        for i in 0..nx {
            let color = match scale.color(field.values[[j, i]]) {
                Some(color) => color,
                None => continue,
            };

            let quad = [(j, i), (j, i + 1), (j + 1, i + 1), (j + 1, i)]
                .map(|(cj, ci)| (lon_corners[[cj, ci]], lat_corners[[cj, ci]]));

            // cells torn apart by the dateline
            if spans_dateline(&quad) {
                continue;
            }
            canvas.fill_polygon(&quad, color);
        }
    }

    finish(&mut canvas, &scale, opts)?;
    debug!("Drew quick map of {} on {}x{} cells", da.name(), ny, nx);

    Ok(canvas)
}

fn spans_dateline(vertices: &[(Float, Float)]) -> bool {
    let (lo, hi) = vertices
        .iter()
        .fold((Float::INFINITY, Float::NEG_INFINITY), |(lo, hi), (lon, _)| (lo.min(*lon), hi.max(*lon)));
    hi - lo > 180.0
}

/// Axis edges, a single point gets a cell one degree wide.
fn axis_edges(axis: &Array1<Float>) -> Vec<Float> {
    match axis.len() {
        1 => vec![axis[0] - 0.5, axis[0] + 0.5],
        _ => cell_edges(&axis.to_vec()),
    }
}

/// Image map of a regular grid, cells are axis-aligned
/// between 1-D latitude and longitude edges.
pub fn quick_imshow(da: &DataArray, opts: &QuickMapOptions) -> Result<MapCanvas, PlotError> {
    let ds = prepare(da, opts.roll_dateline)?;
    let field = field_2d(&ds, da.name())?;
    let scale = ColorScale::linear(opts.cmap, opts.scale(&field.values)?);

    let regular = ds.to_rectilinear_latlon()?;
    let lat = regular.try_get("lat")?.as_1d()?.to_owned();
    let lon = regular.try_get("lon")?.as_1d()?.to_owned();
    let (lat_edges, lon_edges) = (axis_edges(&lat), axis_edges(&lon));

    let bounds = |edges: &[Float]| {
        edges
            .iter()
            .fold((Float::INFINITY, Float::NEG_INFINITY), |(lo, hi), e| (lo.min(*e), hi.max(*e)))
    };
    let (lat_min, lat_max) = bounds(&lat_edges);
    let (lon_min, lon_max) = bounds(&lon_edges);
    let extent = Extent {
        lon_min,
        lon_max,
        lat_min,
        lat_max,
    };

    let size = opts.size.unwrap_or_else(|| dynamic_fig_size(&ds));
    let mut canvas = MapCanvas::new(size, opts.projection, extent)?;

    for (j, lat_pair) in lat_edges.windows(2).enumerate() {
        for (i, lon_pair) in lon_edges.windows(2).enumerate() {
            if let Some(color) = scale.color(field.values[[j, i]]) {
                let quad = [
                    (lon_pair[0], lat_pair[0]),
                    (lon_pair[1], lat_pair[0]),
                    (lon_pair[1], lat_pair[1]),
                    (lon_pair[0], lat_pair[1]),
                ];
                if !spans_dateline(&quad) {
                    canvas.fill_polygon(&quad, color);
                }
            }
        }
    }

    finish(&mut canvas, &scale, opts)?;
    debug!("Drew image map of {} on {}x{} cells", da.name(), lat.len(), lon.len());

    Ok(canvas)
}

/// Filled-level map, grid centres are nodes of the contoured surface.
/// Longitudes that are not monotonic along rows are unwrapped to `[0, 360)`.
pub fn quick_contourf(da: &DataArray, opts: &QuickMapOptions) -> Result<MapCanvas, PlotError> {
    let ds = prepare(da, opts.roll_dateline)?;
    let mut field = field_2d(&ds, da.name())?;

    let monotonic = field.lons.rows().into_iter().all(|row| {
        let diffs: Vec<Float> = row.windows(2).into_iter().map(|w| w[1] - w[0]).collect();
        diffs.iter().all(|d| *d >= 0.0) || diffs.iter().all(|d| *d <= 0.0)
    });
    if !monotonic {
        field.lons.mapv_inplace(|lon| lon.rem_euclid(360.0));
    }

    let (ny, nx) = field.values.dim();
    if ny < 2 || nx < 2 {
        return Err(PlotError::IncorrectParams("grid needs at least two points along each axis"));
    }

    let norm = opts.scale(&field.values)?;
    let levels = opts.levels.max(1);
    let boundaries: Vec<Float> = if norm.vmax > norm.vmin {
        Array1::linspace(norm.vmin, norm.vmax, levels + 1).to_vec()
    } else {
        vec![norm.vmin - 0.5, norm.vmin + 0.5]
    };
    let scale = ColorScale::boundary(opts.cmap, BoundaryNorm::new(boundaries)?);

    let extent = Extent::from_points(field.lats.iter(), field.lons.iter())?;
    let size = opts.size.unwrap_or_else(|| dynamic_fig_size(&ds));
    let mut canvas = MapCanvas::new(size, opts.projection, extent)?;

    let n = CONTOUR_SUBDIVISION;
    for j in 0..ny - 1 {
        for i in 0..nx - 1 {
            let at = |a: &Array2<Float>, u: Float, v: Float| -> Float {
                let top = a[[j, i]] * (1.0 - u) + a[[j, i + 1]] * u;
                let bottom = a[[j + 1, i]] * (1.0 - u) + a[[j + 1, i + 1]] * u;
                top * (1.0 - v) + bottom * v
            };

            for sv in 0..n {
                for su in 0..n {
                    let (u0, u1) = (su as Float / n as Float, (su + 1) as Float / n as Float);
                    let (v0, v1) = (sv as Float / n as Float, (sv + 1) as Float / n as Float);

                    let value = at(&field.values, 0.5 * (u0 + u1), 0.5 * (v0 + v1));
                    let color = match scale.color(value) {
                        Some(color) => color,
                        None => continue,
                    };

                    let quad = [(u0, v0), (u1, v0), (u1, v1), (u0, v1)]
                        .map(|(u, v)| (at(&field.lons, u, v), at(&field.lats, u, v)));
                    canvas.fill_polygon(&quad, color);
                }
            }
        }
    }

    finish(&mut canvas, &scale, opts)?;
    debug!("Drew filled contours of {} with {} levels", da.name(), levels);

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::{cell_corners, dynamic_fig_size, quick_contourf, quick_imshow, quick_map, roll_dateline, QuickMapOptions};
    use crate::data::{DataArray, Dataset, Variable};
    use float_cmp::approx_eq;
    use image::Rgb;
    use ndarray::{arr2, Array2, Array3};

    fn field(lons: Vec<f64>) -> DataArray {
        let nx = lons.len();
        DataArray::new(
            "o3",
            Variable::new(
                &["time", "lat", "lon"],
                Array3::from_shape_fn((1, 3, nx), |(_, j, i)| (10 * j + i) as f64).into_dyn(),
            )
            .unwrap(),
        )
        .with_coord("lat", Variable::from_vec("lat", vec![30.0, 35.0, 40.0]))
        .unwrap()
        .with_coord("lon", Variable::from_vec("lon", lons))
        .unwrap()
    }

    fn opts() -> QuickMapOptions {
        QuickMapOptions {
            size: Some((600, 400)),
            ..QuickMapOptions::default()
        }
    }

    #[test]
    fn corners_surround_centres() {
        let corners = cell_corners(&arr2(&[[0.0, 1.0, 2.0], [0.0, 1.0, 2.0]])).unwrap();
        assert_eq!(corners.dim(), (3, 4));
        assert!(approx_eq!(f64, corners[[0, 0]], -0.5));
        assert!(approx_eq!(f64, corners[[1, 2]], 1.5));
        assert!(approx_eq!(f64, corners[[2, 3]], 2.5));
        assert!(cell_corners(&Array2::zeros((1, 3))).is_err());
    }

    #[test]
    fn figure_follows_grid_aspect() {
        let ds = Dataset::new()
            .with_data_var("v", Variable::from_array2(["y", "x"], Array2::zeros((50, 100))))
            .unwrap();
        assert_eq!(dynamic_fig_size(&ds), (1000, 500));
        assert_eq!(dynamic_fig_size(&Dataset::new()), (1000, 600));
    }

    #[test]
    fn dateline_roll_moves_half_the_columns() {
        let ds = Dataset::new()
            .with_data_var("v", Variable::from_vec("x", vec![0.0, 1.0, 2.0, 3.0]))
            .unwrap();
        let rolled = roll_dateline(&ds);
        assert_eq!(rolled.data_var("v").unwrap().values().iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0, 0.0, 1.0]);
    }

    #[test]
    fn quick_maps_draw_data() {
        let da = field(vec![-100.0, -95.0, -90.0, -85.0]);

        for canvas in [
            quick_map(&da, &opts()).unwrap(),
            quick_imshow(&da, &opts()).unwrap(),
            quick_contourf(&da, &opts()).unwrap(),
        ] {
            let (x, y) = canvas.to_pixel(-92.5, 35.0);
            assert_ne!(*canvas.image().get_pixel(x as u32, y as u32), Rgb([255, 255, 255]));
            assert_eq!(canvas.image().dimensions(), (600, 400));
        }
    }

    #[test]
    fn unwrapped_contours_and_errors() {
        // crossing the dateline on a [-180, 180) grid
        let da = field(vec![170.0, 175.0, -180.0, -175.0]);
        let canvas = quick_contourf(&da, &opts()).unwrap();
        assert!(canvas.extent().lon_max > 180.0);

        let missing = DataArray::new("o3", da.variable().mapv(|_| f64::NAN))
            .with_coord("lat", Variable::from_vec("lat", vec![30.0, 35.0, 40.0]))
            .unwrap()
            .with_coord("lon", Variable::from_vec("lon", vec![0.0, 1.0, 2.0, 3.0]))
            .unwrap();
        assert!(quick_map(&missing, &opts()).is_err());
    }
}
