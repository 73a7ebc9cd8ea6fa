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

//! Spatial plots of model fields and observation sites at a given date.

use super::canvas::{Extent, MapCanvas, Projection};
use super::colormap::{normval, ColorScale, Colormap, Normalize};
use super::quick::{cell_corners, field_2d};
use crate::constants::{LATITUDE, LONGITUDE};
use crate::coords::NormalizeOptions;
use crate::data::{DataArray, Table, TIME};
use crate::errors::PlotError;
use crate::Float;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::path::PathBuf;

const SPATIAL_SIZE: (u32, u32) = (1200, 600);
const SCATTER_SIZE: (u32, u32) = (1000, 600);
const MARKER_RADIUS: i32 = 4;
const GRATICULE_STEP: Float = 10.0;

/// Observed value column of AQS tables.
pub const AQS_VALUE_COLUMN: &str = "Obs_value";

/// Upper end of the discrete scale of concentration maps.
const CONCENTRATION_MAX: Float = 150.0;

fn date_savename(savename: &str, date: NaiveDateTime) -> PathBuf {
    PathBuf::from(format!("{}{}", savename, date.format("%Y%m%d_%H.jpg")))
}

/// Map of a model field at `date` on the discrete 0-150 viridis scale,
/// saved to `<savename><YYYYmmdd_HH>.jpg` when `savename` is given.
///
/// A field with several times is taken at `date`.
pub fn make_spatial_plot(
    field: &DataArray,
    date: NaiveDateTime,
    projection: Projection,
    savename: Option<&str>,
) -> Result<MapCanvas, PlotError> {
    let mut ds = field.to_dataset()?.structure_for_monet(&NormalizeOptions::default())?;

    if let Some(times) = ds.time() {
        if times.len() > 1 {
            let index = times
                .iter()
                .position(|t| *t == date)
                .ok_or(PlotError::NothingToPlot("no field at the requested date"))?;
            ds = ds.index_dim(TIME, index)?;
        }
    }

    let grid = field_2d(&ds, field.name())?;
    let scale = normval(0.0, CONCENTRATION_MAX, Colormap::Viridis)?;

    let lat_corners = cell_corners(&grid.lats)?;
    let lon_corners = cell_corners(&grid.lons)?;
    let extent = Extent::from_points(lat_corners.iter(), lon_corners.iter())?;
    let mut canvas = MapCanvas::new(SPATIAL_SIZE, projection, extent)?;

    let (ny, nx) = grid.values.dim();
    for j in 0..ny {
        for i in 0..nx {
            if let Some(color) = scale.color(grid.values[[j, i]]) {
                let quad = [(j, i), (j, i + 1), (j + 1, i + 1), (j + 1, i)]
                    .map(|(cj, ci)| (lon_corners[[cj, ci]], lat_corners[[cj, ci]]));
                canvas.fill_polygon(&quad, color);
            }
        }
    }

    canvas.draw_graticule(GRATICULE_STEP)?;
    canvas.draw_frame();
    canvas.draw_colorbar(&scale);

    if let Some(savename) = savename {
        let path = date_savename(savename, date);
        canvas.save(&path)?;
        info!("Saved spatial plot of {} to {}", field.name(), path.display());
    }

    Ok(canvas)
}

/// Rows of the table observed at `date`.
fn rows_at(table: &Table, date: NaiveDateTime) -> Result<Table, PlotError> {
    let table = table.rename_for_monet();
    let mask: Vec<bool> = table.times(TIME)?.iter().map(|t| *t == Some(date)).collect();
    let rows = table.filter(&mask)?;

    if rows.is_empty() {
        return Err(PlotError::NothingToPlot("no observations at the requested date"));
    }
    debug!("Found {} observations at {}", rows.len(), date);

    Ok(rows)
}

fn scatter(table: &Table, column: &str, scale: &ColorScale, projection: Projection) -> Result<MapCanvas, PlotError> {
    let lats = table.float(LATITUDE)?;
    let lons = table.float(LONGITUDE)?;
    let values = table.float(column)?;

    let mut extent = Extent::from_points(lats, lons)?;
    // room for markers at the edges
    let pad = 0.02 * (extent.lon_max - extent.lon_min).max(extent.lat_max - extent.lat_min);
    extent.lon_min -= pad;
    extent.lon_max += pad;
    extent.lat_min -= pad;
    extent.lat_max += pad;

    let mut canvas = MapCanvas::new(SCATTER_SIZE, projection, extent)?;
    canvas.draw_graticule(GRATICULE_STEP)?;

    for ((lat, lon), value) in lats.iter().zip(lons).zip(values) {
        if let Some(color) = scale.color(*value) {
            canvas.fill_circle(*lon, *lat, MARKER_RADIUS, color);
        }
    }

    canvas.draw_frame();
    canvas.draw_colorbar(scale);

    Ok(canvas)
}

fn save_scatter(canvas: &MapCanvas, savename: Option<&str>, date: NaiveDateTime) -> Result<(), PlotError> {
    if let Some(savename) = savename {
        let path = date_savename(savename, date);
        canvas.save(&path)?;
        info!("Saved scatter plot to {}", path.display());
    }
    Ok(())
}

/// Scatter map of AQS observations (`Obs_value`) at `date`
/// on the discrete 0-150 viridis scale.
pub fn aqs_spatial_scatter(
    table: &Table,
    date: NaiveDateTime,
    projection: Projection,
    savename: Option<&str>,
) -> Result<MapCanvas, PlotError> {
    let rows = rows_at(table, date)?;
    let scale = normval(0.0, CONCENTRATION_MAX, Colormap::Viridis)?;

    let canvas = scatter(&rows, AQS_VALUE_COLUMN, &scale, projection)?;
    save_scatter(&canvas, savename, date)?;

    Ok(canvas)
}

/// Scatter map of IMPROVE parameter `param` at `date`, the colour range
/// defaults to the range of observed values.
#[allow(clippy::too_many_arguments)]
pub fn improve_spatial_scatter(
    table: &Table,
    date: NaiveDateTime,
    param: &str,
    vmin: Option<Float>,
    vmax: Option<Float>,
    cmap: Colormap,
    projection: Projection,
    savename: Option<&str>,
) -> Result<MapCanvas, PlotError> {
    let rows = rows_at(table, date)?;

    let observed = Normalize::from_values(rows.float(param)?)?;
    let norm = Normalize::new(vmin.unwrap_or(observed.vmin), vmax.unwrap_or(observed.vmax))?;
    let scale = ColorScale::linear(cmap, norm);

    let canvas = scatter(&rows, param, &scale, projection)?;
    save_scatter(&canvas, savename, date)?;

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::{aqs_spatial_scatter, improve_spatial_scatter, make_spatial_plot};
    use crate::data::{Column, DataArray, Table, Variable, TIME};
    use crate::plots::canvas::Projection;
    use crate::plots::colormap::Colormap;
    use chrono::{NaiveDate, NaiveDateTime};
    use image::Rgb;
    use ndarray::Array3;

    fn date(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd(2019, 8, 1).and_hms(h, 0, 0)
    }

    #[test]
    fn spatial_plot_is_saved_with_date() {
        let da = DataArray::new(
            "PM25",
            Variable::new(
                &["time", "lat", "lon"],
                Array3::from_shape_fn((2, 3, 4), |(t, j, i)| (40 * t + 10 * j + i) as f64).into_dyn(),
            )
            .unwrap(),
        )
        .with_coord("lat", Variable::from_vec("lat", vec![30.0, 35.0, 40.0]))
        .unwrap()
        .with_coord("lon", Variable::from_vec("lon", vec![-100.0, -95.0, -90.0, -85.0]))
        .unwrap();
        let mut ds = da.to_dataset().unwrap();
        ds.set_time(vec![date(0), date(1)]).unwrap();
        let da = ds.data_array("PM25").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let savename = dir.path().join("pm25_").to_string_lossy().to_string();

        make_spatial_plot(&da, date(1), Projection::PlateCarree, Some(&savename)).unwrap();
        assert!(dir.path().join("pm25_20190801_01.jpg").exists());

        assert!(make_spatial_plot(&da, date(5), Projection::PlateCarree, None).is_err());
    }

    fn sites() -> Table {
        Table::new()
            .with_column("Latitude", Column::Float(vec![35.0, 40.0, 45.0]))
            .unwrap()
            .with_column("Longitude", Column::Float(vec![-110.0, -100.0, -90.0]))
            .unwrap()
            .with_column(TIME, Column::Time(vec![Some(date(12)), Some(date(12)), Some(date(13))]))
            .unwrap()
            .with_column("Obs_value", Column::Float(vec![12.0, 80.0, 40.0]))
            .unwrap()
            .with_column("SO4f", Column::Float(vec![1.0, 2.0, 3.0]))
            .unwrap()
    }

    #[test]
    fn observations_are_scattered() {
        let canvas = aqs_spatial_scatter(&sites(), date(12), Projection::Lambert, None).unwrap();
        let (x, y) = canvas.to_pixel(-100.0, 40.0);
        assert_ne!(*canvas.image().get_pixel(x as u32, y as u32), Rgb([255, 255, 255]));

        assert!(aqs_spatial_scatter(&sites(), date(3), Projection::Lambert, None).is_err());
    }

    #[test]
    fn improve_scatter_uses_given_range() {
        let canvas = improve_spatial_scatter(
            &sites(),
            date(12),
            "SO4f",
            Some(0.0),
            None,
            Colormap::Greys,
            Projection::PlateCarree,
            None,
        )
        .unwrap();

        // value 2 is the top of the range 0..2
        let (x, y) = canvas.to_pixel(-100.0, 40.0);
        assert_eq!(*canvas.image().get_pixel(x as u32, y as u32), Rgb([0, 0, 0]));
    }
}
