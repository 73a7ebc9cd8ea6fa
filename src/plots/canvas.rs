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

//! Raster map figure drawn with `imageproc` primitives.

use super::colormap::ColorScale;
use crate::coords::{LambertConformal, MapProjection};
use crate::errors::PlotError;
use crate::Float;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MARGIN: u32 = 30;
const COLORBAR_SPACE: u32 = 80;
const COLORBAR_WIDTH: u32 = 20;
const MIN_SIZE: (u32, u32) = (200, 150);

pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(crate) const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(crate) const GRID_GREY: Rgb<u8> = Rgb([210, 210, 210]);

/// Kind of projection of a map figure, the Lambert
/// projection is fitted to the extent of the data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    PlateCarree,
    Lambert,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::PlateCarree
    }
}

/// Geographic extent of a map, in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub lon_min: Float,
    pub lon_max: Float,
    pub lat_min: Float,
    pub lat_max: Float,
}

impl Extent {
    /// Extent covering all finite points, widened
    /// by half a degree when it collapses to a line.
    pub fn from_points<'a>(
        lats: impl IntoIterator<Item = &'a Float>,
        lons: impl IntoIterator<Item = &'a Float>,
    ) -> Result<Self, PlotError> {
        let mut extent: Option<Extent> = None;

        for (lat, lon) in lats.into_iter().zip(lons) {
            if !lat.is_finite() || !lon.is_finite() {
                continue;
            }
            let e = extent.get_or_insert(Extent {
                lon_min: *lon,
                lon_max: *lon,
                lat_min: *lat,
                lat_max: *lat,
            });
            e.lon_min = e.lon_min.min(*lon);
            e.lon_max = e.lon_max.max(*lon);
            e.lat_min = e.lat_min.min(*lat);
            e.lat_max = e.lat_max.max(*lat);
        }

        let mut extent = extent.ok_or(PlotError::NothingToPlot("no valid coordinates"))?;
        if extent.lon_max - extent.lon_min < 1e-6 {
            extent.lon_min -= 0.5;
            extent.lon_max += 0.5;
        }
        if extent.lat_max - extent.lat_min < 1e-6 {
            extent.lat_min -= 0.5;
            extent.lat_max += 0.5;
        }

        Ok(extent)
    }
}

/// Rectangle of the image in which data is drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct PlotArea {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PlotArea {
    /// Pixel of the point given as fractions of the area
    /// width and height, counted from the bottom-left corner.
    pub fn pixel(&self, fx: Float, fy: Float) -> (f32, f32) {
        let x = self.left as Float + fx * (self.width - 1) as Float;
        let y = self.top as Float + (1.0 - fy) * (self.height - 1) as Float;
        (x as f32, y as f32)
    }

    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        x >= self.left as f32
            && x <= (self.left + self.width - 1) as f32
            && y >= self.top as f32
            && y <= (self.top + self.height - 1) as f32
    }

    pub fn rect(&self) -> Rect {
        Rect::at(self.left as i32, self.top as i32).of_size(self.width, self.height)
    }
}

/// Map figure with data area, frame and colorbar.
#[derive(Clone, Debug)]
pub struct MapCanvas {
    image: RgbImage,
    projection: MapProjection,
    extent: Extent,
    area: PlotArea,
    bounds: (Float, Float, Float, Float),
}

impl MapCanvas {
    pub fn new(size: (u32, u32), projection: Projection, extent: Extent) -> Result<Self, PlotError> {
        let (width, height) = size;
        if width < MIN_SIZE.0 || height < MIN_SIZE.1 {
            return Err(PlotError::IncorrectParams("figure is too small"));
        }

        let projection = match projection {
            Projection::PlateCarree => MapProjection::PlateCarree,
            Projection::Lambert => MapProjection::Lambert(LambertConformal::for_extent(
                extent.lon_min,
                extent.lon_max,
                extent.lat_min,
                extent.lat_max,
            )?),
        };

        let bounds = projected_bounds(&projection, &extent);
        let (x_span, y_span) = (bounds.1 - bounds.0, bounds.3 - bounds.2);

        // keep aspect ratio of the projected extent
        let avail_w = (width - 2 * MARGIN - COLORBAR_SPACE) as Float;
        let avail_h = (height - 2 * MARGIN) as Float;
        let scale = (avail_w / x_span).min(avail_h / y_span);
        let area_w = ((x_span * scale).round() as u32).clamp(2, avail_w as u32);
        let area_h = ((y_span * scale).round() as u32).clamp(2, avail_h as u32);

        let area = PlotArea {
            left: MARGIN + (avail_w as u32 - area_w) / 2,
            top: MARGIN + (avail_h as u32 - area_h) / 2,
            width: area_w,
            height: area_h,
        };

        debug!("Created {}x{} map canvas with data area {:?}", width, height, area);

        Ok(MapCanvas {
            image: RgbImage::from_pixel(width, height, WHITE),
            projection,
            extent,
            area,
            bounds,
        })
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn projection(&self) -> &MapProjection {
        &self.projection
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Pixel position of the geographic point.
    pub fn to_pixel(&self, lon: Float, lat: Float) -> (f32, f32) {
        let (x, y) = self.projection.project(lon, lat);
        let (x_min, x_max, y_min, y_max) = self.bounds;
        self.area.pixel((x - x_min) / (x_max - x_min), (y - y_min) / (y_max - y_min))
    }

    /// Fills the polygon with vertices given as `(lon, lat)`.
    pub fn fill_polygon(&mut self, vertices: &[(Float, Float)], color: Rgb<u8>) {
        let mut points: Vec<Point<i32>> = Vec::with_capacity(vertices.len());

        for (lon, lat) in vertices {
            let (x, y) = self.to_pixel(*lon, *lat);
            if !x.is_finite() || !y.is_finite() {
                return;
            }
            let p = Point::new(x.round() as i32, y.round() as i32);
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        match points.len() {
            0 => (),
            1 | 2 => {
                for p in points {
                    self.put_pixel(p.x, p.y, color);
                }
            }
            _ => draw_polygon_mut(&mut self.image, &points, color),
        }
    }

    /// Filled circle marker at the geographic point.
    pub fn fill_circle(&mut self, lon: Float, lat: Float, radius: i32, color: Rgb<u8>) {
        let (x, y) = self.to_pixel(lon, lat);
        if x.is_finite() && y.is_finite() {
            draw_filled_circle_mut(&mut self.image, (x.round() as i32, y.round() as i32), radius, color);
        }
    }

    /// Meridians and parallels every `step` degrees.
    pub fn draw_graticule(&mut self, step: Float) -> Result<(), PlotError> {
        if !(step > 0.0) {
            return Err(PlotError::IncorrectParams("graticule step must be positive"));
        }

        const SEGMENTS: usize = 50;
        let e = self.extent;

        let lines = |lo: Float, hi: Float| -> Vec<Float> {
            let first = (lo / step).ceil() as i64;
            let last = (hi / step).floor() as i64;
            (first..=last).map(|k| k as Float * step).collect()
        };
        let samples = |lo: Float, hi: Float| -> Vec<Float> {
            (0..=SEGMENTS)
                .map(|k| lo + (hi - lo) * k as Float / SEGMENTS as Float)
                .collect()
        };

        for lon in lines(e.lon_min, e.lon_max) {
            let path: Vec<(Float, Float)> = samples(e.lat_min, e.lat_max).into_iter().map(|lat| (lon, lat)).collect();
            self.draw_path(&path, GRID_GREY);
        }
        for lat in lines(e.lat_min, e.lat_max) {
            let path: Vec<(Float, Float)> = samples(e.lon_min, e.lon_max).into_iter().map(|lon| (lon, lat)).collect();
            self.draw_path(&path, GRID_GREY);
        }

        Ok(())
    }

    /// Polyline through geographic points, segments leaving
    /// the data area are skipped.
    pub fn draw_path(&mut self, points: &[(Float, Float)], color: Rgb<u8>) {
        let pixels: Vec<(f32, f32)> = points.iter().map(|(lon, lat)| self.to_pixel(*lon, *lat)).collect();

        for pair in pixels.windows(2) {
            if self.area.contains(pair[0]) && self.area.contains(pair[1]) {
                draw_line_segment_mut(&mut self.image, pair[0], pair[1], color);
            }
        }
    }

    pub fn draw_frame(&mut self) {
        draw_hollow_rect_mut(&mut self.image, self.area.rect(), BLACK);
    }

    /// Vertical colorbar right of the data area, with tick marks.
    pub fn draw_colorbar(&mut self, scale: &ColorScale) {
        let left = self.area.left + self.area.width + (COLORBAR_SPACE - COLORBAR_WIDTH) / 2;
        let bar = PlotArea {
            left,
            top: self.area.top,
            width: COLORBAR_WIDTH,
            height: self.area.height,
        };

        for row in 0..bar.height {
            let f = 1.0 - row as Float / (bar.height - 1) as Float;
            let line = Rect::at(bar.left as i32, (bar.top + row) as i32).of_size(bar.width, 1);
            draw_filled_rect_mut(&mut self.image, line, scale.bar_color(f));
        }
        draw_hollow_rect_mut(&mut self.image, bar.rect(), BLACK);

        for tick in scale.ticks() {
            let (x, y) = bar.pixel(1.0, tick);
            draw_line_segment_mut(&mut self.image, (x, y), (x + 5.0, y), BLACK);
        }
    }

    /// Saves the figure, the format follows the `png`
    /// or `jpg` extension of the path.
    pub fn save(&self, path: &Path) -> Result<(), PlotError> {
        save_image(&self.image, path)
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }
}

pub(crate) fn save_image(image: &RgbImage, path: &Path) -> Result<(), PlotError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("png") | Some("jpg") | Some("jpeg") => {
            image.save(path)?;
            debug!("Saved figure to {}", path.display());
            Ok(())
        }
        _ => Err(PlotError::IncorrectParams("figures are saved as png or jpg")),
    }
}

/// Bounding box of the projected extent, sampled along its edges.
fn projected_bounds(projection: &MapProjection, e: &Extent) -> (Float, Float, Float, Float) {
    const STEPS: usize = 32;
    let mut bounds = (Float::INFINITY, Float::NEG_INFINITY, Float::INFINITY, Float::NEG_INFINITY);

    for k in 0..=STEPS {
        let f = k as Float / STEPS as Float;
        let lon = e.lon_min + f * (e.lon_max - e.lon_min);
        let lat = e.lat_min + f * (e.lat_max - e.lat_min);

        for (lon, lat) in [(lon, e.lat_min), (lon, e.lat_max), (e.lon_min, lat), (e.lon_max, lat)] {
            let (x, y) = projection.project(lon, lat);
            bounds.0 = bounds.0.min(x);
            bounds.1 = bounds.1.max(x);
            bounds.2 = bounds.2.min(y);
            bounds.3 = bounds.3.max(y);
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::{Extent, MapCanvas, Projection, BLACK, WHITE};
    use crate::plots::colormap::{normval, Colormap};
    use image::Rgb;

    fn extent() -> Extent {
        Extent::from_points(&[20.0, 50.0], &[-120.0, -60.0]).unwrap()
    }

    #[test]
    fn extent_of_points() {
        let e = Extent::from_points(&[10.0, f64::NAN, 10.0], &[5.0, 7.0, 5.0]).unwrap();
        assert_eq!((e.lat_min, e.lat_max), (9.5, 10.5));
        assert_eq!((e.lon_min, e.lon_max), (4.5, 5.5));
        assert!(Extent::from_points(&[f64::NAN], &[1.0]).is_err());
    }

    #[test]
    fn corners_map_to_data_area() {
        let canvas = MapCanvas::new((800, 400), Projection::PlateCarree, extent()).unwrap();

        let (x0, y0) = canvas.to_pixel(-120.0, 20.0);
        let (x1, y1) = canvas.to_pixel(-60.0, 50.0);
        assert!(x0 < x1 && y0 > y1);

        // 2:1 extent keeps its aspect
        let ratio = (x1 - x0) / (y0 - y1);
        assert!((ratio - 2.0).abs() < 0.05);
    }

    #[test]
    fn polygons_and_colorbar_are_drawn() {
        let mut canvas = MapCanvas::new((800, 400), Projection::Lambert, extent()).unwrap();
        let red = Rgb([255, 0, 0]);

        canvas.fill_polygon(&[(-100.0, 30.0), (-80.0, 30.0), (-80.0, 40.0), (-100.0, 40.0)], red);
        let (x, y) = canvas.to_pixel(-90.0, 35.0);
        assert_eq!(*canvas.image().get_pixel(x as u32, y as u32), red);

        // degenerate polygons do not panic
        canvas.fill_polygon(&[(-90.0, 35.0), (-90.0, 35.0), (-90.0, 35.0)], red);

        canvas.draw_graticule(10.0).unwrap();
        canvas.draw_frame();
        canvas.draw_colorbar(&normval(0.0, 150.0, Colormap::Viridis).unwrap());

        assert_eq!(*canvas.image().get_pixel(0, 0), WHITE);
        assert!(canvas.image().pixels().any(|p| *p == BLACK));
        assert!(canvas.draw_graticule(0.0).is_err());
    }

    #[test]
    fn figures_are_saved_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = MapCanvas::new((300, 200), Projection::PlateCarree, extent()).unwrap();

        canvas.save(&dir.path().join("map.png")).unwrap();
        canvas.save(&dir.path().join("map.jpg")).unwrap();
        assert!(canvas.save(&dir.path().join("map.gif")).is_err());

        let loaded = image::open(dir.path().join("map.png")).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (300, 200));
    }
}
