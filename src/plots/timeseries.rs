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

//! Time series of observations against paired model values.

use super::canvas::{save_image, PlotArea, BLACK, GRID_GREY, WHITE};
use super::colormap::finite_range;
use crate::data::{Table, TIME};
use crate::errors::PlotError;
use crate::Float;
use chrono::{Duration, NaiveDateTime};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CHART_SIZE: (u32, u32) = (1000, 500);
const CHART_MARGIN: u32 = 40;
const GRID_LINES: usize = 5;

/// Colour of the model line.
const MODEL_COLOR: Rgb<u8> = Rgb([31, 119, 180]);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesOptions {
    /// Average all sites at each time instead of plotting a single site.
    #[serde(default = "TimeseriesOptions::default_true")]
    pub domain_average: bool,
    /// Scale observations by 1000 before plotting.
    #[serde(default = "TimeseriesOptions::default_true")]
    pub convert: bool,
    #[serde(default = "TimeseriesOptions::default_obs_column")]
    pub obs_column: String,
    #[serde(default = "TimeseriesOptions::default_model_column")]
    pub model_column: String,
    #[serde(default = "TimeseriesOptions::default_site_column")]
    pub site_column: String,
    #[serde(default)]
    pub savename: Option<String>,
}

impl TimeseriesOptions {
    fn default_true() -> bool {
        true
    }
    fn default_obs_column() -> String {
        "Obs_value".to_string()
    }
    fn default_model_column() -> String {
        "cmaq".to_string()
    }
    fn default_site_column() -> String {
        "SCS".to_string()
    }
}

impl Default for TimeseriesOptions {
    fn default() -> Self {
        TimeseriesOptions {
            domain_average: true,
            convert: true,
            obs_column: Self::default_obs_column(),
            model_column: Self::default_model_column(),
            site_column: Self::default_site_column(),
            savename: None,
        }
    }
}

type Series = Vec<(NaiveDateTime, Float)>;

/// Line chart with time on the horizontal axis.
#[derive(Clone, Debug)]
pub struct SeriesChart {
    image: RgbImage,
    area: PlotArea,
    time_range: (NaiveDateTime, NaiveDateTime),
    value_range: (Float, Float),
}

impl SeriesChart {
    fn new(time_range: (NaiveDateTime, NaiveDateTime), value_range: (Float, Float)) -> Self {
        let (width, height) = CHART_SIZE;
        SeriesChart {
            image: RgbImage::from_pixel(width, height, WHITE),
            area: PlotArea {
                left: CHART_MARGIN,
                top: CHART_MARGIN,
                width: width - 2 * CHART_MARGIN,
                height: height - 2 * CHART_MARGIN,
            },
            time_range,
            value_range,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn time_range(&self) -> (NaiveDateTime, NaiveDateTime) {
        self.time_range
    }

    pub fn value_range(&self) -> (Float, Float) {
        self.value_range
    }

    pub fn to_pixel(&self, time: NaiveDateTime, value: Float) -> (f32, f32) {
        let (t_0, t_1) = self.time_range;
        let (v_0, v_1) = self.value_range;

        let fx = (time - t_0).num_seconds() as Float / (t_1 - t_0).num_seconds() as Float;
        let fy = (value - v_0) / (v_1 - v_0);

        self.area.pixel(fx, fy)
    }

    fn draw_grid(&mut self) {
        for k in 0..GRID_LINES {
            let f = k as Float / (GRID_LINES - 1) as Float;

            let start = self.area.pixel(0.0, f);
            let end = self.area.pixel(1.0, f);
            draw_line_segment_mut(&mut self.image, start, end, GRID_GREY);

            let start = self.area.pixel(f, 0.0);
            let end = self.area.pixel(f, 1.0);
            draw_line_segment_mut(&mut self.image, start, end, GRID_GREY);
        }
    }

    /// Line through the points, broken at missing values.
    fn draw_series(&mut self, series: &[(NaiveDateTime, Float)], color: Rgb<u8>) {
        for pair in series.windows(2) {
            let ((t_a, v_a), (t_b, v_b)) = (pair[0], pair[1]);
            if v_a.is_nan() || v_b.is_nan() {
                continue;
            }
            let start = self.to_pixel(t_a, v_a);
            let end = self.to_pixel(t_b, v_b);
            draw_line_segment_mut(&mut self.image, start, end, color);
        }
    }

    fn draw_frame(&mut self) {
        draw_hollow_rect_mut(&mut self.image, self.area.rect(), BLACK);
    }

    pub fn save(&self, path: &Path) -> Result<(), PlotError> {
        save_image(&self.image, path)
    }
}

/// Observed and model series of the table, ordered by time.
fn series(table: &Table, opts: &TimeseriesOptions) -> Result<(Series, Series), PlotError> {
    let times = table.times(TIME)?;
    let obs = table.float(&opts.obs_column)?;
    let model = table.float(&opts.model_column)?;
    let factor = if opts.convert { 1000.0 } else { 1.0 };

    if opts.domain_average {
        // NaN-skipping means per time
        let mut groups: BTreeMap<NaiveDateTime, [(Float, usize); 2]> = BTreeMap::new();
        for ((time, o), m) in times.iter().zip(obs).zip(model) {
            if let Some(time) = time {
                let group = groups.entry(*time).or_insert([(0.0, 0); 2]);
                for (acc, v) in group.iter_mut().zip([o * factor, *m]) {
                    if !v.is_nan() {
                        acc.0 += v;
                        acc.1 += 1;
                    }
                }
            }
        }

        let mean = |(sum, n): (Float, usize)| if n > 0 { sum / n as Float } else { Float::NAN };
        Ok(groups
            .into_iter()
            .map(|(t, [o, m])| ((t, mean(o)), (t, mean(m))))
            .unzip())
    } else {
        let mut rows: Vec<(NaiveDateTime, Float, Float)> = times
            .iter()
            .zip(obs)
            .zip(model)
            .filter_map(|((t, o), m)| t.map(|t| (t, o * factor, *m)))
            .collect();
        rows.sort_by_key(|row| row.0);

        Ok(rows.into_iter().map(|(t, o, m)| ((t, o), (t, m))).unzip())
    }
}

/// Time series of observations (black) and model values, averaged over
/// the domain or for the single site of the table.
///
/// Saved to `<savename>_average.jpg` or `<savename><site>.jpg`.
pub fn plot_timeseries(table: &Table, opts: &TimeseriesOptions) -> Result<SeriesChart, PlotError> {
    let (obs, model) = series(table, opts)?;

    let (t_0, t_1) = match (obs.first(), obs.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        (Some(first), Some(_)) => (first.0 - Duration::hours(1), first.0 + Duration::hours(1)),
        _ => return Err(PlotError::NothingToPlot("no timestamped rows")),
    };

    let (v_0, v_1) = finite_range(obs.iter().chain(model.iter()).map(|(_, v)| v))
        .ok_or(PlotError::NothingToPlot("all values are missing"))?;
    let pad = if v_1 > v_0 { 0.05 * (v_1 - v_0) } else { 1.0 };

    let mut chart = SeriesChart::new((t_0, t_1), (v_0 - pad, v_1 + pad));
    chart.draw_grid();
    chart.draw_series(&obs, BLACK);
    chart.draw_series(&model, MODEL_COLOR);
    chart.draw_frame();

    debug!("Drew time series of {} points", obs.len());

    if let Some(savename) = &opts.savename {
        let path = if opts.domain_average {
            PathBuf::from(format!("{}_average.jpg", savename))
        } else {
            let sites = table.try_column(&opts.site_column)?;
            PathBuf::from(format!("{}{}.jpg", savename, sites.cell(0)))
        };
        chart.save(&path)?;
        info!("Saved time series to {}", path.display());
    }

    Ok(chart)
}

/// Time series of every site of the table followed by the domain average.
pub fn plot_allsites_timeseries(table: &Table, opts: &TimeseriesOptions) -> Result<Vec<SeriesChart>, PlotError> {
    let sites = table.try_column(&opts.site_column)?;
    let labels: Vec<String> = (0..table.len()).map(|row| sites.cell(row)).collect();

    // unique sites in order of first appearance
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let unique: Vec<&String> = labels.iter().filter(|l| seen.insert(l.as_str())).collect();

    let site_opts = TimeseriesOptions {
        domain_average: false,
        ..opts.clone()
    };
    let mut charts = Vec::with_capacity(unique.len() + 1);

    for site in unique {
        let mask: Vec<bool> = labels.iter().map(|l| l == site).collect();
        charts.push(plot_timeseries(&table.filter(&mask)?, &site_opts)?);
    }

    let average_opts = TimeseriesOptions {
        domain_average: true,
        ..opts.clone()
    };
    charts.push(plot_timeseries(table, &average_opts)?);

    Ok(charts)
}
