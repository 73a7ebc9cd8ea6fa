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

//! Colormaps and normalisations mapping data values to colours.
//!
//! Colormaps are piecewise-linear between evenly spaced anchor colours
//! sampled from their matplotlib counterparts.

use crate::errors::PlotError;
use crate::Float;
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const VIRIDIS: [[u8; 3]; 10] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 73, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [110, 206, 88],
    [181, 222, 43],
    [253, 231, 37],
];

const PLASMA: [[u8; 3]; 10] = [
    [13, 8, 135],
    [70, 3, 159],
    [114, 1, 168],
    [156, 23, 158],
    [189, 55, 134],
    [216, 87, 107],
    [237, 121, 83],
    [251, 159, 58],
    [253, 202, 38],
    [240, 249, 33],
];

const GREYS: [[u8; 3]; 5] = [[255, 255, 255], [217, 217, 217], [150, 150, 150], [82, 82, 82], [0, 0, 0]];

const COOLWARM: [[u8; 3]; 7] = [
    [59, 76, 192],
    [111, 146, 243],
    [170, 199, 253],
    [221, 221, 221],
    [247, 184, 156],
    [231, 116, 91],
    [180, 4, 38],
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    Viridis,
    Plasma,
    Greys,
    Coolwarm,
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap::Viridis
    }
}

impl FromStr for Colormap {
    type Err = PlotError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "viridis" => Ok(Colormap::Viridis),
            "plasma" => Ok(Colormap::Plasma),
            "greys" | "grays" => Ok(Colormap::Greys),
            "coolwarm" => Ok(Colormap::Coolwarm),
            _ => Err(PlotError::UnknownColormap(name.to_string())),
        }
    }
}

impl Colormap {
    fn anchors(&self) -> &'static [[u8; 3]] {
        match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Plasma => &PLASMA,
            Colormap::Greys => &GREYS,
            Colormap::Coolwarm => &COOLWARM,
        }
    }

    /// Colour at position `t` of the colormap, clipped to `[0, 1]`.
    pub fn color(&self, t: Float) -> Rgb<u8> {
        let anchors = self.anchors();
        let segments = (anchors.len() - 1) as Float;

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * segments;
        let i = (pos.floor() as usize).min(anchors.len() - 2);
        let w = pos - i as Float;

        let mix = |a: u8, b: u8| (a as Float + w * (b as Float - a as Float)).round() as u8;
        let (lo, hi) = (anchors[i], anchors[i + 1]);

        Rgb([mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2])])
    }
}

/// Linear mapping of `[vmin, vmax]` onto the colormap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normalize {
    pub vmin: Float,
    pub vmax: Float,
}

impl Normalize {
    pub fn new(vmin: Float, vmax: Float) -> Result<Self, PlotError> {
        if !vmin.is_finite() || !vmax.is_finite() || vmax < vmin {
            return Err(PlotError::IncorrectParams("vmin must not exceed vmax"));
        }
        Ok(Normalize { vmin, vmax })
    }

    /// Normalisation spanning the finite values.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Float>) -> Result<Self, PlotError> {
        let (vmin, vmax) = finite_range(values).ok_or(PlotError::NothingToPlot("all values are missing"))?;
        Normalize::new(vmin, vmax)
    }

    fn scale(&self, value: Float) -> Float {
        if self.vmax == self.vmin {
            0.5
        } else {
            ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
        }
    }
}

/// Discrete mapping, each interval between consecutive boundaries
/// gets a single colour. Values outside boundaries take the end colours.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryNorm {
    boundaries: Vec<Float>,
}

impl BoundaryNorm {
    pub fn new(boundaries: Vec<Float>) -> Result<Self, PlotError> {
        if boundaries.len() < 2 {
            return Err(PlotError::IncorrectParams("at least two boundaries are required"));
        }
        if boundaries.windows(2).any(|b| !(b[1] > b[0])) {
            return Err(PlotError::IncorrectParams("boundaries must be increasing"));
        }
        Ok(BoundaryNorm { boundaries })
    }

    pub fn boundaries(&self) -> &[Float] {
        &self.boundaries
    }

    pub fn nbins(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Interval of the value.
    pub fn bin(&self, value: Float) -> usize {
        let upper = self.boundaries.partition_point(|b| *b <= value);
        upper.saturating_sub(1).min(self.nbins() - 1)
    }

    fn bin_position(&self, bin: usize) -> Float {
        match self.nbins() {
            1 => 0.5,
            n => bin as Float / (n - 1) as Float,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColorNorm {
    Linear(Normalize),
    Boundary(BoundaryNorm),
}

/// Colormap together with its normalisation.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorScale {
    pub cmap: Colormap,
    pub norm: ColorNorm,
}

impl ColorScale {
    pub fn linear(cmap: Colormap, norm: Normalize) -> Self {
        ColorScale {
            cmap,
            norm: ColorNorm::Linear(norm),
        }
    }

    pub fn boundary(cmap: Colormap, norm: BoundaryNorm) -> Self {
        ColorScale {
            cmap,
            norm: ColorNorm::Boundary(norm),
        }
    }

    /// Colour of the value, missing values have none.
    pub fn color(&self, value: Float) -> Option<Rgb<u8>> {
        if value.is_nan() {
            return None;
        }

        let t = match &self.norm {
            ColorNorm::Linear(norm) => norm.scale(value),
            ColorNorm::Boundary(norm) => norm.bin_position(norm.bin(value)),
        };

        Some(self.cmap.color(t))
    }

    /// Colour at fraction `f` of the colorbar length, from the bottom.
    pub fn bar_color(&self, f: Float) -> Rgb<u8> {
        let f = f.clamp(0.0, 1.0);
        match &self.norm {
            ColorNorm::Linear(_) => self.cmap.color(f),
            ColorNorm::Boundary(norm) => {
                let bin = ((f * norm.nbins() as Float) as usize).min(norm.nbins() - 1);
                self.cmap.color(norm.bin_position(bin))
            }
        }
    }

    /// Tick positions as fractions of the colorbar length,
    /// bin centres for discrete scales.
    pub fn ticks(&self) -> Vec<Float> {
        match &self.norm {
            ColorNorm::Linear(_) => vec![0.0, 0.25, 0.5, 0.75, 1.0],
            ColorNorm::Boundary(norm) => {
                let n = norm.nbins() as Float;
                (0..norm.nbins()).map(|i| (i as Float + 0.5) / n).collect()
            }
        }
    }
}

/// Discrete colour scale with boundaries every 5 units from `vmin` up to
/// (excluding) `vmax`.
pub fn normval(vmin: Float, vmax: Float, cmap: Colormap) -> Result<ColorScale, PlotError> {
    const STEP: Float = 5.0;

    if !vmin.is_finite() || !vmax.is_finite() {
        return Err(PlotError::IncorrectParams("bounds must be finite"));
    }

    let count = ((vmax - vmin) / STEP).ceil().max(0.0) as usize;
    let boundaries = (0..count).map(|k| vmin + STEP * k as Float).collect();

    Ok(ColorScale::boundary(cmap, BoundaryNorm::new(boundaries)?))
}

/// Minimum and maximum of finite values.
pub(crate) fn finite_range<'a>(values: impl IntoIterator<Item = &'a Float>) -> Option<(Float, Float)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((*v, *v)),
            Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
        })
}

#[cfg(test)]
mod tests {
    use super::{normval, BoundaryNorm, ColorScale, Colormap, Normalize};
    use image::Rgb;

    #[test]
    fn colormaps_by_name() {
        assert_eq!("Viridis".parse::<Colormap>().unwrap(), Colormap::Viridis);
        assert_eq!("grays".parse::<Colormap>().unwrap(), Colormap::Greys);
        assert!("jet".parse::<Colormap>().is_err());

        assert_eq!(Colormap::Viridis.color(0.0), Rgb([68, 1, 84]));
        assert_eq!(Colormap::Viridis.color(1.5), Rgb([253, 231, 37]));
        assert_eq!(Colormap::Greys.color(0.5), Rgb([150, 150, 150]));
    }

    #[test]
    fn linear_scale() {
        let scale = ColorScale::linear(Colormap::Greys, Normalize::new(0.0, 10.0).unwrap());

        assert_eq!(scale.color(-5.0), Some(Rgb([255, 255, 255])));
        assert_eq!(scale.color(10.0), Some(Rgb([0, 0, 0])));
        assert_eq!(scale.color(f64::NAN), None);
        assert!(Normalize::new(1.0, 0.0).is_err());
    }

    #[test]
    fn boundaries_every_five_units() {
        let scale = normval(0.0, 150.0, Colormap::Viridis).unwrap();
        let norm = match &scale.norm {
            super::ColorNorm::Boundary(norm) => norm.clone(),
            _ => unreachable!(),
        };

        assert_eq!(norm.boundaries().len(), 30);
        assert_eq!(norm.boundaries()[29], 145.0);
        assert_eq!(norm.bin(7.0), 1);
        assert_eq!(norm.bin(-1.0), 0);
        assert_eq!(norm.bin(500.0), 28);
        assert_eq!(scale.color(3.0), scale.color(4.9));
        assert_ne!(scale.color(3.0), scale.color(5.0));
        assert_eq!(scale.ticks().len(), 29);
    }

    #[test]
    fn boundaries_must_increase() {
        assert!(BoundaryNorm::new(vec![1.0]).is_err());
        assert!(BoundaryNorm::new(vec![1.0, 1.0]).is_err());
        assert!(normval(10.0, 5.0, Colormap::Plasma).is_err());
    }
}
