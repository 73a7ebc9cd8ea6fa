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

//! Module with map projections used when drawing figures.
//!
//! Lambert Conformal Conic projection closely follows algorithms
//! and instructions in: <https://pubs.er.usgs.gov/publication/pp1395>

use float_cmp::approx_eq;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::constants::{WGS84_A, WGS84_E};
use crate::{errors::CoordError, Float};

/// Projection of a map figure.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum MapProjection {
    /// Equirectangular projection, longitudes and latitudes
    /// are used directly as cartesian coordinates.
    PlateCarree,

    /// Lambert Conformal Conic projection on WGS84 ellipsoid.
    Lambert(LambertConformal),
}

impl MapProjection {
    /// Projects geographic coordinates to the plane of the map.
    /// Units are degrees for PlateCarree and meters for Lambert.
    pub fn project(&self, lon: Float, lat: Float) -> (Float, Float) {
        match self {
            MapProjection::PlateCarree => (lon, lat),
            MapProjection::Lambert(lcc) => lcc.project(lon, lat),
        }
    }

    pub fn inverse_project(&self, x: Float, y: Float) -> (Float, Float) {
        match self {
            MapProjection::PlateCarree => (x, y),
            MapProjection::Lambert(lcc) => lcc.inverse_project(x, y),
        }
    }
}

impl Default for MapProjection {
    fn default() -> Self {
        MapProjection::PlateCarree
    }
}

/// Front-facing struct of Lambert Conformal Conic projection.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct LambertConformal {
    lambda_0: Float,
    n: Float,
    big_f: Float,
    rho_0: Float,
}

impl LambertConformal {
    /// LCC projection constructor from reference longitude,
    /// reference latitude and two standard parallels.
    pub fn new(lon_0: Float, lat_0: Float, lat_1: Float, lat_2: Float) -> Result<Self, CoordError> {
        if ![lon_0, lat_0, lat_1, lat_2].iter().all(|v| v.is_finite()) {
            return Err(CoordError::IncorrectProjection("one of params is not finite"));
        }

        if approx_eq!(Float, lat_1, lat_2) {
            return Err(CoordError::IncorrectProjection(
                "standard parallels cannot be equal",
            ));
        }

        if approx_eq!(Float, lat_1, -lat_2) {
            return Err(CoordError::IncorrectProjection(
                "standard parallels cannot be symmetric around equator",
            ));
        }

        if !(-180.0..180.0).contains(&lon_0) {
            return Err(CoordError::IncorrectProjection("longitude out of bounds"));
        }

        if [lat_0, lat_1, lat_2]
            .iter()
            .any(|lat| !(-90.0..90.0).contains(lat))
        {
            return Err(CoordError::IncorrectProjection("latitude out of bounds"));
        }

        let phi_0 = lat_0.to_radians();
        let phi_1 = lat_1.to_radians();
        let phi_2 = lat_2.to_radians();

        let t_1 = t(phi_1);
        let m_1 = m(phi_1);

        let n = n(m_1, m(phi_2), t_1, t(phi_2));
        let big_f = big_f(m_1, n, t_1);
        let rho_0 = rho(big_f, t(phi_0), n);

        Ok(LambertConformal {
            lambda_0: lon_0.to_radians(),
            n,
            big_f,
            rho_0,
        })
    }

    /// Projection fitted to a geographic extent: centred on the middle
    /// of the extent with standard parallels at one sixth of the
    /// latitude span from its edges.
    pub fn for_extent(
        lon_min: Float,
        lon_max: Float,
        lat_min: Float,
        lat_max: Float,
    ) -> Result<Self, CoordError> {
        let span = lat_max - lat_min;
        if span <= 0.0 || lon_max <= lon_min {
            return Err(CoordError::IncorrectProjection("extent is empty"));
        }

        let lon_0 = crate::coords::wrap_longitude(0.5 * (lon_min + lon_max));
        let lat_0 = 0.5 * (lat_min + lat_max);

        LambertConformal::new(
            lon_0,
            lat_0,
            lat_min + span / 6.0,
            lat_max - span / 6.0,
        )
    }

    /// Projects geographic coordinates on WGS84 ellipsoid
    /// to cartographic coordinates.
    pub fn project(&self, lon: Float, lat: Float) -> (Float, Float) {
        let phi = lat.to_radians();
        let lambda = lon.to_radians();

        let theta = self.n * (lambda - self.lambda_0);
        let rho = rho(self.big_f, t(phi), self.n);

        (rho * theta.sin(), self.rho_0 - rho * theta.cos())
    }

    /// Inversly projects cartographic coordinates
    /// to geographic coordinates on WGS84 ellipsoid.
    pub fn inverse_project(&self, x: Float, y: Float) -> (Float, Float) {
        let sign = self.n.signum();
        let rho = sign * (x.powi(2) + (self.rho_0 - y).powi(2)).sqrt();

        // signs adjusted for the southern hemisphere cones
        let theta = ((x * sign) / ((self.rho_0 - y) * sign)).atan();

        let t = (rho / (WGS84_A * self.big_f)).powf(1.0 / self.n);

        let lambda = (theta / self.n) + self.lambda_0;
        let phi = phi_for_inverse(t);

        (lambda.to_degrees(), phi.to_degrees())
    }
}

fn t(phi: Float) -> Float {
    ((FRAC_PI_4 - 0.5 * phi).tan())
        / (((1.0 - WGS84_E * phi.sin()) / (1.0 + WGS84_E * phi.sin())).powf(WGS84_E / 2.0))
}

fn m(phi: Float) -> Float {
    phi.cos() / (1.0 - (WGS84_E.powi(2) * (phi.sin()).powi(2))).sqrt()
}

fn n(m_1: Float, m_2: Float, t_1: Float, t_2: Float) -> Float {
    (m_1.ln() - m_2.ln()) / (t_1.ln() - t_2.ln())
}

fn big_f(m_1: Float, n: Float, t_1: Float) -> Float {
    m_1 / (n * t_1.powf(n))
}

fn rho(big_f: Float, t: Float, n: Float) -> Float {
    WGS84_A * big_f * t.powf(n)
}

/// Truncated series for the latitude of inverse projection,
/// arranged to reduce trigonometric calls.
fn phi_for_inverse(t: Float) -> Float {
    let chi = FRAC_PI_2 - 2.0 * t.atan();
    let e2 = WGS84_E.powi(2);

    let big_a = (e2 / 2.0)
        + 5.0 * (e2.powi(2) / 24.0)
        + (e2.powi(3) / 12.0)
        + 13.0 * (e2.powi(4) / 360.0);

    let big_b =
        7.0 * (e2.powi(2) / 48.0) + 29.0 * (e2.powi(3) / 240.0) + 811.0 * (e2.powi(4) / 11520.0);

    let big_c = 7.0 * (e2.powi(3) / 120.0) + 81.0 * (e2.powi(4) / 1120.0);

    let big_d = 4279.0 * (e2.powi(4) / 161_280.0);

    let a_prime = big_a - big_c;
    let b_prime = 2.0 * big_b - 4.0 * big_d;
    let c_prime = 4.0 * big_c;
    let d_prime = 8.0 * big_d;

    let sin_2chi = (2.0 * chi).sin();
    let cos_2chi = (2.0 * chi).cos();

    chi + (sin_2chi
        * (a_prime + (cos_2chi * (b_prime + (cos_2chi * (c_prime + (d_prime * cos_2chi)))))))
}

#[cfg(test)]
mod tests {
    use super::{LambertConformal, MapProjection};
    use float_cmp::approx_eq;

    #[test]
    fn project_and_back() {
        let proj = LambertConformal::new(-97.0, 40.0, 33.0, 45.0).unwrap();

        let (lon_0, lat_0) = (-84.3880, 33.7490);

        let (x, y) = proj.project(lon_0, lat_0);
        let (lon, lat) = proj.inverse_project(x, y);

        assert!(approx_eq!(f64, lon, lon_0, epsilon = 1e-6));
        assert!(approx_eq!(f64, lat, lat_0, epsilon = 1e-6));

        // reference point lies on the central meridian at origin
        let (x0, y0) = proj.project(-97.0, 40.0);
        assert!(approx_eq!(f64, x0, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, y0, 0.0, epsilon = 1e-6));
    }

    #[test]
    fn incorrect_params() {
        assert!(LambertConformal::new(0.0, 0.0, 30.0, 30.0).is_err());
        assert!(LambertConformal::new(200.0, 0.0, 30.0, 60.0).is_err());
        assert!(LambertConformal::for_extent(10.0, 10.0, 40.0, 50.0).is_err());
    }

    #[test]
    fn plate_carree_is_identity() {
        let proj = MapProjection::PlateCarree;
        assert_eq!(proj.project(12.5, -3.0), (12.5, -3.0));
        assert_eq!(proj.inverse_project(12.5, -3.0), (12.5, -3.0));
    }
}
