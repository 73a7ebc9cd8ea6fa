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

//! Module with geometric definitions of grids and point sets
//! used by the resamplers.

use crate::constants::{EARTH_RADIUS, LATITUDE, LONGITUDE};
use crate::coords::check_and_wrap;
use crate::data::{Attrs, Dataset, Variable};
use crate::errors::{CoordError, DataError, RemapError};
use crate::Float;
use nalgebra::Vector3;
use ndarray::{Array2, ArrayView1, IxDyn};

/// Converts geographic coordinates to Earth-centred cartesian
/// coordinates (in meters) on a spherical Earth.
pub fn lonlat_to_cartesian(lon: Float, lat: Float) -> Vector3<Float> {
    let (lambda, phi) = (lon.to_radians(), lat.to_radians());

    Vector3::new(
        EARTH_RADIUS * phi.cos() * lambda.cos(),
        EARTH_RADIUS * phi.cos() * lambda.sin(),
        EARTH_RADIUS * phi.sin(),
    )
}

/// Great-circle distance in meters (haversine formula).
pub fn haversine(lon_1: Float, lat_1: Float, lon_2: Float, lat_2: Float) -> Float {
    let (phi_1, phi_2) = (lat_1.to_radians(), lat_2.to_radians());
    let d_phi = phi_2 - phi_1;
    let d_lambda = (lon_2 - lon_1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi_1.cos() * phi_2.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS * a.sqrt().asin()
}

/// Values of a variable with the spatial dimensions moved
/// last and flattened into a single axis.
#[derive(Clone, Debug)]
pub(crate) struct FlatSample {
    pub other_dims: Vec<String>,
    pub other_shape: Vec<usize>,
    pub values: Array2<Float>,
}

/// Flattened (row-major) coordinates of grid points together
/// with the shape and names of spatial dimensions they span.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateDefinition {
    lons: Vec<Float>,
    lats: Vec<Float>,
    shape: Vec<usize>,
    dims: Vec<String>,
}

impl CoordinateDefinition {
    /// Definition of a normalised dataset, built
    /// from its `latitude` and `longitude`.
    pub fn from_dataset(ds: &Dataset) -> Result<Self, RemapError> {
        let lat = ds.get(LATITUDE).ok_or(CoordError::MissingLatLon)?;
        let lon = ds.get(LONGITUDE).ok_or(CoordError::MissingLatLon)?;

        if lat.dims() != lon.dims() {
            return Err(CoordError::ShapeMismatch.into());
        }

        let (lons, lats) = check_and_wrap(lon.values().view(), lat.values().view())?;

        Ok(CoordinateDefinition {
            lons: lons.iter().copied().collect(),
            lats: lats.iter().copied().collect(),
            shape: lat.shape().to_vec(),
            dims: lat.dims().to_vec(),
        })
    }

    /// Definition of scattered points laid out
    /// on `(y, x)` dimensions of shape `(1, n)`.
    pub fn from_points(lons: &[Float], lats: &[Float]) -> Result<Self, RemapError> {
        let (lons, lats) = check_and_wrap(ArrayView1::from(lons), ArrayView1::from(lats))?;

        Ok(CoordinateDefinition {
            shape: vec![1, lons.len()],
            lons: lons.to_vec(),
            lats: lats.to_vec(),
            dims: vec!["y".to_string(), "x".to_string()],
        })
    }

    pub fn len(&self) -> usize {
        self.lons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    pub fn lons(&self) -> &[Float] {
        &self.lons
    }

    pub fn lats(&self) -> &[Float] {
        &self.lats
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Whether the variable spans all spatial dimensions of this definition.
    pub fn spans(&self, var: &Variable) -> bool {
        self.dims.iter().all(|d| var.has_dim(d))
    }

    /// Moves spatial dimensions of the variable last and flattens them.
    pub(crate) fn flatten(&self, var: &Variable) -> Result<FlatSample, RemapError> {
        for (dim, len) in self.dims.iter().zip(self.shape.iter()) {
            match var.dim_len(dim) {
                Some(found) if found == *len => (),
                Some(found) => {
                    return Err(DataError::DimensionMismatch {
                        dim: dim.clone(),
                        expected: *len,
                        found,
                    }
                    .into())
                }
                None => return Err(DataError::MissingDimension(dim.clone()).into()),
            }
        }

        let other_dims: Vec<String> = var
            .dims()
            .iter()
            .filter(|d| !self.dims.contains(d))
            .cloned()
            .collect();

        let mut order: Vec<&str> = other_dims.iter().map(|d| d.as_str()).collect();
        order.extend(self.dims.iter().map(|d| d.as_str()));
        let moved = var.transpose(&order)?;

        let other_shape = moved.shape()[..other_dims.len()].to_vec();
        let other_len: usize = other_shape.iter().product();

        let values = moved
            .values()
            .as_standard_layout()
            .into_owned()
            .into_shape((other_len, self.len()))
            .map_err(DataError::from)?;

        Ok(FlatSample {
            other_dims,
            other_shape,
            values,
        })
    }

    /// Builds a variable from flattened values laid
    /// out on this definition, inverse of [`Self::flatten`].
    pub(crate) fn unflatten(
        &self,
        other_dims: &[String],
        other_shape: &[usize],
        values: Array2<Float>,
        attrs: Attrs,
    ) -> Result<Variable, RemapError> {
        let mut shape = other_shape.to_vec();
        shape.extend_from_slice(&self.shape);

        let values = values.into_shape(IxDyn(&shape)).map_err(DataError::from)?;

        let mut dims = other_dims.to_vec();
        dims.extend(self.dims.iter().cloned());

        Ok(Variable::from_parts(dims, values, attrs))
    }

    /// Cartesian coordinates of all points, NaN coordinates
    /// produce NaN vectors.
    pub fn cartesian(&self) -> Vec<[Float; 3]> {
        self.lons
            .iter()
            .zip(self.lats.iter())
            .map(|(lon, lat)| {
                let v = lonlat_to_cartesian(*lon, *lat);
                [v.x, v.y, v.z]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{haversine, lonlat_to_cartesian, CoordinateDefinition};
    use crate::constants::EARTH_RADIUS;
    use float_cmp::approx_eq;

    #[test]
    fn cartesian_lies_on_sphere() {
        let v = lonlat_to_cartesian(-105.0, 40.0);
        assert!(approx_eq!(f64, v.norm(), EARTH_RADIUS, epsilon = 1e-6));

        let pole = lonlat_to_cartesian(0.0, 90.0);
        assert!(approx_eq!(f64, pole.z, EARTH_RADIUS, epsilon = 1e-6));
    }

    #[test]
    fn haversine_distance() {
        // one degree along the equator
        let d = haversine(0.0, 0.0, 1.0, 0.0);
        let expected = EARTH_RADIUS * 1.0_f64.to_radians();
        assert!(approx_eq!(f64, d, expected, epsilon = 1e-6));

        assert!(approx_eq!(f64, haversine(179.5, 0.0, -179.5, 0.0), expected, epsilon = 1e-6));
    }

    #[test]
    fn points_are_wrapped() {
        let def = CoordinateDefinition::from_points(&[350.0, 10.0], &[0.0, 1.0]).unwrap();
        assert_eq!(def.shape(), &[1, 2]);
        assert!(approx_eq!(f64, def.lons()[0], -10.0));
        assert!(CoordinateDefinition::from_points(&[0.0], &[91.0]).is_err());
    }
}
