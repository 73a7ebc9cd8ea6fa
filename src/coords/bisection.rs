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

//! Module containg methods for conducting
//! binary search (bisection) on monotonic coordinate axes.
//!
//! Axes can be sorted ascendingly (eg. longitudes) or descendingly
//! (eg. latitudes in most global model files), all functions
//! detect the ordering from the first and last element.

use crate::{errors::CoordError, Float};

/// Ordering of an axis together with its bounds.
fn axis_bounds(axis: &[Float]) -> Result<(Float, Float, bool), CoordError> {
    let (first, last) = match (axis.first(), axis.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(CoordError::EmptyAxis),
    };

    Ok((first, last, first <= last))
}

/// Core bisection function, an implementation of binary search
/// returning the first index at which the axis reaches the searched value.
fn binary_search(axis: &[Float], x: Float) -> Result<usize, CoordError> {
    let (first, last, ascending) = axis_bounds(axis)?;

    if (x < first && x < last) || (x > first && x > last) || x.is_nan() {
        return Err(CoordError::OutOfBounds);
    }

    let mut lo = 0;
    let mut hi = axis.len() - 1;

    // for descending axis the comparison is reversed
    while lo < hi {
        let mid = (lo + hi) / 2;
        let reached = if ascending {
            axis[mid] >= x
        } else {
            axis[mid] <= x
        };

        if reached {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    Ok(lo)
}

/// Finds index of the closest axis value lying
/// before the searched one (along the axis order).
pub fn find_left_closest(axis: &[Float], x: Float) -> Result<usize, CoordError> {
    let found = binary_search(axis, x)?;

    if axis[found] == x || found == 0 {
        Ok(found)
    } else {
        Ok(found - 1)
    }
}

/// Finds index of the closest axis value lying
/// after the searched one (along the axis order).
pub fn find_right_closest(axis: &[Float], x: Float) -> Result<usize, CoordError> {
    binary_search(axis, x)
}

/// Finds the cell `[i, i+1]` containing the searched value.
/// Values equal to the last axis element fall into the last cell.
pub fn find_cell(axis: &[Float], x: Float) -> Result<usize, CoordError> {
    if axis.len() < 2 {
        return Err(CoordError::EmptyAxis);
    }

    let left = find_left_closest(axis, x)?;
    Ok(left.min(axis.len() - 2))
}

/// Finds index of the axis value nearest to the searched one,
/// values outside the axis snap to its ends.
pub fn find_nearest(axis: &[Float], x: Float) -> Result<usize, CoordError> {
    let (first, last, _) = axis_bounds(axis)?;

    if x.is_nan() {
        return Err(CoordError::OutOfBounds);
    }

    match binary_search(axis, x) {
        Ok(right) => {
            if right == 0 {
                return Ok(0);
            }
            let left = right - 1;
            if (axis[left] - x).abs() <= (axis[right] - x).abs() {
                Ok(left)
            } else {
                Ok(right)
            }
        }
        Err(_) => {
            if (x - first).abs() <= (x - last).abs() {
                Ok(0)
            } else {
                Ok(axis.len() - 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{find_cell, find_left_closest, find_nearest, find_right_closest};

    #[test]
    fn ascending_axis() {
        let axis = [0.0, 1.0, 2.0, 3.0];

        assert_eq!(find_left_closest(&axis, 1.5).unwrap(), 1);
        assert_eq!(find_right_closest(&axis, 1.5).unwrap(), 2);
        assert_eq!(find_left_closest(&axis, 2.0).unwrap(), 2);
        assert_eq!(find_cell(&axis, 3.0).unwrap(), 2);
        assert!(find_cell(&axis, 3.5).is_err());
    }

    #[test]
    fn descending_axis() {
        let axis = [90.0, 45.0, 0.0, -45.0, -90.0];

        assert_eq!(find_left_closest(&axis, 30.0).unwrap(), 1);
        assert_eq!(find_right_closest(&axis, 30.0).unwrap(), 2);
        assert_eq!(find_cell(&axis, -60.0).unwrap(), 3);
    }

    #[test]
    fn nearest_snaps_to_ends() {
        let axis = [10.0, 20.0, 30.0];

        assert_eq!(find_nearest(&axis, 24.0).unwrap(), 1);
        assert_eq!(find_nearest(&axis, 26.0).unwrap(), 2);
        assert_eq!(find_nearest(&axis, -100.0).unwrap(), 0);
        assert_eq!(find_nearest(&axis, 100.0).unwrap(), 2);
        assert!(find_nearest(&[], 1.0).is_err());
    }
}
