// src/geometry/projection.rs

use crate::config::ProjectionKind;
use crate::error::{AtlasError, AtlasResult};
use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Große Halbachse des WGS84-Ellipsoids in Metern.
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// Erste Exzentrizität des WGS84-Ellipsoids.
const ECCENTRICITY: f64 = 0.081_819_190_842_6;
/// Jenseits dieser Breite gilt die Mercator-Abbildung als nicht darstellbar.
const MAX_LATITUDE_DEG: f64 = 89.5;
/// Abbruchschwelle der inversen Breitengrad-Iteration (Radiant).
const INVERSE_TOLERANCE: f64 = 1e-12;
const INVERSE_MAX_ITERATIONS: usize = 15;

/// Abbildung zwischen Grad-Koordinaten und der Arbeitsebene der
/// Tessellation. Plate Carrée arbeitet direkt in Grad, World Mercator
/// in Metern auf dem Ellipsoid.
#[derive(Debug, Clone, Copy)]
pub struct MapProjection {
    kind: ProjectionKind,
}

impl MapProjection {
    pub fn new(kind: ProjectionKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Bildet (lon, lat) in Grad auf die Arbeitsebene ab.
    pub fn project(&self, lon: f64, lat: f64) -> AtlasResult<Coord<f64>> {
        match self.kind {
            ProjectionKind::PlateCarree => Ok(Coord { x: lon, y: lat }),
            ProjectionKind::WorldMercator => {
                if lat.abs() > MAX_LATITUDE_DEG {
                    return Err(AtlasError::GeometricFailure {
                        operation: format!("World Mercator cannot represent latitude {lat}"),
                    });
                }
                let lambda = lon.to_radians();
                let phi = lat.to_radians();
                let con = ECCENTRICITY * phi.sin();
                let ts = (FRAC_PI_4 + phi / 2.0).tan()
                    * ((1.0 - con) / (1.0 + con)).powf(ECCENTRICITY / 2.0);
                Ok(Coord {
                    x: SEMI_MAJOR_AXIS * lambda,
                    y: SEMI_MAJOR_AXIS * ts.ln(),
                })
            }
        }
    }

    /// Bildet einen Punkt der Arbeitsebene zurück auf (lon, lat) in Grad.
    /// Die Breitengrad-Gleichung wird per Fixpunkt-Iteration gelöst.
    pub fn unproject(&self, coord: Coord<f64>) -> Coord<f64> {
        match self.kind {
            ProjectionKind::PlateCarree => coord,
            ProjectionKind::WorldMercator => {
                let lon = (coord.x / SEMI_MAJOR_AXIS).to_degrees();
                let t = (-coord.y / SEMI_MAJOR_AXIS).exp();
                let mut phi = FRAC_PI_2 - 2.0 * t.atan();
                for _ in 0..INVERSE_MAX_ITERATIONS {
                    let con = ECCENTRICITY * phi.sin();
                    let next = FRAC_PI_2
                        - 2.0
                            * (t * ((1.0 - con) / (1.0 + con)).powf(ECCENTRICITY / 2.0)).atan();
                    let done = (next - phi).abs() < INVERSE_TOLERANCE;
                    phi = next;
                    if done {
                        break;
                    }
                }
                Coord {
                    x: lon,
                    y: phi.to_degrees(),
                }
            }
        }
    }

    /// Projiziert alle Koordinaten einer MultiPolygon-Geometrie.
    pub fn project_multi(&self, multi: &MultiPolygon<f64>) -> AtlasResult<MultiPolygon<f64>> {
        match self.kind {
            ProjectionKind::PlateCarree => Ok(multi.clone()),
            ProjectionKind::WorldMercator => {
                multi.try_map_coords(|coord| self.project(coord.x, coord.y))
            }
        }
    }

    /// Inverse Abbildung einer MultiPolygon-Geometrie zurück nach Grad.
    pub fn unproject_multi(&self, multi: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        match self.kind {
            ProjectionKind::PlateCarree => multi.clone(),
            ProjectionKind::WorldMercator => multi.map_coords(|coord| self.unproject(coord)),
        }
    }
}
