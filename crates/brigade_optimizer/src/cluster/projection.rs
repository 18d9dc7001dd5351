use geo_types::Point;

/// Kilometers per degree of latitude on the 6371 km sphere.
const KM_PER_DEGREE: f64 = 6371.0 * std::f64::consts::PI / 180.0;

/// Equirectangular projection onto a local tangent plane.
///
/// Centered on the candidate set's mean coordinate with cosine-latitude
/// scaling, so Euclidean distance in the plane approximates kilometers.
/// Accurate at city scale (< 50 km spans); larger service areas would need
/// a proper local projection.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin_lat: f64,
    origin_lon: f64,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn centered_on(points: &[Point]) -> Self {
        let n = points.len().max(1) as f64;
        let origin_lat = points.iter().map(|point| point.y()).sum::<f64>() / n;
        let origin_lon = points.iter().map(|point| point.x()).sum::<f64>() / n;

        LocalProjection {
            origin_lat,
            origin_lon,
            cos_lat: origin_lat.to_radians().cos(),
        }
    }

    /// (east km, north km) relative to the origin.
    pub fn project(&self, point: Point) -> (f64, f64) {
        let east = (point.x() - self.origin_lon) * self.cos_lat * KM_PER_DEGREE;
        let north = (point.y() - self.origin_lat) * KM_PER_DEGREE;
        (east, north)
    }

    pub fn unproject(&self, east: f64, north: f64) -> Point {
        let lon = east / (self.cos_lat * KM_PER_DEGREE) + self.origin_lon;
        let lat = north / KM_PER_DEGREE + self.origin_lat;
        Point::new(lon, lat)
    }
}
