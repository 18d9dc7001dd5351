use geo_types::Point;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Pairwise distance between two WGS84 points, in kilometers.
///
/// The planner ships with [`GreatCircle`]; deployments with a road-network
/// router plug their own implementation in here.
pub trait DistanceProvider: Send + Sync {
    fn distance_km(&self, from: Point, to: Point) -> f64;
}

/// Great-circle (haversine) distance on a sphere of mean radius 6371 km.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreatCircle;

impl DistanceProvider for GreatCircle {
    fn distance_km(&self, from: Point, to: Point) -> f64 {
        let lat1_rad = from.y().to_radians();
        let lat2_rad = to.y().to_radians();

        let delta_lat = (to.y() - from.y()).to_radians();
        let delta_lon = (to.x() - from.x()).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}
