//! Vector utilities.

use num_traits::Float;

pub use nalgebra::Vector3;

/// Euclidean norm of a vector.
pub fn norm(v: &Vector3<f64>) -> f64 {
    v.norm()
}

/// Unit vector along `v`. A zero vector stays zero.
pub fn hat(v: &Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n == 0.0 {
        return *v;
    }
    v / n
}

/// Wrap an angle into [-180, 180) degrees.
pub fn deg180<T: Float>(angle: T) -> T {
    let full = T::from(360.0).unwrap_or_else(T::one);
    let half = T::from(180.0).unwrap_or_else(T::one);
    rem_euclid(angle + half, full) - half
}

/// Wrap an angle into [0, 360) degrees.
pub fn deg360<T: Float>(angle: T) -> T {
    let full = T::from(360.0).unwrap_or_else(T::one);
    rem_euclid(angle, full)
}

fn rem_euclid<T: Float>(a: T, b: T) -> T {
    let r = a % b;
    let r = if r < T::zero() { r + b } else { r };
    // -1e-20 % 360 + 360 rounds back to 360
    if r >= b {
        T::zero()
    } else {
        r
    }
}

/// Convert a cartesian vector into (West longitude in [0, 360), North latitude) in degrees.
pub fn lonlat(xyz: &Vector3<f64>) -> (f64, f64) {
    let lon_w = deg360((-xyz.y.atan2(xyz.x)).to_degrees());
    let n = xyz.norm();
    let lat = if n == 0.0 {
        f64::NAN
    } else {
        (xyz.z / n).asin().to_degrees()
    };
    (lon_w, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_norm_and_hat() {
        assert!(close(norm(&Vector3::new(1.0, 0.0, 0.0)), 1.0));
        assert!(close(norm(&Vector3::new(1.0, 1.0, 1.0)), 3f64.sqrt()));

        let h = hat(&Vector3::new(1.0, 1.0, 1.0));
        for c in h.iter() {
            assert!(close(*c, 1.0 / 3f64.sqrt()));
        }
        assert_eq!(hat(&Vector3::zeros()), Vector3::zeros());
    }

    #[test]
    fn test_deg180() {
        assert_eq!(deg180(0.0), 0.0);
        assert_eq!(deg180(360.0), 0.0);
        assert_eq!(deg180(270.0), -90.0);
        assert_eq!(deg180(-90.0), -90.0);
        assert_eq!(deg180(-270.0), 90.0);
        assert_eq!(deg180(180.0), -180.0);
    }

    #[test]
    fn test_deg360() {
        assert_eq!(deg360(0.0), 0.0);
        assert_eq!(deg360(360.0), 0.0);
        assert_eq!(deg360(-90.0), 270.0);
        assert_eq!(deg360(270.0), 270.0);
        assert_eq!(deg360(-270.0_f32), 90.0);
    }

    #[test]
    fn test_lonlat() {
        let (lon, lat) = lonlat(&Vector3::new(1.0, 0.0, 0.0));
        assert!(close(lon, 0.0) && close(lat, 0.0));

        let (lon, lat) = lonlat(&Vector3::new(0.0, 1.0, 0.0));
        assert!(close(lon, 270.0) && close(lat, 0.0));

        let (lon, lat) = lonlat(&Vector3::new(1.0, 1.0, 0.0));
        assert!(close(lon, 315.0) && close(lat, 0.0));

        let (lon, lat) = lonlat(&Vector3::new(1.0, 0.0, 1.0));
        assert!(close(lon, 0.0) && close(lat, 45.0));
    }
}
