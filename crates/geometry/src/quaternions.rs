//! Quaternion rotations.
//!
//! Body-rotation quaternions are stored scalar first, `(q0, q1, q2, q3)`,
//! and rotate J2000 vectors into the body-fixed frame.

use nalgebra::UnitQuaternion;

pub use nalgebra::Quaternion;

use crate::vectors::Vector3;

/// Build a normalized quaternion from scalar-first components.
pub fn from_scalar_first(q: [f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

/// Rotate `v` by the quaternion `q` (scalar first).
pub fn q_rot(q: [f64; 4], v: &Vector3<f64>) -> Vector3<f64> {
    from_scalar_first(q).transform_vector(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vector3<f64>, b: Vector3<f64>) {
        assert!((a - b).norm() < 1e-12, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_identity_rotation() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_vec_close(q_rot([1.0, 0.0, 0.0, 0.0], &v), v);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let half = std::f64::consts::FRAC_PI_4;
        let q = [half.cos(), 0.0, 0.0, half.sin()];
        assert_vec_close(
            q_rot(q, &Vector3::new(1.0, 0.0, 0.0)),
            Vector3::new(0.0, 1.0, 0.0),
        );
    }

    #[test]
    fn test_unnormalized_input() {
        // Components scaled by 2 describe the same rotation.
        let half = std::f64::consts::FRAC_PI_4;
        let q = [2.0 * half.cos(), 0.0, 0.0, 2.0 * half.sin()];
        assert_vec_close(
            q_rot(q, &Vector3::new(0.0, 1.0, 0.0)),
            Vector3::new(-1.0, 0.0, 0.0),
        );
    }
}
