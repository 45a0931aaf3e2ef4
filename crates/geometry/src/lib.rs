//! Vector and quaternion helpers for planetary geometry.
//!
//! Positions are body-centred cartesian vectors; longitudes follow the
//! planetographic West-positive convention used by the camera labels.

pub mod quaternions;
pub mod vectors;

pub use quaternions::{q_rot, Quaternion};
pub use vectors::{deg180, deg360, hat, lonlat, norm, Vector3};
