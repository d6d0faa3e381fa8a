//! Conversions between [`Pose`] and nalgebra geometric types.
//!
//! The kinematics core works on `Isometry3<f64>` and `Rotation3<f64>`; the
//! public data model keeps the pendant-style X/Y/Z/W/P/R representation.
//!
//! # Notes
//!
//! - W, P, R are degrees and map to nalgebra's roll, pitch, yaw
//!   (`R = Rz(r) * Ry(p) * Rx(w)`).
//! - Converting an isometry near `p = ±90` gives one of the equivalent
//!   W/R splits; the rotation it describes is unchanged.

use crate::Pose;
use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

impl Pose {
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(self.w.to_radians(), self.p.to_radians(), self.r.to_radians())
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation().into_inner()
    }

    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.x, self.y, self.z),
            UnitQuaternion::from_rotation_matrix(&self.rotation()),
        )
    }

    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        let (roll, pitch, yaw) = iso.rotation.euler_angles();
        Pose {
            x: iso.translation.x,
            y: iso.translation.y,
            z: iso.translation.z,
            w: roll.to_degrees(),
            p: pitch.to_degrees(),
            r: yaw.to_degrees(),
        }
    }

    pub fn from_parts(translation: Vector3<f64>, rotation: &Rotation3<f64>) -> Self {
        let (roll, pitch, yaw) = rotation.euler_angles();
        Pose {
            x: translation.x,
            y: translation.y,
            z: translation.z,
            w: roll.to_degrees(),
            p: pitch.to_degrees(),
            r: yaw.to_degrees(),
        }
    }

    /// Expresses `self`, given relative to `frame`, in the frame's parent.
    pub fn relative_to(&self, frame: &Pose) -> Pose {
        Pose::from_isometry(&(frame.to_isometry() * self.to_isometry()))
    }

    /// Straight-line distance between the two positions.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.translation() - other.translation()).norm()
    }

    /// Rotation angle in degrees between the two orientations.
    pub fn angle_to(&self, other: &Pose) -> f64 {
        self.rotation().angle_to(&other.rotation()).to_degrees()
    }

    /// Position lerp and orientation slerp at `fraction` in [0, 1].
    ///
    /// Opposite orientations have no unique slerp path; those fall back to a
    /// normalized lerp of the quaternions.
    pub fn interpolate(&self, other: &Pose, fraction: f64) -> Pose {
        let start = self.to_isometry();
        let end = other.to_isometry();
        let translation = start.translation.vector.lerp(&end.translation.vector, fraction);
        let rotation = start
            .rotation
            .try_slerp(&end.rotation, fraction, 1.0e-9)
            .unwrap_or_else(|| start.rotation.nlerp(&end.rotation, fraction));
        Pose::from_isometry(&Isometry3::from_parts(Translation3::from(translation), rotation))
    }
}

impl From<Pose> for Isometry3<f64> {
    fn from(pose: Pose) -> Self {
        pose.to_isometry()
    }
}

impl From<&Pose> for Isometry3<f64> {
    fn from(pose: &Pose) -> Self {
        pose.to_isometry()
    }
}

impl From<Isometry3<f64>> for Pose {
    fn from(iso: Isometry3<f64>) -> Self {
        Pose::from_isometry(&iso)
    }
}
