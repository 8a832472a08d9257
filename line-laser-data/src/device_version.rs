#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Device variant selected by the `version_num` argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceVersion {
    /// N301 time-of-flight LiDAR
    N301Tof = 0,
    /// Line laser with 1 degree angular resolution
    LineLaserOneDegree = 1,
    /// Line laser with 0.5 degree angular resolution
    LineLaserHalfDegree = 2,
}

impl DeviceVersion {
    pub const ALL: [DeviceVersion; 3] = [
        DeviceVersion::N301Tof,
        DeviceVersion::LineLaserOneDegree,
        DeviceVersion::LineLaserHalfDegree,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Angular step between samples in degrees. `None` for the TOF device,
    /// which does not publish a line scan.
    pub fn angular_resolution_degree(self) -> Option<f64> {
        match self {
            DeviceVersion::N301Tof => None,
            DeviceVersion::LineLaserOneDegree => Some(1.0),
            DeviceVersion::LineLaserHalfDegree => Some(0.5),
        }
    }
}

impl TryFrom<u8> for DeviceVersion {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeviceVersion::N301Tof),
            1 => Ok(DeviceVersion::LineLaserOneDegree),
            2 => Ok(DeviceVersion::LineLaserHalfDegree),
            _ => Err(value),
        }
    }
}
