use crate::error::{Error, Result};

/// Number of joints in the target skeleton layout.
pub const TARGET_JOINTS: usize = 13;

/// 2D joint position in source camera pixel units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub x: f64,
    pub y: f64,
}

/// 13-joint skeleton in the target layout:
/// head, shoulder R/L, elbow R/L, wrist R/L, hip R/L, knee R/L, ankle R/L.
///
/// Shoulders sit at indices 1..3 and hips at 7..9, the slices the bounding
/// box and torso helpers consume.
pub type Skeleton13 = [Joint; TARGET_JOINTS];

/// One skeleton sample from the fixed-rate ground-truth stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkeletonSample {
    pub joints: Skeleton13,
    pub timestamp: f64,
}

/// Source indices for each target joint, H36M 32-joint layout.
///
/// Order matches `Skeleton13`: head, shoulderR, shoulderL, elbowR, elbowL,
/// wristR, wristL, hipR, hipL, kneeR, kneeL, ankleR, ankleL.
const H36M_32_TO_TARGET: [usize; TARGET_JOINTS] = [15, 25, 17, 26, 18, 27, 19, 1, 6, 2, 7, 3, 8];

/// Source indices for each target joint, H36M 17-joint layout.
const H36M_17_TO_TARGET: [usize; TARGET_JOINTS] = [10, 14, 11, 15, 12, 16, 13, 1, 4, 2, 5, 3, 6];

/// Remap an H36M-layout pose to the 13-joint target layout.
///
/// The correspondence tables are total over the target layout; the lookup is
/// pure and preserves joint ordering. Source poses must carry either 17 or
/// 32 joints.
pub fn h36m_to_target(source: &[Joint]) -> Result<Skeleton13> {
    let table: &[usize; TARGET_JOINTS] = match source.len() {
        32 => &H36M_32_TO_TARGET,
        17 => &H36M_17_TO_TARGET,
        n => {
            return Err(Error::invalid_parameter(format!(
                "expected 17 or 32 source joints, got {}",
                n
            )))
        }
    };
    let mut out = [Joint::default(); TARGET_JOINTS];
    for (dst, &src) in out.iter_mut().zip(table.iter()) {
        *dst = source[src];
    }
    Ok(out)
}

/// Flatten a pose to normalized keypoints `[x/w, y/h, 2, ...]`.
///
/// The trailing 2 per joint is the visibility flag expected by the training
/// consumer (labeled and visible).
pub fn normalized_keypoints(pose: &Skeleton13, frame_width: u32, frame_height: u32) -> Vec<f64> {
    let w = frame_width as f64;
    let h = frame_height as f64;
    let mut keypoints = Vec::with_capacity(TARGET_JOINTS * 3);
    for j in pose {
        keypoints.push(j.x / w);
        keypoints.push(j.y / h);
        keypoints.push(2.0);
    }
    keypoints
}

/// Normalized center of the pose bounding box: mean of min/max per axis.
pub fn normalized_center(pose: &Skeleton13, frame_width: u32, frame_height: u32) -> [f64; 2] {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for j in pose {
        x_min = x_min.min(j.x);
        x_max = x_max.max(j.x);
        y_min = y_min.min(j.y);
        y_max = y_max.max(j.y);
    }
    [
        (x_min + x_max) / 2.0 / frame_width as f64,
        (y_min + y_max) / 2.0 / frame_height as f64,
    ]
}
