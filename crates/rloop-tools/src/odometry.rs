//! # 差速底盘里程计
//!
//! 每个周期输入绝对航向角和左右轮累计位移，增量更新二维位姿：
//!
//! ```text
//! d       = ((left - left_prev) + (right - right_prev)) / 2
//! heading = sensor_heading + offset
//! p'      = p + R(heading) · [d, 0]ᵀ
//! ```
//!
//! 航向直接取自传感器（加上复位时记录的偏置），不从轮速差积分。

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// 二维位姿（米 / 度）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2d {
    pub x: f64,
    pub y: f64,
    pub heading_degrees: f64,
}

impl Pose2d {
    pub const fn new(x: f64, y: f64, heading_degrees: f64) -> Self {
        Self {
            x,
            y,
            heading_degrees,
        }
    }

    /// 原点，航向 0°
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// 到另一位姿的平面距离
    pub fn distance_to(&self, other: &Pose2d) -> f64 {
        (Vector2::new(other.x, other.y) - Vector2::new(self.x, self.y)).norm()
    }
}

/// 里程计积分器
///
/// 位姿只能通过 [`update`](Self::update) 或显式的 [`reset`](Self::reset) 修改。
#[derive(Debug, Clone, Default)]
pub struct OdometryIntegrator {
    pose: Pose2d,
    previous_left: f64,
    previous_right: f64,
    heading_offset_degrees: f64,
}

impl OdometryIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以新的传感器读数推进位姿
    ///
    /// # 参数
    ///
    /// - `heading_degrees`: 航向传感器绝对读数
    /// - `left_position` / `right_position`: 左右轮累计位移（米）
    pub fn update(&mut self, heading_degrees: f64, left_position: f64, right_position: f64) -> Pose2d {
        let delta_left = left_position - self.previous_left;
        let delta_right = right_position - self.previous_right;
        self.previous_left = left_position;
        self.previous_right = right_position;

        let distance = (delta_left + delta_right) / 2.0;
        let heading = heading_degrees + self.heading_offset_degrees;
        let forward = Rotation2::new(heading.to_radians()) * Vector2::new(distance, 0.0);

        self.pose = Pose2d::new(self.pose.x + forward.x, self.pose.y + forward.y, heading);
        self.pose
    }

    /// 覆盖位姿与内部"上一次位移"记忆
    ///
    /// # 参数
    ///
    /// - `pose`: 新位姿
    /// - `heading_degrees`: 复位时刻航向传感器读数（用于计算偏置）
    /// - `left_position` / `right_position`: 复位时刻的轮位移读数
    pub fn reset(&mut self, pose: Pose2d, heading_degrees: f64, left_position: f64, right_position: f64) {
        self.pose = pose;
        self.previous_left = left_position;
        self.previous_right = right_position;
        self.heading_offset_degrees = pose.heading_degrees - heading_degrees;
    }

    /// 当前位姿
    pub fn pose(&self) -> Pose2d {
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn assert_pose_near(actual: Pose2d, expected: Pose2d) {
        assert!(
            (actual.x - expected.x).abs() < EPSILON
                && (actual.y - expected.y).abs() < EPSILON
                && (actual.heading_degrees - expected.heading_degrees).abs() < EPSILON,
            "pose mismatch: {:?} != {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn test_straight_line() {
        let mut odometry = OdometryIntegrator::new();
        odometry.update(0.0, 1.0, 1.0);
        assert_pose_near(odometry.pose(), Pose2d::new(1.0, 0.0, 0.0));

        odometry.update(0.0, 1.5, 1.5);
        assert_pose_near(odometry.pose(), Pose2d::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_heading_rotates_displacement() {
        let mut odometry = OdometryIntegrator::new();
        odometry.update(90.0, 2.0, 2.0);
        assert_pose_near(odometry.pose(), Pose2d::new(0.0, 2.0, 90.0));
    }

    #[test]
    fn test_turn_in_place_keeps_position() {
        let mut odometry = OdometryIntegrator::new();
        odometry.update(45.0, -0.3, 0.3);
        assert_pose_near(odometry.pose(), Pose2d::new(0.0, 0.0, 45.0));
    }

    #[test]
    fn test_reset_overwrites_pose_and_memory() {
        let mut odometry = OdometryIntegrator::new();
        odometry.update(0.0, 3.0, 3.0);

        // 复位时传感器已被重新清零
        odometry.reset(Pose2d::new(5.0, -1.0, 180.0), 180.0, 0.0, 0.0);
        assert_pose_near(odometry.pose(), Pose2d::new(5.0, -1.0, 180.0));

        odometry.update(180.0, 1.0, 1.0);
        assert_pose_near(odometry.pose(), Pose2d::new(4.0, -1.0, 180.0));
    }

    #[test]
    fn test_reset_records_heading_offset() {
        let mut odometry = OdometryIntegrator::new();
        // 传感器读数 30°，但期望位姿航向 90°
        odometry.reset(Pose2d::new(0.0, 0.0, 90.0), 30.0, 0.0, 0.0);
        odometry.update(30.0, 1.0, 1.0);
        assert_pose_near(odometry.pose(), Pose2d::new(0.0, 1.0, 90.0));
    }

    #[test]
    fn test_pose_distance() {
        let a = Pose2d::new(0.0, 0.0, 0.0);
        let b = Pose2d::new(3.0, 4.0, 10.0);
        assert!((a.distance_to(&b) - 5.0).abs() < EPSILON);
    }

    proptest! {
        /// 零位移 + 航向不变 → 位姿不变
        #[test]
        fn zero_delta_is_idempotent(
            heading in -360.0..360.0f64,
            left in -100.0..100.0f64,
            right in -100.0..100.0f64,
        ) {
            let mut odometry = OdometryIntegrator::new();
            let before = odometry.update(heading, left, right);
            let after = odometry.update(heading, left, right);
            prop_assert_eq!(before, after);
        }

        /// 平移距离不超过两侧增量绝对值的均值
        #[test]
        fn displacement_is_bounded(
            heading in -360.0..360.0f64,
            left in -10.0..10.0f64,
            right in -10.0..10.0f64,
        ) {
            let mut odometry = OdometryIntegrator::new();
            let pose = odometry.update(heading, left, right);
            let travelled = Pose2d::identity().distance_to(&pose);
            prop_assert!(travelled <= (left.abs() + right.abs()) / 2.0 + EPSILON);
        }
    }
}
