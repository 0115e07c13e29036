//! 运行期配置变更
//!
//! 变更只在 Disabled 阶段生效；启用期间到达的变更在下一次进入 Disabled 时同步。

mod common;

use common::Harness;
use rloop_control::RobotConfig;
use rloop_driver::{GameMode, NeutralMode, VisionMode, ids};
use std::thread;

fn brake_when_disabled() -> RobotConfig {
    RobotConfig {
        coast_drive_when_disabled: false,
        enable_vision_when_disabled: true,
        vision_pipeline_when_disabled: 2,
        ..Default::default()
    }
}

#[test]
fn test_change_applied_while_disabled() {
    let mut harness = Harness::new();
    harness.tick();
    assert_eq!(
        harness.robot.hardware().neutral_mode(ids::DRIVE_LEFT),
        Some(NeutralMode::Coast)
    );

    harness.store.update(brake_when_disabled()).unwrap();
    // 信号转交：下一周期开始时从存储同步
    assert!(harness.robot.config().coast_drive_when_disabled);
    harness.tick();

    assert!(!harness.robot.config().coast_drive_when_disabled);
    assert_eq!(
        harness.robot.hardware().neutral_mode(ids::DRIVE_LEFT),
        Some(NeutralMode::Brake)
    );
    assert_eq!(harness.robot.hardware().vision(), (VisionMode::Vision, 2));
}

#[test]
fn test_burst_of_changes_settles_on_latest() {
    let mut harness = Harness::new();
    harness.tick();

    for pipeline in 1..=6 {
        harness
            .store
            .update(RobotConfig {
                vision_pipeline_when_disabled: pipeline,
                ..Default::default()
            })
            .unwrap();
    }
    harness.tick();

    assert_eq!(harness.robot.config().vision_pipeline_when_disabled, 6);
    assert_eq!(harness.robot.hardware().vision(), (VisionMode::Driver, 6));
}

#[test]
fn test_change_deferred_while_enabled() {
    let mut harness = Harness::new();
    harness.enable(GameMode::Teleop);
    harness.tick();

    harness.store.update(brake_when_disabled()).unwrap();
    harness.tick_n(3);
    assert!(harness.robot.config().coast_drive_when_disabled);
    assert_eq!(
        harness.robot.hardware().neutral_mode(ids::DRIVE_LEFT),
        Some(NeutralMode::Brake)
    );

    harness.disable();
    harness.tick();
    assert!(!harness.robot.config().coast_drive_when_disabled);
    assert_eq!(
        harness.robot.hardware().neutral_mode(ids::DRIVE_LEFT),
        Some(NeutralMode::Brake)
    );
    assert_eq!(harness.robot.hardware().vision(), (VisionMode::Vision, 2));
}

#[test]
fn test_change_from_another_thread() {
    let mut harness = Harness::new();
    let store = harness.store.clone();

    thread::spawn(move || store.update(brake_when_disabled()))
        .join()
        .unwrap()
        .unwrap();

    harness.tick();
    assert!(!harness.robot.config().coast_drive_when_disabled);
}

#[test]
fn test_invalid_change_rejected() {
    let mut harness = Harness::new();
    let invalid = RobotConfig {
        loop_period_ms: 0,
        ..Default::default()
    };
    assert!(harness.store.update(invalid).is_err());

    harness.tick();
    assert_eq!(harness.robot.config(), &RobotConfig::default());
}

#[test]
fn test_subsystem_list_fixed_at_setup() {
    let mut harness = Harness::new();
    let drive_only = RobotConfig {
        enabled_subsystems: vec!["drive".to_string()],
        ..Default::default()
    };
    harness.store.update(drive_only).unwrap();
    harness.tick();

    assert_eq!(harness.robot.config().enabled_subsystems, vec!["drive"]);
    assert_eq!(
        harness.robot.subsystem_names(),
        vec!["drive", "intake", "shooter"]
    );
}

#[test]
fn test_subscription_released_on_drop() {
    let harness = Harness::new();
    let store = harness.store.clone();
    assert_eq!(store.listener_count(), 1);

    drop(harness);
    assert_eq!(store.listener_count(), 0);
    // 无订阅者时更新仍然成功
    store.update(brake_when_disabled()).unwrap();
}

#[test]
fn test_subscription_released_on_shutdown() {
    let mut harness = Harness::new();
    harness.robot.shutdown();
    assert!(!harness.robot.is_subscribed());
    assert_eq!(harness.store.listener_count(), 0);

    harness.store.update(brake_when_disabled()).unwrap();
    harness.tick();
    assert!(harness.robot.config().coast_drive_when_disabled);
}
