//! # rloop Sim
//!
//! 在模拟硬件上运行控制循环。
//!
//! ```bash
//! # 禁用 0.5 s 后进入自主阶段，运行 10 s
//! rloop-sim --auto drive_forward --mode auto --seconds 10
//!
//! # 查看自主例程结构
//! rloop-sim --auto shoot_then_drive --print-auto
//!
//! # 遥控：固定油门
//! rloop-sim --mode teleop --throttle 0.5 --seconds 3
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rloop_control::{
    AUTO_NAMES, ConfigStore, LoopConfig, Robot, RobotConfig, RobotState, RoutineNode,
    auto_by_name, run_loop,
};
use rloop_driver::{DriverStationState, GameMode, MockHardware, OperatorInputs};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Disabled,
    Auto,
    Teleop,
    Test,
}

/// 在模拟硬件上运行控制循环
#[derive(Parser, Debug)]
#[command(name = "rloop-sim")]
#[command(version)]
struct Args {
    /// 配置文件（TOML）；缺省使用内置默认配置
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 自主例程名称
    #[arg(short, long, default_value = "none")]
    auto: String,

    /// 启用后的比赛阶段
    #[arg(short, long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// 启用前保持禁用的周期数
    #[arg(long, default_value_t = 25)]
    disabled_ticks: u64,

    /// 运行时长（秒）；缺省运行到 Ctrl+C
    #[arg(short, long)]
    seconds: Option<f64>,

    /// 遥控阶段的固定油门
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    throttle: f64,

    /// 打印自主例程结构后退出
    #[arg(long)]
    print_auto: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rloop_sim=info".parse()?)
                .add_directive("rloop_control=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RobotConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RobotConfig::default(),
    };

    let Some(auto) = auto_by_name(&args.auto) else {
        bail!(
            "unknown auto '{}', expected one of: {}",
            args.auto,
            AUTO_NAMES.join(", ")
        );
    };

    if args.print_auto {
        print_routine(&auto.routine(&RobotState::new()));
        return Ok(());
    }

    let mut loop_config = LoopConfig::from_robot_config(&config);
    if let Some(seconds) = args.seconds {
        if seconds <= 0.0 {
            bail!("--seconds must be > 0");
        }
        let ticks = (seconds / loop_config.period.as_secs_f64()).ceil() as u64;
        loop_config.max_iterations = Some(ticks);
    }

    let store = ConfigStore::new(config);
    let mut robot = Robot::new(MockHardware::new(), store, auto)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_for_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        stop_for_handler.store(true, Ordering::Release);
    })
    .context("failed to set signal handler")?;

    let enabled = driver_station(args.mode);
    let inputs = OperatorInputs {
        drive_throttle: args.throttle,
        ..Default::default()
    };
    let period = loop_config.period;

    let summary = run_loop(&mut robot, &loop_config, &stop, |robot, _report| {
        if robot.tick_count() == args.disabled_ticks.max(1) {
            info!("Enabling: {:?}", args.mode);
            let hardware = robot.hardware_mut();
            hardware.set_driver_station(enabled);
            hardware.set_operator_inputs(inputs);
        }
        robot.hardware_mut().step(period);
    })?;

    let pose = robot.state().drive_pose();
    println!(
        "{} ticks, {} overruns ({} missed deadlines), max tick {:?}",
        summary.iterations, summary.overruns, summary.missed_deadlines, summary.max_elapsed
    );
    println!(
        "final pose: x={:.3} m, y={:.3} m, heading={:.1}°",
        pose.x, pose.y, pose.heading_degrees
    );
    Ok(())
}

fn driver_station(mode: Mode) -> DriverStationState {
    match mode {
        Mode::Disabled => DriverStationState::disabled(),
        Mode::Auto => DriverStationState::enabled(GameMode::Auto),
        Mode::Teleop => DriverStationState::enabled(GameMode::Teleop),
        Mode::Test => DriverStationState::enabled(GameMode::Test),
    }
}

fn print_routine(root: &RoutineNode) {
    root.walk(&mut |node, depth| {
        let indent = "  ".repeat(depth);
        match node.waypoint() {
            Some(pose) => println!(
                "{}{} -> ({:.2}, {:.2}, {:.1}°)",
                indent, node.name(), pose.x, pose.y, pose.heading_degrees
            ),
            None => println!("{}{}", indent, node.name()),
        }
    });
}
