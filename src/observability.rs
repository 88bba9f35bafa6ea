//! 可观测性
//!
//! tracing 初始化：默认 info，RUST_LOG 可覆盖。引擎对每个执行过的步骤
//! 输出一行 JSON 审计日志（event=step_audit）。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 初始化全局 subscriber；进程入口调用一次，重复调用会 panic
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();
}

/// 容忍重复初始化的变体（测试 / 嵌入场景）
pub fn try_init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .try_init();
}
