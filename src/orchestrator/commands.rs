//! 子命令执行与退出码
//!
//! - 0：全部成功
//! - 1：运行完成但有任务失败（或引擎不可用）
//! - 2：配置错误、源目录不存在等致命错误

use anyhow::Result;
use tracing::error;

use crate::cli::{CheckArgs, Cli, Command, ConvertArgs, MergeArgs};
use crate::orchestrator::{check_engines, run_merge, App};
use crate::utils::logging;

/// 致命错误的退出码
pub const EXIT_FATAL: u8 = 2;

/// 执行解析好的命令行
pub async fn run_command(cli: Cli) -> Result<u8> {
    match cli.command {
        Command::Convert(args) => convert(args).await,
        Command::Merge(args) => merge(args).await,
        Command::Check(args) => check(args).await,
    }
}

/// 把命令的结果映射为进程退出码，致命错误在这里记录
pub fn exit_code(outcome: &Result<u8>) -> u8 {
    match outcome {
        Ok(code) => *code,
        Err(e) => {
            // 配置加载失败时日志可能还没初始化
            logging::init(false);
            error!("❌ {:#}", e);
            EXIT_FATAL
        }
    }
}

async fn convert(args: ConvertArgs) -> Result<u8> {
    let config = args.resolve()?;
    logging::init(config.verbose);

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;
    println!("{}", report);

    Ok(report.exit_code())
}

async fn merge(args: MergeArgs) -> Result<u8> {
    let config = args.common.load_config()?;
    logging::init(config.verbose);

    let request = args.request(&config);
    let result = run_merge(&config, &request).await?;

    Ok(if result.is_success() { 0 } else { 1 })
}

async fn check(args: CheckArgs) -> Result<u8> {
    let config = args.common.load_config()?;
    logging::init(config.verbose);

    let checks = check_engines(&config, &args.engines(&config)).await;
    for check in &checks {
        match &check.problem {
            None => println!("✅ {}", check.engine),
            Some(reason) => println!("❌ {}: {}", check.engine, reason),
        }
    }

    Ok(if checks.iter().all(|c| c.is_available()) { 0 } else { 1 })
}
