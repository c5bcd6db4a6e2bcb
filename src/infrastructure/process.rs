//! 外部进程执行器 - 基础设施层
//!
//! 持有子进程这一稀缺资源，只暴露"运行一个外部工具"的能力。
//! Unix 上子进程在独立的进程组中启动：调用方的 future 被丢弃（例如超时）时，
//! 整个进程组（包括工具自己再启动的子进程）会被立即终止。

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::ConvertError;
use crate::utils::logging::truncate_text;

/// 错误信息中保留的最大字符数
const MAX_MESSAGE_CHARS: usize = 600;

/// 外部工具调用
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 运行命令并等待结束，返回 stdout
    ///
    /// - 程序不存在 → `MissingDependency`
    /// - 退出码非 0 → `Failed`，附带 stderr 摘要
    pub async fn run(&self) -> Result<String, ConvertError> {
        debug!("执行命令: {} {:?}", self.program, self.args);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConvertError::missing(&self.program, "未安装或不在 PATH 中"),
            ErrorKind::PermissionDenied => ConvertError::missing(&self.program, "没有执行权限"),
            _ => ConvertError::io(format!("无法启动 {}", self.program), e),
        })?;

        // 等待期间 future 被丢弃时，guard 负责终止整个进程组
        let mut group = ProcessGroupGuard::new(child.id());
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ConvertError::io(format!("等待 {} 结束失败", self.program), e))?;
        group.disarm();

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "信号终止".to_string());
            return Err(ConvertError::failed(
                &self.program,
                format!(
                    "退出码 {}: {}",
                    code,
                    truncate_text(detail, MAX_MESSAGE_CHARS)
                ),
            ));
        }

        Ok(stdout)
    }

    /// 预检：运行一次（通常是 `--version`），任何失败都视为依赖不可用
    pub async fn probe(&self) -> Result<String, ConvertError> {
        match self.run().await {
            Ok(stdout) => Ok(stdout
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()),
            Err(ConvertError::Failed { message, .. }) => {
                Err(ConvertError::missing(&self.program, format!("版本检查失败: {}", message)))
            }
            Err(e) => Err(e),
        }
    }
}

/// 子进程所在的进程组
///
/// 子进程以自己的 pid 作为进程组号启动；guard 在被丢弃前未解除时，
/// 向整个进程组发送 SIGKILL。
struct ProcessGroupGuard {
    #[cfg_attr(not(unix), allow(dead_code))]
    leader: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }

    /// 进程已正常结束，不再需要终止
    fn disarm(&mut self) {
        self.leader = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.leader.take().and_then(|pid| i32::try_from(pid).ok()) {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                Ok(()) => debug!("已终止进程组 {}", pgid),
                Err(e) => debug!("终止进程组 {} 失败: {}", pgid, e),
            }
        }
    }
}

/// 删除未完成的输出文件（尽力而为）
pub async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("已删除未完成的输出: {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => debug!("删除未完成的输出失败 ({}): {}", path.display(), e),
    }
}
