//! 依赖检查
//!
//! 对一个或全部引擎做预检，列出哪些外部工具可用。

use tracing::{error, info};

use crate::config::Config;
use crate::converters::{Converter, Engine};
use crate::models::EngineKind;

/// 单个引擎的检查结果
#[derive(Debug, Clone)]
pub struct EngineCheck {
    pub engine: EngineKind,
    /// 不可用时的原因
    pub problem: Option<String>,
}

impl EngineCheck {
    pub fn is_available(&self) -> bool {
        self.problem.is_none()
    }
}

/// 逐个预检引擎
pub async fn check_engines(config: &Config, kinds: &[EngineKind]) -> Vec<EngineCheck> {
    info!("{}", "=".repeat(60));
    info!("🔍 检查外部依赖");
    info!("{}", "=".repeat(60));

    let mut checks = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let problem = match Engine::build(kind, config) {
            Ok(engine) => engine.probe().await.err().map(|e| e.to_string()),
            Err(e) => Some(e.to_string()),
        };

        match &problem {
            None => info!("✅ {}: 可用", kind),
            Some(reason) => error!("❌ {}: {}", kind, reason),
        }
        checks.push(EngineCheck {
            engine: kind,
            problem,
        });
    }

    let available = checks.iter().filter(|c| c.is_available()).count();
    info!("{}", "=".repeat(60));
    info!("📊 可用引擎: {}/{}", available, checks.len());
    checks
}
