//! 初始化钩子执行

use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;

use crate::error::ContainerError;
use crate::registry::BeanRegistry;
use crate::utils::panic_message;

/// 钩子执行统计
#[derive(Debug, Default)]
pub struct LifecycleSummary {
    /// 成功执行的钩子
    pub invoked: usize,

    /// 返回错误或发生 panic 的钩子
    pub failed: Vec<ContainerError>,
}

/// 按构造顺序执行每个 Bean 的 `#[post_construct]` 钩子
///
/// 必须在所有 Bean 完成构造和字段注入之后调用。
pub struct LifecycleRunner<'a> {
    registry: &'a BeanRegistry,
}

impl<'a> LifecycleRunner<'a> {
    pub fn new(registry: &'a BeanRegistry) -> Self {
        Self { registry }
    }

    /// 每个钩子只执行一次，单个钩子失败不影响其余钩子
    pub fn run_hooks(&self) -> LifecycleSummary {
        let mut summary = LifecycleSummary::default();

        for bean in self.registry.beans() {
            for hook in bean.descriptor().hooks() {
                tracing::debug!("Invoking hook '{}' on bean '{}'", hook.name(), bean.name());

                let result = panic::catch_unwind(AssertUnwindSafe(|| hook.invoke(bean.instance())))
                    .unwrap_or_else(|payload| {
                        Err(anyhow!("hook panicked: {}", panic_message(payload.as_ref())))
                    });

                match result {
                    Ok(()) => summary.invoked += 1,
                    Err(source) => {
                        let error = ContainerError::HookFailed {
                            bean: bean.name().to_string(),
                            hook: hook.name().to_string(),
                            source,
                        };
                        tracing::error!("{}", error);
                        summary.failed.push(error);
                    }
                }
            }
        }

        tracing::info!(
            "Post-construct hooks completed: {} invoked, {} failed",
            summary.invoked,
            summary.failed.len()
        );
        summary
    }
}
