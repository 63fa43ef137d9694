//! 绑定入口
//!
//! 进程启动时调用一次：读取 Bean 名称清单，解析并实例化 Bean，
//! 注入字段，最后执行初始化钩子。任何失败都只记录到 tracing，不会中断绑定。

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::{BeanMetadata, InventoryCatalog};
use crate::config::ContainerConfig;
use crate::error::ContainerError;
use crate::inject::Injectable;
use crate::injector::{InjectionSummary, Injector};
use crate::lifecycle::{LifecycleRunner, LifecycleSummary};
use crate::logging::LoggingConfig;
use crate::registry::BeanRegistry;
use crate::resolver::{DependencyResolver, Resolution};
use crate::source::{BeanNameSource, FileBeanNames};

/// 使用默认的名称来源和元数据目录绑定
pub fn bind(config: ContainerConfig) -> ApplicationContext {
    Binder::new(config).bind()
}

/// 绑定构建器
///
/// 默认从 `config.bean_list` 读取名称清单，从 [`InventoryCatalog`] 查找元数据，
/// 并新建注册表。
///
/// 绑定不防止重复调用，第二次调用会重新构造所有 Bean。
pub struct Binder {
    config: ContainerConfig,
    names: Option<Box<dyn BeanNameSource>>,
    metadata: Option<Arc<dyn BeanMetadata>>,
    registry: Option<Arc<BeanRegistry>>,
    logging: Option<LoggingConfig>,
}

impl Binder {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            names: None,
            metadata: None,
            registry: None,
            logging: None,
        }
    }

    /// 设置 Bean 名称来源
    pub fn names(mut self, source: impl BeanNameSource + 'static) -> Self {
        self.names = Some(Box::new(source));
        self
    }

    /// 设置元数据目录
    pub fn metadata(mut self, metadata: Arc<dyn BeanMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// 使用预先创建的注册表
    ///
    /// 其他线程可以在绑定过程中通过同一个注册表注入非托管对象。
    pub fn registry(mut self, registry: Arc<BeanRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 绑定前安装日志订阅者
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn bind(self) -> ApplicationContext {
        let started = Instant::now();

        if let Some(logging) = self.logging.or_else(|| self.config.logging_config()) {
            if let Err(e) = logging.init() {
                tracing::debug!("Logging not initialized: {}", e);
            }
        }

        let names: Box<dyn BeanNameSource> = match self.names {
            Some(names) => names,
            None => Box::new(FileBeanNames::new(self.config.bean_list.clone())),
        };
        let metadata: Arc<dyn BeanMetadata> = match self.metadata {
            Some(metadata) => metadata,
            None => Arc::new(InventoryCatalog::new()),
        };
        let registry = self.registry.unwrap_or_default();

        // 1. 候选类型
        let names = names.bean_names().unwrap_or_else(|e| {
            tracing::warn!("{}, continuing without candidates", e);
            Vec::new()
        });

        let mut rejected = Vec::new();
        let mut candidates = Vec::with_capacity(names.len());
        for name in names {
            match metadata.describe(&name) {
                Some(descriptor) if descriptor.is_application_scoped() => {
                    candidates.push(descriptor)
                }
                Some(_) => tracing::debug!("Type '{}' is not bean-scoped, skipping", name),
                None => {
                    let error = ContainerError::UnknownBeanType(name);
                    tracing::warn!("{}", error);
                    rejected.push(error);
                }
            }
        }

        // 2. 构造
        let mut resolution = DependencyResolver::new(&registry, self.config.resolution)
            .resolve(candidates);
        rejected.append(&mut resolution.errors);
        resolution.errors = rejected;

        // 3. 字段注入
        let injection = Injector::new(&registry).inject_all();

        // 4. 初始化钩子
        let lifecycle = LifecycleRunner::new(&registry).run_hooks();

        tracing::info!(
            "Bound {} bean(s) in {:?}",
            registry.len(),
            started.elapsed()
        );

        ApplicationContext {
            registry,
            resolution,
            injection,
            lifecycle,
        }
    }
}

/// 绑定结果
#[derive(Debug)]
pub struct ApplicationContext {
    registry: Arc<BeanRegistry>,
    resolution: Resolution,
    injection: InjectionSummary,
    lifecycle: LifecycleSummary,
}

impl ApplicationContext {
    pub fn registry(&self) -> &Arc<BeanRegistry> {
        &self.registry
    }

    /// 按类型（具体类型或接口）获取 Bean
    pub fn get<K: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<K>> {
        self.registry.get::<K>()
    }

    /// 用注册表中的 Bean 填充对象的 `#[inject]` 字段
    ///
    /// 适用于不受容器管理的对象，注册表中不存在的类型保持未设置。
    pub fn inject_fields(&self, target: &dyn Injectable) -> InjectionSummary {
        Injector::new(&self.registry).inject(target)
    }

    /// 被丢弃的 Bean
    pub fn unresolved(&self) -> &[String] {
        &self.resolution.unresolved
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn injection_summary(&self) -> InjectionSummary {
        self.injection
    }

    pub fn lifecycle_summary(&self) -> &LifecycleSummary {
        &self.lifecycle
    }
}
