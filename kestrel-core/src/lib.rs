// kestrel-core: 启动时一次性装配的依赖注入运行时
//
// 提供：
// - 按类型（及其实现的接口）注册的单例 Bean
// - 构造函数注入与字段注入
// - 初始化钩子（post construct）
// - 编译期元数据注册（通过宏）

pub mod bean;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod inject;
pub mod injector;
pub mod key;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod utils;

/// 初始化钩子的返回值：`()` 或 `anyhow::Result<()>`
pub trait IntoResult {
    fn into_result(self) -> anyhow::Result<()>;
}

impl IntoResult for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl IntoResult for anyhow::Result<()> {
    fn into_result(self) -> anyhow::Result<()> {
        self
    }
}

// 重新导出常用类型
pub use bean::{
    Bean, BeanDescriptor, BeanDescriptorBuilder, BeanMethods, ConstructorArgs, ConstructorSpec,
    Hook, InterfaceBinding,
};
pub use catalog::{BeanCatalog, BeanMetadata, BeanRegistration, InventoryCatalog};
pub use config::{ContainerConfig, ResolutionStrategy};
pub use context::{bind, ApplicationContext, Binder};
pub use error::{ContainerError, ContainerResult};
pub use inject::{Inject, InjectSlot, Injectable, InjectionPoint};
pub use injector::{InjectionSummary, Injector};
pub use key::{BeanRef, TypeKey};
pub use lifecycle::{LifecycleRunner, LifecycleSummary};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use registry::{BeanRegistry, RegisteredBean};
pub use resolver::{DependencyResolver, Resolution};
pub use source::{BeanNameSource, CatalogBeanNames, FileBeanNames, StaticBeanNames};

// 导出 anyhow 和 inventory，供宏使用
pub use anyhow;
pub use inventory;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::bean::{Bean, BeanDescriptor, BeanMethods, ConstructorSpec, Hook};
    pub use crate::catalog::{BeanCatalog, BeanMetadata, InventoryCatalog};
    pub use crate::config::{ContainerConfig, ResolutionStrategy};
    pub use crate::context::{ApplicationContext, Binder};
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::inject::{Inject, Injectable};
    pub use crate::logging::LoggingConfig;
    pub use crate::registry::BeanRegistry;
    pub use crate::source::{BeanNameSource, FileBeanNames, StaticBeanNames};

    pub use std::sync::Arc;
}
