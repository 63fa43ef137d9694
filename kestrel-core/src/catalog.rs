//! Bean 元数据目录
//!
//! 根据 Bean 名称清单中的类型名查找 [`BeanDescriptor`]。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::BeanDescriptor;

/// 元数据来源
///
/// 相当于"根据类型名加载类型"的能力，解析器只通过这个 trait 获取元数据。
pub trait BeanMetadata: Send + Sync {
    /// 按完整类型名查找描述
    fn describe(&self, name: &str) -> Option<Arc<BeanDescriptor>>;

    /// 目录中的所有类型名
    fn names(&self) -> Vec<String>;
}

/// 手工注册的元数据目录
///
/// 适合测试和不依赖自动扫描的应用。
#[derive(Debug, Default)]
pub struct BeanCatalog {
    descriptors: RwLock<HashMap<String, Arc<BeanDescriptor>>>,
    order: RwLock<Vec<String>>,
}

impl BeanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册描述，同名描述会被替换
    pub fn register(&self, descriptor: BeanDescriptor) -> &Self {
        let name = descriptor.name().to_string();
        let previous = self
            .descriptors
            .write()
            .insert(name.clone(), Arc::new(descriptor));

        if previous.is_none() {
            self.order.write().push(name);
        } else {
            tracing::debug!("Descriptor for '{}' replaced", name);
        }
        self
    }

    pub fn with(self, descriptor: BeanDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.order.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.read().is_empty()
    }
}

impl BeanMetadata for BeanCatalog {
    fn describe(&self, name: &str) -> Option<Arc<BeanDescriptor>> {
        self.descriptors.read().get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.order.read().clone()
    }
}

/// `#[derive(Bean)]` 提交到 inventory 的注册项
pub struct BeanRegistration {
    pub name: &'static str,
    pub describe: fn() -> BeanDescriptor,
}

inventory::collect!(BeanRegistration);

/// 编译期注册表
///
/// 收集所有通过 `#[derive(Bean)]` 声明的类型。
pub struct InventoryCatalog {
    catalog: BeanCatalog,
}

impl InventoryCatalog {
    pub fn new() -> Self {
        let catalog = BeanCatalog::new();
        let mut total = 0usize;

        for registration in inventory::iter::<BeanRegistration> {
            tracing::trace!("Collected bean registration '{}'", registration.name);
            catalog.register((registration.describe)());
            total += 1;
        }

        tracing::debug!("Collected {} bean registration(s)", total);
        Self { catalog }
    }
}

impl Default for InventoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanMetadata for InventoryCatalog {
    fn describe(&self, name: &str) -> Option<Arc<BeanDescriptor>> {
        self.catalog.describe(name)
    }

    fn names(&self) -> Vec<String> {
        self.catalog.names()
    }
}
