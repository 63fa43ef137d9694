//! Bean 注册表
//!
//! 类型（具体类型及其实现的接口）到单例实例的映射。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::BeanDescriptor;
use crate::error::{ContainerError, ContainerResult};
use crate::key::{BeanRef, TypeKey};

/// 已注册的 Bean
#[derive(Clone)]
pub struct RegisteredBean {
    descriptor: Arc<BeanDescriptor>,
    instance: BeanRef,
}

impl RegisteredBean {
    pub fn descriptor(&self) -> &Arc<BeanDescriptor> {
        &self.descriptor
    }

    pub fn instance(&self) -> &BeanRef {
        &self.instance
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

impl fmt::Debug for RegisteredBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredBean")
            .field("name", &self.descriptor.name())
            .finish()
    }
}

/// Bean 注册表
///
/// 单个键的读写由读写锁保护，可在构造过程中被其他线程并发读取。
/// 同一个接口被多个 Bean 实现时，后注册的实例覆盖先注册的实例。
pub struct BeanRegistry {
    /// 类型到实例的映射
    beans: RwLock<HashMap<TypeKey, BeanRef>>,

    /// 按构造顺序排列的 Bean
    registered: RwLock<Vec<RegisteredBean>>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self {
            beans: RwLock::new(HashMap::new()),
            registered: RwLock::new(Vec::new()),
        }
    }

    /// 注册实例
    ///
    /// 以具体类型以及描述中声明的每个接口为键。
    pub fn put(&self, descriptor: &Arc<BeanDescriptor>, instance: BeanRef) -> ContainerResult<()> {
        let key = descriptor.key();

        let mut aliases = Vec::with_capacity(descriptor.interfaces().len());
        for binding in descriptor.interfaces() {
            match binding.upcast(&instance) {
                Some(upcast) => aliases.push((binding.key(), upcast)),
                None => tracing::warn!(
                    "Bean '{}' cannot be viewed as [{}], interface mapping skipped",
                    descriptor.name(),
                    binding.key()
                ),
            }
        }

        {
            let mut beans = self.beans.write();
            if beans.contains_key(&key) {
                return Err(ContainerError::BeanAlreadyRegistered(
                    descriptor.name().to_string(),
                ));
            }

            beans.insert(key, instance.clone());
            for (interface, upcast) in aliases {
                if beans.insert(interface, upcast).is_some() {
                    tracing::debug!(
                        "Interface [{}] now resolves to bean '{}'",
                        interface,
                        descriptor.name()
                    );
                }
            }
        }

        self.registered.write().push(RegisteredBean {
            descriptor: Arc::clone(descriptor),
            instance,
        });

        tracing::debug!("Bean '{}' registered", descriptor.name());
        Ok(())
    }

    /// 按类型获取 Bean
    pub fn get<K: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<K>> {
        self.get_ref(&TypeKey::of::<K>())
            .and_then(|bean| bean.downcast::<K>())
    }

    pub fn get_ref(&self, key: &TypeKey) -> Option<BeanRef> {
        self.beans.read().get(key).cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.beans.read().contains_key(key)
    }

    pub fn contains_type<K: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeKey::of::<K>())
    }

    /// 已注册的 Bean 数量（别名不重复计数）
    pub fn len(&self) -> usize {
        self.registered.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.read().is_empty()
    }

    /// 按构造顺序返回 Bean 名称
    pub fn bean_names(&self) -> Vec<String> {
        self.registered
            .read()
            .iter()
            .map(|bean| bean.name().to_string())
            .collect()
    }

    /// 按构造顺序返回已注册 Bean 的快照
    pub fn beans(&self) -> Vec<RegisteredBean> {
        self.registered.read().clone()
    }
}

impl Default for BeanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanRegistry")
            .field("beans", &self.bean_names())
            .field("keys", &self.beans.read().len())
            .finish()
    }
}
