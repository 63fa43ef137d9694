//! 字段注入
//!
//! `#[inject]` 字段必须是 [`Inject<T>`]。Bean 以 `Arc` 共享，
//! 字段写入通过内部的读写锁完成，写锁只在单次赋值期间持有。

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ContainerError, ContainerResult};
use crate::key::{BeanRef, TypeKey};

/// 可注入字段
pub struct Inject<T: ?Sized> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> Inject<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// 字段要求的类型
    pub fn key() -> TypeKey {
        TypeKey::of::<T>()
    }

    /// 获取已注入的值，未注入时返回 `None`
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn set(&self, value: Arc<T>) {
        *self.slot.write() = Some(value);
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("set", &self.slot.read().is_some())
            .finish()
    }
}

/// 类型擦除后的字段槽
pub trait InjectSlot: Send + Sync {
    /// 用注册表中的实例填充字段
    fn fill(&self, bean: &BeanRef) -> ContainerResult<()>;
}

impl<T: ?Sized + Send + Sync + 'static> InjectSlot for Inject<T> {
    fn fill(&self, bean: &BeanRef) -> ContainerResult<()> {
        let value = bean
            .downcast::<T>()
            .ok_or_else(|| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: bean.type_name().to_string(),
            })?;
        self.set(value);
        Ok(())
    }
}

/// 一个待注入的字段
pub struct InjectionPoint<'a> {
    pub field: &'static str,
    pub key: TypeKey,
    pub slot: &'a dyn InjectSlot,
}

impl<'a> InjectionPoint<'a> {
    pub fn new<T: ?Sized + Send + Sync + 'static>(field: &'static str, slot: &'a Inject<T>) -> Self {
        Self {
            field,
            key: Inject::<T>::key(),
            slot,
        }
    }
}

impl fmt::Debug for InjectionPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("key", &self.key)
            .finish()
    }
}

/// 拥有 `#[inject]` 字段的类型
///
/// 通过 `#[derive(Bean)]` 或 `#[derive(Injectable)]` 自动实现。
/// 非托管对象也可以实现此 trait，然后调用
/// [`ApplicationContext::inject_fields`](crate::ApplicationContext::inject_fields)。
pub trait Injectable: Send + Sync + 'static {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        Vec::new()
    }
}
