use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 类型标识
///
/// 注册表的键。具体类型和接口（`dyn Trait`）都用 `TypeId` 区分，
/// 类型名称只用于日志和错误信息。
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除后的 Bean 引用
///
/// 内部保存的是注册键对应的 `Arc<K>`，`K` 可以是具体类型也可以是
/// `dyn Trait`。同一个 Bean 的所有别名指向同一块内存。
#[derive(Clone)]
pub struct BeanRef {
    handle: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl BeanRef {
    pub fn new<K>(bean: Arc<K>) -> Self
    where
        K: ?Sized + Send + Sync + 'static,
    {
        Self {
            handle: Arc::new(bean),
            type_name: std::any::type_name::<K>(),
        }
    }

    /// 取出 `Arc<K>`，类型不符时返回 `None`
    pub fn downcast<K: ?Sized + 'static>(&self) -> Option<Arc<K>> {
        self.handle.downcast_ref::<Arc<K>>().cloned()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for BeanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanRef")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Widget;

    impl Named for Widget {
        fn name(&self) -> &str {
            "widget"
        }
    }

    #[test]
    fn test_type_key_equality_ignores_name() {
        assert_eq!(TypeKey::of::<Widget>(), TypeKey::of::<Widget>());
        assert_ne!(TypeKey::of::<Widget>(), TypeKey::of::<dyn Named>());
        assert!(TypeKey::of::<Widget>().name().ends_with("Widget"));
    }

    #[test]
    fn test_bean_ref_downcast() {
        let widget = Arc::new(Widget);
        let concrete = BeanRef::new(Arc::clone(&widget));
        let named = BeanRef::new(Arc::clone(&widget) as Arc<dyn Named>);

        assert!(concrete.downcast::<Widget>().is_some());
        assert!(concrete.downcast::<dyn Named>().is_none());

        let as_named = named.downcast::<dyn Named>().unwrap();
        assert_eq!(as_named.name(), "widget");
        assert_eq!(
            Arc::as_ptr(&as_named) as *const u8,
            Arc::as_ptr(&widget) as *const u8
        );
    }
}
