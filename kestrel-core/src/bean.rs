use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;

use crate::error::{ContainerError, ContainerResult};
use crate::inject::Injectable;
use crate::key::{BeanRef, TypeKey};
use crate::IntoResult;

/// 构造函数工厂：接收已解析的参数，返回新实例
pub type BeanFactoryFn = Box<dyn Fn(&[BeanRef]) -> anyhow::Result<BeanRef> + Send + Sync>;

/// 初始化钩子调用器
pub type HookFn = Box<dyn Fn(&BeanRef) -> anyhow::Result<()> + Send + Sync>;

/// 接口转换器：把具体类型的 `Arc<T>` 转换为 `Arc<dyn Trait>`
pub type UpcastFn = Box<dyn Fn(&BeanRef) -> Option<BeanRef> + Send + Sync>;

type InjectableFn = Box<dyn Fn(&BeanRef) -> Option<Arc<dyn Injectable>> + Send + Sync>;

/// 构造函数参数
///
/// 参数顺序与 [`ConstructorSpec::parameters`] 一致。
pub struct ConstructorArgs<'a> {
    args: &'a [BeanRef],
}

impl<'a> ConstructorArgs<'a> {
    pub fn new(args: &'a [BeanRef]) -> Self {
        Self { args }
    }

    /// 取第 `index` 个参数
    pub fn get<K: ?Sized + 'static>(&self, index: usize) -> anyhow::Result<Arc<K>> {
        let arg = self
            .args
            .get(index)
            .ok_or_else(|| anyhow!("missing constructor argument #{}", index))?;
        arg.downcast::<K>().ok_or_else(|| {
            anyhow!(
                "constructor argument #{} is {}, expected {}",
                index,
                arg.type_name(),
                std::any::type_name::<K>()
            )
        })
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// 构造函数描述
pub struct ConstructorSpec {
    name: &'static str,
    inject: bool,
    parameters: Vec<TypeKey>,
    factory: BeanFactoryFn,
}

impl ConstructorSpec {
    /// 无参构造函数
    pub fn no_args<T, F>(name: &'static str, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            inject: false,
            parameters: Vec::new(),
            factory: Box::new(move |_: &[BeanRef]| Ok(BeanRef::new(Arc::new(factory()?)))),
        }
    }

    /// `#[inject]` 构造函数
    pub fn injected<T, F>(name: &'static str, parameters: Vec<TypeKey>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ConstructorArgs<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            inject: true,
            parameters,
            factory: Box::new(move |args: &[BeanRef]| {
                let bean = factory(&ConstructorArgs::new(args))?;
                Ok(BeanRef::new(Arc::new(bean)))
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_inject(&self) -> bool {
        self.inject
    }

    pub fn parameters(&self) -> &[TypeKey] {
        &self.parameters
    }

    /// 是否直接依赖指定类型
    pub fn depends_on(&self, key: &TypeKey) -> bool {
        self.parameters.contains(key)
    }

    pub fn invoke(&self, args: &[BeanRef]) -> anyhow::Result<BeanRef> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("name", &self.name)
            .field("inject", &self.inject)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// 初始化钩子（`#[post_construct]`）
pub struct Hook {
    name: &'static str,
    invoke: HookFn,
}

impl Hook {
    pub fn new<T, R, F>(name: &'static str, hook: F) -> Self
    where
        T: Send + Sync + 'static,
        R: IntoResult,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Self {
            name,
            invoke: Box::new(move |bean: &BeanRef| {
                let bean = bean.downcast::<T>().ok_or_else(|| {
                    anyhow!(
                        "hook target is {}, expected {}",
                        bean.type_name(),
                        std::any::type_name::<T>()
                    )
                })?;
                hook(&bean).into_result()
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn invoke(&self, bean: &BeanRef) -> anyhow::Result<()> {
        (self.invoke)(bean)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish()
    }
}

/// Bean 实现的接口
pub struct InterfaceBinding {
    key: TypeKey,
    upcast: UpcastFn,
}

impl InterfaceBinding {
    pub fn new<T, I>(upcast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<I>(),
            upcast: Box::new(move |bean: &BeanRef| {
                bean.downcast::<T>().map(|b| BeanRef::new(upcast(b)))
            }),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn upcast(&self, bean: &BeanRef) -> Option<BeanRef> {
        (self.upcast)(bean)
    }
}

impl fmt::Debug for InterfaceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceBinding")
            .field("key", &self.key)
            .finish()
    }
}

/// Bean 元数据
///
/// 描述一个可实例化的类型：构造函数、实现的接口、可注入字段和初始化钩子。
/// 解析器只依赖这份描述，不关心它是由宏生成还是手工构建的。
pub struct BeanDescriptor {
    name: String,
    key: TypeKey,
    application_scoped: bool,
    constructors: Vec<ConstructorSpec>,
    interfaces: Vec<InterfaceBinding>,
    hooks: Vec<Hook>,
    injectable: InjectableFn,
}

impl BeanDescriptor {
    pub fn builder<T: Injectable>(name: impl Into<String>) -> BeanDescriptorBuilder {
        BeanDescriptorBuilder::new::<T>(name.into())
    }

    /// 根据 [`Bean`] 实现生成描述
    pub fn of<T: Bean>() -> Self {
        Self::builder::<T>(T::bean_name())
            .constructors(T::constructors())
            .interfaces(T::interfaces())
            .hooks(T::hooks())
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn is_application_scoped(&self) -> bool {
        self.application_scoped
    }

    pub fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    pub fn interfaces(&self) -> &[InterfaceBinding] {
        &self.interfaces
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// 选择用于实例化的构造函数
    ///
    /// 最多一个 `#[inject]` 构造函数；没有时使用无参构造函数。
    pub fn select_constructor(&self) -> ContainerResult<&ConstructorSpec> {
        self.constructor_index().map(|index| &self.constructors[index])
    }

    /// 所选构造函数在 [`constructors`](Self::constructors) 中的下标
    pub fn constructor_index(&self) -> ContainerResult<usize> {
        let marked: Vec<usize> = self
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_inject())
            .map(|(index, _)| index)
            .collect();

        match marked.len() {
            0 => self
                .constructors
                .iter()
                .position(|c| c.parameters().is_empty())
                .ok_or_else(|| ContainerError::NoDefaultConstructor(self.name.clone())),
            1 => Ok(marked[0]),
            count => Err(ContainerError::MultipleInjectConstructors {
                bean: self.name.clone(),
                count,
            }),
        }
    }

    /// 是否以指定类型注册（具体类型或实现的接口）
    pub fn provides(&self, key: &TypeKey) -> bool {
        self.key == *key || self.interfaces.iter().any(|binding| binding.key() == *key)
    }

    /// 以 [`Injectable`] 视图访问实例
    pub fn as_injectable(&self, bean: &BeanRef) -> Option<Arc<dyn Injectable>> {
        (self.injectable)(bean)
    }
}

impl fmt::Debug for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescriptor")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("application_scoped", &self.application_scoped)
            .field("constructors", &self.constructors)
            .field("interfaces", &self.interfaces)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// [`BeanDescriptor`] 构建器
pub struct BeanDescriptorBuilder {
    descriptor: BeanDescriptor,
}

impl BeanDescriptorBuilder {
    fn new<T: Injectable>(name: String) -> Self {
        Self {
            descriptor: BeanDescriptor {
                name,
                key: TypeKey::of::<T>(),
                application_scoped: true,
                constructors: Vec::new(),
                interfaces: Vec::new(),
                hooks: Vec::new(),
                injectable: Box::new(|bean: &BeanRef| {
                    bean.downcast::<T>().map(|b| b as Arc<dyn Injectable>)
                }),
            },
        }
    }

    /// 设置是否带有 Bean 作用域标记，未标记的类型不会被实例化
    pub fn application_scoped(mut self, scoped: bool) -> Self {
        self.descriptor.application_scoped = scoped;
        self
    }

    pub fn constructor(mut self, constructor: ConstructorSpec) -> Self {
        self.descriptor.constructors.push(constructor);
        self
    }

    pub fn constructors(mut self, constructors: Vec<ConstructorSpec>) -> Self {
        self.descriptor.constructors.extend(constructors);
        self
    }

    pub fn interface(mut self, binding: InterfaceBinding) -> Self {
        self.descriptor.interfaces.push(binding);
        self
    }

    pub fn interfaces(mut self, bindings: Vec<InterfaceBinding>) -> Self {
        self.descriptor.interfaces.extend(bindings);
        self
    }

    pub fn hook(mut self, hook: Hook) -> Self {
        self.descriptor.hooks.push(hook);
        self
    }

    pub fn hooks(mut self, hooks: Vec<Hook>) -> Self {
        self.descriptor.hooks.extend(hooks);
        self
    }

    pub fn build(self) -> BeanDescriptor {
        self.descriptor
    }
}

/// 构造函数和初始化钩子
///
/// 通过 `#[bean_methods]` 属性宏自动实现，也可以手写。
pub trait BeanMethods: Injectable + Sized {
    fn constructors() -> Vec<ConstructorSpec> {
        Vec::new()
    }

    fn hooks() -> Vec<Hook> {
        Vec::new()
    }
}

/// 带有 Bean 作用域标记的类型
///
/// 通过 `#[derive(Bean)]` 自动实现
pub trait Bean: BeanMethods {
    /// 完整类型名，与 Bean 名称清单中的行对应
    fn bean_name() -> &'static str;

    fn interfaces() -> Vec<InterfaceBinding> {
        Vec::new()
    }
}
