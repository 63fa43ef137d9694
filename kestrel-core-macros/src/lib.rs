mod attribute_helpers;
mod bean_impl;
mod bean_methods_attr;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

/// Bean 派生宏
///
/// 为类型生成 Bean 元数据并通过 inventory 自动注册。
///
/// 用法：
/// ```ignore
/// #[derive(Bean)]
/// #[bean(name = "app::UserService")]          // 可选：默认为 module_path!()::类型名
/// #[bean(implements(dyn UserRepository))]     // 可选：同时以接口类型注册
/// #[bean(default)]                            // 可选：以 Default::default 作为无参构造函数
/// struct UserService {
///     #[inject]
///     clock: Inject<Clock>,                   // 构造完成后从注册表注入
/// }
/// ```
///
/// 未使用 `default` 时，需要在 impl 块上添加 `#[bean_methods]`，
/// 或手动实现 `BeanMethods`。
#[proc_macro_derive(Bean, attributes(bean, inject))]
#[proc_macro_error]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    bean_impl::derive_bean_impl(input)
}

/// Injectable 派生宏
///
/// 用于不受容器管理、但需要注入 `#[inject]` 字段的对象：
///
/// ```ignore
/// #[derive(Injectable, Default)]
/// struct MainWindow {
///     #[inject]
///     service: Inject<UserService>,
/// }
///
/// let window = MainWindow::default();
/// context.inject_fields(&window);
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
#[proc_macro_error]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    bean_impl::derive_injectable_impl(input)
}

/// Bean 方法属性宏
///
/// 扫描 impl 块：
///
/// - `#[inject]` 标记的关联函数是注入构造函数，参数必须是 `Arc<T>`，
///   返回 `Self` 或 `Result<Self>`，每个类型最多一个；
/// - 未标记的 `fn new() -> Self` 是无参构造函数；
/// - `#[post_construct]` 标记的 `&self` 方法是初始化钩子，
///   返回 `()` 或 `anyhow::Result<()>`，按声明顺序执行。
///
/// ```ignore
/// #[bean_methods]
/// impl UserService {
///     #[inject]
///     pub fn new(repository: Arc<dyn UserRepository>) -> Self {
///         Self { repository, clock: Inject::new() }
///     }
///
///     #[post_construct]
///     fn warm_up(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_attribute]
#[proc_macro_error]
pub fn bean_methods(attr: TokenStream, item: TokenStream) -> TokenStream {
    bean_methods_attr::bean_methods_impl(attr, item)
}
