//! 属性解析辅助函数

use proc_macro_error::abort;
use syn::punctuated::Punctuated;
use syn::{Attribute, Field, LitStr, Token, Type};

/// `#[bean(...)]` 中的选项
#[derive(Default)]
pub(crate) struct BeanOptions {
    /// 自定义 Bean 名称，默认为 `module_path!()::Type`
    pub name: Option<String>,
    /// `implements(dyn A, dyn B)`
    pub interfaces: Vec<Type>,
    /// 使用 `Default::default` 作为无参构造函数
    pub use_default: bool,
}

pub(crate) fn parse_bean_options(attrs: &[Attribute]) -> BeanOptions {
    let mut options = BeanOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("bean")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                options.name = Some(name.value());
                Ok(())
            } else if meta.path.is_ident("implements") {
                let content;
                syn::parenthesized!(content in meta.input);
                let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                options.interfaces.extend(types);
                Ok(())
            } else if meta.path.is_ident("default") {
                options.use_default = true;
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`, `implements(...)` or `default`"))
            }
        });

        if let Err(e) = result {
            abort!(e.span(), "{}", e);
        }
    }

    options
}

/// 是否带有指定名称的属性
pub(crate) fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// 去掉指定名称的属性
pub(crate) fn strip_attrs(attrs: &mut Vec<Attribute>, names: &[&str]) {
    attrs.retain(|attr| !names.iter().any(|name| attr.path().is_ident(name)));
}

/// 从 `Wrapper<T>` 中提取 `T`，外层类型名不符时返回 `None`
pub(crate) fn extract_wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == wrapper {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_ty)) = args.args.first() {
                        return Some(inner_ty);
                    }
                }
            }
        }
    }
    None
}

/// 检测类型是否为 `Result<..>`
pub(crate) fn is_result_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Result";
        }
    }
    false
}

/// 收集 `#[inject]` 字段，字段类型必须是 `Inject<T>`
pub(crate) fn inject_fields(fields: &[&Field]) -> Vec<syn::Ident> {
    fields
        .iter()
        .filter(|field| has_attr(&field.attrs, "inject"))
        .map(|field| {
            let Some(ident) = field.ident.clone() else {
                abort!(field, "#[inject] is only supported on named fields");
            };

            if extract_wrapped_type(&field.ty, "Inject").is_none() {
                abort!(
                    field.ty,
                    "#[inject] field '{}' must be declared as Inject<T>",
                    ident;
                    help = "Inject<T> is filled from the bean registry after construction"
                );
            }

            ident
        })
        .collect()
}
