//! `#[bean_methods]` 属性宏实现
//!
//! 扫描 impl 块中的构造函数和初始化钩子，生成 `BeanMethods` 实现。

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::quote;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, ReturnType, Type};

use crate::attribute_helpers::{extract_wrapped_type, has_attr, is_result_type, strip_attrs};

const INJECT: &str = "inject";
const POST_CONSTRUCT: &str = "post_construct";

pub(crate) fn bean_methods_impl(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = syn::parse_macro_input!(item as ItemImpl);

    if !input.generics.params.is_empty() {
        abort!(input.generics, "#[bean_methods] does not support generic impl blocks");
    }
    if let Some((_, path, _)) = &input.trait_ {
        abort!(path, "#[bean_methods] must be placed on an inherent impl block");
    }

    let self_ty = input.self_ty.as_ref().clone();
    let mut constructors = Vec::new();
    let mut hooks = Vec::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let inject = has_attr(&method.attrs, INJECT);
        let post_construct = has_attr(&method.attrs, POST_CONSTRUCT);

        if inject && post_construct {
            abort!(
                method.sig.ident,
                "a method cannot be both #[inject] and #[post_construct]"
            );
        }

        if inject {
            constructors.push(inject_constructor(&self_ty, method));
        } else if post_construct {
            hooks.push(post_construct_hook(&self_ty, method));
        } else if let Some(constructor) = no_args_constructor(&self_ty, method) {
            constructors.push(constructor);
        }

        strip_attrs(&mut method.attrs, &[INJECT, POST_CONSTRUCT]);
    }

    let expanded = quote! {
        #input

        impl ::kestrel_core::BeanMethods for #self_ty {
            fn constructors() -> Vec<::kestrel_core::ConstructorSpec> {
                vec![#(#constructors),*]
            }

            fn hooks() -> Vec<::kestrel_core::Hook> {
                vec![#(#hooks),*]
            }
        }
    };

    TokenStream::from(expanded)
}

/// `#[inject] fn name(a: Arc<A>, ...) -> Self`
fn inject_constructor(self_ty: &Type, method: &ImplItemFn) -> TokenStream2 {
    let method_name = &method.sig.ident;

    let mut parameters = Vec::new();
    for input in &method.sig.inputs {
        match input {
            FnArg::Receiver(receiver) => abort!(
                receiver,
                "#[inject] constructor '{}' cannot take self",
                method_name
            ),
            FnArg::Typed(arg) => match extract_wrapped_type(&arg.ty, "Arc") {
                Some(inner) => parameters.push(inner.clone()),
                None => abort!(
                    arg.ty,
                    "#[inject] constructor parameters must be Arc<T>";
                    help = "interfaces are requested as Arc<dyn Trait>"
                ),
            },
        }
    }

    let args = parameters.iter().enumerate().map(|(index, ty)| {
        quote! { args.get::<#ty>(#index)? }
    });
    let call = constructor_call(self_ty, method, quote! { #(#args),* });

    quote! {
        ::kestrel_core::ConstructorSpec::injected::<#self_ty, _>(
            stringify!(#method_name),
            vec![#(::kestrel_core::TypeKey::of::<#parameters>()),*],
            |args: &::kestrel_core::ConstructorArgs<'_>| #call,
        )
    }
}

/// 未标记的 `fn new() -> Self`
fn no_args_constructor(self_ty: &Type, method: &ImplItemFn) -> Option<TokenStream2> {
    if method.sig.ident != "new" || !method.sig.inputs.is_empty() {
        return None;
    }
    if matches!(method.sig.output, ReturnType::Default) {
        return None;
    }

    let call = constructor_call(self_ty, method, quote! {});
    Some(quote! {
        ::kestrel_core::ConstructorSpec::no_args::<#self_ty, _>("new", || #call)
    })
}

fn constructor_call(self_ty: &Type, method: &ImplItemFn, args: TokenStream2) -> TokenStream2 {
    let method_name = &method.sig.ident;

    match &method.sig.output {
        ReturnType::Default => abort!(
            method.sig,
            "constructor '{}' must return Self",
            method_name
        ),
        ReturnType::Type(_, ty) if is_result_type(ty) => quote! {
            { Ok(<#self_ty>::#method_name(#args)?) }
        },
        ReturnType::Type(..) => quote! {
            { Ok(<#self_ty>::#method_name(#args)) }
        },
    }
}

/// `#[post_construct] fn name(&self) -> () | anyhow::Result<()>`
fn post_construct_hook(self_ty: &Type, method: &ImplItemFn) -> TokenStream2 {
    let method_name = &method.sig.ident;
    let mut inputs = method.sig.inputs.iter();

    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => abort!(
            method.sig,
            "#[post_construct] method '{}' must take &self",
            method_name
        ),
    }

    if let Some(extra) = inputs.next() {
        abort!(
            extra,
            "#[post_construct] method '{}' cannot take arguments",
            method_name
        );
    }

    quote! {
        ::kestrel_core::Hook::new::<#self_ty, _, _>(
            stringify!(#method_name),
            |bean: &#self_ty| bean.#method_name(),
        )
    }
}
