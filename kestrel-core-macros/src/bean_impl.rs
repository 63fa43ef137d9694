use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attribute_helpers::{inject_fields, parse_bean_options};

pub(crate) fn derive_bean_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        abort!(input.generics, "#[derive(Bean)] does not support generic types");
    }

    let options = parse_bean_options(&input.attrs);

    let bean_name = match &options.name {
        Some(custom) => quote! { #custom },
        None => quote! { concat!(module_path!(), "::", stringify!(#name)) },
    };

    let injectable = injectable_impl(&input);

    let interfaces = options.interfaces.iter().map(|interface| {
        quote! {
            ::kestrel_core::InterfaceBinding::new::<#name, #interface>(
                |bean: ::std::sync::Arc<#name>| -> ::std::sync::Arc<#interface> { bean },
            )
        }
    });

    // `default` 提供无参构造函数，此时不能再使用 #[bean_methods]
    let default_methods = if options.use_default {
        quote! {
            impl ::kestrel_core::BeanMethods for #name {
                fn constructors() -> Vec<::kestrel_core::ConstructorSpec> {
                    vec![::kestrel_core::ConstructorSpec::no_args::<#name, _>("default", || {
                        Ok(<#name as ::std::default::Default>::default())
                    })]
                }
            }
        }
    } else {
        quote! {}
    };

    let expanded = quote! {
        #injectable

        impl ::kestrel_core::Bean for #name {
            fn bean_name() -> &'static str {
                #bean_name
            }

            fn interfaces() -> Vec<::kestrel_core::InterfaceBinding> {
                vec![#(#interfaces),*]
            }
        }

        #default_methods

        ::kestrel_core::inventory::submit! {
            ::kestrel_core::BeanRegistration {
                name: #bean_name,
                describe: ::kestrel_core::BeanDescriptor::of::<#name>,
            }
        }
    };

    TokenStream::from(expanded)
}

pub(crate) fn derive_injectable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        abort!(input.generics, "#[derive(Injectable)] does not support generic types");
    }

    TokenStream::from(injectable_impl(&input))
}

/// 为 `#[inject]` 字段生成 `Injectable` 实现
fn injectable_impl(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            _ => vec![],
        },
        _ => abort!(input, "beans must be structs"),
    };

    let injected = inject_fields(&fields);

    quote! {
        impl ::kestrel_core::Injectable for #name {
            fn injection_points(&self) -> Vec<::kestrel_core::InjectionPoint<'_>> {
                vec![
                    #(::kestrel_core::InjectionPoint::new(stringify!(#injected), &self.#injected)),*
                ]
            }
        }
    }
}
