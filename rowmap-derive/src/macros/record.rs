//! Derive macro for `Record`
//!
//! Generates `RecordFields` (index-addressed field access) and `Record`
//! (the field descriptor list) for a struct with named fields. Field indices
//! follow declaration order.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, WherePredicate};

use crate::attributes::{parse_field_attributes, ColumnSpec};
use crate::utils;

/// Generate `RecordFields` and `Record` implementations
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

enum Kind {
    Leaf,
    Embedded,
    Indirect,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs with named fields",
            ));
        }
    };

    let mut descriptors: Vec<TokenStream2> = Vec::new();
    let mut mut_arms: Vec<TokenStream2> = Vec::new();
    let mut ref_arms: Vec<TokenStream2> = Vec::new();
    let mut bounds: Vec<WherePredicate> = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let name = utils::field_name(ident);
        let ty = &field.ty;
        let attrs = parse_field_attributes(field)?;
        let exported = utils::is_exported(&field.vis);

        let kind = match &attrs.embedded {
            None => Kind::Leaf,
            Some(_) if utils::is_indirect(ty) => Kind::Indirect,
            Some(_) => Kind::Embedded,
        };

        let mut descriptor = match kind {
            Kind::Leaf => quote! { ::rowmap::FieldDescriptor::leaf(#name) },
            Kind::Embedded => quote! { ::rowmap::FieldDescriptor::embedded::<#ty>(#name) },
            Kind::Indirect => quote! { ::rowmap::FieldDescriptor::indirect(#name) },
        };
        if let Some(Some(prefix)) = &attrs.embedded {
            descriptor = quote! { #descriptor.prefix(#prefix) };
        }
        match &attrs.column {
            ColumnSpec::Default => {}
            ColumnSpec::Named(column) => descriptor = quote! { #descriptor.column(#column) },
            ColumnSpec::Excluded => descriptor = quote! { #descriptor.excluded() },
        }
        if !exported {
            descriptor = quote! { #descriptor.private() };
        }
        descriptors.push(descriptor);

        // Only fields the resolver can reach get accessors.
        let excluded = attrs.column == ColumnSpec::Excluded;
        match kind {
            Kind::Leaf if exported && !excluded => {
                mut_arms.push(quote! {
                    #index => ::core::option::Option::Some(::rowmap::FieldMut::Leaf(&mut self.#ident)),
                });
                ref_arms.push(quote! {
                    #index => ::core::option::Option::Some(::rowmap::FieldRef::Leaf(&self.#ident)),
                });
                bounds.push(parse_quote!(#ty: ::rowmap::ColumnValue));
            }
            Kind::Embedded if !excluded => {
                mut_arms.push(quote! {
                    #index => ::core::option::Option::Some(::rowmap::FieldMut::Embedded(&mut self.#ident)),
                });
                ref_arms.push(quote! {
                    #index => ::core::option::Option::Some(::rowmap::FieldRef::Embedded(&self.#ident)),
                });
                bounds.push(parse_quote!(#ty: ::rowmap::Record));
            }
            _ => {}
        }
    }

    let mut generics = input.generics.clone();
    generics.make_where_clause().predicates.extend(bounds);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut record_generics = generics.clone();
    record_generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(Self: ::core::default::Default + 'static));
    let (record_impl_generics, _, record_where_clause) = record_generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::rowmap::RecordFields for #struct_name #ty_generics #where_clause {
            fn field_mut(&mut self, index: usize) -> ::core::option::Option<::rowmap::FieldMut<'_>> {
                match index {
                    #(#mut_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_ref(&self, index: usize) -> ::core::option::Option<::rowmap::FieldRef<'_>> {
                match index {
                    #(#ref_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #record_impl_generics ::rowmap::Record for #struct_name #ty_generics #record_where_clause {
            fn describe() -> ::rowmap::RecordDescriptor {
                ::rowmap::RecordDescriptor::new(
                    ::core::any::type_name::<Self>(),
                    ::std::vec![#(#descriptors),*],
                )
            }
        }
    })
}
