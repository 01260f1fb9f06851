//! Model derive macro implementation

use crate::attrs::parse_field_attr;
use crate::syn_types::{option_inner, vec_inner};

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

struct FieldSpec {
    ident: syn::Ident,
    key: String,
    ty: syn::Type,
    column: Option<String>,
    tag: String,
    is_relation: bool,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs with named fields",
            ));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let mut specs = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attr = parse_field_attr(field)?;
        specs.push(FieldSpec {
            key: ident.unraw().to_string(),
            ident,
            ty: field.ty.clone(),
            column: attr.column,
            tag: attr.tag,
            is_relation: attr.is_relation,
        });
    }

    let field_count = specs.len();
    let struct_name = name.unraw().to_string();

    let field_defs = specs.iter().map(|f| {
        let key = &f.key;
        let ty = &f.ty;
        let kind = if f.is_relation {
            quote! { fluentdb::Kind::Relation }
        } else {
            quote! { <#ty as fluentdb::FieldType>::KIND }
        };
        let column = f.column.as_ref().map(|c| quote! { .column(#c) });
        let tag = &f.tag;
        quote! { fluentdb::FieldDef::new(#key, #kind) #column .tag(#tag) }
    });

    let values = specs.iter().map(|f| {
        let ident = &f.ident;
        if f.is_relation {
            quote! { fluentdb::Value::Null }
        } else {
            quote! { fluentdb::FieldType::to_value(&self.#ident) }
        }
    });

    let assign_arms = specs.iter().map(|f| {
        let ident = &f.ident;
        let key = &f.key;
        let ty = &f.ty;
        if f.is_relation {
            quote! {
                #key => Err(fluentdb::OrmError::conversion(
                    key,
                    "relation fields cannot be assigned from a column",
                )),
            }
        } else {
            quote! {
                #key => {
                    self.#ident = <#ty as fluentdb::FieldType>::from_value(value)
                        .map_err(|e| e.in_field(key))?;
                    Ok(())
                }
            }
        }
    });

    let relation_arms = specs.iter().filter(|f| f.is_relation).map(|f| {
        let ident = &f.ident;
        let key = &f.key;
        if vec_inner(&f.ty).is_some() || option_inner(&f.ty).is_some() {
            quote! {
                #key => self.#ident.iter().map(|m| m as &dyn fluentdb::Model).collect(),
            }
        } else {
            quote! {
                #key => ::std::vec![&self.#ident as &dyn fluentdb::Model],
            }
        }
    });

    Ok(quote! {
        impl fluentdb::Model for #name {
            fn schema(&self) -> &'static fluentdb::Schema {
                <Self as fluentdb::Entity>::descriptor()
            }

            fn values(&self) -> ::std::vec::Vec<fluentdb::Value> {
                ::std::vec![#(#values),*]
            }

            #[allow(unused_variables)]
            fn assign(&mut self, key: &str, value: fluentdb::Value) -> fluentdb::OrmResult<()> {
                match key {
                    #(#assign_arms)*
                    _ => Err(fluentdb::OrmError::conversion(key, "unknown field")),
                }
            }

            fn relations(&self, key: &str) -> ::std::vec::Vec<&dyn fluentdb::Model> {
                match key {
                    #(#relation_arms)*
                    _ => ::std::vec::Vec::new(),
                }
            }
        }

        impl fluentdb::Entity for #name {
            fn descriptor() -> &'static fluentdb::Schema {
                static FIELDS: [fluentdb::FieldDef; #field_count] = [#(#field_defs),*];
                static SCHEMA: fluentdb::Schema = fluentdb::Schema {
                    name: #struct_name,
                    fields: &FIELDS,
                };
                &SCHEMA
            }
        }
    })
}
