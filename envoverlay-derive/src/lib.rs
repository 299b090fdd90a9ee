//! Derive macro for `envoverlay::Record`.
//!
//! Field names follow the serde attributes already on the type, so the
//! variable derived for a field always matches the key the configuration
//! file uses. How each field absorbs an override is decided by its type
//! through `envoverlay::Field`, never by the derive.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Path};

/// Derive `envoverlay::Record` and `envoverlay::Field` for a struct with
/// named fields.
///
/// Recognised attributes:
///
/// - `#[serde(rename = "...")]`, `#[serde(rename_all = "...")]`: the
///   deserialize-side name is used for the variable
/// - `#[serde(skip)]`, `#[serde(skip_deserializing)]`, `#[envoverlay(skip)]`:
///   the field is not visited
/// - `#[serde(default)]` or `#[envoverlay(default)]` on the struct: an absent
///   `Option<Self>` section is created when a variable beneath it is set
/// - `#[envoverlay(rename = "...")]`: overrides the variable name only
#[proc_macro_derive(Record, attributes(envoverlay))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_record(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let container = parse_container(&input.attrs)?;
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Record can only be derived for structs",
        ));
    };

    let fields = match &struct_data.fields {
        Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &struct_data.fields,
                "Record requires named fields",
            ));
        },
    };

    let mut visits = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let name = match attrs.rename {
            Some(name) => name,
            None => container
                .rename_all
                .map_or_else(|| ident.unraw().to_string(), |rule| {
                    rule.apply(&ident.unraw().to_string())
                }),
        };
        visits.push(quote! {
            ::envoverlay::Field::visit_field(&mut self.#ident, #name, visitor)?;
        });
    }

    let empty = match &container.default {
        None => quote! {},
        Some(DefaultSource::Trait) => quote! {
            fn empty() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(::core::default::Default::default())
            }
        },
        Some(DefaultSource::Path(path)) => quote! {
            fn empty() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(#path())
            }
        },
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::envoverlay::Record for #name #ty_generics #where_clause {
            fn visit_fields<__V: ::envoverlay::FieldVisitor>(
                &mut self,
                visitor: &mut __V,
            ) -> ::envoverlay::Result<()> {
                #(#visits)*
                ::core::result::Result::Ok(())
            }

            #empty
        }

        impl #impl_generics ::envoverlay::Field for #name #ty_generics #where_clause {
            fn visit_field<__V: ::envoverlay::FieldVisitor>(
                &mut self,
                name: &str,
                visitor: &mut __V,
            ) -> ::envoverlay::Result<()> {
                visitor.record(name, self)
            }

            fn visit_optional<__V: ::envoverlay::FieldVisitor>(
                value: &mut ::core::option::Option<Self>,
                name: &str,
                visitor: &mut __V,
            ) -> ::envoverlay::Result<()> {
                visitor.optional_record(name, value)
            }
        }
    })
}

enum DefaultSource {
    Trait,
    Path(Path),
}

#[derive(Default)]
struct ContainerAttrs {
    rename_all: Option<RenameRule>,
    default: Option<DefaultSource>,
}

fn parse_container(attrs: &[Attribute]) -> Result<ContainerAttrs, syn::Error> {
    let mut out = ContainerAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    if let Some(value) = deserialize_name(&meta)? {
                        out.rename_all = Some(RenameRule::parse(&value)?);
                    }
                    return Ok(());
                }
                if meta.path.is_ident("default") {
                    out.default = Some(if meta.input.peek(syn::Token![=]) {
                        let value: LitStr = meta.value()?.parse()?;
                        DefaultSource::Path(value.parse()?)
                    } else {
                        DefaultSource::Trait
                    });
                    return Ok(());
                }
                skip_meta(&meta)
            })?;
        } else if attr.path().is_ident("envoverlay") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    out.default = Some(DefaultSource::Trait);
                    return Ok(());
                }
                Err(meta.error("unsupported envoverlay attribute on container"))
            })?;
        }
    }
    Ok(out)
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

fn parse_field(attrs: &[Attribute]) -> Result<FieldAttrs, syn::Error> {
    let mut out = FieldAttrs::default();
    let mut overlay_rename = None;
    for attr in attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if let Some(name) = deserialize_name(&meta)? {
                        out.rename = Some(name.value());
                    }
                    return Ok(());
                }
                if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
                    out.skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("flatten") {
                    return Err(meta.error("flattened fields have no path of their own"));
                }
                skip_meta(&meta)
            })?;
        } else if attr.path().is_ident("envoverlay") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    out.skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    if overlay_rename.is_some() {
                        return Err(meta.error("duplicate envoverlay(rename = ...)"));
                    }
                    overlay_rename = Some(value.value());
                    return Ok(());
                }
                Err(meta.error("unsupported envoverlay attribute on field"))
            })?;
        }
    }
    if overlay_rename.is_some() {
        out.rename = overlay_rename;
    }
    Ok(out)
}

/// Reads `key = "..."` or `key(deserialize = "...")`; serialize-only
/// renames yield `None`.
fn deserialize_name(meta: &ParseNestedMeta) -> Result<Option<LitStr>, syn::Error> {
    if meta.input.peek(syn::Token![=]) {
        return Ok(Some(meta.value()?.parse()?));
    }
    let mut name = None;
    meta.parse_nested_meta(|nested| {
        let value: LitStr = nested.value()?.parse()?;
        if nested.path.is_ident("deserialize") {
            name = Some(value);
        }
        Ok(())
    })?;
    Ok(name)
}

/// Consumes a serde option this derive has no use for.
fn skip_meta(meta: &ParseNestedMeta) -> Result<(), syn::Error> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

/// The subset of serde's `rename_all` rules that apply to field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self, syn::Error> {
        Self::from_name(&lit.value()).ok_or_else(|| {
            syn::Error::new_spanned(lit, format!("unknown rename rule `{}`", lit.value()))
        })
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            _ => return None,
        })
    }

    fn apply(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_string(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Pascal => pascal_case(field),
            Self::Camel => {
                let pascal = pascal_case(field);
                let mut chars = pascal.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_ascii_lowercase().to_string() + chars.as_str()
                })
            },
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
        }
    }
}

fn pascal_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut capitalize = true;
    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            out.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            out.push(ch);
        }
    }
    out
}
