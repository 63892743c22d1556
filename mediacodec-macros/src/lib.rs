use darling::ast::Data;
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField};
use quote::quote;
use syn::{DeriveInput, GenericArgument, Ident, PathArguments, Type, parse_macro_input};

use proc_macro::TokenStream;

#[derive(FromField)]
#[darling(attributes(symbol))]
struct SymbolField {
    ident: Option<Ident>,
    ty: Type,
    name: String,
}

#[derive(FromDeriveInput)]
#[darling(supports(struct_named))]
struct SymbolTableInput {
    ident: Ident,
    data: Data<Ignored, SymbolField>,
}

/// Returns `T` when `ty` is spelled `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Derives `crate::resolve::SymbolTable` for a struct of C function pointers.
///
/// Every field carries `#[symbol(name = "...")]` naming the exported entry
/// point. Fields typed `Option<F>` are optional and resolve to `None` when the
/// library lacks them; any other field is required and a missing symbol fails
/// the whole table with `InitError::MissingSymbol`.
#[proc_macro_derive(SymbolTable, attributes(symbol))]
pub fn derive_symbol_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let table = match SymbolTableInput::from_derive_input(&input) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(e.write_errors());
        }
    };

    let name = table.ident;
    let fields = match table.data {
        Data::Struct(fields) => fields.fields,
        Data::Enum(_) => unreachable!("SymbolTable can only be derived for structs"),
    };

    let mut entries = Vec::with_capacity(fields.len());
    let mut inits = Vec::with_capacity(fields.len());

    for field in &fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let symbol = &field.name;

        match option_inner(&field.ty) {
            Some(inner) => {
                entries.push(quote! {
                    crate::resolve::EntryPoint { name: #symbol, required: false }
                });
                inits.push(quote! {
                    #ident: unsafe { library.get::<#inner>(#symbol.as_bytes()) }
                        .ok()
                        .map(|symbol| *symbol)
                });
            }
            None => {
                let ty = &field.ty;
                entries.push(quote! {
                    crate::resolve::EntryPoint { name: #symbol, required: true }
                });
                inits.push(quote! {
                    #ident: match unsafe { library.get::<#ty>(#symbol.as_bytes()) } {
                        ::std::result::Result::Ok(symbol) => *symbol,
                        ::std::result::Result::Err(err) => {
                            return ::std::result::Result::Err(
                                crate::error::InitError::MissingSymbol {
                                    name: #symbol,
                                    reason: err.to_string(),
                                },
                            );
                        }
                    }
                });
            }
        }
    }

    let expanded = quote! {
        impl crate::resolve::SymbolTable for #name {
            const ENTRY_POINTS: &'static [crate::resolve::EntryPoint] = &[#(#entries),*];

            unsafe fn from_library(
                library: &::libloading::Library,
            ) -> ::std::result::Result<Self, crate::error::InitError> {
                ::std::result::Result::Ok(Self {
                    #(#inits),*
                })
            }
        }
    };

    TokenStream::from(expanded)
}
