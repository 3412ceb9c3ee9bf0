use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote, Data, DeriveInput, Fields, GenericArgument, GenericParam,
    Generics, LitStr, PathArguments, Type, Visibility, WherePredicate,
};

/// Derive macro for the `propmap::Shape` accessor table.
///
/// Every `pub` named field becomes a mappable field with a generated read and
/// write accessor. Non-`pub` fields are not enumerated.
///
/// # Example
///
/// ```ignore
/// #[derive(Shape, Default)]
/// pub struct UserDto {
///     pub id: u64,
///
///     #[shape(rename = "email")]
///     pub contact: Option<String>,
///
///     #[shape(skip)]
///     pub cache_key: String,
/// }
/// ```
///
/// Field types must be `Clone + Send + Sync + 'static`. `Option<T>` fields
/// are nullable: null reads as `None` and `None` reads as null.
///
/// Type parameters get the same bounds on the generated impl. Lifetime
/// parameters are rejected.
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let generics = bounded_generics(&input.generics)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => return Ok(empty_shape(input, &generics)),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Shape only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Shape only supports structs")),
    };

    let mut accessor_tokens = Vec::new();
    let mut names = Vec::new();

    for field in fields {
        if !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;

        // Parse #[shape(...)] attribute.
        let mut skip = false;
        let mut rename: Option<String> = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("shape") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown shape attribute (expected 'skip' or 'rename')"))
                }
            })?;
        }
        if skip {
            continue;
        }

        let name_str = rename.unwrap_or_else(|| unraw(field_name));
        if names.contains(&name_str) {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("duplicate shape field name '{name_str}'"),
            ));
        }

        let (declared, get_expr, set_expr, nullable) = match option_inner(&field.ty) {
            Some(inner) => (
                inner,
                quote! { ::propmap::shape::access::read_optional(&instance.#field_name) },
                quote! { ::propmap::shape::access::write_optional(&mut instance.#field_name, value) },
                true,
            ),
            None => (
                &field.ty,
                quote! { ::propmap::shape::access::read(&instance.#field_name) },
                quote! { ::propmap::shape::access::write(&mut instance.#field_name, value) },
                false,
            ),
        };

        accessor_tokens.push(quote! {
            ::propmap::shape::FieldAccessor {
                name: #name_str,
                declared: ::propmap::value::TypeKey::of::<#declared>(),
                nullable: #nullable,
                get: |instance: &Self| #get_expr,
                set: |instance: &mut Self, value: ::propmap::value::Value| #set_expr,
            }
        });
        names.push(name_str);
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::propmap::shape::Shape for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::propmap::shape::FieldAccessor<Self>> {
                ::std::vec![
                    #(#accessor_tokens),*
                ]
            }

            fn field(
                name: &str,
            ) -> ::std::option::Option<::propmap::shape::FieldAccessor<Self>> {
                match name {
                    #(#names => ::std::option::Option::Some(#accessor_tokens),)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

fn empty_shape(input: &DeriveInput, generics: &Generics) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    quote! {
        impl #impl_generics ::propmap::shape::Shape for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::propmap::shape::FieldAccessor<Self>> {
                ::std::vec::Vec::new()
            }
        }
    }
}

/// Copy of `generics` with every type parameter bound by what field values
/// need. Lifetime parameters cannot satisfy `Shape: 'static`.
fn bounded_generics(generics: &Generics) -> Result<Generics, syn::Error> {
    let mut bounded = generics.clone();
    let mut predicates: Vec<WherePredicate> = Vec::new();
    for param in &generics.params {
        match param {
            GenericParam::Type(ty) => {
                let ident = &ty.ident;
                predicates.push(parse_quote! {
                    #ident: ::std::clone::Clone
                        + ::std::marker::Send
                        + ::std::marker::Sync
                        + 'static
                });
            }
            GenericParam::Lifetime(lt) => {
                return Err(syn::Error::new_spanned(
                    lt,
                    "Shape cannot be derived for structs with lifetime parameters",
                ));
            }
            GenericParam::Const(_) => {}
        }
    }
    bounded.make_where_clause().predicates.extend(predicates);
    Ok(bounded)
}

/// `T` for `Option<T>` (also `std::option::Option<T>`), otherwise `None`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let seg = type_path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// Field name without the `r#` prefix of raw identifiers.
fn unraw(ident: &syn::Ident) -> String {
    let s = ident.to_string();
    s.strip_prefix("r#").map(str::to_string).unwrap_or(s)
}
