//! Derive macros for the tasklist state container
//!
//! This crate provides procedural macros to reduce boilerplate when declaring
//! action vocabularies.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates `ActionKind` plus command/event helpers
//!
//! # Example
//!
//! ```ignore
//! use tasklist_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TaskAction {
//!     #[command]
//!     DeleteTask { id: String },
//!
//!     #[event]
//!     TasksReceived { items: Vec<Task> },
//! }
//!
//! // Generated methods:
//! assert_eq!(TaskAction::DeleteTask { id: "a".into() }.kind(), "DeleteTask");
//! assert!(TaskAction::DeleteTask { id: "a".into() }.is_command());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates:
/// - `impl tasklist_core::action::ActionKind` whose `kind()` returns the
///   variant name
/// - `KINDS` - every variant name, in declaration order
/// - `is_command()` - true for variants marked `#[command]`
/// - `is_event()` - true for variants marked `#[event]`
///
/// Variants carrying neither attribute are neither commands nor events
/// (for example a catch-all for unrecognised wire input).
///
/// # Attributes
///
/// - `#[command]` - Mark a variant as a command (an intent that may trigger effects)
/// - `#[event]` - Mark a variant as an event (a fact reported back by an effect)
///
/// # Errors
///
/// Produces a compile error if:
/// - Applied to a non-enum type
/// - A variant has both `#[command]` and `#[event]` attributes
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut kind_arms = Vec::new();
    let mut kinds = Vec::new();
    let mut command_arms = Vec::new();
    let mut event_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_command = has_attribute(&variant.attrs, "command");
        let is_event = has_attribute(&variant.attrs, "event");

        if is_command && is_event {
            return syn::Error::new_spanned(variant, "Variant cannot be both #[command] and #[event]")
                .to_compile_error()
                .into();
        }

        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let kind = variant.ident.to_string();

        kind_arms.push(quote! { #pattern => #kind, });
        kinds.push(kind);

        if is_command {
            command_arms.push(quote! { #pattern => true, });
        }
        if is_event {
            event_arms.push(quote! { #pattern => true, });
        }
    }

    let expanded = quote! {
        impl #impl_generics ::tasklist_core::action::ActionKind for #name #ty_generics #where_clause {
            fn kind(&self) -> &'static str {
                match self {
                    #(#kind_arms)*
                }
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            /// Every action kind of this vocabulary, in declaration order
            pub const KINDS: &'static [&'static str] = &[#(#kinds),*];

            /// Returns true if this action is a command
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is an event
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#event_arms)*
                    _ => false,
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Pattern matching any value of a variant, whatever its field shape
fn variant_pattern(variant: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#variant { .. } },
        Fields::Unnamed(_) => quote! { Self::#variant(..) },
        Fields::Unit => quote! { Self::#variant },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
