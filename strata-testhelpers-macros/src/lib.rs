//! The `#[test]` attribute used across the strata workspace.

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    // attributes, visibility and qualifiers in front of `fn`
    struct Preamble {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    // generics, arguments and return type, up to the body
    struct Signature {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        preamble: Preamble, _fn: KFn, name: Ident,
        signature: Signature, body: BraceGroup
    }
}

impl quote::ToTokens for Preamble {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Signature {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.items.to_tokens(tokens)
    }
}

/// Marks a test and runs `strata_testhelpers::setup()` before its body.
///
/// ```ignore
/// use strata_testhelpers::test;
///
/// #[test]
/// fn assembles_a_list() {
///     // tracing output is visible under STRATA_LOG
/// }
/// ```
///
/// An argument replaces the underlying test attribute, for harnesses that
/// bring their own:
///
/// ```ignore
/// #[strata_testhelpers::test(my_harness::test)]
/// fn custom() {}
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut tokens = item.to_token_iter();
    let TestFn {
        preamble,
        _fn,
        name,
        signature,
        body,
    } = match tokens.parse::<TestFn>() {
        Ok(decl) => decl,
        Err(err) => {
            let message = format!("#[test] expects a function: {err}");
            return quote::quote! { ::core::compile_error!(#message); }.into();
        }
    };

    let test_attr = if attr.is_empty() {
        quote::quote! { #[::core::prelude::rust_2024::test] }
    } else {
        let attr = TokenStream::from(attr);
        quote::quote! { #[#attr] }
    };
    let body = body.0.stream();

    quote::quote! {
        #test_attr
        #preamble fn #name #signature {
            ::strata_testhelpers::setup();

            #body
        }
    }
    .into()
}
