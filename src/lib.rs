//! `tplweave` compiles a *template document* against a *data document* by
//! interpreting namespaced elements in the template as control directives —
//! iteration over children or attributes, range iteration, conditional
//! dispatch, dynamic element synthesis, and value interpolation — evaluated
//! against the data document, producing a third *compiled document*.
//!
//! ```
//! use tplweave::{document::text, Preprocessor};
//!
//! let data = text::parse("<root><p n=\"b\"/><p n=\"a\"/></root>").unwrap();
//! let template = text::parse(
//!     r#"<s:for in="/" sort-by="$~n"><s:item><s:value src="$~n"/></s:item></s:for>"#,
//! )
//! .unwrap();
//!
//! let mut preprocessor = Preprocessor::new(&data, &template);
//! let compiled = preprocessor.parse().unwrap();
//! assert_eq!(text::render(compiled).unwrap(), "ab");
//! ```
//!
//! The core — [`expr`], [`symbols`], [`namespace`], [`select`], and
//! [`interpreter`] — depends only on [`document`]'s minimal tree interface;
//! [`document`] itself (and its [`document::text`] textual format) stands in
//! for the "tree library" spec.md treats as an external collaborator.
//! [`config`] and the `tplweave` binary (`src/main.rs`) are the thin CLI
//! shell around it.

pub mod config;
pub mod diagnostics;
pub mod document;
mod expr;
mod interpreter;
pub mod namespace;
mod select;
pub mod symbols;
pub mod value;

mod driver;
pub use driver::Preprocessor;
