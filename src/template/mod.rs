//! Template rendering
//!
//! The template side of a rule is walked in order once a pattern matched.
//! Literal text is emitted as is, result markers emit the captures of the
//! pattern marker with the same name, and each `;` hands the statement
//! built so far to an [`OutputSink`].
//!
//! ```text
//! swap <a> <b> => tmp = <a> ; <a> = <b> ; <b> = tmp
//! ```

mod renderer;
mod values;

pub use renderer::Renderer;
pub use values::{CollectingSink, DefaultShaper, OutputSink, Value, ValueShaper};
