//! Expands textual macro definitions into a plain header.
//!
//! Macro definitions are collected into a [`DefinitionTable`]. A seed text
//! invoking the requested macros is expanded to a fixpoint by an
//! [`Expander`] and then cleaned up by a [`PostProcessor`], which joins
//! continued lines, deletes `##` and turns `#word` into `"word"`.
//!
//! ```
//! # fn main() -> Result<(), oo_header::Error> {
//! use oo_header::{generate, DefinitionTable, Options};
//!
//! let table = DefinitionTable::parse(concat!(
//!   "#define DARMA_OO_DEFINE_TAG(name) \\\n",
//!   "struct name##_tag { static constexpr auto label = #name; };\n",
//! ))?;
//!
//! let header = generate(&table, &["color"], &[] as &[&str], &Options::default())?;
//! assert_eq!(header, "#include <darma.h>\nstruct color_tag { static constexpr auto label = \"color\"; };;\n");
//! # Ok(())
//! # }
//! ```
//!
//! Arguments of a function-like macro must not contain parentheses.

#![warn(missing_debug_implementations)]

use log::info;

mod error;
pub use error::*;
mod identifier;
pub use identifier::is_identifier;
mod definition;
pub use definition::*;
mod invocation;
pub use invocation::Invocation;
mod expand;
pub use expand::*;
mod post_process;
pub use post_process::*;
mod seed;
pub use seed::*;

/// Settings for [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
  /// Which invocation to expand first.
  pub selection: Selection,
  /// Maximum number of expansions before giving up.
  pub max_iterations: usize,
  /// What to do with continuation markers.
  pub continuation: LineContinuation,
  /// The text which is expanded.
  pub seed: SeedTemplate,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      selection: Selection::default(),
      max_iterations: DEFAULT_MAX_ITERATIONS,
      continuation: LineContinuation::default(),
      seed: SeedTemplate::default(),
    }
  }
}

/// Expand the tag and class macros for the given names.
///
/// Fails if a macro the seed invokes is not defined in `table`.
pub fn generate<T, C>(table: &DefinitionTable, tags: &[T], classes: &[C], options: &Options) -> Result<String, Error>
where
  T: AsRef<str>,
  C: AsRef<str>,
{
  if let Some(name) = options.seed.invoked_macros(tags.len(), classes.len()).find(|name| !table.contains(name)) {
    return Err(Error::MalformedDefinition { name: name.to_owned(), line: None, reason: Malformed::Undefined })
  }

  let seed = options.seed.render(tags, classes);
  info!("expanding {} definitions into:\n{seed}", table.len());

  let expanded =
    Expander::new(table).selection(options.selection).max_iterations(options.max_iterations).expand(&seed)?;

  Ok(PostProcessor::new(options.continuation).process(&expanded))
}
