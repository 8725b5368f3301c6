use std::collections::HashMap;

use log::{debug, warn};
use nom::{
  bytes::complete::{tag, take_till},
  character::complete::{char, space0, space1},
  combinator::map,
  multi::separated_list0,
  sequence::{delimited, preceded, tuple},
  IResult,
};

use crate::{
  identifier::{identifier, is_identifier},
  Error, Malformed,
};

/// A macro definition.
///
/// ```c
/// #define PI 3.14
/// #define ADD(a, b) a + b
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
  name: String,
  parameters: Option<Vec<String>>,
  body: String,
}

impl MacroDefinition {
  /// Create an object-like macro.
  pub fn object_like(name: impl Into<String>, body: impl Into<String>) -> Self {
    Self { name: name.into(), parameters: None, body: body.into() }
  }

  /// Create a function-like macro.
  pub fn function_like<P>(name: impl Into<String>, parameters: P, body: impl Into<String>) -> Self
  where
    P: IntoIterator,
    P::Item: Into<String>,
  {
    Self { name: name.into(), parameters: Some(parameters.into_iter().map(Into::into).collect()), body: body.into() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The parameter names, or `None` for an object-like macro.
  pub fn parameters(&self) -> Option<&[String]> {
    self.parameters.as_deref()
  }

  pub fn is_function_like(&self) -> bool {
    self.parameters.is_some()
  }

  /// The unexpanded body text.
  pub fn body(&self) -> &str {
    &self.body
  }
}

/// `#define NAME` at the start of a line.
fn define_name(input: &str) -> IResult<&str, &str> {
  preceded(tuple((space0, char('#'), space0, tag("define"), space1)), identifier)(input)
}

fn parameter_list(input: &str) -> IResult<&str, Vec<&str>> {
  delimited(
    char('('),
    separated_list0(char(','), map(take_till(|c: char| matches!(c, ',' | ')' | '\n')), str::trim)),
    char(')'),
  )(input)
}

fn parameters(name: &str, line: usize, list: Vec<&str>) -> Result<Vec<String>, Error> {
  let malformed = |reason| Error::MalformedDefinition { name: name.to_owned(), line: Some(line), reason };

  // `NAME()` has no parameters rather than a single empty one.
  if list == [""] {
    return Ok(vec![])
  }

  let mut params: Vec<String> = Vec::with_capacity(list.len());
  for param in list {
    if !is_identifier(param) {
      return Err(malformed(Malformed::InvalidParameter(param.to_owned())))
    }

    if params.iter().any(|p| p == param) {
      return Err(malformed(Malformed::DuplicateParameter(param.to_owned())))
    }

    params.push(param.to_owned());
  }

  Ok(params)
}

fn ends_with_continuation(line: &str) -> bool {
  strip_line_break(line).trim_end_matches([' ', '\t']).ends_with('\\')
}

fn strip_line_break(s: &str) -> &str {
  let s = s.strip_suffix('\n').unwrap_or(s);
  s.strip_suffix('\r').unwrap_or(s)
}

/// A table of macro definitions, iterated in definition order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
  definitions: Vec<MacroDefinition>,
  index: HashMap<String, usize>,
}

impl DefinitionTable {
  /// Create an empty table.
  pub fn new() -> Self {
    Self::default()
  }

  /// Extract all `#define` directives from `source`.
  ///
  /// Lines which are not definitions are ignored. A body continues onto the
  /// next line as long as its current line ends with `\`.
  ///
  /// ```
  /// # fn main() -> Result<(), oo_header::Error> {
  /// use oo_header::DefinitionTable;
  ///
  /// let table = DefinitionTable::parse("#define ADD(a, b) \\\n  a + b\n")?;
  /// let add = table.get("ADD").unwrap();
  /// assert_eq!(add.parameters(), Some(&["a".to_owned(), "b".to_owned()][..]));
  /// assert_eq!(add.body(), "  a + b");
  /// # Ok(())
  /// # }
  /// ```
  pub fn parse(source: &str) -> Result<Self, Error> {
    let mut table = Self::new();
    let mut lines = source.split_inclusive('\n').enumerate();

    while let Some((i, line)) = lines.next() {
      let Ok((rest, name)) = define_name(line) else { continue };
      let line_number = i + 1;

      let (rest, params) = if rest.starts_with('(') {
        match parameter_list(rest) {
          Ok((rest, list)) => (rest, Some(parameters(name, line_number, list)?)),
          Err(_) => {
            return Err(Error::MalformedDefinition {
              name: name.to_owned(),
              line: Some(line_number),
              reason: Malformed::UnclosedParameterList,
            })
          },
        }
      } else {
        (rest, None)
      };

      let mut body = String::new();
      let mut continued = ends_with_continuation(rest);

      // The body starts on the next line if nothing but `\` follows the signature.
      if !(continued && rest.trim_start().starts_with('\\')) {
        body.push_str(rest.trim_start_matches([' ', '\t']));
      }

      while continued {
        match lines.next() {
          Some((_, next)) => {
            body.push_str(next);
            continued = ends_with_continuation(next);
          },
          None => {
            return Err(Error::MalformedDefinition {
              name: name.to_owned(),
              line: Some(line_number),
              reason: Malformed::UnterminatedBody,
            })
          },
        }
      }

      let body = strip_line_break(&body).to_owned();
      let definition = MacroDefinition { name: name.to_owned(), parameters: params, body };

      debug!("line {line_number}: defined {}", definition.name);
      if table.define(definition) {
        warn!("line {line_number}: {name} redefined, the previous definition is discarded");
      }
    }

    Ok(table)
  }

  /// Add a definition.
  ///
  /// Returns true if a macro with the same name was replaced. The replacement
  /// keeps the position of the old definition.
  pub fn define(&mut self, definition: MacroDefinition) -> bool {
    if let Some(&i) = self.index.get(definition.name()) {
      self.definitions[i] = definition;
      true
    } else {
      self.index.insert(definition.name.clone(), self.definitions.len());
      self.definitions.push(definition);
      false
    }
  }

  pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
    self.index.get(name).map(|&i| &self.definitions[i])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  /// Iterate definitions in the order they were first defined.
  pub fn iter(&self) -> impl Iterator<Item = &MacroDefinition> {
    self.definitions.iter()
  }

  pub fn len(&self) -> usize {
    self.definitions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.definitions.is_empty()
  }
}

impl FromIterator<MacroDefinition> for DefinitionTable {
  fn from_iter<I: IntoIterator<Item = MacroDefinition>>(iter: I) -> Self {
    let mut table = Self::new();
    for definition in iter {
      table.define(definition);
    }
    table
  }
}
