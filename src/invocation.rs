use std::ops::Range;

use nom::{bytes::complete::take_till, character::complete::char, sequence::preceded, IResult};

use crate::{identifier::words, DefinitionTable, Error, MacroDefinition};

/// A macro invocation found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'t> {
  /// The invoked macro.
  pub name: &'t str,
  /// Byte range of the whole invocation, including the argument list.
  pub span: Range<usize>,
  /// The trimmed arguments, or `None` for an object-like macro.
  pub args: Option<Vec<&'t str>>,
}

/// Everything between `(` and the next parenthesis.
fn argument_span(input: &str) -> IResult<&str, &str> {
  preceded(char('('), take_till(|c: char| c == '(' || c == ')'))(input)
}

fn split_args<'t>(span: &'t str, definition: &MacroDefinition) -> Vec<&'t str> {
  // Allow an empty argument list for arity 0.
  if span.trim().is_empty() && definition.parameters().map(<[_]>::is_empty).unwrap_or(false) {
    return vec![]
  }

  span.split(',').map(str::trim).collect()
}

/// Try to read an invocation of `definition` whose name is at `start`.
///
/// Returns `Ok(None)` if a function-like macro name is not followed by `(`.
fn invocation_at<'t>(
  text: &'t str,
  start: usize,
  definition: &MacroDefinition,
) -> Result<Option<Invocation<'t>>, Error> {
  let name = &text[start..(start + definition.name().len())];
  let after_name = start + name.len();

  if !definition.is_function_like() {
    return Ok(Some(Invocation { name, span: start..after_name, args: None }))
  }

  let rest = &text[after_name..];
  if !rest.starts_with('(') {
    return Ok(None)
  }

  let (remaining, span) = match argument_span(rest) {
    Ok(res) => res,
    Err(_) => return Err(Error::UnterminatedInvocation { name: name.to_owned(), offset: start }),
  };

  let close = text.len() - remaining.len();
  match remaining.chars().next() {
    Some(')') => {
      let args = split_args(span, definition);
      Ok(Some(Invocation { name, span: start..(close + 1), args: Some(args) }))
    },
    Some(_) => Err(Error::UnsupportedNestedParentheses { name: name.to_owned(), offset: close }),
    None => Err(Error::UnterminatedInvocation { name: name.to_owned(), offset: start }),
  }
}

/// Find the first invocation of a macro from `table` in `text`.
///
/// Only words for which `filter` returns true are considered.
pub(crate) fn find_invocation<'t, F>(
  text: &'t str,
  table: &DefinitionTable,
  mut filter: F,
) -> Result<Option<Invocation<'t>>, Error>
where
  F: FnMut(&str) -> bool,
{
  for (start, word) in words(text) {
    if !filter(word) {
      continue
    }

    if let Some(definition) = table.get(word) {
      if let Some(invocation) = invocation_at(text, start, definition)? {
        return Ok(Some(invocation))
      }
    }
  }

  Ok(None)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> DefinitionTable {
    [
      MacroDefinition::function_like("ADD", ["a", "b"], "a + b"),
      MacroDefinition::function_like("ID", ["x"], "x"),
      MacroDefinition::function_like("NOTHING", Vec::<String>::new(), "nothing"),
      MacroDefinition::object_like("PI", "3.14"),
    ]
    .into_iter()
    .collect()
  }

  fn first(text: &str) -> Result<Option<Invocation<'_>>, Error> {
    find_invocation(text, &table(), |_| true)
  }

  #[test]
  fn parse_argument_span() {
    assert_eq!(argument_span("(x, y) rest"), Ok((") rest", "x, y")));
    assert_eq!(argument_span("(a(b))"), Ok(("(b))", "a")));
    assert_eq!(argument_span("(open"), Ok(("", "open")));
  }

  #[test]
  fn function_like() {
    let text = "int z = ADD( x , y );";
    let invocation = first(text).unwrap().unwrap();

    assert_eq!(invocation.name, "ADD");
    assert_eq!(&text[invocation.span.clone()], "ADD( x , y )");
    assert_eq!(invocation.args, Some(vec!["x", "y"]));
  }

  #[test]
  fn object_like() {
    let invocation = first("double r = PI * 2;").unwrap().unwrap();
    assert_eq!(invocation, Invocation { name: "PI", span: 11..13, args: None });
  }

  #[test]
  fn leftmost_first() {
    let invocation = first("ID(1) + ADD(2, 3)").unwrap().unwrap();
    assert_eq!(invocation.name, "ID");
  }

  #[test]
  fn whole_words_only() {
    assert_eq!(first("XADD(1, 2) ADDX(1, 2) PI2 _PI").unwrap(), None);
  }

  #[test]
  fn name_without_parentheses() {
    assert_eq!(first("ADD + ADD (1, 2)").unwrap(), None);
  }

  #[test]
  fn empty_arguments() {
    let invocation = first("NOTHING()").unwrap().unwrap();
    assert_eq!(invocation.args, Some(vec![]));

    let invocation = first("ID()").unwrap().unwrap();
    assert_eq!(invocation.args, Some(vec![""]));
  }

  #[test]
  fn arguments_span_lines() {
    let invocation = first("ADD(x,\n  y)").unwrap().unwrap();
    assert_eq!(invocation.args, Some(vec!["x", "y"]));
  }

  #[test]
  fn nested_parentheses() {
    assert_eq!(first("ADD(f(x), y)"), Err(Error::UnsupportedNestedParentheses { name: "ADD".into(), offset: 5 }));
  }

  #[test]
  fn unterminated() {
    assert_eq!(first("x; ID(a, b"), Err(Error::UnterminatedInvocation { name: "ID".into(), offset: 3 }));
  }

  #[test]
  fn filtered() {
    let invocation = find_invocation("ID(1) + ADD(2, 3)", &table(), |name| name == "ADD").unwrap().unwrap();
    assert_eq!(invocation.span, 8..17);
  }
}
