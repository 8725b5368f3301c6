use log::{debug, trace};

use crate::{
  identifier::{contains_word, is_identifier_continue, replace_word},
  invocation::{find_invocation, Invocation},
  DefinitionTable, Error, MacroDefinition, Malformed,
};

/// The default limit on the number of expansions.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

const SNIPPET_LEN: usize = 60;

/// Which invocation is expanded next when several are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
  /// The invocation starting first in the text.
  #[default]
  Leftmost,
  /// The first macro in definition order which is invoked anywhere in the text.
  DefinitionOrder,
}

/// Repeatedly expands macro invocations until none are left.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), oo_header::Error> {
/// use oo_header::{DefinitionTable, Expander};
///
/// let table = DefinitionTable::parse("#define ADD(a,b) a + b\n#define TWICE(x) ADD(x, x)\n")?;
/// let expander = Expander::new(&table);
///
/// assert_eq!(expander.expand("TWICE(y)")?, "y + y");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Expander<'d> {
  table: &'d DefinitionTable,
  selection: Selection,
  max_iterations: usize,
}

impl<'d> Expander<'d> {
  pub fn new(table: &'d DefinitionTable) -> Self {
    Self { table, selection: Selection::default(), max_iterations: DEFAULT_MAX_ITERATIONS }
  }

  pub fn selection(mut self, selection: Selection) -> Self {
    self.selection = selection;
    self
  }

  pub fn max_iterations(mut self, max_iterations: usize) -> Self {
    self.max_iterations = max_iterations;
    self
  }

  fn select<'t>(&self, text: &'t str) -> Result<Option<Invocation<'t>>, Error> {
    match self.selection {
      Selection::Leftmost => find_invocation(text, self.table, |_| true),
      Selection::DefinitionOrder => {
        for definition in self.table.iter() {
          if let Some(invocation) = find_invocation(text, self.table, |word| word == definition.name())? {
            return Ok(Some(invocation))
          }
        }

        Ok(None)
      },
    }
  }

  /// Expand the next invocation in `text`.
  ///
  /// Returns `None` once `text` contains no invocation of a known macro.
  pub fn expand_once(&self, text: &str) -> Result<Option<String>, Error> {
    let Some(invocation) = self.select(text)? else { return Ok(None) };
    Ok(Some(self.splice(text, &invocation)?))
  }

  fn splice(&self, text: &str, invocation: &Invocation<'_>) -> Result<String, Error> {
    let Some(definition) = self.table.get(invocation.name) else {
      return Err(Error::MalformedDefinition {
        name: invocation.name.to_owned(),
        line: None,
        reason: Malformed::Undefined,
      })
    };

    let replacement = substitute(definition, invocation.args.as_deref())?;
    trace!("{} at {:?} -> {replacement:?}", invocation.name, invocation.span);

    let (before, after) = (&text[..invocation.span.start], &text[invocation.span.end..]);

    let mut out = String::with_capacity(text.len() - invocation.span.len() + replacement.len() + 2);
    out.push_str(before);
    if joins(before.chars().next_back(), replacement.chars().next()) {
      out.push(' ');
    }
    out.push_str(&replacement);
    if joins(replacement.chars().next_back(), after.chars().next()) {
      out.push(' ');
    }
    out.push_str(after);
    Ok(out)
  }

  /// Expand `text` to a fixpoint.
  pub fn expand(&self, text: &str) -> Result<String, Error> {
    let mut text = text.to_owned();
    let mut iterations = 0;

    while let Some(invocation) = self.select(&text)? {
      if iterations == self.max_iterations {
        return Err(Error::ExpansionDidNotTerminate {
          name: invocation.name.to_owned(),
          iterations,
          snippet: text[invocation.span.start..].chars().take(SNIPPET_LEN).collect(),
        })
      }

      text = self.splice(&text, &invocation)?;
      iterations += 1;
    }

    debug!("reached fixpoint after {iterations} expansions");
    Ok(text)
  }
}

/// Whether `left` and `right` would merge into one word when written next to each other.
fn joins(left: Option<char>, right: Option<char>) -> bool {
  matches!((left, right), (Some(l), Some(r)) if is_identifier_continue(l) && is_identifier_continue(r))
}

/// Substitute `args` for the parameters of `definition`.
///
/// Parameters are replaced one after another, so a parameter name must not
/// occur in an argument substituted before it.
pub fn substitute(definition: &MacroDefinition, args: Option<&[&str]>) -> Result<String, Error> {
  let (params, args) = match (definition.parameters(), args) {
    (Some(params), Some(args)) => (params, args),
    (None, None) => return Ok(definition.body().to_owned()),
    (params, args) => {
      return Err(Error::ArityMismatch {
        name: definition.name().to_owned(),
        required: params.map(<[_]>::len).unwrap_or(0),
        given: args.map(<[_]>::len).unwrap_or(0),
      })
    },
  };

  if params.len() != args.len() {
    return Err(Error::ArityMismatch {
      name: definition.name().to_owned(),
      required: params.len(),
      given: args.len(),
    })
  }

  let mut body = definition.body().to_owned();

  for (i, (param, arg)) in params.iter().zip(args).enumerate() {
    if let Some(argument) = args[..i].iter().position(|earlier| contains_word(earlier, param)) {
      return Err(Error::AmbiguousSubstitutionOrder {
        name: definition.name().to_owned(),
        parameter: param.clone(),
        argument,
      })
    }

    body = replace_word(&body, param, arg);
  }

  Ok(body)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table(source: &str) -> DefinitionTable {
    DefinitionTable::parse(source).unwrap()
  }

  #[test]
  fn add() {
    let table = table("#define ADD(a,b) a + b\n");
    assert_eq!(Expander::new(&table).expand("ADD(x,y)").unwrap(), "x + y");
  }

  #[test]
  fn zero_parameters() {
    let table = table("#define EMPTY() {}\n#define PI 3.14\n");
    let expander = Expander::new(&table);

    assert_eq!(expander.expand("EMPTY()").unwrap(), "{}");
    assert_eq!(expander.expand("PI").unwrap(), "3.14");
    assert_eq!(expander.expand("2 * PI * r").unwrap(), "2 * 3.14 * r");
  }

  #[test]
  fn substitution_is_verbatim() {
    let table = table("#define DECL(type, name) type name##_value = name;\n");
    let expanded = Expander::new(&table).expand("DECL(unsigned long, count)").unwrap();
    assert_eq!(expanded, "unsigned long count##_value = count;");
  }

  #[test]
  fn nested_expansion() {
    let table = table(concat!(
      "#define OUTER(name) struct name { INNER(name, int) };\n",
      "#define INNER(field, ty) ty field;\n",
    ));
    let expanded = Expander::new(&table).expand("OUTER(s);\n").unwrap();
    assert_eq!(expanded, "struct s { int s; };;\n");
  }

  #[test]
  fn adjacent_invocations_stay_separate() {
    let table = table("#define ID(x) x\n#define P(a,b) a b\n");

    for selection in [Selection::Leftmost, Selection::DefinitionOrder] {
      let expander = Expander::new(&table).selection(selection);
      assert_eq!(expander.expand("ID(a)ID(b)").unwrap(), "a b");
      assert_eq!(expander.expand("P(1,2)ID(3)").unwrap(), "1 2 3");
      assert_eq!(expander.expand("ID(a)+ID(b)").unwrap(), "a+b");
    }
  }

  #[test]
  fn unknown_invocations_are_kept() {
    let table = table("#define ID(x) x\n");
    assert_eq!(Expander::new(&table).expand("OTHER(1) ID(2)").unwrap(), "OTHER(1) 2");
  }

  #[test]
  fn fixpoint() {
    let table = table("#define A(x) B(x) B(x)\n#define B(x) [x]\n");
    let expander = Expander::new(&table);

    let expanded = expander.expand("A(1) A(2)").unwrap();
    assert_eq!(expanded, "[1] [1] [2] [2]");
    assert_eq!(expander.expand_once(&expanded).unwrap(), None);
  }

  #[test]
  fn expand_once() {
    let table = table("#define A(x) B(x)\n#define B(x) [x]\n");
    let expander = Expander::new(&table);

    assert_eq!(expander.expand_once("A(1)").unwrap().as_deref(), Some("B(1)"));
    assert_eq!(expander.expand_once("B(1)").unwrap().as_deref(), Some("[1]"));
    assert_eq!(expander.expand_once("[1]").unwrap(), None);
  }

  #[test]
  fn selection_order() {
    let table = table("#define LATE(x) late x\n#define EARLY(x) early x\n");
    let text = "EARLY(1) LATE(2)";

    let leftmost = Expander::new(&table);
    assert_eq!(leftmost.expand_once(text).unwrap().as_deref(), Some("early 1 LATE(2)"));

    let definition_order = Expander::new(&table).selection(Selection::DefinitionOrder);
    assert_eq!(definition_order.expand_once(text).unwrap().as_deref(), Some("EARLY(1) late 2"));

    assert_eq!(leftmost.expand(text).unwrap(), definition_order.expand(text).unwrap());
  }

  #[test]
  fn arity_mismatch() {
    let table = table("#define ADD(a,b) a + b\n");
    assert_eq!(
      Expander::new(&table).expand("ADD(1)"),
      Err(Error::ArityMismatch { name: "ADD".into(), required: 2, given: 1 })
    );
  }

  #[test]
  fn ambiguous_substitution_order() {
    let table = table("#define ADD(a,b) a + b\n");
    assert_eq!(
      Expander::new(&table).expand("ADD(b, c)"),
      Err(Error::AmbiguousSubstitutionOrder { name: "ADD".into(), parameter: "b".into(), argument: 0 })
    );
  }

  #[test]
  fn later_parameter_names_in_earlier_positions_are_fine() {
    let table = table("#define ADD(a,b) a + b\n");
    assert_eq!(Expander::new(&table).expand("ADD(x, a)").unwrap(), "x + a");
    assert_eq!(Expander::new(&table).expand("ADD(bb, a_b)").unwrap(), "bb + a_b");
  }

  #[test]
  fn self_reference_does_not_terminate() {
    let table = table("#define LOOP(x) LOOP(x)\n");
    let err = Expander::new(&table).max_iterations(16).expand("start LOOP(1)").unwrap_err();

    assert_eq!(
      err,
      Error::ExpansionDidNotTerminate { name: "LOOP".into(), iterations: 16, snippet: "LOOP(1)".into() }
    );
  }

  #[test]
  fn mutual_recursion_does_not_terminate() {
    let table = table("#define PING PONG\n#define PONG PING\n");
    let err = Expander::new(&table).expand("PING").unwrap_err();
    assert!(matches!(err, Error::ExpansionDidNotTerminate { iterations: DEFAULT_MAX_ITERATIONS, .. }));
  }

  #[test]
  fn nested_parentheses_are_rejected() {
    let table = table("#define ID(x) x\n");
    assert_eq!(
      Expander::new(&table).expand("ID((1))"),
      Err(Error::UnsupportedNestedParentheses { name: "ID".into(), offset: 3 })
    );
  }

  #[test]
  fn substitute_object_like() {
    let pi = MacroDefinition::object_like("PI", "3.14");
    assert_eq!(substitute(&pi, None).unwrap(), "3.14");
    assert_eq!(substitute(&pi, Some(&["1"][..])), Err(Error::ArityMismatch { name: "PI".into(), required: 0, given: 1 }));
  }
}
