use std::{error, fmt};

/// The reason a macro definition is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
  /// A parameter is not an identifier.
  InvalidParameter(String),
  /// A parameter name is used more than once.
  DuplicateParameter(String),
  /// The parameter list is not closed on the definition line.
  UnclosedParameterList,
  /// The last body line ends with a continuation marker.
  UnterminatedBody,
  /// The macro is invoked but never defined.
  Undefined,
}

impl fmt::Display for Malformed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidParameter(param) => write!(f, "parameter `{param}` is not an identifier"),
      Self::DuplicateParameter(param) => write!(f, "parameter `{param}` is not unique"),
      Self::UnclosedParameterList => f.write_str("parameter list is not closed"),
      Self::UnterminatedBody => f.write_str("body ends with a line continuation"),
      Self::Undefined => f.write_str("macro is not defined"),
    }
  }
}

/// An error during definition extraction or macro expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// A definition cannot be parsed, or an invoked macro is not defined.
  MalformedDefinition {
    /// The macro name.
    name: String,
    /// The 1-based line of the definition, if it exists.
    line: Option<usize>,
    /// What is wrong with it.
    reason: Malformed,
  },
  /// Function-like macro called with wrong number of arguments.
  ArityMismatch {
    /// The macro name.
    name: String,
    /// The required number of arguments.
    required: usize,
    /// The given number of arguments.
    given: usize,
  },
  /// A parameter name occurs as a token in an argument that was substituted before it.
  AmbiguousSubstitutionOrder {
    /// The macro name.
    name: String,
    /// The parameter which would be substituted again.
    parameter: String,
    /// Index of the argument containing the parameter name.
    argument: usize,
  },
  /// An argument contains a parenthesis.
  UnsupportedNestedParentheses {
    /// The macro name.
    name: String,
    /// Byte offset of the nested `(`.
    offset: usize,
  },
  /// An invocation is missing its closing parenthesis.
  UnterminatedInvocation {
    /// The macro name.
    name: String,
    /// Byte offset of the invocation.
    offset: usize,
  },
  /// Expansion did not reach a fixpoint within the iteration limit.
  ExpansionDidNotTerminate {
    /// The macro being expanded when the limit was hit.
    name: String,
    /// The iteration limit.
    iterations: usize,
    /// Text at the offending invocation.
    snippet: String,
  },
}

impl Error {
  /// The name of the macro this error is about.
  pub fn macro_name(&self) -> &str {
    match self {
      Self::MalformedDefinition { name, .. }
      | Self::ArityMismatch { name, .. }
      | Self::AmbiguousSubstitutionOrder { name, .. }
      | Self::UnsupportedNestedParentheses { name, .. }
      | Self::UnterminatedInvocation { name, .. }
      | Self::ExpansionDidNotTerminate { name, .. } => name,
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MalformedDefinition { name, line: Some(line), reason } => {
        write!(f, "malformed definition of {name} on line {line}: {reason}")
      },
      Self::MalformedDefinition { name, line: None, reason } => write!(f, "malformed definition of {name}: {reason}"),
      Self::ArityMismatch { name, required, given } => {
        write!(f, "macro {name} requires {required} arguments, {given} given")
      },
      Self::AmbiguousSubstitutionOrder { name, parameter, argument } => write!(
        f,
        "macro {name}: parameter `{parameter}` occurs in argument {argument}, substitution order is ambiguous"
      ),
      Self::UnsupportedNestedParentheses { name, offset } => {
        write!(f, "macro {name}: arguments must not contain parentheses (offset {offset})")
      },
      Self::UnterminatedInvocation { name, offset } => {
        write!(f, "macro {name}: invocation at offset {offset} is missing `)`")
      },
      Self::ExpansionDidNotTerminate { name, iterations, snippet } => {
        write!(f, "expansion did not terminate after {iterations} iterations while expanding {name}: {snippet:?}")
      },
    }
  }
}

impl error::Error for Error {}
