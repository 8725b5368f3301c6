use nom::{
  character::complete::{char, line_ending, space0},
  combinator::recognize,
  sequence::tuple,
  IResult,
};

use crate::identifier::is_identifier_continue;

/// How continuation markers are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineContinuation {
  /// Remove the marker and the line break, joining both lines.
  #[default]
  Join,
  /// Remove only the marker.
  KeepLineBreak,
}

/// A `\` followed by a line break.
pub(crate) fn continuation(input: &str) -> IResult<&str, &str> {
  recognize(tuple((char('\\'), space0, line_ending)))(input)
}

/// Rewrites a fully expanded text.
///
/// The stages run in a fixed order: continuation markers are handled first,
/// then `##` is deleted, then `#word` becomes `"word"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessor {
  continuation: LineContinuation,
}

impl PostProcessor {
  pub fn new(continuation: LineContinuation) -> Self {
    Self { continuation }
  }

  pub fn process(&self, text: &str) -> String {
    let text = self.join_lines(text);
    let text = strip_paste(&text);
    stringify(&text)
  }

  fn join_lines(&self, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(i) = rest.find('\\') {
      out.push_str(&rest[..i]);

      match continuation(&rest[i..]) {
        Ok((remaining, _)) => {
          if self.continuation == LineContinuation::KeepLineBreak {
            out.push('\n');
          }
          rest = remaining;
        },
        Err(_) => {
          out.push('\\');
          rest = &rest[(i + 1)..];
        },
      }
    }

    out.push_str(rest);
    out
  }
}

/// Delete every `##`.
///
/// This is plain deletion: `a ## b` becomes `a  b`, not `ab`.
pub(crate) fn strip_paste(text: &str) -> String {
  text.replace("##", "")
}

/// Turn `#word` into `"word"`, except for words starting with `include`.
pub(crate) fn stringify(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(i) = rest.find('#') {
    out.push_str(&rest[..i]);

    let after = &rest[(i + 1)..];
    let len = after.find(|c: char| !is_identifier_continue(c)).unwrap_or(after.len());
    let word = &after[..len];

    if word.is_empty() || word.starts_with("include") {
      out.push('#');
      out.push_str(word);
    } else {
      out.push('"');
      out.push_str(word);
      out.push('"');
    }

    rest = &after[len..];
  }

  out.push_str(rest);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn process(text: &str) -> String {
    PostProcessor::default().process(text)
  }

  #[test]
  fn parse_continuation() {
    assert_eq!(continuation("\\\nrest"), Ok(("rest", "\\\n")));
    assert_eq!(continuation("\\ \t\r\nrest"), Ok(("rest", "\\ \t\r\n")));
    assert!(continuation("\\n").is_err());
    assert!(continuation("\\ x\n").is_err());
  }

  #[test]
  fn join_continued_lines() {
    assert_eq!(process("first \\\nrest"), "first rest");
    assert_eq!(process("a\\  \nb\\\nc\n"), "abc\n");
  }

  #[test]
  fn keep_line_breaks() {
    let processor = PostProcessor::new(LineContinuation::KeepLineBreak);
    assert_eq!(processor.process("first \\\nrest \\\r\nend"), "first \nrest \nend");
  }

  #[test]
  fn backslashes_elsewhere_are_kept() {
    assert_eq!(process(r#"char c = '\\'; "\n" \"#), r#"char c = '\\'; "\n" \"#);
  }

  #[test]
  fn paste() {
    assert_eq!(process("A##B"), "AB");
    assert_eq!(process("_darma__##tag##__oo_access"), "_darma__tag__oo_access");
    assert_eq!(process("a ## b"), "a  b");
  }

  #[test]
  fn stringification() {
    assert_eq!(process("#foo"), "\"foo\"");
    assert_eq!(process("return #name;"), "return \"name\";");
    assert_eq!(process("#1"), "\"1\"");
    assert_eq!(process("# foo"), "# foo");
    assert_eq!(process("#"), "#");
  }

  #[test]
  fn include_is_not_stringified() {
    assert_eq!(process("#include <x.h>"), "#include <x.h>");
    assert_eq!(process("#include <x.h>\n#x"), "#include <x.h>\n\"x\"");
    assert_eq!(process("#include_next <a>"), "#include_next <a>");
  }

  #[test]
  fn stages_run_in_order() {
    // The paste marker is gone before stringification looks at `#`.
    assert_eq!(process("#a##b"), "\"ab\"");
    // A joined line can complete a stringification.
    assert_eq!(process("x = #\\\nname"), "x = \"name\"");
  }
}
