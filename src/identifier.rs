use nom::{
  bytes::complete::take_while,
  character::complete::satisfy,
  combinator::recognize,
  sequence::pair,
  IResult,
};

pub(crate) fn is_identifier_start(c: char) -> bool {
  c == '_' || unicode_ident::is_xid_start(c)
}

pub(crate) fn is_identifier_continue(c: char) -> bool {
  unicode_ident::is_xid_continue(c)
}

/// Parse an identifier at the start of `input`.
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(pair(satisfy(is_identifier_start), take_while(is_identifier_continue)))(input)
}

/// Check whether the whole string is a single identifier.
pub fn is_identifier(s: &str) -> bool {
  matches!(identifier(s), Ok(("", _)))
}

/// Iterator over the words of a text, together with their byte offsets.
///
/// A word is a maximal run of identifier characters, so `a##b` has the
/// words `a` and `b`, and `x1` is never split into `x` and `1`.
#[derive(Debug, Clone)]
pub(crate) struct Words<'t> {
  text: &'t str,
  pos: usize,
}

impl<'t> Iterator for Words<'t> {
  type Item = (usize, &'t str);

  fn next(&mut self) -> Option<Self::Item> {
    let rest = &self.text[self.pos..];
    let (skip, _) = rest.char_indices().find(|&(_, c)| is_identifier_continue(c))?;
    let start = self.pos + skip;
    let len = self.text[start..].find(|c: char| !is_identifier_continue(c)).unwrap_or(self.text.len() - start);

    self.pos = start + len;
    Some((start, &self.text[start..self.pos]))
  }
}

pub(crate) fn words(text: &str) -> Words<'_> {
  Words { text, pos: 0 }
}

/// Check whether `word` occurs as a whole word in `text`.
pub(crate) fn contains_word(text: &str, word: &str) -> bool {
  words(text).any(|(_, w)| w == word)
}

/// Replace every whole-word occurrence of `word` in `text`.
pub(crate) fn replace_word(text: &str, word: &str, replacement: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut last = 0;

  for (start, w) in words(text).filter(|&(_, w)| w == word) {
    out.push_str(&text[last..start]);
    out.push_str(replacement);
    last = start + w.len();
  }

  out.push_str(&text[last..]);
  out
}
