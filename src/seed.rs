/// Builds the text which is expanded.
///
/// The seed is the include directive followed by one invocation per line,
/// tags before classes:
///
/// ```
/// use oo_header::SeedTemplate;
///
/// let seed = SeedTemplate::default().render(&["color"], &["Car"]);
/// assert_eq!(seed, "#include <darma.h>\nDARMA_OO_DEFINE_TAG(color);\nDARMA_OO_DECLARE_CLASS(Car);\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTemplate {
  /// The directive on the first line.
  pub include: String,
  /// The macro invoked once per tag.
  pub tag_macro: String,
  /// The macro invoked once per class.
  pub class_macro: String,
}

impl Default for SeedTemplate {
  fn default() -> Self {
    Self {
      include: "#include <darma.h>".into(),
      tag_macro: "DARMA_OO_DEFINE_TAG".into(),
      class_macro: "DARMA_OO_DECLARE_CLASS".into(),
    }
  }
}

impl SeedTemplate {
  pub fn render<T, C>(&self, tags: &[T], classes: &[C]) -> String
  where
    T: AsRef<str>,
    C: AsRef<str>,
  {
    let mut text = format!("{}\n", self.include);

    let tags = tags.iter().map(|tag| (&self.tag_macro, tag.as_ref()));
    let classes = classes.iter().map(|class| (&self.class_macro, class.as_ref()));

    for (name, arg) in tags.chain(classes) {
      text.push_str(&format!("{name}({arg});\n"));
    }

    text
  }

  /// The macros a rendered seed invokes.
  pub fn invoked_macros(&self, tags: usize, classes: usize) -> impl Iterator<Item = &str> {
    let tag_macro = (tags > 0).then_some(self.tag_macro.as_str());
    let class_macro = (classes > 0).then_some(self.class_macro.as_str());
    tag_macro.into_iter().chain(class_macro)
  }
}
