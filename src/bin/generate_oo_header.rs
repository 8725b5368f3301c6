use std::{
  fmt, fs, io,
  path::{Path, PathBuf},
  process,
};

use annotate_snippets::{
  display_list::{DisplayList, FormatOptions},
  snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation},
};
use clap::Parser;
use log::{info, LevelFilter};

use oo_header::{generate, DefinitionTable, LineContinuation, Options, Selection, DEFAULT_MAX_ITERATIONS};

/// Location of the macro definitions relative to the project root.
const DEFAULT_MACROS: &str = "src/include/darma/impl/oo/macros.h";

/// Generate a regular header file from the object-oriented helper macros
/// for easier debugging.
#[derive(Debug, Parser)]
#[command(name = "generate-oo-header", version, about, long_about = None, max_term_width(100))]
struct Cli {
  /// Generate an expansion of the tag macro for TAG.
  #[arg(short = 't', long = "tag", value_name = "TAG")]
  tags: Vec<String>,

  /// Generate an expansion of the class macro for CLASS.
  #[arg(short = 'c', long = "cls", value_name = "CLASS")]
  classes: Vec<String>,

  /// Path of the file to generate. Defaults to ootag_<TAG>.generated.h if a
  /// tag is given, oocls_<CLASS>.generated.h if a class is given, and
  /// oo.generated.h if neither or both are given.
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Folder to put the generated file in.
  #[arg(short, long, value_name = "PATH", default_value = ".")]
  folder: PathBuf,

  /// The file containing the macro definitions. Defaults to the OO macros
  /// header below --root.
  #[arg(short, long, value_name = "FILE")]
  macros: Option<PathBuf>,

  /// Project root used to locate the default macros file.
  #[arg(long, value_name = "PATH", default_value = ".")]
  root: PathBuf,

  /// Which invocation is expanded first when several are present.
  #[arg(long, value_enum, default_value_t = SelectionArg::Leftmost)]
  selection: SelectionArg,

  /// Give up after this many expansions.
  #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ITERATIONS)]
  max_iterations: usize,

  /// Keep a line break wherever a continued line is joined.
  #[arg(long)]
  keep_line_breaks: bool,

  /// Be verbose.
  #[arg(short, long)]
  verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum SelectionArg {
  /// Expand the invocation which starts first.
  Leftmost,
  /// Expand the first macro in definition order.
  DefinitionOrder,
}

impl From<SelectionArg> for Selection {
  fn from(arg: SelectionArg) -> Self {
    match arg {
      SelectionArg::Leftmost => Self::Leftmost,
      SelectionArg::DefinitionOrder => Self::DefinitionOrder,
    }
  }
}

#[derive(Debug)]
enum CliError {
  MissingSource(PathBuf),
  Read(PathBuf, io::Error),
  Write(PathBuf, io::Error),
  Generate { path: PathBuf, source: String, err: oo_header::Error },
}

impl CliError {
  fn exit_code(&self) -> i32 {
    match self {
      Self::MissingSource(_) => 2,
      _ => 1,
    }
  }
}

impl fmt::Display for CliError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingSource(path) => write!(f, "can't find macros file {}", path.display()),
      Self::Read(path, err) => write!(f, "failed to read `{}`: {err}", path.display()),
      Self::Write(path, err) => write!(f, "failed to write `{}`: {err}", path.display()),
      Self::Generate { path, source, err } => match err {
        oo_header::Error::MalformedDefinition { line: Some(line), .. } => {
          render_definition_error(f, path, source, *line, &err.to_string())
        },
        err => write!(f, "{err}"),
      },
    }
  }
}

/// Show the offending definition line below the error message.
fn render_definition_error(
  f: &mut fmt::Formatter<'_>,
  path: &Path,
  source: &str,
  line: usize,
  message: &str,
) -> fmt::Result {
  let text = source.lines().nth(line.saturating_sub(1)).unwrap_or_default();
  let len = text.chars().count();
  if len == 0 {
    return f.write_str(message)
  }

  let origin = path.display().to_string();
  let snippet = Snippet {
    title: Some(Annotation { label: Some(message), id: None, annotation_type: AnnotationType::Error }),
    footer: vec![],
    slices: vec![Slice {
      source: text,
      line_start: line,
      origin: Some(origin.as_str()),
      fold: false,
      annotations: vec![SourceAnnotation { label: "", annotation_type: AnnotationType::Error, range: (0, len) }],
    }],
    opt: FormatOptions { color: true, ..Default::default() },
  };

  write!(f, "{}", DisplayList::from(snippet))
}

/// The output file name derived from the requested names.
fn default_file_name(tags: &[String], classes: &[String]) -> String {
  match (tags.first(), classes.first()) {
    (Some(tag), None) => format!("ootag_{tag}.generated.h"),
    (None, Some(class)) => format!("oocls_{class}.generated.h"),
    _ => "oo.generated.h".into(),
  }
}

impl Cli {
  fn macros_path(&self) -> PathBuf {
    self.macros.clone().unwrap_or_else(|| self.root.join(DEFAULT_MACROS))
  }

  fn output_path(&self) -> PathBuf {
    match &self.output {
      Some(output) => output.clone(),
      None => self.folder.join(default_file_name(&self.tags, &self.classes)),
    }
  }

  fn options(&self) -> Options {
    Options {
      selection: self.selection.into(),
      max_iterations: self.max_iterations,
      continuation: if self.keep_line_breaks { LineContinuation::KeepLineBreak } else { LineContinuation::Join },
      ..Options::default()
    }
  }

  fn run(self) -> Result<(), CliError> {
    let macros = self.macros_path();
    if !macros.is_file() {
      return Err(CliError::MissingSource(macros))
    }

    let source = fs::read_to_string(&macros).map_err(|err| CliError::Read(macros.clone(), err))?;
    let generated = DefinitionTable::parse(&source)
      .and_then(|table| generate(&table, &self.tags, &self.classes, &self.options()))
      .map_err(|err| CliError::Generate { path: macros.clone(), source, err })?;

    let output = self.output_path();
    info!("writing {}", output.display());

    let mut contents = generated;
    if !contents.ends_with('\n') {
      contents.push('\n');
    }
    fs::write(&output, contents).map_err(|err| CliError::Write(output, err))
  }
}

fn init_logger(verbose: bool) {
  let mut builder = pretty_env_logger::formatted_builder();
  builder.filter_level(if verbose { LevelFilter::Info } else { LevelFilter::Warn });

  if let Ok(filters) = std::env::var("RUST_LOG") {
    builder.parse_filters(&filters);
  }

  builder.init();
}

fn main() {
  let cli = Cli::parse();
  init_logger(cli.verbose);

  if let Err(err) = cli.run() {
    eprintln!("Error: {err}");
    process::exit(err.exit_code());
  }
}
