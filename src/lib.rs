//! Declarative command line arguments parser.
//!
//! `argbind` takes a description of a program's configuration (a tree of
//! typed fields, positionals, and subcommands) and populates the caller's
//! own struct from argv, the environment, and pre-set defaults, in that
//! order of precedence. The same descriptor tree drives the matcher and
//! the generated help text, so the two cannot drift apart.
//!
//! ```
//! use argbind::{Arg, Cmd, Flag};
//!
//! #[derive(Debug, Default)]
//! struct Args {
//!     verbose: bool,
//!     optimize: i64,
//!     input: String,
//!     output: Vec<String>,
//! }
//!
//! let cmd = Cmd::new("example")
//!     .flag(Flag::switch("verbose", |a: &mut Args, v| a.verbose = v).short('v'))
//!     .flag(Flag::value("optimize", "LEVEL", |a: &mut Args, v| a.optimize = v).short('O'))
//!     .arg(Arg::required("INPUT", |a: &mut Args, v| a.input = v))
//!     .arg(Arg::repeated("OUTPUT", |a: &mut Args, v| a.output.push(v)));
//!
//! let mut args = Args::default();
//! let argv = vec!["-v".into(), "-O".into(), "2".into(), "in".into(), "a".into(), "b".into()];
//! cmd.parse_into(&mut args, argv)?;
//! assert!(args.verbose);
//! assert_eq!(args.optimize, 2);
//! assert_eq!(args.input, "in");
//! assert_eq!(args.output, ["a", "b"]);
//! # Ok::<(), argbind::Error>(())
//! ```
//!
//! Accepted syntax: `--name value`, `--name=value`, `-n value`, `-nvalue`,
//! bundled short switches (`-abc`), and a literal `--` after which every
//! token is positional. In a bundle, the first value-taking short ends the
//! bundle and takes the rest of the token as its value (`-Ofile`), or the
//! next token if the bundle is exhausted (`-O file`).
//!
//! Defaults are whatever the caller left in the destination before the
//! parse: a field that no argv token and no environment variable touched
//! keeps its pre-set value. On failure the destination must be treated as
//! undefined.
//!
//! `--help`/`-h` (and `--version`, when [`Cmd::version`] was set) stop the
//! parse and surface the rendered text through the [`Error`] channel with
//! [`Error::is_help`] set; [`Error::exit`] routes that text to stdout with
//! a zero status, and everything else to stderr as `usage` + `error:` with
//! a non-zero status.

use std::fmt;
use std::io::{self, Write};

mod cmd;
mod help;
mod parse;
mod rt;

pub use crate::cmd::{Arg, Arity, Cmd, Flag, ShapeError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failed (or short-circuited) parse, carrying the usage synopsis of the
/// deepest resolved level.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    usage: String,
}

/// What went wrong, in terms a caller can match on.
///
/// `Help` and `Version` are not failures: they ride the error channel
/// because they short-circuit the parse, and exit with status 0.
#[derive(Debug)]
pub enum ErrorKind {
    /// Rendered help text for the level that was resolved when
    /// `--help`/`-h` appeared.
    Help { text: String },
    /// Rendered version line.
    Version { text: String },
    /// A flag-shaped token matching no descriptor at the current level.
    UnknownFlag { flag: String },
    /// A value-taking flag at end of input, or followed by another flag.
    MissingValue { flag: String },
    /// An inline `=value` handed to a switch.
    UnexpectedValue { flag: String },
    /// A literal that does not convert to the field's type.
    Conversion { name: String, value: String, ty: &'static str, msg: String },
    /// A required field with no argv token and no environment value.
    MissingRequired { name: String },
    /// Positional text with no open positional slot and no matching
    /// subcommand.
    AmbiguousSubcommand { token: String, has_subcommands: bool },
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, usage: String) -> Error {
        Error { kind, usage }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Usage synopsis for the level the parse had resolved.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// `--help` and `--version` requests exit with status 0.
    pub fn is_help(&self) -> bool {
        matches!(self.kind, ErrorKind::Help { .. } | ErrorKind::Version { .. })
    }

    /// Write this outcome to `out` the way the CLI shim would: help and
    /// version text verbatim, everything else as usage + `error:` line.
    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        match &self.kind {
            ErrorKind::Help { text } | ErrorKind::Version { text } => out.write_all(text.as_bytes()),
            _ => {
                writeln!(out, "{}", self.usage)?;
                writeln!(out, "error: {self}")
            }
        }
    }

    /// Terminal form: help/version to stdout with status 0, errors to
    /// stderr with status 2.
    pub fn exit(self) -> ! {
        if self.is_help() {
            let _ = self.print(&mut io::stdout());
            std::process::exit(0)
        }
        let _ = self.print(&mut io::stderr());
        std::process::exit(2)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Help { text } | ErrorKind::Version { text } => f.write_str(text),
            ErrorKind::UnknownFlag { flag } => write!(f, "unknown flag: `{flag}`"),
            ErrorKind::MissingValue { flag } => write!(f, "expected a value for `{flag}`"),
            ErrorKind::UnexpectedValue { flag } => {
                write!(f, "flag does not take a value: `{flag}`")
            }
            ErrorKind::Conversion { name, value, ty, msg } => {
                write!(f, "error processing `{name}`: can't parse `{value}` as {}: {msg}", short_ty(ty))
            }
            ErrorKind::MissingRequired { name } => write!(f, "`{name}` is required"),
            ErrorKind::AmbiguousSubcommand { token, has_subcommands } => {
                if *has_subcommands {
                    write!(f, "invalid subcommand: `{token}`")
                } else {
                    write!(f, "too many positional arguments: `{token}`")
                }
            }
        }
    }
}

// `type_name` spells out the full path; the last segment reads better in a
// user-facing message.
fn short_ty(ty: &str) -> &str {
    ty.rsplit("::").next().unwrap_or(ty)
}
