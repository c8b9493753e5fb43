//! Descriptor model: one [`Cmd`] per configuration level, holding its
//! flags, positionals, and subcommand branches in declaration order. The
//! matcher and the help renderer both walk this structure and nothing
//! else.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::rt::Tokens;
use crate::Result;

/// How many times a field may (or must) be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Optional,
    Required,
    Repeated,
}

/// A failed conversion, minus the context only the matcher knows.
pub(crate) struct ConvFail {
    pub(crate) ty: &'static str,
    pub(crate) msg: String,
}

pub(crate) type Store<C> = Box<dyn Fn(&mut C, &str) -> Result<(), ConvFail>>;

fn store<C, T, F>(set: F) -> Store<C>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&mut C, T) + 'static,
{
    Box::new(move |cfg, raw| match raw.parse::<T>() {
        Ok(value) => {
            set(cfg, value);
            Ok(())
        }
        Err(err) => Err(ConvFail { ty: std::any::type_name::<T>(), msg: err.to_string() }),
    })
}

pub(crate) enum FlagKind<C> {
    Switch(Box<dyn Fn(&mut C, bool)>),
    Value { metavar: String, store: Store<C> },
}

/// A named option: `--long value`, `-s value`, `--long=value`, or a bare
/// switch.
pub struct Flag<C> {
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    pub(crate) doc: Option<String>,
    pub(crate) arity: Arity,
    pub(crate) required: bool,
    pub(crate) separate: bool,
    pub(crate) env: Option<String>,
    pub(crate) kind: FlagKind<C>,
}

impl<C> Flag<C> {
    fn base(name: &str, arity: Arity, kind: FlagKind<C>) -> Flag<C> {
        Flag {
            name: name.to_string(),
            short: None,
            doc: None,
            arity,
            required: false,
            separate: false,
            env: None,
            kind,
        }
    }

    /// A boolean flag. Binds `true` when present on the command line; an
    /// environment fallback binds whatever `bool` the variable parses to.
    pub fn switch(name: &str, set: impl Fn(&mut C, bool) + 'static) -> Flag<C> {
        Flag::base(name, Arity::Optional, FlagKind::Switch(Box::new(set)))
    }

    /// A flag taking exactly one value, converted with [`FromStr`]. If it
    /// repeats, the last occurrence wins.
    pub fn value<T, F>(name: &str, metavar: &str, set: F) -> Flag<C>
    where
        T: FromStr,
        T::Err: fmt::Display,
        F: Fn(&mut C, T) + 'static,
    {
        let kind = FlagKind::Value { metavar: metavar.to_string(), store: store(set) };
        Flag::base(name, Arity::Optional, kind)
    }

    /// A multi-value flag. By default one occurrence supplies all its
    /// values contiguously (`--ids 1 2 3`); with [`Flag::separate`] each
    /// occurrence contributes exactly one value instead.
    pub fn repeated<T, F>(name: &str, metavar: &str, push: F) -> Flag<C>
    where
        T: FromStr,
        T::Err: fmt::Display,
        F: Fn(&mut C, T) + 'static,
    {
        let kind = FlagKind::Value { metavar: metavar.to_string(), store: store(push) };
        Flag::base(name, Arity::Repeated, kind)
    }

    pub fn short(mut self, short: char) -> Flag<C> {
        self.short = Some(short);
        self
    }

    pub fn help(mut self, doc: &str) -> Flag<C> {
        self.doc = Some(doc.to_string());
        self
    }

    /// Environment variable consulted when no argv token bound this flag.
    pub fn env(mut self, var: &str) -> Flag<C> {
        self.env = Some(var.to_string());
        self
    }

    /// Mark a value flag required: parsing fails unless argv or the
    /// declared environment variable supplies it. Independent of the
    /// flag's multiplicity, so a [`Flag::repeated`] flag (with or
    /// without [`Flag::separate`]) may be required too.
    pub fn required(mut self) -> Flag<C> {
        self.required = true;
        self
    }

    /// Accumulate one value per occurrence (`-c a -c b`) instead of all
    /// values after a single occurrence.
    pub fn separate(mut self) -> Flag<C> {
        self.separate = true;
        self
    }

    pub(crate) fn takes_value(&self) -> bool {
        matches!(self.kind, FlagKind::Value { .. })
    }

    pub(crate) fn display(&self) -> String {
        format!("--{}", self.name)
    }
}

/// A positional argument, identified by position rather than by name.
pub struct Arg<C> {
    pub(crate) metavar: String,
    pub(crate) doc: Option<String>,
    pub(crate) arity: Arity,
    pub(crate) env: Option<String>,
    pub(crate) store: Store<C>,
}

impl<C> Arg<C> {
    fn base<T, F>(metavar: &str, arity: Arity, set: F) -> Arg<C>
    where
        T: FromStr,
        T::Err: fmt::Display,
        F: Fn(&mut C, T) + 'static,
    {
        Arg { metavar: metavar.to_string(), doc: None, arity, env: None, store: store(set) }
    }

    pub fn required<T, F>(metavar: &str, set: F) -> Arg<C>
    where
        T: FromStr,
        T::Err: fmt::Display,
        F: Fn(&mut C, T) + 'static,
    {
        Arg::base(metavar, Arity::Required, set)
    }

    pub fn optional<T, F>(metavar: &str, set: F) -> Arg<C>
    where
        T: FromStr,
        T::Err: fmt::Display,
        F: Fn(&mut C, T) + 'static,
    {
        Arg::base(metavar, Arity::Optional, set)
    }

    /// A trailing multi-value positional. Must be declared last; consumes
    /// every leftover positional token.
    pub fn repeated<T, F>(metavar: &str, push: F) -> Arg<C>
    where
        T: FromStr,
        T::Err: fmt::Display,
        F: Fn(&mut C, T) + 'static,
    {
        Arg::base(metavar, Arity::Repeated, push)
    }

    pub fn help(mut self, doc: &str) -> Arg<C> {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn env(mut self, var: &str) -> Arg<C> {
        self.env = Some(var.to_string());
        self
    }
}

/// A subcommand branch, erased over its payload type so that siblings
/// with different payloads share one list. Exactly one branch can be
/// entered per parse; the others' destinations stay untouched.
pub(crate) trait SubcommandBind<C> {
    fn name(&self) -> &str;
    fn doc(&self) -> Option<&str>;
    fn validate(&self) -> Result<(), ShapeError>;
    fn parse_rest(
        &self,
        cfg: &mut C,
        tokens: &mut Tokens,
        chain: &mut Vec<String>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<()>;
}

struct SubBind<C, S> {
    cmd: Cmd<S>,
    enter: Box<dyn Fn(&mut C) -> &mut S>,
}

impl<C, S> SubcommandBind<C> for SubBind<C, S> {
    fn name(&self) -> &str {
        &self.cmd.name
    }

    fn doc(&self) -> Option<&str> {
        self.cmd.doc.as_deref()
    }

    fn validate(&self) -> Result<(), ShapeError> {
        self.cmd.validate()
    }

    fn parse_rest(
        &self,
        cfg: &mut C,
        tokens: &mut Tokens,
        chain: &mut Vec<String>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let sub = (self.enter)(cfg);
        self.cmd.parse_level(sub, tokens, chain, env)
    }
}

/// One configuration level: the top-level command or a subcommand.
pub struct Cmd<C> {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) flags: Vec<Flag<C>>,
    pub(crate) args: Vec<Arg<C>>,
    pub(crate) subcommands: Vec<Box<dyn SubcommandBind<C>>>,
}

impl<C> Cmd<C> {
    pub fn new(name: &str) -> Cmd<C> {
        Cmd {
            name: name.to_string(),
            doc: None,
            version: None,
            flags: Vec::new(),
            args: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    /// One-line description, shown in this level's help body and next to
    /// the name in the parent's `Commands:` list.
    pub fn help(mut self, doc: &str) -> Cmd<C> {
        self.doc = Some(doc.to_string());
        self
    }

    /// Declare a version string; this reserves `--version`.
    pub fn version(mut self, version: &str) -> Cmd<C> {
        self.version = Some(version.to_string());
        self
    }

    pub fn flag(mut self, flag: Flag<C>) -> Cmd<C> {
        self.flags.push(flag);
        self
    }

    pub fn arg(mut self, arg: Arg<C>) -> Cmd<C> {
        self.args.push(arg);
        self
    }

    /// Attach a subcommand. `enter` projects the parent destination onto
    /// the branch payload, typically
    /// `|c| c.sub.get_or_insert_with(Default::default)`; it runs only when
    /// the branch is selected, so an untouched `Option` field means "not
    /// selected".
    pub fn subcommand<S, F>(mut self, cmd: Cmd<S>, enter: F) -> Cmd<C>
    where
        S: 'static,
        C: 'static,
        F: Fn(&mut C) -> &mut S + 'static,
    {
        self.subcommands.push(Box::new(SubBind { cmd, enter: Box::new(enter) }));
        self
    }

    /// Check the shape invariants, eagerly and recursively. Violations are
    /// programmer errors; the `parse_*` entry points panic on them.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let mut longs: HashSet<&str> = HashSet::new();
        longs.insert("help");
        if self.version.is_some() {
            longs.insert("version");
        }
        let mut shorts: HashSet<char> = HashSet::new();
        shorts.insert('h');

        for flag in &self.flags {
            if flag.name == "help" {
                return Err(ShapeError::new("`--help` is reserved"));
            }
            if flag.name == "version" && self.version.is_some() {
                return Err(ShapeError::new("`--version` is reserved"));
            }
            if !longs.insert(&flag.name) {
                return Err(ShapeError::new(format!("flag declared twice: `--{}`", flag.name)));
            }
            if let Some(short) = flag.short {
                if short == 'h' {
                    return Err(ShapeError::new("`-h` is reserved"));
                }
                if !shorts.insert(short) {
                    return Err(ShapeError::new(format!("short alias declared twice: `-{short}`")));
                }
            }
            if flag.separate && flag.arity != Arity::Repeated {
                return Err(ShapeError::new(format!(
                    "`--{}` is separate but not repeated",
                    flag.name
                )));
            }
        }

        let last = self.args.len().wrapping_sub(1);
        for (idx, arg) in self.args.iter().enumerate() {
            if arg.arity == Arity::Repeated && idx != last {
                return Err(ShapeError::new(format!(
                    "repeated positional `{}` must be declared last",
                    arg.metavar
                )));
            }
        }

        let mut names: HashSet<&str> = HashSet::new();
        for sub in &self.subcommands {
            if !names.insert(sub.name()) {
                return Err(ShapeError::new(format!(
                    "subcommand declared twice: `{}`",
                    sub.name()
                )));
            }
            sub.validate()?;
        }
        Ok(())
    }
}

/// Invalid descriptor shape: a programming bug in the declaration, never
/// a runtime condition to recover from.
#[derive(Debug)]
pub struct ShapeError {
    msg: String,
}

impl ShapeError {
    fn new(msg: impl Into<String>) -> ShapeError {
        ShapeError { msg: msg.into() }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.msg, f)
    }
}
