//! The matcher: walks the token stream against one [`Cmd`] level at a
//! time, binding values through the descriptors' stores, then resolves
//! environment fallbacks and required-field checks for every level on the
//! selected chain.

use std::ffi::OsString;

use crate::cmd::{Arity, Cmd, Flag, FlagKind, Store};
use crate::help;
use crate::rt::Tokens;
use crate::{Error, ErrorKind, Result};

impl<C> Cmd<C> {
    /// Parse an explicit argv (without the program name) into `cfg`,
    /// consulting the process environment for declared fallbacks.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor tree violates a shape invariant, see
    /// [`Cmd::validate`].
    pub fn parse_into(&self, cfg: &mut C, args: Vec<OsString>) -> Result<()> {
        self.parse_with(cfg, Tokens::new(args), &|var| std::env::var(var).ok())
    }

    /// Like [`Cmd::parse_into`], but environment lookups go through the
    /// given table instead of the process environment. An empty table
    /// means no fallbacks fire.
    pub fn parse_into_with_env(
        &self,
        cfg: &mut C,
        args: Vec<OsString>,
        env: &[(&str, &str)],
    ) -> Result<()> {
        let lookup = |var: &str| {
            env.iter().find(|(name, _)| *name == var).map(|(_, value)| value.to_string())
        };
        self.parse_with(cfg, Tokens::new(args), &lookup)
    }

    /// Parse the process arguments, dropping `argv[0]`.
    pub fn parse_from_env(&self, cfg: &mut C) -> Result<()> {
        self.parse_with(cfg, Tokens::from_env(), &|var| std::env::var(var).ok())
    }

    /// [`Cmd::parse_from_env`] with the standard terminal behavior on any
    /// non-`Ok` outcome, see [`Error::exit`].
    pub fn parse_or_exit(&self, cfg: &mut C) {
        if let Err(err) = self.parse_from_env(cfg) {
            err.exit()
        }
    }

    fn parse_with(
        &self,
        cfg: &mut C,
        mut tokens: Tokens,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Err(err) = self.validate() {
            panic!("invalid command shape: {err}")
        }
        let mut chain = vec![self.name.clone()];
        self.parse_level(cfg, &mut tokens, &mut chain, env)
    }

    /// One level of the loop. `chain` holds the command names resolved so
    /// far, this level's included; on subcommand entry the branch name is
    /// pushed and the remaining tokens handed down.
    pub(crate) fn parse_level(
        &self,
        cfg: &mut C,
        tokens: &mut Tokens,
        chain: &mut Vec<String>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let depth = chain.len();
        let mut flag_seen = vec![false; self.flags.len()];
        let mut arg_seen = vec![false; self.args.len()];

        while let Some(token) = tokens.pop_flag() {
            let word = match token {
                Ok(flag) => {
                    self.bind_flag(cfg, tokens, &chain[..depth], &flag, &mut flag_seen)?;
                    continue;
                }
                Err(word) => word,
            };

            let open = self
                .args
                .iter()
                .enumerate()
                .find(|(idx, arg)| arg.arity != Arity::Repeated && !arg_seen[*idx])
                .map(|(idx, _)| idx);
            if let Some(idx) = open {
                let arg = &self.args[idx];
                let text = self.utf8(&chain[..depth], &arg.metavar, word)?;
                self.store_value(&chain[..depth], &arg.metavar, &arg.store, cfg, &text)?;
                arg_seen[idx] = true;
                continue;
            }

            // A recognized subcommand name wins; anything else still
            // feeds a trailing repeated positional.
            let selected = word
                .to_str()
                .and_then(|text| self.subcommands.iter().find(|sub| sub.name() == text));
            if let Some(sub) = selected {
                chain.push(sub.name().to_string());
                sub.parse_rest(cfg, tokens, chain, env)?;
                return self.resolve_level(cfg, &chain[..depth], &flag_seen, &arg_seen, env, false);
            }

            if let Some((idx, arg)) =
                self.args.iter().enumerate().find(|(_, arg)| arg.arity == Arity::Repeated)
            {
                let text = self.utf8(&chain[..depth], &arg.metavar, word)?;
                self.store_value(&chain[..depth], &arg.metavar, &arg.store, cfg, &text)?;
                arg_seen[idx] = true;
                continue;
            }

            let token = word.to_string_lossy().into_owned();
            let kind = ErrorKind::AmbiguousSubcommand {
                token,
                has_subcommands: !self.subcommands.is_empty(),
            };
            return Err(self.err(&chain[..depth], kind));
        }

        self.resolve_level(cfg, &chain[..depth], &flag_seen, &arg_seen, env, true)
    }

    fn bind_flag(
        &self,
        cfg: &mut C,
        tokens: &mut Tokens,
        chain: &[String],
        text: &str,
        flag_seen: &mut [bool],
    ) -> Result<()> {
        if let Some(rest) = text.strip_prefix("--") {
            let (name, inline) = match rest.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (rest, None),
            };
            if name == "help" {
                let kind = ErrorKind::Help { text: help::render(self, chain) };
                return Err(self.err(chain, kind));
            }
            if name == "version" {
                if let Some(version) = &self.version {
                    let kind = ErrorKind::Version { text: format!("{} {version}\n", chain[0]) };
                    return Err(self.err(chain, kind));
                }
            }
            let idx = match self.flags.iter().position(|flag| flag.name == name) {
                Some(idx) => idx,
                None => {
                    let kind = ErrorKind::UnknownFlag { flag: format!("--{name}") };
                    return Err(self.err(chain, kind));
                }
            };
            self.apply_flag(cfg, tokens, chain, idx, inline)?;
            flag_seen[idx] = true;
            return Ok(());
        }

        // A short bundle: switches chain, the first value-taking short
        // ends the bundle and the rest of the token (minus an optional
        // leading `=`) is its inline value.
        let shorts = &text[1..];
        for (pos, ch) in shorts.char_indices() {
            if ch == 'h' {
                let kind = ErrorKind::Help { text: help::render(self, chain) };
                return Err(self.err(chain, kind));
            }
            let idx = match self.flags.iter().position(|flag| flag.short == Some(ch)) {
                Some(idx) => idx,
                None => {
                    let kind = ErrorKind::UnknownFlag { flag: format!("-{ch}") };
                    return Err(self.err(chain, kind));
                }
            };
            if self.flags[idx].takes_value() {
                let rest = &shorts[pos + ch.len_utf8()..];
                let inline = match rest.strip_prefix('=').unwrap_or(rest) {
                    "" => None,
                    value => Some(value),
                };
                self.apply_flag(cfg, tokens, chain, idx, inline)?;
                flag_seen[idx] = true;
                return Ok(());
            }
            self.apply_flag(cfg, tokens, chain, idx, None)?;
            flag_seen[idx] = true;
        }
        Ok(())
    }

    fn apply_flag(
        &self,
        cfg: &mut C,
        tokens: &mut Tokens,
        chain: &[String],
        idx: usize,
        inline: Option<&str>,
    ) -> Result<()> {
        let flag = &self.flags[idx];
        let store = match &flag.kind {
            FlagKind::Switch(set) => {
                if inline.is_some() {
                    let kind = ErrorKind::UnexpectedValue { flag: flag.display() };
                    return Err(self.err(chain, kind));
                }
                set(cfg, true);
                return Ok(());
            }
            FlagKind::Value { store, .. } => store,
        };

        if let Some(value) = inline {
            // An inline value binds exactly one element, repeated or not.
            return self.store_value(chain, &flag.display(), store, cfg, value);
        }

        let first = self.next_flag_value(tokens, chain, flag)?;
        self.store_value(chain, &flag.display(), store, cfg, &first)?;
        if flag.arity == Arity::Repeated && !flag.separate {
            while let Some(word) = tokens.next_if_value() {
                let text = self.utf8(chain, &flag.display(), word)?;
                self.store_value(chain, &flag.display(), store, cfg, &text)?;
            }
        }
        Ok(())
    }

    fn next_flag_value(
        &self,
        tokens: &mut Tokens,
        chain: &[String],
        flag: &Flag<C>,
    ) -> Result<String> {
        match tokens.next_if_value() {
            Some(word) => self.utf8(chain, &flag.display(), word),
            None => Err(self.err(chain, ErrorKind::MissingValue { flag: flag.display() })),
        }
    }

    /// Post-token resolution for one level: environment fallbacks for
    /// fields argv never touched, then the required check. Required is
    /// only enforced at the deepest selected level; a parent whose
    /// subcommand was entered resolves its environment fallbacks but
    /// leaves its required fields to the pre-set defaults check below it.
    fn resolve_level(
        &self,
        cfg: &mut C,
        chain: &[String],
        flag_seen: &[bool],
        arg_seen: &[bool],
        env: &dyn Fn(&str) -> Option<String>,
        final_level: bool,
    ) -> Result<()> {
        for (flag, &seen) in self.flags.iter().zip(flag_seen) {
            if seen {
                continue;
            }
            let value = flag.env.as_deref().and_then(env);
            if let Some(raw) = value {
                self.bind_env_flag(cfg, chain, flag, &raw)?;
                continue;
            }
            if final_level && flag.required {
                let kind = ErrorKind::MissingRequired { name: flag.display() };
                return Err(self.err(chain, kind));
            }
        }

        for (arg, &seen) in self.args.iter().zip(arg_seen) {
            if seen {
                continue;
            }
            let value = arg.env.as_deref().and_then(env);
            if let Some(raw) = value {
                match arg.arity {
                    Arity::Repeated => {
                        for part in raw.split(',') {
                            self.store_value(chain, &arg.metavar, &arg.store, cfg, part)?;
                        }
                    }
                    _ => self.store_value(chain, &arg.metavar, &arg.store, cfg, &raw)?,
                }
                continue;
            }
            if final_level && arg.arity == Arity::Required {
                let kind = ErrorKind::MissingRequired { name: arg.metavar.clone() };
                return Err(self.err(chain, kind));
            }
        }
        Ok(())
    }

    fn bind_env_flag(&self, cfg: &mut C, chain: &[String], flag: &Flag<C>, raw: &str) -> Result<()> {
        match &flag.kind {
            FlagKind::Switch(set) => match raw.parse::<bool>() {
                Ok(value) => {
                    set(cfg, value);
                    Ok(())
                }
                Err(err) => {
                    let kind = ErrorKind::Conversion {
                        name: flag.display(),
                        value: raw.to_string(),
                        ty: "bool",
                        msg: err.to_string(),
                    };
                    Err(self.err(chain, kind))
                }
            },
            FlagKind::Value { store, .. } => {
                if flag.arity == Arity::Repeated {
                    for part in raw.split(',') {
                        self.store_value(chain, &flag.display(), store, cfg, part)?;
                    }
                    return Ok(());
                }
                self.store_value(chain, &flag.display(), store, cfg, raw)
            }
        }
    }

    fn store_value(
        &self,
        chain: &[String],
        name: &str,
        store: &Store<C>,
        cfg: &mut C,
        value: &str,
    ) -> Result<()> {
        store(cfg, value).map_err(|fail| {
            let kind = ErrorKind::Conversion {
                name: name.to_string(),
                value: value.to_string(),
                ty: fail.ty,
                msg: fail.msg,
            };
            self.err(chain, kind)
        })
    }

    fn utf8(&self, chain: &[String], name: &str, word: OsString) -> Result<String> {
        word.into_string().map_err(|word| {
            let kind = ErrorKind::Conversion {
                name: name.to_string(),
                value: word.to_string_lossy().into_owned(),
                ty: "str",
                msg: "invalid utf8".to_string(),
            };
            self.err(chain, kind)
        })
    }

    fn err(&self, chain: &[String], kind: ErrorKind) -> Error {
        Error::new(kind, help::usage_line(self, chain))
    }
}
