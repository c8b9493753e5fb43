//! Token stream over raw argv. Classification is purely lexical here;
//! whether a flag-shaped token names a known flag is the matcher's
//! business.

use std::ffi::OsString;

pub(crate) struct Tokens {
    after_double_dash: bool,
    rargs: Vec<OsString>,
}

impl Tokens {
    pub(crate) fn new(mut args: Vec<OsString>) -> Tokens {
        args.reverse();
        Tokens { after_double_dash: false, rargs: args }
    }

    pub(crate) fn from_env() -> Tokens {
        let mut args = std::env::args_os().collect::<Vec<_>>();
        args.reverse();
        args.pop();
        Tokens { after_double_dash: false, rargs: args }
    }

    /// `Ok` is a flag-shaped utf8 token, `Err` is a positional. A lone
    /// `--` flips the stream into positional-only mode and is not
    /// yielded itself; a lone `-` is a positional.
    pub(crate) fn pop_flag(&mut self) -> Option<Result<String, OsString>> {
        loop {
            let arg = self.next()?;
            if self.after_double_dash {
                return Some(Err(arg));
            }
            match arg.into_string() {
                Ok(text) if text == "--" => self.after_double_dash = true,
                Ok(text) if text.len() > 1 && text.starts_with('-') => return Some(Ok(text)),
                Ok(text) => return Some(Err(text.into())),
                Err(os) => return Some(Err(os)),
            }
        }
    }

    pub(crate) fn push_back(&mut self, arg: Result<String, OsString>) {
        let arg = match arg {
            Ok(it) => it.into(),
            Err(it) => it,
        };
        self.rargs.push(arg)
    }

    pub(crate) fn next(&mut self) -> Option<OsString> {
        self.rargs.pop()
    }

    /// The next token if it would classify as a positional, without
    /// crossing a `--` terminator. Greedy multi-value collection stops
    /// exactly where this returns `None`.
    pub(crate) fn next_if_value(&mut self) -> Option<OsString> {
        if self.after_double_dash {
            return None;
        }
        let flag_shaped = match self.rargs.last().and_then(|it| it.to_str()) {
            Some(text) => text == "--" || (text.len() > 1 && text.starts_with('-')),
            None => false,
        };
        if flag_shaped {
            return None;
        }
        self.next()
    }
}
