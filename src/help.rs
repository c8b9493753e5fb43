//! Rendering of the usage synopsis and full help text from the same
//! descriptors the matcher binds through.

use crate::cmd::{Arity, Cmd, Flag, FlagKind};

pub(crate) fn usage_line<C>(cmd: &Cmd<C>, chain: &[String]) -> String {
    let mut out = String::from("Usage:");
    for name in chain {
        out.push(' ');
        out.push_str(name);
    }
    for flag in &cmd.flags {
        out.push(' ');
        if flag.required {
            out.push_str(&flag_stub(flag));
        } else {
            out.push('[');
            out.push_str(&flag_stub(flag));
            out.push(']');
        }
    }
    for arg in &cmd.args {
        out.push(' ');
        match arg.arity {
            Arity::Required => out.push_str(&arg.metavar),
            Arity::Optional => {
                out.push('[');
                out.push_str(&arg.metavar);
                out.push(']');
            }
            Arity::Repeated => {
                out.push_str(&format!("[{0} [{0} ...]]", arg.metavar));
            }
        }
    }
    out
}

pub(crate) fn render<C>(cmd: &Cmd<C>, chain: &[String]) -> String {
    let positional = cmd
        .args
        .iter()
        .map(|arg| (arg.metavar.clone(), doc_with_env(arg.doc.as_deref(), arg.env.as_deref())))
        .collect::<Vec<_>>();

    let mut options = cmd
        .flags
        .iter()
        .map(|flag| (flag_row(flag), doc_with_env(flag.doc.as_deref(), flag.env.as_deref())))
        .collect::<Vec<_>>();
    options.push(("--help, -h".to_string(), "display this help and exit".to_string()));
    if cmd.version.is_some() {
        options.push(("--version".to_string(), "display version and exit".to_string()));
    }

    let commands = cmd
        .subcommands
        .iter()
        .map(|sub| (sub.name().to_string(), sub.doc().unwrap_or("").to_string()))
        .collect::<Vec<_>>();

    // Help text lines up one column past the longest left-hand string of
    // this level, sections included.
    let width = positional
        .iter()
        .chain(&options)
        .chain(&commands)
        .map(|(left, _)| left.len())
        .max()
        .unwrap_or(0);

    let mut out = usage_line(cmd, chain);
    out.push('\n');
    if let Some(doc) = &cmd.doc {
        out.push_str(doc);
        out.push('\n');
    }
    if !positional.is_empty() {
        out.push_str("\nPositional arguments:\n");
        rows(&mut out, &positional, width);
    }
    out.push_str("\nOptions:\n");
    rows(&mut out, &options, width);
    if !commands.is_empty() {
        out.push_str("\nCommands:\n");
        rows(&mut out, &commands, width);
    }
    out
}

/// The flag as it appears in the usage line: `--name` or `--name META`.
fn flag_stub<C>(flag: &Flag<C>) -> String {
    match &flag.kind {
        FlagKind::Switch(_) => format!("--{}", flag.name),
        FlagKind::Value { metavar, .. } => format!("--{} {metavar}", flag.name),
    }
}

/// The flag's left column in the options list, short alias included:
/// `--name META, -n META`.
fn flag_row<C>(flag: &Flag<C>) -> String {
    let mut out = flag_stub(flag);
    if let Some(short) = flag.short {
        out.push_str(&format!(", -{short}"));
        if let FlagKind::Value { metavar, .. } = &flag.kind {
            out.push_str(&format!(" {metavar}"));
        }
    }
    out
}

fn doc_with_env(doc: Option<&str>, env: Option<&str>) -> String {
    match (doc, env) {
        (Some(doc), Some(var)) => format!("{doc} [env: {var}]"),
        (Some(doc), None) => doc.to_string(),
        (None, Some(var)) => format!("[env: {var}]"),
        (None, None) => String::new(),
    }
}

fn rows(out: &mut String, rows: &[(String, String)], width: usize) {
    for (left, doc) in rows {
        if doc.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {doc}\n"));
        }
    }
}
