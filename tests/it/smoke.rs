use std::ffi::OsString;

use argbind::{Arg, Cmd, Flag};

#[derive(Debug, Default)]
pub struct Analyzer {
    pub verbose: bool,
    pub dataset: String,
    pub optimize: i64,
    pub input: String,
    pub output: Vec<String>,
}

fn cmd() -> Cmd<Analyzer> {
    Cmd::new("example")
        .flag(Flag::switch("verbose", |a: &mut Analyzer, v| a.verbose = v).short('v'))
        .flag(Flag::value("dataset", "DATASET", |a: &mut Analyzer, v| a.dataset = v))
        .flag(Flag::value("optimize", "LEVEL", |a: &mut Analyzer, v| a.optimize = v).short('O'))
        .arg(Arg::required("INPUT", |a: &mut Analyzer, v| a.input = v))
        .arg(Arg::repeated("OUTPUT", |a: &mut Analyzer, v| a.output.push(v)))
}

pub fn parse(args: Vec<OsString>) -> argbind::Result<Analyzer> {
    let mut out = Analyzer { optimize: 1, ..Analyzer::default() };
    cmd().parse_into_with_env(&mut out, args, &[])?;
    Ok(out)
}
