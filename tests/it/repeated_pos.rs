use std::ffi::OsString;

use argbind::{Arg, Cmd, Flag};

#[derive(Debug, Default)]
pub struct RepeatedPos {
    pub a: String,
    pub b: Option<u32>,
    pub ids: Vec<u32>,
    pub cmds: Vec<String>,
    pub rest: Vec<String>,
}

fn cmd() -> Cmd<RepeatedPos> {
    Cmd::new("rep")
        .flag(Flag::repeated("ids", "ID", |r: &mut RepeatedPos, v| r.ids.push(v)))
        .flag(
            Flag::repeated("cmd", "CMD", |r: &mut RepeatedPos, v| r.cmds.push(v))
                .short('c')
                .separate(),
        )
        .arg(Arg::required("A", |r: &mut RepeatedPos, v| r.a = v))
        .arg(Arg::optional("B", |r: &mut RepeatedPos, v| r.b = Some(v)))
        .arg(Arg::repeated("REST", |r: &mut RepeatedPos, v| r.rest.push(v)))
}

pub fn parse(args: Vec<OsString>) -> argbind::Result<RepeatedPos> {
    let mut out = RepeatedPos::default();
    cmd().parse_into_with_env(&mut out, args, &[])?;
    Ok(out)
}
