use std::ffi::OsString;

use argbind::{Cmd, Flag};

#[derive(Debug, Default)]
pub struct Collect {
    pub tags: Vec<String>,
    pub names: Vec<String>,
}

fn cmd() -> Cmd<Collect> {
    Cmd::new("collect")
        .flag(
            Flag::repeated("tag", "TAG", |c: &mut Collect, v| c.tags.push(v))
                .short('t')
                .separate()
                .required(),
        )
        .flag(Flag::repeated("name", "NAME", |c: &mut Collect, v| c.names.push(v)).required())
}

pub fn parse(args: Vec<OsString>) -> argbind::Result<Collect> {
    let mut out = Collect::default();
    cmd().parse_into_with_env(&mut out, args, &[])?;
    Ok(out)
}
