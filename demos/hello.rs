use argbind::{Arg, Cmd, Flag};

#[derive(Default)]
struct Hello {
    name: String,
    emoji: bool,
}

fn main() {
    let cmd = Cmd::new("hello")
        .help("Greets the given name.")
        .flag(Flag::switch("emoji", |h: &mut Hello, v| h.emoji = v).short('e'))
        .arg(Arg::required("NAME", |h: &mut Hello, v| h.name = v).env("HELLO_NAME"));

    let mut hello = Hello::default();
    cmd.parse_or_exit(&mut hello);

    let bang = if hello.emoji { "❣️" } else { "!" };
    println!("Hello {}{}", hello.name, bang);
}
