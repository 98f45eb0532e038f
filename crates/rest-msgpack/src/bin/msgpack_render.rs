//! `msgpack-render` — encode JSON (stdin) as MessagePack (stdout).
//!
//! Usage:
//!   msgpack-render < input.json > output.msgpack

use rest_msgpack::cli::{init_tracing, json_to_msgpack};
use std::io::{self, Read, Write};

fn main() {
    init_tracing();

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let result = json_to_msgpack(buf.trim())
        .and_then(|bytes| Ok(io::stdout().write_all(&bytes)?));
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
