//! `msgpack-parse` — decode MessagePack (stdin) to JSON (stdout).
//!
//! Usage:
//!   msgpack-parse < input.msgpack
//!
//! Datetime, date, time and decimal extensions are printed as their canonical strings.

use rest_msgpack::cli::{init_tracing, msgpack_to_json};
use std::io::{self, Read, Write};

fn main() {
    init_tracing();

    let mut buf = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let result = msgpack_to_json(&buf).and_then(|json| Ok(writeln!(io::stdout(), "{json}")?));
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
