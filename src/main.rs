// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

//! # EnYAML command line
//!
//! Renders a YAML template read from a file or stdin and writes the
//! rendered documents to a file or stdout.
//!
//! ## Usage
//!
//! ```text
//! enyaml [infile] [-o outfile]
//! ```
//!
//! With no `infile` (or `-`) the template is read from stdin. Rendering
//! starts from an empty context; `!set` documents inside the template are
//! the way to define values. Exits 0 on success and nonzero with the
//! error on stderr.

use enyaml::Context;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;

struct Options {
    infile: Option<String>,
    outfile: Option<String>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        infile: None,
        outfile: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--outfile" => match args.next() {
                Some(path) => options.outfile = Some(path),
                None => return Err(format!("{} requires a path", arg)),
            },
            "-h" | "--help" => {
                println!("usage: enyaml [infile] [-o outfile]");
                println!();
                println!("Render YAML templates.");
                std::process::exit(0);
            }
            "-" => options.infile = None,
            path if !path.starts_with('-') => {
                if options.infile.is_some() {
                    return Err("only one input file is accepted".to_owned());
                }
                options.infile = Some(path.to_owned());
            }
            unknown => return Err(format!("unknown option {}", unknown)),
        }
    }
    Ok(options)
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut template = String::new();
    match &options.infile {
        Some(path) => {
            File::open(path)?.read_to_string(&mut template)?;
        }
        None => {
            io::stdin().read_to_string(&mut template)?;
        }
    }

    let mut ctx = Context::new();
    let mut rendered = Vec::new();
    for value in enyaml::render_all(&template, &mut ctx)? {
        rendered.push(value?);
    }
    let output = enyaml::dump_all(&rendered)?;

    match &options.outfile {
        Some(path) => File::create(path)?.write_all(output.as_bytes())?,
        None => io::stdout().write_all(output.as_bytes())?,
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("enyaml: {}", message);
            return ExitCode::from(2);
        }
    };
    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("enyaml: {}", err);
            ExitCode::FAILURE
        }
    }
}
