// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::{fs, io::{self, Write}, path::PathBuf};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::Level;

use rs274::program::{normalize, write_commands, Options};
use rs274::registry::Registry;

/// Normalize RS274 G-code files into one unambiguous command per line.
#[derive(Parser, Debug)]
#[command(name = "rs274-normalize", version)]
struct Cli {
    /// Increase log verbosity (warn, info, debug, trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Echo each source line as a comment before its commands.
    #[arg(long)]
    trace_lines: bool,
    /// Keep N line number words.
    #[arg(long)]
    keep_line_numbers: bool,
    /// Keep G28/G28.1 home moves.
    #[arg(long)]
    keep_g28: bool,
    /// Keep G91 incremental distance mode.
    #[arg(long)]
    keep_g91: bool,
    /// Do not expand G81-G83 drilling cycles.
    #[arg(long)]
    no_cycles: bool,
    /// Directory to write the results to, instead of stdout.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// The G-code files to process.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();

    let options = Options {
        trace_lines: cli.trace_lines,
        keep_line_numbers: cli.keep_line_numbers,
        keep_home_moves: cli.keep_g28,
        keep_incremental: cli.keep_g91,
        expand_cycles: !cli.no_cycles,
    };
    let registry = Registry::linuxcnc();

    for file in &cli.files {
        let input = fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let result = normalize(&registry, &input, &options);
        for diag in &result.diagnostics {
            for error in &diag.errors {
                eprintln!("{}:{}: {}", file.display(), diag.lineno + 1, error);
            }
        }
        match &cli.output_dir {
            Some(dir) => {
                let name = file.file_name().context("input path has no file name")?;
                let target = dir.join(name);
                let out = fs::File::create(&target)
                    .with_context(|| format!("creating {}", target.display()))?;
                let mut out = io::BufWriter::new(out);
                write_commands(&mut out, &result.commands)
                    .and_then(|_| out.flush())
                    .with_context(|| format!("writing {}", target.display()))?;
            }
            None => write_commands(io::stdout().lock(), &result.commands)?,
        }
    }
    Ok(())
}
