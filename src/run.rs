//! The command line surface: flag parsing and wiring of the planner,
//! walker, signal handling, and output streams.

use crate::cancel::Cancel;
use crate::graph::WalkError;
use crate::plan::{Plan, TargetFactory};
use crate::prefix::PrefixWriter;
use crate::semaphore::Semaphore;
use crate::signal;
use crate::target::{FileTarget, Target};
use crate::terminal;
use crate::trace;
use std::io::Write;
use std::path::PathBuf;

#[derive(argh::FromArgs)]
/// walk, a fast, general purpose, graph based build and task execution utility
struct Opts {
    /// print the output of each target as it's executed
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// number of targets to execute in parallel (0 = unlimited)
    #[argh(option, short = 'j', default = "0")]
    jobs: usize,

    /// print the graph in the given format (dot|plain) instead of executing
    #[argh(option, short = 'p')]
    print: Option<String>,

    /// don't prefix target output with the target name
    #[argh(switch)]
    noprefix: bool,

    /// debugging tools
    #[argh(option, short = 'd')]
    debug: Option<String>,

    /// print version and exit
    #[argh(switch)]
    version: bool,

    /// targets to build [default: all]
    #[argh(positional)]
    targets: Vec<String>,
}

enum Format {
    Dot,
    Plain,
}

fn run_impl() -> anyhow::Result<i32> {
    let opts: Opts = argh::from_env();

    if opts.version {
        println!("walk {}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    if let Some(debug) = &opts.debug {
        match debug.as_str() {
            "list" => {
                println!("debug tools:");
                println!("  trace  generate json performance trace");
                return Ok(1);
            }
            "trace" => trace::open("trace.json")?,
            _ => anyhow::bail!("unknown -d {:?}, use -d list to list", debug),
        }
    }

    let print = match opts.print.as_deref() {
        None => None,
        Some("dot") => Some(Format::Dot),
        Some("plain") => Some(Format::Plain),
        Some(other) => anyhow::bail!("unknown -p {:?}, want dot or plain", other),
    };

    let mut targets = opts.targets;
    if targets.is_empty() {
        targets.push("all".to_string());
    }

    let wd = std::env::current_dir()?;
    let color = terminal::use_color();
    let cancel = Cancel::new();
    signal::register_sigint(&cancel);

    let plan = Plan::new(new_target(wd, opts.verbose, !opts.noprefix, color));
    trace::scope("plan", || plan.plan(&cancel, &targets))?;

    if let Some(format) = print {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match format {
            Format::Dot => plan.graph().dot(&mut out)?,
            Format::Plain => plan.graph().plain(&mut out)?,
        }
        return Ok(0);
    }

    let semaphore = Semaphore::new(opts.jobs);
    match trace::scope("walk", || plan.exec(&cancel, &semaphore)) {
        Ok(()) => Ok(0),
        Err(err) => match err.downcast::<WalkError>() {
            Ok(walk_err) => {
                for err in walk_err.errors.values() {
                    eprintln!("{}", terminal::ansi(color, "31", &err.to_string()));
                }
                eprintln!("walk: {}", walk_err);
                Ok(1)
            }
            Err(err) => Err(err),
        },
    }
}

pub fn run() -> anyhow::Result<i32> {
    let result = run_impl();
    let _ = trace::close();
    result
}

/// The factory used by the CLI: file targets whose output streams onto our
/// stdout/stderr through the line-prefixer.
fn new_target(wd: PathBuf, verbose: bool, prefix: bool, color: bool) -> TargetFactory {
    Box::new(move |name| {
        let stdout: Option<Box<dyn Write + Send>> = if verbose {
            Some(wrap(std::io::stdout(), name, prefix, color))
        } else {
            None
        };
        let stderr = Some(wrap(std::io::stderr(), name, prefix, color));
        Ok(Target::File(
            FileTarget::new(&wd, name)
                .with_streams(stdout, stderr)
                .announcing(color),
        ))
    })
}

fn wrap<W: Write + Send + 'static>(
    w: W,
    name: &str,
    prefix: bool,
    color: bool,
) -> Box<dyn Write + Send> {
    if !prefix {
        return Box::new(w);
    }
    let tag = format!("{}\t", terminal::ansi(color, "36", name));
    Box::new(PrefixWriter::new(w, tag.as_bytes()))
}
