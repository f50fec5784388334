/*****************************************************************************************[main.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson
Copyright (c) 2007-2010, Niklas Sorensson
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

extern crate clap;
extern crate cpu_time;
extern crate flate2;
extern crate satmine;

#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(not(feature = "logging"))]
mod env_logger {
    pub fn init() {}
}

#[cfg(feature = "logging")]
extern crate env_logger;

#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

use clap::{App, Arg};
use flate2::bufread::GzDecoder;
use satmine::{lbool, parse_db, Callbacks, Cooperation, SolverOpts};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::exit;

mod system;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

/// Printing callbacks: streams each itemset to stdout as it is found.
struct CB {
    pub verbosity: i32,
    pub lim: Option<(system::ResourceMeasure, f64)>,
}

impl CB {
    fn new() -> Self {
        CB {
            verbosity: 0,
            lim: None,
        }
    }
}

impl Callbacks for CB {
    fn on_model(&mut self, itemset: &[u32]) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut line = String::new();
        for (i, item) in itemset.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&item.to_string());
        }
        line.push('\n');
        let _ = out.write_all(line.as_bytes());
    }

    fn on_result(&mut self, _: lbool) {
        if self.verbosity >= 2 {
            println!("c ===============================================================================");
        }
    }

    fn on_gc(&mut self, old: usize, new: usize) {
        if self.verbosity >= 2 {
            println!(
                "c |  Garbage collection:   {:12} bytes => {:12} bytes             |",
                old, new
            );
        }
    }

    fn stop(&self) -> bool {
        match self.lim {
            None => false,
            Some((ref r, max_cpu)) => r.cpu_time() > max_cpu,
        }
    }
}

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("SatMine")
        .version("0.1.0")
        .about("Parallel SAT-based weighted frequent/closed itemset miner")
        .arg(Arg::with_name("input-file").required(true))
        .arg(
            Arg::with_name("min-supp")
                .long("min-supp")
                .short("m")
                .help("Minimum weighted support of an emitted itemset")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .help("Number of cooperating workers")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("closed")
                .long("closed")
                .help("Enumerate closed itemsets instead of all frequent ones"),
        )
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .default_value("-1.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("export-limit")
                .long("export-limit")
                .help("Maximum size of clauses exchanged between workers (0 disables the exchange)")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("full-support")
                .long("full-support")
                .help("Also emit the long support clauses per transaction"),
        )
        .arg(
            Arg::with_name("var-decay")
                .long("var-decay")
                .help("The variable activity decay factor")
                .default_value("0.95")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("clause-decay")
                .long("cla-decay")
                .help("The clause activity decay factor")
                .default_value("0.999")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("random-var-freq")
                .long("rnd-freq")
                .help("The frequency with which the decision heuristic tries to choose a random variable")
                .default_value("0.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("random-seed")
                .long("rnd-seed")
                .help("Used by the random variable selection")
                .default_value("91648253.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ccmin-mode")
                .long("ccmin-mode")
                .help("Controls conflict clause minimization (0=none, 1=basic, 2=deep)")
                .default_value("2")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("phase-saving")
                .long("phase-saving")
                .help("Controls the level of phase saving (0=none, 1=limited, 2=full)")
                .default_value("2")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("rnd-init")
                .long("rnd-init")
                .help("Randomize the initial activity"),
        )
        .arg(
            Arg::with_name("luby-restart")
                .long("luby")
                .conflicts_with("no-luby-restart")
                .help("Use the Luby restart sequence [default]"),
        )
        .arg(
            Arg::with_name("no-luby-restart")
                .long("no-luby")
                .help("Do not use the Luby restart sequence"),
        )
        .arg(
            Arg::with_name("restart-first")
                .long("rfirst")
                .help("The base restart interval")
                .default_value("100")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("restart-inc")
                .long("rinc")
                .help("Restart interval increase factor")
                .default_value("2.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("garbage-frac")
                .long("gc-frac")
                .help("The fraction of wasted memory allowed before a garbage collection is triggered")
                .default_value("0.20")
                .takes_value(true),
        )
        .get_matches();

    let mut opts = SolverOpts::default();
    opts.var_decay = matches
        .value_of("var-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.var_decay);
    opts.clause_decay = matches
        .value_of("clause-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.clause_decay);
    opts.random_var_freq = matches
        .value_of("random-var-freq")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.random_var_freq);
    opts.random_seed = matches
        .value_of("random-seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.random_seed);
    opts.ccmin_mode = matches
        .value_of("ccmin-mode")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.ccmin_mode);
    opts.phase_saving = matches
        .value_of("phase-saving")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.phase_saving);
    opts.rnd_init_act = matches.is_present("rnd-init");
    opts.luby_restart = !matches.is_present("no-luby-restart");
    opts.restart_first = matches
        .value_of("restart-first")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.restart_first);
    opts.restart_inc = matches
        .value_of("restart-inc")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.restart_inc);
    opts.garbage_frac = matches
        .value_of("garbage-frac")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.garbage_frac);
    opts.full_support = matches.is_present("full-support");
    if !opts.check() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid option value",
        ));
    }

    let min_supp: u64 = matches
        .value_of("min-supp")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "bad --min-supp value"))?;
    let n_threads: usize = matches
        .value_of("threads")
        .and_then(|s| s.parse().ok())
        .filter(|&n| n >= 1)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "bad --threads value"))?;
    let verbosity: i32 = matches
        .value_of("verbosity")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let cpu_lim: f64 = matches
        .value_of("cpu-lim")
        .and_then(|s| s.parse().ok())
        .unwrap_or(-1.0);
    let export_limit: u32 = matches
        .value_of("export-limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let input_file = matches.value_of("input-file").expect("required arg");
    debug!("reading database from {}", input_file);
    let db = {
        let file = File::open(input_file)?;
        let reader = BufReader::new(file);
        if input_file.ends_with(".gz") {
            parse_db(&mut BufReader::new(GzDecoder::new(reader)))?
        } else {
            let mut reader = reader;
            parse_db(&mut reader)?
        }
    };

    if verbosity >= 1 {
        println!("c ============================[ Problem Statistics ]============================");
        println!("c |  Items:        {:12}                                               |", db.nb_items());
        println!("c |  Transactions: {:12}                                               |", db.nb_trans());
        println!("c |  Min support:  {:12}                                               |", min_supp);
        println!("c |  Workers:      {:12}                                               |", n_threads);
        println!("c ===============================================================================");
    }

    let mut coop = Cooperation::new(db, min_supp, n_threads);
    coop.enum_clos = matches.is_present("closed");
    coop.limit_export = export_limit;

    let res = satmine::solve_parallel(&coop, &opts, |_| {
        let mut cb = CB::new();
        cb.verbosity = verbosity;
        if cpu_lim > 0.0 {
            cb.lim = Some((system::ResourceMeasure::new(), cpu_lim));
        }
        cb
    });

    if verbosity >= 1 {
        println!("c itemsets              : {}", res.itemsets.len());
        println!("c conflicts             : {}", res.conflicts);
        println!("c decisions             : {}", res.decisions);
        println!("c propagations          : {}", res.propagations);
        println!("c CPU time              : {:.3} s", resource.cpu_time());
    }

    if res.status == lbool::UNDEF && res.itemsets.is_empty() {
        eprintln!("INTERRUPTED before any itemset was found");
        return Ok(1);
    }
    Ok(0)
}
