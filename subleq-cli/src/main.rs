#[macro_use]
extern crate clap;

use clap::Arg;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use subleq::{optimizer, Machine, Memory};

mod error;
mod loader;
mod stats;
mod term_io;

use error::Error;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("IMAGE")
                .help("SUBLEQ image file to execute")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("no_optimize")
                .short("O")
                .help("Disables the peephole optimizer; decodes every cell as raw SUBLEQ"),
        )
        .arg(
            Arg::with_name("stats")
                .short("s")
                .help("Prints the substitution/execution statistics table to stderr"),
        )
        .arg(
            Arg::with_name("profile")
                .short("p")
                .help("Enables the hot-spot profiler and writes profiler_report.txt"),
        )
        .get_matches();

    let image_path = matches.value_of("IMAGE").unwrap();
    let optimize = !matches.is_present("no_optimize");
    let stats_enabled = matches.is_present("stats");
    let profile_enabled = matches.is_present("profile");

    let code = match run(image_path, optimize, stats_enabled, profile_enabled) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    };

    process::exit(code);
}

fn run(image_path: &str, optimize: bool, stats_enabled: bool, profile_enabled: bool) -> Result<i32, Error> {
    let path = Path::new(image_path);
    let words = loader::load_image(path).map_err(|err| Error::Load(err, PathBuf::from(path)))?;

    let mut memory = Memory::new();
    memory.load(&words);

    let (decoded, substitutions) = if optimize {
        optimizer::optimize_counted(&memory, words.len())
    } else {
        (optimizer::decode_raw(&memory), [0u64; 21])
    };

    let mut io = term_io::TerminalIo::new();
    let mut machine = Machine::new(memory, decoded, &mut io);
    if profile_enabled {
        machine = machine.with_profiling();
    }

    let start = Instant::now();
    let exit = machine.run();
    let elapsed = start.elapsed();

    if stats_enabled {
        let mut stderr = std::io::stderr();
        if let Err(err) = stats::write_table(
            &mut stderr,
            &substitutions,
            machine.exec_counts(),
            elapsed,
            machine.max_addr(),
        ) {
            eprintln!("failed to write statistics table: {}", err);
        }
    }

    // A reporter write failure is demoted to a non-zero exit distinct from
    // the image-file-close failure's reserved code 2; the run itself is
    // still considered complete.
    let mut report_code = 0;
    if profile_enabled {
        if let Some(address_counts) = machine.address_counts() {
            let report_path = Path::new("profiler_report.txt");
            if let Err(err) = stats::write_profile_report(report_path, &substitutions, address_counts) {
                eprintln!("failed to write {}: {}", report_path.display(), err);
                report_code = 3;
            }
        }
    }

    let vm_code = match exit {
        subleq::ExitCode::Halted => 0,
        subleq::ExitCode::InputError => 4,
        subleq::ExitCode::OutputError => 5,
    };

    Ok(if vm_code != 0 { vm_code } else { report_code })
}
