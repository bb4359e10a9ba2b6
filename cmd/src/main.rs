use std::{path::PathBuf, process::exit};

use clap::Parser;
use pretty_env_logger::env_logger::Env;
use reader::ClassFile;

mod dump;

#[derive(Parser, Debug)]
#[clap(name = "classdump", version, author, about)]
pub struct Opts {
    /// Dump every constant pool entry
    #[clap(long)]
    pub constants: bool,

    /// Dump every row of the attribute tables
    #[clap(long)]
    pub attributes: bool,

    /// Log the decoding steps (repeat for more details)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The class files to dump
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

fn main() {
    let opts: Opts = Opts::parse();
    let filter = match opts.verbose {
        0 => "warn",
        1 => "info,reader=debug",
        _ => "info,reader=trace",
    };
    pretty_env_logger::formatted_builder()
        .parse_env(Env::default().default_filter_or(filter))
        .init();

    let mut failures = 0;
    for path in opts.files.iter() {
        log::info!("Reading class file: {}", path.display());
        let class = match ClassFile::open(path) {
            Ok(class) => class,
            Err(e) => {
                log::error!("Error reading {}, cause:\n{}", path.display(), e);
                failures += 1;
                continue;
            }
        };
        if let Err(e) = dump::dump(&class, &opts) {
            log::error!("Error dumping {}, cause:\n{}", path.display(), e);
            failures += 1;
        }
    }
    if failures > 0 {
        log::error!("{} of {} files failed.", failures, opts.files.len());
        exit(-1);
    }
    exit(0);
}
