use std::path::PathBuf;

use clap::Parser;
use sffsplit::DEFAULT_CAPACITY;

#[derive(Parser)]
#[command(version)]
#[command(about = "Split an SFF file by the adaptor found at the start of each read")]
pub struct Cli {
    // Input SFF file
    #[arg(short = 'i', long = "input", help = "Input file to split")]
    pub input: PathBuf,

    // Two-column adaptor list
    #[arg(
        short = 'a',
        long = "adaptors",
        help = "Adaptors used to split the input file. Format: <name> <sequence>"
    )]
    pub adaptors: PathBuf,

    // Output stem
    #[arg(
        short = 'o',
        long = "output",
        help = "Stem of the output files, stored as '<output_stem>.<adaptor>.sff'"
    )]
    pub output: PathBuf,

    // Mismatch budget of the fuzzy pass
    #[arg(
        short = 'm',
        long = "max-mismatch",
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Maximum number of mismatches between adaptor and read"
    )]
    pub max_mismatch: i32,

    // Matching threads
    #[arg(short = 't', long = "threads", default_value_t = 1, help = "Number of threads")]
    pub threads: usize,

    // Records per buffer
    #[arg(short = 'b', long = "buffer", default_value_t = DEFAULT_CAPACITY, help = "Read buffer size")]
    pub buffer: usize,

    // Verbosity
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
}
