//! Delta Compiler CLI
//!
//! Command-line interface for compiling `.dlt` programs to native
//! executables or WebAssembly modules.

use clap::{CommandFactory, Parser as ClapParser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use deltac::{CompileTarget, CompilerConfig, ProjectFile};

#[derive(ClapParser)]
#[command(name = "deltac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Delta compiler - compile .dlt programs to executables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum TargetArg {
    #[default]
    Native,
    Wasm,
}

impl From<TargetArg> for CompileTarget {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Native => CompileTarget::Native,
            TargetArg::Wasm => CompileTarget::Wasm,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .dlt file to an executable
    Build {
        /// Input .dlt source file
        input: PathBuf,

        /// Output path (defaults to input filename without .dlt extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Add an include directory (can be repeated)
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Compilation target
        #[arg(long, value_enum, default_value = "native")]
        target: TargetArg,

        /// Keep intermediate LLVM IR file (.ll)
        #[arg(long)]
        keep_ir: bool,

        /// Extra linker input (library or object file, can be repeated)
        #[arg(short = 'L', long = "link", value_name = "LIB")]
        link: Vec<String>,

        /// Run the produced binary after a successful build
        #[arg(short, long)]
        run: bool,
    },

    /// Emit only the LLVM IR for a .dlt file
    Ir {
        /// Input .dlt source file
        input: PathBuf,

        /// Add an include directory (can be repeated)
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Compilation target
        #[arg(long, value_enum, default_value = "native")]
        target: TargetArg,
    },

    /// Print the parsed AST of a .dlt file
    Ast {
        /// Input .dlt source file
        input: PathBuf,

        /// Add an include directory (can be repeated)
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Compilation target
        #[arg(long, value_enum, default_value = "native")]
        target: TargetArg,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            include_dirs,
            target,
            keep_ir,
            link,
            run,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input));
            let config = make_config(include_dirs, target, link).with_keep_ir(keep_ir);
            run_build(&input, &output, &config, run);
        }
        Commands::Ir {
            input,
            include_dirs,
            target,
        } => {
            let config = make_config(include_dirs, target, Vec::new());
            run_ir(&input, &config);
        }
        Commands::Ast {
            input,
            include_dirs,
            target,
        } => {
            let config = make_config(include_dirs, target, Vec::new());
            run_ast(&input, &config);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "deltac", &mut io::stdout());
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("deltac=debug"))
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    PathBuf::from(stem)
}

/// CLI settings plus the optional `delta.toml` project file in the
/// working directory.
fn make_config(
    include_dirs: Vec<PathBuf>,
    target: TargetArg,
    link: Vec<String>,
) -> CompilerConfig {
    let mut config = CompilerConfig::new()
        .with_include_dirs(include_dirs)
        .with_target(target.into());
    for input in link {
        config = config.with_link_input(input);
    }

    if let Ok(content) = fs::read_to_string("delta.toml") {
        match ProjectFile::from_toml(&content) {
            Ok(project) => config.merge_project(&project),
            Err(e) => {
                eprintln!("Warning: ignoring delta.toml: {}", e);
            }
        }
    }
    config
}

fn run_build(input: &Path, output: &Path, config: &CompilerConfig, run: bool) {
    match deltac::compile_file(input, output, config) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
            if config.keep_ir {
                let ir_path = output.with_extension("ll");
                if ir_path.exists() {
                    println!("IR saved to {}", ir_path.display());
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    if run {
        match deltac::run_binary(output) {
            Ok(code) => {
                println!("Program exited with code {}", code);
                process::exit(code);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn run_ir(input: &Path, config: &CompilerConfig) {
    let source = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    };
    match deltac::compile_to_ir(&source, config) {
        Ok(ir) => print!("{}", ir),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_ast(input: &Path, config: &CompilerConfig) {
    let source = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    };
    match deltac::dump_ast(&source, config) {
        Ok(dump) => print!("{}", dump),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
