//! TINYAC - CLI Entry Point
//!
//! Commands:
//! - `tinyac run <program>` - Run an image or ASM file
//! - `tinyac asm <source>` - Assemble to a memory image
//! - `tinyac disasm <image>` - Disassemble an image
//! - `tinyac console [image]` - Operator console
//! - `tinyac debug <program>` - Interactive debugger
//! - `tinyac demo` - Run the built-in demo program

use clap::{Parser, Subcommand};
use std::time::Duration;
use tinyac::{Machine, Model};

#[derive(Parser)]
#[command(name = "tinyac")]
#[command(version)]
#[command(about = "A simulator of the Krokha/TINYAC three-address training computer")]
struct Cli {
    /// Machine model
    #[arg(short, long, value_enum, global = true, default_value_t = Model::Krokha)]
    model: Model,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it stops
    Run {
        /// Path to the image or ASM file to execute
        program: String,
        /// Maximum number of cycles to run
        #[arg(long, default_value = "10000")]
        max_cycles: u64,
        /// Show every instruction and the registers after it
        #[arg(short, long)]
        trace: bool,
        /// Delay between instructions in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Assemble source to a memory image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an image, separating code from data
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Line-oriented operator console
    Console {
        /// Image to load at start
        image: Option<String>,
        /// Maximum number of cycles a single G may run
        #[arg(long, default_value = "10000")]
        max_cycles: u64,
        /// Delay between instructions run by G, in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the image or ASM file to debug
        program: String,
    },
    /// Run the built-in demo program
    Demo,
}

fn main() {
    let env = env_logger::Env::default()
        .filter_or("TINYAC_LOG", "warn")
        .write_style_or("TINYAC_LOG", "auto");
    env_logger::init_from_env(env);

    let cli = Cli::parse();
    let model = cli.model;

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, delay_ms, json }) => {
            let machine = load_program(&program, model);
            run_program(machine, max_cycles, trace, delay_ms.map(Duration::from_millis), json);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output, model);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image, model);
        }
        Some(Commands::Console { image, max_cycles, delay_ms }) => {
            run_console(image, max_cycles, delay_ms.map(Duration::from_millis), model);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => {
            debug_program(&program, model);
        }
        Some(Commands::Demo) => {
            let mut machine = Machine::new(model);
            machine.mem.load(0, &model.demo_program());
            println!("🧮 {} demo: A=2, B=1, prints A, B and 2*(A+B)", model.name());
            run_program(machine, 100, true, None, false);
        }
        None => {
            println!("TINYAC simulator v{}", env!("CARGO_PKG_VERSION"));
            println!("Krokha (8 words) and TINIAC (16 words) three-address machines");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Load an image, or assemble a `.asm` source, into a fresh machine.
fn load_program(path: &str, model: Model) -> Machine {
    let mut machine = Machine::new(model);

    if path.ends_with(".asm") {
        let source = read_source(path);
        assemble_into(&mut machine, &source);
    } else {
        match tinyac::load_image(path, &mut machine.mem) {
            Ok(words) => println!("📂 Loaded {} words", words),
            Err(e @ tinyac::ImageError::ShortRead { .. }) => {
                eprintln!("⚠️  {} (partial image kept)", e);
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    }

    machine
}

fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    }
}

fn assemble_into(machine: &mut Machine, source: &str) {
    match tinyac::assemble_source(machine, source) {
        Ok(assembly) if assembly.is_clean() => {
            println!("📝 Assembled {} words", assembly.written);
        }
        Ok(assembly) => {
            for err in &assembly.diagnostics {
                eprintln!("❌ {}", err);
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(mut machine: Machine, max_cycles: u64, trace: bool, delay: Option<Duration>, json: bool) {
    use tinyac::asm::disasm::disassemble_word;

    println!();
    println!("━━━ Execution ━━━");

    let mut stopped = false;
    while machine.cycles < max_cycles {
        let t = machine.trace();
        if trace {
            let text = disassemble_word(machine.model(), t.step.word);
            println!("{:02X}: {:04X}    {:<14} {}", t.step.address, t.step.word as u16, text, t);
        }
        for value in &t.step.printed {
            println!("{}", value);
        }
        if t.step.is_stop() {
            stopped = true;
            break;
        }
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", machine.cycles);
    println!("Registers: {}", machine.regs);

    if !stopped {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if json {
        match serde_json::to_string_pretty(&machine) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize machine: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn assemble_file(source_path: &str, output: Option<String>, model: Model) {
    let out_path = output.unwrap_or_else(|| {
        source_path.strip_suffix(".asm").unwrap_or(source_path).to_string() + ".bin"
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = read_source(source_path);
    let mut machine = Machine::new(model);
    assemble_into(&mut machine, &source);

    if let Err(e) = tinyac::save_image(&out_path, &machine.mem) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(path: &str, model: Model) {
    use tinyac::asm::disasm::render;

    let mut machine = Machine::new(model);
    if let Err(e) = tinyac::load_image(path, &mut machine.mem) {
        eprintln!("❌ Failed to load image: {}", e);
        std::process::exit(1);
    }

    print!("{}", render(&tinyac::disassemble(model, &machine.mem)));
}

fn run_console(image: Option<String>, max_cycles: u64, delay: Option<Duration>, model: Model) {
    use std::io::{stdin, stdout};

    let mut machine = Machine::new(model);
    if let Some(path) = &image {
        if let Err(e) = tinyac::load_image(path, &mut machine.mem) {
            eprintln!("⚠️  {}", e);
        }
    }

    let mut console = tinyac::Console::new(machine, stdin().lock(), stdout()).with_max_cycles(max_cycles);
    if let Some(path) = &image {
        console = console.with_file_name(path);
    }
    if let Some(delay) = delay {
        console = console.with_pace(delay);
    }
    println!("📂 Image file: {}", console.file_name());

    if let Err(e) = console.run() {
        eprintln!("❌ Console error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, model: Model) {
    let machine = load_program(path, model);

    println!("🚀 Launching debugger...");

    if let Err(e) = tinyac::run_debugger(machine) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}
