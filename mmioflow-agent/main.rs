use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mmioflow::common::{parse_assignment, parse_u64, DevMem, DEVMEM_ENV};
use mmioflow::{commands, SchemaFile};

#[derive(Parser, Debug)]
#[command(name = "mmioflow")]
#[command(about = "Validate register schemas and access memory-mapped registers")]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(
        short,
        long,
        global = true,
        help = "Enable verbose logging (shows every mapping and register access)"
    )]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every register in a schema
    Check {
        #[arg(help = "Path to the JSON register schema")]
        schema: PathBuf,
    },

    /// Decode a raw value through a register layout
    Decode {
        #[arg(help = "Path to the JSON register schema")]
        schema: PathBuf,

        #[arg(help = "Register name")]
        register: String,

        #[arg(help = "Raw value (decimal, 0x, 0b or 0o)")]
        value: String,
    },

    /// Read a register from physical memory
    Read {
        #[arg(help = "Path to the JSON register schema")]
        schema: PathBuf,

        #[arg(help = "Register name")]
        register: String,

        #[arg(long, help = "Physical address, overriding the schema")]
        address: Option<String>,
    },

    /// Read-modify-write fields of a register in physical memory
    Modify {
        #[arg(help = "Path to the JSON register schema")]
        schema: PathBuf,

        #[arg(help = "Register name")]
        register: String,

        #[arg(
            long = "set",
            help = "Field assignment (can be specified multiple times: --set en=1 --set mode=0b10)",
            action = clap::ArgAction::Append,
            required = true
        )]
        assignments: Vec<String>,

        #[arg(long, help = "Physical address, overriding the schema")]
        address: Option<String>,
    },
}

fn parse_address(address: Option<&str>) -> anyhow::Result<Option<u64>> {
    address
        .map(|text| parse_u64(text).with_context(|| format!("Invalid address '{text}'")))
        .transpose()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging based on verbose flag
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Check { schema } => {
            let schema = SchemaFile::from_path(&schema)?;
            let report = commands::check(&schema);
            print!("{}", report.render());
            if !report.is_ok() {
                std::process::exit(1);
            }
        }
        Command::Decode {
            schema,
            register,
            value,
        } => {
            let schema = SchemaFile::from_path(&schema)?;
            let value = parse_u64(&value)?;
            print!("{}", commands::decode(schema.register(&register)?, value)?);
        }
        Command::Read {
            schema,
            register,
            address,
        } => {
            let schema = SchemaFile::from_path(&schema)?;
            let address = parse_address(address.as_deref())?;
            let devmem = DevMem::instance();
            tracing::info!(
                "Using {} (override with {})",
                devmem.path().display(),
                DEVMEM_ENV
            );
            print!(
                "{}",
                commands::read(devmem, schema.register(&register)?, address)?
            );
        }
        Command::Modify {
            schema,
            register,
            assignments,
            address,
        } => {
            let schema = SchemaFile::from_path(&schema)?;
            let address = parse_address(address.as_deref())?;
            let assignments = assignments
                .iter()
                .map(|text| parse_assignment(text))
                .collect::<mmioflow::Result<Vec<_>>>()?;
            let devmem = DevMem::instance();
            tracing::info!(
                "Using {} (override with {})",
                devmem.path().display(),
                DEVMEM_ENV
            );
            print!(
                "{}",
                commands::modify(devmem, schema.register(&register)?, address, &assignments)?
            );
        }
    }

    Ok(())
}
