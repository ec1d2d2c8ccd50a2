use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use silogen::{Builder, CancelToken, CompileFlags, Silo};
use std::io::Write;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile XML sources into a silo.
    Compile {
        /// XML files to import.
        inputs: Vec<Utf8PathBuf>,
        /// Treat each input as a directory of `*.xml`/`*.xml.gz` files.
        #[arg(long)]
        dir: bool,
        #[arg(long)]
        literal_text: bool,
        #[arg(long)]
        native_langs: bool,
        #[arg(long)]
        ignore_invalid: bool,
        /// Output path; writes to stdout when omitted.
        #[arg(short, long)]
        out: Option<Utf8PathBuf>,
    },
    /// Run the ensure pipeline against a cache file.
    Ensure {
        inputs: Vec<Utf8PathBuf>,
        #[arg(long)]
        literal_text: bool,
        #[arg(long)]
        native_langs: bool,
        #[arg(long)]
        ignore_invalid: bool,
        #[arg(short, long)]
        out: Utf8PathBuf,
    },
    /// Print a silo's header fields as JSON.
    Inspect {
        silo_path: Utf8PathBuf,
        #[arg(short = 'j', long)]
        json: bool,
    },
}

fn flags_from(literal_text: bool, native_langs: bool, ignore_invalid: bool) -> CompileFlags {
    let mut flags = CompileFlags::NONE;
    if literal_text {
        flags = flags | CompileFlags::LITERAL_TEXT;
    }
    if native_langs {
        flags = flags | CompileFlags::NATIVE_LANGS;
    }
    if ignore_invalid {
        flags = flags | CompileFlags::IGNORE_INVALID;
    }
    flags
}

fn build_from_inputs(builder: &mut Builder, inputs: &[Utf8PathBuf], dir: bool) -> anyhow::Result<()> {
    for input in inputs {
        if dir {
            builder.import_dir(input, None)?;
        } else {
            builder.import_file(input, None)?;
        }
    }
    Ok(())
}

fn inspect_json(silo: &Silo) -> serde_json::Value {
    serde_json::json!({
        "guid": silo.guid().to_string(),
        "strtab_offset": silo.strtab_offset(),
        "strtab_ntags": silo.strtab_ntags(),
        "len": silo.as_bytes().len(),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cancel = CancelToken::never();

    match cli.command {
        Command::Compile {
            inputs,
            dir,
            literal_text,
            native_langs,
            ignore_invalid,
            out,
        } => {
            let mut builder = Builder::new();
            build_from_inputs(&mut builder, &inputs, dir)?;
            let flags = flags_from(literal_text, native_langs, ignore_invalid);
            let silo = builder.compile(flags, &cancel)?;
            match out {
                Some(path) => std::fs::write(path.as_std_path(), silo.as_bytes())?,
                None => std::io::stdout().write_all(silo.as_bytes())?,
            }
        }
        Command::Ensure {
            inputs,
            literal_text,
            native_langs,
            ignore_invalid,
            out,
        } => {
            let mut builder = Builder::new();
            build_from_inputs(&mut builder, &inputs, false)?;
            let flags = flags_from(literal_text, native_langs, ignore_invalid);
            builder.ensure(out, flags, &cancel)?;
        }
        Command::Inspect { silo_path, json } => {
            let bytes = std::fs::read(silo_path.as_std_path())?;
            let silo = Silo::from_bytes(bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&inspect_json(&silo))?);
            } else {
                println!("guid: {}", silo.guid());
                println!("strtab_offset: {}", silo.strtab_offset());
                println!("strtab_ntags: {}", silo.strtab_ntags());
                println!("len: {}", silo.as_bytes().len());
            }
        }
    }

    Ok(())
}
