use {
    alwayszero::{
        pipeline::dot,
        plugin::{AlwaysZeroPlugin, PluginArguments},
        util::create_file_buffered,
        Session,
    },
    clap::{Parser, ValueEnum},
    color_eyre::eyre::{Context, Result},
    errctx::PathCtx,
    log::info,
    std::{
        fs,
        io::{self, Write},
        iter,
        path::PathBuf,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Logging filter string (e.g. "alwayszero=debug" or "trace")
    #[arg(long)]
    log: Option<String>,

    /// Writes the IR of every function after each pass requesting a dump to
    /// the specified folder
    #[arg(long)]
    dump_ir: Option<PathBuf>,

    /// Writes the control flow graph of every function to the specified
    /// folder in Graphviz format
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Text)]
    emit: Emit,

    /// Do not load the alwayszero plugin
    #[arg(long)]
    no_plugin: bool,

    /// Argument passed to the alwayszero plugin, `ref-pass=NAME`,
    /// `ref-instance=N` or `position=after|before`
    #[arg(short = 'P', long = "plugin-arg")]
    plugin_args: Vec<String>,

    /// Path to the input IR
    input: PathBuf,
    /// Path to write the optimised IR to, standard output if omitted
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emit {
    Text,
    Json,
}

/// Initialize the logger
pub fn init_logger(filters: &str) -> Result<()> {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.parse_filters(filters);
    builder.try_init().wrap_err("Failed to initialise logger")?;
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    // parse command line arguments
    let args = Args::parse();

    init_logger(args.log.as_deref().unwrap_or("info"))?;

    let source = fs::read_to_string(&args.input)
        .map_err(PathCtx::f(&args.input))
        .wrap_err("Failed to read input")?;

    let mut session = Session::new();

    if let Some(dir) = &args.dump_ir {
        fs::create_dir_all(dir)
            .map_err(PathCtx::f(dir))
            .wrap_err("Failed to create dump directory")?;
    }
    session.passes_mut().set_dump_dir(args.dump_ir.as_ref());

    if !args.no_plugin {
        // the host pipeline ends at SSA construction, user arguments may
        // still override the reference pass
        let plugin_args = PluginArguments::parse(
            iter::once("ref-pass=ssa").chain(args.plugin_args.iter().map(String::as_str)),
        );
        session.load_plugin(&AlwaysZeroPlugin, &plugin_args)?;
    }

    info!("parsing {}", args.input.display());
    let mut model = session.parse(&source)?;

    info!(
        "running {} over {} functions",
        session.passes().pass_names().join(", "),
        model.functions().len()
    );
    session.compile(&mut model)?;

    if let Some(dir) = &args.dot {
        fs::create_dir_all(dir)
            .map_err(PathCtx::f(dir))
            .wrap_err("Failed to create graph directory")?;

        for (name, function) in model.functions() {
            let mut w = create_file_buffered(dir.join(format!("{name}.dot")))?;
            dot::render(&mut w, function).wrap_err("Failed to render control flow graph")?;
            w.flush()?;
        }
    }

    let mut w: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(create_file_buffered(path)?),
        None => Box::new(io::stdout().lock()),
    };

    match args.emit {
        Emit::Text => write!(w, "{model}")?,
        Emit::Json => {
            serde_json::to_writer_pretty(&mut w, &model)?;
            writeln!(w)?;
        }
    }
    w.flush()?;

    info!("done");

    Ok(())
}
