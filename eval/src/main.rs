use eval::{ClusterDescriptor, Evaluator, Loopback, Stats, DEFAULT_MAX_DEPTH};
use graph::{CallGraph, Registry, ScalarType, Value};
use std::path::PathBuf;
use structopt::StructOpt;

const STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, StructOpt)]
#[structopt(setting = structopt::clap::AppSettings::AllowNegativeNumbers)]
struct CliOpt {
    /// path to the graph source file
    #[structopt(parse(from_os_str))]
    source: PathBuf,

    /// function to call
    function: String,

    /// arguments, parsed as the parameter types of the function
    args: Vec<String>,

    /// maximum call depth [default: 1000]
    #[structopt(long = "max-depth")]
    max_depth: Option<usize>,

    /// a job of the cluster, `name=host:port,host:port`; repeatable
    #[structopt(long = "cluster")]
    cluster: Vec<String>,

    /// job of this worker
    #[structopt(long = "job", default_value = "local")]
    job: String,

    /// task index of this worker
    #[structopt(long = "task", default_value = "0")]
    task: u32,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("argument `{name}`: `{text}` is not a valid {ty}")]
    Argument {
        name: String,
        text: String,
        ty: ScalarType,
    },

    #[error("cannot start the evaluation thread: {0}")]
    Spawn(std::io::Error),

    #[error(transparent)]
    Graph(#[from] graph::Error),

    #[error(transparent)]
    Eval(#[from] eval::Error),
}

fn main() {
    env_logger::init();

    let opt = CliOpt::from_args();
    log::debug!("{:?}", opt);

    // local calls run on the evaluator's heap stacks; each loopback hop still
    // nests a native frame
    let spawned = std::thread::Builder::new()
        .name("eval".to_owned())
        .stack_size(STACK_SIZE)
        .spawn(move || run(opt));
    let result = match spawned {
        Ok(handle) => handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
        Err(err) => Err(CliError::Spawn(err)),
    };

    if let Err(err) = result {
        eprintln!("[error] {}", err);
        std::process::exit(1);
    }
}

fn run(opt: CliOpt) -> Result<(), CliError> {
    let source = std::fs::read_to_string(&opt.source).map_err(|source| CliError::Read {
        path: opt.source.clone(),
        source,
    })?;

    let mut registry = Registry::new();
    graph::load_program(&mut registry, &source)?;
    log::info!("loaded {} function(s) from {:?}", registry.len(), opt.source);

    for name in CallGraph::new(&registry).unresolved() {
        log::warn!("`{}` is called but never defined", name);
    }

    let args = bind_args(&registry, &opt.function, &opt.args)?;
    let max_depth = opt.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);

    let mut stats = Stats::default();
    let value = if opt.cluster.is_empty() {
        let mut evaluator = Evaluator::new(&registry).with_max_depth(max_depth);
        let value = evaluator.evaluate(&opt.function, &args);
        stats.merge(evaluator.stats());
        value?
    } else {
        let cluster = ClusterDescriptor::from_specs(opt.cluster.as_slice(), &opt.job, opt.task)?;
        log::info!("worker /job:{}/task:{}", cluster.job(), cluster.task());

        let loopback = Loopback::new(&registry, &cluster, max_depth);
        let mut evaluator = Evaluator::new(&registry)
            .with_cluster(&cluster)
            .with_transport(&loopback)
            .with_max_depth(max_depth);
        let value = evaluator.evaluate(&opt.function, &args);
        stats.merge(evaluator.stats());
        stats.merge(loopback.stats());
        value?
    };

    log::info!(
        "calls: {}, max depth: {}, remote calls: {}",
        stats.calls,
        stats.max_depth,
        stats.remote_calls
    );
    println!("{}", value);
    Ok(())
}

fn bind_args(registry: &Registry, function: &str, args: &[String]) -> Result<Vec<Value>, CliError> {
    let signature = registry
        .signature(function)
        .ok_or_else(|| graph::Error::UndefinedFunction {
            name: function.to_owned(),
        })?;
    if signature.params().len() != args.len() {
        return Err(graph::Error::ArityMismatch {
            context: format!("call to `{}`", function),
            expect: signature.params().len(),
            actual: args.len(),
        }
        .into());
    }

    signature
        .params()
        .iter()
        .zip(args)
        .map(|(param, text)| {
            Value::parse(param.ty, text).ok_or_else(|| CliError::Argument {
                name: param.name.clone(),
                text: text.clone(),
                ty: param.ty,
            })
        })
        .collect()
}
