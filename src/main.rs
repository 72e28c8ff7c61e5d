use std::path::PathBuf;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use enum_cc::algorithms::{
    EditNeighborhoodSearch, EnumerationConfig, EnumerationController, ExhaustiveSolver, ExternalNeighborhoodSearch,
};
use enum_cc::exclusion::ExclusionStrategy;
use enum_cc::io::{read_graph, read_membership, DirectorySink};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the signed graph file
    graph_filepath: PathBuf,

    /// Path of an optimal membership file for the graph
    init_membership_filepath: PathBuf,

    /// Directory where solutions and run files are written
    #[arg(default_value = ".")]
    out_dir: PathBuf,

    /// Maximum number of vertex moves explored around a known solution
    #[arg(short, long, default_value_t = 3)]
    max_edit_distance: usize,

    /// Time limit in seconds, zero or less for none
    #[arg(short, long, default_value_t = -1.0, allow_negative_numbers = true)]
    time_limit: f64,

    /// Maximum number of solutions, zero or less for none
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    solution_limit: i64,

    /// Number of worker threads
    #[arg(short = 'n', long, default_value_t = 1)]
    threads: usize,

    /// Exclusion strategy after a duplicate jump result (narrow or full)
    #[arg(short, long, default_value_t = ExclusionStrategy::NarrowOnDuplicate)]
    exclusion_strategy: ExclusionStrategy,

    /// Jar of an external recurrent neighborhood search to use instead of the built-in one
    #[arg(long)]
    rns_jar: Option<PathBuf>,

    /// Java launcher for the external neighborhood search
    #[arg(long, default_value = "java")]
    java: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build_global()?;

    let graph = read_graph(&args.graph_filepath)?;
    let initial = read_membership(&args.init_membership_filepath, graph.len())?;
    info!(
        "loaded {} vertices and initial clustering with {} clusters",
        graph.len(),
        initial.num_clusters()
    );

    let config = EnumerationConfig {
        max_edit_distance: args.max_edit_distance,
        time_limit: EnumerationConfig::time_limit_from_secs(args.time_limit),
        solution_limit: EnumerationConfig::solution_limit_from(args.solution_limit),
        thread_count: args.threads.max(1),
        exclusion_strategy: args.exclusion_strategy,
        ..EnumerationConfig::default()
    };
    let sink = DirectorySink::create(&args.out_dir)?;

    let enumeration = match &args.rns_jar {
        Some(jar) => {
            let search = ExternalNeighborhoodSearch::new(jar, &args.graph_filepath, &args.out_dir).with_java(&args.java);
            EnumerationController::new(&graph, initial, config, ExhaustiveSolver::new(), search, sink)?.run()?
        }
        None => EnumerationController::new(
            &graph,
            initial,
            config,
            ExhaustiveSolver::new(),
            EditNeighborhoodSearch::new(),
            sink,
        )?
        .run()?,
    };

    let report = &enumeration.report;
    println!("Termination {}", report.termination);
    println!("Imbalance {:?}", report.optimal_imbalance);
    println!("Solutions {:?}", report.total_solutions);
    println!("Jump queries {:?}", report.jump_queries);
    println!("Execution time {:?}s", report.elapsed_secs);
    println!("Results in {}", args.out_dir.display());
    Ok(())
}
