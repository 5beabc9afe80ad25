//! CLI entry point for the extent-aging simulator (§6).

use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use extent_aging_sim::config::SimConfig;
use extent_aging_sim::coordinator::Coordinator;
use extent_aging_sim::error::Result;
use extent_aging_sim::extent_stack::SingleExtentStack;
use extent_aging_sim::gc_strategy::StripeLevelNoExtsGCStrategy;
use extent_aging_sim::packer::ObjectPacker;
use extent_aging_sim::sampler::EmpiricalSampler;
use extent_aging_sim::striper::{EcGeometry, ExtentStackStriper, SimpleStriper, Striper, StriperWithEc};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Discrete-event simulator of an erasure-coded object store aging under
/// placement and garbage-collection policies.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bytes per extent. Either this or `threshold` must be given together
    /// with the other, matching `original_source/main.cpp`'s `argc == 4`
    /// fallback — supplying only one falls back to both defaults.
    ext_size: Option<u64>,

    /// Secondary (extent-level) obsolete-percentage threshold.
    threshold: Option<u8>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut config = SimConfig::default();
    if let (Some(ext_size), Some(threshold)) = (args.ext_size, args.threshold) {
        config.ext_size = ext_size;
        config.secondary_threshold = threshold;
    }
    config.validate()?;

    info!("starting extent-aging-sim: ext_size={} threshold={}", config.ext_size, config.secondary_threshold);

    let mut coordinator = build_coordinator(config.clone());
    let mut strategy = StripeLevelNoExtsGCStrategy::new(config.primary_threshold, config.record_ext_types);

    let mut totals = extent_aging_sim::gc_strategy::GcHandlerRet::default();

    for _ in 0..config.simulation_time {
        let report = coordinator.tick(&mut strategy);
        let (live, total) = coordinator.data_center_sizes();

        eprintln!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            report.tick,
            live,
            total,
            report.gc.num_stripes_gced,
            report.gc.global_parity_reads,
            report.gc.global_parity_writes,
            report.gc.local_parity_reads,
            report.gc.local_parity_writes,
            report.gc.obsolete_data_reads,
            report.gc.storage_node_to_parity_calculator,
            report.gc.absent_data_reads,
        );
        debug!("tick {} obsoleted {} bytes", report.tick, report.obsoleted_bytes);

        totals.merge(&report.gc);
    }

    let (default_prop, alt_prop) = coordinator.get_proportion_of_stripers();
    println!("default_striper_proportion\t{:.4}", default_prop);
    println!("alternative_striper_proportion\t{:.4}", alt_prop);
    println!("num_stripes_gced\t{}", totals.num_stripes_gced);
    println!("temp_space\t{}", totals.temp_space);
    println!("user_reads\t{}", totals.user_reads);
    println!("user_writes\t{}", totals.user_writes);
    println!("global_parity_reads\t{}", totals.global_parity_reads);
    println!("global_parity_writes\t{}", totals.global_parity_writes);
    println!("local_parity_reads\t{}", totals.local_parity_reads);
    println!("local_parity_writes\t{}", totals.local_parity_writes);
    println!("obsolete_data_reads\t{}", totals.obsolete_data_reads);
    println!("absent_data_reads\t{}", totals.absent_data_reads);
    println!("valid_obj_transfers\t{}", totals.valid_obj_transfers);
    println!("num_exts_replaced\t{}", totals.num_exts_replaced);

    info!("extent-aging-sim finished: {} ticks simulated", config.simulation_time);
    Ok(())
}

fn build_coordinator(config: SimConfig) -> Coordinator {
    let geometry = EcGeometry {
        num_data_exts_per_locality: config.num_data_exts_per_locality,
        num_local_parities: config.num_local_parities,
        num_global_parities: config.num_global_parities,
        coding_overhead: config.coding_overhead,
    };

    let build_striper = || -> Box<dyn Striper> {
        Box::new(StriperWithEc::new(Box::new(ExtentStackStriper::new(Box::new(SimpleStriper::new()))), geometry))
    };

    let sim_time = config.simulation_time;
    let rng_seed = config.rng_seed;

    Coordinator::new(
        config,
        ObjectPacker::simple(rng_seed),
        ObjectPacker::simple(rng_seed.wrapping_add(1)),
        build_striper(),
        build_striper(),
        Box::new(SingleExtentStack::new()),
        Box::new(SingleExtentStack::new()),
        Box::new(EmpiricalSampler::new(sim_time, rng_seed)),
        false,
    )
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).init();
    }
}
