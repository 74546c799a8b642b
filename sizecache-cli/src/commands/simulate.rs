//! Scroll simulation.
//!
//! Builds a synthetic collection, drives a `LayoutCache` through a steady
//! scroll and reports how many visible rows were already cached when they
//! came on screen.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use tracing::{debug, info};

use sizecache::host::{ComputeError, HostSnapshot, SizeComputer, SizeRequest};
use sizecache::item::{ContainerFrame, ItemPosition, ItemSize};
use sizecache::service::LayoutCacheStats;
use sizecache::window::ScrollOffset;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `sizecache simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Number of sections
    #[arg(long, default_value = "1")]
    pub sections: usize,

    /// Items per section
    #[arg(long, default_value = "2000")]
    pub items: usize,

    /// Rows visible at once
    #[arg(long, default_value = "12")]
    pub viewport: usize,

    /// Number of scroll events
    #[arg(long, default_value = "150")]
    pub steps: usize,

    /// Rows scrolled per event
    #[arg(long, default_value = "3")]
    pub step_rows: usize,

    /// Time between scroll events in milliseconds
    #[arg(long, default_value = "16")]
    pub frame_ms: u64,

    /// Simulated cost of one size computation in microseconds
    #[arg(long, default_value = "800")]
    pub compute_us: u64,

    /// Override the configured concurrency ceiling
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Override the configured leading margin
    #[arg(long)]
    pub leading: Option<usize>,

    /// Override the configured trailing margin
    #[arg(long)]
    pub trailing: Option<usize>,

    /// Disable scroll-driven prefetching (baseline run)
    #[arg(long)]
    pub no_prefetch: bool,

    /// Count misses without computing them on the scrolling thread
    #[arg(long)]
    pub cache_only: bool,
}

/// Measures synthetic rows, burning `cost` per call.
struct SyntheticComputer {
    cost: Duration,
    calls: AtomicUsize,
}

impl SizeComputer for SyntheticComputer {
    fn compute_size(&self, request: &SizeRequest) -> Result<ItemSize, ComputeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.cost.is_zero() {
            thread::sleep(self.cost);
        }
        Ok(ItemSize::new(
            request.frame.width,
            row_height(request.position),
            request.dependency,
        ))
    }
}

/// Offset advanced per row when turning row numbers into scroll events.
const ESTIMATED_ROW_HEIGHT: f64 = 64.0;

/// Deterministic, uneven row heights.
fn row_height(position: ItemPosition) -> f64 {
    40.0 + ((position.section * 31 + position.index * 7) % 5) as f64 * 12.0
}

/// Maps a flat row number onto `(section, index)`.
fn flat_position(counts: &[usize], mut flat: usize) -> Option<ItemPosition> {
    for (section, &count) in counts.iter().enumerate() {
        if flat < count {
            return Some(ItemPosition::new(section, flat));
        }
        flat -= count;
    }
    None
}

/// Outcome of one simulation.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Tally {
    visible_lookups: usize,
    hits: usize,
    inline_computes: usize,
    lookup_time: Duration,
}

impl Tally {
    fn hit_ratio(&self) -> f64 {
        if self.visible_lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.visible_lookups as f64
        }
    }
}

fn validate(args: &SimulateArgs) -> Result<(), CliError> {
    if args.sections == 0 || args.items == 0 {
        return Err(CliError::InvalidArgument(
            "--sections and --items must be at least 1".to_string(),
        ));
    }
    if args.viewport == 0 {
        return Err(CliError::InvalidArgument(
            "--viewport must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Run the simulation.
pub fn run(args: SimulateArgs, debug: bool) -> Result<(), CliError> {
    validate(&args)?;
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("simulate");

    let mut config = runner.config().to_layout_config();
    if let Some(max_concurrent) = args.max_concurrent {
        config = config.with_max_concurrent(max_concurrent);
    }
    if let Some(leading) = args.leading {
        config = config.with_leading_margin(leading);
    }
    if let Some(trailing) = args.trailing {
        config = config.with_trailing_margin(trailing);
    }
    config = config.with_auto_prefetch(!args.no_prefetch);

    let counts = vec![args.items; args.sections];
    let total: usize = counts.iter().sum();
    let host = Arc::new(HostSnapshot::new(
        ContainerFrame::from_size(390.0, 844.0),
        counts.clone(),
    ));
    let computer = Arc::new(SyntheticComputer {
        cost: Duration::from_micros(args.compute_us),
        calls: AtomicUsize::new(0),
    });
    let cache = runner.create_cache(host.clone(), computer.clone(), config)?;

    info!(
        rows = total,
        sections = args.sections,
        viewport = args.viewport,
        steps = args.steps,
        "Starting scroll simulation"
    );
    println!(
        "Simulating {} scroll events over {} rows ({} sections), {} rows visible",
        args.steps, total, args.sections, args.viewport
    );

    let frame = Duration::from_millis(args.frame_ms);
    let mut tally = Tally::default();

    for step in 0..args.steps {
        let first = step * args.step_rows;
        if first >= total {
            break;
        }
        let visible: Vec<ItemPosition> = (first..(first + args.viewport).min(total))
            .filter_map(|flat| flat_position(&counts, flat))
            .collect();

        host.set_visible(visible.iter().copied());
        cache.position_changed(ScrollOffset::new(0.0, first as f64 * ESTIMATED_ROW_HEIGHT));

        let started = Instant::now();
        for &position in &visible {
            tally.visible_lookups += 1;
            if !cache.lookup(position, None, true).is_zero() {
                tally.hits += 1;
            } else if !args.cache_only {
                tally.inline_computes += 1;
                cache.size_at(position);
            }
        }
        tally.lookup_time += started.elapsed();

        if step % 25 == 0 {
            debug!(step, first, hits = tally.hits, "scroll step");
        }
        thread::sleep(frame);
    }

    let stats = cache.stats();
    cache.log_stats();
    cache.shutdown();

    print_report(&tally, &stats, computer.calls.load(Ordering::Relaxed));
    Ok(())
}

fn print_report(tally: &Tally, stats: &LayoutCacheStats, computer_calls: usize) {
    println!();
    println!("Visible lookups");
    println!("===============");
    println!("  lookups:          {}", tally.visible_lookups);
    println!("  already cached:   {}", tally.hits);
    println!("  hit ratio:        {:.1}%", tally.hit_ratio() * 100.0);
    println!("  inline computes:  {}", tally.inline_computes);
    println!(
        "  time in lookups:  {:.1} ms",
        tally.lookup_time.as_secs_f64() * 1000.0
    );
    println!();
    println!("Scheduler");
    println!("=========");
    println!("  submitted:        {}", stats.scheduler.submitted);
    println!("  started:          {}", stats.scheduler.started);
    println!("  completed:        {}", stats.scheduler.completed);
    println!("  cancelled:        {}", stats.scheduler.cancelled);
    println!("  stale discards:   {}", stats.scheduler.stale_discards);
    println!("  failed:           {}", stats.scheduler.failed);
    println!("  peak concurrent:  {}", stats.scheduler.peak_active);
    println!();
    println!("Cache");
    println!("=====");
    println!("  entries:          {}", stats.cache.entries);
    println!("  computations:     {}", computer_calls);
    println!("  window size:      {}", stats.window_len);
}
