use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use image::imageops::FilterType;
use regional_zoom::core::{SharedBanks, FRAME_HEIGHT, FRAME_WIDTH};
use regional_zoom::{
    Algorithm, ApplyOutcome, Direction, Frame, GlobalStep, GlobalZoomTracker, LevelSource, Region,
    RemoteLink, SimulatedStore, ZoomCacheEngine, ZoomConfig,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Largest part of a region printed by `--dump`.
const DUMP_COLS: u32 = 40;
const DUMP_ROWS: u32 = 20;

/// Scripted regional zoom on a simulated 320x240 grayscale frame store.
#[derive(Parser, Debug)]
#[command(name = "rzoom")]
#[command(about = "Zoom a rectangle of a frame independently of the rest")]
#[command(long_about = "Loads a frame into a simulated dual-bank frame store, optionally applies \
whole-frame zoom passes, then opens a region session and runs a sequence of zoom steps on it, \
printing the region cache after every step. The session is torn down at the end and the \
original frame restored.")]
struct Args {
    /// Image to load (any format; converted to 8-bit gray and resized to 320x240)
    #[arg(short, long, help = "Image file to present; a horizontal gradient is used when omitted")]
    image: Option<PathBuf>,

    /// Region as x,y,width,height
    #[arg(short, long, default_value = "10,10,50,40", value_parser = parse_region)]
    region: Region,

    /// Region as two opposite corners x1,y1,x2,y2 (overrides --region)
    #[arg(long, value_parser = parse_corners)]
    corners: Option<Region>,

    /// Whole-frame passes applied before the region session
    #[arg(short, long, value_delimiter = ',',
          help = "Whole-frame passes before the session: nearest, replicate, decimate, average")]
    global: Vec<Algorithm>,

    /// Region zoom steps
    #[arg(short, long, value_delimiter = ',', default_value = "in,in,in,out,in,out,out,out")]
    steps: Vec<StepArg>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Print the region pixels after every step
    #[arg(long)]
    dump: bool,

    /// Back the banks with this file so a viewer can map them
    #[arg(long)]
    banks: Option<PathBuf>,

    /// Done-flag poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Done-flag reads before a pass times out
    #[arg(long, default_value_t = 50)]
    poll_attempts: u32,

    /// Skip every protocol delay
    #[arg(long)]
    no_delays: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StepArg {
    In,
    Out,
}

impl From<StepArg> for Direction {
    fn from(step: StepArg) -> Self {
        match step {
            StepArg::In => Direction::In,
            StepArg::Out => Direction::Out,
        }
    }
}

fn parse_quad(s: &str) -> Result<[u32; 4], String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>().map_err(|e| format!("'{}': {}", p, e)))
        .collect::<Result<_, _>>()?;
    parts
        .try_into()
        .map_err(|_| format!("expected four comma-separated numbers, got '{}'", s))
}

fn parse_region(s: &str) -> Result<Region, String> {
    let [x, y, w, h] = parse_quad(s)?;
    Ok(Region::new(x, y, w, h))
}

fn parse_corners(s: &str) -> Result<Region, String> {
    let [x1, y1, x2, y2] = parse_quad(s)?;
    Ok(Region::from_corners(x1, y1, x2, y2))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from(args: &Args) -> Result<ZoomConfig> {
    let mut config = if args.no_delays {
        ZoomConfig::immediate()
    } else {
        ZoomConfig::default()
    };
    if !args.no_delays {
        config.poll_interval = Duration::from_millis(args.poll_ms);
    }
    config.max_poll_attempts = args.poll_attempts;
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn load_frame(path: Option<&PathBuf>) -> Result<Frame> {
    let Some(path) = path else {
        return Ok(Frame::gradient()?);
    };
    let gray = image::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?
        .to_luma8();
    let gray = if gray.dimensions() == (FRAME_WIDTH, FRAME_HEIGHT) {
        gray
    } else {
        image::imageops::resize(&gray, FRAME_WIDTH, FRAME_HEIGHT, FilterType::Triangle)
    };
    Ok(Frame::from_pixels(gray.into_raw())?)
}

fn dump_region(region: &Region, pixels: &[u8]) {
    let cols = region.width.min(DUMP_COLS) as usize;
    let rows = region.height.min(DUMP_ROWS) as usize;
    for row in pixels.chunks(region.width as usize).take(rows) {
        let line: Vec<String> = row[..cols].iter().map(|p| format!("{:02x}", p)).collect();
        println!("    {}", line.join(" "));
    }
    if cols < region.width as usize || rows < region.height as usize {
        println!("    ({}x{} of {}x{} shown)", cols, rows, region.width, region.height);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = config_from(&args)?;
    let frame = load_frame(args.image.as_ref())?;
    let region = args.corners.unwrap_or(args.region);

    let banks = match &args.banks {
        Some(path) => SharedBanks::open(path)?,
        None => SharedBanks::anonymous()?,
    };
    let mut link = RemoteLink::new(SimulatedStore::with_banks(banks)?, config)?;
    let mut tracker = GlobalZoomTracker::new();
    tracker.present(&mut link, &frame)?;

    for &algorithm in &args.global {
        let step = if algorithm.is_zoom_in() {
            tracker.zoom_in(&mut link, algorithm)?
        } else {
            tracker.zoom_out(&mut link, algorithm)?
        };
        if step == GlobalStep::AtLimit && !args.json {
            println!("whole-frame {}: limit reached, skipped", algorithm);
        }
    }
    let global = tracker.level();
    if global.value() < 0 {
        bail!(
            "Regional zoom is unavailable while the whole frame is zoomed out (level {}); reset first",
            global
        );
    }

    let mut engine = ZoomCacheEngine::new(link);
    let mut report = Vec::new();
    {
        let mut guard = engine.guard(region, global)?;
        let status = guard.status()?;
        if !args.json {
            println!(
                "region {} | global zoom {} | background from {} bank",
                region, global, status.source_bank
            );
            println!("start  {}", status.cache_map());
        }

        for &step in &args.steps {
            let direction = Direction::from(step);
            let outcome = guard.apply(direction)?;
            let status = guard.status()?;
            let triggers = guard.link().store().triggers();

            let source = match outcome {
                ApplyOutcome::Transitioned { source: LevelSource::CacheHit, .. } => "cache",
                ApplyOutcome::Transitioned { source: LevelSource::Computed, .. } => "computed",
                ApplyOutcome::AtLimit => "limit",
            };
            if args.json {
                report.push(json!({
                    "direction": direction.to_string(),
                    "level": status.level,
                    "source": source,
                    "cache": status.populated,
                    "hardware_passes": triggers,
                }));
            } else {
                println!("{:<6} {} ({})", direction, status.cache_map(), source);
            }

            if args.dump && !args.json {
                let session = guard.session()?;
                if let Some(pixels) = session.slot(session.level()) {
                    dump_region(&region, pixels);
                }
            }
        }
        guard.finish()?;
    }
    tracker.acknowledge_device_reset();

    let store = engine.link().store();
    store.flush()?;
    if args.json {
        let out = json!({
            "region": {
                "x": region.x,
                "y": region.y,
                "width": region.width,
                "height": region.height,
            },
            "global_zoom": global.value(),
            "steps": report,
            "hardware_passes": store.triggers(),
            "done_polls": store.done_polls(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "session ended, frame restored ({} hardware passes)",
            store.triggers()
        );
    }
    Ok(())
}
