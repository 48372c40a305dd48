use std::{
    cell::RefCell,
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use choreo::{
    ChoreoConfig, ChoreoEvent, ClipCatalog, ElementRef, ElementSource, EventKind, Input,
    LoadingLayout, NullRig, PageLayout, Rect, SectionBounds, SectionId, Stage, StageHosts,
    Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "choreo", version)]
struct Cli {
    /// Log verbosity on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scripted session and print bus events as JSON lines.
    Simulate(SimulateArgs),
    /// Parse and validate a configuration file.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Session script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clip manifest JSON; the built-in timing-only clips apply when omitted.
    #[arg(long)]
    clips: Option<PathBuf>,

    /// Suppress `proxyNear` events, which fire every moving frame.
    #[arg(long)]
    quiet_proximity: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Configuration JSON.
    #[arg(long)]
    config: PathBuf,
}

/// Scripted session.
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default = "default_viewport")]
    viewport: Viewport,
    #[serde(default = "default_fps")]
    fps: f64,
    duration_secs: f64,
    /// Height of each stacked page section, in pixels.
    #[serde(default = "default_section_height")]
    section_height: f64,
    #[serde(default)]
    elements: Vec<ScriptElement>,
    #[serde(default)]
    inputs: Vec<TimedInput>,
}

#[derive(Clone, Debug, serde::Deserialize)]
struct ScriptElement {
    selector: String,
    /// `[x0, y0, x1, y1]` in viewport pixels.
    rect: [f64; 4],
}

#[derive(Clone, Copy, Debug, serde::Deserialize)]
struct TimedInput {
    at: f64,
    #[serde(flatten)]
    input: Input,
}

fn default_viewport() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

fn default_fps() -> f64 {
    60.0
}

fn default_section_height() -> f64 {
    1000.0
}

/// Sections stacked top to bottom in page order.
struct StackedPage {
    section_height: f64,
}

impl PageLayout for StackedPage {
    fn section_bounds(&self, section: SectionId) -> Option<SectionBounds> {
        Some(SectionBounds {
            top: section.index() as f64 * self.section_height,
            height: self.section_height,
        })
    }
}

/// Caption centered on screen with the progress bar below it.
struct CenteredLoader {
    viewport: Viewport,
}

impl LoadingLayout for CenteredLoader {
    fn caption_rect(&self) -> Option<Rect> {
        let (cx, cy) = (self.viewport.width / 2.0, self.viewport.height / 2.0);
        Some(Rect::new(cx - 120.0, cy - 30.0, cx + 120.0, cy + 10.0))
    }

    fn progress_bar_rect(&self) -> Option<Rect> {
        let (cx, cy) = (self.viewport.width / 2.0, self.viewport.height / 2.0);
        Some(Rect::new(cx - 200.0, cy + 140.0, cx + 200.0, cy + 146.0))
    }
}

struct FixedElements {
    elements: Vec<ScriptElement>,
}

impl ElementSource for FixedElements {
    fn query(&self, selector: &str) -> Vec<ElementRef> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selector == selector)
            .map(|(i, _)| ElementRef(i as u64))
            .collect()
    }

    fn element_rect(&self, element: ElementRef) -> Option<Rect> {
        let e = self.elements.get(usize::try_from(element.0).ok()?)?;
        let [x0, y0, x1, y1] = e.rect;
        Some(Rect::new(x0, y0, x1, y1))
    }
}

#[derive(serde::Serialize)]
struct EventLine<'a> {
    t: f64,
    #[serde(flatten)]
    event: &'a ChoreoEvent,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_script(path: &Path) -> anyhow::Result<Script> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let script: Script = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse script '{}'", path.display()))?;
    anyhow::ensure!(
        script.fps.is_finite() && script.fps > 0.0,
        "script fps must be positive"
    );
    anyhow::ensure!(
        script.duration_secs.is_finite() && script.duration_secs >= 0.0,
        "script duration_secs must be non-negative"
    );
    Ok(script)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    ChoreoConfig::from_path(&args.config)?;
    eprintln!("ok {}", args.config.display());
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let script = read_script(&args.script)?;
    let cfg = match &args.config {
        Some(p) => ChoreoConfig::from_path(p)?,
        None => ChoreoConfig::default(),
    };
    let catalog = match &args.clips {
        Some(p) => ClipCatalog::from_manifest_path(p, &cfg.clips.seated)?,
        None => ClipCatalog::builtin(),
    };

    let hosts = StageHosts {
        rig: Box::new(NullRig),
        page: Box::new(StackedPage {
            section_height: script.section_height,
        }),
        loading: Some(Box::new(CenteredLoader {
            viewport: script.viewport,
        })),
        elements: Box::new(FixedElements {
            elements: script.elements.clone(),
        }),
    };
    let mut stage = Stage::new(cfg, catalog, script.viewport, hosts)?;

    let clock = Rc::new(RefCell::new(0.0f64));
    let out = Rc::new(RefCell::new(std::io::BufWriter::new(std::io::stdout())));
    let failed = Rc::new(RefCell::new(None::<std::io::Error>));
    let _subs: Vec<_> = EventKind::ALL
        .into_iter()
        .filter(|k| !(args.quiet_proximity && *k == EventKind::ProxyNear))
        .map(|kind| {
            let (clock, out, failed) = (Rc::clone(&clock), Rc::clone(&out), Rc::clone(&failed));
            stage.bus().subscribe(kind, move |event| {
                let line = EventLine {
                    t: *clock.borrow(),
                    event,
                };
                let mut out = out.borrow_mut();
                let res = serde_json::to_writer(&mut *out, &line)
                    .map_err(std::io::Error::from)
                    .and_then(|()| writeln!(out));
                if let Err(e) = res {
                    failed.borrow_mut().get_or_insert(e);
                }
            })
        })
        .collect();

    let mut inputs = script.inputs.clone();
    inputs.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut pending = inputs.into_iter().peekable();

    let dt = 1.0 / script.fps;
    let frames = (script.duration_secs * script.fps).ceil() as u64;
    for frame in 0..frames {
        let now = frame as f64 * dt;
        while let Some(next) = pending.next_if(|i| i.at <= now) {
            stage.queue(next.input);
        }
        *clock.borrow_mut() = now + dt;
        stage.frame(dt);
        if let Some(e) = failed.borrow_mut().take() {
            return Err(e).context("write event line");
        }
    }
    out.borrow_mut().flush().context("flush stdout")?;

    let world = stage.world();
    eprintln!(
        "simulated {:.2}s: phase {:?}, position [{:.3}, {:.3}, {:.3}]",
        stage.elapsed(),
        stage.phase(),
        world.position.x,
        world.position.y,
        world.position.z
    );
    Ok(())
}
