use anyhow::{anyhow, Context, Result};
use clap::Parser;
use libbooklet::config::merge_values;
use libbooklet::{
    Booklet, Command, ControlState, RecordingSurface, Session, Settings, SurfaceCall,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod demo;
mod scan;
mod script;

use scan::PageImage;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder holding `left/` and `right/` page image folders
    book_dir: Option<PathBuf>,

    /// Left panel page folder (defaults to BOOK_DIR/left)
    #[arg(long)]
    left: Option<PathBuf>,

    /// Right panel page folder (defaults to BOOK_DIR/right)
    #[arg(long)]
    right: Option<PathBuf>,

    /// JSON file with booklet options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Size pages to the largest scanned image
    #[arg(long)]
    fit_pages: bool,

    /// Actions to replay, e.g. "n w n w p drag:left:0:80"
    #[arg(long, short = 's', default_value = "")]
    script: String,

    /// Generate an HTML demo page instead of a trace
    #[arg(long, short = 'b')]
    html: bool,

    /// Open the demo page in a browser (requires --html)
    #[arg(long, requires = "html")]
    open_browser: bool,

    /// Output folder for the demo page
    #[arg(long, default_value = "booklet_demo")]
    out: PathBuf,

    /// wasm-pack output folder to copy next to the demo page
    #[arg(long)]
    pkg: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize, Debug)]
struct Step {
    at_ms: u64,
    action: String,
    calls: Vec<SurfaceCall<String>>,
}

#[derive(Serialize, Debug)]
struct Trace {
    settings: Settings,
    left: Vec<PageImage>,
    right: Vec<PageImage>,
    steps: Vec<Step>,
    current: usize,
    page_count: usize,
    controls: ControlState,
}

type Replay = Session<RecordingSurface<String>>;

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);
    if let Err(err) = run(&args) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter),
        )
        .init();
}

fn panel_dir(explicit: &Option<PathBuf>, book_dir: &Option<PathBuf>, name: &str) -> Result<PathBuf> {
    explicit
        .clone()
        .or_else(|| book_dir.as_ref().map(|dir| dir.join(name)))
        .ok_or_else(|| anyhow!("no {name} panel folder: pass BOOK_DIR or --{name}"))
}

fn load_options(path: &Option<PathBuf>) -> Result<Value> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading options {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing options {}", path.display()))
        }
        None => Ok(json!({})),
    }
}

fn run(args: &Args) -> Result<()> {
    let left = scan::scan_panel(&panel_dir(&args.left, &args.book_dir, "left")?)?;
    let right = scan::scan_panel(&panel_dir(&args.right, &args.book_dir, "right")?)?;
    if left.len() != right.len() {
        warn!(
            left = left.len(),
            right = right.len(),
            "Panels have different page counts"
        );
    }

    let mut options = load_options(&args.options)?;
    if args.fit_pages {
        match scan::fit_size(left.iter().chain(right.iter())) {
            Some((width, height)) => {
                info!(width, height, "Fitting pages to images");
                merge_values(
                    &mut options,
                    &json!({"page": {"width": width, "height": height}}),
                );
            }
            None => warn!("No readable page images, keeping configured page size"),
        }
    }
    let settings = Settings::from_options(&options)?;

    if args.html {
        return write_demo(args, &settings, &options, &left, &right);
    }

    let trace = replay(&args.script, settings, left, right)?;
    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}

fn replay(
    script: &str,
    settings: Settings,
    left: Vec<PageImage>,
    right: Vec<PageImage>,
) -> Result<Trace> {
    let actions = script::parse_script(script, settings.speed)?;
    let booklet = Booklet::new(
        settings.clone(),
        left.iter().map(|p| format!("left/{}", p.file)),
        right.iter().map(|p| format!("right/{}", p.file)),
    );
    let mut session: Replay = Session::new(booklet, RecordingSurface::new());
    let mut steps = vec![Step {
        at_ms: 0,
        action: "mount".to_string(),
        calls: session.surface_mut().drain(),
    }];

    for (action, commands) in actions {
        for command in commands {
            match command {
                Command::Wait { ms } => wait(&mut session, ms, &mut steps),
                command => {
                    session.handle(command);
                    steps.push(Step {
                        at_ms: session.now_ms(),
                        action: action.clone(),
                        calls: session.surface_mut().drain(),
                    });
                }
            }
        }
    }
    while let Some(due) = session.next_due() {
        let remaining = due - session.now_ms();
        wait(&mut session, remaining, &mut steps);
    }

    let booklet = session.booklet();
    Ok(Trace {
        current: booklet.current(),
        page_count: booklet.page_count(),
        controls: booklet.controls(),
        settings,
        left,
        right,
        steps,
    })
}

/// Lets `ms` pass, recording what every timer that fires does.
fn wait(session: &mut Replay, ms: u64, steps: &mut Vec<Step>) {
    let until = session.now_ms().saturating_add(ms);
    while let Some(due) = session.next_due().filter(|due| *due <= until) {
        session.advance(due - session.now_ms());
        let calls = session.surface_mut().drain();
        if !calls.is_empty() {
            steps.push(Step {
                at_ms: session.now_ms(),
                action: "timer".to_string(),
                calls,
            });
        }
    }
    session.advance(until - session.now_ms());
}

fn copy_pages(pages: &[PageImage], dest: &Path, url_prefix: &str) -> Result<Vec<String>> {
    fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;
    pages
        .iter()
        .map(|page| {
            fs::copy(&page.path, dest.join(&page.file))
                .with_context(|| format!("copying {}", page.path.display()))?;
            Ok(format!("{url_prefix}/{}", page.file))
        })
        .collect()
}

fn write_demo(
    args: &Args,
    settings: &Settings,
    options: &Value,
    left: &[PageImage],
    right: &[PageImage],
) -> Result<()> {
    let out = &args.out;
    let left_urls = copy_pages(left, &out.join("pages/left"), "pages/left")?;
    let right_urls = copy_pages(right, &out.join("pages/right"), "pages/right")?;

    let mut html = demo::header("Booklet", settings);
    html.push_str(&demo::booklet(settings, &left_urls, &right_urls));
    html.push_str(&demo::loader(settings, &options.to_string(), "./pkg"));
    html.push_str(&demo::footer());

    let html_path = out.join("index.html");
    fs::write(&html_path, html).with_context(|| format!("writing {}", html_path.display()))?;

    match &args.pkg {
        Some(pkg) => {
            let pkg_out = out.join("pkg");
            fs::create_dir_all(&pkg_out)?;
            for entry in fs::read_dir(pkg).with_context(|| format!("reading {}", pkg.display()))? {
                let path = entry?.path();
                if let (true, Some(name)) = (path.is_file(), path.file_name()) {
                    fs::copy(&path, pkg_out.join(name))
                        .with_context(|| format!("copying {}", path.display()))?;
                }
            }
        }
        None => warn!(
            "No --pkg given, the demo expects the wasm package in {}",
            out.join("pkg").display()
        ),
    }

    println!("HTML demo generated at: {}", html_path.display());

    if args.open_browser {
        if let Err(e) = opener::open(&html_path) {
            error!("Error opening browser: {}", e);
        }
    }
    Ok(())
}
