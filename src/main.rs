use std::path::PathBuf;
use std::time::Instant;

use log::{debug, error, info, warn};
use sdl2::keyboard::Keycode;

use payoff_heatmap::display::{Display, InputEvent, RenderTarget};
use payoff_heatmap::util::Throttle;
use payoff_heatmap::{HeatmapConfig, HeatmapSurface, HoverOutcome, HoverState, PointerEvent};

struct Args {
    config: Option<PathBuf>,
    scheme: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    vsync: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        scheme: None,
        width: None,
        height: None,
        vsync: true,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => parsed.vsync = false,
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            },
            "--scheme" | "-s" => {
                if i + 1 < args.len() {
                    parsed.scheme = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    if let Ok(w) = args[i + 1].parse::<u32>() {
                        parsed.width = Some(w);
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    if let Ok(h) = args[i + 1].parse::<u32>() {
                        parsed.height = Some(h);
                    }
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: heatmap-viewer [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --config FILE, -c FILE  Load surface config (JSON)");
                println!("  --scheme NAME, -s NAME  Start with this gradient");
                println!("  --width W, -w W         Surface width");
                println!("  --height H, -h H        Surface height");
                println!("  --no-vsync              Disable VSync");
                println!("  --help                  Show this help message");
                std::process::exit(0);
            },
            other => warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    parsed
}

/// Config file, then command line overrides
fn load_config(args: &Args) -> Result<HeatmapConfig, String> {
    let mut config = match &args.config {
        Some(path) => HeatmapConfig::load(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => HeatmapConfig::default(),
    };
    if let Some(scheme) = &args.scheme {
        config.scheme = scheme.clone();
    }
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn scheme_for_key(key: Keycode) -> Option<usize> {
    let index = match key {
        Keycode::Num1 => 0,
        Keycode::Num2 => 1,
        Keycode::Num3 => 2,
        Keycode::Num4 => 3,
        Keycode::Num5 => 4,
        Keycode::Num6 => 5,
        Keycode::Num7 => 6,
        Keycode::Num8 => 7,
        Keycode::Num9 => 8,
        _ => return None,
    };
    Some(index)
}

fn report(outcome: HoverOutcome) {
    if let HoverOutcome::Drawn { point, utility } = outcome {
        debug!("hover ({:.3}, {:.3}) payoff {:.3}", point.x, point.y, utility);
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    let config = load_config(&args)?;
    let (width, height) = (config.width, config.height);

    let (mut display, texture_creator) =
        Display::with_options("heatmap-viewer", width, height, args.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;

    let mut surface = HeatmapSurface::from_config(&config).map_err(|e| e.to_string())?;
    let start = Instant::now();
    surface.render().map_err(|e| e.to_string())?;
    info!(
        "{}x{} heatmap ready in {:.1}ms, max utility {:.3}",
        width,
        height,
        start.elapsed().as_secs_f64() * 1000.0,
        surface.max_utility().unwrap_or(f64::NAN)
    );

    let scheme_names: Vec<String> = surface.registry().names().map(str::to_string).collect();
    let mut move_throttle: Throttle<PointerEvent> = Throttle::from_millis(config.move_throttle_ms);
    let mut leave_throttle: Throttle<()> = Throttle::from_millis(config.leave_throttle_ms);

    println!("=== heatmap-viewer ===");
    println!("Controls:");
    for (i, name) in scheme_names.iter().take(9).enumerate() {
        println!("  {}          - {} gradient", i + 1, name);
    }
    println!("  Left/Right - Cycle gradients");
    println!("  R          - Move reference curve to the hovered point");
    println!("  Escape     - Quit");

    'main: loop {
        let now = Instant::now();
        let mut next_scheme: Option<String> = None;

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::R => {
                        if let HoverState::Active { last, .. } = surface.hover_state() {
                            surface.set_reference_point(Some(last));
                            info!("reference point moved to ({:.3}, {:.3})", last.x, last.y);
                        }
                    },
                    Keycode::Left | Keycode::Right if !scheme_names.is_empty() => {
                        let n = scheme_names.len();
                        let current = scheme_names
                            .iter()
                            .position(|s| Some(s.as_str()) == surface.scheme_name())
                            .unwrap_or(0);
                        let idx = if key == Keycode::Left {
                            (current + n - 1) % n
                        } else {
                            (current + 1) % n
                        };
                        next_scheme = Some(scheme_names[idx].clone());
                    },
                    _ => {
                        if let Some(name) = scheme_for_key(key).and_then(|i| scheme_names.get(i)) {
                            next_scheme = Some(name.clone());
                        }
                    },
                },
                InputEvent::PointerMove { x, y } => {
                    let event = PointerEvent::at_pixel(x as f64, y as f64, display.width(), display.height());
                    leave_throttle.cancel();
                    if let Some(event) = move_throttle.offer(now, event) {
                        report(surface.on_pointer_move(&event));
                    }
                },
                InputEvent::PointerLeave => {
                    move_throttle.cancel();
                    if leave_throttle.offer(now, ()).is_some() {
                        surface.on_pointer_leave();
                    }
                },
            }
        }

        if let Some(event) = move_throttle.flush(now) {
            report(surface.on_pointer_move(&event));
        }
        if leave_throttle.flush(now).is_some() {
            surface.on_pointer_leave();
        }

        if let Some(name) = next_scheme {
            match surface.set_scheme(&name) {
                Ok(()) => info!("gradient: {}", name),
                Err(e) => error!("{}", e),
            }
        }

        // Cheap when nothing is stale
        if let Err(e) = surface.render() {
            error!("render failed: {}", e);
        }

        display.present(&mut target, surface.frame())?;
    }

    Ok(())
}
