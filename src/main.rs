mod config;
mod error;
mod fireworks;
mod remote;
mod render;

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind},
    execute, terminal,
};

use error::Result;
use fireworks::Show;
use remote::Command;
use render::{Canvas, ColorMode, RenderMode};

#[derive(Parser)]
#[command(name = "skyburst", about = "Terminal fireworks show. Press space for the grand finale.")]
struct Cli {
    /// Render mode [default: braille]
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// Color mode [default: true-color]
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Target FPS (1-120) [default: 30]
    #[arg(short, long)]
    fps: Option<u32>,

    /// Hide the status bar for pure animation mode
    #[arg(long)]
    clean: bool,

    /// Seed for a repeatable show
    #[arg(long)]
    seed: Option<u64>,

    /// Open with the grand finale
    #[arg(long)]
    finale: bool,

    /// Read JSON-lines commands from `stdin` or a file
    #[arg(long, value_name = "stdin|PATH")]
    remote: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<std::path::PathBuf>,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Print the config file path and exit
    #[arg(long)]
    show_config: bool,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,
}

/// Display settings after merging CLI flags over the config file.
struct Settings {
    render: RenderMode,
    color: ColorMode,
    fps: u32,
    clean: bool,
    color_quant: u8,
}

impl Settings {
    fn resolve(cli: &Cli, config: &config::Config) -> Self {
        Settings {
            render: cli
                .render
                .or(config.render.map(Into::into))
                .unwrap_or(RenderMode::Braille),
            color: cli
                .color
                .or(config.color.map(Into::into))
                .unwrap_or(ColorMode::TrueColor),
            fps: cli.fps.or(config.fps).unwrap_or(30).clamp(1, 120),
            clean: cli.clean || config.clean.unwrap_or(false),
            color_quant: config.color_quant.unwrap_or(0),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        match config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No config directory on this platform"),
        }
        return Ok(());
    }
    if cli.init_config {
        return init_config();
    }

    // An explicitly named config file must load; the default one is best effort
    let config = match cli.config.as_deref() {
        Some(path) => config::load_from(path)?,
        None => config::load_config(),
    };
    init_logging(
        cli.log_file.as_deref().or(config.log_file.as_deref()),
        cli.log_level.as_deref().or(config.log_level.as_deref()),
    )?;
    let settings = Settings::resolve(&cli, &config);
    let remote = cli
        .remote
        .as_deref()
        .map(|arg| remote::spawn_reader(remote::Source::from_arg(arg)))
        .transpose()?;

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        event::EnableMouseCapture
    )?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = run_loop(&mut writer, &settings, &cli, remote.as_ref());

    // Cleanup
    execute!(
        writer,
        event::DisableMouseCapture,
        cursor::Show,
        terminal::LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;

    if let Err(ref e) = result {
        log::error!("{e}");
    }
    result
}

fn init_config() -> Result<()> {
    let Some(path) = config::config_path() else {
        println!("No config directory on this platform");
        return Ok(());
    };
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, config::default_config_string())?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// The display owns the terminal, so logs only go to a file when asked for.
fn init_logging(path: Option<&Path>, level: Option<&str>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.unwrap_or("info")))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;
    log::info!("skyburst {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

const RENDER_MODES: [RenderMode; 3] = [RenderMode::Braille, RenderMode::HalfBlock, RenderMode::Ascii];
const COLOR_MODES: [ColorMode; 4] = [ColorMode::TrueColor, ColorMode::Ansi256, ColorMode::Ansi16, ColorMode::Mono];

/// Something the viewer asked for, from the keyboard, mouse or remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Finale,
    Clear,
    CycleRender,
    CycleColor,
    ToggleStatus,
    SetRender(RenderMode),
    SetColor(ColorMode),
}

fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('f') => Some(Action::Finale),
        KeyCode::Char('x') => Some(Action::Clear),
        KeyCode::Char('r') => Some(Action::CycleRender),
        KeyCode::Char('c') => Some(Action::CycleColor),
        KeyCode::Char('h') => Some(Action::ToggleStatus),
        _ => None,
    }
}

fn command_action(cmd: Command) -> Option<Action> {
    match cmd {
        Command::Finale => Some(Action::Finale),
        Command::Clear => Some(Action::Clear),
        Command::Render { mode } => {
            let action = RenderMode::from_name(&mode).map(Action::SetRender);
            if action.is_none() {
                log::warn!("unknown render mode {mode:?}");
            }
            action
        }
        Command::Color { mode } => {
            let action = ColorMode::from_name(&mode).map(Action::SetColor);
            if action.is_none() {
                log::warn!("unknown color mode {mode:?}");
            }
            action
        }
    }
}

fn next_in<T: PartialEq + Copy>(all: &[T], current: T) -> T {
    let idx = all.iter().position(|&m| m == current).unwrap_or(0);
    all[(idx + 1) % all.len()]
}

/// Display state that outlives a canvas rebuild.
struct Player {
    show: Show,
    canvas: Canvas,
    render_mode: RenderMode,
    color_mode: ColorMode,
    color_quant: u8,
    hide_status: bool,
    cols: u16,
    rows: u16,
    rebuild_canvas: bool,
}

impl Player {
    fn new(cols: u16, rows: u16, settings: &Settings, seed: Option<u64>) -> Self {
        let canvas = build_canvas(
            cols,
            rows,
            settings.render,
            settings.color,
            settings.color_quant,
            settings.clean,
        );
        Player {
            show: Show::start(canvas.width, canvas.height, seed),
            canvas,
            render_mode: settings.render,
            color_mode: settings.color,
            color_quant: settings.color_quant,
            hide_status: settings.clean,
            cols,
            rows,
            rebuild_canvas: false,
        }
    }

    /// Returns false when the player should exit.
    fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::Finale => {
                self.show.activate();
            }
            Action::Clear => self.show.clear(),
            Action::CycleRender => {
                self.render_mode = next_in(&RENDER_MODES, self.render_mode);
                self.rebuild_canvas = true;
            }
            Action::CycleColor => {
                self.color_mode = next_in(&COLOR_MODES, self.color_mode);
                self.rebuild_canvas = true;
            }
            Action::ToggleStatus => {
                self.hide_status = !self.hide_status;
                self.rebuild_canvas = true;
            }
            Action::SetRender(mode) => {
                self.render_mode = mode;
                self.rebuild_canvas = true;
            }
            Action::SetColor(mode) => {
                self.color_mode = mode;
                self.rebuild_canvas = true;
            }
        }
        true
    }

    fn rebuild(&mut self) {
        self.canvas = build_canvas(
            self.cols,
            self.rows,
            self.render_mode,
            self.color_mode,
            self.color_quant,
            self.hide_status,
        );
        self.show.on_resize(self.canvas.width, self.canvas.height);
        self.rebuild_canvas = false;
    }

    fn status_line(&self, actual_fps: f64) -> String {
        let sim = self.show.simulation();
        let counts = self.show.launcher().counts();
        format!(
            " skyburst | {} | {} launched, {} volleys | {} rockets {} sparks | {:?} | {:?} | {:.0} fps | [space] finale  [x] clear  [r] render  [c] color  [h] hide  [q] quit ",
            self.show.mode_label(),
            counts.ordinary + counts.finale,
            counts.volleys,
            sim.projectiles().len(),
            sim.particles().len(),
            self.render_mode,
            self.color_mode,
            actual_fps,
        )
    }
}

fn build_canvas(
    cols: u16,
    rows: u16,
    render_mode: RenderMode,
    color_mode: ColorMode,
    color_quant: u8,
    hide_status: bool,
) -> Canvas {
    // Reserve 1 row for status bar
    let display_rows = if hide_status { rows as usize } else { (rows as usize).saturating_sub(1) };
    let mut canvas = Canvas::new(cols as usize, display_rows, render_mode, color_mode);
    canvas.color_quant = color_quant;
    canvas
}

fn run_loop(
    stdout: &mut BufWriter<io::Stdout>,
    settings: &Settings,
    cli: &Cli,
    remote: Option<&Receiver<Command>>,
) -> Result<()> {
    let frame_dur = Duration::from_secs_f64(1.0 / settings.fps as f64);
    let (cols, rows) = terminal::size()?;
    let mut player = Player::new(cols, rows, settings, cli.seed);
    if cli.finale {
        player.show.activate();
    }

    let mut last_frame = Instant::now();
    let mut frame_count: u64 = 0;
    let mut actual_fps: f64 = 0.0;
    let mut fps_update = Instant::now();

    loop {
        // Handle input (non-blocking)
        while event::poll(Duration::ZERO)? {
            let action = match event::read()? {
                Event::Resize(w, h) => {
                    player.cols = w;
                    player.rows = h;
                    player.rebuild_canvas = true;
                    None
                }
                Event::Key(KeyEvent { code, .. }) => key_action(code),
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(_),
                    ..
                }) => Some(Action::Finale),
                _ => None,
            };
            if let Some(action) = action
                && !player.apply(action)
            {
                return Ok(());
            }
        }

        if let Some(rx) = remote {
            while let Ok(cmd) = rx.try_recv() {
                log::info!("remote command {cmd:?}");
                if let Some(action) = command_action(cmd)
                    && !player.apply(action)
                {
                    return Ok(());
                }
            }
        }

        // Rebuild canvas if mode changed or terminal resized
        if player.rebuild_canvas {
            // Re-read size to get the settled value
            let (settled_cols, settled_rows) = terminal::size()?;
            player.cols = settled_cols;
            player.rows = settled_rows;
            player.rebuild();
            // Reset terminal state completely
            write!(stdout, "\x1b[2J\x1b[H")?;
            stdout.flush()?;
        }

        // Timing
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;

        // Update & render
        player.show.update(&mut player.canvas, dt);
        let frame = player.canvas.render();

        // If the terminal changed size mid-frame, skip writing wrong-sized data
        let (check_cols, check_rows) = terminal::size()?;
        if check_cols != player.cols || check_rows != player.rows {
            player.rebuild_canvas = true;
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        // Build entire frame into buffer before flushing
        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;

        // Status bar
        frame_count += 1;
        if fps_update.elapsed() >= Duration::from_secs(1) {
            actual_fps = frame_count as f64 / fps_update.elapsed().as_secs_f64();
            frame_count = 0;
            fps_update = Instant::now();
        }
        if !player.hide_status && player.rows > 0 {
            let w = player.cols as usize;
            let truncated: String = player.status_line(actual_fps).chars().take(w).collect();
            let padded = format!("{:<width$}", truncated, width = w);
            write!(stdout, "\x1b[{};1H\x1b[7m{}\x1b[0m", player.rows, padded)?;
        }

        // Single flush per frame
        stdout.flush()?;

        // Sleep to target FPS
        let elapsed = last_frame.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            render: RenderMode::Braille,
            color: ColorMode::TrueColor,
            fps: 30,
            clean: false,
            color_quant: 0,
        }
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["skyburst", "--render", "ascii", "--fps", "500"]);
        let config: config::Config = toml::from_str(
            r#"
            render = "half-block"
            color = "ansi16"
            fps = 12
            "#,
        )
        .unwrap();
        let s = Settings::resolve(&cli, &config);
        assert_eq!(s.render, RenderMode::Ascii);
        assert_eq!(s.color, ColorMode::Ansi16);
        assert_eq!(s.fps, 120);
        assert!(!s.clean);
    }

    #[test]
    fn test_defaults_without_config() {
        let cli = Cli::parse_from(["skyburst"]);
        let s = Settings::resolve(&cli, &config::Config::default());
        assert_eq!(s.render, RenderMode::Braille);
        assert_eq!(s.color, ColorMode::TrueColor);
        assert_eq!(s.fps, 30);
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_action(KeyCode::Char(' ')), Some(Action::Finale));
        assert_eq!(key_action(KeyCode::Enter), Some(Action::Finale));
        assert_eq!(key_action(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Char('x')), Some(Action::Clear));
        assert_eq!(key_action(KeyCode::Char('z')), None);
    }

    #[test]
    fn test_remote_commands_map_to_actions() {
        assert_eq!(command_action(Command::Finale), Some(Action::Finale));
        assert_eq!(
            command_action(Command::Render { mode: "half-block".into() }),
            Some(Action::SetRender(RenderMode::HalfBlock))
        );
        assert_eq!(command_action(Command::Color { mode: "sepia".into() }), None);
    }

    #[test]
    fn test_player_actions() {
        let mut player = Player::new(80, 25, &settings(), Some(4));
        assert_eq!((player.canvas.width, player.canvas.height), (160, 96));

        assert!(player.apply(Action::Finale));
        assert!(player.show.launcher().is_finale());

        assert!(player.apply(Action::CycleRender));
        assert!(player.rebuild_canvas);
        player.rebuild();
        assert_eq!(player.render_mode, RenderMode::HalfBlock);
        assert_eq!((player.canvas.width, player.canvas.height), (80, 48));

        player.apply(Action::ToggleStatus);
        player.rebuild();
        assert_eq!(player.canvas.height, 50);

        assert!(!player.apply(Action::Quit));
    }

    #[test]
    fn test_resize_to_zero_rows() {
        let mut player = Player::new(80, 25, &settings(), Some(4));
        player.cols = 0;
        player.rows = 0;
        player.rebuild();
        player.show.update(&mut player.canvas, 0.5);
        assert!(player.canvas.render().is_empty());
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(next_in(&COLOR_MODES, ColorMode::Mono), ColorMode::TrueColor);
        assert_eq!(next_in(&RENDER_MODES, RenderMode::Braille), RenderMode::HalfBlock);
    }
}
