use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use libollama::shutdown::signal_exit_code;
use libollama::{
    spawn_signal_listener, CorrectionEngine, KeyEvent, OllamaConfig, OllamaCorrector,
    RecognizerClient, ServiceError, ShutdownGuard, Supervisor,
};

/// Interactive correction console backed by a local Ollama server.
#[derive(Debug, Parser)]
#[command(name = "libollama", version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ollama base URL
    #[arg(long)]
    host: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Append a space after applied corrections
    #[arg(long)]
    trailing_space: bool,

    /// Chars of preceding text sent as context
    #[arg(long)]
    context_chars: Option<usize>,

    /// Do not probe or start the server
    #[arg(long)]
    no_supervise: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn load_config(&self) -> Result<OllamaConfig> {
        let mut config = match &self.config {
            Some(path) => OllamaConfig::load_toml(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => OllamaConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if self.temperature.is_some() {
            config.temperature = self.temperature;
        }
        if self.trailing_space {
            config.base_mut().trailing_space = true;
        }
        if let Some(chars) = self.context_chars {
            config.base_mut().context_chars = chars;
        }
        Ok(config)
    }
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = args.load_config()?;

    let supervisor = Arc::new(Mutex::new(
        Supervisor::from_config(&config).context("failed to set up supervisor")?,
    ));
    let guard = ShutdownGuard::new(Arc::clone(&supervisor));
    let signals = spawn_signal_listener(guard.clone(), |signal| {
        std::process::exit(signal_exit_code(signal))
    })
    .context("failed to start signal listener")?;

    if !args.no_supervise {
        let ready = supervisor
            .lock()
            .map_err(|_| anyhow::anyhow!("supervisor lock poisoned"))?
            .ensure_ready();
        if let Err(ServiceError::Aborted) = ready {
            // the signal thread tore down and exits with the signal's code
            let _ = signals.join();
            return Ok(());
        }
        if let Err(err) = ready {
            eprintln!("✗ {}", err.user_message());
            guard.trigger("startup failure");
            return Err(err).context("inference service unavailable");
        }
    }

    let result = run(&config);
    guard.trigger("quit");
    result
}

fn run(config: &OllamaConfig) -> Result<()> {
    let corrector = OllamaCorrector::new(config)?;
    let mut engine = CorrectionEngine::new(Box::new(corrector), config.base().clone())
        .context("failed to start correction worker")?;
    let recognizer = RecognizerClient::new(&config.recognizer_url, config.request_timeout())?;
    let wait_limit = config.request_timeout() + Duration::from_secs(1);

    println!("═══════════════════════════════════════════════════");
    println!("  libollama - Interactive Correction Console");
    println!("═══════════════════════════════════════════════════");
    println!("Type text and press Enter; finished words are checked.");
    println!("Commands: :a accept  :r reject  :fix  :t text  :draw <png>");
    println!("          :imu-start  :imu-stop  :q quit");
    println!();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let raw = line?;
        let input = raw.trim_end_matches(['\r', '\n']);
        let (command, rest) = input.split_once(' ').unwrap_or((input, ""));

        match command {
            ":q" => break,
            ":a" => match engine.accept_suggestion() {
                Some(outcome) => println!("  ✓ {:?}", outcome),
                None => println!("  (no suggestion)"),
            },
            ":r" => {
                engine.reject_suggestion();
            }
            ":t" => {}
            ":fix" => {
                engine.process_key(KeyEvent::CorrectLastWord);
                wait_for_engine(&mut engine, wait_limit);
            }
            ":draw" => match std::fs::read(rest.trim()) {
                Ok(png) => match recognizer.predict(png) {
                    Ok(prediction) => {
                        println!(
                            "  ✎ {} ({:.1}% confidence)",
                            prediction.character,
                            prediction.confidence_percent()
                        );
                        engine.insert_text(&prediction.character);
                    }
                    Err(err) => println!("  ✗ {err}"),
                },
                Err(err) => println!("  ✗ cannot read {}: {err}", rest.trim()),
            },
            ":imu-start" => match recognizer.start_capture() {
                Ok(()) => println!("  ● collecting IMU data"),
                Err(err) => println!("  ✗ start failed: {err}"),
            },
            ":imu-stop" => match recognizer.stop_capture() {
                Ok(prediction) => {
                    println!(
                        "  ✎ {} ({:.1}% confidence)",
                        prediction.character,
                        prediction.confidence_percent()
                    );
                    engine.insert_text(&prediction.character);
                }
                Err(err) => println!("  ✗ stop failed: {err}"),
            },
            _ => {
                for ch in input.chars() {
                    let key = match ch {
                        ' ' => KeyEvent::Space,
                        '\t' => KeyEvent::Tab,
                        other => KeyEvent::Char(other),
                    };
                    engine.process_key(key);
                }
                engine.process_key(KeyEvent::Space);
                wait_for_engine(&mut engine, wait_limit);
            }
        }

        let ctx = engine.context();
        println!("  text: {}", ctx.markup);
        println!("  [{}]", ctx.status_text);
        if let Some(suggestion) = ctx.suggestion_text() {
            println!("  suggestion: {suggestion}   (:a accept, :r reject)");
        }
        io::stdout().flush()?;
    }
    Ok(())
}

fn wait_for_engine(engine: &mut CorrectionEngine, limit: Duration) {
    let deadline = Instant::now() + limit;
    while engine.is_busy() && Instant::now() < deadline {
        engine.poll();
        thread::sleep(Duration::from_millis(20));
    }
    engine.poll();
}
