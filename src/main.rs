use anyhow::{bail, Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use env_logger::Env;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mpv_object::mpv::{LibMpv, MpvHandle};
use mpv_object::player::{CallType, LogLevel, MediaStatus, MpvObject, Signal};
use mpv_object::utils::{format_duration, load_config, Config};

/// mpv-object - headless libmpv player driven through the control facade
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media file or URL to play
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Set initial volume (0-100)
    #[arg(short, long, value_name = "VOLUME")]
    volume: Option<i64>,

    /// Hardware decoding mode, e.g. "auto-safe" or "no"
    #[arg(long, value_name = "MODE")]
    hwdec: Option<String>,

    /// libmpv log level: off, debug, info, warning, critical or fatal
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    mpv_log_level: Option<LogLevel>,

    /// Send property writes and commands asynchronously
    #[arg(long = "async")]
    asynchronous: bool,

    /// Disable video output
    #[arg(long)]
    no_video: bool,

    /// Print the track list as JSON once the file is loaded
    #[arg(long)]
    dump_tracks: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_log_level(name: &str) -> std::result::Result<LogLevel, String> {
    LogLevel::from_name(name).ok_or_else(|| format!("unknown log level: {}", name))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => load_config()?,
    };

    // Initialize logging
    let filter = if args.debug {
        "debug".to_string()
    } else {
        config.general.log_filter.clone()
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();

    info!("Starting mpv-object v{}", env!("CARGO_PKG_VERSION"));

    if let Some(volume) = args.volume {
        config.playback.volume = volume;
    }
    if let Some(hwdec) = args.hwdec {
        config.playback.hwdec = Some(hwdec);
    }
    if let Some(level) = args.mpv_log_level {
        config.general.mpv_log_level = level;
    }
    if args.asynchronous {
        config.general.call_type = CallType::Asynchronous;
    }
    config.validate()?;

    let mpv = LibMpv::new().context("failed to create mpv core")?;
    if args.no_video {
        mpv.set_property("vo", &"null".into())?;
    }
    let mut player = MpvObject::new(Arc::new(mpv)).context("failed to initialize mpv")?;
    let changed = player.apply_config(&config);
    debug!("{} settings applied from configuration", changed);
    info!("{}, ffmpeg {}", player.mpv_version(), player.ffmpeg_version());

    let (signal_tx, signal_rx) = unbounded();
    let _subscription = player.subscribe(move |signal| {
        let _ = signal_tx.send(signal);
    });

    if !player.open(&args.source) {
        bail!("not a playable source: {}", args.source);
    }

    let mut last_position = -1;
    loop {
        player.process_pending_timeout(Duration::from_millis(250));

        for signal in signal_rx.try_iter() {
            match signal {
                Signal::Loaded => {
                    let duration = Duration::from_secs(player.duration().unsigned_abs());
                    info!("Loaded {} ({})", player.media_title(), format_duration(duration));
                    if args.dump_tracks {
                        println!("{}", serde_json::to_string_pretty(&player.media_tracks())?);
                    }
                }
                Signal::Playing => info!("Playing"),
                Signal::Paused => info!("Paused"),
                Signal::MediaStatusChanged => debug!("Media status: {:?}", player.media_status()),
                _ => {}
            }
        }

        if player.is_shut_down() {
            info!("mpv shut down");
            break;
        }
        if player.media_status() == MediaStatus::End {
            info!("Playback finished");
            break;
        }

        let position = player.position();
        if position != last_position {
            last_position = position;
            debug!(
                "Position: {}",
                format_duration(Duration::from_secs(position.unsigned_abs()))
            );
        }
    }

    Ok(())
}
