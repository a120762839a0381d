//! OPC Movie CLI - Inspect, dump and generate OPC movie files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use opc_movie::{
    movie::{MovieHeader, MoviePlayer, MovieRecorder, RecorderState},
    schema::{MovieConfig, Pattern},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = program_name(&args);

    if args.len() < 2 {
        print_usage(program);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => print_example_config(),
        "info" if args.len() >= 3 => info(Path::new(&args[2])),
        "dump" if args.len() >= 3 => {
            let frames = args.get(3).and_then(|s| s.parse().ok());
            dump(Path::new(&args[2]), frames);
        }
        "generate" if args.len() >= 3 => {
            let pattern = args.get(3).map(|name| {
                Pattern::from_name(name).unwrap_or_else(|| {
                    eprintln!("Unknown pattern: {} (solid, chase, rainbow)", name);
                    std::process::exit(1);
                })
            });
            generate(&PathBuf::from(&args[2]), pattern);
        }
        _ => {
            print_usage(program);
            std::process::exit(1);
        }
    }
}

fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("opc-movie")
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!();
    eprintln!("Inspect, play back and generate OPC movie files.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <movie>                  Print header and frame count");
    eprintln!("  dump <movie> [frames]         Play frames (default: one loop)");
    eprintln!("  generate <config.json> [pat]  Record a test pattern movie");
    eprintln!("  --example                     Print an example configuration");
}

/// Header and total length of a movie file.
fn read_info(path: &Path) -> Result<(MovieHeader, u64), String> {
    let mut file =
        File::open(path).map_err(|e| format!("Error opening {}: {}", path.display(), e))?;
    let file_len = file
        .metadata()
        .map_err(|e| format!("Error reading metadata of {}: {}", path.display(), e))?
        .len();
    let header =
        MovieHeader::read_from(&mut file).map_err(|e| format!("Error reading header: {}", e))?;
    Ok((header, file_len))
}

fn info(path: &Path) {
    let (header, file_len) = read_info(path).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let frame_count = header.frame_count_for(file_len);
    let trailing = match header.frame_size() {
        Some(size) => {
            file_len.saturating_sub(MovieHeader::SIZE as u64) - frame_count * size as u64
        }
        None => 0,
    };

    println!("OPC Movie: {}", path.display());
    println!("==========");
    println!("Frame rate: {} ms", header.frame_rate_ms);
    println!(
        "Frame length: {} bytes ({} pixels)",
        header.frame_length,
        header.frame_length / 3
    );
    println!("Frames: {}", frame_count);
    println!(
        "Duration: {:.2}s",
        header.frame_interval().as_secs_f64() * frame_count as f64
    );
    if trailing > 0 {
        println!("Trailing bytes: {} (partial frame, skipped on playback)", trailing);
    }
}

fn dump(path: &Path, frames: Option<u64>) {
    let mut player = MoviePlayer::new(path);

    let first = player.try_read_frame().unwrap_or_else(|e| {
        eprintln!("Error playing {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let total = frames.or(player.frame_count()).unwrap_or(1);

    print_frame(0, &first);
    for i in 1..total {
        match player.try_read_frame() {
            Ok(frame) => print_frame(i, &frame),
            Err(e) => {
                eprintln!("Frame {}: {}", i, e);
                break;
            }
        }
    }

    println!();
    println!(
        "{} frames read, {} loop(s) completed",
        player.frames_read(),
        player.loops_completed()
    );
    player.stop_playback();
}

fn print_frame(index: u64, frame: &[u8]) {
    let prefix: Vec<String> = frame
        .iter()
        .take(12)
        .map(|b| format!("{:02x}", b))
        .collect();
    let ellipsis = if frame.len() > 12 { " ..." } else { "" };
    println!(
        "  #{:<6} {:>6} bytes  {}{}",
        index,
        frame.len(),
        prefix.join(" "),
        ellipsis
    );
}

fn generate(config_path: &Path, pattern: Option<Pattern>) {
    let mut config = MovieConfig::load(config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });
    if let Some(pattern) = pattern {
        config.pattern = pattern;
    }

    println!("Generating OPC movie");
    println!("====================");
    println!("Output: {}", config.path.display());
    println!("Pattern: {:?}", config.pattern);
    println!(
        "Pixels: {} ({} bytes/frame)",
        config.pixel_count,
        config.frame_length()
    );
    println!("Frames: {} at {} ms", config.frame_count, config.frame_rate_ms);

    let start = Instant::now();
    let mut recorder = MovieRecorder::from_config(&config);
    for i in 0..config.frame_count {
        recorder.write_frame(&config.pattern.frame(config.pixel_count, i));
        if recorder.state() == RecorderState::Failed {
            eprintln!("Recording failed, see log for details");
            std::process::exit(1);
        }
    }
    recorder.stop_recording();

    println!(
        "Wrote {} frames in {:.2}s",
        recorder.frames_written(),
        start.elapsed().as_secs_f32()
    );
}

fn print_example_config() {
    let config = MovieConfig::default();

    println!("Example configuration (movie.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
