//! demoscope CLI - analyze player positions in a CS2 demo export
//!
//! Reads a demo export (JSONL or SQLite), samples every player's position at
//! fixed in-round timestamps, writes per-player JSON position summaries, and
//! renders density heatmaps for one named player.
//!
//! Usage:
//!   demoscope --demo match.jsonl --player apex
//!   demoscope --demo match.db --player 3
//!   demoscope --demo match.jsonl --player apex --config analysis.toml
//!   demoscope --demo match.jsonl --player apex --out-dir out/

use std::path::PathBuf;
use std::process::ExitCode;

use demoscope::analysis::{AnalysisConfig, collect_positions, dominant_side, split_round_ranges};
use demoscope::demo::{DemoData, load_json_export, load_sqlite_export};
use demoscope::heatmap::{MapCalibration, render_combined_heatmap, render_marker_heatmap};
use demoscope::summary::{build_summary, sanitize_player_name, write_summary};

fn main() -> ExitCode {
    let config = CliConfig::from_args();

    if config.show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Configuration for the demoscope CLI
#[derive(Default)]
struct CliConfig {
    demo_path: Option<PathBuf>,
    player: Option<String>,
    config_file: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    show_help: bool,
}

impl CliConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--demo" => {
                    if i + 1 < args.len() {
                        config.demo_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--player" => {
                    if i + 1 < args.len() {
                        config.player = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--config" => {
                    if i + 1 < args.len() {
                        config.config_file = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--out-dir" | "-o" => {
                    if i + 1 < args.len() {
                        config.out_dir = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    config.show_help = true;
                }
                arg if !arg.starts_with('-') => {
                    // Positional argument: demo path
                    config.demo_path = Some(PathBuf::from(arg));
                }
                _ => {}
            }
            i += 1;
        }

        config
    }
}

fn print_help() {
    println!(
        r#"demoscope - player position analysis for CS2 demo exports

USAGE:
    demoscope --demo <EXPORT> --player <NAME|INDEX> [OPTIONS]

ARGUMENTS:
    --demo <EXPORT>      Demo export path (.jsonl/.json, or .db/.sqlite)
    --player <ARG>       Player name, or 1-based index into the player list

OPTIONS:
    --config <FILE>      TOML file with time markers and map overrides
    --out-dir, -o <DIR>  Output directory (default: <demo_dir>/<demo_stem>/)
    --help, -h           Show this help

EXAMPLES:
    # Analyze apex at the default 1:48 / 1:47 / 1:46 timestamps
    demoscope --demo match.jsonl --player apex

    # Analyze the third player in the sorted player list
    demoscope --demo match.db --player 3

CONFIG FILE FORMAT (TOML):
    [[marker]]
    label = "1m30s"
    seconds_before_end = 25.0
    display_time = "1:30"

    [maps.de_custom]
    pos_x = -2000.0
    pos_y = 2000.0
    scale = 4.0
"#
    );
}

fn run(config: &CliConfig) -> Result<(), String> {
    let demo_path = config
        .demo_path
        .as_ref()
        .ok_or("no demo export given (use --demo, see --help)")?;
    let player_arg = config
        .player
        .as_ref()
        .ok_or("no player given (use --player, see --help)")?;

    if !demo_path.exists() {
        return Err(format!("demo export not found at '{}'", demo_path.display()));
    }

    println!("Loading demo export: {}...", demo_path.display());
    let data = load_export(demo_path)?;

    if data.rounds.is_empty() {
        return Err("no rounds data found in the export".to_string());
    }
    if data.ticks.is_empty() {
        return Err("no ticks data found in the export".to_string());
    }

    let tickrate = match data.header.tickrate {
        Some(rate) => {
            println!("Using tickrate: {}", rate);
            rate
        }
        None => {
            eprintln!(
                "Warning: tickrate not found in export header, assuming {}",
                demoscope::DEFAULT_TICKRATE
            );
            demoscope::DEFAULT_TICKRATE
        }
    };

    let players = data.players();
    let player = match data.resolve_player(player_arg) {
        Ok(name) => name,
        Err(e) => {
            print_available_players(&players);
            return Err(e);
        }
    };
    println!("Analyzing player: {}", player);

    let analysis_config = match &config.config_file {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let markers = analysis_config.markers();
    let ranges = split_round_ranges(&data.rounds);
    println!(
        "Processing {} rounds in {} segment(s) at {} timestamp(s)",
        data.round_count(),
        ranges.len(),
        markers.len()
    );

    let collected = collect_positions(&data, &ranges, &markers, tickrate);

    let out_dir = match &config.out_dir {
        Some(dir) => dir.clone(),
        None => default_out_dir(demo_path),
    };

    // JSON summaries for every player, plus the filtered target file.
    let table = demoscope::FrequencyTable::from_marker_positions(&collected);
    let summary = build_summary(&table, &data.header.map_name);
    let (full_path, target_path) = write_summary(&out_dir, &summary, &player)?;
    println!("JSON summary saved to {}", full_path.display());
    println!("Target player JSON saved to {}", target_path.display());

    // Heatmaps for the target player only.
    let all_target_samples: Vec<_> = collected
        .iter()
        .flat_map(|item| item.samples_for(&player).iter().cloned())
        .collect();
    if all_target_samples.is_empty() {
        println!("No positions captured for {}; skipping heatmaps.", player);
        return Ok(());
    }

    let calib = MapCalibration::resolve(
        &data.header.map_name,
        &analysis_config.maps,
        &all_target_samples,
    );

    let safe_name = sanitize_player_name(&player);
    let mut generated = 0;

    for item in &collected {
        let samples = item.samples_for(&player);
        if samples.is_empty() {
            continue;
        }
        let side = dominant_side(samples);
        let image_path = out_dir.join(format!(
            "heatmap_{}_{}_{}_{}.png",
            safe_name, item.range_name, item.marker.label, side
        ));
        println!(
            "Generating heatmap: {} - {} ({} positions, {} side)",
            item.range_label,
            item.marker.display_time,
            samples.len(),
            side
        );
        render_marker_heatmap(samples, &side, &calib, &image_path)?;
        generated += 1;
    }

    for range in &ranges {
        let layers: Vec<_> = collected
            .iter()
            .filter(|item| item.range_name == range.name)
            .map(|item| (&item.marker, item.samples_for(&player)))
            .filter(|(_, samples)| !samples.is_empty())
            .collect();
        if layers.is_empty() {
            println!(
                "No data for combined heatmap for player {} in range {}",
                player, range.label
            );
            continue;
        }

        let range_samples: Vec<_> = layers
            .iter()
            .flat_map(|(_, samples)| samples.iter().cloned())
            .collect();
        let side = dominant_side(&range_samples);

        let image_path = out_dir.join(format!(
            "heatmap_{}_{}_combined_{}.png",
            safe_name, range.name, side
        ));
        println!(
            "Generating combined heatmap: {} ({} positions, {} side)",
            range.label,
            range_samples.len(),
            side
        );
        render_combined_heatmap(&layers, &side, &calib, range, &image_path)?;
        generated += 1;
    }

    println!(
        "Generated {} heatmaps for {} in {}",
        generated,
        player,
        out_dir.display()
    );

    println!("\nAnalysis complete.");
    println!("Available players in this demo (use name or 1-based index for --player):");
    print_available_players(&players);

    Ok(())
}

/// Pick the loader from the export file extension.
fn load_export(path: &PathBuf) -> Result<DemoData, String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("db") | Some("sqlite") | Some("sqlite3") => load_sqlite_export(path),
        _ => load_json_export(path),
    }
}

/// Default output directory: a folder named after the demo, next to it.
fn default_out_dir(demo_path: &PathBuf) -> PathBuf {
    let stem = demo_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "demo".to_string());
    match demo_path.parent() {
        Some(parent) => parent.join(stem),
        None => PathBuf::from(stem),
    }
}

fn print_available_players(players: &[String]) {
    for (i, name) in players.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
}
