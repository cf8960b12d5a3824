// src/main.rs

mod config;
mod field_lines;
mod overlay;
mod perspective;
mod pipeline;
mod player_detection;
mod player_tracking;
mod stabilizer;
mod types;
mod video_processor;

use anyhow::Result;
use opencv::prelude::*;
use pipeline::VarPipeline;
use std::path::Path;
use tracing::{error, info};
use video_processor::VideoProcessor;

fn main() -> Result<()> {
    let config = types::Config::load("config.yaml")?;

    let default_filter = format!("offside_overlay={},ort=warn", config.logging.level);
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or(default_filter))
        .init();

    info!("⚽ VAR Line Overlay Starting");
    info!("✓ Configuration loaded");
    info!(
        "Stabilizer: max_jump={:.0}px, confirm_frames={}, smoothing={:.2}",
        config.stabilizer.max_jump_px,
        config.stabilizer.confirm_frames,
        config.stabilizer.smoothing_weight
    );

    let video_processor = VideoProcessor::new(config.clone());
    let video_files = video_processor.find_video_files()?;

    if video_files.is_empty() {
        error!("No video files found in {}", config.video.input_dir);
        return Ok(());
    }

    for (idx, video_path) in video_files.iter().enumerate() {
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            video_files.len(),
            video_path.display()
        );

        match process_video(video_path, &video_processor, &config) {
            Ok(stats) => {
                info!("✓ Video processed successfully");
                info!("  Total frames: {}", stats.frames);
                info!(
                    "  Perspective corrected: {} ({} passthrough)",
                    stats.corrected_frames, stats.passthrough_frames
                );
                info!("  Frames with VAR line: {}", stats.frames_with_line);
                if stats.frames > 0 {
                    info!(
                        "  Players detected: {} ({:.1} per frame)",
                        stats.players_detected,
                        stats.players_detected as f64 / stats.frames as f64
                    );
                }
            }
            Err(e) => error!("Failed to process {}: {e:#}", video_path.display()),
        }
    }

    Ok(())
}

fn process_video(
    video_path: &Path,
    video_processor: &VideoProcessor,
    config: &types::Config,
) -> Result<pipeline::PipelineStats> {
    let mut reader = video_processor.open_video(video_path)?;
    let mut writer =
        video_processor.create_writer(video_path, reader.width, reader.height, reader.fps)?;

    // Fresh pipeline per video: cache and stabilizer state must not leak
    // between streams.
    let mut var_pipeline = VarPipeline::new(config.clone())?;

    while let Some(frame) = reader.read_frame()? {
        let annotated = var_pipeline.process_frame(&frame)?;

        if let Some(writer) = writer.as_mut() {
            writer.write(&annotated)?;
        }

        if reader.current_frame % 100 == 0 {
            info!(
                "Progress: {:.1}% ({} transform computations)",
                reader.progress(),
                var_pipeline.transform_computations()
            );
        }
    }

    if let Some(mut writer) = writer {
        writer.release()?;
    }

    Ok(var_pipeline.stats.clone())
}
