use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::driver::GridCollection;
use crate::encoding::{is_video_path, FfmpegPipe, VideoSettings};
use crate::raster::{fnv1a64, render_collection_rgba, save_rgba_png, sequence_digest, RasterLayout};
use crate::schema::GridConfig;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub frames: u32,
    pub fps: u32,
    pub layout: RasterLayout,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    pub digest: u64,
}

enum FrameSink {
    Png(PathBuf),
    Video(FfmpegPipe),
}

/// Simulate `options.frames` ticks of `config` and write each frame.
pub fn render_sequence(config: &GridConfig, options: &RenderOptions) -> Result<RenderSummary> {
    if options.frames == 0 {
        bail!("frame count must be > 0");
    }
    if options.fps == 0 {
        bail!("fps must be > 0");
    }
    options.layout.validate()?;

    let mut collection = GridCollection::from_config(config)?;
    let (width, height) = options.layout.canvas_size(collection.len());

    let mut sink = if is_video_path(&options.output) {
        let settings = VideoSettings {
            width,
            height,
            fps: options.fps,
        };
        FrameSink::Video(FfmpegPipe::spawn(&settings, &options.output)?)
    } else {
        fs::create_dir_all(&options.output).with_context(|| {
            format!("failed to create output directory {}", options.output.display())
        })?;
        FrameSink::Png(options.output.clone())
    };

    let mut frame_hashes = Vec::with_capacity(options.frames as usize);
    for frame_index in 0..options.frames {
        collection.tick(&config.params);
        let rgba = render_collection_rgba(&collection, &options.layout)?;
        frame_hashes.push(fnv1a64(&rgba));

        match &mut sink {
            FrameSink::Png(dir) => {
                let path = frame_path(dir, frame_index);
                save_rgba_png(&path, width, height, rgba)?;
            }
            FrameSink::Video(pipe) => pipe.write_frame(rgba)?,
        }

        if frame_index % options.fps == 0 {
            info!(frame = frame_index + 1, total = options.frames, "rendered frame");
        }
    }

    if let FrameSink::Video(pipe) = sink {
        pipe.finish()?;
    }

    Ok(RenderSummary {
        frames: options.frames,
        width,
        height,
        digest: sequence_digest(&frame_hashes),
    })
}

pub fn frame_path(dir: &Path, frame_index: u32) -> PathBuf {
    dir.join(format!("frame_{frame_index:04}.png"))
}
