use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

/// Streams raw RGBA frames into a system `ffmpeg` process on a writer thread.
pub struct FfmpegPipe {
    sender: Option<mpsc::SyncSender<Vec<u8>>>,
    worker: Option<JoinHandle<Result<()>>>,
}

#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FfmpegPipe {
    pub fn spawn(settings: &VideoSettings, output_path: &Path) -> Result<Self> {
        if settings.width == 0 || settings.height == 0 || settings.fps == 0 {
            bail!(
                "video settings must be positive, got {}x{} at {} fps",
                settings.width,
                settings.height,
                settings.fps
            );
        }

        let args = ffmpeg_args(settings, output_path);
        let output_path = output_path.to_path_buf();
        let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(4);

        let worker = thread::Builder::new()
            .name("rgrid-ffmpeg-encoder".to_owned())
            .spawn(move || run_ffmpeg_process(Path::new("ffmpeg"), receiver, &args, &output_path))
            .context("failed to spawn ffmpeg writer thread")?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn write_frame(&self, rgba_frame: Vec<u8>) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("encoder has already been finalized"))?;
        sender
            .send(rgba_frame)
            .map_err(|_| anyhow!("failed to enqueue frame for ffmpeg"))
    }

    pub fn finish(mut self) -> Result<()> {
        drop(self.sender.take());

        let handle = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("ffmpeg worker thread missing"))?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("ffmpeg worker thread panicked")),
        }
    }
}

fn run_ffmpeg_process(
    ffmpeg_path: &Path,
    receiver: mpsc::Receiver<Vec<u8>>,
    args: &[String],
    output_path: &PathBuf,
) -> Result<()> {
    let path_str = output_path.to_string_lossy();
    if path_str.chars().any(|c| c.is_control()) {
        bail!("output path contains invalid control characters");
    }

    debug!(args = %args.join(" "), "spawning ffmpeg");
    let mut child = Command::new(ffmpeg_path)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                anyhow!(
                    "ffmpeg executable not found (resolved_path={}). Install ffmpeg or render to a PNG directory instead.",
                    ffmpeg_path.display()
                )
            } else {
                anyhow!(
                    "failed to spawn ffmpeg process (resolved_path={}, args='{}'): {error}",
                    ffmpeg_path.display(),
                    args.join(" ")
                )
            }
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("failed to capture ffmpeg stdin"))?;
    let mut stderr_pipe = child.stderr.take();

    while let Ok(frame) = receiver.recv() {
        stdin
            .write_all(&frame)
            .context("failed to write frame to ffmpeg stdin")?;
    }

    stdin.flush().context("failed to flush ffmpeg stdin")?;
    drop(stdin);

    let status = child.wait().context("failed waiting for ffmpeg process")?;
    let stderr_tail = read_stderr_tail(&mut stderr_pipe)?;
    if !status.success() {
        return Err(anyhow!(
            "ffmpeg failed with status {status} (args='{}', stderr_tail='{}')",
            args.join(" "),
            stderr_tail
        ));
    }

    Ok(())
}

pub fn ffmpeg_args(settings: &VideoSettings, output_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_owned(),
        "-loglevel".to_owned(),
        "error".to_owned(),
        "-y".to_owned(),
        "-f".to_owned(),
        "rawvideo".to_owned(),
        "-pix_fmt".to_owned(),
        "rgba".to_owned(),
        "-s:v".to_owned(),
        format!("{}x{}", settings.width, settings.height),
        "-r".to_owned(),
        settings.fps.to_string(),
        "-i".to_owned(),
        "-".to_owned(),
        "-an".to_owned(),
        // yuv420p needs even dimensions
        "-vf".to_owned(),
        "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_owned(),
        "-c:v".to_owned(),
        "libx264".to_owned(),
        "-pix_fmt".to_owned(),
        "yuv420p".to_owned(),
    ];
    if is_video_path(output_path) {
        args.push("-movflags".to_owned());
        args.push("+faststart".to_owned());
    }
    args.push(output_path.to_string_lossy().into_owned());
    args
}

/// Whether `path` names a video container rather than a frame directory.
pub fn is_video_path(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(ext.as_str(), "mp4" | "mov" | "m4v")
}

fn read_stderr_tail(stderr: &mut Option<std::process::ChildStderr>) -> Result<String> {
    let Some(mut pipe) = stderr.take() else {
        return Ok(String::new());
    };
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)
        .context("failed reading ffmpeg stderr")?;
    let text = String::from_utf8_lossy(&buf).to_string();
    Ok(last_n_chars(&text, 500))
}

fn last_n_chars(s: &str, max_chars: usize) -> String {
    let chars = s.chars().collect::<Vec<_>>();
    let start = chars.len().saturating_sub(max_chars);
    chars[start..].iter().collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ffmpeg_args, is_video_path, last_n_chars, VideoSettings};

    #[test]
    fn video_paths_are_recognised_by_extension() {
        assert!(is_video_path(Path::new("out/grids.MP4")));
        assert!(is_video_path(Path::new("grids.mov")));
        assert!(!is_video_path(Path::new("frames")));
        assert!(!is_video_path(Path::new("frames.png")));
    }

    #[test]
    fn args_describe_rawvideo_input_and_end_with_output() {
        let settings = VideoSettings {
            width: 944,
            height: 392,
            fps: 60,
        };
        let args = ffmpeg_args(&settings, Path::new("grids.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s:v 944x392 -r 60 -i -"));
        assert!(joined.contains("-c:v libx264"));
        assert_eq!(args.last().map(String::as_str), Some("grids.mp4"));
    }

    #[test]
    fn stderr_tail_keeps_last_characters() {
        assert_eq!(last_n_chars("  abcdef  ", 4), "ef");
        assert_eq!(last_n_chars("abc", 10), "abc");
    }
}
