// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background compression of rotated-out log files.

use std::fs;
use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::thread::JoinHandle;

use anyhow::Context;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Filename extension of finished archives.
pub const ARCHIVE_SUFFIX: &str = "gz";

/// Compress `src` into a gzip archive at `dst`.
///
/// `dst` is created or truncated. The source file is left untouched.
pub fn compress_file(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let mut reader = File::open(src)
        .with_context(|| format!("failed to open {} for archiving", src.display()))?;
    let writer = File::create(dst)
        .with_context(|| format!("failed to create archive {}", dst.display()))?;
    let mut encoder = GzEncoder::new(writer, Compression::default());
    io::copy(&mut reader, &mut encoder)
        .with_context(|| format!("failed to compress {}", src.display()))?;
    encoder
        .finish()
        .with_context(|| format!("failed to finish archive {}", dst.display()))?;
    Ok(())
}

/// Expand the gzip archive at `src` into `dst`.
pub fn decompress_file(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let reader =
        File::open(src).with_context(|| format!("failed to open archive {}", src.display()))?;
    let mut decoder = GzDecoder::new(reader);
    let mut writer =
        File::create(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("failed to decompress {}", src.display()))?;
    Ok(())
}

/// Archive path for a rotated-out file: `<path>.gz`.
pub(crate) fn archive_path(rotated: &Path) -> PathBuf {
    let mut name = rotated.as_os_str().to_owned();
    name.push(".");
    name.push(ARCHIVE_SUFFIX);
    PathBuf::from(name)
}

/// A dedicated thread that turns rotated-out files into archives.
///
/// Paths arrive over a small bounded queue; rotation is infrequent relative
/// to record volume, so a full queue stalls the rotation step rather than
/// dropping an archive job. The original file is removed only after the
/// archive has been fully written, so a failed archival step never loses log
/// data.
#[derive(Debug)]
pub(crate) struct CompressWorker {
    sender: Sender<PathBuf>,
    handle: JoinHandle<()>,
}

impl CompressWorker {
    const QUEUE_CAPACITY: usize = 2;

    pub(crate) fn spawn() -> CompressWorker {
        let (sender, receiver) = bounded(Self::QUEUE_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("logroll-compress".to_string())
            .spawn(move || run(receiver))
            .expect("failed to spawn the log compression thread");
        CompressWorker { sender, handle }
    }

    /// Hand a rotated-out file over to the worker.
    ///
    /// Blocks while the queue is full. The worker owns the file from this
    /// point until it is archived and deleted.
    pub(crate) fn submit(&self, rotated: PathBuf) {
        // if the worker thread is gone, the uncompressed file stays on disk
        let _ = self.sender.send(rotated);
    }

    /// Disconnect the queue and wait for the worker to drain every pending
    /// archive job.
    pub(crate) fn shutdown(self) {
        let CompressWorker { sender, handle } = self;
        drop(sender);
        let _ = handle.join();
    }
}

fn run(receiver: Receiver<PathBuf>) {
    // terminates when every sender is dropped and the queue is drained
    while let Ok(rotated) = receiver.recv() {
        let archive = archive_path(&rotated);
        match compress_file(&rotated, &archive) {
            Ok(()) => {
                if let Err(err) = fs::remove_file(&rotated) {
                    eprintln!("failed to remove rotated log {}: {err}", rotated.display());
                }
            }
            Err(err) => {
                // keep the uncompressed file in place
                eprintln!("failed to archive {}: {err:#}", rotated.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_compress_roundtrip_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("app.log-1");
        let archive = temp_dir.path().join("app.log-1.gz");
        let restored = temp_dir.path().join("restored.log");

        let payload: Vec<u8> = (0..4096u32).flat_map(|i| i.to_le_bytes()).collect();
        File::create(&src).unwrap().write_all(&payload).unwrap();

        compress_file(&src, &archive).unwrap();
        decompress_file(&archive, &restored).unwrap();

        assert_eq!(fs::read(&restored).unwrap(), payload);
    }

    #[test]
    fn test_worker_archives_and_removes_original() {
        let temp_dir = TempDir::new().unwrap();
        let rotated = temp_dir.path().join("app.log-202408110500");
        fs::write(&rotated, b"rotated contents\n").unwrap();

        let worker = CompressWorker::spawn();
        worker.submit(rotated.clone());
        worker.shutdown();

        assert!(!rotated.exists());
        let archive = archive_path(&rotated);
        assert!(archive.exists());

        let restored = temp_dir.path().join("restored");
        decompress_file(&archive, &restored).unwrap();
        assert_eq!(fs::read(&restored).unwrap(), b"rotated contents\n");
    }

    #[test]
    fn test_missing_source_leaves_no_archive() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("never-existed");

        let worker = CompressWorker::spawn();
        worker.submit(missing.clone());
        worker.shutdown();

        assert!(!archive_path(&missing).exists());
    }
}
