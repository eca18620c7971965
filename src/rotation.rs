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

//! Rotation policy and the lifecycle of the active log file.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use jiff::Timestamp;
use jiff::Zoned;

use crate::compress::ARCHIVE_SUFFIX;
use crate::compress::CompressWorker;

/// How the active log file rolls over.
///
/// At most one mode is active per writer. When both a duration and a size
/// threshold are configured, the duration takes precedence; this is resolved
/// once at construction and never re-evaluated per write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rotation {
    /// Roll when "now" leaves the time block the file was opened in.
    ByTime(Duration),
    /// Roll when the file grows strictly beyond this many bytes.
    BySize(u64),
}

/// Format of time-block identifiers, used as rotated-file suffixes.
const BLOCK_FORMAT: &str = "%Y%m%d%H%M%S";

/// The identifier of the time block `time` falls into: the block-aligned
/// truncation of `time`, rendered compactly.
///
/// A 5-minute period puts 16:56:23 into the 16:55:00 block.
pub(crate) fn time_block(time: &Zoned, period: Duration) -> String {
    let secs = (period.as_secs().max(1)) as i64;
    let start = time.timestamp().as_second().div_euclid(secs) * secs;
    let start = Timestamp::from_second(start)
        .unwrap_or_else(|_| time.timestamp())
        .to_zoned(time.time_zone().clone());
    start.strftime(BLOCK_FORMAT).to_string()
}

/// The active output file and the counters that drive rotation.
///
/// Owned exclusively by the consumer thread; no other thread ever touches the
/// handle, the byte counter, or the block identifier, so none of them needs a
/// lock.
#[derive(Debug)]
pub(crate) struct ActiveFile {
    dir: PathBuf,
    filename: String,
    path: PathBuf,
    rotation: Option<Rotation>,
    file: Option<File>,
    written: u64,
    last_block: Option<String>,
}

impl ActiveFile {
    pub(crate) fn new(dir: PathBuf, filename: String, rotation: Option<Rotation>) -> ActiveFile {
        let path = dir.join(&filename);
        ActiveFile {
            dir,
            filename,
            path,
            rotation,
            file: None,
            written: 0,
            last_block: None,
        }
    }

    /// Append one rendered line, rotating around it as the policy dictates.
    ///
    /// The time check runs before the write so records of a new block land in
    /// the new file; the size check runs after it so the overflowing record
    /// stays with the file being archived and the fresh file starts empty.
    /// I/O failures are reported to stderr and the line is dropped, never
    /// retried.
    pub(crate) fn append(&mut self, line: &str, compress: Option<&CompressWorker>) {
        let now = Zoned::now();

        if self.open(&now).is_none() {
            return;
        }
        if let Some(Rotation::ByTime(period)) = self.rotation {
            let block = time_block(&now, period);
            if self.last_block.as_deref() != Some(block.as_str()) {
                let suffix = self.last_block.take();
                self.last_block = Some(block);
                if let Some(suffix) = suffix {
                    self.rotate(&suffix, compress);
                }
            }
        }

        let Some(file) = self.open(&now) else {
            return;
        };
        match file.write_all(line.as_bytes()) {
            Ok(()) => self.written += line.len() as u64,
            Err(err) => {
                eprintln!(
                    "failed to write log to {}: {err}\tdata: {line}",
                    self.path.display()
                );
                return;
            }
        }

        if let Some(Rotation::BySize(max_bytes)) = self.rotation {
            if self.written > max_bytes {
                // a failed directory scan abandons this rotation cycle; the
                // threshold check fires again on the next write
                if let Some(seq) = self.next_sequence() {
                    self.rotate(&seq.to_string(), compress);
                }
            }
        }
    }

    /// Close the handle before shutdown so buffered bytes reach the disk.
    pub(crate) fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(err) = file.flush() {
                eprintln!("failed to flush {}: {err}", self.path.display());
            }
        }
    }

    /// Open-or-create the target path if no handle is cached.
    ///
    /// A pre-existing file left over from a previous run is appended to, not
    /// truncated; its size and last-modified time seed the rotation counters
    /// so the first rotation decision is made against its real state.
    fn open(&mut self, now: &Zoned) -> Option<&mut File> {
        if self.file.is_none() {
            let existing = fs::metadata(&self.path).ok();
            let file = match OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.path)
            {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("failed to open log file {}: {err}", self.path.display());
                    return None;
                }
            };

            match &existing {
                Some(metadata) => self.written = metadata.len(),
                None => self.written = 0,
            }
            if let Some(Rotation::ByTime(period)) = self.rotation {
                if self.last_block.is_none() {
                    let mtime = existing
                        .as_ref()
                        .and_then(|metadata| metadata.modified().ok())
                        .and_then(|mtime| Zoned::try_from(mtime).ok());
                    let seed = match &mtime {
                        Some(mtime) => time_block(mtime, period),
                        None => time_block(now, period),
                    };
                    self.last_block = Some(seed);
                }
            }
            self.file = Some(file);
        }
        self.file.as_mut()
    }

    /// Close, rename to `<name>-<suffix>`, hand the renamed file to the
    /// compression worker, and create a fresh file under the original name.
    fn rotate(&mut self, suffix: &str, compress: Option<&CompressWorker>) {
        self.close();

        let rotated = self.dir.join(format!("{}-{suffix}", self.filename));
        if let Err(err) = fs::rename(&self.path, &rotated) {
            eprintln!("failed to rename {}: {err}", self.path.display());
            return;
        }
        if let Some(compress) = compress {
            // blocks while the compression queue is full; rotation stalls
            // rather than dropping an archive job
            compress.submit(rotated);
        }

        self.written = 0;
        match OpenOptions::new().append(true).create(true).open(&self.path) {
            Ok(file) => self.file = Some(file),
            Err(err) => {
                // the next write goes through open() and retries
                eprintln!("failed to create log file {}: {err}", self.path.display());
            }
        }
    }

    /// Sequence suffix for the next size-mode rotation: one more than the
    /// number of rotations already produced for this base name.
    ///
    /// Counts finished archives and rotated files the compression worker has
    /// not drained yet; otherwise two rotations in quick succession would
    /// reuse a sequence number and the rename would clobber the pending,
    /// still-uncompressed file.
    fn next_sequence(&self) -> Option<u64> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                eprintln!("failed to read log dir {}: {err}", self.dir.display());
                return None;
            }
        };

        let prefix = format!("{}-", self.filename);
        let suffix = format!(".{ARCHIVE_SUFFIX}");
        let rotated = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                let Some(rest) = name.strip_prefix(&prefix) else {
                    return false;
                };
                let rest = rest.strip_suffix(&suffix).unwrap_or(rest);
                !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
            })
            .count() as u64;
        Some(rotated + 1)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_time_block_truncates_to_period_boundary() {
        let time = Zoned::from_str("2024-08-11T16:56:23[UTC]").unwrap();
        let block = time_block(&time, Duration::from_secs(300));
        assert_eq!(block, "20240811165500");
    }

    #[test]
    fn test_time_block_stable_within_period() {
        let period = Duration::from_secs(60);
        let a = Zoned::from_str("2024-08-11T16:56:01[UTC]").unwrap();
        let b = Zoned::from_str("2024-08-11T16:56:59[UTC]").unwrap();
        let c = Zoned::from_str("2024-08-11T16:57:00[UTC]").unwrap();
        assert_eq!(time_block(&a, period), time_block(&b, period));
        assert_ne!(time_block(&b, period), time_block(&c, period));
    }

    #[test]
    fn test_size_rotation_is_strictly_greater_than() {
        let temp_dir = TempDir::new().unwrap();
        let mut active = ActiveFile::new(
            temp_dir.path().to_path_buf(),
            "app.log".to_string(),
            Some(Rotation::BySize(1024)),
        );

        // exactly at the threshold: no rotation
        active.append(&"x".repeat(1024), None);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);

        // one byte over: rotation happens on the write that crosses it
        active.append("y", None);
        let rotated = temp_dir.path().join("app.log-1");
        assert!(rotated.exists());
        assert_eq!(fs::read(&rotated).unwrap().len(), 1025);

        // a fresh, empty active file exists before the next record lands
        let current = temp_dir.path().join("app.log");
        assert_eq!(fs::metadata(&current).unwrap().len(), 0);

        active.append("z", None);
        assert_eq!(fs::read(&current).unwrap(), b"z");
    }

    #[test]
    fn test_preexisting_file_is_appended_not_truncated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "left over\n").unwrap();

        let mut active =
            ActiveFile::new(temp_dir.path().to_path_buf(), "app.log".to_string(), None);
        active.append("fresh\n", None);
        active.close();

        assert_eq!(fs::read(&path).unwrap(), b"left over\nfresh\n");
    }

    #[test]
    fn test_preexisting_size_seeds_the_counter() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "x".repeat(1000)).unwrap();

        let mut active = ActiveFile::new(
            temp_dir.path().to_path_buf(),
            "app.log".to_string(),
            Some(Rotation::BySize(1024)),
        );

        // 1000 seeded + 25 written pushes past 1024 and rotates immediately
        active.append(&"y".repeat(25), None);
        assert!(temp_dir.path().join("app.log-1").exists());
    }

    #[test]
    fn test_sequence_counts_existing_archives() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.log-1.gz"), b"").unwrap();
        fs::write(temp_dir.path().join("app.log-2.gz"), b"").unwrap();
        fs::write(temp_dir.path().join("unrelated.gz"), b"").unwrap();
        fs::write(temp_dir.path().join("app.log-backup"), b"").unwrap();

        let active = ActiveFile::new(
            temp_dir.path().to_path_buf(),
            "app.log".to_string(),
            Some(Rotation::BySize(1024)),
        );
        assert_eq!(active.next_sequence(), Some(3));
    }

    #[test]
    fn test_sequence_counts_rotations_awaiting_compression() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.log-1.gz"), b"").unwrap();
        fs::write(temp_dir.path().join("app.log-2"), b"").unwrap();

        let active = ActiveFile::new(
            temp_dir.path().to_path_buf(),
            "app.log".to_string(),
            Some(Rotation::BySize(1024)),
        );
        assert_eq!(active.next_sequence(), Some(3));
    }

    #[test]
    fn test_back_to_back_rotations_never_overwrite_a_pending_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut active = ActiveFile::new(
            temp_dir.path().to_path_buf(),
            "app.log".to_string(),
            Some(Rotation::BySize(10)),
        );

        // no compression worker, so rotated files sit uncompressed exactly
        // as they do while the worker lags behind
        active.append(&"a".repeat(11), None);
        active.append(&"b".repeat(11), None);
        active.close();

        assert_eq!(
            fs::read(temp_dir.path().join("app.log-1")).unwrap(),
            "a".repeat(11).as_bytes()
        );
        assert_eq!(
            fs::read(temp_dir.path().join("app.log-2")).unwrap(),
            "b".repeat(11).as_bytes()
        );
    }
}
