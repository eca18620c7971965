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

//! The asynchronous log writer.

use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::bounded;

use crate::Config;
use crate::Layout;
use crate::Level;
use crate::Record;
use crate::compress::CompressWorker;
use crate::config::ConfigError;
use crate::layout::TextLayout;
use crate::rotation::ActiveFile;

/// Configuration fields that are mutable at runtime.
///
/// All setters and the per-emission reads share one reader/writer lock:
/// concurrent reads on the hot path, serialized last-writer-wins updates.
struct Mutable {
    level: Level,
    short_path: bool,
    console: bool,
    color: bool,
    layout: Option<Box<dyn Layout>>,
}

struct Shared {
    closed: AtomicBool,
    mutable: RwLock<Mutable>,
    // written to by the consumer thread only; a Mutex rather than the RwLock
    // above because writing needs exclusive access anyway
    sink: Mutex<Option<Box<dyn Write + Send>>>,
    text_layout: TextLayout,
}

/// An asynchronous, leveled log writer.
///
/// Emission is fire-and-forget: the call site filters on level, renders the
/// record to a line, and enqueues it on a bounded queue, blocking only when
/// the queue is full. A single consumer thread drains the queue in FIFO order
/// and fans each line out to console, an optional sink, and an optional
/// rotating file. Rotated-out files are compressed by a second background
/// thread.
///
/// Level, path shortening, console echo, color, layout, and the secondary
/// sink can all change at runtime through the `set_*` methods. The file
/// target is fixed at construction: the consumer thread owns the file state
/// exclusively, so changing the directory or filename means building a new
/// logger.
///
/// Multiple independent instances are first-class; see
/// [`default_logger`](crate::default_logger) for the process-wide
/// convenience instance.
///
/// ```
/// use logroll::Config;
/// use logroll::Level;
///
/// let logger = Config::new().level(Level::Info).build().unwrap();
/// logroll::info!(logger, "listening on {}", "0.0.0.0:8080");
/// logger.shutdown(); // blocks until every queued line is written
/// ```
pub struct Logger {
    shared: Arc<Shared>,
    sender: Mutex<Option<Sender<String>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl Logger {
    /// Build a logger from `config`; see [`Config::build`].
    pub(crate) fn with_config(config: Config) -> Result<Logger, ConfigError> {
        let rotation = config.rotation()?;
        let active = match (config.dir, config.filename) {
            (Some(dir), Some(filename)) => Some(ActiveFile::new(dir, filename, rotation)),
            _ => None,
        };
        // archival never runs without a rotation mode
        let compress = rotation.and(active.as_ref()).map(|_| CompressWorker::spawn());

        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            mutable: RwLock::new(Mutable {
                level: config.level,
                short_path: config.short_path,
                console: config.console,
                color: config.color,
                layout: config.layout,
            }),
            sink: Mutex::new(config.sink),
            text_layout: TextLayout::default(),
        });

        let (sender, receiver) = bounded(config.queue_capacity);
        let consumer = {
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name("logroll-writer".to_string())
                .spawn(move || consume(receiver, shared, active, compress))
                .expect("failed to spawn the log writer thread")
        };

        Ok(Logger {
            shared,
            sender: Mutex::new(Some(sender)),
            consumer: Mutex::new(Some(consumer)),
        })
    }

    /// Emit a record at `level`, attributed to the caller's file and line.
    ///
    /// Returns without effect when the record is filtered out or shutdown has
    /// begun; otherwise renders the record and blocks until the record queue
    /// has a free slot.
    #[track_caller]
    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }

        let line = {
            let mutable = read_lock(&self.shared.mutable);
            if level < mutable.level {
                return;
            }
            let location = Location::caller();
            let record = Record::new(level, location.file(), location.line(), args.to_string());
            match &mutable.layout {
                Some(layout) => layout.format(&record),
                None => self
                    .shared
                    .text_layout
                    .render(&record, mutable.color, mutable.short_path),
            }
        };

        // clone out of the lock so a full queue blocks only this producer
        let sender = lock(&self.sender).clone();
        if let Some(sender) = sender {
            let _ = sender.send(line);
        }
    }

    /// Emit a trace record.
    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Trace, args);
    }

    /// Emit a debug record.
    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    /// Emit an info record.
    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    /// Emit a warn record.
    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    /// Emit an error record.
    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    /// Set the minimum emission level.
    pub fn set_level(&self, level: Level) {
        write_lock(&self.shared.mutable).level = level;
    }

    /// Toggle shortening call-site paths to their final segment.
    pub fn set_short_path(&self, short_path: bool) {
        write_lock(&self.shared.mutable).short_path = short_path;
    }

    /// Toggle echoing lines to stdout.
    pub fn set_console(&self, console: bool) {
        write_lock(&self.shared.mutable).console = console;
    }

    /// Toggle ANSI color in the built-in layout.
    pub fn set_color(&self, color: bool) {
        write_lock(&self.shared.mutable).color = color;
    }

    /// Replace the layout. Subsequent records render through `layout`
    /// instead of the built-in text layout.
    pub fn set_layout(&self, layout: impl Layout) {
        write_lock(&self.shared.mutable).layout = Some(Box::new(layout));
    }

    /// Replace the secondary sink.
    pub fn set_sink(&self, sink: impl Write + Send + 'static) {
        *lock(&self.shared.sink) = Some(Box::new(sink));
    }

    /// Stop accepting records and block until both background threads have
    /// drained: every line queued before this call reaches its destinations,
    /// and every rotated file handed to the compression worker is archived.
    ///
    /// Records submitted once shutdown has begun are cleanly rejected.
    /// Calling `shutdown` again is a no-op. Dropping the logger shuts it
    /// down as well.
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::Release);

        // dropping the sender disconnects the queue, which is the sole
        // shutdown signal the consumer observes
        drop(lock(&self.sender).take());

        let consumer = lock(&self.consumer).take();
        if let Some(consumer) = consumer {
            let _ = consumer.join();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("closed", &self.shared.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// The single draining loop. Terminates when the queue is disconnected and
/// empty, then shuts the compression worker down in turn.
fn consume(
    receiver: Receiver<String>,
    shared: Arc<Shared>,
    mut active: Option<ActiveFile>,
    compress: Option<CompressWorker>,
) {
    while let Ok(line) = receiver.recv() {
        let console = read_lock(&shared.mutable).console;
        if console {
            let _ = std::io::stdout().write_all(line.as_bytes());
        }

        if let Some(sink) = lock(&shared.sink).as_mut() {
            // sink failures must never block delivery to disk or console
            let _ = sink.write_all(line.as_bytes());
        }

        if let Some(active) = active.as_mut() {
            active.append(&line, compress.as_ref());
        }
    }

    if let Some(active) = active.as_mut() {
        active.close();
    }
    if let Some(compress) = compress {
        compress.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lock<T>(rwlock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    rwlock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(rwlock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}
