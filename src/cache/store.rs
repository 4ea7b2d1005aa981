//! Compile-or-load cache store
//!
//! Resolves a model's fingerprint to an entry file under the cache root,
//! returns the stored artifact on a hit and compiles on a miss.

use crate::cache::entry::{self, EntryHeader, Lookup};
use crate::cache::lock::KeyedLocks;
use crate::cache::template::NamingTemplate;
use crate::compiler::{ModelCompiler, DEFAULT_MODEL_NAME};
use crate::error::{StanCacheError, StanCacheResult};
use crate::fingerprint::Fingerprint;
use crate::options::CompileOptions;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration as a human-readable string (e.g., "2 minutes")
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 1 {
        return "a moment".to_string();
    }
    let (value, unit) = if secs >= 3600 {
        (secs / 3600, "hour")
    } else if secs >= 60 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if value == 1 {
        format!("a {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

/// Parameters of a single compile-or-load request
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Entry file name template; `model-{digest}.bin` when unset
    pub cache_file_name: Option<String>,
    /// Skip the lookup and always compile
    pub recompile: bool,
    /// Logical model name passed to the compiler
    pub model_name: Option<String>,
    /// Options forwarded to the compiler and folded into the fingerprint
    pub options: CompileOptions,
}

impl BuildRequest {
    /// Create a request with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry file name template
    pub fn cache_file_name(mut self, template: impl Into<String>) -> Self {
        self.cache_file_name = Some(template.into());
        self
    }

    /// Force recompilation
    pub fn recompile(mut self, recompile: bool) -> Self {
        self.recompile = recompile;
        self
    }

    /// Set the logical model name
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    /// Set the compile options
    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    fn template(&self) -> StanCacheResult<NamingTemplate> {
        match &self.cache_file_name {
            Some(t) => NamingTemplate::parse(t),
            None => Ok(NamingTemplate::default()),
        }
    }
}

/// Result of [`CacheStore::get_or_create`]
#[derive(Debug, Clone)]
pub struct Cached<A> {
    /// The compiled artifact
    pub artifact: A,
    /// Whether the artifact was compiled by this call
    pub created: bool,
    /// Entry file holding the artifact
    pub path: PathBuf,
    /// Fingerprint of the source and options
    pub fingerprint: Fingerprint,
}

/// A file found in the cache directory
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Path of the entry file
    pub path: PathBuf,
    /// File size in bytes
    pub size_bytes: u64,
    /// Header, or why it could not be read
    pub header: Result<EntryHeader, String>,
}

impl EntryInfo {
    /// When the entry was written, if the header is readable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.header.as_ref().ok().map(|h| h.created_at)
    }
}

/// Persistent store of compiled models keyed by fingerprint
pub struct CacheStore<C> {
    root: PathBuf,
    compiler: C,
    locks: KeyedLocks,
}

impl<C: ModelCompiler> CacheStore<C> {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>, compiler: C) -> StanCacheResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            StanCacheError::io(format!("creating cache directory {}", root.display()), e)
        })?;
        debug!("Opened model cache at {}", root.display());

        Ok(Self {
            root,
            compiler,
            locks: KeyedLocks::new(),
        })
    }

    /// Open a store at the per-user default location
    pub fn open_default(compiler: C) -> StanCacheResult<Self> {
        Self::open(default_cache_dir()?, compiler)
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The compiler used on cache misses
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Resolve the fingerprint and entry path for a request without compiling
    pub fn entry_path(
        &self,
        source: &str,
        request: &BuildRequest,
    ) -> StanCacheResult<(Fingerprint, PathBuf)> {
        let template = request.template()?;
        let fingerprint = Fingerprint::compute(source, &request.options);
        let relative = template.render(&fingerprint, request.model_name.as_deref())?;
        Ok((fingerprint, self.root.join(relative)))
    }

    /// Return the cached artifact for `source`, compiling it on a miss
    ///
    /// Unreadable or corrupt entries are logged and rebuilt. Compiler errors
    /// and write failures are returned to the caller, and nothing is cached
    /// for a failed compile.
    pub fn get_or_create(
        &self,
        source: &str,
        request: &BuildRequest,
    ) -> StanCacheResult<Cached<C::Artifact>> {
        let (fingerprint, path) = self.entry_path(source, request)?;

        self.with_entry_lock(&path, || {
            self.lookup_or_compile(source, request, fingerprint, path.clone())
        })
    }

    fn lookup_or_compile(
        &self,
        source: &str,
        request: &BuildRequest,
        fingerprint: Fingerprint,
        path: PathBuf,
    ) -> StanCacheResult<Cached<C::Artifact>> {
        let model_name = request.model_name.as_deref();

        if request.recompile {
            debug!("Recompiling {} (forced)", path.display());
        } else {
            match entry::read_entry::<C::Artifact>(&path) {
                Lookup::Found(artifact) => {
                    debug!("Using cached model '{}'", path.display());
                    return Ok(Cached {
                        artifact,
                        created: false,
                        path,
                        fingerprint,
                    });
                }
                Lookup::NotFound => {
                    debug!("No cached model for {}", fingerprint.short());
                }
                Lookup::Corrupt(reason) => {
                    warn!(
                        "Problems loading cached model {}: {}. Recompiling.",
                        path.display(),
                        reason
                    );
                }
            }
        }

        let artifact =
            self.store_compiled(source, model_name, &path, &fingerprint, &request.options)?;

        Ok(Cached {
            artifact,
            created: true,
            path,
            fingerprint,
        })
    }

    /// Compile `source` and write the artifact to `entry_path`
    ///
    /// This is the only way entries are written. The fingerprint stamped in
    /// the entry header is computed from `source` and `options`.
    pub fn compile_and_store(
        &self,
        source: &str,
        model_name: Option<&str>,
        entry_path: &Path,
        options: &CompileOptions,
    ) -> StanCacheResult<C::Artifact> {
        let fingerprint = Fingerprint::compute(source, options);
        self.with_entry_lock(entry_path, || {
            self.store_compiled(source, model_name, entry_path, &fingerprint, options)
        })
    }

    /// Run `f` while holding the lock for `path`, then forget the lock if
    /// no other caller is waiting on it
    fn with_entry_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.locks.handle(path);
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.locks.release(path);
        result
    }

    fn store_compiled(
        &self,
        source: &str,
        model_name: Option<&str>,
        entry_path: &Path,
        fingerprint: &Fingerprint,
        options: &CompileOptions,
    ) -> StanCacheResult<C::Artifact> {
        let model_name = model_name.unwrap_or(DEFAULT_MODEL_NAME);

        info!("Compiling model '{}' ({})", model_name, fingerprint.short());
        let start = Instant::now();
        let artifact = self
            .compiler
            .compile(source, model_name, options)
            .map_err(StanCacheError::compile)?;
        let elapsed = start.elapsed();

        entry::write_entry(entry_path, EntryHeader::new(fingerprint, model_name), &artifact)?;

        info!(
            "Stored model '{}' at {} ({} compilation time)",
            model_name,
            entry_path.display(),
            format_duration(elapsed)
        );
        Ok(artifact)
    }

    /// Remove every entry, leaving an empty cache directory
    pub fn clear(&self) -> StanCacheResult<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StanCacheError::io(
                    format!("removing cache directory {}", self.root.display()),
                    e,
                ))
            }
        }
        fs::create_dir_all(&self.root).map_err(|e| {
            StanCacheError::io(format!("creating cache directory {}", self.root.display()), e)
        })?;
        self.locks.prune();

        info!("Cleared model cache at {}", self.root.display());
        Ok(())
    }

    /// List entry files under the cache directory, sorted by path
    pub fn entries(&self) -> StanCacheResult<Vec<EntryInfo>> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let read_dir = match fs::read_dir(&dir) {
                Ok(rd) => rd,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StanCacheError::io(
                        format!("reading cache directory {}", dir.display()),
                        e,
                    ))
                }
            };

            for item in read_dir {
                let item = item.map_err(|e| StanCacheError::io("reading cache entry", e))?;
                let path = item.path();
                let file_type = item
                    .file_type()
                    .map_err(|e| StanCacheError::io(format!("inspecting {}", path.display()), e))?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                // In-flight writes from write_entry
                if item.file_name().to_string_lossy().starts_with(".stancache-") {
                    continue;
                }

                let size_bytes = item.metadata().map(|m| m.len()).unwrap_or(0);
                found.push(EntryInfo {
                    header: entry::read_header(&path),
                    path,
                    size_bytes,
                });
            }
        }

        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

/// Per-user default cache directory (`~/.cache/stan` on Linux)
pub fn default_cache_dir() -> StanCacheResult<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join("stan"))
        .ok_or(StanCacheError::CacheDirUnavailable)
}
