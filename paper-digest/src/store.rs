use crate::types::{AggregatorError, Corpus, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a loaded corpus came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusOrigin {
    /// No corpus file exists yet.
    Missing,
    /// The file was read and parsed.
    Loaded,
    /// The file could not be read or parsed; an empty corpus stands in.
    /// `quarantined` is where a copy of the bad file was kept, if any.
    Unreadable {
        reason: String,
        quarantined: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub corpus: Corpus,
    pub origin: CorpusOrigin,
}

/// The persisted corpus file (a JSON array of paper records).
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the corpus. Never fails: a missing, unreadable or corrupt file
    /// yields an empty corpus, which the reconciler treats as a first run.
    pub fn load(&self) -> LoadedCorpus {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No corpus at {}, starting fresh", self.path.display());
                return LoadedCorpus {
                    corpus: Corpus::new(),
                    origin: CorpusOrigin::Missing,
                };
            }
            Err(e) => {
                warn!("Cannot read corpus {}: {}; treating as empty", self.path.display(), e);
                return LoadedCorpus {
                    corpus: Corpus::new(),
                    origin: CorpusOrigin::Unreadable {
                        reason: e.to_string(),
                        quarantined: None,
                    },
                };
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Corpus file {} is blank", self.path.display());
            return LoadedCorpus {
                corpus: Corpus::new(),
                origin: CorpusOrigin::Loaded,
            };
        }

        match serde_json::from_slice::<Corpus>(&bytes) {
            Ok(corpus) => {
                info!("Loaded {} records from {}", corpus.len(), self.path.display());
                LoadedCorpus {
                    corpus,
                    origin: CorpusOrigin::Loaded,
                }
            }
            Err(e) => {
                let quarantined = self.quarantine();
                warn!(
                    "Corpus {} is corrupt ({}); treating as empty, copy kept at {:?}",
                    self.path.display(),
                    e,
                    quarantined
                );
                LoadedCorpus {
                    corpus: Corpus::new(),
                    origin: CorpusOrigin::Unreadable {
                        reason: e.to_string(),
                        quarantined,
                    },
                }
            }
        }
    }

    /// Overwrite the corpus file with `corpus`.
    pub fn save(&self, corpus: &Corpus) -> Result<()> {
        write_json_atomic(&self.path, corpus)?;
        info!("Saved {} records to {}", corpus.len(), self.path.display());
        Ok(())
    }

    fn quarantine(&self) -> Option<PathBuf> {
        let target = sibling(&self.path, "corrupt");
        match fs::copy(&self.path, &target) {
            Ok(_) => Some(target),
            Err(e) => {
                warn!("Could not keep a copy of corrupt corpus: {}", e);
                None
            }
        }
    }
}

/// Serialize `value` as pretty JSON and replace `path` with it: the data is
/// written to a temporary sibling and renamed over the target.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json)
}

pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let storage_err = |source: io::Error| AggregatorError::Storage {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(storage_err)?;
    }

    let tmp = sibling(path, "tmp");
    let mut file = fs::File::create(&tmp).map_err(storage_err)?;
    file.write_all(data).map_err(storage_err)?;
    file.sync_all().map_err(storage_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        storage_err(e)
    })
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
