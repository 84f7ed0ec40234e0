//! Boot workload attached to a board.
//!
//! Image loading and download belong to an external loader; the board only stores an
//! immutable description of what to boot. Parameters are an opaque string-keyed
//! mapping forwarded to the boot environment. Three keys are recognized and checked:
//!
//! | key | type | meaning |
//! |---|---|---|
//! | `readfile_contents` | string | shell command run after boot |
//! | `kernel_args` | array of strings | kernel command line |
//! | `checkpoint` | string | checkpoint directory to restore from |
//!
//! Every other key is passed through untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::common::ConfigError;

/// Parameter key holding the post-boot command.
pub const KEY_READFILE: &str = "readfile_contents";
/// Parameter key holding the kernel command line.
pub const KEY_KERNEL_ARGS: &str = "kernel_args";
/// Parameter key holding a checkpoint directory.
pub const KEY_CHECKPOINT: &str = "checkpoint";

const RECOGNIZED: [&str; 3] = [KEY_READFILE, KEY_KERNEL_ARGS, KEY_CHECKPOINT];

/// Reference to a bootable image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
    /// A file on the host.
    Path(PathBuf),
    /// A content-addressed resource resolved by the loader.
    Id {
        /// Resource identifier.
        name: String,
        /// Resource version; latest when absent.
        #[serde(default)]
        version: Option<String>,
    },
}

impl ResourceRef {
    /// Content-addressed reference without a pinned version.
    pub fn id(name: impl Into<String>) -> Self {
        Self::Id {
            name: name.into(),
            version: None,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Id {
                name,
                version: Some(v),
            } => write!(f, "{name}@{v}"),
            Self::Id {
                name,
                version: None,
            } => f.write_str(name),
        }
    }
}

/// String-keyed workload parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct WorkloadParameters(BTreeMap<String, Value>);

impl WorkloadParameters {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Value of `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Every entry, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries this crate does not interpret, in key order.
    pub fn passthrough(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.iter().filter(|(k, _)| !RECOGNIZED.contains(k))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn check(&self) -> Result<(), ConfigError> {
        let bad = |key: &str, detail: &str| ConfigError::WorkloadParameter {
            key: key.to_string(),
            detail: detail.to_string(),
        };
        if let Some(v) = self.get(KEY_READFILE) {
            if !v.is_string() {
                return Err(bad(KEY_READFILE, "must be a string"));
            }
        }
        if let Some(v) = self.get(KEY_KERNEL_ARGS) {
            let ok = v
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !ok {
                return Err(bad(KEY_KERNEL_ARGS, "must be an array of strings"));
            }
        }
        if let Some(v) = self.get(KEY_CHECKPOINT) {
            if !v.is_string() {
                return Err(bad(KEY_CHECKPOINT, "must be a path string"));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for WorkloadParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Immutable description of what a board boots.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    name: String,
    boot_image: ResourceRef,
    kernel: Option<ResourceRef>,
    parameters: WorkloadParameters,
}

impl Workload {
    /// Creates a workload booting `boot_image`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WorkloadParameter` if a recognized key has the wrong type.
    pub fn new(
        name: impl Into<String>,
        boot_image: ResourceRef,
        parameters: WorkloadParameters,
    ) -> Result<Self, ConfigError> {
        parameters.check()?;
        Ok(Self {
            name: name.into(),
            boot_image,
            kernel: None,
            parameters,
        })
    }

    /// Kernel-plus-disk workload with an optional post-boot command, kernel
    /// arguments, and checkpoint to restore.
    pub fn kernel_disk(
        kernel: ResourceRef,
        disk_image: ResourceRef,
        command: Option<&str>,
        kernel_args: &[&str],
        checkpoint: Option<&Path>,
    ) -> Self {
        let mut parameters = WorkloadParameters::new();
        if let Some(cmd) = command {
            let _ = parameters.insert(KEY_READFILE, cmd);
        }
        if !kernel_args.is_empty() {
            let _ = parameters.insert(KEY_KERNEL_ARGS, kernel_args.to_vec());
        }
        if let Some(dir) = checkpoint {
            let _ = parameters.insert(KEY_CHECKPOINT, dir.display().to_string());
        }
        Self {
            name: "kernel_disk_workload".to_string(),
            boot_image: disk_image,
            kernel: Some(kernel),
            parameters,
        }
    }

    /// Workload name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Disk or full-system image to boot.
    pub const fn boot_image(&self) -> &ResourceRef {
        &self.boot_image
    }

    /// Separate kernel image, if any.
    pub const fn kernel(&self) -> Option<&ResourceRef> {
        self.kernel.as_ref()
    }

    /// Shell command run once the guest has booted.
    pub fn command(&self) -> Option<&str> {
        self.parameters.get(KEY_READFILE).and_then(Value::as_str)
    }

    /// Kernel command-line arguments.
    pub fn kernel_args(&self) -> Vec<&str> {
        self.parameters
            .get(KEY_KERNEL_ARGS)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Checkpoint directory to restore from.
    pub fn checkpoint(&self) -> Option<&Path> {
        self.parameters
            .get(KEY_CHECKPOINT)
            .and_then(Value::as_str)
            .map(Path::new)
    }

    /// All parameters, recognized or not.
    pub const fn parameters(&self) -> &WorkloadParameters {
        &self.parameters
    }
}
