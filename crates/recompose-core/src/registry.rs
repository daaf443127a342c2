//! Static table of `docker run` flags and where each one lands in a
//! compose service.
//!
//! Target paths are dotted templates. Plain segments resolve against the
//! service being built; a `^segment` resolves against the document root;
//! `$service` stands for the active service; a trailing `$var` means the
//! value itself becomes a list entry or a keyed map entry. An empty target
//! marks a flag that is recognized but has no compose counterpart.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

/// How a flag's value is parsed and what kind of node it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Free-form string, emitted verbatim.
    Scalar,
    /// `true`/`false`; the value may be omitted on the command line.
    Boolean,
    /// Floating point number, emitted verbatim after validation.
    Float,
    /// Signed integer, emitted verbatim after validation.
    Integer,
    /// Go-style duration such as `1m30s`; bare integers mean seconds.
    Duration,
    /// Each occurrence appends one list entry.
    StringList,
    /// Each occurrence adds one `key=value` map entry.
    StringMap,
    /// `--mount` specification, appended as a structured list entry.
    MountSpec,
    /// `name=soft:hard` resource limit, keyed by name.
    LimitPairMap,
    /// Path to a file, appended as a list entry.
    FileRef,
}

/// Structural kind of the node a `$var` segment writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Ordered list; values are appended.
    Sequence,
    /// Keyed map; values are inserted by key.
    Mapping,
}

impl ValueKind {
    /// Returns `true` for kinds that write into a list or map rather than a
    /// single scalar.
    pub const fn is_collection(self) -> bool {
        matches!(
            self,
            Self::StringList | Self::StringMap | Self::MountSpec | Self::LimitPairMap | Self::FileRef
        )
    }

    /// Snake-case name, as used in serialized output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Duration => "duration",
            Self::StringList => "string_list",
            Self::StringMap => "string_map",
            Self::MountSpec => "mount_spec",
            Self::LimitPairMap => "limit_pair_map",
            Self::FileRef => "file_ref",
        }
    }

    /// Collection created for a `$var` segment of this kind.
    pub const fn collection(self) -> Collection {
        match self {
            Self::StringMap | Self::LimitPairMap => Collection::Mapping,
            _ => Collection::Sequence,
        }
    }
}

/// Descriptor of a concrete flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDescriptor {
    /// Value kind.
    pub kind: ValueKind,
    /// Target path template; empty when the flag has no compose counterpart.
    pub target: &'static str,
}

impl FlagDescriptor {
    /// Returns `true` if the flag is recognized but produces no output.
    pub const fn is_unsupported(&self) -> bool {
        self.target.is_empty()
    }
}

/// A registry entry: a concrete flag or a shorthand deferring to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Flag(FlagDescriptor),
    Alias(&'static str),
}

const fn flag(kind: ValueKind, target: &'static str) -> Entry {
    Entry::Flag(FlagDescriptor { kind, target })
}

const fn alias(of: &'static str) -> Entry {
    Entry::Alias(of)
}

use ValueKind::{
    Boolean, Duration, FileRef, Float, Integer, LimitPairMap, MountSpec, Scalar, StringList,
    StringMap,
};

/// Compose mapping for every supported flag.
///
/// See <https://github.com/compose-spec/compose-spec/blob/master/spec.md>.
const FLAGS: &[(&str, Entry)] = &[
    ("a", alias("attach")),
    ("add-host", flag(StringList, "extra_hosts.$var")),
    ("annotation", flag(StringMap, "annotations.$var")),
    ("attach", flag(StringList, "")),
    ("blkio-weight", flag(Integer, "blkio_config.weight")),
    ("blkio-weight-device", flag(StringList, "blkio_config.weight_device.$var")),
    ("c", alias("cpu-shares")),
    ("cap-add", flag(StringList, "cap_add.$var")),
    ("cap-drop", flag(StringList, "cap_drop.$var")),
    ("cgroup-parent", flag(Scalar, "cgroup_parent")),
    ("cgroupns", flag(Scalar, "cgroup")),
    ("cidfile", flag(Scalar, "")),
    ("cpu-count", flag(Integer, "cpu_count")),
    ("cpu-percent", flag(Integer, "cpu_percent")),
    ("cpu-period", flag(Integer, "cpu_period")),
    ("cpu-quota", flag(Integer, "cpu_quota")),
    ("cpu-rt-period", flag(Integer, "cpu_rt_period")),
    ("cpu-rt-runtime", flag(Integer, "cpu_rt_runtime")),
    ("cpu-shares", flag(Integer, "cpu_shares")),
    ("cpus", flag(Float, "deploy.resources.limits.cpus")),
    ("cpuset-cpus", flag(Scalar, "cpuset")),
    ("cpuset-mems", flag(Scalar, "cpuset_mems")),
    ("d", alias("detach")),
    ("detach", flag(Boolean, "")),
    ("detach-keys", flag(Scalar, "")),
    ("device", flag(StringList, "devices.$var")),
    ("device-cgroup-rule", flag(StringList, "device_cgroup_rules.$var")),
    ("device-read-bps", flag(StringList, "blkio_config.device_read_bps.$var")),
    ("device-read-iops", flag(StringList, "blkio_config.device_read_iops.$var")),
    ("device-write-bps", flag(StringList, "blkio_config.device_write_bps.$var")),
    ("device-write-iops", flag(StringList, "blkio_config.device_write_iops.$var")),
    ("disable-content-trust", flag(Boolean, "")),
    ("dns", flag(StringList, "dns.$var")),
    ("dns-option", flag(StringList, "dns_opt.$var")),
    ("dns-search", flag(StringList, "dns_search.$var")),
    ("domainname", flag(Scalar, "domainname")),
    ("e", alias("env")),
    ("entrypoint", flag(Scalar, "entrypoint")),
    ("env", flag(StringMap, "environment.$var")),
    ("env-file", flag(FileRef, "env_file.$var")),
    ("expose", flag(StringList, "expose.$var")),
    ("gpus", flag(Scalar, "")),
    ("group-add", flag(StringList, "group_add.$var")),
    ("h", alias("hostname")),
    ("health-cmd", flag(Scalar, "healthcheck.test")),
    ("health-interval", flag(Duration, "healthcheck.interval")),
    ("health-retries", flag(Integer, "healthcheck.retries")),
    ("health-start-interval", flag(Duration, "healthcheck.start_interval")),
    ("health-start-period", flag(Duration, "healthcheck.start_period")),
    ("health-timeout", flag(Duration, "healthcheck.timeout")),
    ("hostname", flag(Scalar, "hostname")),
    ("i", alias("interactive")),
    ("init", flag(Boolean, "init")),
    ("interactive", flag(Boolean, "stdin_open")),
    ("ip", flag(Scalar, "networks.default.ipv4_address")),
    ("ip6", flag(Scalar, "networks.default.ipv6_address")),
    ("ipc", flag(Scalar, "ipc")),
    ("isolation", flag(Scalar, "isolation")),
    ("kernel-memory", flag(Scalar, "")),
    ("l", alias("label")),
    ("label", flag(StringList, "labels.$var")),
    ("label-file", flag(FileRef, "label_file.$var")),
    ("link", flag(StringList, "links.$var")),
    ("link-local-ip", flag(StringList, "networks.default.link_local_ips.$var")),
    ("log-driver", flag(Scalar, "logging.driver")),
    ("log-opt", flag(StringMap, "logging.options.$var")),
    ("m", alias("memory")),
    ("mac-address", flag(Scalar, "mac_address")),
    ("memory", flag(Scalar, "deploy.resources.limits.memory")),
    ("memory-reservation", flag(Scalar, "deploy.resources.reservations.memory")),
    ("memory-swap", flag(Scalar, "memswap_limit")),
    ("memory-swappiness", flag(Integer, "mem_swappiness")),
    ("mount", flag(MountSpec, "volumes.$var")),
    ("name", flag(Scalar, "container_name")),
    ("net", alias("network")),
    ("net-alias", alias("network-alias")),
    ("network", flag(Scalar, "network_mode")),
    ("network-alias", flag(StringList, "networks.default.aliases.$var")),
    ("no-healthcheck", flag(Boolean, "healthcheck.disable")),
    ("oom-kill-disable", flag(Boolean, "oom_kill_disable")),
    ("oom-score-adj", flag(Integer, "oom_score_adj")),
    ("p", alias("publish")),
    ("pid", flag(Scalar, "pid")),
    ("pids-limit", flag(Integer, "pids_limit")),
    ("platform", flag(Scalar, "platform")),
    ("privileged", flag(Boolean, "privileged")),
    ("publish", flag(StringList, "ports.$var")),
    ("publish-all", flag(Boolean, "")),
    ("P", alias("publish-all")),
    ("pull", flag(Scalar, "pull_policy")),
    ("q", alias("quiet")),
    ("quiet", flag(Boolean, "")),
    ("read-only", flag(Boolean, "read_only")),
    ("restart", flag(Scalar, "restart")),
    ("rm", flag(Boolean, "")),
    ("runtime", flag(Scalar, "runtime")),
    ("security-opt", flag(StringList, "security_opt.$var")),
    ("shm-size", flag(Scalar, "shm_size")),
    ("sig-proxy", flag(Boolean, "")),
    ("stop-signal", flag(Scalar, "stop_signal")),
    ("stop-timeout", flag(Duration, "stop_grace_period")),
    ("storage-opt", flag(StringMap, "storage_opt.$var")),
    ("sysctl", flag(StringMap, "sysctls.$var")),
    ("t", alias("tty")),
    ("tmpfs", flag(StringList, "tmpfs.$var")),
    ("tty", flag(Boolean, "tty")),
    ("u", alias("user")),
    ("ulimit", flag(LimitPairMap, "ulimits.$var")),
    ("user", flag(Scalar, "user")),
    ("userns", flag(Scalar, "userns_mode")),
    ("uts", flag(Scalar, "uts")),
    ("v", alias("volume")),
    ("volume", flag(StringList, "volumes.$var")),
    ("volume-driver", flag(Scalar, "")),
    ("volumes-from", flag(StringList, "volumes_from.$var")),
    ("w", alias("workdir")),
    ("workdir", flag(Scalar, "working_dir")),
];

static REGISTRY: LazyLock<FlagRegistry> = LazyLock::new(|| FlagRegistry::from_table(FLAGS));

/// Returns the process-wide flag registry, built on first use.
pub fn registry() -> &'static FlagRegistry {
    &REGISTRY
}

/// A registry row prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagInfo {
    /// Canonical long name.
    pub name: &'static str,
    /// Single-letter shorthand, if any.
    pub shorthand: Option<&'static str>,
    /// Value kind.
    pub kind: ValueKind,
    /// Target path template; empty for recognized no-op flags.
    pub target: &'static str,
}

/// Immutable lookup structure over the flag table.
#[derive(Debug)]
pub struct FlagRegistry {
    entries: HashMap<&'static str, Entry>,
    shorthands: HashMap<&'static str, &'static str>,
}

impl FlagRegistry {
    fn from_table(table: &[(&'static str, Entry)]) -> Self {
        let entries: HashMap<_, _> = table.iter().copied().collect();
        let shorthands = table
            .iter()
            .filter_map(|&(name, entry)| match entry {
                Entry::Alias(of) if name.chars().count() == 1 => Some((of, name)),
                _ => None,
            })
            .collect();
        Self {
            entries,
            shorthands,
        }
    }

    /// Resolves a flag name, following a shorthand to its target.
    pub fn lookup(&self, name: &str) -> Option<&FlagDescriptor> {
        match self.entries.get(name)? {
            Entry::Flag(descriptor) => Some(descriptor),
            Entry::Alias(of) => match self.entries.get(of)? {
                Entry::Flag(descriptor) => Some(descriptor),
                Entry::Alias(_) => None,
            },
        }
    }

    /// Value kind of a flag, used to decide boolean disambiguation.
    pub fn value_kind_of(&self, name: &str) -> Option<ValueKind> {
        self.lookup(name).map(|descriptor| descriptor.kind)
    }

    /// Canonical long name for `name`, resolving shorthands.
    pub fn canonical_name(&self, name: &str) -> Option<&'static str> {
        let (&key, entry) = self.entries.get_key_value(name)?;
        match entry {
            Entry::Flag(_) => Some(key),
            Entry::Alias(of) => Some(*of),
        }
    }

    /// Single-letter shorthand of a canonical flag, if it has one.
    pub fn shorthand(&self, canonical: &str) -> Option<&'static str> {
        self.shorthands.get(canonical).copied()
    }

    /// Lists every concrete flag, sorted by name.
    pub fn describe(&self) -> Vec<FlagInfo> {
        let mut rows: Vec<FlagInfo> = self
            .entries
            .iter()
            .filter_map(|(&name, entry)| match entry {
                Entry::Flag(descriptor) => Some(FlagInfo {
                    name,
                    shorthand: self.shorthand(name),
                    kind: descriptor.kind,
                    target: descriptor.target,
                }),
                Entry::Alias(_) => None,
            })
            .collect();
        rows.sort_by_key(|row| row.name);
        rows
    }
}
