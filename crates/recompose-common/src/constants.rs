//! System-wide constants and defaults.

/// Compose file format version written into every new document.
pub const COMPOSE_VERSION: &str = "3.8";

/// Top-level key holding the compose version.
pub const VERSION_KEY: &str = "version";

/// Top-level key holding the service mapping.
pub const SERVICES_KEY: &str = "services";

/// Service key holding the image reference.
pub const IMAGE_KEY: &str = "image";

/// Service key holding the trailing command arguments.
pub const COMMAND_KEY: &str = "command";

/// Command prefixes stripped from the start of an invocation, longest first.
pub const RUN_PREFIXES: &[&[&str]] = &[
    &["docker", "container", "run"],
    &["docker", "run"],
    &["podman", "run"],
];

/// Compose file names searched for, in order, when none is given.
pub const COMPOSE_FILE_CANDIDATES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// File written when output goes to disk without an explicit path.
pub const DEFAULT_OUTPUT_FILE: &str = "compose.yml";
