//! System-wide constants and default paths.

use std::time::Duration;

/// File name of the per-version manifest document.
pub const MANIFEST_FILE: &str = "dep.json";

/// Current manifest schema version written by this toolchain.
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0";

/// Extension (without dot) of analyzable script sources.
pub const SOURCE_EXTENSION: &str = "lua";

/// Extension (without dot) of distributable archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// File name of the published index inside the distribution directory.
pub const INDEX_FILE: &str = "index.json";

/// Path of the index relative to the CDN base URL.
pub const INDEX_PATH: &str = "/index.json";

/// Schema version stamped into generated indexes.
pub const INDEX_SCHEMA_VERSION: &str = "1.0";

/// CDN base URL used when no override is configured.
pub const DEFAULT_CDN_URL: &str = "https://cdn.depscian.tech";

/// Environment variable overriding the CDN base URL.
pub const CDN_URL_ENV: &str = "CDN_URL";

/// Default distribution directory, relative to the working directory.
pub const DEFAULT_DIST_DIR: &str = "dist";

/// How long a fetched index stays fresh in the client cache.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Timeout applied to every index fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Version placeholder recorded when the registry cannot name a version.
pub const UNKNOWN_VERSION: &str = "*";

/// Prefix marking a tracked path as relative to the script working directory.
pub const WORKING_DIR_MARKER: &str = "<working_dir>";

/// Default version assigned to scripts that do not declare one.
pub const DEFAULT_SCRIPT_VERSION: &str = "1.0.0";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;
