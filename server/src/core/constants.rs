// =============================================================================
// Application Identity
// =============================================================================

/// Crate name as it appears in tracing targets
pub const CRATE_TARGET: &str = "bridge_server";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".bridge";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "bridge.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "BRIDGE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "BRIDGE_LOG";

// =============================================================================
// Environment Variables - Filters
// =============================================================================

/// Environment variable to enable or disable geospatial lookups
pub const ENV_GEOSPATIAL: &str = "BRIDGE_GEOSPATIAL";

/// Environment variable for the maximum number of filters per request
pub const ENV_MAX_FILTERS: &str = "BRIDGE_MAX_FILTERS";

/// Environment variable for the SQL dialect used when rendering
pub const ENV_DIALECT: &str = "BRIDGE_DIALECT";

// =============================================================================
// Filter Defaults
// =============================================================================

/// Geospatial lookups are available unless disabled
pub const DEFAULT_GEOSPATIAL: bool = true;

/// Upper bound accepted for `filters.max_filters`
pub const MAX_FILTERS_LIMIT: usize = 1000;
