//! Field names and file suffixes shared by the sanitize and import phases.
//!
//! Report headers and entries are free-form mappings; these are the only keys the
//! pipeline reads or writes.

// Fields read from raw reports
pub const INPUT_FIELD: &str = "input";
pub const JURISDICTION_FIELD: &str = "probe_cc";

// Fields written by sanitization
pub const BRIDGE_HASHED_FINGERPRINT_FIELD: &str = "bridge_hashed_fingerprint";
pub const BRIDGE_ADDRESS_FIELD: &str = "bridge_address";
pub const DISTRIBUTOR_FIELD: &str = "distributor";

// Housekeeping fields
pub const REPORT_FILE_FIELD: &str = "report_file";
pub const REPORT_ID_FIELD: &str = "report_id";

/// Suffix of raw and sanitized report files
pub const DEFAULT_REPORT_EXTENSION: &str = "yamloo";

/// Suffix appended to the raw file name inside the archive directory
pub const ARCHIVE_EXTENSION: &str = "gz";

/// Suffix of the hidden temporary files used for atomic writes
pub const TEMP_EXTENSION: &str = "tmp";
