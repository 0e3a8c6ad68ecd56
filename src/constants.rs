// src/constants.rs
//! Domain constants that define the operational boundaries of the system.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Base URL of the Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// API version pinned in the `Notion-Version` header.
///
/// Trashing a page is `archived: true` under this version.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// How many objects the Notion API returns per page of results (the maximum).
pub const NOTION_API_PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Database schema conventions
// ---------------------------------------------------------------------------

/// Property name assumed for the title when a schema has no title property.
///
/// Notion guarantees exactly one title property per database.
pub const DEFAULT_TITLE_PROPERTY: &str = "Name";

/// The title property always carries this property id, so a page can be
/// created before the schema is known.
pub const TITLE_PROPERTY_ID: &str = "title";

/// Display name for a project page whose title is empty.
pub const UNNAMED_PROJECT: &str = "Unnamed Project";

/// Name of the optional status property updated on start and end.
pub const STATUS_PROPERTY: &str = "Status";

/// Status option written when a session starts.
pub const STATUS_IN_PROGRESS: &str = "In Progress";

/// Status option written when a session ends.
pub const STATUS_DONE: &str = "Done";

// ---------------------------------------------------------------------------
// Local state
// ---------------------------------------------------------------------------

/// Directory name used under the user's config directory.
pub const STATE_DIR_NAME: &str = "codetrack";

/// File holding the persisted settings.
pub const STATE_FILE_NAME: &str = "state.json";

/// Log file written to the temp directory.
pub const LOG_FILE_NAME: &str = "codetrack.log";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
