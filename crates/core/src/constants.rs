//! Constants used throughout the docfill core crate.

/// Assignee written into `[RESPONSAVEL]` when neither the request nor the configuration names one.
pub const DEFAULT_ASSIGNEE: &str = "Equipe de Projetos";

/// Appended to the client domain to form the admin-panel link.
pub const DEFAULT_ADMIN_PANEL_SUFFIX: &str = "/wp-admin";

/// Display label for `[LINK_DRIVE]` when no link text is given.
pub const DRIVE_LINK_LABEL: &str = "Link Drive";

/// Display label for `[LINK_PAINEL]` when no link text is given.
pub const PANEL_LINK_LABEL: &str = "Painel Administrativo";

/// Separator for the company summary (activity, size class, status).
pub const SUMMARY_SEPARATOR: &str = " | ";

/// Separator for the postal address parts.
pub const ADDRESS_SEPARATOR: &str = " - ";

/// Separator for the contact parts (phone, email).
pub const CONTACT_SEPARATOR: &str = " / ";

/// Date format used in rendered reports.
pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Longest raw-record excerpt handed to a text generator.
pub const MAX_SOURCE_TEXT_CHARS: usize = 2000;

/// Hyperlink colour (RGB hex).
pub const LINK_COLOR: &str = "0000FF";

pub const REGISTRY_TIMEOUT_SECS: u64 = 10;
pub const REGISTRY_MAX_ATTEMPTS: u32 = 3;
pub const REGISTRY_BACKOFF_SECS: u64 = 1;
pub const GENERATION_TIMEOUT_SECS: u64 = 30;

// Environment variables, read once at startup.
pub const ENV_ASSIGNEE: &str = "DOCFILL_ASSIGNEE";
pub const ENV_ADMIN_PANEL_SUFFIX: &str = "DOCFILL_ADMIN_PANEL_SUFFIX";
pub const ENV_REGISTRY_URL: &str = "DOCFILL_REGISTRY_URL";
pub const ENV_REGISTRY_TIMEOUT_SECS: &str = "DOCFILL_REGISTRY_TIMEOUT_SECS";
pub const ENV_GENERATION_TIMEOUT_SECS: &str = "DOCFILL_GENERATION_TIMEOUT_SECS";
pub const ENV_AI_PROVIDER: &str = "AI_PROVIDER";
pub const ENV_HUGGINGFACE_TOKEN: &str = "HUGGINGFACE_API_TOKEN";
pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
