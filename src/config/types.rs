use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomConfig {
    #[serde(default)]
    pub directives: DirectiveConfig,
    #[serde(default)]
    pub attach: AttachConfig,
    /// Log the merged state at debug level after every update (default: true).
    #[serde(default = "default_log_state_changes")]
    pub log_state_changes: bool,
}

/// Markup vocabulary the renderer recognises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveConfig {
    /// Text binding attribute (default: "x-text").
    #[serde(default = "default_text_attribute")]
    pub text: String,
    /// Repetition attribute (default: "x-for").
    #[serde(default = "default_repeat_attribute")]
    pub repeat: String,
    /// Tag of the fragment cloned once per item (default: "template").
    #[serde(default = "default_template_tag")]
    pub template_tag: String,
    /// Prefix of attributes rewritten from `item.property` values (default: "data-").
    #[serde(default = "default_data_prefix")]
    pub data_prefix: String,
    /// Context name of the index when `x-for` does not declare one (default: "index").
    #[serde(default = "default_index_name")]
    pub default_index_name: String,
}

/// Attachment list behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

/// What `attach` does with a target that is already attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep a single entry and report a `DuplicateTarget` diagnostic.
    #[default]
    Ignore,
    /// Append another entry; the target is rendered once per entry.
    Allow,
}

fn default_log_state_changes() -> bool {
    true
}

fn default_text_attribute() -> String {
    "x-text".to_string()
}

fn default_repeat_attribute() -> String {
    "x-for".to_string()
}

fn default_template_tag() -> String {
    "template".to_string()
}

fn default_data_prefix() -> String {
    "data-".to_string()
}

fn default_index_name() -> String {
    "index".to_string()
}

impl Default for AtomConfig {
    fn default() -> Self {
        Self {
            directives: DirectiveConfig::default(),
            attach: AttachConfig::default(),
            log_state_changes: default_log_state_changes(),
        }
    }
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            text: default_text_attribute(),
            repeat: default_repeat_attribute(),
            template_tag: default_template_tag(),
            data_prefix: default_data_prefix(),
            default_index_name: default_index_name(),
        }
    }
}
