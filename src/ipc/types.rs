use std::collections::HashMap;
use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::listview::ListView;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormMode {
    Create,
    Edit,
}

/// One staged record form. Field values survive every failure path; only a
/// successful submit clears them.
pub struct FormState {
    pub resource: &'static str,
    pub mode: FormMode,
    pub record_id: Option<String>,
    pub fields: Map<String, Value>,
    pub staged_file: Option<PathBuf>,
    /// Image reference the record already carries (edit mode), used to
    /// revert the preview when a staged file is removed.
    pub existing_image: Option<String>,
    pub submitting: bool,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    /// One list controller per resource, created lazily on first use.
    pub views: HashMap<&'static str, ListView>,
    pub form: Option<FormState>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            db: None,
            views: HashMap::new(),
            form: None,
        }
    }
}
