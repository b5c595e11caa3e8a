//! ODC connection document.
//!
//! The template carries script blocks full of braces, so placeholders are
//! replaced by plain substitution instead of a format engine.

use std::path::Path;

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/model.odc");

pub const DEFAULT_DATABASE: &str = "YouDidNotSpecifyDB";
pub const DEFAULT_CUBE: &str = "YouDidNotSpecifyCube";

/// Values taken from the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentParams {
    pub title: String,
    pub database: String,
    pub cube: String,
}

impl DocumentParams {
    /// Fill in defaults for missing segments. The title is `"<server> <database>"`.
    pub fn from_segments(server_name: &str, database: Option<&str>, cube: Option<&str>) -> Self {
        let database = clean_segment(database).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let cube = clean_segment(cube).unwrap_or_else(|| DEFAULT_CUBE.to_string());

        Self {
            title: format!("{} {}", server_name, database),
            database,
            cube,
        }
    }
}

fn clean_segment(segment: Option<&str>) -> Option<String> {
    segment
        .map(|s| s.replace('/', ""))
        .filter(|s| !s.is_empty())
}

/// Template with `{title}`, `{serverFullURI}`, `{database}` and `{cube}` placeholders.
#[derive(Debug, Clone)]
pub struct OdcTemplate {
    source: String,
}

impl OdcTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    /// Built-in template unless a path is configured.
    pub fn load(path: Option<&str>) -> std::io::Result<Self> {
        match path {
            Some(path) => Self::from_file(Path::new(path)),
            None => Ok(Self::builtin()),
        }
    }

    pub fn render(&self, endpoint: &str, params: &DocumentParams) -> String {
        self.source
            .replace("{title}", &params.title)
            .replace("{serverFullURI}", endpoint)
            .replace("{database}", &params.database)
            .replace("{cube}", &params.cube)
    }
}

impl Default for OdcTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}
