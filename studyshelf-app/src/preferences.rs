use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use studyshelf_core::{Rgb, Subject, Zoom};

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPreferences {
    /// Root that book locators are resolved against. Relative paths are
    /// taken from the working directory.
    #[serde(default = "default_content_root")]
    pub content_root: String,
    /// Catalog JSON directory, relative to `content_root`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub default_subject: Subject,
    /// Quiet period before a search box applies its query.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    /// Zoom-out stops here.
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_pen_color")]
    pub pen_color: Rgb,
    #[serde(default = "default_pen_size")]
    pub pen_size: f32,
}

fn default_content_root() -> String {
    ".".to_string()
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_search_debounce_ms() -> u64 {
    300
}
fn default_zoom_step() -> f64 {
    0.2
}
fn default_min_scale() -> f64 {
    0.4
}
fn default_pen_color() -> Rgb {
    Rgb::NEON
}
fn default_pen_size() -> f32 {
    2.0
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            data_dir: default_data_dir(),
            default_subject: Subject::default(),
            search_debounce_ms: default_search_debounce_ms(),
            zoom_step: default_zoom_step(),
            min_scale: default_min_scale(),
            pen_color: default_pen_color(),
            pen_size: default_pen_size(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from next to the executable, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Write the defaults next to the executable on first run so there is a
    /// file to edit.
    pub fn write_default_if_missing() {
        let path = config_path();
        if !path.exists() {
            info!("Creating {}", path.display());
            Self::default().save_to(&path);
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                    Ok(prefs) => {
                        info!("Loaded preferences from {}", path.display());
                        return prefs;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    /// Persist preferences to disk.
    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences");
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }

    pub fn content_root(&self) -> PathBuf {
        PathBuf::from(&self.content_root)
    }

    pub fn data_path(&self) -> PathBuf {
        self.content_root().join(&self.data_dir)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Zoom configured from the preferences; invalid values fall back to
    /// the defaults.
    pub fn zoom(&self) -> Zoom {
        Zoom::new(self.zoom_step, self.min_scale).unwrap_or_else(|e| {
            warn!("Ignoring zoom preferences: {e}");
            Zoom::default()
        })
    }
}

fn config_path() -> PathBuf {
    crate::app_dir::exe_directory().join("preferences.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let prefs: AppPreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.search_debounce_ms, 300);
        assert_eq!(prefs.pen_color, Rgb::NEON);
        assert_eq!(prefs.default_subject, Subject::Math);
        assert_eq!(prefs.data_path(), PathBuf::from(".").join("data"));
    }

    #[test]
    fn subject_and_color_parse_from_json() {
        let prefs: AppPreferences =
            serde_json::from_str(r##"{"default_subject":"cs","pen_color":"#ff8800"}"##).unwrap();
        assert_eq!(prefs.default_subject, Subject::Cs);
        assert_eq!(prefs.pen_color, Rgb { r: 0xff, g: 0x88, b: 0x00 });
    }

    #[test]
    fn bad_color_rejects_file() {
        assert!(serde_json::from_str::<AppPreferences>(r#"{"pen_color":"red"}"#).is_err());
    }

    #[test]
    fn invalid_zoom_falls_back() {
        let prefs = AppPreferences {
            min_scale: -1.0,
            ..Default::default()
        };
        assert_eq!(prefs.zoom(), Zoom::default());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join("studyshelf_test_prefs");
        let path = dir.join("preferences.json");
        let prefs = AppPreferences {
            search_debounce_ms: 50,
            ..Default::default()
        };
        prefs.save_to(&path);

        let loaded = AppPreferences::load_from(&path);
        assert_eq!(loaded.search_debounce_ms, 50);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("studyshelf_test_prefs_bad");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("preferences.json");
        fs::write(&path, "not json").unwrap();

        let loaded = AppPreferences::load_from(&path);
        assert_eq!(loaded.search_debounce_ms, 300);

        let _ = fs::remove_dir_all(&dir);
    }
}
