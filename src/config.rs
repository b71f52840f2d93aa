/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use log::warn;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Origin of the app's shell assets (index document, manifest,
    /// worker script).
    pub assets_dir: PathBuf,
    /// Root for the versioned offline caches.
    pub cache_dir: PathBuf,
    /// Where the install action writes the launcher entry.
    pub applications_dir: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    install: TomlInstall,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_assets_dir")]
    assets_dir: String,
    /// Empty string = per-user data directory.
    #[serde(default)]
    cache_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlInstall {
    /// Empty string = per-user applications directory.
    #[serde(default)]
    applications_dir: String,
}

// ── Defaults ──

fn default_assets_dir() -> String { "assets".into() }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            assets_dir: default_assets_dir(),
            cache_dir: String::new(),
        }
    }
}

impl Default for TomlInstall {
    fn default() -> Self {
        TomlInstall { applications_dir: String::new() }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

fn default_cache_dir() -> PathBuf {
    home_dir().join(".local/share/dumb-charades/caches")
}

fn default_applications_dir() -> PathBuf {
    home_dir().join(".local/share/applications")
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve the assets directory: absolute paths are taken as-is,
        // relative ones searched across the candidate dirs.
        let assets_str = &toml_cfg.general.assets_dir;
        let assets_dir = if PathBuf::from(assets_str).is_absolute() {
            PathBuf::from(assets_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(assets_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(assets_str))
        };

        let cache_dir = match toml_cfg.general.cache_dir.as_str() {
            "" => default_cache_dir(),
            dir => PathBuf::from(dir),
        };
        let applications_dir = match toml_cfg.install.applications_dir.as_str() {
            "" => default_applications_dir(),
            dir => PathBuf::from(dir),
        };

        GameConfig { assets_dir, cache_dir, applications_dir }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a packaged binary still finds data
        // relative to its real location.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/dumb-charades)
    let xdg = home_dir().join(".local/share/dumb-charades");
    if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
        dirs.push(xdg);
    }

    // 4. System data directory (/usr/share/dumb-charades)
    let sys = PathBuf::from("/usr/share/dumb-charades");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warn!("config.toml parse error: {e}; using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
