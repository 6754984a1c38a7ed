//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["conclave.toml", ".conclave.toml"];
const ENV_PREFIX: &str = "CONCLAVE_";

/// Where a configuration layer comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSourceKind {
    Explicit,
    Project,
    Global,
    Environment,
    Defaults,
}

impl ConfigSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSourceKind::Explicit => "explicit",
            ConfigSourceKind::Project => "project",
            ConfigSourceKind::Global => "global",
            ConfigSourceKind::Environment => "environment",
            ConfigSourceKind::Defaults => "defaults",
        }
    }
}

/// One configuration layer and whether it is present
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    /// File path, or a description for non-file layers
    pub location: String,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided; must exist)
    /// 2. Project root: `./conclave.toml` or `./.conclave.toml`
    /// 3. XDG config: `$XDG_CONFIG_HOME/conclave/config.toml`
    /// 4. `CONCLAVE_` environment variables (`__` separates sections)
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(Box::new(figment::Error::from(format!(
                "config file not found: {}",
                path.display()
            ))));
        }
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// `$XDG_CONFIG_HOME/conclave/config.toml`, or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("conclave").join("config.toml"))
    }

    /// The first project-level config file found in the working directory
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Every layer in priority order, for `conclave config`
    pub fn sources(config_path: Option<&PathBuf>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        if let Some(path) = config_path {
            sources.push(file_source(ConfigSourceKind::Explicit, path));
        }

        match Self::project_config_path() {
            Some(path) => sources.push(file_source(ConfigSourceKind::Project, &path)),
            None => sources.push(ConfigSource {
                kind: ConfigSourceKind::Project,
                location: PROJECT_FILES.map(|f| format!("./{f}")).join(" or "),
                found: false,
            }),
        }

        if let Some(path) = Self::global_config_path() {
            sources.push(file_source(ConfigSourceKind::Global, &path));
        }

        sources.push(ConfigSource {
            kind: ConfigSourceKind::Environment,
            location: format!("{ENV_PREFIX}* variables"),
            found: std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX)),
        });
        sources.push(ConfigSource {
            kind: ConfigSourceKind::Defaults,
            location: "built-in defaults".to_string(),
            found: true,
        });

        sources
    }
}

fn file_source(kind: ConfigSourceKind, path: &Path) -> ConfigSource {
    ConfigSource {
        kind,
        location: path.display().to_string(),
        found: path.exists(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.models.is_empty());
        assert_eq!(config.router.max_fallback_attempts, 2);
    }

    #[test]
    fn test_global_config_path_names_conclave() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.ends_with("conclave/config.toml"));
        }
    }

    #[test]
    fn test_project_file_overrides_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            jail.set_env("CONCLAVE_ROUTER__MIN_QUALITY", "0.7");
            jail.set_env("CONCLAVE_CONSENSUS__MAX_ROUNDS", "6");
            jail.create_file("conclave.toml", "[consensus]\nmax_rounds = 2\n")?;

            let config = ConfigLoader::load(None).map_err(|e| *e)?;
            assert_eq!(config.router.min_quality, 0.7);
            assert_eq!(config.consensus.max_rounds, 2);
            assert_eq!(config.ensemble.max_models, 5);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            jail.create_file(".conclave.toml", "[diffusion]\nmax_rounds = 2\n")?;
            jail.create_file("custom.toml", "[diffusion]\nmax_rounds = 7\n")?;

            let path = PathBuf::from("custom.toml");
            let config = ConfigLoader::load(Some(&path)).map_err(|e| *e)?;
            assert_eq!(config.diffusion.max_rounds, 7);
            Ok(())
        });
    }

    #[test]
    fn test_global_file_is_lowest_file_layer() {
        Jail::expect_with(|jail| {
            let xdg = jail.directory().join("xdg");
            jail.set_env("XDG_CONFIG_HOME", xdg.display());
            std::fs::create_dir_all("xdg/conclave").map_err(|e| e.to_string())?;
            jail.create_file(
                "xdg/conclave/config.toml",
                "[router]\nensemble_size = 4\nmin_quality = 0.3\n",
            )?;
            jail.create_file("conclave.toml", "[router]\nmin_quality = 0.9\n")?;

            let config = ConfigLoader::load(None).map_err(|e| *e)?;
            assert_eq!(config.router.ensemble_size, 4);
            assert_eq!(config.router.min_quality, 0.9);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        Jail::expect_with(|_| {
            let path = PathBuf::from("nope.toml");
            assert!(ConfigLoader::load(Some(&path)).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_sources_list_defaults_last() {
        let sources = ConfigLoader::sources(None);
        assert_eq!(
            sources.last().map(|s| s.kind),
            Some(ConfigSourceKind::Defaults)
        );
        assert!(sources.iter().any(|s| s.kind == ConfigSourceKind::Project));
    }
}
