//! Configuration provider using Figment

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, trace};

use crate::error::ConfigResult;
use crate::types::FolioConfig;

/// Environment variable prefix: `FOLIO_SYSTEM_DIR` sets `system_dir`.
pub const ENV_PREFIX: &str = "FOLIO_";

/// Base name of project configuration files.
pub const CONFIG_FILE_STEM: &str = "folio";

/// Loads [`FolioConfig`] for a project directory.
///
/// Sources in precedence order (later sources override earlier ones):
/// 1. Default values
/// 2. `folio.toml`, `folio.yaml`, `folio.yml`, `folio.json` in the project
///    directory, in that order; missing files are skipped
/// 3. Environment variables prefixed `FOLIO_`
///
/// Nothing is cached; every call reads the sources again.
pub struct ConfigProvider;

impl ConfigProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, project_dir: &Path) -> ConfigResult<FolioConfig> {
        let config: FolioConfig = self.build_figment(project_dir).extract()?;
        config.validate()?;
        debug!(
            content_root = %config.content_root.display(),
            schema_path = %config.schema_path,
            system_dir = %config.system_dir,
            "loaded configuration"
        );
        Ok(config)
    }

    fn build_figment(&self, project_dir: &Path) -> Figment {
        Figment::from(Serialized::defaults(FolioConfig::default()))
            .merge(self.config_files(project_dir))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn config_files(&self, project_dir: &Path) -> Figment {
        let path = |ext: &str| project_dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));
        trace!(dir = %project_dir.display(), "looking for configuration files");
        Figment::new()
            .merge(Toml::file(path("toml")))
            .merge(Yaml::file(path("yaml")))
            .merge(Yaml::file(path("yml")))
            .merge(Json::file(path("json")))
    }
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration for `project_dir` with the default provider.
pub fn load_config(project_dir: impl AsRef<Path>) -> ConfigResult<FolioConfig> {
    ConfigProvider::new().load(project_dir.as_ref())
}
