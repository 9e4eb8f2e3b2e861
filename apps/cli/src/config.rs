use std::fs;
use std::path::{Path, PathBuf};

use metrics_app::DashboardConfig;

const CONFIG_DIR_NAME: &str = "metrics-dashboard";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: DashboardConfig,
    pub file: PathBuf,
    pub created: bool,
}

/// Loads the config file, writing the defaults first if it does not exist.
pub fn load_or_create(explicit: Option<&Path>) -> Result<ConfigLoad, String> {
    let file = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_dir()?.join(CONFIG_FILE_NAME),
    };
    load_or_create_at(file)
}

fn load_or_create_at(file: PathBuf) -> Result<ConfigLoad, String> {
    if file.exists() {
        let contents = fs::read_to_string(&file)
            .map_err(|err| format!("read config {}: {}", file.display(), err))?;
        let config: DashboardConfig = toml::from_str(&contents)
            .map_err(|err| format!("parse config {}: {}", file.display(), err))?;
        return Ok(ConfigLoad {
            config,
            file,
            created: false,
        });
    }

    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)
            .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
    }
    let config = DashboardConfig::default();
    let contents =
        toml::to_string_pretty(&config).map_err(|err| format!("serialize config: {}", err))?;
    fs::write(&file, contents)
        .map_err(|err| format!("write config {}: {}", file.display(), err))?;

    Ok(ConfigLoad {
        config,
        file,
        created: true,
    })
}

fn default_config_dir() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| "could not resolve the platform config directory".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregate::ZonePolicy;
    use metrics_app::Theme;

    #[test]
    fn creates_defaults_then_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let first = load_or_create(Some(&file)).expect("create");
        assert!(first.created);
        assert_eq!(first.config, DashboardConfig::default());

        let second = load_or_create(Some(&file)).expect("reload");
        assert!(!second.created);
        assert_eq!(second.config, DashboardConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &file,
            "refresh_secs = 15\ntheme = \"dark\"\ndate_zone = \"+05:30\"\n",
        )
        .expect("write");

        let loaded = load_or_create(Some(&file)).expect("load");
        assert_eq!(loaded.config.refresh_secs, 15);
        assert_eq!(loaded.config.theme, Theme::Dark);
        assert_eq!(loaded.config.date_zone, "+05:30".parse::<ZonePolicy>().expect("zone"));
        assert_eq!(loaded.config.timeline_limit, 20);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&file, "refresh_secs = \"soon\"\n").expect("write");
        let err = load_or_create(Some(&file)).expect_err("parse error");
        assert!(err.starts_with("parse config"));
    }
}
