use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pulse: PulseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct LoggingConfig {
    /// Where node logs are written.
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PulseConfig {
    #[serde(default = "default_pactl")]
    pub pactl: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default = "default_bootstrap_timeout")]
    pub bootstrap_timeout_ms: u64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            pactl: default_pactl(),
            server: None,
            bootstrap_timeout_ms: default_bootstrap_timeout(),
        }
    }
}

fn default_pactl() -> String {
    "pactl".to_string()
}

fn default_bootstrap_timeout() -> u64 {
    5000
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "vollog", "vollog")
}

impl Config {
    /// Defaults, then the user's `config.toml`, then `VOLLOG_<SECTION>__<KEY>` variables.
    pub fn load() -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dirs) = project_dirs() {
            figment = figment.merge(Toml::file(dirs.config_dir().join("config.toml")));
        }
        figment.merge(Env::prefixed("VOLLOG_").split("__")).extract()
    }

    pub fn load_from_path(path: PathBuf) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VOLLOG_").split("__"))
            .extract()
    }

    pub fn log_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.logging.dir {
            PathBuf::from(shellexpand::tilde(dir).into_owned())
        } else if let Some(dirs) = project_dirs() {
            dirs.data_local_dir().join("logs")
        } else {
            PathBuf::from(".")
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pulse.pactl, "pactl");
        assert_eq!(config.pulse.bootstrap_timeout_ms, 5000);
        assert_eq!(config.pulse.server, None);
        assert_eq!(config.logging.dir, None);
    }

    #[test]
    fn test_load_from_path_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "vollog.toml",
                r#"
                [logging]
                dir = "/var/log/vollog"

                [pulse]
                server = "unix:/run/pulse/native"
                "#,
            )?;
            jail.set_env("VOLLOG_PULSE__PACTL", "/usr/bin/pactl");

            let config = Config::load_from_path(PathBuf::from("vollog.toml"))?;
            assert_eq!(config.log_dir(), PathBuf::from("/var/log/vollog"));
            assert_eq!(config.pulse.server.as_deref(), Some("unix:/run/pulse/native"));
            assert_eq!(config.pulse.pactl, "/usr/bin/pactl");
            assert_eq!(config.pulse.bootstrap_timeout_ms, 5000);
            Ok(())
        });
    }

    #[test]
    fn test_tilde_log_dir() {
        let config = Config {
            logging: LoggingConfig { dir: Some("~/vollog".to_string()) },
            ..Config::default()
        };
        assert!(!config.log_dir().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("pactl = \"pactl\""));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
