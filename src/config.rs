use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Deserialize, Serialize)]
pub struct Config {
    /// Image used for the bastion and every minion.
    pub image: String,
    /// Where the generated compose manifest is written.
    pub compose_file: PathBuf,
    pub hosts_file: PathBuf,
    pub docker_bin: String,
    pub ssh_bin: String,
    pub ssh_user: String,
    pub ssh_host: String,
    pub ssh_password: String,
    /// Host port published for the bastion's sshd; minion-k gets `port_base + k`.
    pub port_base: u16,
    /// Name of the bridge network declared in the compose manifest.
    pub network_name: String,
    /// Attempt the interactive bastion login after provisioning.
    pub login: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image: "schooleon/minion".into(),
            compose_file: PathBuf::from("docker-compose.yml"),
            hosts_file: PathBuf::from("/etc/hosts"),
            docker_bin: "docker".into(),
            ssh_bin: "ssh".into(),
            ssh_user: "minion".into(),
            ssh_host: "localhost".into(),
            ssh_password: "minion".into(),
            port_base: 220,
            network_name: "lab".into(),
            login: true,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("image", &self.image)
            .field("compose_file", &self.compose_file)
            .field("hosts_file", &self.hosts_file)
            .field("docker_bin", &self.docker_bin)
            .field("ssh_bin", &self.ssh_bin)
            .field("ssh_user", &self.ssh_user)
            .field("ssh_host", &self.ssh_host)
            .field("ssh_password", &"<redacted>")
            .field("port_base", &self.port_base)
            .field("network_name", &self.network_name)
            .field("login", &self.login)
            .finish()
    }
}

impl Config {
    pub fn load(extra: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("minions.toml"))
            .merge(Json::file("minions.json"))
            .merge(Env::prefixed("MINIONS_"));

        if let Some(path) = extra {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        if config.port_base == 0 {
            anyhow::bail!("Invalid port_base: must be greater than zero");
        }

        Ok(config)
    }

    /// Upper bound on `--machines` so every minion gets a valid host port.
    pub fn max_machines(&self) -> usize {
        (u16::MAX - self.port_base) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_lab() {
        let cfg = Config::default();
        assert_eq!(cfg.image, "schooleon/minion");
        assert_eq!(cfg.hosts_file, PathBuf::from("/etc/hosts"));
        assert_eq!(cfg.port_base, 220);
        assert!(cfg.login);
    }

    #[test]
    fn extra_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.toml");
        std::fs::write(
            &path,
            "image = \"alpine-sshd\"\nhosts_file = \"/tmp/hosts\"\nport_base = 2200\nlogin = false\n",
        )
        .unwrap();

        let cfg = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.image, "alpine-sshd");
        assert_eq!(cfg.hosts_file, PathBuf::from("/tmp/hosts"));
        assert_eq!(cfg.port_base, 2200);
        assert!(!cfg.login);
        assert_eq!(cfg.max_machines(), (u16::MAX - 2200) as usize);
    }

    #[test]
    fn debug_output_hides_the_password() {
        let cfg = Config {
            ssh_password: "hunter2".into(),
            ..Config::default()
        };
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("schooleon/minion"));
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/minions.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
