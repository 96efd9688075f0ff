//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Settings read from the user's `.dapplerc` file.

use crate::core::ipfs::IpfsSettings;
use crate::error::{Error, LastError};
use crate::util::environment::{DAPPLERC, DAPPLERC_FILE, DEFAULT_ENVIRONMENT};
use serde_derive::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSettings {
    ipfs: Option<IpfsSettings>,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    environments: HashMap<String, EnvironmentSettings>,
    #[serde(skip)]
    path: PathBuf,
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut environments = HashMap::new();
        environments.insert(
            DEFAULT_ENVIRONMENT.to_string(),
            EnvironmentSettings {
                ipfs: Some(IpfsSettings::default()),
            },
        );
        Self {
            environments: environments,
            path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Locates the settings file: `$DAPPLERC` when set, otherwise `~/.dapplerc`.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(s) = env::var(DAPPLERC) {
            return Some(PathBuf::from(s));
        }
        home::home_dir().map(|h| h.join(DAPPLERC_FILE))
    }

    /// Reads the settings file at `path`.
    ///
    /// A missing file falls back to the default settings.
    pub fn from_file(path: &PathBuf) -> Result<Self, Error> {
        if path.exists() == false {
            return Ok(Self {
                path: path.clone(),
                ..Self::default()
            });
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::ConfigUnreadable(path.clone(), LastError(e.to_string())))?;
        let mut cfg = Self::from_str(&contents)
            .map_err(|e| Error::ConfigUnreadable(path.clone(), LastError(e.to_string())))?;
        cfg.path = path.clone();
        Ok(cfg)
    }

    /// Loads the settings from their default location.
    pub fn load() -> Result<Self, Error> {
        match Self::locate() {
            Some(p) => Self::from_file(&p),
            None => Ok(Self::default()),
        }
    }

    /// Returns the IPFS endpoint configured for `environment`.
    pub fn ipfs(&self, environment: &str) -> Result<IpfsSettings, Error> {
        match self.environments.get(environment) {
            Some(EnvironmentSettings { ipfs: Some(s) }) => Ok(s.clone()),
            Some(EnvironmentSettings { ipfs: None }) => Ok(IpfsSettings::default()),
            None => Err(Error::UnknownEnvironment(
                environment.to_string(),
                self.path.clone(),
            )),
        }
    }

    pub fn get_path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const C_0: &str = r#"
# This is a blank configuration file.
"#;

    const C_1: &str = r#"
[environments.live.ipfs]
host = "ipfs.infura.io"
port = 5001

[environments.morden.ipfs]
host = "localhost"
port = 5002

[environments.offline]
"#;

    #[test]
    fn parse_empty_config() {
        let cfg = Config::from_str(C_0).unwrap();
        match cfg.ipfs("live") {
            Err(Error::UnknownEnvironment(name, _)) => assert_eq!(name, "live"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn parse_basic_config() {
        let cfg = Config::from_str(C_1).unwrap();
        assert_eq!(
            cfg.ipfs("live").unwrap(),
            IpfsSettings {
                host: String::from("ipfs.infura.io"),
                port: 5001
            }
        );
        assert_eq!(cfg.ipfs("morden").unwrap().port, 5002);
        assert_eq!(cfg.ipfs("offline").unwrap(), IpfsSettings::default());
    }

    #[test]
    fn reject_unknown_ipfs_key() {
        let bad = "[environments.live.ipfs]\nhost = \"a\"\nport = 1\nprotocol = \"https\"\n";
        assert!(Config::from_str(bad).is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dapplerc");
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.ipfs("live").unwrap(), IpfsSettings::default());
        assert_eq!(cfg.get_path(), &path);
    }

    #[test]
    fn unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dapplerc");
        std::fs::write(&path, "[environments.live.ipfs\n").unwrap();
        match Config::from_file(&path) {
            Err(Error::ConfigUnreadable(p, _)) => assert_eq!(p, path),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
