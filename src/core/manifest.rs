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

use crate::error::{Error, LastError};
use crate::util::anyerror::{AnyError, Fault};
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const MANIFEST_FILE: &str = "dappfile";

/// The part of a package's manifest needed to place it on disk.
#[derive(Debug, PartialEq, Deserialize)]
pub struct Manifest {
    name: Option<String>,
}

impl FromStr for Manifest {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Manifest {
    /// Reads the manifest living directly under `root`.
    pub fn from_root(root: &Path) -> Result<Self, Fault> {
        let path = root.join(MANIFEST_FILE);
        if path.exists() == false {
            return Err(AnyError(format!("missing manifest file {:?}", path)))?;
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Self::from_str(&contents)?)
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| n.is_empty() == false)
    }

    /// Resolves the canonical package name declared at `root`.
    pub fn read_name(root: &Path) -> Result<String, Error> {
        let unreadable = |e: LastError| Error::ManifestUnreadable(root.join(MANIFEST_FILE), e);
        let man = Self::from_root(root).map_err(|e| unreadable(LastError(e.to_string())))?;
        match man.get_name() {
            Some(n) => Ok(n.to_string()),
            None => Err(unreadable(LastError(String::from(
                "manifest does not declare a \"name\"",
            )))),
        }
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const M_1: &str = r#"
name = "ds-token"
version = "1.0.0"

[dependencies]
ds-auth = "https://github.com/dapphub/ds-auth.git@52c6a32"
"#;

    #[test]
    fn from_toml_string() {
        let man = Manifest::from_str(M_1).unwrap();
        assert_eq!(man.get_name(), Some("ds-token"));

        let man = Manifest::from_str("").unwrap();
        assert_eq!(man.get_name(), None);

        let man = Manifest::from_str("name = \"\"").unwrap();
        assert_eq!(man.get_name(), None);
    }

    #[test]
    fn read_name_from_root() {
        let dir = tempfile::tempdir().unwrap();
        match Manifest::read_name(dir.path()) {
            Err(Error::ManifestUnreadable(p, _)) => assert_eq!(p, Manifest::path(dir.path())),
            other => panic!("unexpected result {:?}", other),
        }

        std::fs::write(Manifest::path(dir.path()), "version = \"1.0.0\"").unwrap();
        assert!(Manifest::read_name(dir.path()).is_err());

        std::fs::write(Manifest::path(dir.path()), "name = [").unwrap();
        assert!(Manifest::read_name(dir.path()).is_err());

        std::fs::write(Manifest::path(dir.path()), M_1).unwrap();
        assert_eq!(Manifest::read_name(dir.path()).unwrap(), "ds-token");
    }
}
