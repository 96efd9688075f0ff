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

//! A specifier is the raw text a user writes to request a dependency, such as
//! `https://github.com/dapphub/ds-token.git@0c6f7e6` or `ds-token@ipfs://QmXyz`.

use crate::error::{Error, Hint, LastError};
use crate::util::filesystem;
use fancy_regex::Regex;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// `<anything>.git@<commit>`
static GIT_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+\.git)@([0-9A-Za-z]+)$").expect("valid regex"));

/// `<path>[@<version>]` splitting on the last `@`.
static GENERIC_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(?:@([^@]*))?$").expect("valid regex"));

static IPFS_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^@?(?:ipfs://)?(qm[a-z0-9]+)$").expect("valid regex")
});

pub const GIT_SUFFIX: &str = ".git";
pub const IPFS_SCHEME: &str = "ipfs://";

/// The fetch shape of a source location, decided once when the descriptor is built.
#[derive(Debug, PartialEq, Clone)]
pub enum Source {
    Git,
    Ipfs(String),
    Unknown,
}

impl Source {
    fn detect(location: &str) -> Self {
        if location.ends_with(GIT_SUFFIX) == true {
            Self::Git
        } else if let Some(hash) = location.strip_prefix(IPFS_SCHEME) {
            Self::Ipfs(hash.to_string())
        } else {
            Self::Unknown
        }
    }
}

/// An immutable request for a single dependency.
#[derive(Debug, PartialEq, Clone)]
pub struct DependencyDescriptor {
    location: String,
    version: Option<String>,
    name: Option<String>,
    source: Source,
}

impl DependencyDescriptor {
    /// Builds a descriptor from its parts.
    ///
    /// A git location without a version is rejected here so an unpinned
    /// repository never reaches the network.
    pub fn new(
        location: &str,
        version: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, Error> {
        let version = version.filter(|v| v.is_empty() == false);
        let name = name.filter(|n| n.is_empty() == false);
        let source = Source::detect(location);

        if source == Source::Git && version.is_none() {
            return Err(Error::MissingVersion(location.to_string(), Hint::PinCommit));
        }
        if let Some(n) = name {
            verify_name(n)?;
        }
        Ok(Self {
            location: location.to_string(),
            version: version.map(|v| v.to_string()),
            name: name.map(|n| n.to_string()),
            source: source,
        })
    }

    /// Parses the raw specifier `s`, taking `name` as the package name when given.
    pub fn parse(s: &str, name: Option<&str>) -> Result<Self, Error> {
        let parse_err = |reason: &str| Error::Parse(s.to_string(), LastError(reason.to_string()));

        if s.trim().is_empty() == true {
            return Err(parse_err("specifier is empty"));
        }
        if s.chars().any(|c| c.is_whitespace()) == true {
            return Err(parse_err("specifier cannot contain whitespace"));
        }
        // git form
        if let Ok(Some(caps)) = GIT_FORM.captures(s) {
            let location = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let version = caps.get(2).map(|m| m.as_str());
            return Self::new(location, version, name);
        }
        // generic form
        let (path, version) = match GENERIC_FORM.captures(s) {
            Ok(Some(caps)) => (
                caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
                caps.get(2).map(|m| m.as_str()).filter(|v| v.is_empty() == false),
            ),
            _ => return Err(parse_err("does not match any known dependency form")),
        };
        // ipfs form is detected from the version, or the path when no version is given
        let candidate = version.unwrap_or(path);
        if let Ok(Some(caps)) = IPFS_FORM.captures(candidate) {
            let hash = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let name = match name {
                Some(n) => Some(n),
                None => match version.is_some() && path.is_empty() == false {
                    true => Some(path),
                    false => None,
                },
            };
            return Self::new(&format!("{}{}", IPFS_SCHEME, hash), None, name);
        }
        if path.is_empty() == true {
            return Err(parse_err("missing source location"));
        }
        Self::new(path, version, name)
    }

    pub fn get_location(&self) -> &str {
        &self.location
    }

    pub fn get_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get_source(&self) -> &Source {
        &self.source
    }

    pub fn is_git(&self) -> bool {
        self.source == Source::Git
    }

    pub fn is_ipfs(&self) -> bool {
        match self.source {
            Source::Ipfs(_) => true,
            _ => false,
        }
    }
}

/// Checks that `name` can be used as a single directory under the package directory.
pub fn verify_name(name: &str) -> Result<(), Error> {
    match filesystem::is_single_component(name) {
        true => Ok(()),
        false => Err(Error::InvalidName(
            name.to_string(),
            LastError(String::from("name must be a single, plain path component")),
        )),
    }
}

impl Display for DependencyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Source::Ipfs(_) => match &self.name {
                Some(n) => write!(f, "{}@{}", n, self.location),
                None => write!(f, "{}", self.location),
            },
            _ => match &self.version {
                Some(v) => write!(f, "{}@{}", self.location, v),
                None => write!(f, "{}", self.location),
            },
        }
    }
}

impl FromStr for DependencyDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}
