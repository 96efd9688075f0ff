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

use colored::Colorize;
use std::{fmt::Display, path::PathBuf};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("failed to parse dependency {0:?}: {1}")]
    Parse(String, LastError),
    #[error("git dependency {0:?} must be pinned to a commit{1}")]
    MissingVersion(String, Hint),
    #[error("version {1:?} of git dependency {0:?} is not a hexadecimal commit hash{2}")]
    InvalidCommit(String, String, Hint),
    #[error("package {0:?} is already installed{1}")]
    AlreadyInstalled(String, Hint),
    #[error("package directory {0:?} is not writable and could not be created: {1}")]
    PathAccess(PathBuf, LastError),
    #[error("failed to reach ipfs at {0}:{1} while listing {2:?}: {3}{4}")]
    IpfsConnection(String, u16, String, LastError, Hint),
    #[error("ipfs node {0:?} has unknown type {1:?} while pulling {2:?}")]
    UnknownNodeType(String, String, String),
    #[error("ipfs node {0:?} has unsafe link name {1:?} while pulling {2:?}")]
    InvalidNodeName(String, String, String),
    #[error("package {0:?} is installed and usable at {1:?}, but the scratch directory {2:?} could not be removed: {3}{4}")]
    Cleanup(String, PathBuf, PathBuf, LastError, Hint),
    #[error("source {0:?} is neither a git repository nor an ipfs address{1}")]
    UnrecognizedSource(String, Hint),
    #[error("invalid package name {0:?}: {1}")]
    InvalidName(String, LastError),
    #[error("failed to fetch {0:?}: {1}")]
    FetchFailed(String, LastError),
    #[error("failed to read package name from manifest {0:?}: {1}")]
    ManifestUnreadable(PathBuf, LastError),
    #[error("no environment named {0:?} in configuration {1:?}")]
    UnknownEnvironment(String, PathBuf),
    #[error("failed to read configuration {0:?}: {1}")]
    ConfigUnreadable(PathBuf, LastError),
}

#[derive(Debug, PartialEq)]
pub struct LastError(pub String);

impl Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Error::lowerize(self.0.to_string()))
    }
}

impl Error {
    pub fn lowerize(s: String) -> String {
        // get the first word
        let first_word = match s.split_whitespace().next() {
            Some(w) => w,
            None => return s,
        };
        // retain punctuation if the first word is all-caps and longer than 1 character
        if first_word.len() > 1
            && first_word
                .chars()
                .find(|c| c.is_ascii_lowercase() == true)
                .is_none()
        {
            s.to_string()
        } else {
            s.char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect()
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    PinCommit,
    RemoveInstalled(PathBuf),
    IpfsSettings,
    ManualCleanup(PathBuf),
    SourceForms,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::PinCommit => {
                "append the commit to the repository as \"<url>.git@<commit>\"".to_string()
            }
            Self::RemoveInstalled(path) => format!(
                "remove {:?} to reinstall the package",
                path
            ),
            Self::IpfsSettings => {
                "check the ipfs host and port in your .dapplerc and verify the supplied hash"
                    .to_string()
            }
            Self::ManualCleanup(path) => format!("delete {:?} manually", path),
            Self::SourceForms => {
                "supply \"<url>.git@<commit>\" or \"[name@]ipfs://<hash>\"".to_string()
            }
        };
        write!(f, "\n\n{}: {}", "hint".green(), Error::lowerize(message))
    }
}
