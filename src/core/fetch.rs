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

//! Fetch strategies materialize a dependency's content into an empty directory.

use crate::core::extgit::ExtGit;
use crate::core::ipfs::{self, IpfsApi, IpfsHttp, IpfsSettings, TreeWalk};
use crate::core::specifier::{DependencyDescriptor, Source};
use crate::error::{Error, Hint, LastError};
use crate::util::anyerror::last_error;
use fancy_regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static COMMIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9a-f]+$").expect("valid regex"));

/// The capability shared by every fetch strategy.
pub trait Fetch {
    /// Places the dependency's content at `dest`.
    ///
    /// Failures are not rolled back: `dest` keeps whatever the last successful
    /// step produced.
    fn pull(&self, dest: &Path) -> Result<(), Error>;
}

/// Pulls a repository pinned to one commit.
#[derive(Debug, PartialEq)]
pub struct GitFetch {
    url: String,
    commit: Option<String>,
    git: ExtGit,
}

impl GitFetch {
    pub fn new(url: &str, commit: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            commit: commit.map(|c| c.to_string()),
            git: ExtGit::new(),
        }
    }

    /// Replaces the git executable used for every step.
    pub fn git(mut self, git: ExtGit) -> Self {
        self.git = git;
        self
    }

    /// Verifies the pinned commit before any process is spawned.
    fn verify_commit(&self) -> Result<&str, Error> {
        let commit = match self.commit.as_deref().filter(|c| c.is_empty() == false) {
            Some(c) => c,
            None => return Err(Error::MissingVersion(self.url.clone(), Hint::PinCommit)),
        };
        match COMMIT_HASH.is_match(commit) {
            Ok(true) => Ok(commit),
            _ => Err(Error::InvalidCommit(
                self.url.clone(),
                commit.to_string(),
                Hint::PinCommit,
            )),
        }
    }
}

impl Fetch for GitFetch {
    fn pull(&self, dest: &Path) -> Result<(), Error> {
        let commit = self.verify_commit()?;
        let step_failed = |step: &str, e| {
            Error::FetchFailed(
                format!("{}@{}", self.url, commit),
                LastError(format!("git {} {}", step, last_error(e))),
            )
        };

        println!("info: cloning {} ...", self.url);
        self.git
            .clone(&self.url, dest)
            .map_err(|e| step_failed("clone", e))?;

        let repo = ExtGit::new()
            .command(Some(self.git.get_command().to_string()))
            .verbose(self.git.is_verbose())
            .path(dest.to_path_buf());
        println!("info: checking out commit {} ...", commit);
        repo.reset_hard(commit)
            .map_err(|e| step_failed("reset", e))?;
        repo.submodule_init()
            .map_err(|e| step_failed("submodule init", e))?;
        repo.submodule_update()
            .map_err(|e| step_failed("submodule update", e))?;
        Ok(())
    }
}

/// Pulls a content-addressed tree from an IPFS node.
pub struct IpfsFetch {
    hash: String,
    settings: IpfsSettings,
    api: Box<dyn IpfsApi>,
}

impl IpfsFetch {
    /// Fetches `hash` over the HTTP API described by `settings`.
    pub fn new(hash: &str, settings: IpfsSettings, verbose: bool) -> Self {
        Self {
            hash: hash.to_string(),
            api: Box::new(IpfsHttp::new(settings.clone()).verbose(verbose)),
            settings: settings,
        }
    }

    /// Fetches `hash` through a caller-provided API.
    pub fn with_api(hash: &str, settings: IpfsSettings, api: Box<dyn IpfsApi>) -> Self {
        Self {
            hash: hash.to_string(),
            settings: settings,
            api: api,
        }
    }

    pub fn get_hash(&self) -> &str {
        &self.hash
    }
}

impl Fetch for IpfsFetch {
    fn pull(&self, dest: &Path) -> Result<(), Error> {
        // probe the endpoint before anything is written
        let links = self
            .api
            .ls(&self.hash)
            .map_err(|e| ipfs::connection_error(&self.settings, &self.hash, e))?;

        println!(
            "info: pulling ipfs://{} from {}:{} ...",
            self.hash, self.settings.host, self.settings.port
        );
        TreeWalk::new(self.api.as_ref(), &self.hash).write_dir(&self.hash, links, dest)
    }
}

/// The fetch strategy chosen for a descriptor's source shape.
pub enum Fetcher {
    Git(GitFetch),
    Ipfs(IpfsFetch),
}

impl Fetcher {
    /// Selects the strategy for `dep`.
    ///
    /// `settings` is only consulted for IPFS sources.
    pub fn select(
        dep: &DependencyDescriptor,
        settings: &IpfsSettings,
        verbose: bool,
    ) -> Result<Self, Error> {
        match dep.get_source() {
            Source::Git => Ok(Self::Git(
                GitFetch::new(dep.get_location(), dep.get_version())
                    .git(ExtGit::new().verbose(verbose)),
            )),
            Source::Ipfs(hash) => Ok(Self::Ipfs(IpfsFetch::new(hash, settings.clone(), verbose))),
            Source::Unknown => Err(Error::UnrecognizedSource(
                dep.get_location().to_string(),
                Hint::SourceForms,
            )),
        }
    }
}

impl Fetch for Fetcher {
    fn pull(&self, dest: &Path) -> Result<(), Error> {
        match self {
            Self::Git(g) => g.pull(dest),
            Self::Ipfs(i) => i.pull(dest),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::ipfs::test::MemoryIpfs;
    use crate::util::anyerror::{AnyError, Fault};
    use crate::core::ipfs::{IpfsLink, NodeKind};
    use std::fs;

    fn unreachable_git() -> ExtGit {
        ExtGit::new().command(Some(String::from("dapple-no-such-git-executable")))
    }

    #[test]
    fn invalid_commit_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg");
        let fetch = GitFetch::new("repo.git", Some("not-hex!!")).git(unreachable_git());
        match fetch.pull(&dest) {
            Err(Error::InvalidCommit(url, commit, _)) => {
                assert_eq!(url, "repo.git");
                assert_eq!(commit, "not-hex!!");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(dest.exists(), false);
    }

    #[test]
    fn missing_commit_rechecked() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = GitFetch::new("repo.git", None).git(unreachable_git());
        match fetch.pull(dir.path()) {
            Err(Error::MissingVersion(url, _)) => assert_eq!(url, "repo.git"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn commit_case_insensitive() {
        let fetch = GitFetch::new("repo.git", Some("AbC123"));
        assert_eq!(fetch.verify_commit().unwrap(), "AbC123");
        let fetch = GitFetch::new("repo.git", Some("abcxyz"));
        assert!(fetch.verify_commit().is_err());
    }

    #[test]
    fn failed_clone_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = GitFetch::new("repo.git", Some("abc123")).git(unreachable_git());
        match fetch.pull(&dir.path().join("pkg")) {
            Err(Error::FetchFailed(what, e)) => {
                assert_eq!(what, "repo.git@abc123");
                assert!(e.0.starts_with("git clone"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn ipfs_reconstructs_exact_tree() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("root");
        let fetch = IpfsFetch::with_api(
            "QmRoot",
            IpfsSettings::default(),
            Box::new(MemoryIpfs::sample()),
        );
        fetch.pull(&dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "X");
        assert_eq!(fs::read_to_string(dest.join("sub/b.txt")).unwrap(), "Y");
        let mut top: Vec<String> = fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        top.sort();
        assert_eq!(top, vec!["a.txt", "sub"]);
        assert_eq!(fs::read_dir(dest.join("sub")).unwrap().count(), 1);
    }

    struct OfflineIpfs;

    impl IpfsApi for OfflineIpfs {
        fn ls(&self, _: &str) -> Result<Vec<IpfsLink>, Fault> {
            Err(AnyError::from("Connection refused"))?
        }

        fn cat(&self, _: &str) -> Result<Vec<u8>, Fault> {
            Err(AnyError::from("Connection refused"))?
        }
    }

    #[test]
    fn ipfs_probe_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("root");
        let fetch = IpfsFetch::with_api(
            "QmRoot",
            IpfsSettings {
                host: String::from("10.0.0.9"),
                port: 5001,
            },
            Box::new(OfflineIpfs),
        );
        match fetch.pull(&dest) {
            Err(Error::IpfsConnection(host, port, hash, e, hint)) => {
                assert_eq!(host, "10.0.0.9");
                assert_eq!(port, 5001);
                assert_eq!(hash, "QmRoot");
                assert_eq!(e, LastError(String::from("Connection refused")));
                assert_eq!(hint, Hint::IpfsSettings);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(dest.exists(), false);
    }

    #[test]
    fn ipfs_unknown_node_type() {
        let dir = tempfile::tempdir().unwrap();
        let api = MemoryIpfs::new().dir(
            "QmRoot",
            vec![IpfsLink::new("weird", "QmWeird", NodeKind::Other(String::from("5")))],
        );
        let fetch = IpfsFetch::with_api("QmRoot", IpfsSettings::default(), Box::new(api));
        match fetch.pull(&dir.path().join("root")) {
            Err(Error::UnknownNodeType(hash, kind, root)) => {
                assert_eq!(hash, "QmWeird");
                assert_eq!(kind, "5");
                assert_eq!(root, "QmRoot");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn select_by_source() {
        let settings = IpfsSettings::default();
        let dep = DependencyDescriptor::parse("repo.git@abc", None).unwrap();
        assert!(matches!(Fetcher::select(&dep, &settings, false), Ok(Fetcher::Git(_))));

        let dep = DependencyDescriptor::parse("@QmRoot", None).unwrap();
        match Fetcher::select(&dep, &settings, false) {
            Ok(Fetcher::Ipfs(i)) => assert_eq!(i.get_hash(), "QmRoot"),
            _ => panic!("expected ipfs fetcher"),
        }

        let dep = DependencyDescriptor::parse("some/path@1.0", None).unwrap();
        match Fetcher::select(&dep, &settings, false) {
            Err(Error::UnrecognizedSource(loc, _)) => assert_eq!(loc, "some/path"),
            _ => panic!("expected unrecognized source"),
        }
    }
}
