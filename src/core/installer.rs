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

//! The installation process for a single dependency:
//! 1. Refuse early if a known name is already present in the package directory
//! 2. Make sure the package directory exists and can be written
//! 3. Pull straight into `<packages>/<name>` when the name is known, or
//!    into a scratch directory when it is not
//! 4. For scratch installs, read the name from the fetched manifest, copy the
//!    tree into `<packages>/<name>` and delete the scratch directory
//!
//! Nothing here is transactional: two installs of the same name running at
//! once can both pass step 1 before either writes its result.

use crate::core::fetch::Fetch;
use crate::core::manifest::Manifest;
use crate::core::specifier::{self, DependencyDescriptor};
use crate::error::{Error, Hint, LastError};
use crate::util::environment::SCRATCH_SUBPATH;
use crate::util::filesystem;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Stage {
    NotStarted,
    PackageDirectoryReady,
    DirectInstall,
    ScratchInstall,
    Installed,
    Failed,
}

/// Deletes a scratch directory.
pub type RemoveDir = fn(&Path) -> std::io::Result<()>;

fn remove_scratch(path: &Path) -> std::io::Result<()> {
    fs::remove_dir_all(path)
}

#[derive(Debug)]
pub struct Installer {
    dep: DependencyDescriptor,
    packages: PathBuf,
    scratch_root: PathBuf,
    token: u64,
    scratch: Option<PathBuf>,
    installed_at: Option<PathBuf>,
    stage: Stage,
    remove_dir: RemoveDir,
}

impl Installer {
    /// Prepares to install `dep` into the package directory `packages`.
    pub fn new(dep: DependencyDescriptor, packages: PathBuf) -> Self {
        Self {
            dep: dep,
            packages: packages,
            scratch_root: std::env::temp_dir().join(SCRATCH_SUBPATH),
            token: Self::random_token(),
            scratch: None,
            installed_at: None,
            stage: Stage::NotStarted,
            remove_dir: remove_scratch,
        }
    }

    /// Sets the directory under which scratch directories are created.
    pub fn scratch_root(mut self, root: PathBuf) -> Self {
        self.scratch_root = root;
        self
    }

    /// Replaces how scratch directories are deleted.
    #[cfg(test)]
    fn remove_dir(mut self, f: RemoveDir) -> Self {
        self.remove_dir = f;
        self
    }

    fn random_token() -> u64 {
        let bits = Uuid::new_v4().as_u128();
        (bits as u64) ^ ((bits >> 64) as u64)
    }

    pub fn get_installed_at(&self) -> Option<&PathBuf> {
        self.installed_at.as_ref()
    }

    pub fn get_scratch(&self) -> Option<&PathBuf> {
        self.scratch.as_ref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Runs the installation, returning the final install path.
    ///
    /// Any failure leaves the installer in [Stage::Failed], except a cleanup
    /// failure: it is raised after the package is already in place, so the
    /// stage is [Stage::Installed] and [Installer::get_installed_at] is set.
    pub fn install(&mut self, fetch: &dyn Fetch) -> Result<PathBuf, Error> {
        let result = self.run(fetch);
        self.stage = match &result {
            Ok(_) | Err(Error::Cleanup(..)) => Stage::Installed,
            Err(_) => Stage::Failed,
        };
        result
    }

    fn run(&mut self, fetch: &dyn Fetch) -> Result<PathBuf, Error> {
        // check before touching the network
        if let Some(name) = self.dep.get_name() {
            self.verify_not_installed(name)?;
        }
        self.prepare_packages()?;
        self.stage = Stage::PackageDirectoryReady;

        match self.dep.get_name().map(|n| n.to_string()) {
            Some(name) => self.direct_install(&name, fetch),
            None => self.scratch_install(fetch),
        }
    }

    fn verify_not_installed(&self, name: &str) -> Result<(), Error> {
        let dest = self.packages.join(name);
        match filesystem::is_readable(&dest) {
            true => Err(Error::AlreadyInstalled(
                name.to_string(),
                Hint::RemoveInstalled(dest),
            )),
            false => Ok(()),
        }
    }

    /// Ensures the package directory exists and can be written to.
    fn prepare_packages(&self) -> Result<(), Error> {
        if filesystem::is_writable_dir(&self.packages) == true {
            return Ok(());
        }
        fs::create_dir_all(&self.packages)
            .map_err(|e| Error::PathAccess(self.packages.clone(), LastError(e.to_string())))?;
        match filesystem::is_writable_dir(&self.packages) {
            true => Ok(()),
            false => Err(Error::PathAccess(
                self.packages.clone(),
                LastError(String::from("directory is read-only")),
            )),
        }
    }

    fn direct_install(&mut self, name: &str, fetch: &dyn Fetch) -> Result<PathBuf, Error> {
        self.stage = Stage::DirectInstall;
        let dest = self.packages.join(name);
        println!("info: installing {} into {} ...", self.dep, filesystem::into_std_str(dest.clone()));
        if let Err(e) = fetch.pull(&dest) {
            Self::warn_partial(&dest);
            return Err(e);
        }
        println!("info: installed {} at {}", name, filesystem::into_std_str(dest.clone()));
        self.installed_at = Some(dest.clone());
        Ok(dest)
    }

    fn scratch_install(&mut self, fetch: &dyn Fetch) -> Result<PathBuf, Error> {
        self.stage = Stage::ScratchInstall;
        let scratch = self.scratch_dir()?;
        println!("info: fetching {} to resolve its name ...", self.dep);

        let resolved = Self::resolve_name(&scratch, fetch)
            .and_then(|n| self.verify_not_installed(&n).map(|_| n));
        let name = match resolved {
            Ok(n) => n,
            Err(e) => {
                self.discard_scratch(&scratch);
                return Err(e);
            }
        };
        println!("info: resolved package name {}", name);

        let dest = self.packages.join(&name);
        if let Err(e) = filesystem::copy_contents(&scratch, &dest) {
            Self::warn_partial(&dest);
            self.discard_scratch(&scratch);
            return Err(Error::FetchFailed(
                self.dep.to_string(),
                LastError(format!("failed to copy {:?} to {:?}: {}", scratch, dest, e)),
            ));
        }
        println!("info: installed {} at {}", name, filesystem::into_std_str(dest.clone()));
        self.installed_at = Some(dest.clone());

        // the package is in place from here on
        (self.remove_dir)(&scratch).map_err(|e| {
            Error::Cleanup(
                name.clone(),
                dest.clone(),
                scratch.clone(),
                LastError(e.to_string()),
                Hint::ManualCleanup(scratch.clone()),
            )
        })?;
        self.scratch = None;
        Ok(dest)
    }

    /// Pulls into `scratch` and reads the package name from its manifest.
    fn resolve_name(scratch: &Path, fetch: &dyn Fetch) -> Result<String, Error> {
        fetch.pull(scratch)?;
        let name = Manifest::read_name(scratch)?;
        specifier::verify_name(&name)?;
        Ok(name)
    }

    /// Removes an unused scratch directory after an aborted install.
    fn discard_scratch(&mut self, scratch: &Path) {
        match (self.remove_dir)(scratch) {
            Ok(_) => self.scratch = None,
            Err(e) => Self::warn(&format!(
                "failed to remove scratch directory {:?}: {}",
                scratch, e
            )),
        }
    }

    /// Returns this installer's scratch directory, creating it on first use.
    pub fn scratch_dir(&mut self) -> Result<PathBuf, Error> {
        if let Some(p) = &self.scratch {
            if p.exists() == true {
                return Ok(p.clone());
            }
        }
        let path = self.scratch_root.join(self.token.to_string());
        fs::create_dir_all(&path)
            .map_err(|e| Error::PathAccess(path.clone(), LastError(e.to_string())))?;
        self.scratch = Some(path.clone());
        Ok(path)
    }

    fn warn_partial(dest: &Path) {
        if dest.exists() == true {
            Self::warn(&format!(
                "partial contents remain at {:?} and must be removed before retrying",
                dest
            ));
        }
    }

    fn warn(message: &str) {
        eprintln!("{}: {}", "warning".yellow(), message);
    }
}
