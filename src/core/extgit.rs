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

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::util::anyerror::{AnyError, Fault};

/// A series of git commands necessary to run through subprocesses rather than libgit2 bindings.
#[derive(Debug, PartialEq)]
pub struct ExtGit {
    command: String,
    root: PathBuf,
    verbose: bool,
}

impl ExtGit {
    /// Creates an empty `ExtGit` struct.
    pub fn new() -> Self {
        Self {
            command: String::from("git"),
            root: PathBuf::new(),
            verbose: false,
        }
    }

    /// Sets the command for calling git through processes.
    ///
    /// By `s` is `None`, the command assumes git is on path and is simply `git`.
    pub fn command(mut self, s: Option<String>) -> Self {
        self.command = s.unwrap_or("git".to_string());
        self
    }

    /// Sets the directory from where to call `git`.
    pub fn path(mut self, p: PathBuf) -> Self {
        self.root = p;
        self
    }

    /// Echo each git invocation before it runs.
    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    pub fn get_command(&self) -> &str {
        &self.command
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Clones a repository `url` directly into `dest`.
    ///
    /// `dest` must either not exist or be an empty directory.
    pub fn clone(&self, url: &str, dest: &Path) -> Result<(), Fault> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("clone").arg(url).arg(dest);
        self.run(cmd)
    }

    /// Moves the working tree at `self.root` to exactly `commit`.
    ///
    /// Runs the command: `git reset --hard <commit>`.
    pub fn reset_hard(&self, commit: &str) -> Result<(), Fault> {
        let mut cmd = Command::new(&self.command);
        cmd.args(["reset", "--hard", commit]).current_dir(&self.root);
        self.run(cmd)
    }

    /// Runs the command: `git submodule init`.
    pub fn submodule_init(&self) -> Result<(), Fault> {
        let mut cmd = Command::new(&self.command);
        cmd.args(["submodule", "init"]).current_dir(&self.root);
        self.run(cmd)
    }

    /// Runs the command: `git submodule update --recursive`.
    pub fn submodule_update(&self) -> Result<(), Fault> {
        let mut cmd = Command::new(&self.command);
        cmd.args(["submodule", "update", "--recursive"])
            .current_dir(&self.root);
        self.run(cmd)
    }

    /// Spawns `cmd` and blocks until it exits.
    fn run(&self, mut cmd: Command) -> Result<(), Fault> {
        if self.verbose == true {
            println!(
                "info: running: {} {}",
                self.command,
                cmd.get_args()
                    .map(|a| a.to_string_lossy().to_string())
                    .collect::<Vec<String>>()
                    .join(" ")
            );
        }
        let status = cmd.status()?;
        match status.code() {
            Some(num) => {
                if num != 0 {
                    Err(AnyError(format!("exited with error code: {}", num)))?
                }
            }
            None => Err(AnyError(format!("terminated by signal")))?,
        };
        Ok(())
    }
}
