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

use super::helps::install;
use crate::core::config::Config;
use crate::core::fetch::Fetcher;
use crate::core::installer::Installer;
use crate::core::ipfs::IpfsSettings;
use crate::core::specifier::DependencyDescriptor;
use crate::util::environment::{DEFAULT_ENVIRONMENT, PACKAGE_DIR};
use std::env;

use cliproc::{cli, proc, stage::*};
use cliproc::{Arg, Cli, Command, Help};

#[derive(Debug, PartialEq)]
pub struct Install {
    specifier: String,
    name: Option<String>,
    env: Option<String>,
    verbose: bool,
}

impl Command for Install {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(install::HELP))?;
        Ok(Install {
            // Flags
            verbose: cli.check(Arg::flag("verbose"))?,
            // Options
            name: cli.get(Arg::option("name").value("name"))?,
            env: cli.get(Arg::option("env").value("name"))?,
            // Positionals
            specifier: cli.require(Arg::positional("specifier"))?,
        })
    }

    fn execute(self) -> proc::Result {
        let dep = DependencyDescriptor::parse(&self.specifier, self.name.as_deref())?;

        // only ipfs sources need the settings file
        let settings = match dep.is_ipfs() {
            true => Config::load()?.ipfs(self.env.as_deref().unwrap_or(DEFAULT_ENVIRONMENT))?,
            false => IpfsSettings::default(),
        };
        let fetcher = Fetcher::select(&dep, &settings, self.verbose)?;

        let packages = env::current_dir()?.join(PACKAGE_DIR);
        Installer::new(dep, packages).install(&fetcher)?;
        Ok(())
    }
}
