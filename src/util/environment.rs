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

/// Overrides the location of the settings file.
pub const DAPPLERC: &str = "DAPPLERC";

/// Settings file name under the user's home directory.
pub const DAPPLERC_FILE: &str = ".dapplerc";

/// Directory (relative to the working directory) holding installed packages.
pub const PACKAGE_DIR: &str = "dapple_packages";

/// Subpath under the OS temporary directory where scratch installs are staged.
pub const SCRATCH_SUBPATH: &str = "dapple/packages";

/// Environment used to select settings when none is requested.
pub const DEFAULT_ENVIRONMENT: &str = "live";
