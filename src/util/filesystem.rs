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

use crate::util::anyerror::Fault;
use std::path::{Component, Path, PathBuf};

/// Checks if `path` is an existing directory that can be written into.
pub fn is_writable_dir<P>(path: &P) -> bool
where
    P: AsRef<Path>,
{
    match std::fs::metadata(path) {
        Ok(m) => m.is_dir() == true && m.permissions().readonly() == false,
        Err(_) => false,
    }
}

/// Checks if `path` can currently be read (file or directory).
pub fn is_readable<P>(path: &P) -> bool
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() == true {
        std::fs::read_dir(path).is_ok()
    } else {
        std::fs::File::open(path).is_ok()
    }
}

/// Copies everything inside `src` into `dest`, creating `dest` if needed.
///
/// The directory `src` itself is not nested under `dest`.
pub fn copy_contents(src: &Path, dest: &Path) -> Result<(), Fault> {
    std::fs::create_dir_all(&dest)?;
    let mut from_paths = Vec::new();
    for entry in std::fs::read_dir(src)? {
        from_paths.push(entry?.path());
    }
    let options = fs_extra::dir::CopyOptions::new();
    // copy rather than rename because scratch may live on another filesystem
    fs_extra::copy_items(&from_paths, &dest, &options)?;
    Ok(())
}

/// Verifies `name` can be used as exactly one directory entry.
pub fn is_single_component(name: &str) -> bool {
    if name.is_empty() == true || name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut parts = Path::new(name).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(_)), None) => true,
        _ => false,
    }
}

/// Displays a path with forward slashes for consistent output.
pub fn into_std_str(p: PathBuf) -> String {
    p.display().to_string().replace('\\', "/")
}
