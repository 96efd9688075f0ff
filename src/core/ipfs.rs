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

//! Access to an IPFS node's HTTP API and reconstruction of a content-addressed
//! tree onto the local filesystem.

use crate::error::{Error, Hint, LastError};
use crate::util::anyerror::{last_error, AnyError, Fault};
use crate::util::filesystem;
use curl::easy::Easy;
use serde_derive::Deserialize;
use std::fs;
use std::path::Path;

const RESPONSE_OKAY: u32 = 200;

/// Unixfs type codes reported by `ls`.
const TYPE_DIRECTORY: i64 = 1;
const TYPE_FILE: i64 = 2;

/// Host and port of an IPFS API endpoint.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpfsSettings {
    pub host: String,
    pub port: u16,
}

impl Default for IpfsSettings {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 5001,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum NodeKind {
    Dir,
    File,
    Other(String),
}

impl NodeKind {
    fn from_code(code: i64) -> Self {
        match code {
            TYPE_DIRECTORY => Self::Dir,
            TYPE_FILE => Self::File,
            _ => Self::Other(code.to_string()),
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir => write!(f, "dir"),
            Self::File => write!(f, "file"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A named reference from a directory node to one of its children.
#[derive(Debug, PartialEq, Clone)]
pub struct IpfsLink {
    pub name: String,
    pub hash: String,
    pub kind: NodeKind,
}

impl IpfsLink {
    pub fn new(name: &str, hash: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            hash: hash.to_string(),
            kind: kind,
        }
    }
}

/// The two reads needed to walk a tree.
pub trait IpfsApi {
    /// Lists the children of the directory node `hash`.
    fn ls(&self, hash: &str) -> Result<Vec<IpfsLink>, Fault>;

    /// Reads the full contents of the file node `hash`.
    fn cat(&self, hash: &str) -> Result<Vec<u8>, Fault>;
}

#[derive(Debug, Deserialize)]
struct LsResponse {
    #[serde(rename = "Objects")]
    objects: Vec<LsObject>,
}

#[derive(Debug, Deserialize)]
struct LsObject {
    #[serde(rename = "Links", default)]
    links: Vec<LsLink>,
}

#[derive(Debug, Deserialize)]
struct LsLink {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Type")]
    kind: i64,
}

/// Blocking client for the `/api/v0` HTTP interface of an IPFS daemon.
#[derive(Debug, PartialEq, Clone)]
pub struct IpfsHttp {
    settings: IpfsSettings,
    verbose: bool,
}

impl IpfsHttp {
    pub fn new(settings: IpfsSettings) -> Self {
        Self {
            settings: settings,
            verbose: false,
        }
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    fn endpoint(&self, call: &str, hash: &str) -> String {
        format!(
            "http://{}:{}/api/v0/{}?arg={}",
            self.settings.host, self.settings.port, call, hash
        )
    }

    /// Sends an empty POST to `url` and returns the response body.
    fn request(&self, url: &str) -> Result<Vec<u8>, Fault> {
        if self.verbose == true {
            println!("info: requesting {}", url);
        }
        let mut body_bytes = Vec::new();
        let mut easy = Easy::new();
        easy.url(&url)?;
        easy.post(true)?;
        easy.post_field_size(0)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body_bytes.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let rc = easy.response_code()?;
        if rc != RESPONSE_OKAY {
            return Err(AnyError(format!(
                "request {} failed with response code {}: {}",
                url,
                rc,
                String::from_utf8_lossy(&body_bytes).trim()
            )))?;
        }
        Ok(body_bytes)
    }
}

impl IpfsApi for IpfsHttp {
    fn ls(&self, hash: &str) -> Result<Vec<IpfsLink>, Fault> {
        let body = self.request(&self.endpoint("ls", hash))?;
        parse_ls(&body)
    }

    fn cat(&self, hash: &str) -> Result<Vec<u8>, Fault> {
        self.request(&self.endpoint("cat", hash))
    }
}

/// Decodes the JSON returned by `ls` into links of the first listed object.
fn parse_ls(body: &[u8]) -> Result<Vec<IpfsLink>, Fault> {
    let response: LsResponse = serde_json::from_slice(body)?;
    let object = match response.objects.into_iter().next() {
        Some(o) => o,
        None => return Err(AnyError::from("ls response contains no objects"))?,
    };
    Ok(object
        .links
        .into_iter()
        .map(|l| IpfsLink {
            name: l.name,
            hash: l.hash,
            kind: NodeKind::from_code(l.kind),
        })
        .collect())
}

/// Rebuilds the tree rooted at `root` onto the filesystem.
///
/// The walk is depth-first and sequential. A failure midway leaves whatever
/// was already written in place.
pub struct TreeWalk<'a> {
    api: &'a dyn IpfsApi,
    root: &'a str,
}

impl<'a> TreeWalk<'a> {
    pub fn new(api: &'a dyn IpfsApi, root: &'a str) -> Self {
        Self { api: api, root: root }
    }

    /// Creates `target` for the directory `hash` whose children are `links`.
    pub fn write_dir(&self, hash: &str, links: Vec<IpfsLink>, target: &Path) -> Result<(), Error> {
        fs::create_dir_all(target)
            .map_err(|e| self.node_failed(hash, LastError(e.to_string())))?;
        for link in links {
            if filesystem::is_single_component(&link.name) == false {
                return Err(Error::InvalidNodeName(
                    link.hash,
                    link.name,
                    self.root.to_string(),
                ));
            }
            self.write_node(&link, &target.join(&link.name))?;
        }
        Ok(())
    }

    fn write_node(&self, link: &IpfsLink, target: &Path) -> Result<(), Error> {
        match &link.kind {
            NodeKind::Dir => {
                let children = self
                    .api
                    .ls(&link.hash)
                    .map_err(|e| self.node_failed(&link.hash, last_error(e)))?;
                self.write_dir(&link.hash, children, target)
            }
            NodeKind::File => {
                let contents = self
                    .api
                    .cat(&link.hash)
                    .map_err(|e| self.node_failed(&link.hash, last_error(e)))?;
                fs::write(target, contents)
                    .map_err(|e| self.node_failed(&link.hash, LastError(e.to_string())))
            }
            NodeKind::Other(kind) => Err(Error::UnknownNodeType(
                link.hash.clone(),
                kind.clone(),
                self.root.to_string(),
            )),
        }
    }

    fn node_failed(&self, hash: &str, e: LastError) -> Error {
        Error::FetchFailed(
            format!("{}{} (node {})", crate::core::specifier::IPFS_SCHEME, self.root, hash),
            e,
        )
    }
}

/// Builds the error for a failed connectivity probe.
pub fn connection_error(settings: &IpfsSettings, root: &str, e: Fault) -> Error {
    Error::IpfsConnection(
        settings.host.clone(),
        settings.port,
        root.to_string(),
        last_error(e),
        Hint::IpfsSettings,
    )
}

#[cfg(test)]
pub mod test {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// An in-memory content-addressed store.
    pub struct MemoryIpfs {
        pub dirs: HashMap<String, Vec<IpfsLink>>,
        pub files: HashMap<String, Vec<u8>>,
        pub calls: RefCell<Vec<String>>,
    }

    impl MemoryIpfs {
        pub fn new() -> Self {
            Self {
                dirs: HashMap::new(),
                files: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn dir(mut self, hash: &str, links: Vec<IpfsLink>) -> Self {
            self.dirs.insert(hash.to_string(), links);
            self
        }

        pub fn file(mut self, hash: &str, contents: &str) -> Self {
            self.files.insert(hash.to_string(), contents.as_bytes().to_vec());
            self
        }

        /// root(dir) -> {a.txt(file, "X"), sub(dir) -> {b.txt(file, "Y")}}
        pub fn sample() -> Self {
            Self::new()
                .dir(
                    "QmRoot",
                    vec![
                        IpfsLink::new("a.txt", "QmA", NodeKind::File),
                        IpfsLink::new("sub", "QmSub", NodeKind::Dir),
                    ],
                )
                .dir("QmSub", vec![IpfsLink::new("b.txt", "QmB", NodeKind::File)])
                .file("QmA", "X")
                .file("QmB", "Y")
        }
    }

    impl IpfsApi for MemoryIpfs {
        fn ls(&self, hash: &str) -> Result<Vec<IpfsLink>, Fault> {
            self.calls.borrow_mut().push(format!("ls {}", hash));
            match self.dirs.get(hash) {
                Some(links) => Ok(links.clone()),
                None => Err(AnyError(format!("no directory {}", hash)))?,
            }
        }

        fn cat(&self, hash: &str) -> Result<Vec<u8>, Fault> {
            self.calls.borrow_mut().push(format!("cat {}", hash));
            match self.files.get(hash) {
                Some(bytes) => Ok(bytes.clone()),
                None => Err(AnyError(format!("no file {}", hash)))?,
            }
        }
    }

    #[test]
    fn parse_ls_response() {
        let body = r#"{"Objects":[{"Hash":"QmRoot","Links":[
            {"Name":"a.txt","Hash":"QmA","Size":1,"Type":2,"Target":""},
            {"Name":"sub","Hash":"QmSub","Size":0,"Type":1,"Target":""},
            {"Name":"link","Hash":"QmL","Size":0,"Type":4,"Target":"a.txt"}
        ]}]}"#;
        let links = parse_ls(body.as_bytes()).unwrap();
        assert_eq!(
            links,
            vec![
                IpfsLink::new("a.txt", "QmA", NodeKind::File),
                IpfsLink::new("sub", "QmSub", NodeKind::Dir),
                IpfsLink::new("link", "QmL", NodeKind::Other(String::from("4"))),
            ]
        );
        assert!(parse_ls(br#"{"Objects":[]}"#).is_err());
        assert!(parse_ls(b"not json").is_err());
    }

    #[test]
    fn endpoint_format() {
        let client = IpfsHttp::new(IpfsSettings {
            host: String::from("ipfs.example"),
            port: 5002,
        });
        assert_eq!(
            client.endpoint("ls", "QmRoot"),
            "http://ipfs.example:5002/api/v0/ls?arg=QmRoot"
        );
    }

    #[test]
    fn walk_sample_tree() {
        let api = MemoryIpfs::sample();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("root");
        let walk = TreeWalk::new(&api, "QmRoot");
        let links = api.ls("QmRoot").unwrap();
        walk.write_dir("QmRoot", links, &target).unwrap();

        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "X");
        assert_eq!(fs::read_to_string(target.join("sub/b.txt")).unwrap(), "Y");
        // depth-first, in listing order
        assert_eq!(
            api.calls.borrow().clone(),
            vec!["ls QmRoot", "cat QmA", "ls QmSub", "cat QmB"]
        );
    }

    #[test]
    fn walk_rejects_unsafe_names() {
        let api = MemoryIpfs::new()
            .dir("QmRoot", vec![IpfsLink::new("..", "QmUp", NodeKind::Dir)]);
        let dir = tempfile::tempdir().unwrap();
        let walk = TreeWalk::new(&api, "QmRoot");
        match walk.write_dir("QmRoot", api.ls("QmRoot").unwrap(), dir.path()) {
            Err(Error::InvalidNodeName(hash, name, root)) => {
                assert_eq!(hash, "QmUp");
                assert_eq!(name, "..");
                assert_eq!(root, "QmRoot");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
