//! Test fixtures - Tomcat-shaped tarballs built in memory.

#![allow(dead_code)]

use md5::{Digest, Md5};

/// Files every fixture tarball carries, relative to the wrapper directory.
pub const TOMCAT_FILES: &[(&str, &str)] = &[
    ("LICENSE", "Apache License\n"),
    ("NOTICE", "Apache Tomcat\n"),
    ("bin/catalina.sh", "#!/bin/sh\nexec java org.apache.catalina.startup.Bootstrap \"$@\"\n"),
    ("conf/server.xml", "<Server port=\"8005\" shutdown=\"SHUTDOWN\"/>\n"),
    ("lib/catalina.jar", "PK\x03\x04"),
    ("webapps/ROOT/index.jsp", "<html>ROOT</html>\n"),
    ("webapps/examples/index.html", "<html>examples</html>\n"),
    ("webapps/docs/index.html", "<html>docs</html>\n"),
    ("webapps/manager/index.jsp", "<html>manager</html>\n"),
    ("webapps/host-manager/index.jsp", "<html>host-manager</html>\n"),
];

/// Gzipped tarball laid out like an Apache release:
/// everything under `apache-tomcat-<version>/`, with directory entries.
pub fn tomcat_tarball(version: &str) -> Vec<u8> {
    let wrapper = format!("apache-tomcat-{}", version);
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut dirs: Vec<String> = vec![format!("{}/", wrapper)];
    for (path, _) in TOMCAT_FILES {
        let mut parts: Vec<&str> = path.split('/').collect();
        parts.pop();
        let mut prefix = wrapper.clone();
        for part in parts {
            prefix = format!("{}/{}", prefix, part);
            let dir = format!("{}/", prefix);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }

    for dir in &dirs {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, dir, std::io::empty())
            .unwrap();
    }

    for (path, content) in TOMCAT_FILES {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(if path.ends_with(".sh") { 0o755 } else { 0o644 });
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", wrapper, path), content.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Lowercase hex MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Checksum document in the format mirrors publish.
pub fn checksum_document(digest: &str, file_name: &str) -> String {
    format!("{} *{}\n", digest, file_name)
}

/// Every path under `root` with file contents (symlinks as their target).
pub fn snapshot(root: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .to_string();
        let content = if entry.path_is_symlink() {
            std::fs::read_link(entry.path())
                .unwrap()
                .to_string_lossy()
                .as_bytes()
                .to_vec()
        } else if entry.file_type().is_file() {
            std::fs::read(entry.path()).unwrap()
        } else {
            Vec::new()
        };
        out.push((rel, content));
    }
    out
}
