//! Package tarballs: cached download, integrity check and extraction.

use crate::error::{Result, TigoError};
use crate::io;
use crate::registry::{Dist, PackageInfo, Registry};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use sha1::Sha1;
use sha2::{Digest, Sha512};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

/// Cache location of a downloaded tarball: `<temp>/<prefix>_<version>.tgz`.
pub fn cache_path(temp_dir: &Path, prefix: &str, version: &str) -> PathBuf {
    temp_dir.join(format!("{prefix}_{version}.tgz"))
}

/// Subresource-integrity string (`sha512-<base64>`) of `bytes`.
pub fn sha512_integrity(bytes: &[u8]) -> String {
    format!("sha512-{}", STANDARD.encode(Sha512::digest(bytes)))
}

/// Hex sha1 of `bytes`, the form of the registry `shasum`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Compare a file against the checksums of a registry `dist` block.
///
/// The `sha512-` entry of `integrity` wins; without one the sha1 `shasum`
/// is compared. `None` means the registry gave neither.
pub fn verify(path: &Path, dist: &Dist) -> Result<Option<bool>> {
    let sha512 = dist
        .integrity
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .find(|entry| entry.starts_with("sha512-"));
    let shasum = dist.shasum.as_deref().filter(|s| !s.is_empty());
    if sha512.is_none() && shasum.is_none() {
        return Ok(None);
    }

    let bytes = std::fs::read(path)?;
    Ok(Some(match (sha512, shasum) {
        (Some(expected), _) => sha512_integrity(&bytes) == expected,
        (None, Some(expected)) => sha1_hex(&bytes).eq_ignore_ascii_case(expected),
        (None, None) => false,
    }))
}

/// Make sure the tarball for `info` sits in the cache with a matching
/// digest, downloading it when needed. Returns the cached path.
pub fn fetch(
    registry: &Registry,
    info: &PackageInfo,
    temp_dir: &Path,
    prefix: &str,
) -> Result<PathBuf> {
    let path = cache_path(temp_dir, prefix, &info.version);

    if path.is_file() && verify(&path, &info.dist)? == Some(true) {
        tracing::debug!(path = %path.display(), "reusing cached package");
        return Ok(path);
    }

    io::ensure_dir(temp_dir)?;
    registry.download(&info.dist.tarball, &path)?;
    match verify(&path, &info.dist)? {
        Some(true) => Ok(path),
        Some(false) => {
            let _ = std::fs::remove_file(&path);
            Err(TigoError::IntegrityMismatch(format!(
                "{}@{}",
                info.name, info.version
            )))
        }
        None => {
            tracing::warn!(
                "{}@{} has no checksum in the registry, skipping verification",
                info.name,
                info.version
            );
            Ok(path)
        }
    }
}

/// Extract a gzipped npm tarball into `dest`, dropping the leading
/// `package/` directory from every entry.
pub fn extract(tarball: &Path, dest: &Path) -> Result<usize> {
    io::ensure_dir(dest)?;
    let mut archive = Archive::new(GzDecoder::new(File::open(tarball)?));
    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let stripped: PathBuf = path.components().skip(1).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }
        if stripped
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            tracing::warn!(path = %path.display(), "skipping unsafe archive entry");
            continue;
        }
        let target = dest.join(&stripped);
        if let Some(parent) = target.parent() {
            io::ensure_dir(parent)?;
        }
        entry.unpack(&target)?;
        count += 1;
    }
    tracing::debug!(count, dest = %dest.display(), "extracted package");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn build_tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, body) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, body.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn integrity_matches_known_digest() {
        // sha512 of the empty input.
        assert_eq!(
            sha512_integrity(b""),
            "sha512-z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }

    #[test]
    fn sha1_matches_known_digest() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    fn dist(shasum: Option<&str>, integrity: Option<&str>) -> Dist {
        Dist {
            tarball: String::new(),
            shasum: shasum.map(str::to_string),
            integrity: integrity.map(str::to_string),
        }
    }

    #[test]
    fn verify_prefers_sha512_entry() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.tgz");
        std::fs::write(&file, b"abc").unwrap();
        let good = format!("sha1-ignored {}", sha512_integrity(b"abc"));
        assert_eq!(verify(&file, &dist(None, Some(&good))).unwrap(), Some(true));
        // a matching shasum does not rescue a wrong sha512
        let wrong = dist(Some(&sha1_hex(b"abc")), Some(&sha512_integrity(b"abd")));
        assert_eq!(verify(&file, &wrong).unwrap(), Some(false));
    }

    #[test]
    fn verify_falls_back_to_shasum() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.tgz");
        std::fs::write(&file, b"abc").unwrap();
        let upper = sha1_hex(b"abc").to_uppercase();
        assert_eq!(
            verify(&file, &dist(Some(&upper), Some("sha1-xyz"))).unwrap(),
            Some(true)
        );
        assert_eq!(
            verify(&file, &dist(Some(&sha1_hex(b"abd")), None)).unwrap(),
            Some(false)
        );
        assert_eq!(verify(&file, &dist(None, None)).unwrap(), None);
        assert_eq!(verify(&file, &dist(Some(""), Some(""))).unwrap(), None);
    }

    #[test]
    fn extract_strips_package_prefix() {
        let dir = TempDir::new().unwrap();
        let tgz = dir.path().join("server.tgz");
        std::fs::write(
            &tgz,
            build_tarball(&[
                ("package/package.json", "{\"name\":\"tigo\"}"),
                ("package/server.js", "require('./app');"),
                ("package/lib/app.js", "module.exports = {};"),
            ]),
        )
        .unwrap();
        let dest = dir.path().join("out");
        assert_eq!(extract(&tgz, &dest).unwrap(), 3);
        assert!(dest.join("server.js").is_file());
        assert_eq!(
            std::fs::read_to_string(dest.join("lib/app.js")).unwrap(),
            "module.exports = {};"
        );
        assert!(!dest.join("package").exists());
    }

    fn info(server: &mockito::Server, integrity: String) -> PackageInfo {
        PackageInfo {
            name: "tigo".to_string(),
            version: "0.4.2".to_string(),
            dist: Dist {
                tarball: format!("{}/tigo/-/tigo-0.4.2.tgz", server.url()),
                shasum: None,
                integrity: Some(integrity),
            },
        }
    }

    fn shasum_only(server: &mockito::Server, shasum: String) -> PackageInfo {
        let mut info = info(server, String::new());
        info.dist.integrity = None;
        info.dist.shasum = Some(shasum);
        info
    }

    #[test]
    fn fetch_downloads_then_reuses_cache() {
        let body = build_tarball(&[("package/server.js", "")]);
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/tigo/-/tigo-0.4.2.tgz")
            .with_status(200)
            .with_body(body.clone())
            .expect(1)
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let temp = TempDir::new().unwrap();
        let info = info(&server, sha512_integrity(&body));

        let first = fetch(&reg, &info, temp.path(), "server").unwrap();
        assert_eq!(first, temp.path().join("server_0.4.2.tgz"));
        let second = fetch(&reg, &info, temp.path(), "server").unwrap();
        assert_eq!(first, second);
        mock.assert();
    }

    #[test]
    fn fetch_rejects_mismatched_digest() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/tigo/-/tigo-0.4.2.tgz")
            .with_status(200)
            .with_body("tampered")
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let temp = TempDir::new().unwrap();
        let info = info(&server, sha512_integrity(b"original"));

        let err = fetch(&reg, &info, temp.path(), "server").unwrap_err();
        assert!(matches!(err, TigoError::IntegrityMismatch(_)));
        assert!(!temp.path().join("server_0.4.2.tgz").exists());
    }

    #[test]
    fn fetch_rejects_tampered_file_by_shasum() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/tigo/-/tigo-0.4.2.tgz")
            .with_status(200)
            .with_body("tampered")
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let temp = TempDir::new().unwrap();
        let info = shasum_only(&server, sha1_hex(b"original"));

        let err = fetch(&reg, &info, temp.path(), "server").unwrap_err();
        assert!(matches!(err, TigoError::IntegrityMismatch(_)));
        assert!(!temp.path().join("server_0.4.2.tgz").exists());
    }

    #[test]
    fn fetch_reuses_cache_checked_by_shasum() {
        let body = build_tarball(&[("package/server.js", "")]);
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/tigo/-/tigo-0.4.2.tgz")
            .with_status(200)
            .with_body(body.clone())
            .expect(1)
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let temp = TempDir::new().unwrap();
        let info = shasum_only(&server, sha1_hex(&body));

        fetch(&reg, &info, temp.path(), "server").unwrap();
        fetch(&reg, &info, temp.path(), "server").unwrap();
        mock.assert();
    }
}
