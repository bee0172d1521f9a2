//! Loose npm version handling, enough to tell whether an upgrade exists.

use std::cmp::Ordering;

/// The version a dependency range starts from: `^1.2.0` → `1.2.0`,
/// `>=2 <3` → `2`.
pub fn normalize(raw: &str) -> Option<&str> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    raw[start..].split_whitespace().next()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    core: [u64; 3],
    pre: Vec<String>,
}

impl Version {
    /// Parse `1.2.3`, `1.2`, `v1.2.3-beta.1+build` and range forms such as
    /// `^1.2.3`. Wildcard parts (`x`, `*`) count as zero.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = normalize(raw)?;
        let text = text.split('+').next()?;
        let (core_text, pre_text) = match text.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (text, None),
        };

        let mut core = [0u64; 3];
        for (i, part) in core_text.split('.').enumerate() {
            if i >= 3 {
                return None;
            }
            core[i] = match part {
                "x" | "X" | "*" => 0,
                _ => part.parse().ok()?,
            };
        }
        let pre = pre_text
            .map(|p| p.split('.').map(str::to_string).collect())
            .unwrap_or_default();
        Some(Self { core, pre })
    }
}

fn compare_identifiers(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.core.cmp(&other.core).then_with(|| {
            match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                // a prerelease sorts before its release
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self
                    .pre
                    .iter()
                    .zip(&other.pre)
                    .map(|(a, b)| compare_identifiers(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| self.pre.len().cmp(&other.pre.len())),
            }
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Whether `candidate` is newer than `current`. An unreadable `current`
/// counts as outdated; an unreadable `candidate` never wins.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (Version::parse(candidate), Version::parse(current)) {
        (Some(c), Some(cur)) => c > cur,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
