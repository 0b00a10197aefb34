use crate::model::PackageRecord;

/// Parses `pkg version -v` output into package records.
///
/// Lines look like:
///
/// ```text
/// nginx-1.10.1                       =   up-to-date with index
/// openssl-1.0.1_1                    <   needs updating (index has 1.0.2)
/// mypkg-0.3                          ?   orphaned: local/mypkg
/// ```
///
/// Only `=`, `?` and `<` lines produce a record. Anything else, including
/// lines too short to carry the fields we need, is skipped.
pub fn parse_pkg_version(stdout: &str) -> Vec<PackageRecord> {
    stdout.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<PackageRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return None;
    }

    let (name, version) = split_name_version(fields[0])?;

    match fields[1] {
        "?" | "=" => Some(PackageRecord::new(name, version)),
        "<" => {
            let field = *fields.get(6)?;
            let candidate = field.strip_suffix(')').unwrap_or(field);
            Some(PackageRecord::new(name, version).with_candidate(candidate))
        }
        _ => None,
    }
}

/// Splits `name-version` at the last `-`. Package names may contain dashes,
/// FreeBSD versions never do.
pub(crate) fn split_name_version(pkg: &str) -> Option<(&str, &str)> {
    let (name, version) = pkg.rsplit_once('-')?;
    if name.is_empty() {
        return None;
    }
    Some((name, version))
}
