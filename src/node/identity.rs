use crate::constants::IDENTITY_PORT;

/// Cluster identity of the node called `name`.
///
/// Pure function of the name: the identity always carries the fixed cluster
/// port, whatever host port the harness published the query endpoint on.
pub fn member_id(name: &str) -> String {
    format!("{name}:{IDENTITY_PORT}")
}

/// Turn the `seeds` column of a scenario table into seed identities.
///
/// Entries are comma separated. An entry that already names a port is kept
/// verbatim; a bare name is mapped through [`member_id`]; blanks are dropped.
pub fn parse_seeds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.contains(':') {
                entry.to_string()
            } else {
                member_id(entry)
            }
        })
        .collect()
}

/// Value of the `SEEDS` environment variable handed to a node
pub fn join_seeds(seeds: &[String]) -> String {
    seeds.join(",")
}
