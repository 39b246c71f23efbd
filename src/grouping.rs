//! Grouping of index names into logical datasets.
//!
//! Time-partitioned indices share a name stem and a partition token and
//! differ only in a trailing suffix:
//!
//! ```text
//! <interset_access_rawdata_01p-{2020-10-w42}>
//!  \______________________/ \_/ \___________/
//!          stem            token   suffix
//! ```
//!
//! The stem is letters and underscores, the token letters and digits, and the
//! optional suffix follows a `-` or `_`. One pair of angle brackets around
//! the name is ignored. Matching names are grouped under `stem_token`; any
//! other name is its own group.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::stats::{IndexGroup, NodeLayout};

lazy_static! {
    static ref GROUP_PATTERN: Regex =
        Regex::new(r"^<?([A-Za-z_]+)_([A-Za-z0-9]+)(?:[-_](.*?))?>?$")
            .expect("group pattern is valid");
}

/// The group key of an index name.
///
/// ```
/// use shardstat::grouping::group_key;
///
/// assert_eq!(group_key("entity_stats_0_2020-12-11_00_48_35"), "entity_stats_0");
/// assert_eq!(group_key("<interset_access_rawdata_01p-{2020-10-w42}>"), "interset_access_rawdata_01p");
/// assert_eq!(group_key("logs-2020.10.01"), "logs-2020.10.01");
/// ```
pub fn group_key(name: &str) -> String {
    match GROUP_PATTERN.captures(name) {
        Some(caps) => format!("{}_{}", &caps[1], &caps[2]),
        None => name.to_string(),
    }
}

/// Build the groups of a node from its name → directory id mapping.
///
/// Groups are keyed in sorted order; within a group, shards follow the
/// iteration order of `mapping`.
pub fn group_indices(
    mapping: &BTreeMap<String, String>,
    layout: &NodeLayout,
) -> BTreeMap<String, IndexGroup> {
    let mut groups: BTreeMap<String, IndexGroup> = BTreeMap::new();

    for (name, directory_id) in mapping {
        let key = group_key(name);
        debug!("{name} -> group {key}");
        groups
            .entry(key)
            .or_insert_with_key(|key| IndexGroup::new(key.as_str()))
            .add_shard(layout.shard(name, directory_id));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use std::path::Path;

    fn layout() -> NodeLayout {
        NodeLayout::resolve(Path::new("/n/_state"), &AnalysisConfig::default()).unwrap()
    }

    fn mapping(names: &[&str]) -> BTreeMap<String, String> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), format!("id{i}")))
            .collect()
    }

    fn keys(groups: &BTreeMap<String, IndexGroup>) -> Vec<&str> {
        groups.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_date_math_names_form_one_group() {
        let groups = group_indices(
            &mapping(&[
                "<interset_access_rawdata_01p-{2020-10-w42}>",
                "<interset_access_rawdata_01p-{2020-10-w43}>",
                "<interset_access_rawdata_01p-{2020-10-w44}>",
            ]),
            &layout(),
        );

        assert_eq!(keys(&groups), vec!["interset_access_rawdata_01p"]);
        assert_eq!(groups["interset_access_rawdata_01p"].shards().len(), 3);
    }

    #[test]
    fn test_different_token_splits_group() {
        let groups = group_indices(
            &mapping(&[
                "<interset_access_rawdata_01p-{2020-10-w42}>",
                "<interset_access_rawdata_0-{2020-10-w43}>",
                "<interset_access_rawdata_01p-{2020-10-w44}>",
            ]),
            &layout(),
        );

        assert_eq!(
            keys(&groups),
            vec!["interset_access_rawdata_0", "interset_access_rawdata_01p"]
        );
        assert_eq!(groups["interset_access_rawdata_0"].shards().len(), 1);
        assert_eq!(groups["interset_access_rawdata_01p"].shards().len(), 2);
    }

    #[test]
    fn test_underscore_timestamp_suffix() {
        let groups = group_indices(
            &mapping(&[
                "entity_stats_0_2020-12-11_00_48_35",
                "entity_stats_0_2020-12-12_03_26_50",
                "entity_stats_0_2021-12-12_20_29_08",
            ]),
            &layout(),
        );

        assert_eq!(keys(&groups), vec!["entity_stats_0"]);
        let shard_names: Vec<_> = groups["entity_stats_0"]
            .shards()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(
            shard_names,
            vec![
                "entity_stats_0_2020-12-11_00_48_35",
                "entity_stats_0_2020-12-12_03_26_50",
                "entity_stats_0_2021-12-12_20_29_08",
            ]
        );
    }

    #[test]
    fn test_unmatched_names_are_singletons() {
        assert_eq!(group_key("logs"), "logs");
        assert_eq!(group_key("logs-2020.10.01"), "logs-2020.10.01");
        assert_eq!(group_key("a_b.c"), "a_b.c");
        assert_eq!(group_key("<weird>"), "<weird>");
        assert_eq!(group_key(""), "");
    }

    #[test]
    fn test_short_names() {
        assert_eq!(group_key("my_index"), "my_index");
        assert_eq!(group_key("<metrics_7>"), "metrics_7");
        assert_eq!(group_key("audit_x1-"), "audit_x1");
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let names = mapping(&[
            "b_1-2020",
            "a_2_2021",
            "c",
            "a_2-2020",
            "<b_1-{now}>",
        ]);

        let first = group_indices(&names, &layout());
        let second = group_indices(&names, &layout());
        assert_eq!(first, second);
        assert_eq!(keys(&first), vec!["a_2", "b_1", "c"]);
    }

    #[test]
    fn test_shard_paths_follow_layout() {
        let groups = group_indices(&mapping(&["events_0-2020"]), &layout());
        let shard = &groups["events_0"].shards()[0];

        assert_eq!(shard.directory_id, "id0");
        assert_eq!(shard.index_path, Path::new("/n/indices/id0/0/index"));
    }
}
