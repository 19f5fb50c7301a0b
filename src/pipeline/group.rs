use std::collections::{BTreeMap, BTreeSet};

use crate::data::model::MetadataValue;

/// Run configuration: field name → value.
pub type RunConfig = BTreeMap<String, MetadataValue>;

/// Distinct config value → indices of the runs sharing it. The map's order is
/// the order groups are drawn in.
pub type GroupIndices = BTreeMap<MetadataValue, Vec<usize>>;

/// Decides which config fields runs can be grouped by, and buckets runs.
pub trait GroupResolver {
    /// Fields usable for grouping the given runs.
    fn candidates(&self, configs: &[RunConfig]) -> Vec<String>;

    /// Bucket runs (by index into `configs`) by their value of `field`.
    fn group_indices(&self, configs: &[RunConfig], field: &str) -> GroupIndices;
}

/// Groups on plain config values. Runs without the field form a `Null` group.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigGroupResolver;

impl GroupResolver for ConfigGroupResolver {
    /// A field qualifies when the runs take at least two distinct values
    /// for it and at least one value is shared by two or more runs.
    fn candidates(&self, configs: &[RunConfig]) -> Vec<String> {
        let fields: BTreeSet<&String> = configs.iter().flat_map(|c| c.keys()).collect();

        fields
            .into_iter()
            .filter(|field| {
                let groups = self.group_indices(configs, field);
                groups.len() >= 2 && groups.values().any(|runs| runs.len() >= 2)
            })
            .cloned()
            .collect()
    }

    fn group_indices(&self, configs: &[RunConfig], field: &str) -> GroupIndices {
        let mut groups = GroupIndices::new();
        for (i, config) in configs.iter().enumerate() {
            let value = config.get(field).cloned().unwrap_or(MetadataValue::Null);
            groups.entry(value).or_default().push(i);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, MetadataValue)]) -> RunConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn s(v: &str) -> MetadataValue {
        MetadataValue::String(v.to_string())
    }

    #[test]
    fn groups_by_value_in_stable_order() {
        let configs = vec![
            config(&[("opt", s("sgd"))]),
            config(&[("opt", s("adam"))]),
            config(&[("opt", s("sgd"))]),
            config(&[]),
        ];
        let groups = ConfigGroupResolver.group_indices(&configs, "opt");
        let entries: Vec<_> = groups.into_iter().collect();

        assert_eq!(
            entries,
            vec![
                (MetadataValue::Null, vec![3]),
                (s("adam"), vec![1]),
                (s("sgd"), vec![0, 2]),
            ]
        );
    }

    #[test]
    fn candidates_need_shared_and_distinct_values() {
        let configs = vec![
            config(&[("opt", s("sgd")), ("seed", MetadataValue::Integer(1)), ("ds", s("x"))]),
            config(&[("opt", s("sgd")), ("seed", MetadataValue::Integer(2)), ("ds", s("x"))]),
            config(&[("opt", s("adam")), ("seed", MetadataValue::Integer(3)), ("ds", s("x"))]),
        ];
        // seed: all distinct; ds: all equal.
        assert_eq!(ConfigGroupResolver.candidates(&configs), vec!["opt".to_string()]);
    }
}
