// src/cluster/labels.rs

use std::collections::BTreeMap;

pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
pub const COMPONENT_LABEL: &str = "component";
pub const MODE_LABEL: &str = "odo.dev/mode";
pub const MODE_DEV: &str = "Dev";

/// Labels carried by the dev-mode resources of a component.
pub fn component_labels(component: &str, application: &str) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        (INSTANCE_LABEL, component.to_string()),
        (PART_OF_LABEL, application.to_string()),
        (COMPONENT_LABEL, component.to_string()),
        (MODE_LABEL, MODE_DEV.to_string()),
    ])
}

/// Label selector matching the dev-mode resources of a component, keys in
/// sorted order.
pub fn component_selector(component: &str, application: &str) -> String {
    component_labels(component, application)
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Returns true if `labels` satisfies every `key=value` term of `selector`.
pub fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels.get(k.trim()).is_some_and(|l| l == v.trim()),
            None => labels.contains_key(term),
        })
}
