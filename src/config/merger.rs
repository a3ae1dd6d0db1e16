//! Deep merge for layered YAML configuration.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Sequences and scalars in the overlay replace the base value
//! - A null in the overlay deletes the key from the base

use serde_yaml::Value;

/// Deep merge two YAML values. `overlay` wins at the point of conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        (_, overlay) => overlay.clone(),
    }
}

/// Merge layers in order; the last layer has the highest priority.
///
/// Layers that are not mappings (an empty file parses to null) are skipped.
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .filter(|config| config.is_mapping())
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn local_layer_overrides_single_field() {
        let base = yaml(
            r#"
geocoder:
  endpoint: https://nominatim.openstreetmap.org/search
  request_delay_ms: 200
"#,
        );
        let overlay = yaml(
            r#"
geocoder:
  request_delay_ms: 1000
"#,
        );

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["geocoder"]["request_delay_ms"], 1000);
        assert_eq!(
            result["geocoder"]["endpoint"],
            "https://nominatim.openstreetmap.org/search"
        );
    }

    #[test]
    fn null_removes_inherited_value() {
        let base = yaml(
            r#"
cache:
  dir: /var/cache/geo
  max_bytes: 1024
"#,
        );
        let overlay = yaml("cache:\n  max_bytes: null\n");

        let result = deep_merge(&base, &overlay);

        assert!(result["cache"].get("max_bytes").is_none());
        assert_eq!(result["cache"]["dir"], "/var/cache/geo");
    }

    #[test]
    fn scalar_overlay_replaces_mapping() {
        let base = yaml("static_table:\n  path: coords.json\n");
        let overlay = yaml("static_table: disabled\n");

        assert_eq!(deep_merge(&base, &overlay)["static_table"], "disabled");
    }

    #[test]
    fn merge_configs_applies_layers_in_order() {
        let configs = vec![
            yaml("context:\n  district: Sangli\n  state: Maharashtra"),
            yaml("context:\n  district: Satara"),
            yaml("cache:\n  enabled: false"),
        ];

        let result = merge_configs(&configs);

        assert_eq!(result["context"]["district"], "Satara");
        assert_eq!(result["context"]["state"], "Maharashtra");
        assert_eq!(result["cache"]["enabled"], false);
    }

    #[test]
    fn empty_layers_are_ignored() {
        let configs = vec![yaml("context:\n  district: Sangli"), Value::Null];

        let result = merge_configs(&configs);

        assert_eq!(result["context"]["district"], "Sangli");
        assert!(merge_configs(&[]).as_mapping().unwrap().is_empty());
    }
}
