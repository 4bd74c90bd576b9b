use crate::error::Result;
use crate::models::config::{EngineConfig, CONFIG_SCHEMA_VERSION};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

pub const WEIGHT_PROFILES: [&str; 2] = ["base", "young"];

/// Load the engine configuration from a settings file.
///
/// Older files are migrated in memory, missing keys fall back to the
/// built-in defaults and the result is validated before it is returned.
/// A missing file yields the defaults.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        log::info!("No settings at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    engine_config_from_value(value)
}

pub fn engine_config_from_value(value: Value) -> Result<EngineConfig> {
    let migrated = migrate_settings(value)?;
    let config: EngineConfig = serde_json::from_value(migrated)?;
    config.validate()?;
    Ok(config)
}

/// Validate and write `config` as pretty JSON, creating parent directories.
pub fn save_engine_config(path: &Path, config: &EngineConfig) -> Result<()> {
    config.validate()?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}

fn migrate_settings(input: Value) -> Result<Value> {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_weights_from_percentages(&mut out);
    }

    if version < 2 {
        // V2 splits the single weight map into base and young profiles.
        nest_flat_weights(&mut out);
    }

    let defaults = serde_json::to_value(EngineConfig::default())?;
    deep_merge_defaults(&mut out, &defaults);
    normalize_weight_profiles(&mut out);

    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(CONFIG_SCHEMA_VERSION));
    }

    Ok(out)
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object())
    else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() && !is_weight_map(key) {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

/// Weight maps are replaced wholesale: a source left out of a user profile
/// means "do not use it", not "use the default weight".
fn is_weight_map(key: &str) -> bool {
    WEIGHT_PROFILES.contains(&key)
}

fn nest_flat_weights(settings: &mut Value) {
    let Some(weights) = settings.get_mut("weights").and_then(Value::as_object_mut) else {
        return;
    };
    let is_flat = !weights.is_empty() && weights.values().all(Value::is_number);
    if !is_flat {
        return;
    }

    let flat = std::mem::take(weights);
    weights.insert("base".to_string(), Value::Object(flat));
}

fn migrate_weights_from_percentages(settings: &mut Value) {
    let Some(weights) = settings.get_mut("weights").and_then(Value::as_object_mut) else {
        return;
    };

    if weights.values().all(Value::is_number) {
        scale_percentages(weights);
        return;
    }
    for profile in WEIGHT_PROFILES {
        if let Some(map) = weights.get_mut(profile).and_then(Value::as_object_mut) {
            scale_percentages(map);
        }
    }
}

fn scale_percentages(weights: &mut Map<String, Value>) {
    let has_percentage_like_values = weights.values().any(|v| v.as_f64().unwrap_or(0.0) > 1.0);
    if !has_percentage_like_values {
        return;
    }

    for value in weights.values_mut() {
        if let Some(v) = value.as_f64() {
            *value = json!(v / 100.0);
        }
    }
}

/// Rescale each profile to sum to 1. Profiles holding negative or
/// non-numeric weights are left untouched so validation rejects them.
fn normalize_weight_profiles(settings: &mut Value) {
    let Some(weights) = settings.get_mut("weights").and_then(Value::as_object_mut) else {
        return;
    };

    for profile in WEIGHT_PROFILES {
        let Some(map) = weights.get_mut(profile).and_then(Value::as_object_mut) else {
            continue;
        };
        let values: Vec<f64> = map.values().filter_map(Value::as_f64).collect();
        if values.len() != map.len() || values.iter().any(|v| *v < 0.0) {
            continue;
        }

        let sum: f64 = values.iter().sum();
        if sum > f64::EPSILON {
            for value in map.values_mut() {
                if let Some(v) = value.as_f64() {
                    *value = json!(v / sum);
                }
            }
        }
    }
}
