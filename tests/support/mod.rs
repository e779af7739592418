//! Shared fixtures for integration tests.

use std::collections::BTreeMap;
use std::path::Path;

use dropsight::dataset::{Outcome, TARGET_COLUMN};
use dropsight::schema::{FEATURES, FieldKind};

/// Payload with every field set to a valid value.
pub fn baseline_payload() -> BTreeMap<String, f64> {
    archetype_payload(0, 0)
}

/// Valid payload whose numeric values are pushed toward a class-specific
/// region of each field's domain, with a small per-row jitter. The classes
/// end up separable enough for a forest to fit without memorizing noise.
pub fn archetype_payload(class: usize, jitter: usize) -> BTreeMap<String, f64> {
    let t = match class {
        0 => 0.15,
        1 => 0.5,
        _ => 0.85,
    } + 0.01 * (jitter % 5) as f64;
    let mut payload = BTreeMap::new();
    for spec in FEATURES.iter() {
        let value = match spec.kind {
            FieldKind::Categorical(codes) => codes[(class + jitter) % codes.len()] as f64,
            FieldKind::Numeric { min, max } => min + t * (max - min),
        };
        payload.insert(spec.name.to_string(), value);
    }
    payload
}

/// Write a labeled training CSV with `rows_per_class` rows for each outcome.
pub fn write_training_csv(path: &Path, rows_per_class: usize) {
    let mut header: Vec<String> = FEATURES.iter().map(|spec| spec.name.to_string()).collect();
    header.push(TARGET_COLUMN.to_string());
    let mut lines = vec![header.join(";")];
    for (class, label) in Outcome::CLASSES.iter().enumerate() {
        for jitter in 0..rows_per_class {
            let payload = archetype_payload(class, jitter);
            let mut cells: Vec<String> = FEATURES
                .iter()
                .map(|spec| format!("{}", payload[spec.name]))
                .collect();
            cells.push(label.to_string());
            lines.push(cells.join(";"));
        }
    }
    std::fs::write(path, lines.join("\n")).unwrap();
}
