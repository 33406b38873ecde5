// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use serde_json::Value;

/// Serializes a JSON value canonically: object keys sorted lexicographically at every level, no
/// insignificant whitespace.
///
/// Commitments and signing inputs hash this form, so the byte representation of a value must not
/// depend on the key order the caller happened to use.  The sorting is done here by hand because
/// `serde_json`'s map ordering is a compile-time feature (`preserve_order`) which other crates in
/// the build may toggle.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(array) => {
            out.push('[');
            for (i, element) in array.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(element, out);
            }
            out.push(']');
        }
        // Scalars already have a single serde_json representation.
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_objects_are_key_sorted() {
        let value = json!({"b": 1, "a": {"d": true, "c": null}});

        assert_eq!(canonical_json(&value), r#"{"a":{"c":null,"d":true},"b":1}"#);
    }

    #[test]
    fn test_arrays_keep_order() {
        let value = json!(["b", "a", 3]);

        assert_eq!(canonical_json(&value), r#"["b","a",3]"#);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(canonical_json(&json!("text")), r#""text""#);
        assert_eq!(canonical_json(&json!(42)), "42");
        assert_eq!(canonical_json(&json!(null)), "null");
    }
}
