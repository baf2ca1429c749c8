//! Dot-path addressing and deep-merge semantics shared by reads and writes.
//!
//! Arrays and scalars are always replaced wholesale; only JSON objects merge
//! recursively. A watcher on `"a.b"` matches an update to `"a"` or to
//! `"a.b.c"` (prefix either direction), decided over dot-segments rather
//! than raw string prefixes so `"nav"` does not match `"navigation"`.

use serde_json::Value;

pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |acc, seg| acc.get(seg))
}

/// `"a.b"` + `5` -> `{"a": {"b": 5}}`.
pub fn build_partial(path: &str, value: Value) -> Value {
    let mut segments: Vec<&str> = path.split('.').collect();
    let mut result = value;
    while let Some(seg) = segments.pop() {
        result = serde_json::json!({ seg: result });
    }
    result
}

pub fn deep_merge(target: &mut Value, src: &Value) {
    match (target, src) {
        (Value::Object(t), Value::Object(s)) => {
            for (k, v) in s {
                match t.get_mut(k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        t.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (t, s) => *t = s.clone(),
    }
}

/// `opts.merge == false`: each top-level key in `src` replaces the
/// corresponding slice in `target` wholesale instead of merging into it.
pub fn shallow_replace(target: &mut Value, src: &Value) {
    let Some(src_obj) = src.as_object() else {
        return;
    };
    if !target.is_object() {
        *target = serde_json::json!({});
    }
    let obj = target.as_object_mut().unwrap();
    for (k, v) in src_obj {
        obj.insert(k.clone(), v.clone());
    }
}

pub fn path_matches(updated_key: &str, watch_path: &str) -> bool {
    let u: Vec<&str> = updated_key.split('.').collect();
    let w: Vec<&str> = watch_path.split('.').collect();
    let n = u.len().min(w.len());
    u[..n] == w[..n]
}
