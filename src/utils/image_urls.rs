//! Heuristic extraction of generated image references from webhook replies.
//!
//! Reply shapes vary by workflow, so we walk the whole JSON tree and keep any
//! string that looks like an image reference.
use serde_json::Value;
use std::collections::HashSet;

/// Every string in `v` that starts with `http` or `data:image`, in first-seen
/// order without duplicates.
pub fn collect_image_strings(v: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk(v, &mut seen, &mut out);
    out
}

fn walk(v: &Value, seen: &mut HashSet<String>, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => { for (_k, vv) in map.iter() { walk(vv, seen, out); } }
        Value::Array(arr) => { for vv in arr { walk(vv, seen, out); } }
        Value::String(s) => {
            if (s.starts_with("http") || s.starts_with("data:image")) && seen.insert(s.clone()) {
                out.push(s.clone());
            }
        }
        _ => {}
    }
}

/// Objects from the template and upload buckets are inputs, never results.
pub fn is_template_or_upload_url(url: &str) -> bool {
    url.contains("/templates/") || url.contains("/uploads/")
}

/// Drop inputs that the webhook echoed back alongside its results.
pub fn filter_generated(images: Vec<String>, exclusions: &HashSet<String>) -> Vec<String> {
    images
        .into_iter()
        .filter(|u| !exclusions.contains(u))
        .filter(|u| !is_template_or_upload_url(u))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_nested_urls_once() {
        let reply = json!({
            "output": [
                {"image": "https://cdn.example.com/a.png", "seed": 4},
                {"image": "data:image/png;base64,AAAA"},
                {"again": "https://cdn.example.com/a.png"}
            ],
            "note": "not a url",
            "count": 2
        });
        assert_eq!(
            collect_image_strings(&reply),
            vec!["https://cdn.example.com/a.png".to_string(), "data:image/png;base64,AAAA".to_string()]
        );
    }

    #[test]
    fn plain_data_urls_that_are_not_images_are_ignored() {
        assert!(collect_image_strings(&json!(["data:text/plain;base64,AA"])).is_empty());
    }

    #[test]
    fn filters_inputs_and_bucket_assets() {
        let images = vec![
            "https://x.supabase.co/storage/v1/object/public/templates/templates/t.png".to_string(),
            "https://x.supabase.co/storage/v1/object/public/uploads/uploads/u.png".to_string(),
            "https://elsewhere.com/product.png".to_string(),
            "https://elsewhere.com/result.png".to_string(),
        ];
        let exclusions: HashSet<String> = ["https://elsewhere.com/product.png".to_string()].into_iter().collect();
        assert_eq!(filter_generated(images, &exclusions), vec!["https://elsewhere.com/result.png".to_string()]);
    }
}
