use std::path::PathBuf;

use tempfile::TempDir;
use vellum_schema::DocumentSchemaRegistry;

pub fn registry() -> DocumentSchemaRegistry {
    DocumentSchemaRegistry::new().expect("document schemas should build")
}

pub fn write_json(dir: &TempDir, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).expect("serialize"))
        .expect("write fixture");
    path
}

/// A publishable `Post` with a slug pattern and a unique slug index.
pub fn blog_update() -> serde_json::Value {
    serde_json::json!({
        "entityTypes": [{
            "name": "Post",
            "publishable": true,
            "nameField": "title",
            "fields": [
                { "name": "title", "type": "String", "required": true },
                { "name": "slug", "type": "String", "matchPattern": "slug", "index": "slugs" },
                { "name": "notes", "type": "String", "adminOnly": true }
            ]
        }],
        "patterns": [{ "name": "slug", "pattern": "^[a-z-]+$" }],
        "indexes": [{ "name": "slugs", "type": "unique" }]
    })
}
