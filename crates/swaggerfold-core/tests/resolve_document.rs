//! End-to-end resolution of a petstore document

use serde_json::{json, Value as JsonValue};
use swaggerfold_core::output::{render, OutputFormat};
use swaggerfold_core::{source, structurally_equal, DiagnosticKind, Resolver};

fn fixture_path() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/petstore.yaml").to_string()
}

async fn parsed_petstore() -> swaggerfold_core::Result<Resolver> {
    let text = source::load(fixture_path()).await?;
    let mut resolver = Resolver::new(text);
    resolver.parse()?;
    Ok(resolver)
}

/// Find a child node by name.
fn child<'a>(node: &'a JsonValue, name: &str) -> &'a JsonValue {
    node["children"]
        .as_array()
        .and_then(|children| children.iter().find(|c| c["name"] == name))
        .unwrap_or_else(|| panic!("no child named {} in {}", name, node))
}

#[tokio::test]
async fn test_definitions_are_cycle_free() -> swaggerfold_core::Result<()> {
    let text = source::load(fixture_path()).await?;
    let resolver = Resolver::new(text);
    let definitions = &resolver.document().unwrap()["definitions"];

    assert_eq!(
        definitions["Category"]["properties"]["parent"]["$ref"],
        json!({"path": "#/definitions/Category", "nested": true})
    );
    assert_eq!(
        definitions["Owner"]["properties"]["walkers"]["items"]["$ref"]["properties"]["owner"]["$ref"],
        json!({"path": "#/definitions/Owner", "nested": true})
    );
    // Pet inlines Category, whose own self-reference is cut on the way.
    let category = &definitions["Pet"]["properties"]["category"]["$ref"];
    assert_eq!(category["type"], "object");
    assert_eq!(
        category["properties"]["parent"]["$ref"]["path"],
        "#/definitions/Category"
    );
    assert!(resolver.diagnostics().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_operations_are_normalized() -> swaggerfold_core::Result<()> {
    let resolver = parsed_petstore().await?;
    let paths = &resolver.document().unwrap()["paths"];

    let list = &paths["/pets"]["get"];
    assert_eq!(list["summary"], "List all pets");
    assert_eq!(
        list["parameters"][0],
        json!({
            "name": "limit",
            "in": "query",
            "description": "How many items to return at one time",
            "type": "number",
            "format": "int32"
        })
    );

    let pets = &list["responses"]["200"];
    assert_eq!(pets["type"], "array");
    let pet = &pets["children"][0];
    assert_eq!(pet["type"], "object");
    assert_eq!(
        child(pet, "id"),
        &json!({"name": "id", "type": "number", "format": "int64", "required": true})
    );
    assert_eq!(child(pet, "name")["required"], true);
    assert_eq!(child(pet, "name")["example"], "doggie");
    let category = child(pet, "category");
    assert_eq!(category["required"], false);
    assert_eq!(child(category, "id")["format"], "int64");
    assert_eq!(
        category["children"][1],
        json!({"path": "#/definitions/Category", "nested": true, "required": false})
    );
    let tags = child(pet, "tags");
    assert_eq!(tags["type"], "array");
    assert_eq!(tags["children"][0]["type"], "object");
    Ok(())
}

#[tokio::test]
async fn test_fallbacks_and_dropped_units() -> swaggerfold_core::Result<()> {
    let resolver = parsed_petstore().await?;
    let paths = &resolver.document().unwrap()["paths"];

    // Path-level parameters are inherited.
    let get = &paths["/pets/{petId}"]["get"];
    assert_eq!(
        get["parameters"],
        json!([{"name": "petId", "in": "path", "type": "string", "required": true}])
    );

    // The dangling body parameter goes, the operation stays.
    let delete = &paths["/pets/{petId}"]["delete"];
    assert_eq!(delete["parameters"].as_array().map(Vec::len), Some(1));
    assert_eq!(delete["parameters"][0]["name"], "api_key");

    // Responses come from the document level.
    let default = &delete["responses"]["default"];
    assert_eq!(default["name"], "default");
    assert_eq!(child(default, "code")["required"], true);
    assert_eq!(child(default, "message")["required"], false);

    // Map-style parameters take their name from the key.
    assert_eq!(paths["/users/{userId}"]["get"]["parameters"][0]["name"], "userId");

    // Path references are inlined, unresolvable ones removed.
    assert_eq!(
        paths["/health"]["get"]["responses"]["200"]["description"],
        "Service is up"
    );
    assert!(paths.get("/ghost").is_none());

    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedReference), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedPath), 1);
    Ok(())
}

#[tokio::test]
async fn test_parse_is_idempotent() -> swaggerfold_core::Result<()> {
    let resolver = parsed_petstore().await?;
    let once = resolver.document().unwrap().clone();

    let mut again = Resolver::new(once.clone());
    let twice = again.parse()?;
    assert!(structurally_equal(&once, twice));
    assert!(again.diagnostics().is_empty());

    let text = source::load(fixture_path()).await?;
    assert!(resolver.compare(text));
    Ok(())
}

#[tokio::test]
async fn test_rendered_yaml_resolves_to_same_document() -> swaggerfold_core::Result<()> {
    let resolver = parsed_petstore().await?;
    let document = resolver.document().unwrap();

    let yaml = render(document, OutputFormat::Yaml, true)?;
    let reread = Resolver::new(yaml);
    assert!(structurally_equal(document, reread.document().unwrap()));
    Ok(())
}
