use crate::error::SimilarityError;
use db::models::Element;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default)]
    elements: Vec<RawElement>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    source: Endpoint,
    target: Endpoint,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    element: String,
}

/// Parses a diagram payload into elements.
///
/// Nodes come first in payload order, followed by relationships. A node's context is
/// the name of its owner (empty at top level); a relationship's context is
/// `source->target` by endpoint names.
pub fn extract_model_elements(
    submission_id: i64,
    content: &str,
) -> Result<Vec<Element>, SimilarityError> {
    let malformed = |reason: String| SimilarityError::MalformedModel {
        submission_id,
        reason,
    };

    let model: RawModel = serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;

    let mut names: HashMap<&str, &str> = HashMap::with_capacity(model.elements.len());
    for element in &model.elements {
        if names.insert(&element.id, &element.name).is_some() {
            return Err(malformed(format!("duplicate element id '{}'", element.id)));
        }
    }

    let name_of = |id: &str| {
        names
            .get(id)
            .copied()
            .ok_or_else(|| malformed(format!("unknown element '{id}'")))
    };

    let mut elements = Vec::with_capacity(model.elements.len() + model.relationships.len());
    for element in &model.elements {
        let context = match element.owner.as_deref() {
            Some(owner) => name_of(owner)?,
            None => "",
        };
        elements.push(Element::new(
            format!("{}:{}", element.kind, element.id),
            element.kind.as_str(),
            element.name.as_str(),
            context,
        ));
    }

    let mut relationship_ids = HashSet::with_capacity(model.relationships.len());
    for relationship in &model.relationships {
        if names.contains_key(relationship.id.as_str())
            || !relationship_ids.insert(relationship.id.as_str())
        {
            return Err(malformed(format!(
                "duplicate element id '{}'",
                relationship.id
            )));
        }
        let context = format!(
            "{}->{}",
            name_of(&relationship.source.element)?,
            name_of(&relationship.target.element)?
        );
        elements.push(Element::new(
            format!("{}:{}", relationship.kind, relationship.id),
            relationship.kind.as_str(),
            relationship.name.as_str(),
            context,
        ));
    }

    Ok(elements)
}
