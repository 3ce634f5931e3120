use anyhow::{bail, Context, Result};
use esdsl::indices::{CreateIndexRequest, DeleteIndexRequest, DynamicMapping, Property};
use esdsl_client::ElasticsearchClient;
use serde::Deserialize;
use std::path::Path;

/// Mapping file: field names to type names, in file order
///
/// ```yaml
/// dynamic: strict
/// properties:
///   name: text
///   sku: keyword
///   price: double
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub dynamic: Option<String>,
    #[serde(default)]
    pub properties: serde_yaml::Mapping,
}

impl MappingFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid mapping file {}", path.display()))
    }

    /// `(field, property)` pairs in file order.
    pub fn fields(&self) -> Result<Vec<(String, Property)>> {
        let mut fields = Vec::new();
        for (name, kind) in &self.properties {
            let (Some(name), Some(kind)) = (name.as_str(), kind.as_str()) else {
                bail!("Mapping entries must be `field: type` strings");
            };
            fields.push((name.to_string(), parse_property(kind)?));
        }
        Ok(fields)
    }
}

/// Type name to field mapping. `dense_vector:<dims>` sets the dimensions.
pub fn parse_property(kind: &str) -> Result<Property> {
    let property = match kind.trim() {
        "keyword" => Property::keyword(),
        "text" => Property::text(),
        "text+keyword" => Property::text_with_keyword(),
        "long" => Property::Long,
        "integer" => Property::Integer,
        "double" => Property::Double,
        "float" => Property::Float,
        "boolean" => Property::Boolean,
        "date" => Property::date(None),
        "geo_point" => Property::GeoPoint,
        other => match other.strip_prefix("dense_vector:") {
            Some(dims) => {
                let dims: u32 = dims
                    .parse()
                    .with_context(|| format!("Invalid dense_vector dimensions '{}'", dims))?;
                match Property::dense_vector(dims, None) {
                    Some(property) => property,
                    None => bail!("dense_vector needs at least one dimension"),
                }
            }
            None => bail!("Unsupported field type '{}'", other),
        },
    };
    Ok(property)
}

fn parse_dynamic(dynamic: &str) -> Result<DynamicMapping> {
    match dynamic {
        "true" => Ok(DynamicMapping::True),
        "false" => Ok(DynamicMapping::False),
        "strict" => Ok(DynamicMapping::Strict),
        "runtime" => Ok(DynamicMapping::Runtime),
        other => bail!("Unknown dynamic mapping '{}'", other),
    }
}

pub fn build_create_index(
    name: &str,
    shards: Option<u32>,
    replicas: Option<u32>,
    mapping: Option<MappingFile>,
) -> Result<CreateIndexRequest> {
    let mapping = mapping.unwrap_or_default();
    let fields = mapping.fields()?;
    let dynamic = mapping.dynamic.as_deref().map(parse_dynamic).transpose()?;

    let request = CreateIndexRequest::build(name, |r| {
        r.settings(|s| {
            if let Some(shards) = shards {
                s.number_of_shards(shards);
            }
            if let Some(replicas) = replicas {
                s.number_of_replicas(replicas);
            }
        });
        r.mappings(|m| {
            if let Some(dynamic) = dynamic {
                m.dynamic(dynamic);
            }
            m.properties(|p| {
                for (field, property) in fields {
                    p.add(&field, property);
                }
            });
        });
    })?;
    Ok(request)
}

/// Create an index
pub async fn run_create_index(
    client: &ElasticsearchClient,
    name: &str,
    shards: Option<u32>,
    replicas: Option<u32>,
    mapping: Option<&Path>,
) -> Result<()> {
    let mapping = mapping.map(MappingFile::load).transpose()?;
    let request = build_create_index(name, shards, replicas, mapping)?;
    let response = client.create_index(&request).await?;
    if response.acknowledged {
        println!("Created index {}", name);
    } else {
        tracing::warn!("Index {} created but not acknowledged by all nodes", name);
    }
    Ok(())
}

/// Delete one or more indices
pub async fn run_delete_index(client: &ElasticsearchClient, names: &[String]) -> Result<()> {
    let Some(request) = DeleteIndexRequest::new(names) else {
        bail!("No index names given");
    };
    client.delete_index(&request).await?;
    println!("Deleted {}", request.indices.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_property() {
        assert_eq!(parse_property("keyword").unwrap(), Property::keyword());
        assert!(matches!(
            parse_property("dense_vector:128").unwrap(),
            Property::DenseVector { dims: 128, .. }
        ));
        assert!(parse_property("dense_vector:0").is_err());
        assert!(parse_property("blob").is_err());
    }

    #[test]
    fn test_build_create_index_from_mapping() {
        let mapping: MappingFile = serde_yaml::from_str(
            "dynamic: strict\nproperties:\n  title: text\n  sku: keyword\n  price: double\n",
        )
        .unwrap();
        let request = build_create_index("products", Some(1), None, Some(mapping)).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "settings": {"number_of_shards": 1},
                "mappings": {
                    "dynamic": "strict",
                    "properties": {
                        "title": {"type": "text"},
                        "sku": {"type": "keyword"},
                        "price": {"type": "double"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_invalid_index_name() {
        assert!(build_create_index("Products", None, None, None).is_err());
    }
}
