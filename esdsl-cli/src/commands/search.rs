use anyhow::{bail, Context, Result};
use esdsl::query::{Query, QueryClauses};
use esdsl::search::{CountRequest, FieldSort, SearchRequest, SortOptions, SortOrder, SourceConfig};
use esdsl::response::SearchResponse;
use esdsl_client::ElasticsearchClient;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Search settings read from a YAML file
///
/// ```yaml
/// query:
///   match: {name: laptop}
/// size: 10
/// sort: ["price:asc", "_score"]
/// source: [name, price]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct QueryFile {
    /// Raw Query DSL
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub from: Option<u32>,
    #[serde(default)]
    pub sort: Vec<String>,
    #[serde(default)]
    pub source: Vec<String>,
}

impl QueryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid query file {}", path.display()))
    }
}

#[derive(Debug, Default)]
pub struct SearchOptions {
    pub indices: Vec<String>,
    pub text: Option<String>,
    pub fields: Vec<String>,
    pub file: Option<PathBuf>,
    pub size: Option<u32>,
    pub from: Option<u32>,
    pub sort: Vec<String>,
    pub json: bool,
}

/// `field`, `field:asc`, `field:desc`, `_score[:order]` or `_doc`.
pub fn parse_sort(sort: &str) -> Result<Option<SortOptions>> {
    let (field, order) = match sort.split_once(':') {
        Some((field, order)) => (field.trim(), Some(order.trim())),
        None => (sort.trim(), None),
    };
    let order = match order.map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => None,
        Some("asc") => Some(SortOrder::Asc),
        Some("desc") => Some(SortOrder::Desc),
        Some(other) => bail!("Unknown sort order '{}' in '{}'", other, sort),
    };
    Ok(match field {
        "_score" => Some(SortOptions::Score(order)),
        "_doc" => Some(SortOptions::Doc),
        _ => FieldSort::new(field).map(|sort| {
            let sort = match order {
                Some(order) => sort.with_order(order),
                None => sort,
            };
            SortOptions::Field(sort)
        }),
    })
}

/// Free text against no field, one field or several.
fn add_text_query(clauses: &mut QueryClauses, text: &str, fields: &[String]) {
    match fields {
        [] => clauses.query_string(text),
        [field] => clauses.match_query(field, text),
        _ => clauses.multi_match(text, fields),
    };
}

pub fn build_search(options: &SearchOptions, file: QueryFile) -> Result<SearchRequest> {
    let mut sorts = Vec::new();
    for sort in file.sort.iter().chain(&options.sort) {
        sorts.extend(parse_sort(sort)?);
    }

    let raw = match file.query {
        Some(value) => Some(Query::raw(value).context("Query file has a null query")?),
        None => None,
    };

    Ok(SearchRequest::build(&options.indices, |s| {
        s.query(|c| {
            c.add(raw);
            if let Some(text) = &options.text {
                add_text_query(c, text, &options.fields);
            }
        });
        for sort in sorts {
            s.sort(sort);
        }
        if let Some(size) = options.size.or(file.size) {
            s.size(size);
        }
        if let Some(from) = options.from.or(file.from) {
            s.from(from);
        }
        if !file.source.is_empty() {
            s.source(SourceConfig::includes(&file.source));
        }
    }))
}

/// Search one or more indices
pub async fn run_search(client: &ElasticsearchClient, options: SearchOptions) -> Result<()> {
    let file = match &options.file {
        Some(path) => QueryFile::load(path)?,
        None => QueryFile::default(),
    };
    let request = build_search(&options, file)?;
    let body = request.body()?;
    tracing::debug!(body = %body, "search request");

    let response: SearchResponse = client.search_request(&request).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{} hits in {} ms", response.total(), response.took);
    println!("{:<24} {:<24} {:>8}  SOURCE", "INDEX", "ID", "SCORE");
    println!("{}", "-".repeat(80));
    for hit in &response.hits.hits {
        let score = hit
            .score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());
        let source = hit
            .source
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        println!(
            "{:<24} {:<24} {:>8}  {}",
            hit.index,
            hit.id,
            score,
            truncate(&source, 120)
        );
    }
    Ok(())
}

/// Count matching documents
pub async fn run_count(
    client: &ElasticsearchClient,
    indices: &[String],
    text: Option<&str>,
) -> Result<()> {
    let request = CountRequest::build(indices, |c| {
        if let Some(text) = text {
            add_text_query(c, text, &[]);
        }
    });
    let response = client.count(&request).await?;
    println!("{}", response.count);
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
