//! Resolution of slug-reference fields to remote ids.

use futures::future::try_join_all;
use pressmark_types::RemoteId;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{PublishError, Result};
use crate::remote::{find_by_slug, Lookup, RemoteApi};

/// Resolved ids of one reference field, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub key: String,
    pub ids: Vec<RemoteId>,
}

/// Resolve every slug of the `slug_keys` fields present in `metadata`
///
/// All lookups run concurrently. Each slug must match exactly one item in
/// the collection named by its key.
pub async fn resolve_references(
    api: &dyn RemoteApi,
    slug_keys: &[String],
    metadata: &Mapping,
) -> Result<Vec<ResolvedField>> {
    let mut fields: Vec<(String, Vec<String>)> = Vec::new();
    for key in slug_keys {
        if let Some(value) = metadata.get(key.as_str()) {
            fields.push((key.clone(), slug_list(key, value)?));
        }
    }

    let lookups = fields.iter().flat_map(|(key, slugs)| {
        slugs
            .iter()
            .map(move |slug| resolve_one(api, key.as_str(), slug.as_str()))
    });
    let mut ids = try_join_all(lookups).await?.into_iter();

    Ok(fields
        .into_iter()
        .map(|(key, slugs)| ResolvedField {
            ids: ids.by_ref().take(slugs.len()).collect(),
            key,
        })
        .collect())
}

async fn resolve_one(api: &dyn RemoteApi, collection: &str, slug: &str) -> Result<RemoteId> {
    match find_by_slug(api, collection, slug, &[]).await? {
        Lookup::Found(item) => {
            debug!(collection, slug, id = %item.id, "resolved reference");
            Ok(item.id)
        }
        lookup => Err(PublishError::Resolution {
            collection: collection.to_string(),
            slug: slug.to_string(),
            matches: lookup.match_count(),
        }),
    }
}

/// Slugs of a reference field: a list of strings, or a single string
fn slug_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || PublishError::InvalidField {
        key: key.to_string(),
        message: "expected a list of slugs".to_string(),
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(slug) => Ok(vec![slug.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(slug) => Ok(slug.clone()),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRemote;
    use pressmark_types::RemoteItem;

    fn keys() -> Vec<String> {
        vec!["categories".to_string(), "tags".to_string()]
    }

    fn metadata(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_in_source_order() {
        let remote = FakeRemote::new();
        remote.insert("tags", RemoteItem::new(30, "zeta"));
        remote.insert("tags", RemoteItem::new(10, "alpha"));
        remote.insert("categories", RemoteItem::new(5, "news"));

        let resolved = resolve_references(
            &remote,
            &keys(),
            &metadata("title: T\ntags: [zeta, alpha]\ncategories: [news]\n"),
        )
        .await
        .unwrap();

        assert_eq!(
            resolved,
            vec![
                ResolvedField {
                    key: "categories".into(),
                    ids: vec![RemoteId(5)]
                },
                ResolvedField {
                    key: "tags".into(),
                    ids: vec![RemoteId(30), RemoteId(10)]
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_slug_fails() {
        let remote = FakeRemote::new();
        remote.insert("tags", RemoteItem::new(1, "rust"));

        let err = resolve_references(&remote, &keys(), &metadata("tags: [rust, go]\n"))
            .await
            .unwrap_err();
        match err {
            PublishError::Resolution {
                collection,
                slug,
                matches,
            } => {
                assert_eq!(collection, "tags");
                assert_eq!(slug, "go");
                assert_eq!(matches, 0);
            }
            other => panic!("Expected Resolution error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_fails() {
        let remote = FakeRemote::new();
        remote.insert("categories", RemoteItem::new(1, "news"));
        remote.insert("categories", RemoteItem::new(2, "news"));

        let err = resolve_references(&remote, &keys(), &metadata("categories: [news]\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Resolution { matches: 2, .. }));
    }

    #[tokio::test]
    async fn test_other_fields_are_not_looked_up() {
        let remote = FakeRemote::new();
        let resolved = resolve_references(&remote, &keys(), &metadata("title: T\nauthor: me\n"))
            .await
            .unwrap();
        assert!(resolved.is_empty());
        assert_eq!(remote.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejects_nested_values() {
        let remote = FakeRemote::new();
        let err = resolve_references(&remote, &keys(), &metadata("tags:\n  a: b\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::InvalidField { .. }));
    }
}
