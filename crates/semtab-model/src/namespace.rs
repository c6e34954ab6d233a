//! URI namespaces and knowledge-graph namespace registry.

use crate::error::{ModelError, Result};
use crate::link::{DBPEDIA, WIKIDATA};
use std::collections::{BTreeMap, HashMap};

/// Prefix ↔ namespace-URI mapping, e.g. `wd` ↔ `http://www.wikidata.org/entity/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    prefix2ns: BTreeMap<String, String>,
}

impl Namespace {
    pub fn from_prefix2ns<I, K, V>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix2ns: prefixes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn prefix2ns(&self) -> &BTreeMap<String, String> {
        &self.prefix2ns
    }

    pub fn namespace_of(&self, prefix: &str) -> Option<&str> {
        self.prefix2ns.get(prefix).map(String::as_str)
    }

    /// Merge `other` into `self`; existing prefixes win.
    pub fn extend(&mut self, other: &Namespace) {
        for (prefix, ns) in &other.prefix2ns {
            self.prefix2ns
                .entry(prefix.clone())
                .or_insert_with(|| ns.clone());
        }
    }

    /// Expand `prefix:local` to an absolute URI.
    pub fn get_abs_uri(&self, rel_uri: &str) -> Result<String> {
        let (prefix, local) = rel_uri
            .split_once(':')
            .ok_or_else(|| ModelError::UnknownPrefix(rel_uri.to_string()))?;
        let ns = self
            .prefix2ns
            .get(prefix)
            .ok_or_else(|| ModelError::UnknownPrefix(prefix.to_string()))?;
        Ok(format!("{ns}{local}"))
    }

    /// Prefix whose namespace is the longest prefix of `abs_uri`.
    pub fn prefix_of(&self, abs_uri: &str) -> Option<&str> {
        self.prefix2ns
            .iter()
            .filter(|(_, ns)| abs_uri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Compact `abs_uri` to `prefix:local`.
    pub fn get_rel_uri(&self, abs_uri: &str) -> Result<String> {
        let prefix = self
            .prefix_of(abs_uri)
            .ok_or_else(|| ModelError::UnknownNamespace(abs_uri.to_string()))?;
        let ns = &self.prefix2ns[prefix];
        Ok(format!("{prefix}:{}", &abs_uri[ns.len()..]))
    }
}

fn common_prefixes() -> [(&'static str, &'static str); 4] {
    [
        ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
        ("owl", "http://www.w3.org/2002/07/owl#"),
        ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ]
}

// ============================================================================
// Knowledge-graph namespaces
// ============================================================================

/// Namespace of one knowledge graph: its prefixes plus the URI forms under
/// which its entities are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeGraphNamespace {
    pub name: String,
    pub namespace: Namespace,
    /// URI used by `id_to_uri`.
    pub entity_ns: String,
    /// Path prefixes (without scheme) recognised as main-namespace URIs,
    /// longest first.
    main_paths: Vec<String>,
}

impl KnowledgeGraphNamespace {
    pub fn new(
        name: impl Into<String>,
        namespace: Namespace,
        entity_ns: impl Into<String>,
        main_paths: Vec<String>,
    ) -> Self {
        let mut main_paths = main_paths;
        main_paths.sort_by_key(|p| std::cmp::Reverse(p.len()));
        Self {
            name: name.into(),
            namespace,
            entity_ns: entity_ns.into(),
            main_paths,
        }
    }

    pub fn wikidata() -> Self {
        let mut prefixes: Vec<(&str, &str)> = vec![
            ("wd", "http://www.wikidata.org/entity/"),
            ("wdt", "http://www.wikidata.org/prop/direct/"),
            ("p", "http://www.wikidata.org/prop/"),
            ("ps", "http://www.wikidata.org/prop/statement/"),
            ("pq", "http://www.wikidata.org/prop/qualifier/"),
        ];
        prefixes.extend(common_prefixes());
        Self::new(
            WIKIDATA,
            Namespace::from_prefix2ns(prefixes),
            "http://www.wikidata.org/entity/",
            vec![
                "www.wikidata.org/entity/".to_string(),
                "www.wikidata.org/wiki/".to_string(),
                "www.wikidata.org/prop/".to_string(),
                "www.wikidata.org/wiki/Property:".to_string(),
            ],
        )
    }

    pub fn dbpedia() -> Self {
        let mut prefixes: Vec<(&str, &str)> = vec![
            ("dbr", "http://dbpedia.org/resource/"),
            ("dbo", "http://dbpedia.org/ontology/"),
            ("dbp", "http://dbpedia.org/property/"),
        ];
        prefixes.extend(common_prefixes());
        Self::new(
            DBPEDIA,
            Namespace::from_prefix2ns(prefixes),
            "http://dbpedia.org/resource/",
            vec!["dbpedia.org/resource/".to_string()],
        )
    }

    /// Local id of a main-namespace URI, borrowed from `uri`.
    fn strip_main<'a>(&self, uri: &'a str) -> Option<&'a str> {
        let rest = uri
            .strip_prefix("http://")
            .or_else(|| uri.strip_prefix("https://"))?;
        self.main_paths.iter().find_map(|path| {
            rest.strip_prefix(path.as_str())
                .filter(|id| !id.is_empty() && !id.contains('/'))
        })
    }

    /// Whether `uri` names an entity/property of this knowledge graph.
    pub fn is_uri_in_main_ns(&self, uri: &str) -> bool {
        self.strip_main(uri).is_some()
    }

    pub fn uri_to_id(&self, uri: &str) -> Result<String> {
        self.strip_main(uri)
            .map(str::to_string)
            .ok_or_else(|| ModelError::UnknownNamespace(uri.to_string()))
    }

    pub fn id_to_uri(&self, id: &str) -> String {
        format!("{}{id}", self.entity_ns)
    }
}

/// Knowledge-graph namespaces by name. Build one at startup and pass it to
/// whatever needs to resolve entity URIs.
#[derive(Debug, Clone, Default)]
pub struct KgNamespaceRegistry {
    namespaces: HashMap<String, KnowledgeGraphNamespace>,
}

impl KgNamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with Wikidata and DBpedia.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(KnowledgeGraphNamespace::wikidata());
        registry.register(KnowledgeGraphNamespace::dbpedia());
        registry
    }

    /// Register (or replace) a namespace under its own name.
    pub fn register(&mut self, kgns: KnowledgeGraphNamespace) -> Option<KnowledgeGraphNamespace> {
        self.namespaces.insert(kgns.name.clone(), kgns)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&KnowledgeGraphNamespace> {
        self.namespaces
            .get(name)
            .ok_or_else(|| ModelError::UnknownKg(name.to_string()))
    }

    /// Union of every registered namespace's prefixes, merged in name order.
    pub fn combined_namespace(&self) -> Namespace {
        let mut names: Vec<&String> = self.namespaces.keys().collect();
        names.sort();
        let mut ns = Namespace::default();
        for name in names {
            ns.extend(&self.namespaces[name].namespace);
        }
        ns
    }
}
