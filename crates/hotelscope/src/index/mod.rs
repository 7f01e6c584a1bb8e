//! In-memory full-text travel index.
//!
//! [`TravelIndex`] keeps cities, countries and hotels in a RAM-backed Tantivy index
//! and executes [`QueryDocument`]s locally: every term must match within one of the
//! weighted fields (the best field wins), `Auto` fuzziness widens terms to their
//! allowed edit distance, hotels are pushed down by the negative boost and, when an
//! origin is known, decayed by distance. It implements [`SearchIndex`] so it can
//! stand in for the remote backend in tests, demos and offline deployments.

pub use error::IndexError;
use error::Result;
use tantivy::{
    Index, IndexWriter, TantivyDocument, Term,
    collector::TopDocs,
    query::{BooleanQuery, BoostQuery, DisjunctionMaxQuery, FuzzyTermQuery, Occur, Query, TermQuery},
    schema::{
        Field, IndexRecordOption, STORED, Schema, SchemaBuilder, TextFieldIndexing, TextOptions,
        Value,
    },
    tokenizer::TokenStream,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::geo::{GeoPoint, Located};
use crate::search::{IndexDocument, QueryDocument, SearchIndex, SearchRequest};

const NAME_FIELD: &str = "name";
const ADDRESS_FIELD: &str = "address";
const SOURCE_FIELD: &str = "source";
const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// RAM-backed Tantivy index over [`IndexDocument`]s.
#[derive(Debug, Clone)]
pub struct TravelIndex {
    name: String,
    index: Index,
}

impl TravelIndex {
    /// Creates an empty index answering requests addressed to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: Index::create_in_ram(Self::schema()),
        }
    }

    /// Creates an index named `name` holding `documents`.
    #[instrument(name = "Build Travel Index", skip(documents), fields(index_name = %name))]
    pub fn from_documents<I>(name: &str, documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = IndexDocument>,
    {
        let index = Self::new(name);
        let added = index.add_documents(documents)?;
        info!(index = name, added, "Travel index ready");
        Ok(index)
    }

    fn schema() -> Schema {
        let mut schema_builder = SchemaBuilder::new();

        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer("default")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let text_options = TextOptions::default().set_indexing_options(text_indexing);

        schema_builder.add_text_field(NAME_FIELD, text_options.clone());
        schema_builder.add_text_field(ADDRESS_FIELD, text_options);
        // Full document, returned as the hit's source.
        schema_builder.add_text_field(SOURCE_FIELD, STORED);
        schema_builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_docs(&self) -> Result<u64> {
        Ok(self.index.reader()?.searcher().num_docs())
    }

    /// Indexes `documents` and commits. Returns how many were added.
    pub fn add_documents<I>(&self, documents: I) -> Result<usize>
    where
        I: IntoIterator<Item = IndexDocument>,
    {
        let schema = self.index.schema();
        let f_name = schema.get_field(NAME_FIELD)?;
        let f_address = schema.get_field(ADDRESS_FIELD)?;
        let f_source = schema.get_field(SOURCE_FIELD)?;

        let mut writer: IndexWriter = self.index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        let mut added = 0;
        for document in documents {
            let mut doc = TantivyDocument::default();
            if let Some(name) = &document.name {
                doc.add_text(f_name, name);
            }
            if let Some(address) = &document.address {
                doc.add_text(f_address, address);
            }
            doc.add_text(f_source, serde_json::to_string(&document)?);
            writer.add_document(doc)?;
            added += 1;
        }
        writer.commit()?;
        debug!(added, "Documents committed");
        Ok(added)
    }

    /// Runs `query` and returns the best hits with their final scores.
    #[instrument(name = "Search Travel Index", skip_all, level = "debug", fields(index_name = %self.name, query = %query.text, limit = query.limit))]
    pub fn search_scored(&self, query: &QueryDocument) -> Result<Vec<(IndexDocument, f32)>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        let Some(text_query) = self.build_text_query(query)? else {
            return Ok(Vec::new());
        };

        let reader = self.index.reader()?;
        let searcher = reader.searcher();
        let candidate_limit = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);
        if candidate_limit == 0 {
            return Ok(Vec::new());
        }

        // Score adjustments can reorder hits, so every text match is a candidate.
        let top_docs = searcher.search(&*text_query, &TopDocs::with_limit(candidate_limit))?;
        let f_source = self.index.schema().get_field(SOURCE_FIELD)?;

        let mut scored = top_docs
            .into_iter()
            .map(|(score, doc_address)| {
                let received_doc = searcher.doc::<TantivyDocument>(doc_address)?;
                let source = received_doc
                    .get_first(f_source)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow::anyhow!("Stored document has no source: {doc_address:?}"))?;
                let document: IndexDocument = serde_json::from_str(source)?;
                let score = adjusted_score(query, &document, score);
                Ok((document, score))
            })
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(query.limit);
        debug!(num_results = scored.len(), "Travel index search complete");
        Ok(scored)
    }

    pub fn search(&self, query: &QueryDocument) -> Result<Vec<IndexDocument>> {
        Ok(self
            .search_scored(query)?
            .into_iter()
            .map(|(document, _)| document)
            .collect())
    }

    /// One clause per weighted field requiring all terms; the best field wins.
    fn build_text_query(&self, query: &QueryDocument) -> Result<Option<Box<dyn Query>>> {
        let schema = self.index.schema();
        let mut per_field: Vec<Box<dyn Query>> = Vec::with_capacity(query.fields.len());

        for weighted in &query.fields {
            let Ok(field) = schema.get_field(&weighted.name) else {
                warn!(field = %weighted.name, "Query field not in travel index schema, skipping");
                continue;
            };
            let terms = self.analyze(field, &query.text)?;
            if terms.is_empty() {
                continue;
            }

            let clauses: Vec<(Occur, Box<dyn Query>)> = terms
                .iter()
                .map(|term_str| {
                    let term = Term::from_field_text(field, term_str);
                    let term_query: Box<dyn Query> = match query.fuzziness.max_edits(term_str) {
                        0 => Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
                        distance => Box::new(FuzzyTermQuery::new(term, distance, true)),
                    };
                    (Occur::Must, term_query)
                })
                .collect();

            per_field.push(Box::new(BoostQuery::new(
                Box::new(BooleanQuery::new(clauses)),
                weighted.boost as f32,
            )));
        }

        if per_field.is_empty() {
            return Ok(None);
        }
        let combined = DisjunctionMaxQuery::new(per_field);
        trace!(?combined, "Travel query constructed");
        Ok(Some(Box::new(combined)))
    }

    /// Splits `text` with the field's own tokenizer.
    fn analyze(&self, field: Field, text: &str) -> Result<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        stream.process(&mut |token| terms.push(token.text.clone()));
        Ok(terms)
    }
}

fn adjusted_score(query: &QueryDocument, document: &IndexDocument, text_score: f32) -> f32 {
    let mut factor = query.type_boost(document.doc_type());
    if let Some(decay) = &query.proximity
        && decay.applies_to(document.doc_type())
        && let Some(point) = document.location().filter(GeoPoint::is_valid)
    {
        factor *= decay.factor(point);
    }
    text_score * factor as f32
}

impl SearchIndex for TravelIndex {
    fn multi_search(
        &self,
        requests: &[SearchRequest],
    ) -> crate::search::Result<Vec<Vec<IndexDocument>>> {
        requests
            .iter()
            .map(|request| {
                if request.index != self.name {
                    warn!(requested = %request.index, index = %self.name, "Request for unknown index");
                    return Ok(Vec::new());
                }
                Ok(self.search(&request.query)?)
            })
            .collect()
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum IndexError {
        #[error("Tantivy error: {0}")]
        Tantivy(#[from] tantivy::TantivyError),
        #[error("Document serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, IndexError>;
}
