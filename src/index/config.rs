//! Writer/reader configuration.

use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{
    analysis::{Analyzer, SimpleAnalyzer},
    codec::{self, disk},
    directory::{Directory, FileSystemDirectory, LoadMMap, MemDirectory},
    doc::ALL_FIELD,
    index::{event::EventCallback, merger::TieredMergePolicy},
    search::{Bm25Similarity, Similarity},
    Result,
};

/// Hook invoked before search execution with the estimated memory the
/// search will pin. Returning an error aborts the search.
pub type SearchStartFn = Arc<dyn Fn(u64) -> Result<()> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum DirSource {
    Path(std::path::PathBuf, LoadMMap),
    Mem,
    Custom(Arc<dyn Directory>),
}

/// Index configuration. Construct with [Config::new] (filesystem),
/// [Config::in_memory], or [Config::with_directory], then refine with the
/// `set_` methods.
#[derive(Clone)]
pub struct Config {
    pub(crate) source: DirSource,
    pub(crate) default_search_field: String,
    pub(crate) default_analyzer: Arc<dyn Analyzer>,
    pub(crate) default_similarity: Arc<dyn Similarity>,
    pub(crate) per_field_similarity: HashMap<String, Arc<dyn Similarity>>,
    pub(crate) segment_type: String,
    pub(crate) segment_version: u32,
    pub(crate) num_analysis_workers: usize,
    pub(crate) disable_optimize_disjunction_unadorned: bool,
    pub(crate) max_clause_count: usize,
    pub(crate) search_start: Option<SearchStartFn>,
    pub(crate) event_callback: Option<EventCallback>,
    pub(crate) merge_policy: TieredMergePolicy,
    pub(crate) keep_n_latest: usize,
    pub(crate) max_batch_ops: Option<usize>,
}

impl Config {
    fn with_source(source: DirSource) -> Config {
        Config {
            source,
            default_search_field: ALL_FIELD.to_string(),
            default_analyzer: Arc::new(SimpleAnalyzer),
            default_similarity: Arc::new(Bm25Similarity::default()),
            per_field_similarity: HashMap::new(),
            segment_type: disk::CODEC_NAME.to_string(),
            segment_version: disk::CODEC_VERSION,
            num_analysis_workers: num_cpus::get(),
            disable_optimize_disjunction_unadorned: false,
            max_clause_count: 1024,
            search_start: None,
            event_callback: None,
            merge_policy: TieredMergePolicy::default(),
            keep_n_latest: 1,
            max_batch_ops: None,
        }
    }

    /// Index under a filesystem directory, mmap-loading segments.
    pub fn new<P: AsRef<Path>>(dir: P) -> Config {
        let source = DirSource::Path(dir.as_ref().to_path_buf(), LoadMMap::Always);
        Config::with_source(source)
    }

    /// Ephemeral index held entirely in memory. The persister pipeline still
    /// runs in full against the in-memory directory.
    pub fn in_memory() -> Config {
        Config::with_source(DirSource::Mem)
    }

    /// Index over a caller-provided directory implementation.
    pub fn with_directory(directory: Arc<dyn Directory>) -> Config {
        Config::with_source(DirSource::Custom(directory))
    }

    pub fn set_load_mmap(mut self, policy: LoadMMap) -> Config {
        if let DirSource::Path(path, _) = &self.source {
            self.source = DirSource::Path(path.clone(), policy);
        }
        self
    }

    /// Field queried when a query names none.
    pub fn set_default_search_field(mut self, field: &str) -> Config {
        self.default_search_field = field.to_string();
        self
    }

    /// Analyzer consulted for query text.
    pub fn set_default_search_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Config {
        self.default_analyzer = analyzer;
        self
    }

    pub fn set_default_similarity(mut self, similarity: Arc<dyn Similarity>) -> Config {
        self.default_similarity = similarity;
        self
    }

    pub fn set_per_field_similarity(
        mut self,
        field: &str,
        similarity: Arc<dyn Similarity>,
    ) -> Config {
        self.per_field_similarity.insert(field.to_string(), similarity);
        self
    }

    /// Pin the segment codec.
    pub fn set_segment_type(mut self, name: &str, version: u32) -> Config {
        self.segment_type = name.to_string();
        self.segment_version = version;
        self
    }

    /// Parallelism for batch analysis.
    pub fn set_num_analysis_workers(mut self, workers: usize) -> Config {
        self.num_analysis_workers = workers.max(1);
        self
    }

    /// Turn off the scoring shortcut applied to disjunctions whose children
    /// need no scoring payloads.
    pub fn set_disable_optimize_disjunction_unadorned(mut self, disable: bool) -> Config {
        self.disable_optimize_disjunction_unadorned = disable;
        self
    }

    /// Cap on automaton/multi-term expansion; exceeding it fails the query
    /// with `QueryTooBroad`.
    pub fn set_max_clause_count(mut self, max: usize) -> Config {
        self.max_clause_count = max.max(1);
        self
    }

    /// Pre-search admission hook, e.g. a memory budget guard.
    pub fn set_search_start(mut self, hook: SearchStartFn) -> Config {
        self.search_start = Some(hook);
        self
    }

    pub fn set_event_callback(mut self, callback: EventCallback) -> Config {
        self.event_callback = Some(callback);
        self
    }

    pub fn set_merge_policy(mut self, policy: TieredMergePolicy) -> Config {
        self.merge_policy = policy;
        self
    }

    /// Retention: epochs older than the N latest become deletable.
    pub fn set_keep_n_latest(mut self, n: usize) -> Config {
        self.keep_n_latest = n.max(1);
        self
    }

    /// Refuse batches above this many operations with `BatchTooLarge`.
    pub fn set_max_batch_ops(mut self, max: usize) -> Config {
        self.max_batch_ops = Some(max);
        self
    }

    pub fn similarity_for_field(&self, field: &str) -> Arc<dyn Similarity> {
        match self.per_field_similarity.get(field) {
            Some(similarity) => Arc::clone(similarity),
            None => Arc::clone(&self.default_similarity),
        }
    }

    pub fn default_search_field(&self) -> &str {
        &self.default_search_field
    }

    pub fn analyzer(&self) -> Arc<dyn Analyzer> {
        Arc::clone(&self.default_analyzer)
    }

    pub fn max_clause_count(&self) -> usize {
        self.max_clause_count
    }

    pub(crate) fn open_directory(&self) -> Arc<dyn Directory> {
        match &self.source {
            DirSource::Path(path, mmap) => Arc::new(
                FileSystemDirectory::new(path).set_load_mmap(mmap.clone()),
            ),
            DirSource::Mem => Arc::new(MemDirectory::new()),
            DirSource::Custom(directory) => Arc::clone(directory),
        }
    }

    pub(crate) fn codec(&self) -> Result<Arc<dyn codec::Codec>> {
        codec::resolve(&self.segment_type, self.segment_version)
    }
}
