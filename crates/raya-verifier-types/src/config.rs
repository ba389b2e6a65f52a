//! Engine and registry configuration

use crate::domain::LanguageKind;

/// When the closure fixpoint runs.
///
/// All three policies converge to the same relation for the same sequence
/// of intern/relate calls; they only differ in when the work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosureMode {
    /// Close after every relate and every new type
    #[default]
    Eager,
    /// Schedule affected families; close on `close_accumulated`
    Deferred,
    /// Schedule nothing; close everything on `close_all`
    Manual,
}

impl ClosureMode {
    /// Whether relate/intern schedule work for the fixpoint.
    pub fn is_incremental(self) -> bool {
        !matches!(self, ClosureMode::Manual)
    }
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub struct LatticeConfig {
    /// Closure policy for every engine (default: eager)
    pub closure_mode: ClosureMode,
    /// Worker threads to shard over; 0 means one per CPU core (default: 0)
    pub thread_count: usize,
    /// Language kinds that get an engine per thread (default: all)
    pub languages: Vec<LanguageKind>,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        LatticeConfig {
            closure_mode: ClosureMode::default(),
            thread_count: 0,
            languages: LanguageKind::ALL.to_vec(),
        }
    }
}

impl LatticeConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the closure policy.
    pub fn with_closure_mode(mut self, mode: ClosureMode) -> Self {
        self.closure_mode = mode;
        self
    }

    /// Set the number of worker threads (0 = CPU count).
    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Restrict the registry to the given language kinds.
    pub fn with_languages(mut self, languages: &[LanguageKind]) -> Self {
        self.languages = languages.to_vec();
        self
    }

    /// Thread count after resolving the CPU-count default.
    pub fn effective_thread_count(&self) -> usize {
        if self.thread_count == 0 {
            num_cpus::get()
        } else {
            self.thread_count
        }
    }
}
