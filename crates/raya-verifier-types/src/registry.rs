//! Per-thread engine registry
//!
//! Engines are not shared between threads. The registry owns one
//! [`VerifierEngine`] per (language kind, thread slot) and hands each
//! worker exclusive access to its slot's engines.

use crate::config::{ClosureMode, LatticeConfig};
use crate::domain::{LanguageKind, VerifierEngine};
use crate::error::RegistryError;
use tracing::debug;

/// Owner of every engine, laid out slot-major.
#[derive(Debug)]
pub struct Registry {
    /// Engines of slot `s` live at `s * languages.len()..(s + 1) * languages.len()`
    engines: Vec<VerifierEngine>,
    languages: Vec<LanguageKind>,
    thread_count: usize,
    closure_mode: ClosureMode,
}

/// Exclusive view of the engines of one thread slot.
#[derive(Debug)]
pub struct Shard<'a> {
    slot: usize,
    languages: &'a [LanguageKind],
    engines: &'a mut [VerifierEngine],
}

impl Registry {
    /// Create every engine the configuration asks for.
    ///
    /// A thread count of 0 means one slot per CPU core.
    pub fn initialize(config: &LatticeConfig) -> Self {
        let thread_count = config.effective_thread_count();
        let mut languages: Vec<LanguageKind> = Vec::with_capacity(config.languages.len());
        for &kind in &config.languages {
            if !languages.contains(&kind) {
                languages.push(kind);
            }
        }

        let mut engines = Vec::with_capacity(thread_count * languages.len());
        for slot in 0..thread_count {
            for &kind in &languages {
                engines.push(VerifierEngine::new(kind, slot as u32, config.closure_mode));
            }
        }

        debug!(
            thread_count,
            languages = ?languages,
            closure_mode = ?config.closure_mode,
            engines = engines.len(),
            "initialized verifier type registry"
        );

        Registry {
            engines,
            languages,
            thread_count,
            closure_mode: config.closure_mode,
        }
    }

    /// Number of thread slots.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Languages with an engine in every slot.
    pub fn languages(&self) -> &[LanguageKind] {
        &self.languages
    }

    /// Closure policy of every engine.
    pub fn closure_mode(&self) -> ClosureMode {
        self.closure_mode
    }

    /// Engine for `kind` on thread `slot`.
    pub fn try_get(&self, kind: LanguageKind, slot: usize) -> Result<&VerifierEngine, RegistryError> {
        let index = self.index(kind, slot)?;
        Ok(&self.engines[index])
    }

    /// Engine for `kind` on thread `slot`, mutably.
    pub fn try_get_mut(&mut self, kind: LanguageKind, slot: usize) -> Result<&mut VerifierEngine, RegistryError> {
        let index = self.index(kind, slot)?;
        Ok(&mut self.engines[index])
    }

    /// Engine for `kind` on thread `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not configured or `slot` is out of range.
    pub fn get(&self, kind: LanguageKind, slot: usize) -> &VerifierEngine {
        match self.try_get(kind, slot) {
            Ok(engine) => engine,
            Err(err) => panic!("{}", err),
        }
    }

    /// Engine for `kind` on thread `slot`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not configured or `slot` is out of range.
    pub fn get_mut(&mut self, kind: LanguageKind, slot: usize) -> &mut VerifierEngine {
        match self.try_get_mut(kind, slot) {
            Ok(engine) => engine,
            Err(err) => panic!("{}", err),
        }
    }

    /// One exclusive shard per thread slot, in slot order.
    pub fn shards_mut(&mut self) -> impl Iterator<Item = Shard<'_>> + '_ {
        let per_slot = self.languages.len();
        let languages = self.languages.as_slice();
        let mut rest = self.engines.as_mut_slice();
        (0..self.thread_count).map(move |slot| {
            let (engines, tail) = std::mem::take(&mut rest).split_at_mut(per_slot);
            rest = tail;
            Shard {
                slot,
                languages,
                engines,
            }
        })
    }

    /// Run `f` once per slot, each on its own scoped thread with exclusive
    /// access to that slot's engines. Results come back in slot order.
    ///
    /// A panic in any worker is resumed on the calling thread.
    pub fn run_sharded<F, R>(&mut self, f: F) -> Vec<R>
    where
        F: for<'a> Fn(Shard<'a>) -> R + Sync,
        R: Send,
    {
        let f = &f;
        let result = crossbeam::scope(|scope| {
            let handles: Vec<_> = self
                .shards_mut()
                .map(|shard| {
                    scope
                        .builder()
                        .name(format!("raya-verifier-{}", shard.slot()))
                        .spawn(move |_| f(shard))
                        .expect("Failed to spawn verifier thread")
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(value) => value,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });

        match result {
            Ok(values) => values,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    /// Tear down every engine at once.
    pub fn destroy(self) {
        debug!(engines = self.engines.len(), "destroying verifier type registry");
    }

    fn index(&self, kind: LanguageKind, slot: usize) -> Result<usize, RegistryError> {
        let position = self
            .languages
            .iter()
            .position(|&k| k == kind)
            .ok_or(RegistryError::UnknownKind(kind))?;
        if slot >= self.thread_count {
            return Err(RegistryError::SlotOutOfRange {
                slot,
                thread_count: self.thread_count,
            });
        }
        Ok(slot * self.languages.len() + position)
    }
}

impl Shard<'_> {
    /// Thread slot this shard belongs to.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Engine for `kind`, if configured.
    pub fn engine(&self, kind: LanguageKind) -> Option<&VerifierEngine> {
        let position = self.languages.iter().position(|&k| k == kind)?;
        Some(&self.engines[position])
    }

    /// Engine for `kind`, mutably, if configured.
    pub fn engine_mut(&mut self, kind: LanguageKind) -> Option<&mut VerifierEngine> {
        let position = self.languages.iter().position(|&k| k == kind)?;
        Some(&mut self.engines[position])
    }

    /// Every engine of this slot.
    pub fn engines_mut(&mut self) -> impl Iterator<Item = &mut VerifierEngine> + '_ {
        self.engines.iter_mut()
    }
}
