//! Algorithm registries.

use core::fmt;

use crate::JoseError;
use crate::algorithm::Algorithm;

/// An immutable set of algorithms, looked up by name.
///
/// A manager is built once for one kind of operation and shared freely afterwards.
#[derive(Clone)]
pub struct AlgorithmManager<A> {
    algorithms: Vec<A>,
}

impl<A: Algorithm> AlgorithmManager<A> {
    /// Later algorithms with the same name replace earlier ones.
    pub fn new(algorithms: impl IntoIterator<Item = A>) -> Self {
        let mut out: Vec<A> = Vec::new();
        for alg in algorithms {
            match out.iter_mut().find(|a| a.name() == alg.name()) {
                Some(existing) => *existing = alg,
                None => out.push(alg),
            }
        }
        Self { algorithms: out }
    }

    pub fn has(&self, name: &str) -> bool {
        self.algorithms.iter().any(|a| a.name() == name)
    }

    pub fn get(&self, name: &str) -> Result<&A, JoseError> {
        self.algorithms
            .iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| JoseError::UnsupportedAlgorithm(name.to_owned()))
    }

    /// Names of the managed algorithms.
    pub fn list(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.algorithms.iter().map(|a| a.name())
    }
}

impl<A: Algorithm> fmt::Debug for AlgorithmManager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.list()).finish()
    }
}

/// A registry of algorithms by alias, used to create restricted [`AlgorithmManager`]s.
#[derive(Clone)]
pub struct AlgorithmManagerFactory<A> {
    algorithms: Vec<(String, A)>,
}

impl<A> Default for AlgorithmManagerFactory<A> {
    fn default() -> Self {
        Self { algorithms: Vec::new() }
    }
}

impl<A: Algorithm + Clone> AlgorithmManagerFactory<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the algorithm under the alias, replacing any previous registration.
    pub fn add(&mut self, alias: impl Into<String>, algorithm: A) {
        let alias = alias.into();
        match self.algorithms.iter_mut().find(|(a, _)| *a == alias) {
            Some((_, existing)) => *existing = algorithm,
            None => self.algorithms.push((alias, algorithm)),
        }
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, alias: impl Into<String>, algorithm: A) -> Self {
        self.add(alias, algorithm);
        self
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.algorithms.iter().map(|(a, _)| a.as_str())
    }

    pub fn all(&self) -> impl Iterator<Item = &A> + '_ {
        self.algorithms.iter().map(|(_, a)| a)
    }

    /// A manager holding exactly the algorithms registered under the aliases.
    pub fn create<S: AsRef<str>>(&self, aliases: &[S]) -> Result<AlgorithmManager<A>, JoseError> {
        let algorithms = aliases
            .iter()
            .map(|alias| {
                let alias = alias.as_ref();
                self.algorithms
                    .iter()
                    .find(|(a, _)| a == alias)
                    .map(|(_, alg)| alg.clone())
                    .ok_or_else(|| JoseError::UnsupportedAlgorithm(alias.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = aliases.len(), "created algorithm manager");
        Ok(AlgorithmManager::new(algorithms))
    }
}
