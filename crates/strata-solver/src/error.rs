//! Internal-invariant violations.
//!
//! These are programming errors in whoever sequences construction, not
//! problems with the declarations being resolved (those become cruft). They
//! abort the current pass and are returned to the caller of `resolve`.

use crate::phrase::{DocumentId, PhraseId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("document {0:?} does not exist")]
    UnknownDocument(DocumentId),

    #[error("phrase {0:?} does not exist")]
    UnknownPhrase(PhraseId),

    #[error("an annotation statement on phrase {0:?} names no terms")]
    EmptyAnnotation(PhraseId),

    #[error("phrase {0:?} belongs to an invalidated document")]
    Orphaned(PhraseId),

    #[error("a node for phrase {0:?} is already cached")]
    AlreadyCached(PhraseId),

    #[error("phrase {phrase:?} was constructed before its container {container:?}")]
    OutOfOrder {
        phrase: PhraseId,
        container: PhraseId,
    },

    #[error("phrase {0:?} is hypothetical and cannot back an explicit node")]
    HypotheticalExplicit(PhraseId),

    #[error("phrase {0:?} is hypothetical and cannot carry an annotation statement")]
    HypotheticalPredecessor(PhraseId),

    #[error("phrase {0:?} is declared and cannot back an implicit node")]
    ConcreteImplicit(PhraseId),

    #[error("phrase {0:?} is not a document root")]
    NotRoot(PhraseId),

    #[error("no node is cached for phrase {0:?}")]
    NotCached(PhraseId),

    #[error("the node for phrase {0:?} is implicit")]
    NotExplicit(PhraseId),
}
