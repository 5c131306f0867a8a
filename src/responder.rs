//! Domain responder trait
//!
//! One capability ("answer a question in my domain") with one implementation
//! per backing source: the static roster for people questions and the live
//! relational store for transaction questions.

use crate::models::Domain;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DomainResponder: Send + Sync {
    fn domain(&self) -> Domain;

    /// Answer a question. Errors are for failures the responder could not
    /// turn into answer text itself.
    async fn answer(&self, question: &str) -> Result<String>;
}
