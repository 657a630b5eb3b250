//! TESSERA Resolution
//!
//! Turns declarative model descriptions into a linked type graph. The
//! declarations may arrive in any order and may name types that are only
//! declared later; the resolver creates type shells immediately and
//! defers everything else into construction phases:
//!
//! 1. generalizations and association subsets
//! 2. parts, in generalization order so that overrides find what they override
//! 3. association ends, then references, then reference overrides
//! 4. backward references, then their overrides
//! 5. reordering of extended types, completion marks
//! 6. roles and singletons through a [`ModelFactory`]
//!
//! Structural problems are collected in a [`Protocol`](tessera_core::Protocol)
//! so that a single run reports as many of them as possible.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod checks;
pub mod config;
pub mod error;
pub mod factory;
pub mod parts;
pub mod resolver;

pub use config::ResolverConfig;
pub use error::{ResolveError, ResolveResult};
pub use factory::{ModelFactory, TransientFactory};
pub use parts::{synthetic_association_name, SELF_END_NAME};
pub use resolver::{ModelResolver, ResolverState};
