//! # Tsetlin Machine Library
//!
//! An implementation of Tsetlin machines in three automaton representations:
//! a dense matrix for fast training on modest clause counts, a sparse
//! per-clause form that grows and prunes automata on demand, and a
//! stateless inference-only projection of a sparse model.
//!
//! Tsetlin machines are interpretable machine learning algorithms: they
//! learn propositional clauses over boolean literals and vote with them,
//! rather than fitting weights to a continuous function.
//!
//! ## Quick Start
//!
//! ```rust
//! use tsetlin::{DenseMachine, Hyperparams, OutputMode};
//!
//! let hp = Hyperparams::new(2, 20, 2, 15, 127, -127, false, 3.9).unwrap();
//! let mut machine = DenseMachine::create(hp, OutputMode::ClassIndex, 42).unwrap();
//!
//! let x: Vec<u8> = vec![1, 0, 0, 1, 1, 1, 0, 0];
//! let y: Vec<u8> = vec![0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0];
//! machine.train(&x, &y, 4, 50).unwrap();
//!
//! let mut y_pred = vec![0u8; 4 * 4];
//! machine.predict(&x, &mut y_pred, 4).unwrap();
//! ```
//!
//! ## Algorithm
//!
//! A Tsetlin machine consists of:
//! - **Tsetlin Automata**: Learn to include or exclude literals.
//! - **Clauses**: Logical conjunctions of literals.
//! - **Voting**: Clauses vote on the final decision, weighted per class.
//!
//! Training applies one of three feedback kernels per `(clause, class)` pair
//! each row: Type Ia/Ib reinforce a clause whose vote agrees with the label,
//! Type II grows a clause whose vote disagrees. See [`feedback`] for the
//! dispatch rule and [`hyperparams`] for the constants that shape it.

pub mod activation;
pub mod clause;
pub mod error;
pub mod feedback;
pub mod hyperparams;
pub mod machine;
pub mod persistence;
pub mod prng;
pub mod state;
pub mod voting;

pub use activation::OutputMode;
pub use error::{Result, TsetlinError};
pub use hyperparams::Hyperparams;
pub use machine::{DenseMachine, SparseMachine, StatelessMachine};
