//! Binary model format, shared by all three representations.
//!
//! Byte layout (little-endian): `threshold: u32, num_literals: u32,
//! num_clauses: u32, num_classes: u32, max_state: i8, min_state: i8,
//! boost_true_positive_feedback: u8, s: f64`, then `weights: i16 ×
//! (num_clauses · num_classes)` row-major `(k, c)`, then a trailing state
//! block whose shape depends on which representation produced the file:
//!
//! - **dense**: `ta_state: i8 × (num_clauses · num_literals · 2)`, index
//!   `(((k·L)+l)·2)+p`.
//! - **sparse**: per clause, in order, a sequence of `(ta_id: u32, state:
//!   i8)` pairs for *included* TAs only, each clause's sequence terminated
//!   by a sentinel `ta_id = u32::MAX`. States strictly below `mid_state`
//!   are not materialized on disk — this is the deliberate sparsification
//!   spec.md §6.1 calls out, not a bug.
//! - **stateless**: the sparse layout with the `state` field dropped from
//!   every pair.
//!
//! The sparse and stateless loaders also accept a dense-shaped file: a
//! dense trailing block has an exactly computable size
//! (`num_clauses * num_literals * 2` bytes), so the loader distinguishes
//! the two shapes by comparing the remaining byte count against that size
//! rather than by a format tag (the wire format carries none).

use std::io::{Read, Write};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};

use crate::error::{Result, TsetlinError};
use crate::hyperparams::Hyperparams;

const SENTINEL: u32 = u32::MAX;

fn io(action: &'static str) -> impl Fn(std::io::Error) -> TsetlinError {
    move |e| TsetlinError::io(action, e)
}

pub fn write_header<W: Write>(w: &mut W, hp: &Hyperparams) -> Result<()> {
    w.write_u32::<LE>(hp.threshold as u32).map_err(io("writing threshold"))?;
    w.write_u32::<LE>(hp.num_literals).map_err(io("writing num_literals"))?;
    w.write_u32::<LE>(hp.num_clauses).map_err(io("writing num_clauses"))?;
    w.write_u32::<LE>(hp.num_classes).map_err(io("writing num_classes"))?;
    w.write_i8(hp.max_state).map_err(io("writing max_state"))?;
    w.write_i8(hp.min_state).map_err(io("writing min_state"))?;
    w.write_u8(hp.boost_true_positive_feedback as u8)
        .map_err(io("writing boost_true_positive_feedback"))?;
    w.write_f64::<LE>(hp.s).map_err(io("writing s"))?;
    Ok(())
}

pub fn read_header<R: Read>(r: &mut R) -> Result<Hyperparams> {
    let threshold = r.read_u32::<LE>().map_err(io("reading threshold"))? as i32;
    let num_literals = r.read_u32::<LE>().map_err(io("reading num_literals"))?;
    let num_clauses = r.read_u32::<LE>().map_err(io("reading num_clauses"))?;
    let num_classes = r.read_u32::<LE>().map_err(io("reading num_classes"))?;
    let max_state = r.read_i8().map_err(io("reading max_state"))?;
    let min_state = r.read_i8().map_err(io("reading min_state"))?;
    let boost = r.read_u8().map_err(io("reading boost_true_positive_feedback"))? != 0;
    let s = r.read_f64::<LE>().map_err(io("reading s"))?;
    Hyperparams::new(num_classes, num_clauses, num_literals, threshold, max_state, min_state, boost, s)
}

pub fn write_weights<W: Write>(w: &mut W, weights: &[i16]) -> Result<()> {
    for &v in weights {
        w.write_i16::<LE>(v).map_err(io("writing weights"))?;
    }
    Ok(())
}

pub fn read_weights<R: Read>(r: &mut R, count: usize) -> Result<Vec<i16>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(r.read_i16::<LE>().map_err(io("reading weights"))?);
    }
    Ok(out)
}

pub fn write_dense_block<W: Write>(w: &mut W, ta_state: &[i8]) -> Result<()> {
    for &v in ta_state {
        w.write_i8(v).map_err(io("writing ta_state"))?;
    }
    Ok(())
}

pub fn read_dense_block<R: Read>(r: &mut R, count: usize) -> Result<Vec<i8>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(r.read_i8().map_err(io("reading ta_state"))?);
    }
    Ok(out)
}

/// Writes the sparse trailing block: per clause, `(ta_id, state)` pairs for
/// included TAs in ascending order, terminated by the sentinel.
pub fn write_sparse_block<W: Write>(w: &mut W, num_clauses: usize, inclusions: impl Fn(usize) -> Vec<(u32, i8)>) -> Result<()> {
    for clause in 0..num_clauses {
        for (ta_id, state) in inclusions(clause) {
            w.write_u32::<LE>(ta_id).map_err(io("writing sparse ta_id"))?;
            w.write_i8(state).map_err(io("writing sparse state"))?;
        }
        w.write_u32::<LE>(SENTINEL).map_err(io("writing sparse sentinel"))?;
    }
    Ok(())
}

/// Writes the stateless trailing block: per clause, bare `ta_id`s for
/// included TAs, terminated by the sentinel.
pub fn write_stateless_block<W: Write>(w: &mut W, num_clauses: usize, inclusions: impl Fn(usize) -> Vec<u32>) -> Result<()> {
    for clause in 0..num_clauses {
        for ta_id in inclusions(clause) {
            w.write_u32::<LE>(ta_id).map_err(io("writing ta_id"))?;
        }
        w.write_u32::<LE>(SENTINEL).map_err(io("writing sentinel"))?;
    }
    Ok(())
}

fn read_tagged_with_state<R: Read>(r: &mut R, num_clauses: usize) -> Result<Vec<Vec<(u32, i8)>>> {
    let mut clauses = Vec::with_capacity(num_clauses);
    for _ in 0..num_clauses {
        let mut entries = Vec::new();
        loop {
            let ta_id = r.read_u32::<LE>().map_err(io("reading sparse ta_id"))?;
            if ta_id == SENTINEL {
                break;
            }
            let state = r.read_i8().map_err(io("reading sparse state"))?;
            entries.push((ta_id, state));
        }
        clauses.push(entries);
    }
    Ok(clauses)
}

fn read_tagged_stateless<R: Read>(r: &mut R, num_clauses: usize) -> Result<Vec<Vec<u32>>> {
    let mut clauses = Vec::with_capacity(num_clauses);
    for _ in 0..num_clauses {
        let mut entries = Vec::new();
        loop {
            let ta_id = r.read_u32::<LE>().map_err(io("reading ta_id"))?;
            if ta_id == SENTINEL {
                break;
            }
            entries.push(ta_id);
        }
        clauses.push(entries);
    }
    Ok(clauses)
}

/// What the trailing block of a loaded file turned out to contain.
pub enum TrailingBlock {
    Dense(Vec<i8>),
    Sparse(Vec<Vec<(u32, i8)>>),
}

/// Reads the trailing block for a sparse-capable loader: a dense-shaped
/// block if the remaining bytes match the dense size exactly, otherwise the
/// tagged sparse format.
pub fn read_sparse_capable_block<R: Read>(r: &mut R, hp: &Hyperparams, remaining_bytes: u64) -> Result<TrailingBlock> {
    let dense_len = hp.num_clauses as u64 * hp.num_literals as u64 * 2;
    if remaining_bytes == dense_len {
        let flat = read_dense_block(r, dense_len as usize)?;
        Ok(TrailingBlock::Dense(flat))
    } else {
        let clauses = read_tagged_with_state(r, hp.num_clauses as usize)?;
        Ok(TrailingBlock::Sparse(clauses))
    }
}

/// Like `read_sparse_capable_block`, but for stateless loaders (no `state`
/// field in the tagged form).
pub enum TrailingBlockStateless {
    Dense(Vec<i8>),
    Stateless(Vec<Vec<u32>>),
}

pub fn read_stateless_capable_block<R: Read>(
    r: &mut R,
    hp: &Hyperparams,
    remaining_bytes: u64,
) -> Result<TrailingBlockStateless> {
    let dense_len = hp.num_clauses as u64 * hp.num_literals as u64 * 2;
    if remaining_bytes == dense_len {
        let flat = read_dense_block(r, dense_len as usize)?;
        Ok(TrailingBlockStateless::Dense(flat))
    } else {
        let clauses = read_tagged_stateless(r, hp.num_clauses as usize)?;
        Ok(TrailingBlockStateless::Stateless(clauses))
    }
}

/// Header size in bytes, used by callers to compute `remaining_bytes`.
pub const HEADER_BYTES: u64 = 4 + 4 + 4 + 4 + 1 + 1 + 1 + 8;
