//! # Connectivity Module
//!
//! Perception of bonds and contacts in a periodic crystal, and the molecules
//! that follow from them.
//!
//! ## Overview
//!
//! Connectivity is computed over the atoms of a single unit cell. Neighbors
//! are found in a slab of replicated cells through a k-d tree ([`spatial`]),
//! classified by radius-sum criteria ([`builder`]) and stored in a periodic
//! bond graph ([`graph`]) whose edges carry the lattice offset of the target
//! atom. User-supplied [`overrides`] take precedence over the distance
//! criteria. Finally, [`fragments`] walks the covalent subgraph to obtain
//! whole molecules.

pub mod builder;
pub mod fragments;
pub mod graph;
pub mod overrides;
pub mod spatial;
