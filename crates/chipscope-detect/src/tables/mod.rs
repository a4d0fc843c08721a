//! Static identity and compatibility tables.
//!
//! Every table is read-only data, compiled in or initialized once on first
//! use, and each lookup documents what an unrecognized code resolves to.

pub mod applications;
pub mod desfire;
pub mod iso15693;
pub mod javacard;
pub mod ntag;
