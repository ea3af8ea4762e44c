//! Loss-less decoder for the ECM ("Error-Code Modeler") CD-ROM image
//! compression format.
//!
//! ECM strips a CD-ROM image's EDC (error detection) and ECC (error
//! correction) fields from each sector, since both are fully determined by
//! the sector's payload bytes. This crate regenerates them bit-exactly,
//! turning an ECM stream back into the original disc image.
//!
//! The entry point is [`ecm::Decoder`]; [`sector`] and [`tables`] implement
//! the per-sector codec it drives.

#![warn(missing_docs)]

#[macro_use]
extern crate arrayref;
extern crate thiserror;

pub mod bcd;
pub mod ecm;
pub mod msf;
pub mod sector;
pub mod tables;

pub use ecm::{Decoder, EcmError, EcmResult, Sink};
pub use sector::SectorKind;
