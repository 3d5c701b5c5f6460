/*!
Small shared utilities used across the seatcast crates.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod finite;
pub mod progress_counter;
