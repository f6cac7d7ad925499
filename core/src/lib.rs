pub mod atom;
pub mod basis;
pub mod config;
pub mod ctab;
mod diis;
pub mod export;
pub mod hf;
pub mod integrals;
pub mod molecule;
pub mod periodic_table;
