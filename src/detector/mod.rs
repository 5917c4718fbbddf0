//! The five-stage scan pipeline, one module per stage

pub mod bubble;
pub mod grid;
pub mod marker;
pub mod rectify;
pub mod regions;
pub mod resolve;
