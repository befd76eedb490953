pub mod breakpoint_merger;
pub mod cli;
pub mod cluster_filter;
pub mod cluster_finder;
pub mod containers;
pub mod coverage;
pub mod errors;
pub mod genotyper;
pub mod ingester;
pub mod result_writer;
pub mod settings;
pub mod signature_store;
pub mod sv_caller;
pub mod utils;
