mod class;
mod generator;
mod grid;
mod qplib;

pub use class::ProblemClass;
pub use generator::{
    generate, ProblemGenerator, ASSETS_PER_FACTOR, CONTROL_HORIZON, DATA_POINTS_PER_FEATURE,
};
pub use grid::gen_int_log_space;
pub use qplib::{discover_qplib, load_qplib, parse_qplib, QplibFile, QPLIB_EXTENSION};
